use super::{banner, dedup_preserving_order, section};
use crate::config::toml_config::TablesConfig;
use crate::core::filename::{FilenameParser, NamingIssue};
use crate::core::{ChangeSet, ImageLibrary, Job, Result, TableStore};
use crate::domain::model::{columns, join_image_list, parse_image_list, tables, PlotRecord};
use crate::domain::reference::{Yard, YardTable};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Find image files no plot references, suggest the plot they belong to, and optionally
/// rename mis-named files and attach them.
pub struct MatchOrphanedImagesJob<S: TableStore, L: ImageLibrary> {
    store: S,
    library: L,
    yards: YardTable,
    parser: FilenameParser,
    extensions: Vec<String>,
    quoting: TablesConfig,
}

impl<S: TableStore, L: ImageLibrary> MatchOrphanedImagesJob<S, L> {
    pub fn new(
        store: S,
        library: L,
        yards: YardTable,
        parser: FilenameParser,
        extensions: Vec<String>,
        quoting: TablesConfig,
    ) -> Self {
        Self {
            store,
            library,
            yards,
            parser,
            extensions,
            quoting,
        }
    }

    fn is_image(&self, filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    fn inspect(
        &self,
        yard: &Yard,
        filename: &str,
        plots: &HashMap<&str, &PlotRecord>,
        claimed: &HashSet<String>,
    ) -> OrphanedImage {
        let hint = self.parser.plot_hint(filename);
        let hint_exists = hint.as_deref().is_some_and(|p| plots.contains_key(p));

        let issues = self
            .parser
            .detect_naming_errors(filename)
            .into_iter()
            .map(|issue| {
                let resolved_plot = self.parser.parse(&issue.suggested).map(|p| p.plot_id);
                let plot_exists = resolved_plot
                    .as_deref()
                    .is_some_and(|p| plots.contains_key(p));
                let target_taken = claimed.contains(&issue.suggested)
                    || self.library.contains(&yard.folder, &issue.suggested);
                IssueCheck {
                    issue,
                    resolved_plot,
                    plot_exists,
                    target_taken,
                }
            })
            .collect();

        let current_images = hint
            .as_deref()
            .and_then(|p| plots.get(p))
            .map(|plot| plot.monument_images.clone())
            .unwrap_or_default();

        OrphanedImage {
            yard_code: yard.code.clone(),
            folder: yard.folder.clone(),
            filename: filename.to_string(),
            hint,
            hint_exists,
            current_images,
            issues,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCheck {
    pub issue: NamingIssue,
    pub resolved_plot: Option<String>,
    pub plot_exists: bool,
    /// A file with the suggested name is already in the folder, or another rename in
    /// this run targets it.
    pub target_taken: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedImage {
    pub yard_code: String,
    pub folder: String,
    pub filename: String,
    pub hint: Option<String>,
    pub hint_exists: bool,
    pub current_images: Vec<String>,
    pub issues: Vec<IssueCheck>,
}

impl OrphanedImage {
    /// Plots of another yard never take a file from this folder.
    pub fn belongs_here(&self, plot_id: &str) -> bool {
        YardTable::section_prefix(plot_id) == self.yard_code
    }

    /// The existing plot the name points at when that plot is in a different yard.
    pub fn misfiled_plot(&self) -> Option<&str> {
        self.hint
            .as_deref()
            .filter(|plot| self.hint_exists && !self.belongs_here(plot))
    }

    /// Where this file should go: the first usable fix wins, then the plot hint.
    fn resolution(&self) -> Option<(Option<&IssueCheck>, &str)> {
        let usable = self.issues.iter().find_map(|c| {
            let plot = c.resolved_plot.as_deref()?;
            (c.plot_exists && !c.target_taken && self.belongs_here(plot)).then_some((c, plot))
        });
        if let Some((check, plot)) = usable {
            return Some((Some(check), plot));
        }
        self.hint
            .as_deref()
            .filter(|plot| self.hint_exists && self.belongs_here(plot))
            .map(|plot| (None, plot))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRename {
    pub folder: String,
    pub from: String,
    pub to: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct OrphanPlan {
    pub orphans: Vec<OrphanedImage>,
    pub renames: Vec<PlannedRename>,
    /// Plot id -> file names to append, in discovery order.
    pub attachments: BTreeMap<String, Vec<String>>,
}

impl ChangeSet for OrphanPlan {
    fn change_count(&self) -> usize {
        self.renames.len() + self.attachments.values().map(Vec::len).sum::<usize>()
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        banner(&mut lines, "Orphaned Image Matcher");
        lines.push(format!("Found {} orphaned images", self.orphans.len()));
        lines.push(String::new());

        let mut by_section: BTreeMap<(&str, &str), Vec<&OrphanedImage>> = BTreeMap::new();
        for orphan in &self.orphans {
            by_section
                .entry((orphan.yard_code.as_str(), orphan.folder.as_str()))
                .or_default()
                .push(orphan);
        }

        for ((code, folder), orphans) in by_section {
            banner(
                &mut lines,
                &format!("SECTION: {} ({}) - {} orphaned images", code, folder, orphans.len()),
            );
            for (i, orphan) in orphans.iter().enumerate() {
                lines.push(format!("{}. {}", i + 1, orphan.filename));
                for check in &orphan.issues {
                    lines.push(format!("   ⚠ NAMING ERROR: {}", check.issue.reason));
                    lines.push(format!("   → Suggested fix: {}", check.issue.suggested));
                    match (&check.resolved_plot, check.plot_exists) {
                        (Some(plot), true) if !orphan.belongs_here(plot) => lines.push(format!(
                            "   ✗ Fixed name matches plot: {} (in another yard, not {})",
                            plot, orphan.yard_code
                        )),
                        (Some(plot), true) => lines.push(format!(
                            "   ✓ Fixed name matches plot: {} (EXISTS in plots.csv)",
                            plot
                        )),
                        (Some(plot), false) => lines.push(format!(
                            "   ✗ Fixed name suggests plot: {} (NOT FOUND in plots.csv)",
                            plot
                        )),
                        (None, _) => lines.push("   ✗ Fixed name is still not a canonical name".to_string()),
                    }
                    if check.target_taken {
                        lines.push(format!("   ✗ {} already exists in the folder", check.issue.suggested));
                    }
                }
                match (&orphan.hint, orphan.hint_exists) {
                    (Some(plot), true) if !orphan.belongs_here(plot) => lines.push(format!(
                        "   ✗ MISFILED: plot {} is not in {}; move the file to its own yard folder",
                        plot, orphan.folder
                    )),
                    (Some(plot), true) => {
                        lines.push(format!("   ✓ Suggests plot: {} (EXISTS in plots.csv)", plot));
                        if orphan.current_images.is_empty() {
                            lines.push(format!("   Plot {} currently has NO images", plot));
                        } else {
                            lines.push(format!(
                                "   Current images for {}: {}",
                                plot,
                                join_image_list(&orphan.current_images)
                            ));
                        }
                    }
                    (Some(plot), false) => {
                        lines.push(format!("   ✗ Suggests plot: {} (NOT FOUND in plots.csv)", plot))
                    }
                    (None, _) => lines.push("   ? Cannot determine plot ID from filename".to_string()),
                }
                lines.push(String::new());
            }
        }

        section(&mut lines, &format!("Files to rename: {}", self.renames.len()));
        for rename in &self.renames {
            lines.push(format!("  {} → {}", rename.from, rename.to));
            lines.push(format!("    Reason: Fix naming error: {}", rename.reason));
        }
        lines.push(String::new());

        section(&mut lines, &format!("Plots to update: {}", self.attachments.len()));
        for (plot, images) in &self.attachments {
            lines.push(format!("  {}:", plot));
            for image in images {
                lines.push(format!("    + {}", image));
            }
        }

        lines.join("\n")
    }
}

impl<S: TableStore, L: ImageLibrary> Job for MatchOrphanedImagesJob<S, L> {
    type Plan = OrphanPlan;

    fn name(&self) -> &'static str {
        "match-orphaned-images"
    }

    fn plan(&self) -> Result<OrphanPlan> {
        let plots_table = self.store.read_table(tables::PLOTS)?;
        let plots = PlotRecord::read_all(&plots_table)?;
        let by_id: HashMap<&str, &PlotRecord> =
            plots.iter().map(|p| (p.plot_id.as_str(), p)).collect();

        let referenced: HashSet<(String, &str)> = plots
            .iter()
            .flat_map(|p| {
                let section = YardTable::section_prefix(&p.plot_id);
                p.monument_images
                    .iter()
                    .map(move |img| (section.clone(), img.as_str()))
            })
            .collect();

        let mut plan = OrphanPlan::default();

        for yard in self.yards.yards() {
            if !self.library.folder_exists(&yard.folder) {
                tracing::warn!("Image folder not found: {}", yard.folder);
                continue;
            }

            let mut claimed: HashSet<String> = HashSet::new();
            for filename in self.library.list(&yard.folder)? {
                if !self.is_image(&filename)
                    || referenced.contains(&(yard.code.clone(), filename.as_str()))
                {
                    continue;
                }

                let orphan = self.inspect(yard, &filename, &by_id, &claimed);
                if let Some(plot) = orphan.misfiled_plot() {
                    tracing::warn!("{} in {} belongs to plot {} of another yard", filename, yard.folder, plot);
                }
                if let Some((fix, plot)) = orphan.resolution() {
                    let final_name = match fix {
                        Some(check) => {
                            claimed.insert(check.issue.suggested.clone());
                            plan.renames.push(PlannedRename {
                                folder: yard.folder.clone(),
                                from: filename.clone(),
                                to: check.issue.suggested.clone(),
                                reason: check.issue.reason.clone(),
                            });
                            check.issue.suggested.clone()
                        }
                        None => filename.clone(),
                    };
                    plan.attachments
                        .entry(plot.to_string())
                        .or_default()
                        .push(final_name);
                }
                plan.orphans.push(orphan);
            }
        }

        Ok(plan)
    }

    fn apply(&self, plan: &OrphanPlan) -> Result<()> {
        for rename in &plan.renames {
            tracing::info!("Renaming {} → {}", rename.from, rename.to);
            self.library.rename(&rename.folder, &rename.from, &rename.to)?;
        }

        if plan.attachments.is_empty() {
            return Ok(());
        }

        let mut plots = self.store.read_table(tables::PLOTS)?;
        let plot_idx = plots.column_index(columns::PLOT_ID)?;
        let images_idx = plots.column_index(columns::MONUMENT_IMAGES)?;

        for row in 0..plots.len() {
            let plot_id = plots.get(row, plot_idx).trim().to_string();
            if let Some(new_images) = plan.attachments.get(&plot_id) {
                let mut combined = parse_image_list(plots.get(row, images_idx));
                combined.extend(new_images.iter().cloned());
                let combined = dedup_preserving_order(combined);
                tracing::info!(
                    "Updated {}: added {} images (total: {})",
                    plot_id,
                    new_images.len(),
                    combined.len()
                );
                plots.set(row, images_idx, join_image_list(&combined));
            }
        }

        self.store.write_table(&plots, self.quoting.plots)
    }
}
