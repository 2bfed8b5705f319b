use super::{banner, section};
use crate::config::toml_config::TablesConfig;
use crate::core::filename::FilenameParser;
use crate::core::{ChangeSet, ImageLibrary, Job, Result, TableStore};
use crate::domain::model::{columns, join_image_list, parse_image_list, tables};
use crate::domain::reference::YardTable;
use std::collections::{BTreeMap, HashSet};

/// Pull canonical image names found in the yard folders into `plots.csv`.
pub struct UpdatePlotImagesJob<S: TableStore, L: ImageLibrary> {
    store: S,
    library: L,
    yards: YardTable,
    parser: FilenameParser,
    quoting: TablesConfig,
}

impl<S: TableStore, L: ImageLibrary> UpdatePlotImagesJob<S, L> {
    pub fn new(store: S, library: L, yards: YardTable, parser: FilenameParser, quoting: TablesConfig) -> Self {
        Self {
            store,
            library,
            yards,
            parser,
            quoting,
        }
    }

    fn scan(&self, plan: &mut PlotImagesPlan) -> Result<BTreeMap<String, Vec<String>>> {
        let mut found: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for yard in self.yards.yards() {
            if !self.library.folder_exists(&yard.folder) {
                tracing::warn!("Folder '{}' not found, skipping", yard.folder);
                plan.missing_folders.push(yard.folder.clone());
                continue;
            }

            for filename in self.library.list(&yard.folder)? {
                let Some(parsed) = self.parser.parse(&filename) else {
                    continue;
                };
                if parsed.yard_code != yard.code {
                    tracing::warn!(
                        "{} has yard code {} but is in the {} folder",
                        filename,
                        parsed.yard_code,
                        yard.code
                    );
                    plan.mismatched.push(YardMismatch {
                        filename,
                        file_yard: parsed.yard_code,
                        folder_yard: yard.code.clone(),
                    });
                    continue;
                }
                tracing::debug!("Found {} -> plot {}, lot {}", filename, parsed.plot_id, parsed.lot_number);
                found.entry(parsed.plot_id).or_default().push(filename);
            }
        }

        Ok(found)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YardMismatch {
    pub filename: String,
    pub file_yard: String,
    pub folder_yard: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotImageUpdate {
    pub row: usize,
    pub plot_id: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlotImagesPlan {
    pub scanned_plots: usize,
    pub updates: Vec<PlotImageUpdate>,
    pub mismatched: Vec<YardMismatch>,
    pub missing_folders: Vec<String>,
    /// Plots that have images on disk but no row in plots.csv.
    pub unknown_plots: BTreeMap<String, Vec<String>>,
}

impl ChangeSet for PlotImagesPlan {
    fn change_count(&self) -> usize {
        self.updates.len()
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        banner(&mut lines, "Cemetery Plot Image Updater");
        lines.push(format!("Found new images for {} plots", self.scanned_plots));

        for update in &self.updates {
            lines.push(String::new());
            lines.push(format!("Plot {}:", update.plot_id));
            let before = if update.before.is_empty() {
                "(empty)"
            } else {
                update.before.as_str()
            };
            lines.push(format!("  Before: {}", before));
            lines.push(format!("  After:  {}", update.after));
        }

        if !self.mismatched.is_empty() {
            lines.push(String::new());
            section(&mut lines, &format!("Yard code mismatches: {}", self.mismatched.len()));
            for m in &self.mismatched {
                lines.push(format!(
                    "  {} has yard code {} but is in {} folder",
                    m.filename, m.file_yard, m.folder_yard
                ));
            }
        }

        if !self.unknown_plots.is_empty() {
            lines.push(String::new());
            section(
                &mut lines,
                &format!("Images for plots not in plots.csv: {}", self.unknown_plots.len()),
            );
            for (plot, images) in &self.unknown_plots {
                lines.push(format!("  {}: {}", plot, join_image_list(images)));
            }
        }

        lines.push(String::new());
        if self.updates.is_empty() {
            lines.push("No updates needed - all images already in CSV.".to_string());
        } else {
            lines.push(format!("{} plots to update", self.updates.len()));
        }

        lines.join("\n")
    }
}

impl<S: TableStore, L: ImageLibrary> Job for UpdatePlotImagesJob<S, L> {
    type Plan = PlotImagesPlan;

    fn name(&self) -> &'static str {
        "update-plot-images"
    }

    fn plan(&self) -> Result<PlotImagesPlan> {
        let plots = self.store.read_table(tables::PLOTS)?;
        let plot_idx = plots.column_index(columns::PLOT_ID)?;
        let images_idx = plots.column_index(columns::MONUMENT_IMAGES)?;

        let mut plan = PlotImagesPlan::default();
        let mut found = self.scan(&mut plan)?;
        plan.scanned_plots = found.len();

        for row in 0..plots.len() {
            let plot_id = plots.get(row, plot_idx).trim();
            let Some(new_images) = found.remove(plot_id) else {
                continue;
            };

            let before = plots.get(row, images_idx).trim().to_string();
            let mut combined = parse_image_list(&before);
            let mut seen: HashSet<String> = combined.iter().map(|img| img.to_lowercase()).collect();
            for image in new_images {
                if seen.insert(image.to_lowercase()) {
                    combined.push(image);
                }
            }

            let after = join_image_list(&self.parser.sorted(combined));
            if after != before {
                plan.updates.push(PlotImageUpdate {
                    row,
                    plot_id: plot_id.to_string(),
                    before,
                    after,
                });
            }
        }

        plan.unknown_plots = found;
        Ok(plan)
    }

    fn apply(&self, plan: &PlotImagesPlan) -> Result<()> {
        let mut plots = self.store.read_table(tables::PLOTS)?;
        let images_idx = plots.column_index(columns::MONUMENT_IMAGES)?;

        for update in &plan.updates {
            plots.set(update.row, images_idx, update.after.as_str());
        }

        self.store.write_table(&plots, self.quoting.plots)?;
        tracing::info!("{} plots modified", plan.updates.len());
        Ok(())
    }
}
