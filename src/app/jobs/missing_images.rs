use super::{banner, rule};
use crate::config::toml_config::TablesConfig;
use crate::core::{ChangeSet, ImageLibrary, Job, Result, TableStore};
use crate::domain::model::{columns, join_image_list, tables, PlotRecord};
use crate::domain::reference::YardTable;
use crate::utils::error::RecordsError;
use std::collections::BTreeMap;

/// Drop `monument_images` entries whose file is not in the plot's yard folder.
pub struct CleanupMissingImagesJob<S: TableStore, L: ImageLibrary> {
    store: S,
    library: L,
    yards: YardTable,
    quoting: TablesConfig,
}

impl<S: TableStore, L: ImageLibrary> CleanupMissingImagesJob<S, L> {
    pub fn new(store: S, library: L, yards: YardTable, quoting: TablesConfig) -> Self {
        Self {
            store,
            library,
            yards,
            quoting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotCleanup {
    pub row: usize,
    pub plot_id: String,
    pub kept: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CleanupPlan {
    pub images_checked: usize,
    pub cleanups: Vec<PlotCleanup>,
    /// Section prefix -> plots left untouched because no yard uses that prefix.
    pub unknown_sections: BTreeMap<String, Vec<String>>,
}

impl CleanupPlan {
    pub fn images_removed(&self) -> usize {
        self.cleanups.iter().map(|c| c.removed.len()).sum()
    }
}

impl ChangeSet for CleanupPlan {
    fn change_count(&self) -> usize {
        self.cleanups.len()
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        banner(&mut lines, "Cemetery Plot Image Cleanup");

        for cleanup in &self.cleanups {
            lines.push(String::new());
            lines.push(format!("Plot {}:", cleanup.plot_id));
            lines.push(format!("  Removed {} missing image(s):", cleanup.removed.len()));
            for image in &cleanup.removed {
                lines.push(format!("    - {}", image));
            }
            if cleanup.kept.is_empty() {
                lines.push("  No images remaining".to_string());
            } else {
                lines.push(format!("  Kept {} valid image(s)", cleanup.kept.len()));
            }
        }

        for (prefix, plots) in &self.unknown_sections {
            lines.push(String::new());
            lines.push(format!(
                "Unknown section '{}': {} plot(s) not checked ({})",
                prefix,
                plots.len(),
                plots.join(", ")
            ));
        }

        lines.push(String::new());
        lines.push(rule('='));
        if self.cleanups.is_empty() {
            lines.push("No missing images found - CSV is clean!".to_string());
        } else {
            lines.push(format!(
                "{} missing images in {} plots",
                self.images_removed(),
                self.cleanups.len()
            ));
        }
        lines.push(format!("  Total images checked: {}", self.images_checked));
        lines.push(rule('='));

        lines.join("\n")
    }
}

impl<S: TableStore, L: ImageLibrary> Job for CleanupMissingImagesJob<S, L> {
    type Plan = CleanupPlan;

    fn name(&self) -> &'static str {
        "cleanup-missing-images"
    }

    fn plan(&self) -> Result<CleanupPlan> {
        let plots = PlotRecord::read_all(&self.store.read_table(tables::PLOTS)?)?;
        let mut plan = CleanupPlan::default();

        for plot in plots.into_iter().filter(|p| !p.monument_images.is_empty()) {
            let yard = match self.yards.yard_for_plot(&plot.plot_id) {
                Ok(yard) => yard,
                Err(RecordsError::UnknownYard { code }) => {
                    tracing::warn!("Plot {} has unknown section '{}', left untouched", plot.plot_id, code);
                    plan.unknown_sections.entry(code).or_default().push(plot.plot_id);
                    continue;
                }
                Err(e) => return Err(e),
            };

            plan.images_checked += plot.monument_images.len();
            let (kept, removed): (Vec<String>, Vec<String>) = plot
                .monument_images
                .into_iter()
                .partition(|image| self.library.contains(&yard.folder, image));

            if !removed.is_empty() {
                plan.cleanups.push(PlotCleanup {
                    row: plot.row,
                    plot_id: plot.plot_id,
                    kept,
                    removed,
                });
            }
        }

        Ok(plan)
    }

    fn apply(&self, plan: &CleanupPlan) -> Result<()> {
        let mut plots = self.store.read_table(tables::PLOTS)?;
        let images_idx = plots.column_index(columns::MONUMENT_IMAGES)?;

        for cleanup in &plan.cleanups {
            plots.set(cleanup.row, images_idx, join_image_list(&cleanup.kept));
        }

        self.store.write_table(&plots, self.quoting.plots)?;
        tracing::info!(
            "Removed {} images from {} plots",
            plan.images_removed(),
            plan.cleanups.len()
        );
        Ok(())
    }
}
