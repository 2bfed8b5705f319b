pub mod burial_status;
pub mod headers;
pub mod lot_status;
pub mod missing_images;
pub mod orphaned_images;
pub mod plot_images;
pub mod reports;
pub mod validation;
pub mod veterans;

pub use burial_status::UpdateBurialStatusJob;
pub use headers::FixCsvHeadersJob;
pub use lot_status::FixLotStatusJob;
pub use missing_images::CleanupMissingImagesJob;
pub use orphaned_images::MatchOrphanedImagesJob;
pub use plot_images::UpdatePlotImagesJob;
pub use reports::{MissingDatesReport, OldestAtDeathReport, OldestBurialsReport};
pub use validation::ValidateDataJob;
pub use veterans::{AddVeteranColumnJob, FixVeteranSuffixesJob};

pub(crate) const WIDTH: usize = 100;

pub(crate) fn rule(ch: char) -> String {
    std::iter::repeat(ch).take(WIDTH).collect()
}

pub(crate) fn banner(lines: &mut Vec<String>, title: &str) {
    lines.push(rule('='));
    lines.push(title.to_string());
    lines.push(rule('='));
}

pub(crate) fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(title.to_string());
    lines.push(rule('-'));
}

/// Order-preserving de-duplication.
pub(crate) fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
