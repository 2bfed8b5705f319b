use super::{banner, rule};
use crate::core::{ChangeSet, Job, Result, TableStore};
use crate::domain::model::tables;

const HEADER_KEYWORDS: [&str; 4] = ["lot_id", "plot_id", "name", "status"];
const MIN_COMMAS: usize = 4;
const MIN_KEYWORDS: usize = 2;

/// Put a header line that was sorted into the data back on line 1.
pub struct FixCsvHeadersJob<S: TableStore> {
    store: S,
    files: Vec<&'static str>,
}

impl<S: TableStore> FixCsvHeadersJob<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            files: vec![tables::OCCUPANTS, tables::LOTS, tables::PLOTS],
        }
    }
}

fn is_header_like(line: &str) -> bool {
    let lower = line.to_lowercase();
    line.matches(',').count() >= MIN_COMMAS
        && HEADER_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count() >= MIN_KEYWORDS
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderStatus {
    AlreadyFirst,
    /// `line` is 1-based.
    Moved { line: usize, data_rows: usize, fixed: String },
    NoHeader,
    Empty,
    Missing,
}

/// Decide what to do with one file's text.
pub fn check_header(text: &str) -> HeaderStatus {
    if text.is_empty() {
        return HeaderStatus::Empty;
    }

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut header: Option<(usize, &str)> = None;
    let mut data = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if is_header_like(line) {
            header = Some((i, *line));
        } else if !line.trim().is_empty() {
            data.push(*line);
        }
    }

    let Some((index, header_line)) = header else {
        return HeaderStatus::NoHeader;
    };
    let header_count = lines.iter().filter(|l| is_header_like(l)).count();
    if index == 0 && header_count == 1 {
        return HeaderStatus::AlreadyFirst;
    }

    let mut fixed = String::with_capacity(text.len());
    for line in std::iter::once(header_line).chain(data.iter().copied()) {
        fixed.push_str(line);
        if !line.ends_with('\n') {
            fixed.push('\n');
        }
    }

    HeaderStatus::Moved {
        line: index + 1,
        data_rows: data.len(),
        fixed,
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeaderPlan {
    pub files: Vec<(String, HeaderStatus)>,
}

impl HeaderPlan {
    pub fn all_good(&self) -> bool {
        self.files.iter().all(|(_, status)| {
            matches!(status, HeaderStatus::AlreadyFirst | HeaderStatus::Moved { .. })
        })
    }
}

impl ChangeSet for HeaderPlan {
    fn change_count(&self) -> usize {
        self.files
            .iter()
            .filter(|(_, status)| matches!(status, HeaderStatus::Moved { .. }))
            .count()
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        banner(&mut lines, "CSV HEADER POSITION CHECK");

        for (file, status) in &self.files {
            lines.push(match status {
                HeaderStatus::AlreadyFirst => format!("✓ {}: Header already at line 1", file),
                HeaderStatus::Moved { line, data_rows, .. } => format!(
                    "⚠ {}: Header found at line {}, moving to line 1 ({} data rows)",
                    file, line, data_rows
                ),
                HeaderStatus::NoHeader => format!("✗ {}: No header found!", file),
                HeaderStatus::Empty => format!("✗ {} is empty", file),
                HeaderStatus::Missing => format!("✗ {}: File not found", file),
            });
        }

        lines.push(rule('='));
        if self.all_good() {
            lines.push("✓ All CSV files have headers at line 1".to_string());
        } else {
            lines.push("⚠ Some files had issues - check output above".to_string());
        }
        lines.push(rule('='));

        lines.join("\n")
    }
}

impl<S: TableStore> Job for FixCsvHeadersJob<S> {
    type Plan = HeaderPlan;

    fn name(&self) -> &'static str {
        "fix-csv-headers"
    }

    fn plan(&self) -> Result<HeaderPlan> {
        let mut plan = HeaderPlan::default();
        for file in &self.files {
            let status = if self.store.exists(file) {
                check_header(&self.store.read_text(file)?)
            } else {
                HeaderStatus::Missing
            };
            if let HeaderStatus::Moved { line, .. } = &status {
                tracing::warn!("{}: header found at line {}", file, line);
            }
            plan.files.push((file.to_string(), status));
        }
        Ok(plan)
    }

    fn apply(&self, plan: &HeaderPlan) -> Result<()> {
        for (file, status) in &plan.files {
            if let HeaderStatus::Moved { fixed, data_rows, .. } = status {
                self.store.write_text(file, fixed)?;
                tracing::info!("{}: header at line 1, {} data rows", file, data_rows);
            }
        }
        Ok(())
    }
}
