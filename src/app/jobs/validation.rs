use super::{banner, rule, section};
use crate::core::lot_status::{live_occupant_counts, parse_lot_list};
use crate::core::{ChangeSet, Job, Result, TableStore};
use crate::domain::model::{columns, tables, LotRecord, LotStatus, OccupantRecord};
use crate::domain::reference::YardTable;
use crate::utils::error::RecordsError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const REPORT_FILE: &str = "validation_report.json";

const SHARED_LOTS_SHOWN: usize = 20;

/// Cross-check lots, occupants and available_lots and write a JSON report.
pub struct ValidateDataJob<S: TableStore, R: TableStore> {
    store: S,
    reports: R,
    yards: YardTable,
}

impl<S: TableStore, R: TableStore> ValidateDataJob<S, R> {
    pub fn new(store: S, reports: R, yards: YardTable) -> Self {
        Self {
            store,
            reports,
            yards,
        }
    }

    fn read_available(&self) -> Result<Vec<(String, Vec<i64>)>> {
        let table = self.store.read_table(tables::AVAILABLE_LOTS)?;
        let plot_idx = table.column_index(columns::PLOT_ID)?;
        let lots_idx = table.column_index(columns::LOTS_AVAILABLE)?;

        (0..table.len())
            .map(|row| {
                let cell = table.get(row, lots_idx);
                let numbers = parse_lot_list(cell).map_err(|_| RecordsError::InvalidNumber {
                    table: table.name().to_string(),
                    row: row + 1,
                    field: columns::LOTS_AVAILABLE.to_string(),
                    value: cell.to_string(),
                })?;
                Ok((table.get(row, plot_idx).trim().to_string(), numbers))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityMismatch {
    pub plot_id: String,
    pub lot_id: Option<String>,
    pub lot_number: Option<i64>,
    pub issue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMismatch {
    pub lot_id: String,
    pub status: String,
    pub occupants: usize,
    pub issue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedOccupant {
    pub lot_id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedLot {
    pub lot_id: String,
    pub count: usize,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub available_plots: usize,
    pub total_lots: usize,
    pub total_plots: usize,
    pub occupied_lots: usize,
    pub total_occupants: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub summary: ValidationSummary,
    pub available_lots_mismatches: Vec<AvailabilityMismatch>,
    pub status_mismatches: Vec<StatusMismatch>,
    pub orphaned_occupants: Vec<OrphanedOccupant>,
    pub shared_lots: Vec<SharedLot>,
    /// Section prefix -> plots whose prefix matches no configured yard.
    pub unknown_sections: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.available_lots_mismatches.is_empty()
            && self.status_mismatches.is_empty()
            && self.orphaned_occupants.is_empty()
    }
}

impl ChangeSet for ValidationReport {
    /// Problems found. Shared lots are informational and not counted.
    fn change_count(&self) -> usize {
        self.available_lots_mismatches.len()
            + self.status_mismatches.len()
            + self.orphaned_occupants.len()
            + self.unknown_sections.values().map(Vec::len).sum::<usize>()
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        let s = &self.summary;
        banner(&mut lines, "OICA Cemetery - Data Validation Report");
        lines.push(format!("Available Lots CSV: {} plots with available lots", s.available_plots));
        lines.push(format!("Lots CSV: {} total lots across {} plots", s.total_lots, s.total_plots));
        lines.push(format!("Occupants CSV: {} lots with occupants", s.occupied_lots));
        lines.push(format!("Total occupants: {}", s.total_occupants));
        lines.push(String::new());

        section(&mut lines, "CHECK 1: Available lots CSV vs Lots CSV status consistency");
        if self.available_lots_mismatches.is_empty() {
            lines.push("✓ No mismatches found - available_lots.csv is consistent with lots.csv".to_string());
        } else {
            lines.push(format!("Found {} mismatches:", self.available_lots_mismatches.len()));
            for m in &self.available_lots_mismatches {
                let lot = m.lot_number.map_or_else(|| "?".to_string(), |n| n.to_string());
                lines.push(format!("  {} (Lot {}): {}", m.plot_id, lot, m.issue));
            }
        }
        lines.push(String::new());

        section(&mut lines, "CHECK 2: Lots CSV status vs actual occupants in occupants.csv");
        if self.status_mismatches.is_empty() {
            lines.push("✓ No status mismatches - lots.csv status matches occupants.csv".to_string());
        } else {
            lines.push(format!("Found {} status mismatches:", self.status_mismatches.len()));
            for m in &self.status_mismatches {
                lines.push(format!("  {}: {}", m.lot_id, m.issue));
            }
        }
        lines.push(String::new());

        section(&mut lines, "CHECK 3: Orphaned occupants (lot_id not found in lots.csv)");
        if self.orphaned_occupants.is_empty() {
            lines.push("✓ No orphaned occupants - all lot_ids in occupants.csv exist in lots.csv".to_string());
        } else {
            lines.push(format!("Found {} orphaned occupants:", self.orphaned_occupants.len()));
            for o in &self.orphaned_occupants {
                lines.push(format!("  {}: {} ({})", o.lot_id, o.name, o.status));
            }
        }
        lines.push(String::new());

        section(&mut lines, "CHECK 4: Lots with multiple occupants (shared lots)");
        if self.shared_lots.is_empty() {
            lines.push("No lots with multiple occupants".to_string());
        } else {
            lines.push(format!("Found {} lots with multiple occupants:", self.shared_lots.len()));
            for lot in self.shared_lots.iter().take(SHARED_LOTS_SHOWN) {
                lines.push(format!("  {}: {} occupants - {}", lot.lot_id, lot.count, lot.names.join(", ")));
            }
            if self.shared_lots.len() > SHARED_LOTS_SHOWN {
                lines.push(format!("  ... and {} more", self.shared_lots.len() - SHARED_LOTS_SHOWN));
            }
        }
        lines.push(String::new());

        if !self.unknown_sections.is_empty() {
            section(&mut lines, "Unknown plot sections");
            for (prefix, plots) in &self.unknown_sections {
                lines.push(format!("  {}: {}", prefix, plots.join(", ")));
            }
            lines.push(String::new());
        }

        lines.push(rule('='));
        lines.push("SUMMARY".to_string());
        lines.push(rule('='));
        lines.push(format!("Available lots mismatches: {}", self.available_lots_mismatches.len()));
        lines.push(format!("Status mismatches: {}", self.status_mismatches.len()));
        lines.push(format!("Orphaned occupants: {}", self.orphaned_occupants.len()));
        lines.push(format!("Shared lots: {}", self.shared_lots.len()));
        lines.push(String::new());
        if self.passed() {
            lines.push("✓ All validation checks passed!".to_string());
        } else {
            lines.push("⚠ Issues found - review discrepancies above".to_string());
        }

        lines.join("\n")
    }
}

fn check_availability(
    available: &[(String, Vec<i64>)],
    lots: &[LotRecord],
) -> Vec<AvailabilityMismatch> {
    let mut by_plot: HashMap<&str, Vec<&LotRecord>> = HashMap::new();
    for lot in lots {
        by_plot.entry(lot.plot_id.as_str()).or_default().push(lot);
    }

    let available_status = LotStatus::Available.as_str();
    let mut mismatches = Vec::new();

    for (plot_id, numbers) in available {
        let Some(plot_lots) = by_plot.get(plot_id.as_str()) else {
            mismatches.push(AvailabilityMismatch {
                plot_id: plot_id.clone(),
                lot_id: None,
                lot_number: None,
                issue: format!("Plot {} in available_lots.csv but not found in lots.csv", plot_id),
            });
            continue;
        };

        for lot in plot_lots {
            let listed = numbers.contains(&lot.lot_number);
            let issue = match (lot.status == available_status, listed) {
                (true, false) => format!(
                    "Lot {} is 'Available' in lots.csv but NOT listed in available_lots.csv",
                    lot.lot_number
                ),
                (false, true) => format!(
                    "Lot {} is '{}' in lots.csv but IS listed as available in available_lots.csv",
                    lot.lot_number, lot.status
                ),
                _ => continue,
            };
            mismatches.push(AvailabilityMismatch {
                plot_id: plot_id.clone(),
                lot_id: Some(lot.lot_id.clone()),
                lot_number: Some(lot.lot_number),
                issue,
            });
        }
    }

    let listed_plots: HashSet<&str> = available.iter().map(|(p, _)| p.as_str()).collect();
    for lot in lots
        .iter()
        .filter(|l| l.status == available_status && !listed_plots.contains(l.plot_id.as_str()))
    {
        mismatches.push(AvailabilityMismatch {
            plot_id: lot.plot_id.clone(),
            lot_id: Some(lot.lot_id.clone()),
            lot_number: Some(lot.lot_number),
            issue: format!(
                "Lot {} is 'Available' in lots.csv but plot {} is missing from available_lots.csv",
                lot.lot_number, lot.plot_id
            ),
        });
    }

    mismatches
}

fn check_statuses(lots: &[LotRecord], occupants: &[OccupantRecord]) -> Vec<StatusMismatch> {
    let live = live_occupant_counts(occupants);

    lots.iter()
        .filter_map(|lot| {
            let count = live.get(lot.lot_id.as_str()).copied().unwrap_or(0);
            let issue = match (LotStatus::parse(&lot.status), lot.status.as_str()) {
                (Some(LotStatus::Available), _) if count > 0 => {
                    format!("Marked 'Available' but has {} actual occupants", count)
                }
                (Some(LotStatus::FullyOccupied | LotStatus::PartiallyOccupied), _) | (None, "Occupied")
                    if count == 0 =>
                {
                    format!("Marked '{}' but has NO actual occupants", lot.status)
                }
                _ => return None,
            };
            Some(StatusMismatch {
                lot_id: lot.lot_id.clone(),
                status: lot.status.clone(),
                occupants: count,
                issue,
            })
        })
        .collect()
}

impl<S: TableStore, R: TableStore> Job for ValidateDataJob<S, R> {
    type Plan = ValidationReport;

    fn name(&self) -> &'static str {
        "validate-data"
    }

    fn plan(&self) -> Result<ValidationReport> {
        let available = self.read_available()?;
        let lots = LotRecord::read_all(&self.store.read_table(tables::LOTS)?)?;
        let occupants = OccupantRecord::read_all(&self.store.read_table(tables::OCCUPANTS)?)?;

        let mut occupants_by_lot: BTreeMap<&str, Vec<&OccupantRecord>> = BTreeMap::new();
        for occupant in &occupants {
            occupants_by_lot
                .entry(occupant.lot_id.as_str())
                .or_default()
                .push(occupant);
        }

        let lot_ids: HashSet<&str> = lots.iter().map(|l| l.lot_id.as_str()).collect();
        let plot_ids: Vec<&str> = {
            let mut seen = HashSet::new();
            lots.iter()
                .map(|l| l.plot_id.as_str())
                .filter(|p| seen.insert(*p))
                .collect()
        };

        let orphaned_occupants = occupants_by_lot
            .iter()
            .filter(|(lot_id, _)| !lot_ids.contains(*lot_id))
            .flat_map(|(_, occs)| occs.iter())
            .map(|o| OrphanedOccupant {
                lot_id: o.lot_id.clone(),
                name: o.name.clone(),
                status: o.status.as_str().to_string(),
            })
            .collect();

        let shared_lots = occupants_by_lot
            .iter()
            .filter(|(_, occs)| occs.len() > 1)
            .map(|(lot_id, occs)| SharedLot {
                lot_id: lot_id.to_string(),
                count: occs.len(),
                names: occs.iter().map(|o| o.name.clone()).collect(),
            })
            .collect();

        let mut unknown_sections: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for plot_id in &plot_ids {
            if let Err(RecordsError::UnknownYard { code }) = self.yards.yard_for_plot(plot_id) {
                unknown_sections.entry(code).or_default().push(plot_id.to_string());
            }
        }

        let report = ValidationReport {
            summary: ValidationSummary {
                available_plots: available.len(),
                total_lots: lots.len(),
                total_plots: plot_ids.len(),
                occupied_lots: occupants_by_lot.len(),
                total_occupants: occupants.len(),
            },
            available_lots_mismatches: check_availability(&available, &lots),
            status_mismatches: check_statuses(&lots, &occupants),
            orphaned_occupants,
            shared_lots,
            unknown_sections,
        };

        if !report.passed() {
            tracing::warn!("Validation found {} problem(s)", report.change_count());
        }
        Ok(report)
    }

    fn apply(&self, plan: &ValidationReport) -> Result<()> {
        let json = serde_json::to_string_pretty(plan)?;
        self.reports.write_text(REPORT_FILE, &json)?;
        tracing::info!("Wrote {}", REPORT_FILE);
        Ok(())
    }
}
