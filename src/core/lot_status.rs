//! Lot status derivation and the generated available-lots table.

use crate::domain::model::{columns, tables, LotRecord, LotStatus, OccupantRecord};
use crate::domain::reference::NotAvailableLots;
use crate::domain::table::Table;
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Purchase and occupancy facts for one lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotFacts {
    pub purchased_rights: i64,
    pub remaining_rights: i64,
    pub live_occupants: usize,
}

pub struct LotStatusReconciler<'a> {
    overrides: &'a NotAvailableLots,
}

impl<'a> LotStatusReconciler<'a> {
    pub fn new(overrides: &'a NotAvailableLots) -> Self {
        Self { overrides }
    }

    /// Rules are checked in order; the override list always wins.
    pub fn status_for(&self, lot_id: &str, facts: LotFacts) -> LotStatus {
        if self.overrides.contains(lot_id) {
            LotStatus::NotAvailable
        } else if facts.purchased_rights == 0 {
            LotStatus::Available
        } else if facts.live_occupants == 0 {
            LotStatus::Unoccupied
        } else if facts.remaining_rights > 0 {
            LotStatus::PartiallyOccupied
        } else {
            LotStatus::FullyOccupied
        }
    }

    /// Recompute every lot of `lots` against `occupants`, returning the updated table,
    /// the changes, and the regenerated available-lots table.
    pub fn reconcile(&self, lots: &Table, occupants: &[OccupantRecord]) -> Result<Reconciliation> {
        let records = LotRecord::read_all(lots)?;
        let live = live_occupant_counts(occupants);
        let status_idx = lots.column_index(columns::STATUS)?;

        let mut updated = lots.clone();
        let mut changes = Vec::new();
        let mut distribution: BTreeMap<LotStatus, usize> =
            LotStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut available: BTreeMap<String, Vec<i64>> = BTreeMap::new();

        for lot in &records {
            let facts = LotFacts {
                purchased_rights: lot.purchased_rights,
                remaining_rights: lot.remaining_rights,
                live_occupants: live.get(lot.lot_id.as_str()).copied().unwrap_or(0),
            };
            let status = self.status_for(&lot.lot_id, facts);
            *distribution.entry(status).or_insert(0) += 1;

            if status == LotStatus::Available {
                available
                    .entry(lot.plot_id.clone())
                    .or_default()
                    .push(lot.lot_number);
            }

            if lot.status != status.as_str() {
                tracing::debug!("{}: {} -> {}", lot.lot_id, lot.status, status);
                updated.set(lot.row, status_idx, status.as_str());
                changes.push(StatusChange {
                    lot_id: lot.lot_id.clone(),
                    old_status: lot.status.clone(),
                    new_status: status,
                    purchased_rights: facts.purchased_rights,
                    remaining_rights: facts.remaining_rights,
                    live_occupants: facts.live_occupants,
                });
            }
        }

        Ok(Reconciliation {
            lots: updated,
            changes,
            distribution,
            available_lots: available_lots_table(available),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub lot_id: String,
    pub old_status: String,
    pub new_status: LotStatus,
    pub purchased_rights: i64,
    pub remaining_rights: i64,
    pub live_occupants: usize,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub lots: Table,
    pub changes: Vec<StatusChange>,
    pub distribution: BTreeMap<LotStatus, usize>,
    pub available_lots: Table,
}

/// Non-Reserved occupants per lot id.
pub fn live_occupant_counts(occupants: &[OccupantRecord]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for occupant in occupants.iter().filter(|o| o.status.is_live()) {
        *counts.entry(occupant.lot_id.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Build `available_lots.csv` from scratch: one row per plot, lot numbers ascending.
pub fn available_lots_table(by_plot: BTreeMap<String, Vec<i64>>) -> Table {
    let mut table = Table::new(
        tables::AVAILABLE_LOTS,
        vec![
            columns::PLOT_ID.to_string(),
            columns::LOTS_AVAILABLE.to_string(),
        ],
    );

    for (plot_id, mut numbers) in by_plot {
        numbers.sort_unstable();
        let joined = numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(",");
        table.push_row(vec![plot_id, joined]);
    }

    table
}

/// Parse a `lots_available` cell (`"1,5"`). Blank cells are an empty list.
pub fn parse_lot_list(cell: &str) -> std::result::Result<Vec<i64>, std::num::ParseIntError> {
    cell.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<i64>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OccupantStatus;

    fn facts(purchased: i64, remaining: i64, live: usize) -> LotFacts {
        LotFacts {
            purchased_rights: purchased,
            remaining_rights: remaining,
            live_occupants: live,
        }
    }

    fn occupant(lot_id: &str, status: &str) -> OccupantRecord {
        OccupantRecord {
            row: 0,
            lot_id: lot_id.to_string(),
            name: "Someone".to_string(),
            status: OccupantStatus::from_field(status),
            birth_date: String::new(),
            death_date: String::new(),
        }
    }

    #[test]
    fn test_unpurchased_is_available_regardless_of_occupants() {
        let overrides = NotAvailableLots::default();
        let r = LotStatusReconciler::new(&overrides);
        assert_eq!(r.status_for("CYA1-L1", facts(0, 0, 0)), LotStatus::Available);
        assert_eq!(r.status_for("CYA1-L1", facts(0, 0, 3)), LotStatus::Available);
    }

    #[test]
    fn test_status_decision_order() {
        let overrides = NotAvailableLots::default();
        let r = LotStatusReconciler::new(&overrides);
        assert_eq!(r.status_for("L", facts(2, 0, 2)), LotStatus::FullyOccupied);
        assert_eq!(r.status_for("L", facts(1, 1, 0)), LotStatus::Unoccupied);
        assert_eq!(r.status_for("L", facts(2, 1, 1)), LotStatus::PartiallyOccupied);
        assert_eq!(r.status_for("L", facts(2, 0, 0)), LotStatus::Unoccupied);
    }

    #[test]
    fn test_override_wins_over_unpurchased() {
        let overrides = NotAvailableLots::new(["OYK1-L1"]);
        let r = LotStatusReconciler::new(&overrides);
        assert_eq!(r.status_for("OYK1-L1", facts(0, 0, 0)), LotStatus::NotAvailable);
        assert_eq!(r.status_for("OYK1-L1", facts(2, 0, 2)), LotStatus::NotAvailable);
    }

    #[test]
    fn test_reserved_occupants_do_not_count() {
        let occupants = vec![
            occupant("CYA1-L1", "Occupant"),
            occupant("CYA1-L1", "Reserved"),
            occupant("CYA1-L2", "Reserved"),
            occupant("CYA1-L3", "Cremation"),
        ];
        let counts = live_occupant_counts(&occupants);
        assert_eq!(counts.get("CYA1-L1"), Some(&1));
        assert_eq!(counts.get("CYA1-L2"), None);
        assert_eq!(counts.get("CYA1-L3"), Some(&1));
    }

    #[test]
    fn test_reconcile_regenerates_available_lots() {
        let csv = "lot_id,plot_id,lot_number,purchased_rights,remaining_rights,status\n\
                   CYA1-L3,CYA1,3,0,0,Unoccupied\n\
                   CYA1-L1,CYA1,1,0,0,Available\n\
                   CYA1-L2,CYA1,2,2,1,Available\n\
                   ITC12-L4,ITC12,4,0,0,Available\n";
        let lots = Table::from_reader("lots.csv", csv.as_bytes()).unwrap();
        let occupants = vec![occupant("CYA1-L2", "Occupant")];
        let overrides = NotAvailableLots::default();

        let result = LotStatusReconciler::new(&overrides)
            .reconcile(&lots, &occupants)
            .unwrap();

        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.changes[0].lot_id, "CYA1-L3");
        assert_eq!(result.changes[0].new_status, LotStatus::Available);
        assert_eq!(result.changes[1].new_status, LotStatus::PartiallyOccupied);
        assert_eq!(result.distribution[&LotStatus::Available], 3);

        let available = result.available_lots;
        assert_eq!(available.rows()[0], vec!["CYA1", "1,3"]);
        assert_eq!(available.rows()[1], vec!["ITC12", "4"]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let csv = "lot_id,plot_id,lot_number,purchased_rights,remaining_rights,status\n\
                   CYA1-L1,CYA1,1,2,0,Available\n\
                   CYA1-L2,CYA1,2,1,1,Fully Occupied\n";
        let lots = Table::from_reader("lots.csv", csv.as_bytes()).unwrap();
        let occupants = vec![occupant("CYA1-L1", "Occupant"), occupant("CYA1-L1", "Vault")];
        let overrides = NotAvailableLots::default();
        let reconciler = LotStatusReconciler::new(&overrides);

        let first = reconciler.reconcile(&lots, &occupants).unwrap();
        assert_eq!(first.changes.len(), 2);

        let second = reconciler.reconcile(&first.lots, &occupants).unwrap();
        assert!(second.changes.is_empty());
        assert_eq!(second.lots, first.lots);
    }

    #[test]
    fn test_parse_lot_list() {
        assert_eq!(parse_lot_list("1, 5").unwrap(), vec![1, 5]);
        assert!(parse_lot_list("").unwrap().is_empty());
        assert!(parse_lot_list("1,x").is_err());
    }
}
