use super::{banner, section};
use crate::config::toml_config::TablesConfig;
use crate::core::lot_status::{LotStatusReconciler, Reconciliation, StatusChange};
use crate::core::{ChangeSet, Job, Result, TableStore};
use crate::domain::model::{columns, tables, OccupantRecord};
use crate::domain::reference::NotAvailableLots;
use std::collections::BTreeMap;

const EXAMPLES_PER_GROUP: usize = 5;

/// Recompute every lot status and regenerate `available_lots.csv`.
pub struct FixLotStatusJob<S: TableStore> {
    store: S,
    overrides: NotAvailableLots,
    quoting: TablesConfig,
}

impl<S: TableStore> FixLotStatusJob<S> {
    pub fn new(store: S, overrides: NotAvailableLots, quoting: TablesConfig) -> Self {
        Self {
            store,
            overrides,
            quoting,
        }
    }
}

pub struct LotStatusPlan {
    pub reconciliation: Reconciliation,
    pub available_lots_changed: bool,
}

impl LotStatusPlan {
    pub fn changes(&self) -> &[StatusChange] {
        &self.reconciliation.changes
    }
}

impl ChangeSet for LotStatusPlan {
    fn change_count(&self) -> usize {
        self.reconciliation.changes.len() + usize::from(self.available_lots_changed)
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        banner(&mut lines, "Lot Status Reconciliation");
        lines.push(String::new());

        section(&mut lines, "STATUS DISTRIBUTION:");
        for (status, count) in &self.reconciliation.distribution {
            lines.push(format!("  {}: {} lots", status, count));
        }
        lines.push(String::new());

        section(
            &mut lines,
            &format!("CHANGES NEEDED: {}", self.reconciliation.changes.len()),
        );
        if self.reconciliation.changes.is_empty() {
            lines.push("No changes needed - all statuses are correct".to_string());
        } else {
            let mut by_kind: BTreeMap<String, Vec<&StatusChange>> = BTreeMap::new();
            for change in &self.reconciliation.changes {
                let old = if change.old_status.is_empty() {
                    "(blank)"
                } else {
                    change.old_status.as_str()
                };
                by_kind
                    .entry(format!("{} → {}", old, change.new_status))
                    .or_default()
                    .push(change);
            }

            for (kind, items) in by_kind {
                lines.push(String::new());
                lines.push(format!("{}: {} lots", kind, items.len()));
                for item in items.iter().take(EXAMPLES_PER_GROUP) {
                    lines.push(format!(
                        "  {}: Purchased: {}, Remaining: {}, Occupants: {}",
                        item.lot_id, item.purchased_rights, item.remaining_rights, item.live_occupants
                    ));
                }
                if items.len() > EXAMPLES_PER_GROUP {
                    lines.push(format!("  ... and {} more", items.len() - EXAMPLES_PER_GROUP));
                }
            }
        }
        lines.push(String::new());

        let available = &self.reconciliation.available_lots;
        let total: usize = available
            .rows()
            .iter()
            .map(|row| row.get(1).map_or(0, |cell| cell.split(',').filter(|s| !s.is_empty()).count()))
            .sum();
        lines.push(format!(
            "available_lots.csv: {} plots, {} unpurchased lots{}",
            available.len(),
            total,
            if self.available_lots_changed {
                " (will be regenerated)"
            } else {
                " (up to date)"
            }
        ));

        lines.join("\n")
    }
}

impl<S: TableStore> Job for FixLotStatusJob<S> {
    type Plan = LotStatusPlan;

    fn name(&self) -> &'static str {
        "fix-lot-status"
    }

    fn plan(&self) -> Result<LotStatusPlan> {
        let occupants_table = self.store.read_table(tables::OCCUPANTS)?;
        let occupants = OccupantRecord::read_all(&occupants_table)?;
        let lots = self.store.read_table(tables::LOTS)?;
        tracing::debug!("Loaded {} lots and {} occupants", lots.len(), occupants.len());

        let reconciliation = LotStatusReconciler::new(&self.overrides).reconcile(&lots, &occupants)?;

        let existing = self
            .store
            .read_table_or_empty(tables::AVAILABLE_LOTS, &[columns::PLOT_ID, columns::LOTS_AVAILABLE])?;
        let available_lots_changed = existing != reconciliation.available_lots;

        Ok(LotStatusPlan {
            reconciliation,
            available_lots_changed,
        })
    }

    fn apply(&self, plan: &LotStatusPlan) -> Result<()> {
        if !plan.reconciliation.changes.is_empty() {
            self.store
                .write_table(&plan.reconciliation.lots, self.quoting.lots)?;
            tracing::info!("Updated {} lot statuses in {}", plan.reconciliation.changes.len(), tables::LOTS);
        }

        if plan.available_lots_changed {
            self.store
                .write_table(&plan.reconciliation.available_lots, self.quoting.available_lots)?;
            tracing::info!(
                "Regenerated {} with {} plots",
                tables::AVAILABLE_LOTS,
                plan.reconciliation.available_lots.len()
            );
        }

        Ok(())
    }
}
