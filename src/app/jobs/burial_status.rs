use super::{banner, rule};
use crate::config::toml_config::{BurialStatusConfig, TablesConfig};
use crate::core::names::normalize_name;
use crate::core::{ChangeSet, Job, Result, TableStore};
use crate::domain::model::{columns, tables, OccupantRecord, OccupantStatus};
use std::collections::{BTreeMap, HashMap, HashSet};

const CHANGES_SHOWN: usize = 10;

/// Mark listed occupants as `Cremation` or `Vault`.
pub struct UpdateBurialStatusJob<S: TableStore> {
    store: S,
    lists: BurialStatusConfig,
    quoting: TablesConfig,
}

impl<S: TableStore> UpdateBurialStatusJob<S> {
    pub fn new(store: S, lists: BurialStatusConfig, quoting: TablesConfig) -> Self {
        Self {
            store,
            lists,
            quoting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurialStatusChange {
    pub row: usize,
    pub lot_id: String,
    pub name: String,
    pub new_status: OccupantStatus,
}

#[derive(Debug, Clone, Default)]
pub struct BurialStatusPlan {
    pub cremation_total: usize,
    pub vault_total: usize,
    pub changes: Vec<BurialStatusChange>,
    pub cremations_not_found: Vec<String>,
    pub vaults_not_found: Vec<String>,
    /// Status counts once the changes are applied.
    pub final_counts: BTreeMap<String, usize>,
}

impl BurialStatusPlan {
    fn changes_to(&self, status: &OccupantStatus) -> Vec<&BurialStatusChange> {
        self.changes.iter().filter(|c| &c.new_status == status).collect()
    }
}

fn render_group(
    lines: &mut Vec<String>,
    title: &str,
    total: usize,
    changes: &[&BurialStatusChange],
    not_found: &[String],
) {
    banner(lines, title);
    lines.push(format!("Total names listed: {}", total));
    lines.push(format!("To update: {}", changes.len()));
    for change in changes.iter().take(CHANGES_SHOWN) {
        lines.push(format!("  ✓ {} ({})", change.name, change.lot_id));
    }
    if changes.len() > CHANGES_SHOWN {
        lines.push(format!("  ... and {} more", changes.len() - CHANGES_SHOWN));
    }
    if !not_found.is_empty() {
        lines.push(format!("⚠ Not found in occupants.csv ({}):", not_found.len()));
        for name in not_found {
            lines.push(format!("  - {}", name));
        }
    }
    lines.push(String::new());
}

impl ChangeSet for BurialStatusPlan {
    fn change_count(&self) -> usize {
        self.changes.len()
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        render_group(
            &mut lines,
            "CREMATION STATUS UPDATES",
            self.cremation_total,
            &self.changes_to(&OccupantStatus::Cremation),
            &self.cremations_not_found,
        );
        render_group(
            &mut lines,
            "VAULT STATUS UPDATES",
            self.vault_total,
            &self.changes_to(&OccupantStatus::Vault),
            &self.vaults_not_found,
        );

        banner(&mut lines, "FINAL STATUS COUNT");
        for (status, count) in &self.final_counts {
            lines.push(format!("{:<20} {:>4} records", status, count));
        }
        lines.push(rule('='));

        lines.join("\n")
    }
}

/// Normalized name -> listed spelling, keeping list order for reporting.
fn index_names(names: &[String]) -> (HashMap<String, &str>, Vec<String>) {
    let mut index = HashMap::new();
    let mut order = Vec::new();
    for name in names {
        let key = normalize_name(name);
        if index.insert(key.clone(), name.as_str()).is_none() {
            order.push(key);
        }
    }
    (index, order)
}

impl<S: TableStore> Job for UpdateBurialStatusJob<S> {
    type Plan = BurialStatusPlan;

    fn name(&self) -> &'static str {
        "update-burial-status"
    }

    fn plan(&self) -> Result<BurialStatusPlan> {
        let occupants = OccupantRecord::read_all(&self.store.read_table(tables::OCCUPANTS)?)?;
        tracing::debug!("Loaded {} occupants", occupants.len());

        let (cremations, cremation_order) = index_names(&self.lists.cremations);
        let (vaults, vault_order) = index_names(&self.lists.vaults);

        let mut plan = BurialStatusPlan {
            cremation_total: cremations.len(),
            vault_total: vaults.len(),
            ..Default::default()
        };
        let mut seen: HashSet<String> = HashSet::new();

        for occupant in &occupants {
            let key = normalize_name(&occupant.name);
            let target = if cremations.contains_key(&key) {
                Some(OccupantStatus::Cremation)
            } else if vaults.contains_key(&key) {
                Some(OccupantStatus::Vault)
            } else {
                None
            };

            let final_status = match target {
                Some(status) if status != occupant.status => {
                    plan.changes.push(BurialStatusChange {
                        row: occupant.row,
                        lot_id: occupant.lot_id.clone(),
                        name: occupant.name.clone(),
                        new_status: status.clone(),
                    });
                    status
                }
                _ => occupant.status.clone(),
            };
            *plan
                .final_counts
                .entry(final_status.as_str().to_string())
                .or_insert(0) += 1;
            seen.insert(key);
        }

        let missing = |order: &[String], index: &HashMap<String, &str>| -> Vec<String> {
            order
                .iter()
                .filter(|key| !seen.contains(*key))
                .filter_map(|key| index.get(key).map(|name| name.to_string()))
                .collect()
        };
        plan.cremations_not_found = missing(&cremation_order, &cremations);
        plan.vaults_not_found = missing(&vault_order, &vaults);

        Ok(plan)
    }

    fn apply(&self, plan: &BurialStatusPlan) -> Result<()> {
        let mut table = self.store.read_table(tables::OCCUPANTS)?;
        let status_idx = table.column_index(columns::STATUS)?;

        for change in &plan.changes {
            table.set(change.row, status_idx, change.new_status.as_str());
        }

        self.store.write_table(&table, self.quoting.occupants)?;
        tracing::info!("Updated {} occupant statuses", plan.changes.len());
        Ok(())
    }
}
