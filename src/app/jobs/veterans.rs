//! Veteran bookkeeping: the Suffix column in veterans.csv and the veteran flag in occupants.csv.

use super::{banner, section};
use crate::config::toml_config::TablesConfig;
use crate::core::names::{split_suffix, VeteranIndex, VeteranMatch};
use crate::core::{ChangeSet, Job, Result, TableStore};
use crate::domain::model::{columns, tables, OccupantRecord, VeteranRecord};
use std::collections::BTreeMap;

const EXAMPLES_SHOWN: usize = 5;
const VETERAN_YES: &str = "Yes";

/// Move Jr./Sr./III and similar out of `Middle Name/Initial` into a `Suffix` column.
pub struct FixVeteranSuffixesJob<S: TableStore> {
    store: S,
    quoting: TablesConfig,
}

impl<S: TableStore> FixVeteranSuffixesJob<S> {
    pub fn new(store: S, quoting: TablesConfig) -> Self {
        Self { store, quoting }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixFix {
    pub row: usize,
    pub name: String,
    pub original_middle: String,
    pub new_middle: String,
    pub suffix: String,
}

#[derive(Debug, Clone, Default)]
pub struct SuffixPlan {
    pub total_records: usize,
    pub column_added: bool,
    pub fixes: Vec<SuffixFix>,
    /// Rows that already carry a different suffix; left as they are.
    pub conflicts: Vec<SuffixFix>,
}

impl ChangeSet for SuffixPlan {
    fn change_count(&self) -> usize {
        self.fixes.len() + usize::from(self.column_added)
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        banner(&mut lines, "Veteran Suffixes");
        lines.push(format!("Loaded {} veteran records", self.total_records));
        if self.column_added {
            lines.push(format!(
                "'{}' column will be added after '{}'",
                columns::SUFFIX,
                columns::MIDDLE_NAME
            ));
        }
        lines.push(String::new());

        lines.push(format!("Found {} records with suffixes to move:", self.fixes.len()));
        for (i, fix) in self.fixes.iter().enumerate() {
            lines.push(format!("{:2}. {}", i + 1, fix.name));
            lines.push(format!(
                "    Middle: '{}' → '{}'  Suffix: '{}'",
                fix.original_middle, fix.new_middle, fix.suffix
            ));
        }

        if !self.conflicts.is_empty() {
            lines.push(String::new());
            section(
                &mut lines,
                &format!("Skipped, suffix already set: {}", self.conflicts.len()),
            );
            for conflict in &self.conflicts {
                lines.push(format!(
                    "  {}: middle '{}' ends in '{}'",
                    conflict.name, conflict.original_middle, conflict.suffix
                ));
            }
        }

        lines.join("\n")
    }
}

impl<S: TableStore> Job for FixVeteranSuffixesJob<S> {
    type Plan = SuffixPlan;

    fn name(&self) -> &'static str {
        "fix-veteran-suffixes"
    }

    fn plan(&self) -> Result<SuffixPlan> {
        let table = self.store.read_table(tables::VETERANS)?;
        let veterans = VeteranRecord::read_all(&table)?;

        let mut plan = SuffixPlan {
            total_records: veterans.len(),
            column_added: !table.has_column(columns::SUFFIX),
            ..Default::default()
        };

        for vet in &veterans {
            let (new_middle, suffix) = split_suffix(&vet.middle);
            if suffix.is_empty() {
                continue;
            }

            let fix = SuffixFix {
                row: vet.row,
                name: [vet.first.as_str(), vet.middle.as_str(), vet.last.as_str()]
                    .iter()
                    .filter(|p| !p.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" "),
                original_middle: vet.middle.clone(),
                new_middle,
                suffix,
            };

            if vet.suffix.is_empty() || vet.suffix == fix.suffix {
                plan.fixes.push(fix);
            } else {
                tracing::warn!("{} already has suffix '{}', skipping", fix.name, vet.suffix);
                plan.conflicts.push(fix);
            }
        }

        Ok(plan)
    }

    fn apply(&self, plan: &SuffixPlan) -> Result<()> {
        let mut table = self.store.read_table(tables::VETERANS)?;
        let suffix_idx = table.ensure_column_after(columns::MIDDLE_NAME, columns::SUFFIX)?;
        let middle_idx = table.column_index(columns::MIDDLE_NAME)?;

        for fix in &plan.fixes {
            table.set(fix.row, middle_idx, fix.new_middle.as_str());
            table.set(fix.row, suffix_idx, fix.suffix.as_str());
        }

        self.store.write_table(&table, self.quoting.veterans)?;
        tracing::info!(
            "Updated {} with {} suffixes moved",
            tables::VETERANS,
            plan.fixes.len()
        );
        Ok(())
    }
}

/// Flag occupants whose name matches a veteran.
pub struct AddVeteranColumnJob<S: TableStore> {
    store: S,
    quoting: TablesConfig,
}

impl<S: TableStore> AddVeteranColumnJob<S> {
    pub fn new(store: S, quoting: TablesConfig) -> Self {
        Self { store, quoting }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VeteranFlag {
    pub row: usize,
    pub lot_id: String,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMatch {
    pub lot_id: String,
    pub occupant: String,
    pub veterans: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VeteranColumnPlan {
    pub variant_count: usize,
    pub column_added: bool,
    pub matched: Vec<(String, String)>,
    pub flags: Vec<VeteranFlag>,
    pub ambiguous: Vec<AmbiguousMatch>,
    /// Veteran display name -> every occupant (name, lot id) it matched, when more than one.
    pub shared_veterans: BTreeMap<String, Vec<(String, String)>>,
}

impl ChangeSet for VeteranColumnPlan {
    fn change_count(&self) -> usize {
        self.flags.len() + usize::from(self.column_added)
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        banner(&mut lines, "Veteran Column");
        lines.push(format!("Loaded {} veteran name variants", self.variant_count));
        if self.column_added {
            lines.push(format!(
                "'{}' column will be added after '{}'",
                columns::VETERAN,
                columns::STATUS
            ));
        }
        lines.push(format!("Matched {} occupants as veterans", self.matched.len()));
        lines.push(format!("{} veteran flags to change", self.flags.len()));
        lines.push(String::new());

        lines.push("Example veterans found:".to_string());
        for (name, lot_id) in self.matched.iter().take(EXAMPLES_SHOWN) {
            lines.push(format!("  {} - {}", name, lot_id));
        }

        if !self.ambiguous.is_empty() {
            lines.push(String::new());
            section(
                &mut lines,
                &format!("Occupants matching several veterans: {}", self.ambiguous.len()),
            );
            for m in &self.ambiguous {
                lines.push(format!("  {} ({}): {}", m.occupant, m.lot_id, m.veterans.join("; ")));
            }
        }

        if !self.shared_veterans.is_empty() {
            lines.push(String::new());
            section(
                &mut lines,
                &format!("Veterans matching several occupants: {}", self.shared_veterans.len()),
            );
            for (veteran, occupants) in &self.shared_veterans {
                let list: Vec<String> = occupants
                    .iter()
                    .map(|(name, lot)| format!("{} ({})", name, lot))
                    .collect();
                lines.push(format!("  {}: {}", veteran, list.join(", ")));
            }
        }

        lines.join("\n")
    }
}

impl<S: TableStore> Job for AddVeteranColumnJob<S> {
    type Plan = VeteranColumnPlan;

    fn name(&self) -> &'static str {
        "add-veteran-column"
    }

    fn plan(&self) -> Result<VeteranColumnPlan> {
        let veterans = VeteranRecord::read_all(&self.store.read_table(tables::VETERANS)?)?;
        let index = VeteranIndex::build(&veterans);

        let table = self.store.read_table(tables::OCCUPANTS)?;
        let occupants = OccupantRecord::read_all(&table)?;
        let veteran_idx = table.column_index(columns::VETERAN).ok();

        let mut plan = VeteranColumnPlan {
            variant_count: index.variant_count(),
            column_added: veteran_idx.is_none(),
            ..Default::default()
        };
        let mut by_veteran: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();

        for occupant in &occupants {
            let found = index.lookup(&occupant.name);
            match &found {
                VeteranMatch::None => {}
                VeteranMatch::One(vet) => {
                    by_veteran
                        .entry(vet.display_name())
                        .or_default()
                        .push((occupant.name.clone(), occupant.lot_id.clone()));
                }
                VeteranMatch::Many(vets) => {
                    plan.ambiguous.push(AmbiguousMatch {
                        lot_id: occupant.lot_id.clone(),
                        occupant: occupant.name.clone(),
                        veterans: vets.iter().map(|v| v.display_name()).collect(),
                    });
                }
            }

            let value = if found.is_match() {
                plan.matched
                    .push((occupant.name.clone(), occupant.lot_id.clone()));
                VETERAN_YES
            } else {
                ""
            };

            let current = veteran_idx
                .map(|idx| table.get(occupant.row, idx).trim())
                .unwrap_or("");
            if current != value {
                plan.flags.push(VeteranFlag {
                    row: occupant.row,
                    lot_id: occupant.lot_id.clone(),
                    name: occupant.name.clone(),
                    value: value.to_string(),
                });
            }
        }

        plan.shared_veterans = by_veteran
            .into_iter()
            .filter(|(_, occupants)| occupants.len() > 1)
            .collect();

        Ok(plan)
    }

    fn apply(&self, plan: &VeteranColumnPlan) -> Result<()> {
        let mut table = self.store.read_table(tables::OCCUPANTS)?;
        let veteran_idx = table.ensure_column_after(columns::STATUS, columns::VETERAN)?;

        for flag in &plan.flags {
            table.set(flag.row, veteran_idx, flag.value.as_str());
        }

        self.store.write_table(&table, self.quoting.occupants)?;
        tracing::info!("Updated {} veteran flags in {}", plan.flags.len(), tables::OCCUPANTS);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MockStore;

    const VETERANS: &str = "First Name,Middle Name/Initial,Last Name,Branch,Service Period\n\
                            John,Q. Jr.,Adams,Army,WWII\n\
                            Mary,,Smith,Navy,Korea\n\
                            Pat,A,Jones,Army,WWI\n\
                            Pat,B,Jones,Navy,WWI\n";

    const OCCUPANTS: &str = "lot_id,name,status,birth_date\n\
                             CYA1-L1,John Q. Adams Jr.,Occupant,1/1/1920\n\
                             CYA1-L2,Mary Smith,Occupant,\n\
                             CYA2-L1,Mary Smith,Occupant,\n\
                             CYA3-L1,Pat Jones,Occupant,\n\
                             CYA4-L1,Nobody Known,Occupant,\n";

    #[test]
    fn test_suffixes_are_moved_into_new_column() {
        let store = MockStore::new().with_file("veterans.csv", VETERANS);
        let job = FixVeteranSuffixesJob::new(store.clone(), TablesConfig::default());
        let plan = job.plan().unwrap();

        assert!(plan.column_added);
        assert_eq!(plan.fixes.len(), 1);
        assert_eq!(plan.fixes[0].new_middle, "Q.");
        assert_eq!(plan.fixes[0].suffix, "Jr.");

        job.apply(&plan).unwrap();
        let written = store.get_file("veterans.csv").unwrap();
        assert!(written.starts_with(
            "First Name,Middle Name/Initial,Suffix,Last Name,Branch,Service Period\n"
        ));
        assert!(written.contains("John,Q.,Jr.,Adams,Army,WWII"));
        assert!(written.contains("Mary,,,Smith,Navy,Korea"));

        assert_eq!(job.plan().unwrap().change_count(), 0);
    }

    #[test]
    fn test_existing_suffix_is_never_cleared() {
        let csv = "First Name,Middle Name/Initial,Suffix,Last Name\n\
                   Tom,Lee III,Sr.,Brown\n";
        let store = MockStore::new().with_file("veterans.csv", csv);
        let plan = FixVeteranSuffixesJob::new(store, TablesConfig::default())
            .plan()
            .unwrap();
        assert!(plan.fixes.is_empty());
        assert_eq!(plan.conflicts.len(), 1);
        assert_eq!(plan.change_count(), 0);
    }

    #[test]
    fn test_veteran_flags_and_ambiguity() {
        let store = MockStore::new()
            .with_file("veterans.csv", VETERANS)
            .with_file("occupants.csv", OCCUPANTS);
        let suffixes = FixVeteranSuffixesJob::new(store.clone(), TablesConfig::default());
        suffixes.apply(&suffixes.plan().unwrap()).unwrap();

        let job = AddVeteranColumnJob::new(store.clone(), TablesConfig::default());
        let plan = job.plan().unwrap();

        assert!(plan.column_added);
        assert_eq!(plan.matched.len(), 4);
        assert_eq!(plan.ambiguous.len(), 1);
        assert_eq!(plan.ambiguous[0].veterans, vec!["Pat A Jones", "Pat B Jones"]);
        assert_eq!(plan.shared_veterans.len(), 1);
        assert_eq!(plan.shared_veterans["Mary Smith"].len(), 2);

        job.apply(&plan).unwrap();
        let written = store.get_file("occupants.csv").unwrap();
        assert!(written.starts_with("lot_id,name,status,veteran,birth_date\n"));
        assert!(written.contains("CYA1-L1,John Q. Adams Jr.,Occupant,Yes,1/1/1920"));
        assert!(written.contains("CYA4-L1,Nobody Known,Occupant,,"));

        assert_eq!(job.plan().unwrap().change_count(), 0);
    }
}
