//! Read-only occupant reports. Each writes a fixed-width `<name>_report.txt` and a
//! tab-separated `<name>_report_for_word.txt` that pastes into a word processor as a table.

use crate::core::dates::{age_in_years, parse_loose_date};
use crate::core::{ChangeSet, Job, Result, TableStore};
use crate::domain::model::{tables, OccupantRecord, OccupantStatus};

const TOP_N: usize = 10;
const MAX_AGE: f64 = 130.0;
const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub name: &'static str,
    pub rows: usize,
    pub text: String,
    pub word: String,
}

impl ReportDocument {
    pub fn text_file(&self) -> String {
        format!("{}_report.txt", self.name)
    }

    pub fn word_file(&self) -> String {
        format!("{}_report_for_word.txt", self.name)
    }

    fn write_to<R: TableStore>(&self, reports: &R) -> Result<()> {
        reports.write_text(&self.text_file(), &self.text)?;
        reports.write_text(&self.word_file(), &self.word)?;
        tracing::info!("Report saved to {} and {}", self.text_file(), self.word_file());
        Ok(())
    }
}

impl ChangeSet for ReportDocument {
    fn change_count(&self) -> usize {
        self.rows
    }

    fn render(&self) -> String {
        self.text.clone()
    }
}

fn heavy(width: usize) -> String {
    "=".repeat(width)
}

fn load_occupants<S: TableStore>(store: &S) -> Result<Vec<OccupantRecord>> {
    OccupantRecord::read_all(&store.read_table(tables::OCCUPANTS)?)
}

/// Non-Reserved occupants missing a birth date, a death date, or both.
pub struct MissingDatesReport<S: TableStore, R: TableStore> {
    store: S,
    reports: R,
}

impl<S: TableStore, R: TableStore> MissingDatesReport<S, R> {
    pub fn new(store: S, reports: R) -> Self {
        Self { store, reports }
    }
}

impl<S: TableStore, R: TableStore> Job for MissingDatesReport<S, R> {
    type Plan = ReportDocument;

    fn name(&self) -> &'static str {
        "missing-dates"
    }

    fn plan(&self) -> Result<ReportDocument> {
        let occupants = load_occupants(&self.store)?;

        let mut both = Vec::new();
        let mut no_birth = Vec::new();
        let mut no_death = Vec::new();
        for occ in occupants
            .iter()
            .filter(|o| o.status != OccupantStatus::Reserved)
        {
            match (occ.birth_date.is_empty(), occ.death_date.is_empty()) {
                (true, true) => both.push(occ),
                (true, false) => no_birth.push(occ),
                (false, true) => no_death.push(occ),
                (false, false) => {}
            }
        }
        let missing = both.len() + no_birth.len() + no_death.len();

        let title = "MISSING DATES REPORT - OICA Cemetery Occupants";
        let rule = heavy(80);
        let mut text = vec![rule.clone(), title.to_string(), rule.clone(), String::new()];
        text.push(format!("Total occupants: {}", occupants.len()));
        text.push(format!("Missing both DOB and DOD: {}", both.len()));
        text.push(format!("Missing DOB only: {}", no_birth.len()));
        text.push(format!("Missing DOD only: {}", no_death.len()));
        text.push(format!("Total with missing date info: {}", missing));

        let mut word = vec![title.to_string(), String::new()];
        word.push(format!("Total occupants: {}", occupants.len()));
        word.push(format!("Total with missing date info: {}", missing));
        word.push(String::new());
        word.push("Missing\tLot ID\tName\tBirth Date\tDeath Date".to_string());

        let groups = [
            ("MISSING BOTH DOB AND DOD", "Both", &both),
            ("MISSING DOB ONLY", "DOB", &no_birth),
            ("MISSING DOD ONLY", "DOD", &no_death),
        ];
        for (heading, label, group) in groups {
            for occ in group.iter() {
                word.push(format!(
                    "{}\t{}\t{}\t{}\t{}",
                    label, occ.lot_id, occ.name, occ.birth_date, occ.death_date
                ));
            }
            if group.is_empty() {
                continue;
            }
            text.push(String::new());
            text.push(rule.clone());
            text.push(format!("{} ({} occupants)", heading, group.len()));
            text.push(rule.clone());
            for occ in group.iter() {
                text.push(match label {
                    "DOB" => format!("  {:<15} {:<40} DOD: {}", occ.lot_id, occ.name, occ.death_date),
                    "DOD" => format!("  {:<15} {:<40} DOB: {}", occ.lot_id, occ.name, occ.birth_date),
                    _ => format!("  {:<15} {}", occ.lot_id, occ.name),
                });
            }
        }
        text.push(String::new());
        text.push(rule);

        Ok(ReportDocument {
            name: "missing_dates",
            rows: missing,
            text: text.join("\n") + "\n",
            word: word.join("\n") + "\n",
        })
    }

    fn apply(&self, plan: &ReportDocument) -> Result<()> {
        plan.write_to(&self.reports)
    }
}

/// The ten earliest parseable death dates.
pub struct OldestBurialsReport<S: TableStore, R: TableStore> {
    store: S,
    reports: R,
}

impl<S: TableStore, R: TableStore> OldestBurialsReport<S, R> {
    pub fn new(store: S, reports: R) -> Self {
        Self { store, reports }
    }
}

impl<S: TableStore, R: TableStore> Job for OldestBurialsReport<S, R> {
    type Plan = ReportDocument;

    fn name(&self) -> &'static str {
        "oldest-burials"
    }

    fn plan(&self) -> Result<ReportDocument> {
        let occupants = load_occupants(&self.store)?;

        let mut burials: Vec<_> = occupants
            .iter()
            .filter_map(|o| parse_loose_date(&o.death_date).map(|d| (d, o)))
            .collect();
        burials.sort_by_key(|(date, _)| *date);

        let title = "OLDEST BURIALS (EARLIEST DEATH DATES) - OICA Cemetery";
        let rule = heavy(90);
        let mut text = vec![rule.clone(), title.to_string(), rule.clone(), String::new()];
        text.push(format!("Total occupants with death dates: {}", burials.len()));
        text.push(String::new());
        text.push(format!("Top {} Oldest Burials:", TOP_N));
        text.push(String::new());
        text.push(format!("{:<6} {:<15} {:<35} {:<12} {}", "Rank", "Lot ID", "Name", "Birth", "Death"));
        text.push("-".repeat(90));

        let mut word = vec![title.to_string(), String::new()];
        word.push(format!("Total occupants with death dates: {}", burials.len()));
        word.push(String::new());
        word.push(format!("Top {} Oldest Burials:", TOP_N));
        word.push(String::new());
        word.push("Rank\tLot ID\tName\tBirth\tDeath".to_string());

        for (rank, (_, occ)) in burials.iter().take(TOP_N).enumerate() {
            let birth = if occ.birth_date.is_empty() {
                UNKNOWN
            } else {
                occ.birth_date.as_str()
            };
            text.push(format!(
                "{:<6} {:<15} {:<35} {:<12} {}",
                rank + 1,
                occ.lot_id,
                occ.name,
                birth,
                occ.death_date
            ));
            word.push(format!(
                "{}\t{}\t{}\t{}\t{}",
                rank + 1,
                occ.lot_id,
                occ.name,
                birth,
                occ.death_date
            ));
        }
        text.push(String::new());
        text.push(rule);

        Ok(ReportDocument {
            name: "oldest_burials",
            rows: burials.len().min(TOP_N),
            text: text.join("\n") + "\n",
            word: word.join("\n") + "\n",
        })
    }

    fn apply(&self, plan: &ReportDocument) -> Result<()> {
        plan.write_to(&self.reports)
    }
}

/// The ten greatest ages at death among occupants with both dates.
pub struct OldestAtDeathReport<S: TableStore, R: TableStore> {
    store: S,
    reports: R,
}

impl<S: TableStore, R: TableStore> OldestAtDeathReport<S, R> {
    pub fn new(store: S, reports: R) -> Self {
        Self { store, reports }
    }
}

impl<S: TableStore, R: TableStore> Job for OldestAtDeathReport<S, R> {
    type Plan = ReportDocument;

    fn name(&self) -> &'static str {
        "oldest-at-death"
    }

    fn plan(&self) -> Result<ReportDocument> {
        let occupants = load_occupants(&self.store)?;

        let mut ages: Vec<(f64, &OccupantRecord)> = occupants
            .iter()
            .filter_map(|o| {
                let birth = parse_loose_date(&o.birth_date)?;
                let death = parse_loose_date(&o.death_date)?;
                let age = age_in_years(birth, death);
                (age > 0.0 && age < MAX_AGE).then_some((age, o))
            })
            .collect();
        ages.sort_by(|a, b| b.0.total_cmp(&a.0));

        let title = "OLDEST OCCUPANTS AT DEATH - OICA Cemetery";
        let rule = heavy(80);
        let mut text = vec![rule.clone(), title.to_string(), rule.clone(), String::new()];
        text.push(format!("Total occupants with both dates: {}", ages.len()));
        text.push(String::new());
        text.push(format!("Top {} Oldest at Death:", TOP_N));
        text.push(String::new());
        text.push(format!("{:<6} {:<15} {:<35} {:<8} {}", "Rank", "Lot ID", "Name", "Age", "Birth - Death"));
        text.push("-".repeat(80));

        let mut word = vec![title.to_string(), String::new()];
        word.push(format!("Total occupants with both dates: {}", ages.len()));
        word.push(String::new());
        word.push(format!("Top {} Oldest at Death:", TOP_N));
        word.push(String::new());
        word.push("Rank\tLot ID\tName\tAge (years)\tBirth Date\tDeath Date".to_string());

        for (rank, (age, occ)) in ages.iter().take(TOP_N).enumerate() {
            let age = format!("{:.1}", age);
            text.push(format!(
                "{:<6} {:<15} {:<35} {:<8} {} - {}",
                rank + 1,
                occ.lot_id,
                occ.name,
                age,
                occ.birth_date,
                occ.death_date
            ));
            word.push(format!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                rank + 1,
                occ.lot_id,
                occ.name,
                age,
                occ.birth_date,
                occ.death_date
            ));
        }
        text.push(String::new());
        text.push(rule);

        Ok(ReportDocument {
            name: "oldest_at_death",
            rows: ages.len().min(TOP_N),
            text: text.join("\n") + "\n",
            word: word.join("\n") + "\n",
        })
    }

    fn apply(&self, plan: &ReportDocument) -> Result<()> {
        plan.write_to(&self.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MockStore;

    const OCCUPANTS: &str = "lot_id,name,status,birth_date,death_date\n\
                             CYA1-L1,Ann Old,Occupant,1/1/1800,1/1/1899\n\
                             CYA1-L2,Ben Young,Occupant,1/1/1900,6/1/1950\n\
                             CYA1-L3,Cal Early,Occupant,,1850\n\
                             CYA1-L4,Dee Wrong,Occupant,1/1/1990,1/1/1980\n\
                             CYA1-L5,Eve Reserved,Reserved,,\n\
                             CYA1-L6,Fay Nodates,Occupant,,\n\
                             CYA1-L7,Gus Nodeath,Occupant,3/1901,\n";

    fn store() -> MockStore {
        MockStore::new().with_file("occupants.csv", OCCUPANTS)
    }

    #[test]
    fn test_missing_dates_skips_reserved() {
        let report = MissingDatesReport::new(store(), MockStore::new()).plan().unwrap();
        assert_eq!(report.rows, 3);
        assert!(report.text.contains("Missing both DOB and DOD: 1"));
        assert!(report.text.contains("Missing DOB only: 1"));
        assert!(report.text.contains("Missing DOD only: 1"));
        assert!(!report.text.contains("Eve Reserved"));
        assert!(report.word.contains("DOD\tCYA1-L7\tGus Nodeath\t3/1901\t"));
    }

    #[test]
    fn test_oldest_burials_order() {
        let report = OldestBurialsReport::new(store(), MockStore::new()).plan().unwrap();
        let rows: Vec<&str> = report
            .word
            .lines()
            .skip_while(|l| !l.starts_with("Rank"))
            .skip(1)
            .collect();
        assert_eq!(rows[0], "1\tCYA1-L3\tCal Early\tUnknown\t1850");
        assert_eq!(rows[1], "2\tCYA1-L1\tAnn Old\t1/1/1800\t1/1/1899");
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_oldest_at_death_filters_impossible_ages() {
        let report = OldestAtDeathReport::new(store(), MockStore::new()).plan().unwrap();
        assert!(report.text.contains("Total occupants with both dates: 2"));
        assert!(report.word.contains("1\tCYA1-L1\tAnn Old\t99.0\t1/1/1800\t1/1/1899"));
        assert!(!report.text.contains("Dee Wrong"));
    }

    #[test]
    fn test_apply_writes_both_files() {
        let reports = MockStore::new();
        let job = OldestBurialsReport::new(store(), reports.clone());
        let report = job.plan().unwrap();
        job.apply(&report).unwrap();
        assert_eq!(
            reports.writes(),
            vec!["oldest_burials_report.txt", "oldest_burials_report_for_word.txt"]
        );
    }
}
