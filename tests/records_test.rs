use anyhow::Result;
use cemetery_records::app::jobs::{
    AddVeteranColumnJob, FixCsvHeadersJob, FixVeteranSuffixesJob, OldestAtDeathReport,
    UpdateBurialStatusJob, ValidateDataJob,
};
use cemetery_records::utils::validation::Validate;
use cemetery_records::{JobRunner, LocalTableStore, RecordsConfig, RunMode};
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[paths]
data_dir = "records"
reports_dir = "out"

[burial_status]
cremations = ["Dorothy Atwood"]
vaults = ["Libby Judkins", "Dorothy Atwood"]
"#;

const OCCUPANTS: &str = "lot_id,name,status,birth_date,death_date\n\
                         CYA1-L1,Dorothy Atwood,Occupant,1/1/1900,1/1/1990\n\
                         CYA1-L2,Libby Judkins,Occupant,5/5/1920,\n\
                         CYA1-L3,John Q. Adams Jr.,Occupant,7/4/1890,7/4/1975\n";

const LOTS: &str = "lot_id,plot_id,lot_number,purchased_rights,remaining_rights,status\n\
                    CYA1-L1,CYA1,1,1,0,Fully Occupied\n\
                    CYA1-L2,CYA1,2,1,0,Fully Occupied\n\
                    CYA1-L3,CYA1,3,1,0,Fully Occupied\n\
                    CYA1-L4,CYA1,4,0,0,Available\n";

const VETERANS: &str = "First Name,Middle Name/Initial,Last Name,Branch,Service Period\n\
                        John,Q. Jr.,Adams,Army,WWI\n";

fn setup() -> Result<(TempDir, RecordsConfig)> {
    let dir = TempDir::new()?;
    let config_path = dir.path().join("cemetery.toml");
    fs::write(&config_path, CONFIG)?;
    let config = RecordsConfig::from_file(&config_path)?;
    config.validate()?;

    let data = config.data_dir(dir.path());
    fs::create_dir_all(&data)?;
    fs::write(data.join("occupants.csv"), OCCUPANTS)?;
    fs::write(data.join("lots.csv"), LOTS)?;
    fs::write(data.join("veterans.csv"), VETERANS)?;
    fs::write(data.join("available_lots.csv"), "plot_id,lots_available\nCYA1,4\n")?;
    Ok((dir, config))
}

fn data(dir: &TempDir, config: &RecordsConfig) -> LocalTableStore {
    LocalTableStore::new(config.data_dir(dir.path()))
}

fn reports(dir: &TempDir, config: &RecordsConfig) -> LocalTableStore {
    LocalTableStore::without_backups(config.reports_dir(dir.path()))
}

#[test]
fn test_burial_status_from_config_lists() -> Result<()> {
    let (dir, config) = setup()?;
    let job = UpdateBurialStatusJob::new(
        data(&dir, &config),
        config.burial_status.clone(),
        config.tables.clone(),
    );
    JobRunner::new(job, RunMode::Apply).run()?;

    let occupants = fs::read_to_string(dir.path().join("records/occupants.csv"))?;
    assert!(occupants.contains("CYA1-L1,Dorothy Atwood,Cremation"));
    assert!(occupants.contains("CYA1-L2,Libby Judkins,Vault"));
    assert!(dir.path().join("records/occupants.csv.backup").exists());
    Ok(())
}

#[test]
fn test_veteran_pipeline() -> Result<()> {
    let (dir, config) = setup()?;
    JobRunner::new(
        FixVeteranSuffixesJob::new(data(&dir, &config), config.tables.clone()),
        RunMode::Apply,
    )
    .run()?;
    JobRunner::new(
        AddVeteranColumnJob::new(data(&dir, &config), config.tables.clone()),
        RunMode::Apply,
    )
    .run()?;

    let occupants = fs::read_to_string(dir.path().join("records/occupants.csv"))?;
    assert!(occupants.starts_with("lot_id,name,status,veteran,birth_date,death_date\n"));
    assert!(occupants.contains("CYA1-L3,John Q. Adams Jr.,Occupant,Yes,7/4/1890,7/4/1975"));
    assert!(occupants.contains("CYA1-L1,Dorothy Atwood,Occupant,,1/1/1900,1/1/1990"));
    Ok(())
}

#[test]
fn test_validate_data_writes_json_report() -> Result<()> {
    let (dir, config) = setup()?;
    let job = ValidateDataJob::new(
        data(&dir, &config),
        reports(&dir, &config),
        config.reference_data().yards,
    );
    let outcome = JobRunner::new(job, RunMode::Report).run()?;
    assert!(outcome.applied);
    assert_eq!(outcome.changes, 0);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out/validation_report.json"))?)?;
    assert_eq!(json["summary"]["total_lots"], 4);
    assert_eq!(json["status_mismatches"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[test]
fn test_report_files_land_in_reports_dir() -> Result<()> {
    let (dir, config) = setup()?;
    let job = OldestAtDeathReport::new(data(&dir, &config), reports(&dir, &config));
    JobRunner::new(job, RunMode::Report).run()?;

    let text = fs::read_to_string(dir.path().join("out/oldest_at_death_report.txt"))?;
    let word = fs::read_to_string(dir.path().join("out/oldest_at_death_report_for_word.txt"))?;
    assert!(text.contains("Total occupants with both dates: 2"));
    assert!(word.contains("1\tCYA1-L1\tDorothy Atwood\t90.0\t1/1/1900\t1/1/1990"));
    Ok(())
}

#[test]
fn test_fix_csv_headers_round_trip() -> Result<()> {
    let (dir, config) = setup()?;
    let lots_path = dir.path().join("records/lots.csv");
    let mut lines: Vec<&str> = LOTS.lines().collect();
    lines.rotate_left(1);
    fs::write(&lots_path, lines.join("\n"))?;

    let outcome = JobRunner::new(FixCsvHeadersJob::new(data(&dir, &config)), RunMode::Apply).run()?;
    assert_eq!(outcome.changes, 1);
    assert_eq!(fs::read_to_string(&lots_path)?, LOTS);
    Ok(())
}
