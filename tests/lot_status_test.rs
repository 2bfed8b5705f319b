use anyhow::Result;
use cemetery_records::app::jobs::FixLotStatusJob;
use cemetery_records::domain::reference::NotAvailableLots;
use cemetery_records::{JobRunner, LocalTableStore, RecordsConfig, RunMode};
use std::fs;
use tempfile::TempDir;

const LOTS: &str = "lot_id,plot_id,lot_number,purchased_rights,remaining_rights,status\n\
                    CYA1-L1,CYA1,1,0,0,Unoccupied\n\
                    CYA1-L2,CYA1,2,2,1,Unoccupied\n\
                    CYA1-L3,CYA1,3,0,0,Available\n\
                    CYA2-L1,CYA2,1,1,1,Available\n\
                    OYK1-L1,OYK1,1,0,0,Available\n\
                    UTB25-L1,UTB25,1,2,0,Fully Occupied\n";

const OCCUPANTS: &str = "lot_id,name,status,birth_date,death_date\n\
                         CYA1-L2,Ruth Example,Occupant,2/3/1901,4/5/1977\n\
                         CYA2-L1,Sam Example,Reserved,,\n\
                         UTB25-L1,Lee Example,Vault,1/1/1910,1/1/1990\n";

fn setup() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let data = dir.path().join("data");
    fs::create_dir_all(&data)?;
    fs::write(data.join("lots.csv"), LOTS)?;
    fs::write(data.join("occupants.csv"), OCCUPANTS)?;
    fs::write(data.join("available_lots.csv"), "plot_id,lots_available\nCYA1,3\nOYK1,1\n")?;
    Ok(dir)
}

fn job(dir: &TempDir) -> FixLotStatusJob<LocalTableStore> {
    let config = RecordsConfig::default();
    FixLotStatusJob::new(
        LocalTableStore::new(config.data_dir(dir.path())),
        NotAvailableLots::new(config.lots.not_available.iter().cloned()),
        config.tables.clone(),
    )
}

#[test]
fn test_dry_run_leaves_files_untouched() -> Result<()> {
    let dir = setup()?;
    let outcome = JobRunner::new(job(&dir), RunMode::DryRun).run()?;

    assert!(outcome.changes > 0);
    assert!(!outcome.applied);
    assert_eq!(fs::read_to_string(dir.path().join("data/lots.csv"))?, LOTS);
    assert!(!dir.path().join("data/lots.csv.backup").exists());
    Ok(())
}

#[test]
fn test_apply_reconciles_and_backs_up() -> Result<()> {
    let dir = setup()?;
    let outcome = JobRunner::new(job(&dir), RunMode::Apply).run()?;
    assert!(outcome.applied);

    let lots = fs::read_to_string(dir.path().join("data/lots.csv"))?;
    assert!(lots.contains("CYA1-L1,CYA1,1,0,0,Available"));
    assert!(lots.contains("CYA1-L2,CYA1,2,2,1,Partially Occupied"));
    assert!(lots.contains("CYA1-L3,CYA1,3,0,0,Available"));
    // Reserved only, so nobody is buried there yet
    assert!(lots.contains("CYA2-L1,CYA2,1,1,1,Unoccupied"));
    assert!(lots.contains("OYK1-L1,OYK1,1,0,0,Not Available"));
    // overrides beat the rights arithmetic
    assert!(lots.contains("UTB25-L1,UTB25,1,2,0,Not Available"));

    assert_eq!(
        fs::read_to_string(dir.path().join("data/available_lots.csv"))?,
        "plot_id,lots_available\nCYA1,\"1,3\"\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("data/lots.csv.backup"))?,
        LOTS
    );
    Ok(())
}

#[test]
fn test_second_apply_is_a_no_op() -> Result<()> {
    let dir = setup()?;
    JobRunner::new(job(&dir), RunMode::Apply).run()?;
    let after_first = fs::read_to_string(dir.path().join("data/lots.csv"))?;

    let outcome = JobRunner::new(job(&dir), RunMode::Apply).run()?;
    assert_eq!(outcome.changes, 0);
    assert!(!outcome.applied);
    assert_eq!(fs::read_to_string(dir.path().join("data/lots.csv"))?, after_first);
    Ok(())
}

#[test]
fn test_bad_rights_value_aborts_without_writing() -> Result<()> {
    let dir = setup()?;
    let broken = LOTS.replace("CYA2,1,1,1", "CYA2,1,one,1");
    fs::write(dir.path().join("data/lots.csv"), &broken)?;

    let result = JobRunner::new(job(&dir), RunMode::Apply).run();
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(dir.path().join("data/lots.csv"))?, broken);
    Ok(())
}
