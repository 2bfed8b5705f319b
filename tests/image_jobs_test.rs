use anyhow::Result;
use cemetery_records::app::jobs::{CleanupMissingImagesJob, MatchOrphanedImagesJob, UpdatePlotImagesJob};
use cemetery_records::core::filename::FilenameParser;
use cemetery_records::{JobRunner, LocalImageLibrary, LocalTableStore, RecordsConfig, RunMode};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PLOTS: &str = "\"plot_id\",\"monument_images\"\n\
                     \"ITC12\",\"ITC12-1F.jpg\"\n\
                     \"NYC4\",\"\"\n\
                     \"UTC4\",\"UTC4-2.JPG; gone.jpg\"\n";

fn touch(dir: &Path, folder: &str, files: &[&str]) -> Result<()> {
    let folder = dir.join("Monument Images").join(folder);
    fs::create_dir_all(&folder)?;
    for file in files {
        fs::write(folder.join(file), b"jpeg")?;
    }
    Ok(())
}

fn setup() -> Result<TempDir> {
    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("data"))?;
    fs::write(dir.path().join("data/plots.csv"), PLOTS)?;

    touch(dir.path(), "OICA Intervale Terrace", &["ITC12-1F.jpg", "ITC12-2B.jpg", "ITC12-2F.jpg"])?;
    touch(dir.path(), "OICA New Yard", &["NYC41M.JPG"])?;
    touch(dir.path(), "OICA Upper Terrace", &["UTC4-2.JPG", "UTC4.-1.JPG"])?;
    Ok(dir)
}

struct Env {
    config: RecordsConfig,
    data: LocalTableStore,
    images: LocalImageLibrary,
}

fn env(dir: &TempDir) -> Env {
    let config = RecordsConfig::default();
    Env {
        data: LocalTableStore::new(config.data_dir(dir.path())),
        images: LocalImageLibrary::new(config.images_dir(dir.path())),
        config,
    }
}

fn plots(dir: &TempDir) -> Result<String> {
    Ok(fs::read_to_string(dir.path().join("data/plots.csv"))?)
}

#[test]
fn test_update_plot_images_merges_and_sorts() -> Result<()> {
    let dir = setup()?;
    let Env { config, data, images } = env(&dir);
    let reference = config.reference_data();

    let job = UpdatePlotImagesJob::new(
        data,
        images,
        reference.yards,
        FilenameParser::new(reference.image_types)?,
        config.tables.clone(),
    );
    let outcome = JobRunner::new(job, RunMode::Apply).run()?;
    assert!(outcome.applied);

    let written = plots(&dir)?;
    assert!(written.contains("\"ITC12\",\"ITC12-2F.jpg; ITC12-2B.jpg; ITC12-1F.jpg\""));
    assert!(dir.path().join("data/plots.csv.backup").exists());
    Ok(())
}

#[test]
fn test_orphans_are_renamed_and_attached() -> Result<()> {
    let dir = setup()?;
    let Env { config, data, images } = env(&dir);
    let reference = config.reference_data();

    let job = MatchOrphanedImagesJob::new(
        data,
        images,
        reference.yards,
        FilenameParser::new(reference.image_types)?,
        config.orphan_extensions(),
        config.tables.clone(),
    );
    JobRunner::new(job, RunMode::Apply).run()?;

    let upper = dir.path().join("Monument Images/OICA Upper Terrace");
    assert!(upper.join("UTC4-1.JPG").is_file());
    assert!(!upper.join("UTC4.-1.JPG").exists());
    assert!(dir.path().join("Monument Images/OICA New Yard/NYC4-1M.JPG").is_file());

    let written = plots(&dir)?;
    assert!(written.contains("\"NYC4\",\"NYC4-1M.JPG\""));
    assert!(written.contains("\"UTC4\",\"UTC4-2.JPG; gone.jpg; UTC4-1.JPG\""));
    Ok(())
}

#[test]
fn test_orphan_dry_run_renames_nothing() -> Result<()> {
    let dir = setup()?;
    let Env { config, data, images } = env(&dir);
    let reference = config.reference_data();

    let job = MatchOrphanedImagesJob::new(
        data,
        images,
        reference.yards,
        FilenameParser::new(reference.image_types)?,
        config.orphan_extensions(),
        config.tables.clone(),
    );
    let outcome = JobRunner::new(job, RunMode::DryRun).run()?;

    assert!(outcome.changes > 0);
    assert!(dir.path().join("Monument Images/OICA Upper Terrace/UTC4.-1.JPG").is_file());
    assert_eq!(plots(&dir)?, PLOTS);
    Ok(())
}

#[test]
fn test_cleanup_drops_missing_files() -> Result<()> {
    let dir = setup()?;
    let Env { config, data, images } = env(&dir);

    let job = CleanupMissingImagesJob::new(
        data,
        images,
        config.reference_data().yards,
        config.tables.clone(),
    );
    let outcome = JobRunner::new(job, RunMode::Apply).run()?;
    assert_eq!(outcome.changes, 1);

    let written = plots(&dir)?;
    assert!(written.contains("\"UTC4\",\"UTC4-2.JPG\""));
    assert!(written.contains("\"ITC12\",\"ITC12-1F.jpg\""));
    Ok(())
}
