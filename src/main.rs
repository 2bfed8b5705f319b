use cemetery_records::app::jobs::{
    AddVeteranColumnJob, CleanupMissingImagesJob, FixCsvHeadersJob, FixLotStatusJob,
    FixVeteranSuffixesJob, MatchOrphanedImagesJob, MissingDatesReport, OldestAtDeathReport,
    OldestBurialsReport, UpdateBurialStatusJob, UpdatePlotImagesJob, ValidateDataJob,
};
use cemetery_records::core::filename::FilenameParser;
use cemetery_records::core::Job;
use cemetery_records::utils::error::ErrorSeverity;
use cemetery_records::utils::{logger, validation::Validate};
use cemetery_records::{
    Cli, Command, JobRunner, LocalImageLibrary, LocalTableStore, RecordsConfig, RecordsError,
    Result, RunMode, RunOutcome,
};
use clap::Parser;

fn main() {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting cemetery-records");
    if cli.verbose {
        tracing::debug!("CLI arguments: {:?}", cli);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    match dispatch(&cli, &config) {
        Ok(outcome) => {
            tracing::info!(
                "{} finished: {} change(s), written: {}",
                outcome.job,
                outcome.changes,
                outcome.applied
            );
            if outcome.mode == RunMode::DryRun && outcome.changes > 0 {
                if let Some(hint) = cli.command.write_hint() {
                    println!("\n[DRY RUN] {}", hint);
                }
            }
        }
        Err(e) => fail(&e),
    }
}

fn load_config(cli: &Cli) -> Result<RecordsConfig> {
    let config = match cli.config_path() {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            RecordsConfig::from_file(&path)?
        }
        None => {
            tracing::info!("No configuration file found, using built-in defaults");
            RecordsConfig::default()
        }
    };

    config.validate()?;
    Ok(config)
}

fn execute<J: Job>(job: J, mode: RunMode) -> Result<RunOutcome> {
    JobRunner::new(job, mode).run()
}

fn dispatch(cli: &Cli, config: &RecordsConfig) -> Result<RunOutcome> {
    let mode = cli.command.run_mode();
    let data = LocalTableStore::new(config.data_dir(&cli.root));
    let reports = LocalTableStore::without_backups(config.reports_dir(&cli.root));
    let images = LocalImageLibrary::new(config.images_dir(&cli.root));
    let reference = config.reference_data();
    let quoting = config.tables.clone();

    tracing::debug!("Data directory: {}", data.base_path().display());

    match &cli.command {
        Command::FixLotStatus { .. } => execute(
            FixLotStatusJob::new(data, reference.not_available, quoting),
            mode,
        ),
        Command::MatchOrphanedImages { .. } => execute(
            MatchOrphanedImagesJob::new(
                data,
                images,
                reference.yards,
                FilenameParser::new(reference.image_types)?,
                config.orphan_extensions(),
                quoting,
            ),
            mode,
        ),
        Command::UpdatePlotImages { .. } => execute(
            UpdatePlotImagesJob::new(
                data,
                images,
                reference.yards,
                FilenameParser::new(reference.image_types)?,
                quoting,
            ),
            mode,
        ),
        Command::CleanupMissingImages { .. } => execute(
            CleanupMissingImagesJob::new(data, images, reference.yards, quoting),
            mode,
        ),
        Command::ValidateData => execute(ValidateDataJob::new(data, reports, reference.yards), mode),
        Command::UpdateBurialStatus { .. } => execute(
            UpdateBurialStatusJob::new(data, config.burial_status.clone(), quoting),
            mode,
        ),
        Command::FixVeteranSuffixes { .. } => execute(FixVeteranSuffixesJob::new(data, quoting), mode),
        Command::AddVeteranColumn { .. } => execute(AddVeteranColumnJob::new(data, quoting), mode),
        Command::FixCsvHeaders { .. } => execute(FixCsvHeadersJob::new(data), mode),
        Command::MissingDates => execute(MissingDatesReport::new(data, reports), mode),
        Command::OldestBurials => execute(OldestBurialsReport::new(data, reports), mode),
        Command::OldestAtDeath => execute(OldestAtDeathReport::new(data, reports), mode),
    }
}

fn fail(e: &RecordsError) -> ! {
    tracing::error!(
        "Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
