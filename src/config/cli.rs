use crate::core::runner::RunMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "cemetery.toml";

#[derive(Debug, Parser)]
#[command(name = "cemetery-records")]
#[command(about = "Maintenance tools for the cemetery CSV records and monument images")]
pub struct Cli {
    /// Path to the TOML configuration file (default: <root>/cemetery.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root that data, image and report directories are resolved against
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Recompute every lot status and regenerate available_lots.csv
    FixLotStatus {
        /// Write the changes (default is a dry run)
        #[arg(long)]
        apply: bool,
    },
    /// Find unreferenced image files and suggest the plot they belong to
    MatchOrphanedImages {
        /// Rename mis-named files and attach them to their plots
        #[arg(long)]
        apply: bool,
    },
    /// Add canonical image names found on disk to plots.csv
    UpdatePlotImages {
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove image references whose file no longer exists
    CleanupMissingImages {
        #[arg(long)]
        dry_run: bool,
    },
    /// Cross-check lots, occupants and available lots; writes validation_report.json
    ValidateData,
    /// Mark listed occupants as Cremation or Vault
    UpdateBurialStatus {
        #[arg(long)]
        dry_run: bool,
    },
    /// Move suffixes out of the veterans' middle names into a Suffix column
    FixVeteranSuffixes {
        #[arg(long)]
        dry_run: bool,
    },
    /// Flag occupants who match a veteran
    AddVeteranColumn {
        #[arg(long)]
        dry_run: bool,
    },
    /// Move displaced header lines back to line 1
    FixCsvHeaders {
        #[arg(long)]
        dry_run: bool,
    },
    /// Occupants missing birth or death dates
    MissingDates,
    /// The ten earliest burials
    OldestBurials,
    /// The ten oldest occupants at death
    OldestAtDeath,
}

impl Command {
    pub fn run_mode(&self) -> RunMode {
        match self {
            Command::FixLotStatus { apply } | Command::MatchOrphanedImages { apply } => {
                if *apply {
                    RunMode::Apply
                } else {
                    RunMode::DryRun
                }
            }
            Command::UpdatePlotImages { dry_run }
            | Command::CleanupMissingImages { dry_run }
            | Command::UpdateBurialStatus { dry_run }
            | Command::FixVeteranSuffixes { dry_run }
            | Command::AddVeteranColumn { dry_run }
            | Command::FixCsvHeaders { dry_run } => {
                if *dry_run {
                    RunMode::DryRun
                } else {
                    RunMode::Apply
                }
            }
            Command::ValidateData
            | Command::MissingDates
            | Command::OldestBurials
            | Command::OldestAtDeath => RunMode::Report,
        }
    }

    /// Hint printed after a dry run, naming the flag that writes.
    pub fn write_hint(&self) -> Option<&'static str> {
        match self {
            Command::FixLotStatus { .. } | Command::MatchOrphanedImages { .. } => {
                Some("Run with --apply to write these changes")
            }
            Command::UpdatePlotImages { .. }
            | Command::CleanupMissingImages { .. }
            | Command::UpdateBurialStatus { .. }
            | Command::FixVeteranSuffixes { .. }
            | Command::AddVeteranColumn { .. }
            | Command::FixCsvHeaders { .. } => Some("Run without --dry-run to write these changes"),
            _ => None,
        }
    }
}

impl Cli {
    /// The config file to load, if any: the explicit path, or the default file under the root.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let default = self.root.join(DEFAULT_CONFIG_FILE);
                default.is_file().then_some(default)
            }
        }
    }
}
