pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{Cli, Command};

pub use adapters::{LocalImageLibrary, LocalTableStore};
pub use config::RecordsConfig;
pub use core::runner::{JobRunner, RunMode, RunOutcome};
pub use utils::error::{RecordsError, Result};
