pub mod dates;
pub mod filename;
pub mod lot_status;
pub mod names;
pub mod runner;

pub use crate::domain::ports::{ChangeSet, ImageLibrary, Job, TableStore};
pub use crate::utils::error::Result;
