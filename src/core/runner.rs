use crate::core::{ChangeSet, Job};
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunMode {
    /// Show what would change; write nothing.
    DryRun,
    /// Write when there is something to write.
    Apply,
    /// Read-only analysis that always writes its report files.
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub job: String,
    pub changes: usize,
    pub applied: bool,
    pub mode: RunMode,
}

pub struct JobRunner<J: Job> {
    job: J,
    mode: RunMode,
}

impl<J: Job> JobRunner<J> {
    pub fn new(job: J, mode: RunMode) -> Self {
        Self { job, mode }
    }

    pub fn job(&self) -> &J {
        &self.job
    }

    pub fn run(&self) -> Result<RunOutcome> {
        let name = self.job.name();
        tracing::info!("Starting {} ({:?})", name, self.mode);

        let plan = self.job.plan()?;
        let changes = plan.change_count();
        tracing::info!("{}: {} change(s) found", name, changes);

        let report = plan.render();
        if !report.is_empty() {
            println!("{}", report);
        }

        let applied = match self.mode {
            RunMode::DryRun => {
                tracing::info!("{}: dry run, nothing written", name);
                false
            }
            RunMode::Apply if plan.is_empty() => {
                tracing::info!("{}: nothing to change", name);
                false
            }
            RunMode::Apply | RunMode::Report => {
                self.job.apply(&plan)?;
                tracing::info!("{}: written", name);
                true
            }
        };

        Ok(RunOutcome {
            job: name.to_string(),
            changes,
            applied,
            mode: self.mode,
        })
    }
}
