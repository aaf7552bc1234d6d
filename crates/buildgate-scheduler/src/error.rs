//! Scheduler errors and process exit codes.

use thiserror::Error;

use buildgate_client::ClientError;
use buildgate_core::{BuildTypeId, TaskFingerprint};

use crate::scheduler::Stage;

/// Process exit code for a completed dispatch.
pub const EXIT_SUCCESS: u8 = 0;

/// Process exit code for any failed dispatch.
pub const EXIT_FAILURE: u8 = 1;

/// Process exit code when no candidate configuration was found.
pub const EXIT_NO_IDLE_CONFIGURATION: u8 = 2;

/// Scheduler errors.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("No build configuration matching '{keyword}' is available")]
    NoIdleConfiguration { keyword: String },

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: ClientError,
    },

    #[error("Trigger on {configuration} was accepted without a build in the response")]
    TriggerNotAcknowledged { configuration: BuildTypeId },

    #[error("Dispatch for fingerprint {0} is already in flight")]
    AlreadyInFlight(TaskFingerprint),
}

impl SchedulerError {
    /// Exit code a command-line front end should report.
    pub fn exit_code(&self) -> u8 {
        match self {
            SchedulerError::NoIdleConfiguration { .. } => EXIT_NO_IDLE_CONFIGURATION,
            _ => EXIT_FAILURE,
        }
    }

    /// Stage the dispatch was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            SchedulerError::NoIdleConfiguration { .. } => Stage::SelectTarget,
            SchedulerError::Stage { stage, .. } => *stage,
            SchedulerError::TriggerNotAcknowledged { .. } => Stage::Trigger,
            SchedulerError::AlreadyInFlight(_) => Stage::Init,
        }
    }
}
