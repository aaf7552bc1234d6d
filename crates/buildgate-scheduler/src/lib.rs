//! Duplicate-aware build dispatch.
//!
//! A dispatch fingerprints the task, finds the candidate build configurations,
//! cancels any queued or running build already tagged with the same
//! fingerprint, and triggers a fresh build on the least-loaded candidate.

pub mod backend;
pub mod cancel;
pub mod config;
pub mod error;
pub mod flight;
pub mod scheduler;
pub mod selection;

#[cfg(test)]
mod testing;

pub use backend::BuildBackend;
pub use cancel::{cancel_duplicates, find_duplicates, CancelFailure, CancellationReport};
pub use config::{SchedulerConfig, DEFAULT_CANCEL_COMMENT};
pub use error::{SchedulerError, EXIT_FAILURE, EXIT_NO_IDLE_CONFIGURATION, EXIT_SUCCESS};
pub use flight::{FlightGuard, SingleFlight};
pub use scheduler::{DispatchOutcome, Scheduler, Stage};
pub use selection::{rank_candidates, select_target};
