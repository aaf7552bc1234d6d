//! Duplicate detection and best-effort cancellation.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use buildgate_core::{Build, BuildId, BuildTypeId, TaskFingerprint};

use crate::backend::BuildBackend;

/// A cancellation the server refused.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelFailure {
    pub build_id: BuildId,
    pub build_type_id: BuildTypeId,
    pub reason: String,
}

/// What happened to each duplicate found during a dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CancellationReport {
    pub attempted: Vec<BuildId>,
    pub cancelled: Vec<BuildId>,
    pub failed: Vec<CancelFailure>,
}

impl CancellationReport {
    /// Returns true if every attempted cancellation succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Active builds tagged with `marker_param = fingerprint`.
///
/// A build reported twice (running and queued lists overlapping) is returned
/// once.
pub fn find_duplicates<'a>(
    builds: &'a [Build],
    marker_param: &str,
    fingerprint: &TaskFingerprint,
) -> Vec<&'a Build> {
    let mut seen = HashSet::new();
    builds
        .iter()
        .filter(|b| b.has_parameter(marker_param, fingerprint.as_str()))
        .filter(|b| seen.insert(b.id))
        .collect()
}

/// Cancel every duplicate, one at a time.
///
/// A failed cancellation is recorded and logged; the rest still proceed.
pub async fn cancel_duplicates<B: BuildBackend + ?Sized>(
    backend: &B,
    builds: &[Build],
    marker_param: &str,
    fingerprint: &TaskFingerprint,
    comment: &str,
) -> CancellationReport {
    let mut report = CancellationReport::default();

    for build in find_duplicates(builds, marker_param, fingerprint) {
        report.attempted.push(build.id);
        debug!(build_id = %build.id, build_type = %build.build_type_id, "Cancelling duplicate");

        match backend.cancel_build(build.id, comment).await {
            Ok(()) => {
                info!(
                    build_id = %build.id,
                    build_type = %build.build_type_id,
                    fingerprint = %fingerprint,
                    "Cancelled duplicate build"
                );
                report.cancelled.push(build.id);
            }
            Err(e) => {
                warn!(
                    build_id = %build.id,
                    build_type = %build.build_type_id,
                    error = %e,
                    "Failed to cancel duplicate build"
                );
                report.failed.push(CancelFailure {
                    build_id: build.id,
                    build_type_id: build.build_type_id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}
