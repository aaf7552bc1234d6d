//! Dispatch pipeline - cancels duplicates and places the build.

use std::fmt;
use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, error, info, warn};

use buildgate_client::ClientError;
use buildgate_core::{Build, BuildConfiguration, TaskFingerprint, TaskIdentity, TriggerRequest};

use crate::backend::BuildBackend;
use crate::cancel::{cancel_duplicates, CancellationReport};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::flight::SingleFlight;
use crate::selection::{rank_candidates, select_target};

/// Pipeline stage of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    DiscoverCandidates,
    CollectActive,
    CancelDuplicates,
    SelectTarget,
    Trigger,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Init => "Init",
            Stage::DiscoverCandidates => "DiscoverCandidates",
            Stage::CollectActive => "CollectActive",
            Stage::CancelDuplicates => "CancelDuplicates",
            Stage::SelectTarget => "SelectTarget",
            Stage::Trigger => "Trigger",
            Stage::Done => "Done",
            Stage::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

/// Result of a completed dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub fingerprint: TaskFingerprint,
    /// Candidates in rank order, with their activity recorded.
    pub candidates: Vec<BuildConfiguration>,
    pub cancellations: CancellationReport,
    pub selected: BuildConfiguration,
    pub triggered: Build,
}

/// Duplicate-aware build dispatcher.
pub struct Scheduler<B> {
    backend: B,
    config: SchedulerConfig,
    flights: Option<Arc<SingleFlight>>,
}

impl<B: BuildBackend> Scheduler<B> {
    /// Create a new Scheduler.
    pub fn new(backend: B, config: SchedulerConfig) -> Self {
        Self {
            backend,
            config,
            flights: None,
        }
    }

    /// Reject a dispatch while another one with the same fingerprint runs.
    pub fn with_single_flight(mut self, flights: Arc<SingleFlight>) -> Self {
        self.flights = Some(flights);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Dispatch one task.
    ///
    /// Stages run in order: discover candidates, collect their running and
    /// queued builds, cancel duplicates, select the target, trigger. A remote
    /// failure in discovery, collection or trigger aborts the dispatch; failed
    /// cancellations do not.
    pub async fn dispatch(&self, task: &TaskIdentity) -> Result<DispatchOutcome, SchedulerError> {
        let mut stage = Stage::Init;
        let result = self.run(task, &mut stage).await;

        match &result {
            Ok(outcome) => info!(
                fingerprint = %outcome.fingerprint,
                build_id = %outcome.triggered.id,
                build_type = %outcome.selected.id,
                cancelled = outcome.cancellations.cancelled.len(),
                "Dispatch complete"
            ),
            Err(e) => {
                error!(stage = %stage, error = %e, "Dispatch failed");
                advance(&mut stage, Stage::Failed);
            }
        }
        result
    }

    async fn run(
        &self,
        task: &TaskIdentity,
        stage: &mut Stage,
    ) -> Result<DispatchOutcome, SchedulerError> {
        let fingerprint = task.fingerprint();
        info!(
            fingerprint = %fingerprint,
            agent = %task.agent_addr,
            build = %task.build_name,
            source_path = %task.source_path,
            patch = %task.patch_name,
            "Dispatch requested"
        );

        let _guard = match &self.flights {
            Some(flights) => Some(
                flights
                    .try_acquire(&fingerprint)
                    .ok_or_else(|| SchedulerError::AlreadyInFlight(fingerprint.clone()))?,
            ),
            None => None,
        };

        advance(stage, Stage::DiscoverCandidates);
        let mut candidates = self.discover_candidates().await.map_err(at(*stage))?;

        advance(stage, Stage::CollectActive);
        let active = self
            .collect_active(&mut candidates)
            .await
            .map_err(at(*stage))?;

        advance(stage, Stage::CancelDuplicates);
        let cancellations = cancel_duplicates(
            &self.backend,
            &active,
            &self.config.marker_param,
            &fingerprint,
            &self.config.cancel_comment,
        )
        .await;

        advance(stage, Stage::SelectTarget);
        rank_candidates(&mut candidates);
        let selected = select_target(&candidates).cloned().ok_or_else(|| {
            SchedulerError::NoIdleConfiguration {
                keyword: self.config.marker_keyword.clone(),
            }
        })?;
        if !selected.idle {
            warn!(
                build_type = %selected.id,
                active = selected.active_count,
                "No idle configuration, queueing behind the least loaded"
            );
        }

        advance(stage, Stage::Trigger);
        warn!(
            fingerprint = %fingerprint,
            "Cancel-to-trigger window is not guarded against other processes"
        );
        let request = self.trigger_request(&selected, &fingerprint);
        let triggered = self
            .backend
            .trigger_build(&request)
            .await
            .map_err(at(*stage))?
            .ok_or_else(|| SchedulerError::TriggerNotAcknowledged {
                configuration: selected.id.clone(),
            })?;

        advance(stage, Stage::Done);
        Ok(DispatchOutcome {
            fingerprint,
            candidates,
            cancellations,
            selected,
            triggered,
        })
    }

    /// All configurations in scope whose name contains the marker keyword.
    async fn discover_candidates(&self) -> Result<Vec<BuildConfiguration>, ClientError> {
        let mut found = Vec::new();
        let mut page = 1;
        loop {
            let result = self
                .backend
                .search_configurations(
                    None,
                    self.config.project_id.as_ref(),
                    page,
                    self.config.page_size,
                )
                .await?;
            let returned = result.returned_count();
            let total = result.total_count;
            found.extend(result.items);

            if returned == 0 || found.len() >= total || page >= self.config.max_pages {
                break;
            }
            page += 1;
        }

        let searched = found.len();
        found.retain(|c| c.name_contains(&self.config.marker_keyword));
        for candidate in &found {
            debug!(build_type = %candidate.id, name = %candidate.name, "Candidate configuration");
        }
        info!(
            keyword = %self.config.marker_keyword,
            searched,
            candidates = found.len(),
            "Discovered candidate configurations"
        );
        Ok(found)
    }

    /// Query every candidate's running and queued builds concurrently and
    /// record the counts on the candidates.
    async fn collect_active(
        &self,
        candidates: &mut [BuildConfiguration],
    ) -> Result<Vec<Build>, ClientError> {
        let count = self.config.active_page_size;
        let pages = try_join_all(
            candidates
                .iter()
                .map(|c| self.backend.active_builds(&c.id, count)),
        )
        .await?;

        let mut active = Vec::new();
        for (candidate, page) in candidates.iter_mut().zip(pages) {
            candidate.record_activity(page.returned_count());
            debug!(
                build_type = %candidate.id,
                active = candidate.active_count,
                idle = candidate.idle,
                "Collected configuration activity"
            );
            active.extend(page.items);
        }
        Ok(active)
    }

    fn trigger_request(
        &self,
        selected: &BuildConfiguration,
        fingerprint: &TaskFingerprint,
    ) -> TriggerRequest {
        let mut request = TriggerRequest::new(selected.id.clone())
            .with_parameter(&self.config.marker_param, fingerprint.as_str());
        if let Some(branch) = &self.config.branch {
            request = request.with_branch(branch.clone());
        }
        if let Some(comment) = &self.config.trigger_comment {
            request = request.with_comment(comment.clone());
        }
        request
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    info!(from = %stage, to = %next, "Dispatch stage");
    *stage = next;
}

fn at(stage: Stage) -> impl FnOnce(ClientError) -> SchedulerError {
    move |source| SchedulerError::Stage { stage, source }
}
