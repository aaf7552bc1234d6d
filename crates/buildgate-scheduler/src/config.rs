//! Scheduler configuration.

use buildgate_core::ProjectId;

/// Comment attached to cancelled duplicates when none is configured.
pub const DEFAULT_CANCEL_COMMENT: &str = "Cancelled by duplicate dispatch";

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Project the candidate search is scoped to. `None` searches everything.
    pub project_id: Option<ProjectId>,

    /// Keyword a configuration name must contain (case-insensitive).
    pub marker_keyword: String,

    /// Build parameter that carries the task fingerprint.
    pub marker_param: String,

    /// Comment sent with each duplicate cancellation.
    pub cancel_comment: String,

    /// Comment sent with the trigger request.
    pub trigger_comment: Option<String>,

    /// Branch to build. `None` uses the configuration default.
    pub branch: Option<String>,

    /// Page size for the candidate search.
    pub page_size: u32,

    /// Upper bound on search pages fetched per dispatch.
    pub max_pages: u32,

    /// Builds requested per running/queued query.
    pub active_page_size: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            marker_keyword: "svn".to_string(),
            marker_param: "svnParameter".to_string(),
            cancel_comment: DEFAULT_CANCEL_COMMENT.to_string(),
            trigger_comment: None,
            branch: None,
            page_size: 100,
            max_pages: 50,
            active_page_size: 20,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with the marker parameter and name keyword set.
    pub fn new(marker_param: impl Into<String>, marker_keyword: impl Into<String>) -> Self {
        Self {
            marker_param: marker_param.into(),
            marker_keyword: marker_keyword.into(),
            ..Self::default()
        }
    }

    /// Builder method to scope the search to a project.
    pub fn with_project(mut self, project_id: impl Into<ProjectId>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Builder method to set the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Builder method to set the trigger comment.
    pub fn with_trigger_comment(mut self, comment: impl Into<String>) -> Self {
        self.trigger_comment = Some(comment.into());
        self
    }

    /// Builder method to set the cancellation comment.
    pub fn with_cancel_comment(mut self, comment: impl Into<String>) -> Self {
        self.cancel_comment = comment.into();
        self
    }
}
