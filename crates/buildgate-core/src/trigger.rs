//! Request payloads: trigger, cancel and build search.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::{BuildStatus, BuildTypeId, Locator, ParameterBag, ProjectId};

/// Request to queue a new build on a configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerRequest {
    pub build_type_id: BuildTypeId,
    pub branch_name: Option<String>,
    pub comment: Option<String>,
    pub personal: bool,
    pub parameters: ParameterBag,
}

impl TriggerRequest {
    pub fn new(build_type_id: impl Into<BuildTypeId>) -> Self {
        Self {
            build_type_id: build_type_id.into(),
            ..Self::default()
        }
    }

    /// Builder method to set the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch_name = Some(branch.into());
        self
    }

    /// Builder method to set the trigger comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Builder method to add a build parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name, value);
        self
    }

    /// Builder method to mark the build as personal.
    pub fn personal(mut self, personal: bool) -> Self {
        self.personal = personal;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerPayload<'a> {
    build_type: IdRef<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch_name: Option<&'a str>,
    comment: CommentText<'a>,
    personal: bool,
    #[serde(skip_serializing_if = "ParameterBag::is_empty")]
    properties: &'a ParameterBag,
}

#[derive(Serialize)]
struct IdRef<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct CommentText<'a> {
    text: &'a str,
}

impl Serialize for TriggerRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TriggerPayload {
            build_type: IdRef {
                id: self.build_type_id.as_str(),
            },
            branch_name: self.branch_name.as_deref(),
            comment: CommentText {
                text: self.comment.as_deref().unwrap_or_default(),
            },
            personal: self.personal,
            properties: &self.parameters,
        }
        .serialize(serializer)
    }
}

/// Body of a cancel request for a queued or running build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub comment: String,
    pub readd_into_queue: bool,
}

impl CancelRequest {
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            readd_into_queue: false,
        }
    }
}

/// Filters for a build search.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildSearchCriteria {
    pub project_id: Option<ProjectId>,
    pub build_type_id: Option<BuildTypeId>,
    pub status: Option<BuildStatus>,
    pub branch: Option<String>,
    pub since_date: Option<DateTime<Utc>>,
    pub tags: Option<String>,
    pub count: u32,
}

impl Default for BuildSearchCriteria {
    fn default() -> Self {
        Self {
            project_id: None,
            build_type_id: None,
            status: None,
            branch: None,
            since_date: None,
            tags: None,
            count: 20,
        }
    }
}

impl BuildSearchCriteria {
    /// Locator in the order the builds endpoint expects for searches.
    pub fn to_locator(&self) -> Locator {
        Locator::new()
            .count(self.count)
            .clause_opt("project", self.project_id.as_ref().map(ProjectId::as_str))
            .clause_opt(
                "buildType",
                self.build_type_id.as_ref().map(BuildTypeId::as_str),
            )
            .clause_opt("status", self.status.map(|s| s.as_locator_value()))
            .clause_opt("branch", self.branch.as_deref())
            .clause_opt(
                "sinceDate",
                self.since_date
                    .map(|d| d.format("%Y%m%dT%H%M%S%z").to_string()),
            )
            .clause_opt("tags", self.tags.as_deref())
    }
}
