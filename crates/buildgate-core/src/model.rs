//! Records returned by the build server.
//!
//! Field names follow the server's camelCase JSON. Optional fields default when
//! the server leaves them out, which happens depending on the `fields=` selector
//! used by the request. The server is not strict about key casing, so decoders
//! first map keys onto [`canonical_field_name`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BuildId, BuildStatus, BuildTypeId, ParameterBag, ProjectId};

/// Every key used by the server records and list envelopes, canonically cased.
const WIRE_FIELDS: &[&str] = &[
    "agent",
    "archived",
    "branchName",
    "build",
    "buildType",
    "buildTypeId",
    "connected",
    "count",
    "description",
    "enabled",
    "id",
    "ip",
    "name",
    "number",
    "parentProjectId",
    "project",
    "projectId",
    "projectName",
    "properties",
    "property",
    "state",
    "status",
    "statusText",
    "tag",
    "tags",
    "value",
    "webUrl",
];

/// Canonical camelCase spelling of a server field name, matched ignoring case.
///
/// Returns `None` for keys no record reads.
pub fn canonical_field_name(key: &str) -> Option<&'static str> {
    WIRE_FIELDS
        .iter()
        .copied()
        .find(|field| field.eq_ignore_ascii_case(key))
}

/// A project grouping build configurations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub parent_project_id: Option<ProjectId>,
    pub description: Option<String>,
    pub web_url: Option<String>,
    pub archived: bool,
}

/// A build configuration ("build type") that builds can be queued on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfiguration {
    pub id: BuildTypeId,
    pub name: String,
    pub project_id: ProjectId,
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub web_url: Option<String>,

    /// True when no build is running or queued. Computed per scheduling run.
    #[serde(skip)]
    pub idle: bool,

    /// Number of running plus queued builds. Computed per scheduling run.
    #[serde(skip)]
    pub active_count: usize,
}

impl BuildConfiguration {
    /// Create a configuration with the identifying fields set.
    pub fn new(
        id: impl Into<BuildTypeId>,
        name: impl Into<String>,
        project_id: impl Into<ProjectId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_id: project_id.into(),
            ..Self::default()
        }
    }

    /// Record how many builds are currently running or queued.
    pub fn record_activity(&mut self, active_count: usize) {
        self.active_count = active_count;
        self.idle = active_count == 0;
    }

    /// Case-insensitive substring match on the configuration name.
    pub fn name_contains(&self, keyword: &str) -> bool {
        self.name.to_lowercase().contains(&keyword.to_lowercase())
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {}, Project: {})", self.name, self.id, self.project_id)
    }
}

/// A build agent, either listed directly or embedded in a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildAgent {
    pub id: i64,
    pub name: String,
    pub connected: bool,
    pub enabled: bool,
    pub ip: Option<String>,
}

/// Tag collection attached to a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildTags {
    pub count: usize,
    pub tag: Vec<BuildTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildTag {
    pub name: String,
}

/// A single build: queued, running or finished.
///
/// `id` is the only required field; a payload without it is rejected rather
/// than read as build 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: BuildId,
    #[serde(default)]
    pub number: String,

    /// Lifecycle state text (`queued`, `running`, `finished`).
    #[serde(default)]
    pub state: String,

    /// Result text for finished builds (`SUCCESS`, `FAILURE`).
    #[serde(default, rename = "status")]
    pub status_code: Option<String>,
    #[serde(default)]
    pub status_text: Option<String>,

    #[serde(default)]
    pub build_type_id: BuildTypeId,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub properties: ParameterBag,
    #[serde(default)]
    pub tags: Option<BuildTags>,
    #[serde(default)]
    pub agent: Option<BuildAgent>,
    #[serde(default)]
    pub web_url: Option<String>,
}

impl Build {
    /// Derived status: the lifecycle state wins, then the result text.
    pub fn status(&self) -> BuildStatus {
        match BuildStatus::parse(&self.state) {
            BuildStatus::Unknown => self
                .status_code
                .as_deref()
                .map(BuildStatus::parse)
                .unwrap_or_default(),
            status => status,
        }
    }

    /// Returns true if the build carries exactly `name = value`.
    pub fn has_parameter(&self, name: &str, value: &str) -> bool {
        self.properties.contains(name, value)
    }

    /// Names of the tags attached to the build.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags
            .as_ref()
            .map(|t| t.tag.iter().map(|tag| tag.name.as_str()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Build ID: {}, Number: {}, Status: {}, BuildTypeId: {}, Branch: {}",
            self.id,
            self.number,
            self.status(),
            self.build_type_id,
            self.branch_name.as_deref().unwrap_or("default")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_from_server_json() {
        let build: Build = serde_json::from_value(json!({
            "id": 1201,
            "number": "57",
            "state": "running",
            "buildTypeId": "Unity_SvnPatch1",
            "branchName": "main",
            "properties": {
                "count": 1,
                "property": [{"name": "dedup.key", "value": "e40da62c1aedfc24"}]
            },
            "tags": {"count": 1, "tag": [{"name": "hotfix"}]},
            "agent": {"id": 3, "name": "agent-3"}
        }))
        .unwrap();

        assert_eq!(build.id, BuildId::new(1201));
        assert_eq!(build.status(), BuildStatus::Running);
        assert!(build.has_parameter("dedup.key", "e40da62c1aedfc24"));
        assert_eq!(build.tag_names(), vec!["hotfix"]);
        assert_eq!(build.agent.unwrap().name, "agent-3");
    }

    #[test]
    fn test_canonical_field_name_ignores_case() {
        assert_eq!(canonical_field_name("BuildTypeId"), Some("buildTypeId"));
        assert_eq!(canonical_field_name("BUILDTYPEID"), Some("buildTypeId"));
        assert_eq!(canonical_field_name("webUrl"), Some("webUrl"));
        assert_eq!(canonical_field_name("Property"), Some("property"));
        assert_eq!(canonical_field_name("href"), None);
    }

    #[test]
    fn test_build_without_id_is_rejected() {
        let result = serde_json::from_value::<Build>(json!({
            "Id": 5,
            "BuildTypeId": "C1",
            "State": "running"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_status_falls_back_to_result_text() {
        let build: Build = serde_json::from_value(json!({
            "id": 9,
            "state": "finished",
            "status": "FAILURE"
        }))
        .unwrap();
        assert_eq!(build.status(), BuildStatus::Failure);

        let bare = Build::default();
        assert_eq!(bare.status(), BuildStatus::Unknown);
        assert!(!bare.has_parameter("anything", ""));
    }

    #[test]
    fn test_configuration_activity_is_not_serialized() {
        let mut config = BuildConfiguration::new("bt1", "Svn Patch A", "Unity");
        config.record_activity(2);
        assert!(!config.idle);
        assert_eq!(config.active_count, 2);

        config.record_activity(0);
        assert!(config.idle);

        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("idle").is_none());
        assert!(value.get("activeCount").is_none());
        assert_eq!(value["projectId"], "Unity");
    }

    #[test]
    fn test_name_contains_ignores_case() {
        let config = BuildConfiguration::new("bt1", "Unity SVN Patch", "Unity");
        assert!(config.name_contains("svn"));
        assert!(config.name_contains("Svn"));
        assert!(!config.name_contains("git"));
    }
}
