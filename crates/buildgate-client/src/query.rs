//! Query service: listings across the whole server.

use buildgate_core::{
    Build, BuildAgent, BuildConfiguration, BuildSearchCriteria, Locator, PagedResult, Project,
    ProjectId,
};

use crate::error::ClientError;
use crate::http::Gateway;

const AGENT_FIELDS: &str = "count,agent(id,name,connected,enabled,ip)";

/// Client for server-wide listings.
#[derive(Clone)]
pub struct QueryService {
    gateway: Gateway,
}

impl QueryService {
    pub(crate) fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Page through all projects.
    pub async fn projects(&self, page: u32, page_size: u32) -> Result<PagedResult<Project>, ClientError> {
        let locator = Locator::new().paginate(page, page_size);
        self.gateway
            .get_list("/app/rest/projects", &[("locator", locator.to_string())])
            .await
    }

    /// Page through build configurations, optionally within one project.
    pub async fn build_configurations(
        &self,
        project_id: Option<&ProjectId>,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<BuildConfiguration>, ClientError> {
        let locator = Locator::new()
            .clause_opt("project", project_id.map(ProjectId::as_str))
            .paginate(page, page_size);
        self.gateway
            .get_list("/app/rest/buildTypes", &[("locator", locator.to_string())])
            .await
    }

    /// Search builds across configurations.
    pub async fn search_builds(
        &self,
        criteria: &BuildSearchCriteria,
    ) -> Result<PagedResult<Build>, ClientError> {
        self.gateway
            .get_list(
                "/app/rest/builds",
                &[("locator", criteria.to_locator().to_string())],
            )
            .await
    }

    /// Page through build agents.
    pub async fn agents(&self, page: u32, page_size: u32) -> Result<PagedResult<BuildAgent>, ClientError> {
        let locator = Locator::new().paginate(page, page_size);
        self.gateway
            .get_list(
                "/app/rest/agents",
                &[
                    ("locator", locator.to_string()),
                    ("fields", AGENT_FIELDS.to_string()),
                ],
            )
            .await
    }
}
