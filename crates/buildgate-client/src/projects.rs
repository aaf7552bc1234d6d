//! Project service: project detail and build configuration search.

use tracing::debug;

use buildgate_core::{BuildConfiguration, Locator, PagedResult, Project, ProjectId};

use crate::error::ClientError;
use crate::http::Gateway;

const PROJECTS_PATH: &str = "/app/rest/projects";
const BUILD_TYPES_PATH: &str = "/app/rest/buildTypes";

/// Client for project and build configuration endpoints.
#[derive(Clone)]
pub struct ProjectService {
    gateway: Gateway,
}

impl ProjectService {
    pub(crate) fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Get project details.
    pub async fn project(&self, project_id: &ProjectId) -> Result<Option<Project>, ClientError> {
        require_project(project_id)?;
        self.gateway
            .get(&format!("{PROJECTS_PATH}/id:{project_id}"))
            .await
    }

    /// Page through the projects nested under a parent project.
    pub async fn sub_projects(
        &self,
        project_id: &ProjectId,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<Project>, ClientError> {
        require_project(project_id)?;

        let locator = Locator::new()
            .clause("affectedProject", project_id)
            .paginate(page, page_size);
        self.gateway
            .get_list(PROJECTS_PATH, &[("locator", locator.to_string())])
            .await
    }

    /// Search build configurations by name pattern and/or project.
    ///
    /// The server matches `name:` itself; keyword filtering on top of that is
    /// left to the caller.
    pub async fn search_configurations(
        &self,
        name_pattern: Option<&str>,
        project_id: Option<&ProjectId>,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<BuildConfiguration>, ClientError> {
        let locator = Locator::new()
            .clause_opt("name", name_pattern)
            .clause_opt("project", project_id.map(ProjectId::as_str))
            .paginate(page, page_size);

        debug!(
            name = name_pattern.unwrap_or("*"),
            project = project_id.map(ProjectId::as_str).unwrap_or("all"),
            locator = %locator,
            "Searching build configurations"
        );
        self.gateway
            .get_list(BUILD_TYPES_PATH, &[("locator", locator.to_string())])
            .await
    }
}

fn require_project(project_id: &ProjectId) -> Result<(), ClientError> {
    if project_id.is_blank() {
        return Err(ClientError::InvalidArgument(
            "project id must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::config::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> ProjectService {
        let config = ClientConfig::new(server.uri(), Credentials::token("tok"));
        ProjectService::new(Gateway::new(&config).unwrap())
    }

    #[tokio::test]
    async fn test_search_configurations_locator() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/rest/buildTypes"))
            .and(query_param("locator", "name:Svn,project:Unity,count:20,start:20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 21,
                "buildType": [
                    {"id": "Unity_Svn21", "name": "Svn Patch 21", "projectId": "Unity"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let project = ProjectId::new("Unity");
        let page = service(&server)
            .search_configurations(Some("Svn"), Some(&project), 2, 20)
            .await
            .unwrap();
        assert_eq!(page.items[0].id.as_str(), "Unity_Svn21");
        assert_eq!(page.items[0].project_id, project);
        assert!(page.has_more());
        assert!(!page.items[0].idle);
    }

    #[tokio::test]
    async fn test_search_without_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/rest/buildTypes"))
            .and(query_param("locator", "count:100,start:0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let page = service(&server)
            .search_configurations(None, None, 1, 100)
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_project_and_sub_projects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/rest/projects/id:Unity"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "Unity", "name": "Unity", "parentProjectId": "_Root", "archived": false
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/app/rest/projects"))
            .and(query_param("locator", "affectedProject:Unity,count:20,start:0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "project": [{"id": "Unity_Patches", "name": "Patches", "parentProjectId": "Unity"}]
            })))
            .mount(&server)
            .await;

        let projects = service(&server);
        let unity = ProjectId::new("Unity");
        let project = projects.project(&unity).await.unwrap().unwrap();
        assert_eq!(project.parent_project_id, Some(ProjectId::new("_Root")));

        let children = projects.sub_projects(&unity, 1, 20).await.unwrap();
        assert_eq!(children.items[0].name, "Patches");
    }

    #[tokio::test]
    async fn test_blank_project_rejected() {
        let server = MockServer::start().await;
        let err = service(&server)
            .project(&ProjectId::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }
}
