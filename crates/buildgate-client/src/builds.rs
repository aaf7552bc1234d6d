//! Build service: trigger, cancel and list builds.

use tracing::{debug, info};

use buildgate_core::{
    Build, BuildId, BuildStatus, BuildTypeId, CancelRequest, Locator, PagedResult, TriggerRequest,
};

use crate::error::ClientError;
use crate::http::Gateway;

/// Fields requested for build listings so parameters and tags come back inline.
pub const BUILD_FIELDS: &str = "count,build(id,number,status,state,statusText,buildTypeId,\
branchName,agent,webUrl,properties(property(name,value)),tags(tag(name)))";

/// Page size used when the caller has no preference.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

const BUILDS_PATH: &str = "/app/rest/builds";
const QUEUE_PATH: &str = "/app/rest/buildQueue";

/// Client for build endpoints.
#[derive(Clone)]
pub struct BuildService {
    gateway: Gateway,
}

impl BuildService {
    pub(crate) fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Get a single build.
    pub async fn get_build(&self, build_id: BuildId) -> Result<Option<Build>, ClientError> {
        self.gateway
            .get(&format!("{BUILDS_PATH}/id:{build_id}"))
            .await
    }

    /// Get the status of a build, `Unknown` when the server has no body for it.
    pub async fn build_status(&self, build_id: BuildId) -> Result<BuildStatus, ClientError> {
        Ok(self
            .get_build(build_id)
            .await?
            .map(|b| b.status())
            .unwrap_or_default())
    }

    /// Queue a new build.
    ///
    /// Sent exactly once; a failure is returned to the caller, never retried.
    pub async fn trigger_build(
        &self,
        request: &TriggerRequest,
    ) -> Result<Option<Build>, ClientError> {
        require_build_type(&request.build_type_id)?;

        info!(
            build_type = %request.build_type_id,
            branch = request.branch_name.as_deref().unwrap_or("default"),
            parameters = request.parameters.len(),
            "Triggering build"
        );
        self.gateway.post(QUEUE_PATH, request).await
    }

    /// Cancel a queued or running build without re-adding it to the queue.
    pub async fn cancel_build(&self, build_id: BuildId, comment: &str) -> Result<(), ClientError> {
        info!(build_id = %build_id, "Cancelling build");
        self.gateway
            .post_unit(
                &format!("{BUILDS_PATH}/id:{build_id}"),
                &CancelRequest::new(comment),
            )
            .await
    }

    /// Page through the build history of a configuration.
    pub async fn build_history(
        &self,
        build_type_id: &BuildTypeId,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<Build>, ClientError> {
        require_build_type(build_type_id)?;

        let locator = Locator::new()
            .clause("buildType", build_type_id)
            .paginate(page, page_size);
        self.list(BUILDS_PATH, locator).await
    }

    /// Builds currently running, optionally restricted to one configuration.
    pub async fn running_builds(
        &self,
        build_type_id: Option<&BuildTypeId>,
        count: u32,
    ) -> Result<PagedResult<Build>, ClientError> {
        let locator = Locator::new()
            .clause_opt("buildType", build_type_id.map(BuildTypeId::as_str))
            .clause("running", true)
            .count(count);
        self.list(BUILDS_PATH, locator).await
    }

    /// Builds waiting in the queue, optionally restricted to one configuration.
    pub async fn queued_builds(
        &self,
        build_type_id: Option<&BuildTypeId>,
        count: u32,
    ) -> Result<PagedResult<Build>, ClientError> {
        let locator = Locator::new()
            .clause_opt("buildType", build_type_id.map(BuildTypeId::as_str))
            .count(count);
        self.list(QUEUE_PATH, locator).await
    }

    /// Running and queued builds, fetched concurrently.
    ///
    /// Running builds come first, then queued ones; the total is the sum of
    /// both totals.
    pub async fn active_builds(
        &self,
        build_type_id: Option<&BuildTypeId>,
        count: u32,
    ) -> Result<PagedResult<Build>, ClientError> {
        let (running, queued) = tokio::try_join!(
            self.running_builds(build_type_id, count),
            self.queued_builds(build_type_id, count)
        )?;

        debug!(
            build_type = build_type_id.map(BuildTypeId::as_str).unwrap_or("*"),
            running = running.returned_count(),
            queued = queued.returned_count(),
            "Collected active builds"
        );
        Ok(running.merge(queued))
    }

    async fn list(&self, path: &str, locator: Locator) -> Result<PagedResult<Build>, ClientError> {
        let query = [
            ("locator", locator.to_string()),
            ("fields", BUILD_FIELDS.to_string()),
        ];
        self.gateway.get_list(path, &query).await
    }
}

fn require_build_type(build_type_id: &BuildTypeId) -> Result<(), ClientError> {
    if build_type_id.is_blank() {
        return Err(ClientError::InvalidArgument(
            "build configuration id must not be empty".to_string(),
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
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> BuildService {
        let config = ClientConfig::new(server.uri(), Credentials::token("tok"));
        BuildService::new(Gateway::new(&config).unwrap())
    }

    fn build_json(id: i64, state: &str) -> serde_json::Value {
        json!({"id": id, "state": state, "buildTypeId": "bt1"})
    }

    #[tokio::test]
    async fn test_active_builds_merges_running_then_queued() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/rest/builds"))
            .and(query_param("locator", "buildType:bt1,running:true,count:20"))
            .and(query_param("fields", BUILD_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "build": [build_json(1, "running")]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/app/rest/buildQueue"))
            .and(query_param("locator", "buildType:bt1,count:20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 2,
                "build": [build_json(2, "queued"), build_json(3, "queued")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let bt1 = BuildTypeId::new("bt1");
        let active = service(&server)
            .active_builds(Some(&bt1), DEFAULT_PAGE_SIZE)
            .await
            .unwrap();

        let ids: Vec<i64> = active.items.iter().map(|b| b.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(active.total_count, 3);
        assert_eq!(active.items[0].status(), BuildStatus::Running);
        assert_eq!(active.items[2].status(), BuildStatus::Queued);
    }

    #[tokio::test]
    async fn test_no_active_builds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0})))
            .mount(&server)
            .await;

        let bt2 = BuildTypeId::new("bt2");
        let active = service(&server).active_builds(Some(&bt2), 5).await.unwrap();
        assert!(active.items.is_empty());
        assert_eq!(active.total_count, 0);
    }

    #[tokio::test]
    async fn test_pascal_case_build_list_is_read() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/rest/builds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Count": 1,
                "Build": [{
                    "Id": 5,
                    "BuildTypeId": "C1",
                    "State": "running",
                    "Properties": {
                        "Count": 1,
                        "Property": [{"Name": "svnParameter", "Value": "abc"}]
                    }
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/app/rest/buildQueue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"COUNT": 0})))
            .mount(&server)
            .await;

        let c1 = BuildTypeId::new("C1");
        let active = service(&server).active_builds(Some(&c1), 20).await.unwrap();

        assert_eq!(active.returned_count(), 1);
        let build = &active.items[0];
        assert_eq!(build.id.get(), 5);
        assert_eq!(build.build_type_id, c1);
        assert_eq!(build.status(), BuildStatus::Running);
        assert!(build.has_parameter("svnParameter", "abc"));
    }

    #[tokio::test]
    async fn test_active_builds_propagates_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/rest/builds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/app/rest/buildQueue"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = service(&server)
            .active_builds(Some(&BuildTypeId::new("bt1")), 20)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_trigger_build_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/rest/buildQueue"))
            .and(body_json(json!({
                "buildType": {"id": "bt1"},
                "comment": {"text": ""},
                "personal": false,
                "properties": {"count": 1, "property": [{"name": "dedup.key", "value": "f"}]}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({
                    "id": 99, "state": "queued", "buildTypeId": "bt1"
                })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = TriggerRequest::new("bt1").with_parameter("dedup.key", "f");
        let build = service(&server)
            .trigger_build(&request)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(build.id, BuildId::new(99));
        assert_eq!(build.status(), BuildStatus::Queued);
    }

    #[tokio::test]
    async fn test_trigger_rejects_blank_configuration() {
        let server = MockServer::start().await;
        let err = service(&server)
            .trigger_build(&TriggerRequest::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_build_error_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/app/rest/builds/id:5"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = service(&server)
            .cancel_build(BuildId::new(5), "dup")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn test_history_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/rest/builds"))
            .and(query_param("locator", "buildType:bt1,count:10,start:10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "build": [{"id": 4, "state": "finished", "status": "SUCCESS"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/app/rest/builds/id:4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 4, "state": "finished", "status": "FAILURE"
            })))
            .mount(&server)
            .await;

        let builds = service(&server);
        let history = builds
            .build_history(&BuildTypeId::new("bt1"), 2, 10)
            .await
            .unwrap();
        assert_eq!(history.items[0].status(), BuildStatus::Success);

        let status = builds.build_status(BuildId::new(4)).await.unwrap();
        assert_eq!(status, BuildStatus::Failure);
    }
}
