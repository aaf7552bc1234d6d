//! The remote calls a dispatch needs, behind a trait.
//!
//! [`Client`] is the production implementation; tests plug in an in-memory
//! server.

use async_trait::async_trait;

use buildgate_client::{Client, ClientError};
use buildgate_core::{
    Build, BuildConfiguration, BuildId, BuildTypeId, PagedResult, ProjectId, TriggerRequest,
};

/// Build server operations used by the scheduler.
#[async_trait]
pub trait BuildBackend: Send + Sync {
    /// Search build configurations by optional name pattern and project.
    async fn search_configurations(
        &self,
        name_pattern: Option<&str>,
        project_id: Option<&ProjectId>,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<BuildConfiguration>, ClientError>;

    /// Running then queued builds of one configuration.
    async fn active_builds(
        &self,
        build_type_id: &BuildTypeId,
        count: u32,
    ) -> Result<PagedResult<Build>, ClientError>;

    /// Cancel one build.
    async fn cancel_build(&self, build_id: BuildId, comment: &str) -> Result<(), ClientError>;

    /// Queue a new build.
    async fn trigger_build(&self, request: &TriggerRequest) -> Result<Option<Build>, ClientError>;
}

#[async_trait]
impl BuildBackend for Client {
    async fn search_configurations(
        &self,
        name_pattern: Option<&str>,
        project_id: Option<&ProjectId>,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<BuildConfiguration>, ClientError> {
        self.projects
            .search_configurations(name_pattern, project_id, page, page_size)
            .await
    }

    async fn active_builds(
        &self,
        build_type_id: &BuildTypeId,
        count: u32,
    ) -> Result<PagedResult<Build>, ClientError> {
        self.builds.active_builds(Some(build_type_id), count).await
    }

    async fn cancel_build(&self, build_id: BuildId, comment: &str) -> Result<(), ClientError> {
        self.builds.cancel_build(build_id, comment).await
    }

    async fn trigger_build(&self, request: &TriggerRequest) -> Result<Option<Build>, ClientError> {
        self.builds.trigger_build(request).await
    }
}
