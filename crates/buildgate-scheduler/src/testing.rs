//! In-memory build server for scheduler tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use buildgate_client::ClientError;
use buildgate_core::{
    Build, BuildConfiguration, BuildId, BuildTypeId, PagedResult, ParameterBag, ProjectId,
    TriggerRequest,
};

use crate::backend::BuildBackend;

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub configurations: Vec<BuildConfiguration>,
    pub active: HashMap<BuildTypeId, Vec<Build>>,
    pub failing_cancels: HashSet<BuildId>,
    pub fail_search: bool,
    pub fail_active: bool,
    pub empty_trigger: bool,
    pub cancelled: Mutex<Vec<(BuildId, String)>>,
    pub triggered: Mutex<Vec<TriggerRequest>>,
    pub searches: Mutex<Vec<(Option<ProjectId>, u32)>>,
}

impl FakeBackend {
    pub fn with_configuration(mut self, id: &str, name: &str) -> Self {
        self.configurations
            .push(BuildConfiguration::new(id, name, "Unity"));
        self
    }

    pub fn with_active(mut self, build_type: &str, build: Build) -> Self {
        self.active
            .entry(BuildTypeId::new(build_type))
            .or_default()
            .push(build);
        self
    }

    pub fn cancelled_ids(&self) -> Vec<BuildId> {
        self.cancelled
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn triggered(&self) -> Vec<TriggerRequest> {
        self.triggered.lock().unwrap().clone()
    }
}

pub(crate) fn active_build(id: i64, build_type: &str, marker: Option<(&str, &str)>) -> Build {
    let properties = match marker {
        Some((name, value)) => ParameterBag::new().with(name, value),
        None => ParameterBag::new(),
    };
    Build {
        id: BuildId::new(id),
        state: "queued".to_string(),
        build_type_id: BuildTypeId::new(build_type),
        properties,
        ..Build::default()
    }
}

fn server_error(path: &str) -> ClientError {
    ClientError::RemoteApi {
        path: path.to_string(),
        status: 500,
        body: "internal error".to_string(),
    }
}

#[async_trait]
impl BuildBackend for FakeBackend {
    async fn search_configurations(
        &self,
        _name_pattern: Option<&str>,
        project_id: Option<&ProjectId>,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<BuildConfiguration>, ClientError> {
        self.searches
            .lock()
            .unwrap()
            .push((project_id.cloned(), page));
        if self.fail_search {
            return Err(server_error("/app/rest/buildTypes"));
        }

        let start = (page.max(1) - 1) as usize * page_size as usize;
        let items = self
            .configurations
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();
        Ok(PagedResult::new(items, self.configurations.len()))
    }

    async fn active_builds(
        &self,
        build_type_id: &BuildTypeId,
        count: u32,
    ) -> Result<PagedResult<Build>, ClientError> {
        if self.fail_active {
            return Err(server_error("/app/rest/builds"));
        }
        let builds: Vec<Build> = self
            .active
            .get(build_type_id)
            .map(|b| b.iter().take(count as usize).cloned().collect())
            .unwrap_or_default();
        let total = builds.len();
        Ok(PagedResult::new(builds, total))
    }

    async fn cancel_build(&self, build_id: BuildId, comment: &str) -> Result<(), ClientError> {
        if self.failing_cancels.contains(&build_id) {
            return Err(server_error(&format!("/app/rest/builds/id:{build_id}")));
        }
        self.cancelled
            .lock()
            .unwrap()
            .push((build_id, comment.to_string()));
        Ok(())
    }

    async fn trigger_build(&self, request: &TriggerRequest) -> Result<Option<Build>, ClientError> {
        self.triggered.lock().unwrap().push(request.clone());
        if self.empty_trigger {
            return Ok(None);
        }
        Ok(Some(Build {
            id: BuildId::new(9000),
            state: "queued".to_string(),
            build_type_id: request.build_type_id.clone(),
            properties: request.parameters.clone(),
            ..Build::default()
        }))
    }
}
