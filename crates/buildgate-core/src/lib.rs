//! buildgate Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Runtime specifics
//!
//! Everything here mirrors the records exchanged with a TeamCity-style build
//! server, plus the task fingerprint used to detect duplicate build requests.

pub mod fingerprint;
pub mod ids;
pub mod model;
pub mod paging;
pub mod params;
pub mod status;
pub mod task;
pub mod trigger;

// Re-export commonly used types
pub use fingerprint::TaskFingerprint;
pub use ids::{BuildId, BuildTypeId, ProjectId};
pub use model::{
    canonical_field_name, Build, BuildAgent, BuildConfiguration, BuildTag, BuildTags, Project,
};
pub use paging::{page_start, Locator, PagedResult};
pub use params::{Parameter, ParameterBag};
pub use status::BuildStatus;
pub use task::TaskIdentity;
pub use trigger::{BuildSearchCriteria, CancelRequest, TriggerRequest};
