//! Identity of a dispatch request.

use serde::{Deserialize, Serialize};

use crate::TaskFingerprint;

/// The fields that identify one logical task. Two requests with equal
/// identities are duplicates of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskIdentity {
    /// Address of the agent that produced the artifacts.
    pub agent_addr: String,

    /// Name of the build that produced the artifacts.
    pub build_name: String,

    /// Source (VCS) path the artifacts are destined for.
    pub source_path: String,

    /// Patch or task name.
    pub patch_name: String,
}

impl TaskIdentity {
    pub fn new(
        agent_addr: impl Into<String>,
        build_name: impl Into<String>,
        source_path: impl Into<String>,
        patch_name: impl Into<String>,
    ) -> Self {
        Self {
            agent_addr: agent_addr.into(),
            build_name: build_name.into(),
            source_path: source_path.into(),
            patch_name: patch_name.into(),
        }
    }

    /// Fingerprint over (agent, build name, source path, patch name), in that order.
    pub fn fingerprint(&self) -> TaskFingerprint {
        TaskFingerprint::from_fields([
            self.agent_addr.as_str(),
            self.build_name.as_str(),
            self.source_path.as_str(),
            self.patch_name.as_str(),
        ])
    }
}
