//! Build status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a build as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    /// Status text was missing or not recognised.
    #[default]
    Unknown,
    /// Build is waiting in the queue.
    Queued,
    /// Build is executing on an agent.
    Running,
    /// Build finished successfully.
    Success,
    /// Build finished with a failure.
    Failure,
    /// Build was cancelled.
    Cancelled,
}

impl BuildStatus {
    /// Parse a server status or state string, ignoring case.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Self::Success,
            "FAILURE" | "ERROR" => Self::Failure,
            "RUNNING" => Self::Running,
            "QUEUED" => Self::Queued,
            "CANCELLED" | "CANCELED" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }

    /// Returns true if the build is still queued or running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Upper-case form used inside locators.
    pub fn as_locator_value(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "Unknown",
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}
