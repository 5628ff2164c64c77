//! Application record lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle tag stored on every application record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Created by the first wizard step, not yet finished.
    Partial,
    /// All steps completed and the agreement accepted.
    New,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Partial => "partial",
            ApplicationStatus::New => "new",
        }
    }
}

impl From<ApplicationStatus> for Value {
    fn from(status: ApplicationStatus) -> Self {
        Value::String(status.as_str().to_string())
    }
}

/// Query parameters for listing application records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListApplicationsQuery {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}
