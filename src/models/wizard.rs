//! Wizard session request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::validation::FieldErrors;
use crate::wizard::{Wizard, WizardKind, WizardStatus};

/// Snapshot of a wizard session as shown to the applicant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub session_id: Uuid,
    pub wizard: WizardKind,
    pub step: usize,
    pub step_key: &'static str,
    pub step_label: &'static str,
    pub total_steps: usize,
    pub status: WizardStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub values: Map<String, Value>,
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<&'static str>,
}

impl WizardView {
    pub fn new(session_id: Uuid, wizard: &Wizard) -> Self {
        let step = wizard.step();
        let submitted = wizard.status() == WizardStatus::Submitted;
        Self {
            session_id,
            wizard: wizard.kind(),
            step: wizard.current_step(),
            step_key: step.key,
            step_label: step.label,
            total_steps: wizard.kind().step_count(),
            status: wizard.status(),
            record_id: wizard.record_id().map(str::to_string),
            values: wizard.form().values().clone(),
            errors: wizard.errors().clone(),
            submit_error: wizard.submit_error().map(str::to_string),
            confirmation: submitted.then(|| wizard.kind().confirmation()),
        }
    }
}

/// Request body for writing one field.
#[derive(Debug, Clone, Deserialize)]
pub struct SetFieldRequest {
    pub path: String,
    #[serde(default)]
    pub value: Value,
}

/// Result of removing an entry from a repeated list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChange {
    pub removed: bool,
    pub length: usize,
    pub view: WizardView,
}
