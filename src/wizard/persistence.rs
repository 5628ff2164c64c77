//! Incremental persistence of wizard steps and the terminal submission.

use std::future::Future;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::models::ApplicationStatus;
use crate::store::{Fields, RecordStore, StoreError};
use crate::validation;

use super::steps::{column_name, AGREEMENT_ACCEPTED};
use super::{FormState, StepDef, WizardKind};

/// Failure of a step save or finalization.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("save abandoned before it completed")]
    Cancelled,
    #[error("step {0} cannot be saved before the record exists")]
    MissingRecord(usize),
}

/// Storage columns for the fields owned by one step.
pub fn step_fields(step: &StepDef, form: &FormState) -> Fields {
    step.fields
        .iter()
        .map(|field| {
            (
                column_name(field.path),
                validation::normalize(&field.rule, form.get(field.path)),
            )
        })
        .collect()
}

/// Persist the fields of `step`.
///
/// Step 0 without a record creates it with status `partial`; any step with a record updates
/// only that step's columns. Returns the record identifier.
pub async fn save_step(
    store: &dyn RecordStore,
    kind: WizardKind,
    step: usize,
    form: &FormState,
    record_id: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String, PersistError> {
    let collection = kind.collection();
    let mut fields = step_fields(&kind.steps()[step], form);

    match record_id {
        Some(id) => {
            cancellable(cancel, store.update(collection, id, fields)).await?;
            tracing::info!(wizard = kind.as_str(), step, record_id = %id, "Saved wizard step");
            Ok(id.to_string())
        }
        None if step == 0 => {
            fields.insert(status_column(), ApplicationStatus::Partial.into());
            let id = cancellable(cancel, store.create(collection, fields)).await?;
            tracing::info!(wizard = kind.as_str(), record_id = %id, "Created partial application");
            Ok(id)
        }
        None => Err(PersistError::MissingRecord(step)),
    }
}

/// Finalize the application in a single write.
///
/// With a record, the last step's fields, the finalized status and the accepted agreement are
/// written together. Without one (every earlier save failed to produce an identifier), the
/// whole form is created as an already-finalized record.
pub async fn finalize(
    store: &dyn RecordStore,
    kind: WizardKind,
    form: &FormState,
    record_id: Option<&str>,
    cancel: &CancellationToken,
) -> Result<String, PersistError> {
    let collection = kind.collection();
    let steps = kind.steps();

    let mut fields = match record_id {
        Some(_) => steps.last().map(|s| step_fields(s, form)).unwrap_or_default(),
        None => steps.iter().flat_map(|s| step_fields(s, form)).collect(),
    };
    fields.insert(status_column(), ApplicationStatus::New.into());
    fields.insert(column_name(AGREEMENT_ACCEPTED), Value::Bool(true));

    let id = match record_id {
        Some(id) => {
            cancellable(cancel, store.update(collection, id, fields)).await?;
            id.to_string()
        }
        None => {
            tracing::warn!(
                wizard = kind.as_str(),
                "Finalizing without a partial record, creating it in full"
            );
            cancellable(cancel, store.create(collection, fields)).await?
        }
    };

    tracing::info!(wizard = kind.as_str(), record_id = %id, "Application submitted");
    Ok(id)
}

fn status_column() -> String {
    "status".to_string()
}

/// Race a store call against the session's cancellation token.
async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, PersistError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PersistError::Cancelled),
        result = call => result.map_err(PersistError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{Call, MemoryStore};
    use serde_json::json;

    fn therapist_form() -> FormState {
        FormState::from_value(json!({
            "firstName": " Grace ",
            "lastName": "Hopper",
            "email": "grace@example.com",
            "phone": "555-123-4567",
            "licensedStates": ["Ohio"],
            "licenseType": "Psychologist",
            "telehealthExperience": true,
            "weeklyHours": "Whenever I find time",
            "referralSource": "Friend",
            "motivation": "I want to help veterans.",
            "agreementAccepted": true
        }))
    }

    #[test]
    fn test_step_fields_are_scoped_and_normalized() {
        let form = therapist_form();
        let fields = step_fields(&WizardKind::Therapist.steps()[0], &form);

        assert_eq!(fields.len(), 4);
        assert_eq!(fields["first_name"], "Grace");
        assert!(fields.get("license_type").is_none());
    }

    #[tokio::test]
    async fn test_save_step_without_record_after_first_step_fails() {
        let store = MemoryStore::new();
        let err = save_step(
            &store,
            WizardKind::Therapist,
            2,
            &therapist_form(),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PersistError::MissingRecord(2)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_without_record_creates_full_record() {
        let store = MemoryStore::new();
        let id = finalize(
            &store,
            WizardKind::Therapist,
            &therapist_form(),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 1);
        let Call::Create { fields, .. } = &calls[0] else {
            panic!("expected a create");
        };
        assert_eq!(fields["status"], "new");
        assert_eq!(fields["agreement_accepted"], true);
        assert_eq!(fields["licensed_states"], json!(["Ohio"]));
        assert_eq!(fields["phone"], "555-123-4567");
        assert!(store.record("therapist_applications", &id).is_some());
    }

    #[tokio::test]
    async fn test_finalize_with_record_is_single_update() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let form = therapist_form();
        let id = save_step(&store, WizardKind::Therapist, 0, &form, None, &cancel)
            .await
            .unwrap();

        finalize(&store, WizardKind::Therapist, &form, Some(&id), &cancel)
            .await
            .unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        let Call::Update { fields, .. } = &calls[1] else {
            panic!("expected an update");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["status"], "new");
        assert_eq!(fields["agreement_accepted"], true);
    }
}
