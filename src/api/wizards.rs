//! Wizard session API endpoints.
//!
//! The session lock is never held across a save: the advance handler takes a ticket under
//! the lock, runs it unlocked in a spawned task, then re-locks to apply the outcome.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{ListChange, SetFieldRequest, WizardView};
use crate::wizard::{AdvanceBlocked, PersistError, Session, WizardKind};
use crate::AppState;

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<Session>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
}

fn submitted_conflict() -> AppError {
    AppError::Conflict("Application already submitted".to_string())
}

/// POST /api/wizards/{kind}/sessions - Open a fresh wizard session.
pub async fn open_session(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<WizardView> {
    let kind = WizardKind::from_str(&kind)
        .ok_or_else(|| AppError::NotFound(format!("Wizard {} not found", kind)))?;

    let session = state.sessions.open(kind).await;
    let wizard = session.wizard.lock().await;
    success(WizardView::new(session.id, &wizard))
}

/// GET /api/wizards/sessions/{id} - Current state of a session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WizardView> {
    let session = find_session(&state, id).await?;
    let wizard = session.wizard.lock().await;
    success(WizardView::new(session.id, &wizard))
}

/// PATCH /api/wizards/sessions/{id}/fields - Write one field value.
pub async fn set_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetFieldRequest>,
) -> ApiResult<WizardView> {
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard.lock().await;

    let form = wizard.form_mut().ok_or_else(submitted_conflict)?;
    form.set(&request.path, request.value)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    success(WizardView::new(session.id, &wizard))
}

/// POST /api/wizards/sessions/{id}/lists/{field} - Append a blank entry to a repeated list.
pub async fn append_entry(
    State(state): State<AppState>,
    Path((id, field)): Path<(Uuid, String)>,
) -> ApiResult<ListChange> {
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard.lock().await;

    let template = wizard
        .kind()
        .list_entry_template(&field)
        .ok_or_else(|| AppError::BadRequest(format!("{} is not a repeated field", field)))?;
    let form = wizard.form_mut().ok_or_else(submitted_conflict)?;
    let length = form.append(&field, template);

    success(ListChange {
        removed: false,
        length,
        view: WizardView::new(session.id, &wizard),
    })
}

/// DELETE /api/wizards/sessions/{id}/lists/{field}/{index} - Remove a list entry.
///
/// Removing the last remaining entry is refused with `removed: false`.
pub async fn remove_entry(
    State(state): State<AppState>,
    Path((id, field, index)): Path<(Uuid, String, usize)>,
) -> ApiResult<ListChange> {
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard.lock().await;

    if wizard.kind().list_entry_template(&field).is_none() {
        return Err(AppError::BadRequest(format!(
            "{} is not a repeated field",
            field
        )));
    }
    let form = wizard.form_mut().ok_or_else(submitted_conflict)?;
    let removed = form.remove(&field, index);
    let length = form.list_len(&field);

    success(ListChange {
        removed,
        length,
        view: WizardView::new(session.id, &wizard),
    })
}

/// POST /api/wizards/sessions/{id}/advance - Validate, save and move forward.
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WizardView> {
    let session = find_session(&state, id).await?;

    let ticket = {
        let mut wizard = session.wizard.lock().await;
        wizard.begin_advance().map_err(|blocked| match blocked {
            AdvanceBlocked::Invalid(errors) => AppError::Validation(errors),
            AdvanceBlocked::Busy => AppError::Conflict("A save is already in progress".to_string()),
            AdvanceBlocked::Submitted => submitted_conflict(),
            AdvanceBlocked::StepsIncomplete => {
                AppError::Conflict("Earlier steps have not been completed".to_string())
            }
        })?
    };

    tracing::debug!(session_id = %id, step = ticket.step, "Saving wizard step");

    // Settles in its own task: a dropped request must not leave the session in `Saving`.
    // Closing the session still cancels it through `session.cancel`.
    let store = state.store.clone();
    let saving = session.clone();
    let settled = tokio::spawn(async move {
        let outcome = ticket.execute(store.as_ref(), &saving.cancel).await;
        let mut wizard = saving.wizard.lock().await;
        wizard.finish_save(&ticket, outcome)?;
        Ok::<_, PersistError>(WizardView::new(saving.id, &wizard))
    });

    let view = settled.await.map_err(|e| {
        tracing::error!(session_id = %id, error = %e, "Wizard save task failed");
        AppError::Internal("Save task failed".to_string())
    })??;

    success(view)
}

/// POST /api/wizards/sessions/{id}/retreat - Go back one step without validating or saving.
pub async fn retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WizardView> {
    let session = find_session(&state, id).await?;
    let mut wizard = session.wizard.lock().await;

    if !wizard.retreat() {
        tracing::debug!(session_id = %id, step = wizard.current_step(), "Retreat ignored");
    }

    success(WizardView::new(session.id, &wizard))
}

/// DELETE /api/wizards/sessions/{id} - Abandon a session.
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Uuid> {
    if state.sessions.close(id).await {
        success(id)
    } else {
        Err(AppError::NotFound(format!("Session {} not found", id)))
    }
}
