//! Step controller.
//!
//! The wizard is an explicit state machine: a step index, the identifier of the record
//! created by the first save, and a status. Advancing is split into [`Wizard::begin_advance`]
//! (validation gate, produces a [`SaveTicket`]) and [`Wizard::finish_save`] (applies the
//! outcome of the save), so the caller can release any lock around the wizard while the
//! save is in flight.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::errors::RETRY_MESSAGE;
use crate::store::RecordStore;
use crate::validation::{self, FieldErrors};

use super::persistence::{self, PersistError};
use super::{FormState, StepDef, WizardKind};

/// Lifecycle of a wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStatus {
    Editing,
    Saving,
    Submitted,
}

/// Why an advance did not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceBlocked {
    /// The current step has invalid fields.
    Invalid(FieldErrors),
    /// A save for this wizard is still in flight.
    Busy,
    /// The application was already submitted.
    Submitted,
    /// Some earlier step never passed validation.
    StepsIncomplete,
}

/// Which persistence path a save takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    /// Create or partially update the record with one step's fields.
    Step,
    /// Mark the record finalized.
    Finalize,
}

/// Snapshot of everything a save needs, taken when the advance starts.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub kind: WizardKind,
    pub step: usize,
    pub save: SaveKind,
    pub record_id: Option<String>,
    pub form: FormState,
}

impl SaveTicket {
    /// Run the save against `store`. The call is abandoned when `cancel` fires.
    pub async fn execute(
        &self,
        store: &dyn RecordStore,
        cancel: &CancellationToken,
    ) -> Result<String, PersistError> {
        match self.save {
            SaveKind::Step => {
                persistence::save_step(
                    store,
                    self.kind,
                    self.step,
                    &self.form,
                    self.record_id.as_deref(),
                    cancel,
                )
                .await
            }
            SaveKind::Finalize => {
                persistence::finalize(
                    store,
                    self.kind,
                    &self.form,
                    self.record_id.as_deref(),
                    cancel,
                )
                .await
            }
        }
    }
}

/// A single application wizard session.
#[derive(Debug, Clone)]
pub struct Wizard {
    kind: WizardKind,
    current_step: usize,
    record_id: Option<String>,
    status: WizardStatus,
    form: FormState,
    errors: FieldErrors,
    submit_error: Option<String>,
    validated: Vec<bool>,
}

impl Wizard {
    pub fn new(kind: WizardKind) -> Self {
        Self {
            kind,
            current_step: 0,
            record_id: None,
            status: WizardStatus::Editing,
            form: kind.blank_form(),
            errors: FieldErrors::default(),
            submit_error: None,
            validated: vec![false; kind.step_count()],
        }
    }

    pub fn kind(&self) -> WizardKind {
        self.kind
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn step(&self) -> &'static StepDef {
        &self.kind.steps()[self.current_step]
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Mutable access to the field values. Edits are refused once submitted.
    pub fn form_mut(&mut self) -> Option<&mut FormState> {
        match self.status {
            WizardStatus::Submitted => None,
            _ => Some(&mut self.form),
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 == self.kind.step_count()
    }

    /// Validate the current step and, if it passes, move into `Saving`.
    pub fn begin_advance(&mut self) -> Result<SaveTicket, AdvanceBlocked> {
        match self.status {
            WizardStatus::Saving => return Err(AdvanceBlocked::Busy),
            WizardStatus::Submitted => return Err(AdvanceBlocked::Submitted),
            WizardStatus::Editing => {}
        }

        let step = self.step();
        self.errors.clear_fields(step.fields);
        if let Err(errors) = validation::validate_step(step.fields, &self.form) {
            self.errors.extend(errors.clone());
            return Err(AdvanceBlocked::Invalid(errors));
        }
        self.validated[self.current_step] = true;

        let save = if self.is_last_step() {
            if !self.validated.iter().all(|v| *v) {
                return Err(AdvanceBlocked::StepsIncomplete);
            }
            SaveKind::Finalize
        } else {
            SaveKind::Step
        };

        self.submit_error = None;
        self.status = WizardStatus::Saving;
        Ok(SaveTicket {
            kind: self.kind,
            step: self.current_step,
            save,
            record_id: self.record_id.clone(),
            form: self.form.clone(),
        })
    }

    /// Apply the outcome of the save started by `ticket`.
    ///
    /// Returns the persistence error back to the caller after recording it, so it can be
    /// surfaced.
    pub fn finish_save(
        &mut self,
        ticket: &SaveTicket,
        outcome: Result<String, PersistError>,
    ) -> Result<(), PersistError> {
        if self.status != WizardStatus::Saving || ticket.step != self.current_step {
            tracing::warn!(
                step = ticket.step,
                current = self.current_step,
                "Ignoring save outcome for a step that is no longer in flight"
            );
            return outcome.map(|_| ());
        }

        match outcome {
            Ok(id) => {
                if self.record_id.is_none() {
                    self.record_id = Some(id);
                }
                match ticket.save {
                    SaveKind::Step => {
                        self.current_step += 1;
                        self.status = WizardStatus::Editing;
                    }
                    SaveKind::Finalize => self.status = WizardStatus::Submitted,
                }
                Ok(())
            }
            Err(err) => {
                self.status = WizardStatus::Editing;
                self.submit_error = Some(RETRY_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    /// Go back one step. No validation and no save; refused at step 0 and while a save is
    /// in flight or after submission.
    pub fn retreat(&mut self) -> bool {
        if self.status != WizardStatus::Editing || self.current_step == 0 {
            return false;
        }
        self.current_step -= 1;
        self.submit_error = None;
        true
    }

    /// Validate, save and settle in one call.
    pub async fn advance(
        &mut self,
        store: &dyn RecordStore,
        cancel: &CancellationToken,
    ) -> Result<(), AdvanceError> {
        let ticket = self.begin_advance().map_err(AdvanceError::Blocked)?;
        let outcome = ticket.execute(store, cancel).await;
        self.finish_save(&ticket, outcome)
            .map_err(AdvanceError::Persist)
    }
}

/// Failure of [`Wizard::advance`].
#[derive(Debug)]
pub enum AdvanceError {
    Blocked(AdvanceBlocked),
    Persist(PersistError),
}
