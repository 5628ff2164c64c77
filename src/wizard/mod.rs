//! Multi-step application wizards.
//!
//! A wizard walks an applicant through a fixed sequence of steps. Each forward move is gated
//! on validating only the current step, then persists only that step's fields: the first
//! step creates the record as `partial`, later steps update it, and the last step finalizes
//! it.

mod controller;
mod form;
pub mod persistence;
mod session;
mod steps;

pub use controller::*;
pub use form::*;
pub use persistence::PersistError;
pub use session::*;
pub use steps::*;
