//! Data models for the intake backend.
//!
//! Field names follow the camelCase wire format used by the site's forms.

mod application;
mod attribution;
mod wizard;

pub use application::*;
pub use attribution::*;
pub use wizard::*;
