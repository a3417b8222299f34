//! Core types for secret rotation

mod id;
mod secret;
mod stage;

pub use id::{IdError, SecretId, VersionId};
pub use secret::{SecretDescription, SecretValue};
pub use stage::{CURRENT_LABEL, PENDING_LABEL, PREVIOUS_LABEL, Stage};
