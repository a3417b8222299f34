//! Rotation-specific error types
//!
//! Every variant aborts the current invocation. Nothing is retried or
//! compensated in-process; the scheduler redelivers the whole step.

use thiserror::Error;

use crate::config::ConfigError;
use crate::core::{IdError, SecretId, VersionId};
use crate::store::{StoreError, StoreOperation};

/// Errors that can occur while handling a rotation invocation
#[derive(Debug, Error)]
pub enum RotationError {
    /// Secret is not enabled for rotation
    #[error("Secret {secret_id} is not enabled for rotation")]
    RotationNotEnabled { secret_id: SecretId },

    /// Token has no entry in the version → stages map
    #[error("Secret version {version} has no stage for rotation of secret {secret_id}")]
    UnknownVersion {
        secret_id: SecretId,
        version: VersionId,
    },

    /// Token is already CURRENT; rotation for it has completed
    #[error("Secret version {version} already set as AWSCURRENT for secret {secret_id}")]
    AlreadyCurrent {
        secret_id: SecretId,
        version: VersionId,
    },

    /// Token is neither CURRENT nor PENDING
    #[error("Secret version {version} not set as AWSPENDING for rotation of secret {secret_id}")]
    NotPending {
        secret_id: SecretId,
        version: VersionId,
    },

    /// Step name is not one of the four rotation steps
    #[error("Invalid step parameter: {step}")]
    InvalidStep { step: String },

    /// More than one version carries CURRENT
    #[error("Secret {secret_id} has {} versions staged AWSCURRENT: {}", versions.len(), join(versions))]
    InconsistentStages {
        secret_id: SecretId,
        versions: Vec<VersionId>,
    },

    /// The configured target does not implement this step
    #[error("{step} is not implemented for secret {secret_id}")]
    NotImplemented {
        step: &'static str,
        secret_id: SecretId,
    },

    /// The protected downstream system rejected or failed the step
    #[error("{step} failed for secret {secret_id}: {reason}")]
    TargetFailed {
        step: &'static str,
        secret_id: SecretId,
        reason: String,
    },

    /// Event payload could not be decoded
    #[error("Malformed rotation event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    /// Invocation carried malformed identifiers
    #[error("Invalid invocation: {0}")]
    InvalidInvocation(#[from] IdError),

    /// Secret store call failed
    #[error("Secret store error during {operation}: {source}")]
    Store {
        operation: StoreOperation,
        #[source]
        source: StoreError,
    },

    /// Handler configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn join(versions: &[VersionId]) -> String {
    versions
        .iter()
        .map(VersionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RotationError {
    /// Wrap a store failure with the operation that produced it
    pub fn store(operation: StoreOperation, source: StoreError) -> Self {
        Self::Store { operation, source }
    }

    /// Whether this came from the staging gate or step-name check
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::RotationNotEnabled { .. }
                | Self::UnknownVersion { .. }
                | Self::AlreadyCurrent { .. }
                | Self::NotPending { .. }
                | Self::InvalidStep { .. }
        )
    }

    /// Whether the token was already promoted; callers treat this as a
    /// terminal success rather than a retryable failure
    pub fn is_already_complete(&self) -> bool {
        matches!(self, Self::AlreadyCurrent { .. })
    }
}

/// Result type for rotation operations
pub type RotationResult<T> = Result<T, RotationError>;
