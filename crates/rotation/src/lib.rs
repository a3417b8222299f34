//! Stagehand Rotation - zero-downtime secret rotation
//!
//! Implements the four-step rotation choreography used by versioned secret
//! stores: `createSecret` → `setSecret` → `testSecret` → `finishSecret`.
//! All durable state lives in the store's version → stage map; this crate
//! owns none. Every step is idempotent so that at-least-once delivery never
//! corrupts the version history or exposes a half-rotated credential.
//!
//! # Layout
//!
//! - [`core`] - identifiers, staging labels, secret descriptions and values
//! - [`store`] - the [`SecretStore`] port plus an in-memory implementation
//! - [`rotation`] - staging gate, step handlers and the dispatcher
//! - [`config`] - rotation and password-policy configuration
#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod rotation;
pub mod store;

// ── Root re-exports ─────────────────────────────────────────────────────────

pub use crate::config::{ConfigError, PasswordPolicy, RotationConfig};
pub use crate::core::{
    IdError, SecretDescription, SecretId, SecretValue, Stage, VersionId,
};
pub use crate::rotation::{
    CreateOutcome, CredentialTarget, FinishOutcome, RotationError, RotationEvent,
    RotationHandler, RotationInvocation, RotationResult, RotationStep, StepOutcome,
    UnimplementedTarget,
};
pub use crate::store::{SecretStore, StoreError};

/// Commonly used types and traits
pub mod prelude {
    pub use crate::config::{PasswordPolicy, RotationConfig};
    pub use crate::core::{SecretDescription, SecretId, SecretValue, Stage, VersionId};
    pub use crate::rotation::{
        CredentialTarget, RotationError, RotationEvent, RotationHandler, RotationResult,
        RotationStep, StepOutcome, UnimplementedTarget, fetch_pending,
    };
    pub use crate::store::{
        GetSecretValue, MemorySecretStore, SecretStore, StoreError, StoreOperation,
    };
}
