//! Secret store port
//!
//! The rotation core talks to the secret store only through [`SecretStore`].
//! Each call is assumed atomic on its own; nothing is atomic across calls.
//! Errors are distinguished only by whether they mean "not found"
//! ([`StoreError::is_not_found`]); every other kind aborts the invocation.

mod memory;
mod metrics;

pub use memory::MemorySecretStore;
pub use metrics::StoreMetrics;

use async_trait::async_trait;
use secrecy::SecretString;
use std::fmt;
use thiserror::Error;

use crate::config::PasswordPolicy;
use crate::core::{SecretDescription, SecretId, SecretValue, Stage, VersionId};

/// Store calls consumed by the rotation core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// describe-secret
    DescribeSecret,
    /// get-secret-value
    GetSecretValue,
    /// put-secret-value
    PutSecretValue,
    /// update-version-stage
    UpdateVersionStage,
    /// generate-random-value
    GetRandomPassword,
}

impl StoreOperation {
    /// Every operation, in declaration order
    pub const ALL: [Self; 5] = [
        Self::DescribeSecret,
        Self::GetSecretValue,
        Self::PutSecretValue,
        Self::UpdateVersionStage,
        Self::GetRandomPassword,
    ];

    /// Name used in logs and error messages
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DescribeSecret => "describe_secret",
            Self::GetSecretValue => "get_secret_value",
            Self::PutSecretValue => "put_secret_value",
            Self::UpdateVersionStage => "update_version_stage",
            Self::GetRandomPassword => "get_random_password",
        }
    }

    /// Whether the call changes stored state
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::PutSecretValue | Self::UpdateVersionStage)
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a secret store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The secret, version or stage does not exist
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// The store refused the request as invalid for the current state
    #[error("{operation} rejected: {reason}")]
    InvalidRequest {
        operation: StoreOperation,
        reason: String,
    },

    /// The store could not be reached or failed internally
    #[error("{operation} failed: {reason}")]
    Unavailable {
        operation: StoreOperation,
        reason: String,
    },
}

impl StoreError {
    /// Shorthand for a not-found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Whether this is the recognised "resource not found" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Selector for [`SecretStore::get_secret_value`]
///
/// With neither `version_id` nor `version_stage` the store returns the
/// CURRENT value. With both, the version must carry the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSecretValue {
    pub secret_id: SecretId,
    pub version_id: Option<VersionId>,
    pub version_stage: Option<Stage>,
}

impl GetSecretValue {
    /// Select the value currently staged as `stage`
    pub fn by_stage(secret_id: SecretId, stage: Stage) -> Self {
        Self {
            secret_id,
            version_id: None,
            version_stage: Some(stage),
        }
    }

    /// Select `version_id`, requiring it to carry `stage`
    pub fn by_version_and_stage(secret_id: SecretId, version_id: VersionId, stage: Stage) -> Self {
        Self {
            secret_id,
            version_id: Some(version_id),
            version_stage: Some(stage),
        }
    }
}

/// Arguments for [`SecretStore::put_secret_value`]
pub struct PutSecretValue {
    pub secret_id: SecretId,
    /// Becomes the version id; the store uses it as an idempotency key
    pub client_request_token: VersionId,
    pub secret_string: SecretString,
    pub version_stages: Vec<Stage>,
}

impl fmt::Debug for PutSecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutSecretValue")
            .field("secret_id", &self.secret_id)
            .field("client_request_token", &self.client_request_token)
            .field("secret_string", &"[REDACTED]")
            .field("version_stages", &self.version_stages)
            .finish()
    }
}

/// Arguments for [`SecretStore::update_version_stage`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateVersionStage {
    pub secret_id: SecretId,
    pub version_stage: Stage,
    /// Version that receives the stage
    pub move_to_version_id: Option<VersionId>,
    /// Version that loses the stage in the same atomic step
    pub remove_from_version_id: Option<VersionId>,
}

/// Versioned secret store consumed by the rotation core
///
/// Implementations wrap a remote service; each call is a network round trip.
/// The core never caches results between calls.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Rotation flag and full version → stages map
    async fn describe_secret(&self, secret_id: &SecretId) -> StoreResult<SecretDescription>;

    /// Read a value by version and/or stage
    async fn get_secret_value(&self, request: GetSecretValue) -> StoreResult<SecretValue>;

    /// Store a value under a new version with the given stages
    async fn put_secret_value(&self, request: PutSecretValue) -> StoreResult<()>;

    /// Atomically move a stage from one version to another
    async fn update_version_stage(&self, request: UpdateVersionStage) -> StoreResult<()>;

    /// Generate a random value honouring `policy`
    async fn get_random_password(&self, policy: &PasswordPolicy) -> StoreResult<SecretString>;
}
