//! Pluggable setSecret / testSecret
//!
//! What it means to apply or verify a credential depends entirely on the
//! system the secret protects (a database user's password, an API key at a
//! vendor, ...). Implement [`CredentialTarget`] for that system and hand it to
//! [`crate::RotationHandler`].
//!
//! # Contract
//!
//! - Both steps receive the store and identifiers explicitly and must read the
//!   PENDING value themselves, e.g. via [`fetch_pending`].
//! - Both must be idempotent: applying or testing the same pending value twice
//!   is harmless.
//! - Any partial or uncertain outcome must be returned as an error. A masked
//!   failure in `test_secret` would let an unverified credential reach
//!   finishSecret.
//!
//! # Example
//!
//! ```rust,ignore
//! struct PostgresTarget { admin: PgPool, user: String }
//!
//! #[async_trait]
//! impl CredentialTarget for PostgresTarget {
//!     async fn set_secret(&self, store: &dyn SecretStore, secret_id: &SecretId, token: &VersionId)
//!         -> RotationResult<()>
//!     {
//!         let pending = fetch_pending(store, secret_id, token).await?;
//!         sqlx::query(&format!("ALTER USER {} PASSWORD $1", self.user))
//!             .bind(pending.expose())
//!             .execute(&self.admin)
//!             .await
//!             .map_err(|e| RotationError::TargetFailed {
//!                 step: "setSecret",
//!                 secret_id: secret_id.clone(),
//!                 reason: e.to_string(),
//!             })?;
//!         Ok(())
//!     }
//!
//!     async fn test_secret(&self, store: &dyn SecretStore, secret_id: &SecretId, token: &VersionId)
//!         -> RotationResult<()>
//!     {
//!         let pending = fetch_pending(store, secret_id, token).await?;
//!         connect_as(&self.user, pending.expose()).await?.execute("SELECT 1").await?;
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use super::error::{RotationError, RotationResult};
use crate::core::{SecretId, SecretValue, Stage, VersionId};
use crate::store::{GetSecretValue, SecretStore, StoreOperation};

/// The protected downstream system a secret authenticates against
#[async_trait]
pub trait CredentialTarget: Send + Sync {
    /// Apply the PENDING value to the downstream system
    async fn set_secret(
        &self,
        store: &dyn SecretStore,
        secret_id: &SecretId,
        token: &VersionId,
    ) -> RotationResult<()>;

    /// Verify the PENDING value grants the expected access
    async fn test_secret(
        &self,
        store: &dyn SecretStore,
        secret_id: &SecretId,
        token: &VersionId,
    ) -> RotationResult<()>;
}

/// Read the PENDING value of `token`
///
/// Any failure, including "not found", is an error here: by the time
/// setSecret or testSecret run, createSecret must have stored the value.
pub async fn fetch_pending(
    store: &dyn SecretStore,
    secret_id: &SecretId,
    token: &VersionId,
) -> RotationResult<SecretValue> {
    store
        .get_secret_value(GetSecretValue::by_version_and_stage(
            secret_id.clone(),
            token.clone(),
            Stage::Pending,
        ))
        .await
        .map_err(|e| RotationError::store(StoreOperation::GetSecretValue, e))
}

/// Target with no downstream integration; both steps fail
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedTarget;

#[async_trait]
impl CredentialTarget for UnimplementedTarget {
    async fn set_secret(
        &self,
        _store: &dyn SecretStore,
        secret_id: &SecretId,
        _token: &VersionId,
    ) -> RotationResult<()> {
        Err(RotationError::NotImplemented {
            step: "setSecret",
            secret_id: secret_id.clone(),
        })
    }

    async fn test_secret(
        &self,
        _store: &dyn SecretStore,
        secret_id: &SecretId,
        _token: &VersionId,
    ) -> RotationResult<()> {
        Err(RotationError::NotImplemented {
            step: "testSecret",
            secret_id: secret_id.clone(),
        })
    }
}
