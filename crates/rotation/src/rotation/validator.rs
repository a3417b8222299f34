//! Staging gate
//!
//! Runs before every step, on every delivery. The check is a single
//! side-effect-free describe call, so it is never cached.

use super::error::{RotationError, RotationResult};
use crate::core::{SecretId, Stage, VersionId};
use crate::store::{SecretStore, StoreOperation};

/// Decide whether rotation of `secret_id` towards `token` may proceed
///
/// Checks, in order: rotation enabled, token known, token not already
/// CURRENT, token staged PENDING.
#[tracing::instrument(skip_all, fields(secret_id = %secret_id, version = %token))]
pub async fn check_staging<S>(store: &S, secret_id: &SecretId, token: &VersionId) -> RotationResult<()>
where
    S: SecretStore + ?Sized,
{
    let description = store
        .describe_secret(secret_id)
        .await
        .map_err(|e| RotationError::store(StoreOperation::DescribeSecret, e))?;

    if !description.rotation_enabled {
        return Err(RotationError::RotationNotEnabled {
            secret_id: secret_id.clone(),
        });
    }

    let Some(stages) = description.stages_of(token) else {
        return Err(RotationError::UnknownVersion {
            secret_id: secret_id.clone(),
            version: token.clone(),
        });
    };

    if stages.contains(&Stage::Current) {
        tracing::info!("Version already staged as current");
        return Err(RotationError::AlreadyCurrent {
            secret_id: secret_id.clone(),
            version: token.clone(),
        });
    }

    if !stages.contains(&Stage::Pending) {
        return Err(RotationError::NotPending {
            secret_id: secret_id.clone(),
            version: token.clone(),
        });
    }

    tracing::debug!(stages = ?stages, "Staging check passed");
    Ok(())
}
