//! finishSecret: promote the token to CURRENT

use super::error::{RotationError, RotationResult};
use crate::core::{SecretId, Stage, VersionId};
use crate::store::{SecretStore, StoreOperation, UpdateVersionStage};

/// Outcome of [`finish_secret`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// CURRENT moved onto the token; `previous` lost it in the same call
    Promoted { previous: Option<VersionId> },
    /// The token already held CURRENT
    AlreadyCurrent,
}

/// Move CURRENT onto `token`, demoting the prior CURRENT version
///
/// The swap is one `update_version_stage` call; the store guarantees there is
/// no window with zero or two CURRENT versions. A map with more than one
/// CURRENT version is refused as [`RotationError::InconsistentStages`] rather
/// than guessing which one to demote. A map with none promotes the token
/// without a `remove_from` version.
#[tracing::instrument(skip_all, fields(secret_id = %secret_id, version = %token))]
pub async fn finish_secret<S>(
    store: &S,
    secret_id: &SecretId,
    token: &VersionId,
) -> RotationResult<FinishOutcome>
where
    S: SecretStore + ?Sized,
{
    let description = store
        .describe_secret(secret_id)
        .await
        .map_err(|e| RotationError::store(StoreOperation::DescribeSecret, e))?;

    let current = description.versions_with(&Stage::Current);
    let previous = match current.as_slice() {
        [] => None,
        [only] if *only == token => {
            tracing::info!("finishSecret: version already marked as current");
            return Ok(FinishOutcome::AlreadyCurrent);
        }
        [only] => Some((*only).clone()),
        many => {
            tracing::error!(count = many.len(), "finishSecret: multiple current versions");
            return Err(RotationError::InconsistentStages {
                secret_id: secret_id.clone(),
                versions: many.iter().map(|v| (*v).clone()).collect(),
            });
        }
    };

    if previous.is_none() {
        tracing::warn!("finishSecret: no version currently staged as current");
    }

    store
        .update_version_stage(UpdateVersionStage {
            secret_id: secret_id.clone(),
            version_stage: Stage::Current,
            move_to_version_id: Some(token.clone()),
            remove_from_version_id: previous.clone(),
        })
        .await
        .map_err(|e| RotationError::store(StoreOperation::UpdateVersionStage, e))?;

    tracing::info!(
        previous = previous.as_ref().map_or("none", VersionId::as_str),
        "finishSecret: successfully set current stage"
    );
    Ok(FinishOutcome::Promoted { previous })
}
