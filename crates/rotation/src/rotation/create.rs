//! createSecret: make sure a PENDING value exists for the token

use super::error::{RotationError, RotationResult};
use crate::config::PasswordPolicy;
use crate::core::{SecretId, Stage, VersionId};
use crate::store::{GetSecretValue, PutSecretValue, SecretStore, StoreOperation};

/// Outcome of [`create_secret`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new value was generated and stored as PENDING
    Created,
    /// A previous delivery already stored the value
    AlreadyExists,
}

/// Ensure `token` holds a PENDING value, generating one if needed
///
/// 1. The CURRENT value must be readable; without a baseline rotation stops.
/// 2. If the token already has a PENDING value this is a no-op.
/// 3. Only a "not found" answer leads to generating and storing a new value.
///
/// Never touches CURRENT. Creates at most one version.
#[tracing::instrument(skip_all, fields(secret_id = %secret_id, version = %token))]
pub async fn create_secret<S>(
    store: &S,
    policy: &PasswordPolicy,
    secret_id: &SecretId,
    token: &VersionId,
) -> RotationResult<CreateOutcome>
where
    S: SecretStore + ?Sized,
{
    store
        .get_secret_value(GetSecretValue::by_stage(secret_id.clone(), Stage::Current))
        .await
        .map_err(|e| RotationError::store(StoreOperation::GetSecretValue, e))?;

    match store
        .get_secret_value(GetSecretValue::by_version_and_stage(
            secret_id.clone(),
            token.clone(),
            Stage::Pending,
        ))
        .await
    {
        Ok(_) => {
            tracing::info!("createSecret: pending value already present");
            return Ok(CreateOutcome::AlreadyExists);
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(RotationError::store(StoreOperation::GetSecretValue, e)),
    }

    let value = store
        .get_random_password(policy)
        .await
        .map_err(|e| RotationError::store(StoreOperation::GetRandomPassword, e))?;

    store
        .put_secret_value(PutSecretValue {
            secret_id: secret_id.clone(),
            client_request_token: token.clone(),
            secret_string: value,
            version_stages: vec![Stage::Pending],
        })
        .await
        .map_err(|e| RotationError::store(StoreOperation::PutSecretValue, e))?;

    tracing::info!("createSecret: successfully put pending secret");
    Ok(CreateOutcome::Created)
}
