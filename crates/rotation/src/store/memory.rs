//! In-memory secret store
//!
//! Follows the remote store's staging semantics closely enough that the
//! rotation core can be exercised end to end without a network:
//!
//! - a version may exist with stages but no value yet (the state a rotation
//!   starts in, see [`MemorySecretStore::begin_rotation`]);
//! - attaching a stage to a version removes it from every other version;
//! - moving CURRENT away from a version marks that version PREVIOUS;
//! - re-putting an identical value on an existing version is accepted,
//!   a different value is rejected.
//!
//! One-shot failures can be injected per operation to drive error paths.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use subtle::ConstantTimeEq;

use super::{
    GetSecretValue, PutSecretValue, SecretStore, StoreError, StoreMetrics, StoreOperation,
    StoreResult, UpdateVersionStage,
};
use crate::config::PasswordPolicy;
use crate::core::{SecretDescription, SecretId, SecretValue, Stage, VersionId};

struct VersionRecord {
    value: Option<SecretString>,
    stages: Vec<Stage>,
}

struct SecretRecord {
    rotation_enabled: bool,
    versions: HashMap<VersionId, VersionRecord>,
}

impl SecretRecord {
    fn holders_of(&self, stage: &Stage) -> Vec<VersionId> {
        self.versions
            .iter()
            .filter(|(_, record)| record.stages.contains(stage))
            .map(|(version, _)| version.clone())
            .collect()
    }

    fn remove_stage(&mut self, version: &VersionId, stage: &Stage) {
        if let Some(record) = self.versions.get_mut(version) {
            record.stages.retain(|s| s != stage);
        }
    }

    fn add_stage(&mut self, version: &VersionId, stage: Stage) {
        if let Some(record) = self.versions.get_mut(version)
            && !record.stages.contains(&stage)
        {
            record.stages.push(stage);
        }
    }

    fn demote(&mut self, version: &VersionId) {
        for record in self.versions.values_mut() {
            record.stages.retain(|s| *s != Stage::Previous);
        }
        self.add_stage(version, Stage::Previous);
    }

    /// Attach `stage` to `target`, taking it off every other version
    fn attach(&mut self, target: &VersionId, stage: Stage) {
        let previous_holders: Vec<VersionId> = self
            .holders_of(&stage)
            .into_iter()
            .filter(|v| v != target)
            .collect();

        for holder in &previous_holders {
            self.remove_stage(holder, &stage);
        }

        if stage == Stage::Current
            && let Some(demoted) = previous_holders.first()
        {
            self.demote(demoted);
        }

        self.add_stage(target, stage);
    }
}

/// In-process [`SecretStore`] for tests and local runs
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<SecretId, SecretRecord>>,
    failures: Mutex<HashMap<StoreOperation, StoreError>>,
    metrics: StoreMetrics,
}

impl std::fmt::Debug for MemorySecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySecretStore")
            .field("secrets", &self.secrets.read().len())
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl MemorySecretStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret with no versions
    pub fn insert_secret(&self, secret_id: SecretId, rotation_enabled: bool) {
        self.secrets.write().insert(
            secret_id,
            SecretRecord {
                rotation_enabled,
                versions: HashMap::new(),
            },
        );
    }

    /// Seed a version with a value and stages, bypassing metrics
    pub fn put_version(
        &self,
        secret_id: &SecretId,
        version_id: VersionId,
        value: &str,
        stages: Vec<Stage>,
    ) -> StoreResult<()> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| StoreError::not_found(format!("secret {secret_id}")))?;

        secret.versions.insert(
            version_id.clone(),
            VersionRecord {
                value: Some(SecretString::from(value.to_string())),
                stages: Vec::new(),
            },
        );
        for stage in stages {
            secret.attach(&version_id, stage);
        }
        Ok(())
    }

    /// Stage `token` as PENDING without a value, as the store does when a
    /// rotation is started and before createSecret runs
    pub fn begin_rotation(&self, secret_id: &SecretId, token: VersionId) -> StoreResult<()> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| StoreError::not_found(format!("secret {secret_id}")))?;

        secret
            .versions
            .entry(token.clone())
            .or_insert_with(|| VersionRecord {
                value: None,
                stages: Vec::new(),
            });
        secret.attach(&token, Stage::Pending);
        Ok(())
    }

    /// Toggle the rotation flag
    pub fn set_rotation_enabled(&self, secret_id: &SecretId, enabled: bool) -> StoreResult<()> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(secret_id)
            .ok_or_else(|| StoreError::not_found(format!("secret {secret_id}")))?;
        secret.rotation_enabled = enabled;
        Ok(())
    }

    /// Snapshot of the version → stages map with stages sorted
    pub fn version_stages(&self, secret_id: &SecretId) -> Option<HashMap<VersionId, Vec<Stage>>> {
        let secrets = self.secrets.read();
        let secret = secrets.get(secret_id)?;
        Some(
            secret
                .versions
                .iter()
                .map(|(version, record)| {
                    let mut stages = record.stages.clone();
                    stages.sort();
                    (version.clone(), stages)
                })
                .collect(),
        )
    }

    /// Raw value of a version, for inspection in tests
    pub fn value_of(&self, secret_id: &SecretId, version_id: &VersionId) -> Option<String> {
        let secrets = self.secrets.read();
        secrets
            .get(secret_id)?
            .versions
            .get(version_id)?
            .value
            .as_ref()
            .map(|v| v.expose_secret().to_string())
    }

    /// Make the next call to `operation` fail with `error`
    pub fn inject_failure(&self, operation: StoreOperation, error: StoreError) {
        self.failures.lock().insert(operation, error);
    }

    /// Call counters for this store
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    fn take_failure(&self, operation: StoreOperation) -> Option<StoreError> {
        self.failures.lock().remove(&operation)
    }

    fn complete<T>(&self, operation: StoreOperation, result: StoreResult<T>) -> StoreResult<T> {
        self.metrics.record(operation, result.is_ok());
        if let Err(e) = &result {
            tracing::debug!(operation = %operation, error = %e, "Memory store call failed");
        }
        result
    }

    fn describe(&self, secret_id: &SecretId) -> StoreResult<SecretDescription> {
        let secrets = self.secrets.read();
        let secret = secrets
            .get(secret_id)
            .ok_or_else(|| StoreError::not_found(format!("secret {secret_id}")))?;

        let mut description = SecretDescription::new(secret_id.clone(), secret.rotation_enabled);
        description.version_stages = secret
            .versions
            .iter()
            .map(|(version, record)| (version.clone(), record.stages.clone()))
            .collect();
        Ok(description)
    }

    fn read_value(&self, request: &GetSecretValue) -> StoreResult<SecretValue> {
        let secrets = self.secrets.read();
        let secret = secrets
            .get(&request.secret_id)
            .ok_or_else(|| StoreError::not_found(format!("secret {}", request.secret_id)))?;

        let version_id = match (&request.version_id, &request.version_stage) {
            (Some(version), stage) => {
                let record = secret.versions.get(version).ok_or_else(|| {
                    StoreError::not_found(format!("version {version} of {}", request.secret_id))
                })?;
                if let Some(stage) = stage
                    && !record.stages.contains(stage)
                {
                    return Err(StoreError::not_found(format!(
                        "version {version} of {} with stage {stage}",
                        request.secret_id
                    )));
                }
                version.clone()
            }
            (None, stage) => {
                let stage = stage.clone().unwrap_or(Stage::Current);
                secret.holders_of(&stage).into_iter().next().ok_or_else(|| {
                    StoreError::not_found(format!("stage {stage} of {}", request.secret_id))
                })?
            }
        };

        let record = &secret.versions[&version_id];
        let value = record.value.as_ref().ok_or_else(|| {
            StoreError::not_found(format!(
                "value for version {version_id} of {}",
                request.secret_id
            ))
        })?;

        Ok(SecretValue {
            secret_id: request.secret_id.clone(),
            version_id,
            value: SecretString::from(value.expose_secret().to_string()),
            stages: record.stages.clone(),
        })
    }

    fn write_value(&self, request: PutSecretValue) -> StoreResult<()> {
        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(&request.secret_id)
            .ok_or_else(|| StoreError::not_found(format!("secret {}", request.secret_id)))?;

        let token = request.client_request_token;
        if let Some(existing) = secret.versions.get(&token).and_then(|r| r.value.as_ref()) {
            let same: bool = existing
                .expose_secret()
                .as_bytes()
                .ct_eq(request.secret_string.expose_secret().as_bytes())
                .into();
            if !same {
                return Err(StoreError::InvalidRequest {
                    operation: StoreOperation::PutSecretValue,
                    reason: format!("version {token} already exists with a different value"),
                });
            }
        } else {
            let record = secret
                .versions
                .entry(token.clone())
                .or_insert_with(|| VersionRecord {
                    value: None,
                    stages: Vec::new(),
                });
            record.value = Some(request.secret_string);
        }

        let stages = if request.version_stages.is_empty() {
            vec![Stage::Current]
        } else {
            request.version_stages
        };
        for stage in stages {
            secret.attach(&token, stage);
        }
        Ok(())
    }

    fn move_stage(&self, request: &UpdateVersionStage) -> StoreResult<()> {
        let invalid = |reason: String| StoreError::InvalidRequest {
            operation: StoreOperation::UpdateVersionStage,
            reason,
        };

        let mut secrets = self.secrets.write();
        let secret = secrets
            .get_mut(&request.secret_id)
            .ok_or_else(|| StoreError::not_found(format!("secret {}", request.secret_id)))?;
        let stage = &request.version_stage;

        if request.move_to_version_id.is_none() && request.remove_from_version_id.is_none() {
            return Err(invalid(
                "one of move_to or remove_from must be given".to_string(),
            ));
        }

        if let Some(target) = &request.move_to_version_id
            && !secret.versions.contains_key(target)
        {
            return Err(StoreError::not_found(format!(
                "version {target} of {}",
                request.secret_id
            )));
        }

        if let Some(source) = &request.remove_from_version_id {
            let record = secret.versions.get(source).ok_or_else(|| {
                StoreError::not_found(format!("version {source} of {}", request.secret_id))
            })?;
            if !record.stages.contains(stage) {
                return Err(invalid(format!(
                    "stage {stage} is not attached to version {source}"
                )));
            }
        }

        let others: Vec<VersionId> = secret
            .holders_of(stage)
            .into_iter()
            .filter(|v| {
                Some(v) != request.remove_from_version_id.as_ref()
                    && Some(v) != request.move_to_version_id.as_ref()
            })
            .collect();
        if let Some(other) = others.first() {
            return Err(invalid(format!(
                "stage {stage} is attached to version {other}; it must be named as remove_from"
            )));
        }

        if let Some(source) = &request.remove_from_version_id {
            secret.remove_stage(source, stage);
        }
        if let Some(target) = &request.move_to_version_id {
            secret.add_stage(target, stage.clone());
        }
        if *stage == Stage::Current
            && let Some(source) = &request.remove_from_version_id
            && request.move_to_version_id.as_ref() != Some(source)
        {
            secret.demote(source);
        }
        Ok(())
    }
}

fn generate(policy: &PasswordPolicy) -> StoreResult<SecretString> {
    policy
        .validate()
        .map_err(|e| StoreError::InvalidRequest {
            operation: StoreOperation::GetRandomPassword,
            reason: e.to_string(),
        })?;

    let classes = policy.character_classes();
    let pool: Vec<char> = classes.concat();
    let length = policy.length as usize;

    let mut chars: Vec<char> = Vec::with_capacity(length);
    if policy.require_each_included_type {
        for class in &classes {
            chars.push(class[rand::random_range(0..class.len())]);
        }
    }
    while chars.len() < length {
        chars.push(pool[rand::random_range(0..pool.len())]);
    }

    // Fisher-Yates so the required characters are not always up front
    for i in (1..chars.len()).rev() {
        let j = rand::random_range(0..=i);
        chars.swap(i, j);
    }

    Ok(SecretString::from(chars.into_iter().collect::<String>()))
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    #[tracing::instrument(skip(self), fields(store = "memory"))]
    async fn describe_secret(&self, secret_id: &SecretId) -> StoreResult<SecretDescription> {
        let op = StoreOperation::DescribeSecret;
        let result = match self.take_failure(op) {
            Some(e) => Err(e),
            None => self.describe(secret_id),
        };
        self.complete(op, result)
    }

    #[tracing::instrument(skip(self, request), fields(store = "memory", secret_id = %request.secret_id))]
    async fn get_secret_value(&self, request: GetSecretValue) -> StoreResult<SecretValue> {
        let op = StoreOperation::GetSecretValue;
        let result = match self.take_failure(op) {
            Some(e) => Err(e),
            None => self.read_value(&request),
        };
        self.complete(op, result)
    }

    #[tracing::instrument(skip(self, request), fields(store = "memory", secret_id = %request.secret_id))]
    async fn put_secret_value(&self, request: PutSecretValue) -> StoreResult<()> {
        let op = StoreOperation::PutSecretValue;
        let result = match self.take_failure(op) {
            Some(e) => Err(e),
            None => self.write_value(request),
        };
        self.complete(op, result)
    }

    #[tracing::instrument(skip(self, request), fields(store = "memory", secret_id = %request.secret_id))]
    async fn update_version_stage(&self, request: UpdateVersionStage) -> StoreResult<()> {
        let op = StoreOperation::UpdateVersionStage;
        let result = match self.take_failure(op) {
            Some(e) => Err(e),
            None => self.move_stage(&request),
        };
        self.complete(op, result)
    }

    #[tracing::instrument(skip(self, policy), fields(store = "memory"))]
    async fn get_random_password(&self, policy: &PasswordPolicy) -> StoreResult<SecretString> {
        let op = StoreOperation::GetRandomPassword;
        let result = match self.take_failure(op) {
            Some(e) => Err(e),
            None => generate(policy),
        };
        self.complete(op, result)
    }
}
