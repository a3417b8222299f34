//! Shared fixtures for rotation integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use stagehand_rotation::prelude::*;
use std::sync::Arc;

pub const SECRET: &str = "db-pwd";
pub const CURRENT_VALUE: &str = "old123";

pub fn sid() -> SecretId {
    SecretId::new(SECRET).unwrap()
}

pub fn vid(v: &str) -> VersionId {
    VersionId::new(v).unwrap()
}

/// Route rotation logs through the workspace logger; repeated calls are fine
pub fn init_logging() {
    let _ = stagehand_log::init(stagehand_log::Config {
        level: "debug".to_string(),
        colors: false,
        ..stagehand_log::Config::default()
    });
}

/// `db-pwd`: rotation enabled, `v1` = "old123" staged CURRENT
pub fn seeded_store() -> Arc<MemorySecretStore> {
    init_logging();
    let store = MemorySecretStore::new();
    store.insert_secret(sid(), true);
    store
        .put_version(&sid(), vid("v1"), CURRENT_VALUE, vec![Stage::Current])
        .unwrap();
    Arc::new(store)
}

/// [`seeded_store`] plus a value-less `v2` staged PENDING, as the store
/// leaves it when a rotation starts
pub fn rotating_store() -> Arc<MemorySecretStore> {
    let store = seeded_store();
    store.begin_rotation(&sid(), vid("v2")).unwrap();
    store
}

/// Target that records the pending values it was asked to apply and test
#[derive(Default)]
pub struct RecordingTarget {
    pub applied: Mutex<Vec<String>>,
    pub tested: Mutex<Vec<String>>,
    pub reject_test: bool,
}

impl RecordingTarget {
    pub fn rejecting() -> Self {
        Self {
            reject_test: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CredentialTarget for RecordingTarget {
    async fn set_secret(
        &self,
        store: &dyn SecretStore,
        secret_id: &SecretId,
        token: &VersionId,
    ) -> RotationResult<()> {
        let pending = fetch_pending(store, secret_id, token).await?;
        let mut applied = self.applied.lock();
        if !applied.iter().any(|v| v == pending.expose()) {
            applied.push(pending.expose().to_string());
        }
        Ok(())
    }

    async fn test_secret(
        &self,
        store: &dyn SecretStore,
        secret_id: &SecretId,
        token: &VersionId,
    ) -> RotationResult<()> {
        let pending = fetch_pending(store, secret_id, token).await?;
        self.tested.lock().push(pending.expose().to_string());

        let accepted = self.applied.lock().iter().any(|v| v == pending.expose());
        if self.reject_test || !accepted {
            return Err(RotationError::TargetFailed {
                step: "testSecret",
                secret_id: secret_id.clone(),
                reason: "login with pending value refused".to_string(),
            });
        }
        Ok(())
    }
}
