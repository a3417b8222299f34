//! Rotation step dispatcher
//!
//! Entry point for one invocation: validate identifiers, run the staging gate,
//! then route to exactly one step. The handler keeps no state between
//! invocations and never retries; each step is idempotent on its own.

use std::sync::Arc;

use super::create::{CreateOutcome, create_secret};
use super::error::{RotationError, RotationResult};
use super::finish::{FinishOutcome, finish_secret};
use super::step::{RotationEvent, RotationInvocation, RotationStep};
use super::target::CredentialTarget;
use super::validator::check_staging;
use crate::config::RotationConfig;
use crate::store::SecretStore;

/// What a successful invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// createSecret finished
    Created(CreateOutcome),
    /// setSecret finished
    Set,
    /// testSecret finished
    Tested,
    /// finishSecret finished
    Finished(FinishOutcome),
}

/// Dispatches rotation invocations against one store and one target
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use stagehand_rotation::{RotationEvent, RotationHandler, UnimplementedTarget};
/// use stagehand_rotation::store::MemorySecretStore;
///
/// # async fn run() -> Result<(), stagehand_rotation::RotationError> {
/// let store = Arc::new(MemorySecretStore::new());
/// let handler = RotationHandler::new(store, UnimplementedTarget);
///
/// handler
///     .handle(RotationEvent::new("db-pwd", "v2", "createSecret"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct RotationHandler<S, T> {
    store: Arc<S>,
    target: T,
    config: RotationConfig,
}

impl<S, T> std::fmt::Debug for RotationHandler<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationHandler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S, T> RotationHandler<S, T>
where
    S: SecretStore,
    T: CredentialTarget,
{
    /// Create a handler with the default configuration
    pub fn new(store: Arc<S>, target: T) -> Self {
        Self {
            store,
            target,
            config: RotationConfig::default(),
        }
    }

    /// Replace the configuration after validating it
    pub fn with_config(mut self, config: RotationConfig) -> RotationResult<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The store this handler talks to
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Target that runs setSecret and testSecret
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Active configuration
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Handle an event as delivered by the transport
    pub async fn handle(&self, event: RotationEvent) -> RotationResult<StepOutcome> {
        match event.into_invocation() {
            Ok(invocation) => self.dispatch(&invocation).await,
            Err(e) => Err(log_rejected(e)),
        }
    }

    /// Handle a raw JSON payload
    pub async fn handle_json(&self, payload: &str) -> RotationResult<StepOutcome> {
        match serde_json::from_str::<RotationEvent>(payload) {
            Ok(event) => self.handle(event).await,
            Err(e) => Err(log_rejected(e.into())),
        }
    }

    /// Run the staging gate, then exactly one step
    ///
    /// The outcome is logged once, whether the gate, the step name or the
    /// step itself decided it.
    #[tracing::instrument(
        skip_all,
        fields(secret_id = %invocation.secret_id, version = %invocation.token, step = %invocation.step)
    )]
    pub async fn dispatch(&self, invocation: &RotationInvocation) -> RotationResult<StepOutcome> {
        let outcome = self.run(invocation).await;
        match &outcome {
            Ok(result) => tracing::info!(outcome = ?result, "Rotation step completed"),
            Err(e) => tracing::error!(error = %e, "Rotation step failed"),
        }
        outcome
    }

    async fn run(&self, invocation: &RotationInvocation) -> RotationResult<StepOutcome> {
        let RotationInvocation {
            secret_id,
            token,
            step,
        } = invocation;
        let store = self.store.as_ref();

        check_staging(store, secret_id, token).await?;

        let step: RotationStep = step.parse()?;
        tracing::debug!("Dispatching rotation step");

        match step {
            RotationStep::CreateSecret => {
                create_secret(store, &self.config.password, secret_id, token)
                    .await
                    .map(StepOutcome::Created)
            }
            RotationStep::SetSecret => self
                .target
                .set_secret(store, secret_id, token)
                .await
                .map(|()| StepOutcome::Set),
            RotationStep::TestSecret => self
                .target
                .test_secret(store, secret_id, token)
                .await
                .map(|()| StepOutcome::Tested),
            RotationStep::FinishSecret => finish_secret(store, secret_id, token)
                .await
                .map(StepOutcome::Finished),
        }
    }
}

fn log_rejected(error: RotationError) -> RotationError {
    tracing::error!(error = %error, "Rotation step failed");
    error
}
