//! Secret rotation state machine
//!
//! - [`check_staging`] - the mandatory gate run on every invocation
//! - [`create_secret`] / [`finish_secret`] - the generic steps
//! - [`CredentialTarget`] - the pluggable setSecret / testSecret steps
//! - [`RotationHandler`] - routes an invocation to exactly one step

mod create;
mod error;
mod finish;
mod handler;
mod step;
mod target;
mod validator;

pub use create::{CreateOutcome, create_secret};
pub use error::{RotationError, RotationResult};
pub use finish::{FinishOutcome, finish_secret};
pub use handler::{RotationHandler, StepOutcome};
pub use step::{RotationEvent, RotationInvocation, RotationStep};
pub use target::{CredentialTarget, UnimplementedTarget, fetch_pending};
pub use validator::check_staging;
