//! Rotation steps and the invocation record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{RotationError, RotationResult};
use crate::core::{SecretId, VersionId};

/// One phase of the four-step choreography
///
/// The scheduler invokes them strictly in declaration order for a given
/// rotation attempt, and only after the previous step succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationStep {
    /// Store a fresh value on the token, staged PENDING
    CreateSecret,
    /// Apply the PENDING value to the protected system
    SetSecret,
    /// Prove the PENDING value works against the protected system
    TestSecret,
    /// Promote the token to CURRENT
    FinishSecret,
}

impl RotationStep {
    /// All steps in invocation order
    pub const ALL: [Self; 4] = [
        Self::CreateSecret,
        Self::SetSecret,
        Self::TestSecret,
        Self::FinishSecret,
    ];

    /// Wire name of the step
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateSecret => "createSecret",
            Self::SetSecret => "setSecret",
            Self::TestSecret => "testSecret",
            Self::FinishSecret => "finishSecret",
        }
    }
}

impl fmt::Display for RotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationStep {
    type Err = RotationError;

    /// Exact, case-sensitive match on the wire name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| RotationError::InvalidStep { step: s.to_string() })
    }
}

/// Event delivered by the invocation transport
///
/// Field names follow the transport's JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationEvent {
    /// Version token to promote
    #[serde(rename = "ClientRequestToken")]
    pub client_request_token: String,

    /// Secret being rotated
    #[serde(rename = "SecretId")]
    pub secret_id: String,

    /// Step name; only checked after the staging gate passes
    #[serde(rename = "Step")]
    pub step: String,
}

impl RotationEvent {
    /// Build an event from its three parts
    pub fn new(
        secret_id: impl Into<String>,
        client_request_token: impl Into<String>,
        step: impl Into<String>,
    ) -> Self {
        Self {
            client_request_token: client_request_token.into(),
            secret_id: secret_id.into(),
            step: step.into(),
        }
    }

    /// Validate identifiers
    pub fn into_invocation(self) -> RotationResult<RotationInvocation> {
        Ok(RotationInvocation {
            secret_id: SecretId::new(self.secret_id)?,
            token: VersionId::new(self.client_request_token)?,
            step: self.step,
        })
    }
}

/// A transient, validated invocation: (SecretId, VersionToken, Step)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationInvocation {
    pub secret_id: SecretId,
    pub token: VersionId,
    /// Raw step name, parsed after the staging gate
    pub step: String,
}
