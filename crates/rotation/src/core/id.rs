//! Secret and version identifiers with validation
//!
//! Both identifiers are opaque to the rotation core: a [`SecretId`] is an ARN
//! or friendly name handed over by the scheduler, a [`VersionId`] is the client
//! request token the store uses as its idempotency key. Validation only rejects
//! values no store would accept, so malformed invocations fail before any
//! remote call is made.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length for secret identifiers (full ARNs fit comfortably)
const MAX_SECRET_ID_LENGTH: usize = 2048;

/// Maximum length for version tokens
const MAX_VERSION_ID_LENGTH: usize = 64;

/// Identifier validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// Identifier was empty
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    /// Identifier was present but unusable
    #[error("invalid {kind} '{id}': {reason}")]
    Invalid {
        kind: &'static str,
        id: String,
        reason: String,
    },
}

fn check(kind: &'static str, id: &str, max_len: usize, allow_spaces: bool) -> Result<(), IdError> {
    if id.is_empty() {
        return Err(IdError::Empty { kind });
    }

    if id.chars().count() > max_len {
        return Err(IdError::Invalid {
            kind,
            id: id.to_string(),
            reason: format!("exceeds maximum length of {max_len} characters"),
        });
    }

    if let Some(bad) = id
        .chars()
        .find(|c| c.is_control() || (!allow_spaces && c.is_whitespace()))
    {
        return Err(IdError::Invalid {
            kind,
            id: id.to_string(),
            reason: format!("contains disallowed character {bad:?}"),
        });
    }

    Ok(())
}

/// Identifier of a secret in the store (ARN or name)
///
/// # Examples
///
/// ```
/// use stagehand_rotation::SecretId;
///
/// let id = SecretId::new("arn:aws:secretsmanager:us-east-1:123456789012:secret:db-pwd")?;
/// assert!(id.as_str().ends_with("db-pwd"));
///
/// assert!(SecretId::new("").is_err());
/// # Ok::<(), stagehand_rotation::IdError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretId(String);

impl SecretId {
    /// Creates a validated secret identifier
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        check("secret id", &id, MAX_SECRET_ID_LENGTH, true)?;
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SecretId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SecretId> for String {
    fn from(id: SecretId) -> Self {
        id.0
    }
}

impl TryFrom<String> for SecretId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for SecretId {
    type Error = IdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

/// Identifier of one version of a secret
///
/// During rotation this is the client request token chosen by the scheduler;
/// the rotation core never generates one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionId(String);

impl VersionId {
    /// Creates a validated version identifier
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        check("version id", &id, MAX_VERSION_ID_LENGTH, false)?;
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VersionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<VersionId> for String {
    fn from(id: VersionId) -> Self {
        id.0
    }
}

impl TryFrom<String> for VersionId {
    type Error = IdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for VersionId {
    type Error = IdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_secret_ids() {
        assert!(SecretId::new("db-pwd").is_ok());
        assert!(SecretId::new("prod/app/db password").is_ok());
        assert!(SecretId::new("arn:aws:secretsmanager:eu-west-1:000000000000:secret:x-AbCdEf").is_ok());
    }

    #[test]
    fn test_invalid_secret_ids() {
        assert_eq!(
            SecretId::new(""),
            Err(IdError::Empty { kind: "secret id" })
        );
        assert!(matches!(
            SecretId::new("line\nbreak"),
            Err(IdError::Invalid { .. })
        ));

        let too_long = "s".repeat(2049);
        let result = SecretId::new(too_long);
        if let Err(IdError::Invalid { reason, .. }) = result {
            assert!(reason.contains("2048"));
        } else {
            panic!("expected length violation");
        }

        assert!(SecretId::new("s".repeat(2048)).is_ok());
    }

    #[test]
    fn test_version_id_rules() {
        assert!(VersionId::new("v2").is_ok());
        assert!(VersionId::new("EXAMPLE1-90ab-cdef-fedc-ba987SECRET1").is_ok());
        assert!(VersionId::new("v 2").is_err());
        assert!(VersionId::new("v".repeat(65)).is_err());
        assert!(VersionId::new("v".repeat(64)).is_ok());
    }

    #[test]
    fn test_serde_round_trip_as_plain_string() {
        let id = VersionId::new("v2").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"v2\"");

        let bad: Result<VersionId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
