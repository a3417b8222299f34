//! Secret descriptions and values as returned by the store

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::id::{SecretId, VersionId};
use super::stage::Stage;

/// Metadata view of a secret: rotation flag plus the version → stages map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDescription {
    /// Secret being described
    pub secret_id: SecretId,

    /// Whether rotation has been turned on for this secret
    pub rotation_enabled: bool,

    /// Staging labels per version. Versions without labels may still appear
    /// with an empty list.
    pub version_stages: HashMap<VersionId, Vec<Stage>>,
}

impl SecretDescription {
    /// Create a description with no versions
    pub fn new(secret_id: SecretId, rotation_enabled: bool) -> Self {
        Self {
            secret_id,
            rotation_enabled,
            version_stages: HashMap::new(),
        }
    }

    /// Stages attached to `version`, or `None` if the version is unknown
    pub fn stages_of(&self, version: &VersionId) -> Option<&[Stage]> {
        self.version_stages.get(version).map(Vec::as_slice)
    }

    /// Whether `version` currently carries `stage`
    pub fn has_stage(&self, version: &VersionId, stage: &Stage) -> bool {
        self.stages_of(version)
            .is_some_and(|stages| stages.contains(stage))
    }

    /// All versions carrying `stage`, sorted for stable reporting
    pub fn versions_with(&self, stage: &Stage) -> Vec<&VersionId> {
        let mut versions: Vec<&VersionId> = self
            .version_stages
            .iter()
            .filter(|(_, stages)| stages.contains(stage))
            .map(|(version, _)| version)
            .collect();
        versions.sort();
        versions
    }
}

/// A secret value read from the store
///
/// The value is held as a [`SecretString`] and never appears in `Debug`
/// output.
pub struct SecretValue {
    /// Secret the value belongs to
    pub secret_id: SecretId,

    /// Version holding the value
    pub version_id: VersionId,

    /// The secret material
    pub value: SecretString,

    /// Stages on the version at read time
    pub stages: Vec<Stage>,
}

impl SecretValue {
    /// Expose the raw value (use with caution)
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("secret_id", &self.secret_id)
            .field("version_id", &self.version_id)
            .field("value", &"[REDACTED]")
            .field("stages", &self.stages)
            .finish()
    }
}
