//! Staging labels attached to secret versions

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Wire label of the active version
pub const CURRENT_LABEL: &str = "AWSCURRENT";
/// Wire label of the candidate version being rotated in
pub const PENDING_LABEL: &str = "AWSPENDING";
/// Wire label of the version demoted by the last promotion
pub const PREVIOUS_LABEL: &str = "AWSPREVIOUS";

/// A staging label on a secret version
///
/// The store guarantees exactly one version carries [`Stage::Current`] at any
/// consistent point in time. At most one version carries [`Stage::Pending`].
/// Any other label is kept verbatim as [`Stage::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Stage {
    /// Active, in-use value
    Current,
    /// Candidate value being rotated in
    Pending,
    /// Value demoted by the most recent promotion
    Previous,
    /// Caller-defined label
    Custom(String),
}

impl Stage {
    /// Returns the label as it appears on the wire
    pub fn as_str(&self) -> &str {
        match self {
            Self::Current => CURRENT_LABEL,
            Self::Pending => PENDING_LABEL,
            Self::Previous => PREVIOUS_LABEL,
            Self::Custom(label) => label,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            CURRENT_LABEL => Self::Current,
            PENDING_LABEL => Self::Pending,
            PREVIOUS_LABEL => Self::Previous,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl From<String> for Stage {
    fn from(s: String) -> Self {
        match s.as_str() {
            CURRENT_LABEL => Self::Current,
            PENDING_LABEL => Self::Pending,
            PREVIOUS_LABEL => Self::Previous,
            _ => Self::Custom(s),
        }
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Custom(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels_parse() {
        assert_eq!("AWSCURRENT".parse::<Stage>().unwrap(), Stage::Current);
        assert_eq!("AWSPENDING".parse::<Stage>().unwrap(), Stage::Pending);
        assert_eq!("AWSPREVIOUS".parse::<Stage>().unwrap(), Stage::Previous);
    }

    #[test]
    fn test_custom_label_is_kept_verbatim() {
        let stage: Stage = "blue-green".parse().unwrap();
        assert_eq!(stage, Stage::Custom("blue-green".into()));
        assert_eq!(stage.to_string(), "blue-green");
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let stage: Stage = "awscurrent".parse().unwrap();
        assert_ne!(stage, Stage::Current);
    }

    #[test]
    fn test_serde_uses_wire_labels() {
        let json = serde_json::to_string(&vec![Stage::Current, Stage::Custom("x".into())]).unwrap();
        assert_eq!(json, r#"["AWSCURRENT","x"]"#);

        let back: Vec<Stage> = serde_json::from_str(r#"["AWSPENDING"]"#).unwrap();
        assert_eq!(back, vec![Stage::Pending]);
    }
}
