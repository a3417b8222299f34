//! Rotation configuration and validation
//!
//! [`RotationConfig`] is deserialisable, has sensible defaults and must pass
//! [`RotationConfig::validate`] before a handler accepts it.

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`PasswordPolicy::length`]
pub const ENV_PASSWORD_LENGTH: &str = "STAGEHAND_PASSWORD_LENGTH";
/// Environment variable setting [`PasswordPolicy::exclude_characters`]
pub const ENV_EXCLUDE_CHARACTERS: &str = "STAGEHAND_EXCLUDE_CHARACTERS";

/// Characters that break connection strings, shells or quoting in downstream
/// protocols. Never generated, whatever the policy says.
pub const DEFAULT_EXCLUDE_CHARACTERS: &str = "/@'\"\\";

const MAX_PASSWORD_LENGTH: u32 = 4096;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Parameters for the store's random-value generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    /// Number of characters to generate
    pub length: u32,

    /// Extra characters to leave out, on top of [`DEFAULT_EXCLUDE_CHARACTERS`]
    pub exclude_characters: String,

    /// Leave out `0-9`
    pub exclude_numbers: bool,

    /// Leave out ASCII punctuation
    pub exclude_punctuation: bool,

    /// Leave out `A-Z`
    pub exclude_uppercase: bool,

    /// Leave out `a-z`
    pub exclude_lowercase: bool,

    /// Allow the space character
    pub include_space: bool,

    /// Require at least one character from every enabled class
    pub require_each_included_type: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            length: 32,
            exclude_characters: String::new(),
            exclude_numbers: false,
            exclude_punctuation: false,
            exclude_uppercase: false,
            exclude_lowercase: false,
            include_space: false,
            require_each_included_type: true,
        }
    }
}

impl PasswordPolicy {
    /// Enabled character classes with excluded characters already removed.
    ///
    /// Classes that end up empty are dropped.
    pub fn character_classes(&self) -> Vec<Vec<char>> {
        let mut classes: Vec<Vec<char>> = Vec::with_capacity(5);
        if !self.exclude_lowercase {
            classes.push(('a'..='z').collect());
        }
        if !self.exclude_uppercase {
            classes.push(('A'..='Z').collect());
        }
        if !self.exclude_numbers {
            classes.push(('0'..='9').collect());
        }
        if !self.exclude_punctuation {
            classes.push(('!'..='~').filter(char::is_ascii_punctuation).collect());
        }
        if self.include_space {
            classes.push(vec![' ']);
        }

        classes
            .into_iter()
            .map(|class| {
                class
                    .into_iter()
                    .filter(|c| !self.is_excluded(*c))
                    .collect::<Vec<char>>()
            })
            .filter(|class| !class.is_empty())
            .collect()
    }

    /// Whether `c` may never appear in a generated value
    pub fn is_excluded(&self, c: char) -> bool {
        DEFAULT_EXCLUDE_CHARACTERS.contains(c) || self.exclude_characters.contains(c)
    }

    /// Check the policy can actually produce a value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.length == 0 || self.length > MAX_PASSWORD_LENGTH {
            return Err(ConfigError::InvalidValue {
                field: "password.length".into(),
                reason: format!(
                    "must be between 1 and {MAX_PASSWORD_LENGTH}, got {}",
                    self.length
                ),
            });
        }

        let classes = self.character_classes();
        if classes.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "password.exclude_characters".into(),
                reason: "no characters left to generate from".into(),
            });
        }

        if self.require_each_included_type && (self.length as usize) < classes.len() {
            return Err(ConfigError::InvalidValue {
                field: "password.length".into(),
                reason: format!(
                    "must be at least {} to include every character class",
                    classes.len()
                ),
            });
        }

        Ok(())
    }
}

/// Configuration for [`crate::RotationHandler`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Policy used when createSecret asks the store for a fresh value
    pub password: PasswordPolicy,
}

impl RotationConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_PASSWORD_LENGTH) {
            config.password.length =
                raw.trim()
                    .parse()
                    .map_err(|e| ConfigError::InvalidValue {
                        field: ENV_PASSWORD_LENGTH.into(),
                        reason: format!("'{raw}' is not a length: {e}"),
                    })?;
        }

        if let Some(exclude) = lookup(ENV_EXCLUDE_CHARACTERS) {
            config.password.exclude_characters = exclude;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.password.validate()
    }
}
