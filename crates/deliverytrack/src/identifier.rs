//! Delivery identifiers.
//!
//! Identifiers are minted without coordination as `<prefix>-<millis>-<random>`.
//! Uniqueness is enforced by the store's primary key; on a collision the
//! store simply asks the generator for another one.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::IdentifierConfig;
use crate::error::{Error, Result};

/// Default identifier prefix.
pub const DEFAULT_PREFIX: &str = "DEL";

/// Default exclusive upper bound of the random component.
pub const DEFAULT_RANDOM_BOUND: u32 = 1000;

/// Longest accepted identifier prefix.
pub const MAX_PREFIX_LEN: usize = 32;

/// Why `prefix` cannot start a generated identifier, if it cannot.
///
/// Prefixes are limited to `[A-Za-z0-9_-]` so every generated identifier
/// passes [`DeliveryId::parse`].
pub(crate) fn prefix_problem(prefix: &str) -> Option<&'static str> {
    if prefix.is_empty() {
        Some("must not be empty")
    } else if prefix.len() > MAX_PREFIX_LEN {
        Some("is longer than 32 characters")
    } else if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Some("may only contain [A-Za-z0-9_-]")
    } else {
        None
    }
}

/// Opaque identifier of a delivery record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeliveryId(String);

impl DeliveryId {
    /// Maximum accepted identifier length.
    pub const MAX_LEN: usize = 128;

    /// Validate an identifier supplied from outside (scan, link, manual entry).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the value is empty, too long,
    /// or contains whitespace or URL delimiters.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let reason = if value.is_empty() {
            Some("must not be empty")
        } else if value.len() > Self::MAX_LEN {
            Some("is too long")
        } else if value.chars().any(char::is_whitespace) {
            Some("contains whitespace")
        } else if value.contains(|c| matches!(c, '/' | '?' | '#')) {
            Some("contains a URL delimiter")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidIdentifier { value, reason }),
            None => Ok(Self(value)),
        }
    }

    /// Wrap an identifier read back from storage.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeliveryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeliveryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeliveryId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<DeliveryId> for String {
    fn from(id: DeliveryId) -> Self {
        id.0
    }
}

/// Source of fresh delivery identifiers.
///
/// Implementations need not guarantee uniqueness; the store detects
/// collisions and asks again.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Produce a candidate identifier.
    fn generate(&self) -> DeliveryId;
}

/// Generates `<prefix>-<unix millis>-<random>` identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampIdGenerator {
    prefix: String,
    random_bound: u32,
}

impl TimestampIdGenerator {
    /// Create a generator with the given prefix and random bound.
    ///
    /// A zero bound is treated as one (the random component is always `0`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the prefix is empty, longer
    /// than [`MAX_PREFIX_LEN`], or contains anything outside `[A-Za-z0-9_-]`.
    pub fn new(prefix: impl Into<String>, random_bound: u32) -> Result<Self> {
        let prefix = prefix.into();
        if let Some(reason) = prefix_problem(&prefix) {
            return Err(Error::InvalidIdentifier {
                value: prefix,
                reason,
            });
        }
        Ok(Self {
            prefix,
            random_bound: random_bound.max(1),
        })
    }

    /// Create a generator from the identifier configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] if the configured prefix is illegal.
    pub fn from_config(config: &IdentifierConfig) -> Result<Self> {
        Self::new(config.prefix.clone(), config.random_bound)
    }

    /// The configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for TimestampIdGenerator {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            random_bound: DEFAULT_RANDOM_BOUND,
        }
    }
}

impl IdGenerator for TimestampIdGenerator {
    fn generate(&self) -> DeliveryId {
        let millis = Utc::now().timestamp_millis();
        let random = rand::thread_rng().gen_range(0..self.random_bound);
        DeliveryId(format!("{}-{millis}-{random}", self.prefix))
    }
}
