#![forbid(unsafe_code)]

//! Collection configuration.
//!
//! Defaults suit almost every caller. Environment overrides exist for
//! diagnosing reentrancy problems in a running application without a
//! rebuild:
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `FTUI_COLLECTION_REENTRANCY` | `single-listener`, `strict` | `single-listener` |
//! | `FTUI_COLLECTION_CAPACITY` | unsigned integer | `0` |
//!
//! Malformed values never abort: they are reported as
//! [`CollectionConfigError`] diagnostics and the default is kept.

use std::env;
use std::fmt;

use crate::guard::ReentrancyPolicy;

pub const ENV_COLLECTION_REENTRANCY: &str = "FTUI_COLLECTION_REENTRANCY";
pub const ENV_COLLECTION_CAPACITY: &str = "FTUI_COLLECTION_CAPACITY";

/// Configuration for an [`ObservableVec`](crate::ObservableVec).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionConfig {
    /// How mutations from inside a change listener are treated.
    pub reentrancy_policy: ReentrancyPolicy,
    /// Capacity reserved for the backing storage at construction.
    pub initial_capacity: usize,
}

impl CollectionConfig {
    #[must_use]
    pub fn with_reentrancy_policy(mut self, policy: ReentrancyPolicy) -> Self {
        self.reentrancy_policy = policy;
        self
    }

    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> CollectionConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config using `get` as the variable lookup.
    pub fn from_env_with<F>(mut get: F) -> CollectionConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_COLLECTION_REENTRANCY) {
            match ReentrancyPolicy::parse(&value) {
                Some(policy) => config.reentrancy_policy = policy,
                None => errors.push(CollectionConfigError::new(
                    "reentrancy_policy",
                    value,
                    "expected single-listener|strict",
                )),
            }
        }

        if let Some(value) = get(ENV_COLLECTION_CAPACITY) {
            match value.trim().parse::<usize>() {
                Ok(capacity) => config.initial_capacity = capacity,
                Err(_) => errors.push(CollectionConfigError::new(
                    "initial_capacity",
                    value,
                    "expected unsigned integer",
                )),
            }
        }

        CollectionConfigParse { config, errors }
    }
}

/// Result of parsing configuration: the config plus any rejected values.
#[derive(Debug, Clone)]
pub struct CollectionConfigParse {
    pub config: CollectionConfig,
    pub errors: Vec<CollectionConfigError>,
}

/// A rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl CollectionConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CollectionConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for CollectionConfigError {}
