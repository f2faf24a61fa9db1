//! Run configuration
//!
//! An `Options` value is immutable once constructed and parametrizes one run:
//! which client implementation to build (`client_impl` is a key into the
//! registry's client-implementation map), where downloads land, and the
//! retry/failure/concurrency policy of the executor.

use crate::dir_rule::DirRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What to do when an image (or, one level up, a photo) keeps failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailPolicy {
    /// Abort the whole run
    Abort,
    /// Skip the failing image, record it, continue
    #[default]
    SkipImage,
    /// Skip the rest of the owning photo, record it, continue
    SkipPhoto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    /// Key into the client-implementation map.
    #[serde(default = "default_client_impl")]
    pub client_impl: String,

    /// Base locator the client derives entity locators from.
    #[serde(default)]
    pub base_locator: String,

    /// Directory-rule template for download paths.
    #[serde(default)]
    pub dir_rule: DirRule,

    /// Bound on concurrent image downloads within one photo.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempts per image before the failure policy applies.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// First backoff delay; doubles per attempt, capped at 5s.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default)]
    pub fail_policy: FailPolicy,

    /// How long in-flight image tasks may run after cancellation.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Free-form options handed to the client factory.
    #[serde(default)]
    pub client_extras: BTreeMap<String, String>,
}

fn default_client_impl() -> String {
    "api".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_retries() -> usize {
    3
}

fn default_backoff_base_ms() -> u64 {
    200
}

fn default_grace_period_ms() -> u64 {
    2000
}

impl Default for Options {
    fn default() -> Self {
        Self {
            client_impl: default_client_impl(),
            base_locator: String::new(),
            dir_rule: DirRule::default(),
            workers: default_workers(),
            retries: default_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            fail_policy: FailPolicy::default(),
            grace_period_ms: default_grace_period_ms(),
            client_extras: BTreeMap::new(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_impl(mut self, key: impl Into<String>) -> Self {
        self.client_impl = key.into();
        self
    }

    pub fn with_base_locator(mut self, locator: impl Into<String>) -> Self {
        self.base_locator = locator.into();
        self
    }

    pub fn with_dir_rule(mut self, dir_rule: DirRule) -> Self {
        self.dir_rule = dir_rule;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries.max(1);
        self
    }

    pub fn with_backoff_base_ms(mut self, ms: u64) -> Self {
        self.backoff_base_ms = ms;
        self
    }

    pub fn with_fail_policy(mut self, policy: FailPolicy) -> Self {
        self.fail_policy = policy;
        self
    }

    pub fn with_grace_period_ms(mut self, ms: u64) -> Self {
        self.grace_period_ms = ms;
        self
    }

    pub fn with_client_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.client_extras.insert(key.into(), value.into());
        self
    }

    /// Apply environment overrides.
    ///
    /// Supported: ALBUMFETCH_CLIENT_IMPL, ALBUMFETCH_WORKERS,
    /// ALBUMFETCH_RETRIES.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(key) = std::env::var("ALBUMFETCH_CLIENT_IMPL") {
            options.client_impl = key;
        }
        if let Ok(workers) = std::env::var("ALBUMFETCH_WORKERS") {
            if let Ok(workers) = workers.parse() {
                options.workers = workers;
            }
        }
        if let Ok(retries) = std::env::var("ALBUMFETCH_RETRIES") {
            if let Ok(retries) = retries.parse() {
                options.retries = retries;
            }
        }
        options
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
