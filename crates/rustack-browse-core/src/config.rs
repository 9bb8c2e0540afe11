//! Browse server configuration.
//!
//! Provides [`BrowseConfig`]. Values are loaded from environment variables;
//! storage-related settings follow the AWS SDK variable names.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use typed_builder::TypedBuilder;

use crate::utils::parse_duration;

/// Default listing cache time-to-live.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(60 * 60);

/// Default minimum gap between two background cache sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Browse server configuration.
///
/// # Examples
///
/// ```
/// use rustack_browse_core::config::BrowseConfig;
///
/// let config = BrowseConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:1323");
/// assert_eq!(config.cache_duration.as_secs(), 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BrowseConfig {
    /// Bind address (e.g. `"0.0.0.0:1323"`).
    #[builder(default = String::from("0.0.0.0:1323"))]
    pub listen: String,

    /// Title shown on every page.
    #[builder(default = String::from("rustack-browse"))]
    pub site_name: String,

    /// How long a listing stays cached.
    #[builder(default = DEFAULT_CACHE_DURATION)]
    pub cache_duration: Duration,

    /// Minimum gap between two background sweeps of expired entries.
    #[builder(default = DEFAULT_SWEEP_INTERVAL)]
    pub sweep_interval: Duration,

    /// Storage region; the SDK provider chain decides when unset.
    #[builder(default)]
    pub aws_region: Option<String>,

    /// Shared-config profile name.
    #[builder(default)]
    pub aws_profile: Option<String>,

    /// Storage endpoint override for emulators and non-AWS stores.
    #[builder(default)]
    pub aws_endpoint: Option<String>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable text.
    #[builder(default = false)]
    pub log_json: bool,
}

/// An environment value that could not be parsed; the default was kept instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSetting {
    /// Variable name.
    pub name: &'static str,
    /// The ignored value.
    pub value: String,
}

impl RejectedSetting {
    /// Emit a warning naming the variable and the ignored value.
    pub fn log(&self) {
        warn!(variable = self.name, value = %self.value, "ignoring invalid configuration value");
    }
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BrowseConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BROWSE_LISTEN` | `0.0.0.0:1323` |
    /// | `BROWSE_SITE_NAME` | `rustack-browse` |
    /// | `BROWSE_CACHE_DURATION` | `60m` |
    /// | `BROWSE_SWEEP_INTERVAL` | `60s` |
    /// | `AWS_REGION` | *(unset)* |
    /// | `AWS_PROFILE` | *(unset)* |
    /// | `AWS_ENDPOINT` | *(unset)* |
    /// | `LOG_LEVEL` | `info` |
    /// | `LOG_FORMAT` | `text` |
    ///
    /// Durations accept `90s`, `15m`, `1h30m`, or bare seconds. Unparseable
    /// durations are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup, logging rejected values.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let (config, rejected) = Self::parse_lookup(lookup);
        for setting in &rejected {
            setting.log();
        }
        config
    }

    /// Like [`BrowseConfig::from_env`], but hands back rejected values instead of logging them.
    ///
    /// Use this when the log subscriber depends on the configuration itself.
    #[must_use]
    pub fn parse_env() -> (Self, Vec<RejectedSetting>) {
        Self::parse_lookup(|name| std::env::var(name).ok())
    }

    /// Parse configuration through `lookup`, collecting values that were ignored.
    #[must_use]
    pub fn parse_lookup(lookup: impl Fn(&str) -> Option<String>) -> (Self, Vec<RejectedSetting>) {
        let mut config = Self::default();
        let mut rejected = Vec::new();

        let mut duration = |name: &'static str, target: &mut Duration| {
            if let Some(v) = lookup(name) {
                match parse_duration(&v) {
                    Some(d) => *target = d,
                    None => rejected.push(RejectedSetting { name, value: v }),
                }
            }
        };
        duration("BROWSE_CACHE_DURATION", &mut config.cache_duration);
        duration("BROWSE_SWEEP_INTERVAL", &mut config.sweep_interval);

        if let Some(v) = lookup("BROWSE_LISTEN") {
            config.listen = v;
        }
        if let Some(v) = lookup("BROWSE_SITE_NAME").filter(|v| !v.is_empty()) {
            config.site_name = v;
        }
        config.aws_region = lookup("AWS_REGION").filter(|v| !v.is_empty());
        config.aws_profile = lookup("AWS_PROFILE").filter(|v| !v.is_empty());
        config.aws_endpoint = lookup("AWS_ENDPOINT").filter(|v| !v.is_empty());
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            config.log_json = v.eq_ignore_ascii_case("json");
        }

        (config, rejected)
    }

    /// The storage endpoint with a scheme, defaulting to `http://`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rustack_browse_core::config::BrowseConfig;
    ///
    /// let config = BrowseConfig::builder()
    ///     .aws_endpoint(Some("localhost:4566".into()))
    ///     .build();
    /// assert_eq!(config.endpoint_url().as_deref(), Some("http://localhost:4566"));
    /// ```
    #[must_use]
    pub fn endpoint_url(&self) -> Option<String> {
        self.aws_endpoint.as_ref().map(|endpoint| {
            if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.clone()
            } else {
                format!("http://{endpoint}")
            }
        })
    }
}
