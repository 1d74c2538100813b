//! Registry configuration: where the remote store lives, which organization
//! to act under, and how logical profiles map onto physical datasets and
//! query services. Loaded from and saved to JSON on disk.

use crate::errors::ValidationError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufReader, Write};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Bounded fixed-interval polling: `max_attempts` polls spaced `interval`
/// apart. Exposed as configuration so tests can shrink the interval and
/// callers can widen the budget without touching the wait loops.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub max_attempts: u32,
    #[serde(with = "duration_secs")]
    pub interval: Duration,
}

impl PollPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Default budget for waiting on a query service to reach "running".
    pub const fn service_sync() -> Self {
        Self::new(12, Duration::from_secs(5))
    }

    /// Default budget for waiting on an upload job to finish.
    pub const fn job_completion() -> Self {
        Self::new(6, Duration::from_secs(10))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// Physical addressing for one logical profile: the dataset that holds its
/// graphs and the query service that must be kept in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMapping {
    pub dataset: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry API, e.g. `https://api.store.example/`.
    pub base_url: Url,
    /// Bearer token; absent for anonymous access against test registries.
    #[serde(default)]
    pub token: Option<String>,
    pub org: String,
    /// Logical profile identifier -> physical dataset/service pair.
    #[serde(default)]
    pub profiles: HashMap<String, DatasetMapping>,
    #[serde(default = "PollPolicy::service_sync")]
    pub service_poll: PollPolicy,
    #[serde(default = "PollPolicy::job_completion")]
    pub job_poll: PollPolicy,
}

impl RegistryConfig {
    pub fn new(base_url: Url, token: Option<String>, org: impl Into<String>) -> Self {
        Self {
            base_url,
            token,
            org: org.into(),
            profiles: HashMap::new(),
            service_poll: PollPolicy::service_sync(),
            job_poll: PollPolicy::job_completion(),
        }
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: RegistryConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    /// Resolves a logical profile to its dataset mapping, failing fast when
    /// no mapping is configured.
    pub fn resolve(&self, profile: &str) -> Result<&DatasetMapping> {
        self.profiles.get(profile).ok_or_else(|| {
            ValidationError::new(format!("No dataset mapping configured for '{profile}'")).into()
        })
    }
}
