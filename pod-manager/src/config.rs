use std::time::Duration;

use serde::Deserialize;
use serde::Deserializer;

use super::*;

const DEFAULT_MAX_CONFLICT_RETRIES: usize = 3;
const DEFAULT_CONFLICT_RETRY_UNIT_TIME: Duration = Duration::from_secs(1);
const MAX_BACKOFF_SHIFT: usize = 30;

/// Tuning for [`PodManager`].
///
/// Deserializes from camelCase keys; every key is optional.
/// `conflictRetryUnitTime` takes a Go-style duration string such as `"250ms"`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodManagerConfig {
    /// Retries after the first conflicting write; total attempts are one more.
    pub max_conflict_retries: usize,
    #[serde(deserialize_with = "deserialize_duration")]
    pub conflict_retry_unit_time: Duration,
}

impl PodManagerConfig {
    pub const MAX_CONFLICT_RETRIES_ENV: &'static str = "POD_MANAGER_MAX_CONFLICT_RETRIES";
    pub const CONFLICT_RETRY_UNIT_TIME_ENV: &'static str = "POD_MANAGER_CONFLICT_RETRY_UNIT_TIME";

    /// Defaults overridden by `POD_MANAGER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_max_conflict_retries(self, max_conflict_retries: usize) -> Self {
        Self {
            max_conflict_retries,
            ..self
        }
    }

    pub fn with_conflict_retry_unit_time(self, conflict_retry_unit_time: Duration) -> Self {
        Self {
            conflict_retry_unit_time,
            ..self
        }
    }

    /// Random backoff before retry number `attempt` (0-based):
    /// `rand[0, 2^(attempt + 1)) * conflict_retry_unit_time`.
    pub fn conflict_backoff(&self, attempt: usize) -> Duration {
        let factor = 1_u32 << (attempt.min(MAX_BACKOFF_SHIFT) + 1);
        self.conflict_retry_unit_time
            .saturating_mul(fastrand::u32(0..factor))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(text) = lookup(Self::MAX_CONFLICT_RETRIES_ENV) {
            config.max_conflict_retries =
                text.trim().parse().map_err(|err| Error::Config {
                    key: Self::MAX_CONFLICT_RETRIES_ENV,
                    reason: format!("{text:?}: {err}"),
                })?;
        }

        if let Some(text) = lookup(Self::CONFLICT_RETRY_UNIT_TIME_ENV) {
            config.conflict_retry_unit_time =
                parse_duration(text.trim()).map_err(|reason| Error::Config {
                    key: Self::CONFLICT_RETRY_UNIT_TIME_ENV,
                    reason,
                })?;
        }

        Ok(config)
    }
}

impl Default for PodManagerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            conflict_retry_unit_time: DEFAULT_CONFLICT_RETRY_UNIT_TIME,
        }
    }
}

/// Parses a Go-style duration (`"1s"`, `"1m30s"`, `"250ms"`).
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let nanos = go_parse_duration::parse_duration(text)
        .map_err(|_| format!("invalid duration {text:?}"))?;
    u64::try_from(nanos)
        .map(Duration::from_nanos)
        .map_err(|_| format!("negative duration {text:?}"))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_duration(&text).map_err(serde::de::Error::custom)
}
