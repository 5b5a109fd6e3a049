use std::path::PathBuf;
use std::time::Duration;

use adsync_fetch::{FetchSettings, RetryPolicy};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view of the merged configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsyncConfig {
    pub master: MasterSection,
    pub publishers: PublishersSection,
    pub fetch: FetchSection,
    pub report: ReportSection,
    pub update: UpdateSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterSection {
    pub path: Option<PathBuf>,
    /// Comment header written above the markers when the master is saved.
    pub header: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishersSection {
    /// Roster CSV: `domain,publisher_name,app_ads_path,notes`.
    pub csv: Option<PathBuf>,
    pub inline: Vec<InlinePublisher>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlinePublisher {
    pub domain: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub app_ads_path: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    pub concurrency: usize,
    pub user_agent: Option<String>,
    pub allow_http_fallback: bool,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            max_attempts: 3,
            backoff_initial_ms: 500,
            backoff_max_ms: 8_000,
            concurrency: 8,
            user_agent: None,
            allow_http_fallback: true,
        }
    }
}

impl FetchSection {
    pub fn to_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            allow_http_fallback: self.allow_http_fallback,
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                backoff_initial: Duration::from_millis(self.backoff_initial_ms),
                backoff_max: Duration::from_millis(self.backoff_max_ms),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub out_dir: PathBuf,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("exports"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateSection {
    pub partners_dir: Option<PathBuf>,
}

impl AdsyncConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: AdsyncConfig =
            serde_json::from_value(config_json.clone()).context("config does not match schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.timeout_secs == 0 {
            bail!("CONFIG_INVALID: fetch.timeout_secs must be > 0");
        }
        if self.fetch.concurrency == 0 {
            bail!("CONFIG_INVALID: fetch.concurrency must be > 0");
        }
        if self.fetch.max_attempts == 0 {
            bail!("CONFIG_INVALID: fetch.max_attempts must be >= 1");
        }
        if self.fetch.backoff_initial_ms > self.fetch.backoff_max_ms {
            bail!(
                "CONFIG_INVALID: fetch.backoff_initial_ms ({}) exceeds fetch.backoff_max_ms ({})",
                self.fetch.backoff_initial_ms,
                self.fetch.backoff_max_ms
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_layered_yaml_from_strings;

    #[test]
    fn defaults_apply_to_missing_sections() {
        let cfg = AdsyncConfig::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(cfg.fetch, FetchSection::default());
        assert_eq!(cfg.report.out_dir, PathBuf::from("exports"));
        assert!(cfg.master.path.is_none());
    }

    #[test]
    fn fetch_section_maps_to_settings() {
        let loaded = load_layered_yaml_from_strings(&[
            "fetch:\n  timeout_secs: 5\n  max_attempts: 2\n  backoff_initial_ms: 100\n  allow_http_fallback: false\n  user_agent: probe/1\n",
        ])
        .unwrap();
        let s = loaded.typed().unwrap().fetch.to_settings();
        assert_eq!(s.timeout, Duration::from_secs(5));
        assert_eq!(s.retry.max_attempts, 2);
        assert_eq!(s.retry.backoff_initial, Duration::from_millis(100));
        assert_eq!(s.retry.backoff_max, Duration::from_millis(8_000));
        assert!(!s.allow_http_fallback);
        assert_eq!(s.user_agent, "probe/1");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for yaml in [
            "fetch:\n  concurrency: 0\n",
            "fetch:\n  timeout_secs: 0\n",
            "fetch:\n  backoff_initial_ms: 9000\n",
            "fetch:\n  timeout_secs: soon\n",
        ] {
            let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
            assert!(loaded.typed().is_err(), "{yaml}");
        }
    }
}
