use figment::{providers::{Env, Format, Toml}, Figment};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

use crate::error::ConfigError;
use crate::scenario::{ScenarioSettings, MIN_TEAM_SIZE};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub run: RunConfig,
    #[validate(nested)]
    pub http: HttpConfig,
    #[validate(nested)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RunConfig {
    #[validate(range(min = 1))]
    pub vus: u32,
    #[validate(range(min = 1))]
    pub duration_seconds: u64,
    pub pause_millis: u64,
    #[validate(url)]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HttpConfig {
    #[validate(range(min = 1))]
    pub timeout_seconds: u64,
    #[validate(length(min = 1))]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkflowConfig {
    #[validate(range(min = 2))]
    pub team_size: usize,
    #[validate(length(min = 1))]
    pub pull_request_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    pub summary_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    pub listen: Option<String>,
}

/// Immutable run parameters handed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfiguration {
    pub virtual_user_count: usize,
    pub duration: Duration,
    pub base_url: Url,
    pub inter_iteration_pause: Duration,
}

impl Config {
    /// `config/default.toml` (or `$LOADGEN_CONFIG`) overlaid with `LOADGEN__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("LOADGEN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(path))
                .merge(Env::prefixed("LOADGEN__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn test_configuration(&self) -> Result<TestConfiguration, ConfigError> {
        Ok(TestConfiguration {
            virtual_user_count: self.run.vus as usize,
            duration: Duration::from_secs(self.run.duration_seconds),
            base_url: parse_base_url(&self.run.base_url)?,
            inter_iteration_pause: Duration::from_millis(self.run.pause_millis),
        })
    }

    pub fn scenario_settings(&self) -> ScenarioSettings {
        ScenarioSettings {
            team_size: self.workflow.team_size.max(MIN_TEAM_SIZE),
            pull_request_name: self.workflow.pull_request_name.clone(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }
}

impl TestConfiguration {
    /// Checks the invariants `Config` validation guarantees, for values built by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.virtual_user_count == 0 {
            return Err(ConfigError::Run("virtual_user_count must be positive".into()));
        }
        if self.duration.is_zero() {
            return Err(ConfigError::Run("duration must be positive".into()));
        }
        parse_base_url(self.base_url.as_str()).map(|_| ())
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::BaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::BaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(ConfigError::BaseUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}
