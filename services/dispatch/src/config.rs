use std::time::Duration;

use serde::Deserialize;

use courier_core::config::Config;
use courier_core::tracing::LogFormat;

use crate::infra::channel::ChannelSettings;
use crate::infra::retry::RetryPolicy;

/// Dispatch service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct DispatchConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3120). Env var: `DISPATCH_PORT`.
    #[serde(default = "default_port")]
    pub dispatch_port: u16,
    /// Shared secret expected in `x-scheduler-secret`. Unset disables the
    /// scheduler endpoint.
    #[serde(default)]
    pub scheduler_secret: Option<String>,
    /// HMAC key for inbound webhook signatures. Unset accepts unsigned
    /// callbacks.
    #[serde(default)]
    pub channel_secret: Option<String>,
    #[serde(default)]
    pub channel_access_token: Option<String>,
    /// Default recipient for pushed messages.
    #[serde(default)]
    pub channel_push_target: Option<String>,
    #[serde(default = "default_api_base")]
    pub channel_api_base: String,
    #[serde(default = "default_timeout_ms")]
    pub channel_timeout_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Wall-clock budget for one scheduler run.
    #[serde(default = "default_deadline_secs")]
    pub scheduler_deadline_secs: u64,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_port() -> u16 {
    3120
}

fn default_api_base() -> String {
    "https://api.line.me".to_owned()
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_deadline_secs() -> u64 {
    25
}

impl Config for DispatchConfig {}

impl DispatchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings {
            api_base: self.channel_api_base.clone(),
            access_token: self.channel_access_token.clone(),
            push_target: self.channel_push_target.clone(),
            timeout: Duration::from_millis(self.channel_timeout_ms),
        }
    }

    pub fn scheduler_deadline(&self) -> Duration {
        Duration::from_secs(self.scheduler_deadline_secs)
    }
}
