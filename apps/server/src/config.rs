use std::{num::NonZeroU32, time::Duration};

use clap::Parser;
use walkthrough_core::Provider;

use crate::state::SessionLimits;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Use JSON formatting for tracing
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Log filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info,tower_http=debug")]
    pub rust_log: String,

    /// Server host
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Reasoning provider: openai, grok or gemini
    #[arg(long, env = "AI_PROVIDER", default_value = "openai")]
    pub provider: Provider,

    /// Override the provider's default model
    #[arg(long, env = "AI_MODEL")]
    pub model: Option<String>,

    /// Default explanation interval in seconds
    #[arg(long, env = "INTERVAL_SECONDS", default_value = "15")]
    pub interval_seconds: NonZeroU32,

    /// Timeout for each outbound request in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// YouTube Data API key, used for video metadata
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    /// Sessions kept in memory before the least recently used is dropped
    #[arg(long, env = "MAX_SESSIONS", default_value = "1000")]
    pub max_sessions: u64,

    /// Seconds without activity before a session is dropped
    #[arg(long, env = "SESSION_IDLE_SECS", default_value = "1800")]
    pub session_idle_secs: u64,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_sessions: self.max_sessions,
            idle_timeout: Duration::from_secs(self.session_idle_secs),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "walkthrough-server",
            "--port",
            "8080",
            "--provider",
            "grok",
            "--interval-seconds",
            "30",
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), format!("{}:8080", config.host));
        assert_eq!(config.provider, Provider::Grok);
        assert_eq!(config.interval_seconds.get(), 30);
    }

    #[test]
    fn session_limits_are_configurable() {
        let config = Config::try_parse_from([
            "walkthrough-server",
            "--max-sessions",
            "5",
            "--session-idle-secs",
            "90",
        ])
        .unwrap();
        assert_eq!(
            config.session_limits(),
            SessionLimits {
                max_sessions: 5,
                idle_timeout: Duration::from_secs(90),
            }
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Config::try_parse_from(["walkthrough-server", "--interval-seconds", "0"]).is_err());
    }
}
