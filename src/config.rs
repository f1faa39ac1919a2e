//! Runtime settings, from `TAKEHOME_*` environment variables or the matching
//! command-line flags.

use std::time::Duration;

use clap::{Args, Parser};
use reqwest::Url;
use tracing::warn;

use crate::summary::DEFAULT_SETTLE_DELAY;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Args, Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Upstream rates endpoint. Without one every year uses built-in rates.
    #[arg(long, env = "TAKEHOME_RATES_URL")]
    pub rates_url: Option<Url>,
    /// Text-generation endpoint. Without one summaries come from the local template.
    #[arg(long, env = "TAKEHOME_SUMMARY_URL")]
    pub summary_url: Option<Url>,
    #[arg(
        long,
        env = "TAKEHOME_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub http_timeout_secs: u64,
    #[arg(
        long,
        env = "TAKEHOME_SUMMARY_DELAY_MS",
        default_value_t = DEFAULT_SETTLE_DELAY.as_millis() as u64
    )]
    pub summary_delay_ms: u64,
}

#[derive(Parser, Debug)]
#[command(name = "takehome")]
struct EnvOnly {
    #[command(flatten)]
    config: AppConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rates_url: None,
            summary_url: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            summary_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
        }
    }
}

impl AppConfig {
    /// Reads only the environment. An unusable value is logged and the
    /// defaults are used instead.
    pub fn from_env() -> Self {
        match EnvOnly::try_parse_from(["takehome"]) {
            Ok(parsed) => parsed.config,
            Err(err) => {
                warn!(error = %err, "ignoring invalid TAKEHOME_* settings");
                Self::default()
            }
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn summary_delay(&self) -> Duration {
        Duration::from_millis(self.summary_delay_ms)
    }
}
