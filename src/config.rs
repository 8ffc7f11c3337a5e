use crate::error::{PantryError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://getpantry.cloud/apiv1";

/// How response bodies that fail to decode are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Pantry details that fail to decode come back zero-valued.
    #[default]
    Lenient,
    /// Decode failures and non-success statuses are surfaced as errors.
    Strict,
}

/// Token bucket settings: `burst` permits, one refilled every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub burst: u32,
    pub interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 2,
            interval: Duration::from_secs(1),
        }
    }
}

/// Runtime configuration for the pantry client.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// `None` runs the client unthrottled.
    pub rate_limit: Option<RateLimitConfig>,
    pub decode_mode: DecodeMode,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("pantry-client/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            rate_limit: Some(RateLimitConfig::default()),
            decode_mode: DecodeMode::Lenient,
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - PANTRY_API_KEY [required]
    /// - PANTRY_API_URL (default: https://getpantry.cloud/apiv1)
    /// - PANTRY_HTTP_TIMEOUT_SECS (default: 30)
    /// - PANTRY_USER_AGENT (default: pantry-client/<version>)
    /// - PANTRY_RATE_LIMIT (`off`, `0` or `false` disables throttling)
    /// - PANTRY_RATE_BURST (default: 2)
    /// - PANTRY_RATE_INTERVAL_MS (default: 1000)
    /// - PANTRY_STRICT_DECODE (`1` or `true` enables strict decoding)
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("PANTRY_API_KEY")
            .map_err(|_| PantryError::Config("Missing PANTRY_API_KEY".to_string()))?;
        let mut cfg = Self::new(api_key);

        if let Ok(url) = env::var("PANTRY_API_URL") {
            cfg.api_url = url;
        }
        if let Some(secs) = env::var("PANTRY_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.timeout_secs = secs;
        }
        if let Ok(ua) = env::var("PANTRY_USER_AGENT") {
            cfg.user_agent = ua;
        }

        let throttled = env::var("PANTRY_RATE_LIMIT")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "off" | "0" | "false"))
            .unwrap_or(true);
        if throttled {
            let mut rl = RateLimitConfig::default();
            if let Ok(v) = env::var("PANTRY_RATE_BURST") {
                rl.burst = v
                    .parse::<u32>()
                    .ok()
                    .filter(|b| *b > 0)
                    .ok_or_else(|| PantryError::Config(format!("invalid PANTRY_RATE_BURST: {v}")))?;
            }
            if let Ok(v) = env::var("PANTRY_RATE_INTERVAL_MS") {
                let ms = v.parse::<u64>().ok().filter(|ms| *ms > 0).ok_or_else(|| {
                    PantryError::Config(format!("invalid PANTRY_RATE_INTERVAL_MS: {v}"))
                })?;
                rl.interval = Duration::from_millis(ms);
            }
            cfg.rate_limit = Some(rl);
        } else {
            cfg.rate_limit = None;
        }

        if matches!(
            env::var("PANTRY_STRICT_DECODE").as_deref(),
            Ok("1") | Ok("true")
        ) {
            cfg.decode_mode = DecodeMode::Strict;
        }
        Ok(cfg)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn unthrottled(mut self) -> Self {
        self.rate_limit = None;
        self
    }

    pub fn strict(mut self) -> Self {
        self.decode_mode = DecodeMode::Strict;
        self
    }
}
