//! Observer configuration.
//!
//! Everything the pipeline needs is resolved exactly once at process start
//! and passed by reference from there on; no scoring logic ever consults
//! the environment. Precedence per value: CLI flag > environment variable >
//! built-in default, with the winning source tracked for display.
//!
//! Environment variables:
//! - `LOOKOUT_BASE_URL` - tracker base URL (default `http://localhost:3000`)
//! - `LOOKOUT_TOKEN` - bearer token for snapshot and report-store calls
//! - `LOOKOUT_COOLING_THRESHOLD` - cooling temperature threshold (default 40)
//! - `LOOKOUT_COOLING_DAYS` - cooling staleness threshold in days (default 7)

use crate::Error;
use crate::analysis::CoolingThresholds;

/// Environment variable for the tracker base URL.
pub const BASE_URL_ENV: &str = "LOOKOUT_BASE_URL";

/// Environment variable for the bearer token.
pub const TOKEN_ENV: &str = "LOOKOUT_TOKEN";

/// Environment variable for the cooling temperature threshold.
pub const COOLING_THRESHOLD_ENV: &str = "LOOKOUT_COOLING_THRESHOLD";

/// Environment variable for the cooling staleness threshold (days).
pub const COOLING_DAYS_ENV: &str = "LOOKOUT_COOLING_DAYS";

/// Base URL used when neither flag nor environment provides one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from a CLI flag
    CliFlag,
    /// Value from an environment variable
    EnvVar(String),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved observer configuration.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    pub base_url: Resolved<String>,
    pub token: Option<Resolved<String>>,
    pub cooling: CoolingThresholds,
}

impl ObserverConfig {
    /// Resolve configuration from the CLI flag and the process environment.
    pub fn resolve(base_url_flag: Option<&str>) -> crate::Result<Self> {
        Self::resolve_from(base_url_flag, &|name| std::env::var(name).ok())
    }

    /// Resolve configuration with an injected environment lookup. Tests use
    /// this to stay independent of (and safe against) the real process
    /// environment.
    pub fn resolve_from(
        base_url_flag: Option<&str>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> crate::Result<Self> {
        let base_url = if let Some(flag) = base_url_flag {
            Resolved::new(normalize_base_url(flag), ValueSource::CliFlag)
        } else if let Some(value) = env(BASE_URL_ENV) {
            Resolved::new(
                normalize_base_url(&value),
                ValueSource::EnvVar(BASE_URL_ENV.to_string()),
            )
        } else {
            Resolved::new(DEFAULT_BASE_URL.to_string(), ValueSource::Default)
        };

        // A localhost target under GitHub Actions means the secret was never
        // configured; fail at startup instead of timing out later.
        if env("GITHUB_ACTIONS").is_some_and(|v| !v.is_empty())
            && (base_url.value.contains("localhost") || base_url.value.contains("127.0.0.1"))
        {
            return Err(Error::Config(format!(
                "{} is not set for GitHub Actions. Add a secret {} (e.g. https://your-app.example.com)",
                BASE_URL_ENV, BASE_URL_ENV
            )));
        }

        let token = env(TOKEN_ENV)
            .filter(|t| !t.is_empty())
            .map(|t| Resolved::new(t, ValueSource::EnvVar(TOKEN_ENV.to_string())));

        let cooling = CoolingThresholds {
            temperature: parse_threshold(env(COOLING_THRESHOLD_ENV), COOLING_THRESHOLD_ENV, 40)?,
            days: parse_threshold(env(COOLING_DAYS_ENV), COOLING_DAYS_ENV, 7)?,
        };

        Ok(Self {
            base_url,
            token,
            cooling,
        })
    }

    /// The resolved base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url.value
    }

    /// The resolved token, if set.
    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|r| r.value.as_str())
    }

    /// Masked token for display purposes.
    pub fn masked_token(&self) -> Option<String> {
        self.token.as_ref().map(|r| {
            let token = &r.value;
            if token.len() <= 12 {
                format!("{}...", &token[..4.min(token.len())])
            } else {
                format!("{}...{}", &token[..4], &token[token.len() - 4..])
            }
        })
    }
}

/// Normalize a raw base URL: trim whitespace, fall back to the default when
/// blank, and rescue scheme-less hosts with `https://` (secrets configured
/// as a bare hostname are common).
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn parse_threshold(raw: Option<String>, name: &str, default: i64) -> crate::Result<i64> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::Config(format!("{} must be an integer, got {:?}", name, value))),
    }
}
