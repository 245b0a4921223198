//! CLI configuration via environment variables
//!
//! Only output preferences live here; build axes come from strata-config.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Output format override (STRATA_OUTPUT=json|text)
    pub output_format: Option<String>,
    /// Disable colored output (STRATA_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            output_format: env::var("STRATA_OUTPUT").ok().map(|v| v.to_lowercase()),
            no_color: env::var("STRATA_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
        }
    }

    /// JSON output unless told otherwise; the environment beats `fallback`
    pub fn wants_json(&self, fallback: Option<&str>) -> bool {
        self.output_format.as_deref().or(fallback) == Some("json")
    }
}
