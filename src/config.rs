//! Process configuration. The only knob is the GitHub bearer token.

use std::env;

use tracing::warn;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Optional bearer token. Without it GitHub applies the anonymous
    /// rate limit; behavior is otherwise unchanged.
    pub github_token: Option<String>,
}

impl AppConfig {
    /// Loads `.env` if present, then reads `GITHUB_TOKEN`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let github_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        if github_token.is_none() {
            warn!("GITHUB_TOKEN is not set; anonymous rate limits apply");
        }
        Self { github_token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_counts_as_absent() {
        env::set_var("GITHUB_TOKEN", "");
        let config = AppConfig::from_env();
        assert_eq!(config.github_token, None);
        env::remove_var("GITHUB_TOKEN");
    }
}
