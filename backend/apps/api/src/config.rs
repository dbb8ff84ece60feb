//! Environment Configuration
//!
//! Builds the immutable [`AuthConfig`] from environment variables (a `.env`
//! file is loaded first by `main`).

use std::env;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use auth::config::SameSite;
use platform::secure_cookie::CookieKeyPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "development" => Ok(Environment::Development),
            "testing" => Ok(Environment::Testing),
            "production" => Ok(Environment::Production),
            other => bail!("ENVIRONMENT must be development, testing or production, got {other:?}"),
        }
    }
}

pub fn auth_config_from_env() -> anyhow::Result<(Environment, AuthConfig)> {
    auth_config_from(|key| env::var(key).ok())
}

/// `var` returns the raw value of a variable, `None` when unset.
pub fn auth_config_from(
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<(Environment, AuthConfig)> {
    let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    let environment = Environment::parse(&var("ENVIRONMENT").unwrap_or_default())?;
    let mut config = AuthConfig::default();

    config.cookie_secure = environment == Environment::Production;
    config.cookie_domain = var("DOMAIN_NAME");

    if let Some(name) = var("AUTH_COOKIE_NAME") {
        config.cookie_name = name;
    }
    if let Some(same_site) = var("AUTH_COOKIE_SAME_SITE") {
        config.cookie_same_site = same_site
            .parse::<SameSite>()
            .context("AUTH_COOKIE_SAME_SITE")?;
    }
    if let Some(lifetime) = minutes(&var, "AUTH_TOKEN_LIFETIME")? {
        config.token_lifetime = lifetime;
    }
    if let Some(lifetime) = minutes(&var, "EMAIL_TOKEN_LIFETIME")? {
        config.reset_token_lifetime = lifetime;
    }

    config.current_cookie_key = match var("CURRENT_SECURE_COOKIE_KEY") {
        Some(key) => key,
        None if environment == Environment::Production => {
            bail!("CURRENT_SECURE_COOKIE_KEY must be set in production")
        }
        None => {
            tracing::warn!(
                "CURRENT_SECURE_COOKIE_KEY not set, using a throwaway key; sessions end on restart"
            );
            CookieKeyPair::generate()?.to_key_string()
        }
    };
    config.previous_cookie_key = var("PREVIOUS_SECURE_COOKIE_KEY").unwrap_or_default();

    Ok((environment, config))
}

fn minutes(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> anyhow::Result<Option<Duration>> {
    let Some(raw) = var(key) else {
        return Ok(None);
    };
    let minutes: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a whole number of minutes"))?;
    if minutes == 0 {
        bail!("{key} must be positive");
    }
    let Some(seconds) = minutes.checked_mul(60) else {
        bail!("{key} is too large");
    };
    Ok(Some(Duration::from_secs(seconds)))
}
