use std::{env, time::Duration};

use anyhow::{bail, Context};

/// Runtime configuration gathered from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub iracing_email: String,
    pub iracing_password: String,
    /// IRACING_PASSWORD already contains the hashed credential.
    pub iracing_password_hashed: bool,
    pub poll_interval: Duration,
    pub poll_concurrency: usize,
    pub sqlite_path: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            discord_token: require("DISCORD_TOKEN")?,
            iracing_email: require("IRACING_EMAIL")?,
            iracing_password: require("IRACING_PASSWORD")?,
            iracing_password_hashed: env::var("IRACING_PASSWORD_HASHED")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            poll_interval: Duration::from_secs(parse_or("POLL_INTERVAL_SECONDS", 120)?),
            poll_concurrency: parse_or("POLL_CONCURRENCY", 4)? as usize,
            sqlite_path: env::var("SQLITE_PATH").unwrap_or("data/bot.db".to_owned()),
        };

        Ok(config)
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    let value = env::var(name).with_context(|| format!("{name} must be set in the environment"))?;
    if value.is_empty() {
        bail!("{name} must not be empty");
    }
    Ok(value)
}

fn parse_or(name: &str, default: u64) -> anyhow::Result<u64> {
    match env::var(name) {
        Ok(raw) => raw.parse().with_context(|| format!("invalid {name}: {raw}")),
        Err(_) => Ok(default),
    }
}
