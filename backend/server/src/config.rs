use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Result, anyhow};
use tracing::{info, warn};

pub const DEFAULT_PORT: &str = "3030";
pub const DEFAULT_LEDGER_PATH: &str = "likes.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub ledger_path: PathBuf,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, environment or otherwise.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: try_load(&lookup, "LIKES_PORT", DEFAULT_PORT)?,
            ledger_path: try_load(&lookup, "LIKES_FILE", DEFAULT_LEDGER_PATH)?,
            static_dir: lookup("LIKES_STATIC_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow!("Environment misconfigured, invalid {key}: {e}")
        })
}
