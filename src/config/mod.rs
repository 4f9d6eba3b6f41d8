use once_cell::sync::Lazy;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    pub consume_ms: u64,
    pub publish_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub queue: QueueConfig,
    pub timeouts: TimeoutConfig,
}

impl Config {
    pub fn consume_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.consume_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.publish_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            queue: QueueConfig { capacity: 64 },
            timeouts: TimeoutConfig {
                consume_ms: 5_000,
                publish_ms: 5_000,
            },
        }
    }
}

/// Process-wide configuration: `fanmq.toml` from the working directory, or
/// the built-in defaults when the file is absent or malformed.
pub static CONFIG: Lazy<Config> = Lazy::new(|| load_config("fanmq.toml").unwrap_or_default());

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, anyhow::Error> {
    let raw: String = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&raw)?;
    Ok(config)
}
