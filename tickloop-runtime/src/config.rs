use crate::error::Error;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Largest task capacity; index `0xFF` is reserved for the invalid handle.
pub const MAX_CAPACITY: usize = 0xFE;

/// Runtime tunables, read from the `[scheduler]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of task slots (and schedule nodes).
    pub capacity: usize,
    /// Period of the host tick source in milliseconds.
    pub tick_period_ms: u64,
    /// Interval of the CPU utilization monitor task.
    pub cpu_sample_interval_ms: u32,
    /// Sampling windows shorter than this return the cached usage.
    pub cpu_min_window_ms: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: 15,
            tick_period_ms: 1,
            cpu_sample_interval_ms: 1000,
            cpu_min_window_ms: 10,
        }
    }
}

impl SchedulerConfig {
    /// Read the `[scheduler]` table, falling back to defaults when absent.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let settings = match config.get::<SchedulerConfig>("scheduler") {
            Ok(settings) => settings,
            Err(config::ConfigError::NotFound(_)) => SchedulerConfig::default(),
            Err(e) => return Err(e.into()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(Error::InvalidConfig(format!(
                "capacity must be within 1..={}, got {}",
                MAX_CAPACITY, self.capacity
            )));
        }
        if self.tick_period_ms == 0 {
            return Err(Error::InvalidConfig("tick_period_ms must be non-zero".into()));
        }
        if self.cpu_sample_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "cpu_sample_interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Load config from a specific TOML file
pub fn load_toml_config<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
    load_config(path.as_ref(), FileFormat::Toml)
}

/// Load config from a specific YAML file
pub fn load_yaml_config<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
    load_config(path.as_ref(), FileFormat::Yaml)
}

fn load_config(path: &Path, format: FileFormat) -> Result<Config, Error> {
    let config = Config::builder()
        .add_source(File::from(path).format(format))
        .add_source(
            config::Environment::with_prefix("TICKLOOP")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(config)
}

/// Resolve config placeholder like ${app.interval} or ${app.interval:default}
pub fn resolve_config_value(value: &str, config: &Config) -> Result<String, Error> {
    let Some(inner) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) else {
        return Ok(value.to_string());
    };

    if let Some((key, default_value)) = inner.split_once(':') {
        match config.get_string(key) {
            Ok(resolved) => Ok(resolved),
            Err(_) => Ok(default_value.to_string()),
        }
    } else {
        Ok(config.get_string(inner)?)
    }
}
