use crate::clock::{SimTime, StopLimits};
use crate::error::{Result, SimError};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: LevelFilter,
    /// Decimal places of the sim time prefix.
    pub time_precision: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            time_precision: 3,
        }
    }
}

/// Declarative description of a run.
///
/// ```
/// use desk_core::KernelConfig;
///
/// let cfg = KernelConfig::from_json(r#"{
///     "model_name": "mm1",
///     "max_sim_time": 100.0,
///     "initializer": "arrivals",
///     "initializer_args": [0.5]
/// }"#).unwrap();
/// assert_eq!(cfg.limits().unwrap().max_sim_time, Some(100.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub model_name: String,
    pub max_sim_time: Option<SimTime>,
    /// Wall-clock budget, seconds.
    pub max_real_time: Option<f64>,
    pub max_num_events: Option<u64>,
    pub debug: bool,
    pub logger: LoggerConfig,
    /// Name of a registered handler used as the initializer.
    pub initializer: Option<String>,
    pub initializer_args: Value,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            model_name: "model".to_string(),
            max_sim_time: None,
            max_real_time: None,
            max_num_events: None,
            debug: false,
            logger: LoggerConfig::default(),
            initializer: None,
            initializer_args: Value::Array(Vec::new()),
        }
    }
}

impl KernelConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: KernelConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let cfg: KernelConfig = serde_json::from_reader(reader)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.limits().map(|_| ())
    }

    /// Stop limits described by this config. Negative, non-finite, or (for
    /// the wall-clock budget) unrepresentable values are `InvalidConfig`.
    pub fn limits(&self) -> Result<StopLimits> {
        for (name, value) in [
            ("max_sim_time", self.max_sim_time),
            ("max_real_time", self.max_real_time),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(SimError::InvalidConfig(format!(
                        "{} must be a non-negative number, got {}",
                        name, v
                    )));
                }
            }
        }
        let max_real_time = match self.max_real_time {
            Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|err| {
                SimError::InvalidConfig(format!("max_real_time {}: {}", secs, err))
            })?),
            None => None,
        };
        Ok(StopLimits {
            max_sim_time: self.max_sim_time,
            max_real_time,
            max_num_events: self.max_num_events,
        })
    }
}
