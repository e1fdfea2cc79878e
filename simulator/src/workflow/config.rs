use crate::generator::profile::{validate_update_rate, ScenarioConfig};
use anyhow::Context;
use radarcore::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Matches the rate the live feed publishes at.
pub const DEFAULT_UPDATE_RATE_HZ: f64 = 20.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub engine: EngineConfig,
    pub scenario: ScenarioConfig,
    pub update_rate_hz: f64,
    pub port: u16,
    /// Frames generated for an offline run.
    pub frames: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            scenario: ScenarioConfig::default(),
            update_rate_hz: DEFAULT_UPDATE_RATE_HZ,
            port: 9000,
            frames: 400,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        config
            .validate()
            .with_context(|| format!("validating workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(radius_meters: f64, pixel_radius: f64, car_count: usize, seed: u64) -> Self {
        let defaults = Self::default();
        Self {
            engine: EngineConfig {
                radius_meters,
                pixel_radius,
                ..defaults.engine
            },
            scenario: ScenarioConfig {
                car_count,
                seed,
                ..defaults.scenario
            },
            ..defaults
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine.validate()?;
        self.scenario.validate()?;
        validate_update_rate(self.update_rate_hz).context("checking update_rate_hz")?;
        Ok(())
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        self.engine.clone()
    }
}
