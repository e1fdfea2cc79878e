use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use radarcore::continuity::EntityKey;
use radarcore::interface::{Classification, RadarEntity, RadarFrame, TelemetryFrame};
use radarcore::UpdateSession;
use std::collections::HashMap;

pub struct WorkflowResult {
    pub frames_processed: usize,
    pub peak_visible: usize,
    /// Largest frame-to-frame change of the unwrapped player yaw.
    pub max_yaw_step: f64,
    /// Largest frame-to-frame change of any visible car's bearing.
    pub max_bearing_step: f64,
    pub class_counts: Vec<(Classification, usize)>,
    pub last_frame: Option<RadarFrame>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

fn entity_key(entity: &RadarEntity) -> EntityKey {
    match entity.id {
        Some(id) => EntityKey::Id(id),
        None => EntityKey::Slot(entity.slot),
    }
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn execute(&self, frames: &[TelemetryFrame]) -> anyhow::Result<WorkflowResult> {
        let mut session = UpdateSession::new(self.config.to_engine_config())
            .context("creating radar session")?;

        let mut peak_visible = 0;
        let mut max_yaw_step: f64 = 0.0;
        let mut max_bearing_step: f64 = 0.0;
        let mut previous_yaw: Option<f64> = None;
        let mut previous_bearings: HashMap<EntityKey, f64> = HashMap::new();
        let mut classes: HashMap<Classification, usize> = HashMap::new();
        let mut last_frame = None;

        for frame in frames {
            frame.validate().context("validating telemetry frame")?;
            let radar = session.ingest(frame);

            if let Some(previous) = previous_yaw {
                max_yaw_step = max_yaw_step.max((radar.player.yaw - previous).abs());
            }
            previous_yaw = Some(radar.player.yaw);

            let mut bearings = HashMap::with_capacity(radar.entities.len());
            for entity in &radar.entities {
                let key = entity_key(entity);
                if let Some(previous) = previous_bearings.get(&key) {
                    max_bearing_step =
                        max_bearing_step.max((entity.relative_angle - previous).abs());
                }
                bearings.insert(key, entity.relative_angle);
                *classes.entry(entity.classification).or_insert(0) += 1;
            }
            previous_bearings = bearings;

            peak_visible = peak_visible.max(radar.entities.len());
            last_frame = Some(radar);
        }

        let mut class_counts: Vec<(Classification, usize)> = classes.into_iter().collect();
        class_counts.sort_by_key(|(class, _)| class.label());

        Ok(WorkflowResult {
            frames_processed: frames.len(),
            peak_visible,
            max_yaw_step,
            max_bearing_step,
            class_counts,
            last_frame,
        })
    }
}
