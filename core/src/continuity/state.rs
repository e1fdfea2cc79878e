use crate::interface::frame::CarState;
use std::collections::HashMap;

/// Identity used to carry an entity's angle from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// Stable identifier supplied by the telemetry source.
    Id(u32),
    /// Position within the received list; only as stable as the source's ordering.
    Slot(usize),
}

impl EntityKey {
    pub fn for_car(slot: usize, car: &CarState) -> Self {
        match car.id {
            Some(id) => EntityKey::Id(id),
            None => EntityKey::Slot(slot),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AngleEntry {
    angle: f64,
    last_seen: u64,
}

/// Continuity history owned by exactly one session.
#[derive(Debug, Clone, Default)]
pub struct ContinuityState {
    player_yaw: Option<f64>,
    entities: HashMap<EntityKey, AngleEntry>,
    frame: u64,
}

/// Everything one frame wants to persist, applied in a single commit.
#[derive(Debug, Clone, Default)]
pub struct FrameUpdate {
    pub player_yaw: f64,
    /// `None` marks an entity that was seen but had no usable bearing.
    pub angles: Vec<(EntityKey, Option<f64>)>,
}

impl ContinuityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_yaw(&self) -> Option<f64> {
        self.player_yaw
    }

    pub fn entity_angle(&self, key: &EntityKey) -> Option<f64> {
        self.entities.get(key).map(|entry| entry.angle)
    }

    pub fn tracked_entities(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.player_yaw.is_none() && self.entities.is_empty()
    }

    /// Writes a frame's results and evicts entities unseen for longer than
    /// `grace_frames`. Returns the number of evicted entries.
    pub fn commit(&mut self, update: FrameUpdate, grace_frames: u64) -> usize {
        self.frame += 1;
        self.player_yaw = Some(update.player_yaw);

        for (key, angle) in update.angles {
            match (angle, self.entities.get_mut(&key)) {
                (Some(angle), Some(entry)) => {
                    entry.angle = angle;
                    entry.last_seen = self.frame;
                }
                (Some(angle), None) => {
                    self.entities.insert(
                        key,
                        AngleEntry {
                            angle,
                            last_seen: self.frame,
                        },
                    );
                }
                (None, Some(entry)) => entry.last_seen = self.frame,
                (None, None) => {}
            }
        }

        let frame = self.frame;
        let before = self.entities.len();
        self.entities
            .retain(|_, entry| frame - entry.last_seen <= grace_frames);
        before - self.entities.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
