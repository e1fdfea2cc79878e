//! Angle unwrapping across the ±π boundary.
//!
//! Any frame-to-frame change larger than π is folded into the shorter path.
//! A genuine rotation of more than half a turn between two samples cannot be
//! told apart from a wraparound at this level.

use std::f64::consts::{PI, TAU};

/// Deltas beyond this many turns are reduced arithmetically before the
/// step loop so it stays bounded.
const MAX_LOOP_TURNS: f64 = 8.0;

/// Returns the representative of `current` (mod 2π) closest to `previous`.
///
/// With no usable `previous` the measurement is returned unchanged, which
/// seeds the sequence.
pub fn unwrap_angle(current: f64, previous: Option<f64>) -> f64 {
    let previous = match previous {
        Some(value) if !value.is_nan() => value,
        _ => return current,
    };
    if !current.is_finite() || !previous.is_finite() {
        return current;
    }

    let mut delta = current - previous;
    if delta.abs() > MAX_LOOP_TURNS * TAU {
        delta = delta.rem_euclid(TAU);
    }
    while delta > PI {
        delta -= TAU;
    }
    while delta < -PI {
        delta += TAU;
    }
    previous + delta
}
