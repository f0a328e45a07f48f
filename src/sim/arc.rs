//! Arc geometry for curved rails
//!
//! A curved rail is a circular arc around `center`. The ball only touches it
//! where the contact angle (from center to ball) lies on the arc, which is
//! the shorter of the two ways around between `start_angle` and `end_angle`.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use crate::{direction, normalize_angle};

/// Restitution applied by rails that do not set their own
pub const DEFAULT_RAIL_BOOST: f32 = 1.02;

/// A capped arc rail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcRail {
    pub id: u32,
    /// Center of the arc's circle
    pub center: Vec2,
    /// Radius of the arc's circle
    pub radius: f32,
    /// Start angle (radians, normalized to [-π, π) by `new` and table loading)
    pub start_angle: f32,
    /// End angle (radians, normalized to [-π, π) by `new` and table loading)
    pub end_angle: f32,
    /// Restitution boost on contact (defaults to [`DEFAULT_RAIL_BOOST`])
    #[serde(default)]
    pub boost: Option<f32>,
}

impl ArcRail {
    pub fn new(id: u32, center: Vec2, radius: f32, start_angle: f32, end_angle: f32) -> Self {
        Self {
            id,
            center,
            radius,
            start_angle: normalize_angle(start_angle),
            end_angle: normalize_angle(end_angle),
            boost: None,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Restitution used when the ball bounces off this rail
    #[inline]
    pub fn restitution(&self) -> f32 {
        self.boost.unwrap_or(DEFAULT_RAIL_BOOST)
    }

    /// Angular span of the arc, taking the short way around (at most π)
    pub fn angular_span(&self) -> f32 {
        let span = ccw_offset(self.start_angle, self.end_angle);
        if span > PI { TAU - span } else { span }
    }

    /// Check if an angle is within the arc's angular extent
    pub fn contains_angle(&self, theta: f32) -> bool {
        let ccw_span = ccw_offset(self.start_angle, self.end_angle);
        if ccw_span <= PI {
            ccw_offset(self.start_angle, theta) <= ccw_span
        } else {
            // Short way runs from end back to start
            ccw_offset(self.end_angle, theta) <= TAU - ccw_span
        }
    }

    /// Point on the arc's circle at angle `theta`
    pub fn point_at(&self, theta: f32) -> Vec2 {
        self.center + direction(theta) * self.radius
    }
}

/// Counter-clockwise (increasing-angle) distance from `from` to `to`, in [0, 2π)
fn ccw_offset(from: f32, to: f32) -> f32 {
    let offset = (to - from).rem_euclid(TAU);
    if offset >= TAU { 0.0 } else { offset }
}
