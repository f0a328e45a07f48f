//! Pinball - deterministic single-ball pinball engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, scoring, game state)
//! - `table`: Data-driven table geometry and tuning constants

pub mod sim;
pub mod table;

pub use table::{TableConfig, TableError, TablePreset};

use glam::Vec2;

/// Simulation constants shared by the engine and its drivers
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Gap left between ball surface and obstacle after a push-out
    pub const CONTACT_EPSILON: f32 = 0.5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing along `angle` (screen space, y grows downward)
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of a vector measured from +x
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Unit vector of `v`, or +x when `v` has no usable length
#[inline]
pub fn unit_or_fallback(v: Vec2) -> Vec2 {
    v.try_normalize().unwrap_or(Vec2::X)
}

/// Mirror `vel` about the unit `normal` and scale by a restitution `boost`
///
/// Standard reflection: v' = (v - 2(v·n)n) * boost
#[inline]
pub fn reflect(vel: Vec2, normal: Vec2, boost: f32) -> Vec2 {
    (vel - 2.0 * vel.dot(normal) * normal) * boost
}
