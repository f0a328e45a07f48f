//! Table configuration
//!
//! Immutable description of a table's geometry and tuning. Every table
//! variant is plain data run by the same engine; built-in variants are
//! exposed as [`TablePreset`]s and custom ones load from JSON.

use std::collections::HashSet;
use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::normalize_angle;
use crate::sim::arc::{ArcRail, DEFAULT_RAIL_BOOST};

/// Error type for table loading and validation.
#[derive(Debug)]
pub enum TableError {
    Parse(serde_json::Error),
    Invalid(String),
    UnknownPreset(String),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Parse(e) => write!(f, "table parse error: {}", e),
            TableError::Invalid(reason) => write!(f, "invalid table: {}", reason),
            TableError::UnknownPreset(name) => write!(f, "unknown table preset: {}", name),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TableError {
    fn from(err: serde_json::Error) -> Self {
        TableError::Parse(err)
    }
}

/// A round feature: bumper, valve, target or port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleFeature {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Points awarded per scoring contact (before bonus multiplier)
    pub score: u32,
}

impl CircleFeature {
    pub fn new(id: u32, x: f32, y: f32, radius: f32, score: u32) -> Self {
        Self {
            id,
            pos: Vec2::new(x, y),
            radius,
            score,
        }
    }
}

/// A straight passive rail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideRail {
    pub id: u32,
    pub start: Vec2,
    pub end: Vec2,
    pub thickness: f32,
    #[serde(default)]
    pub boost: Option<f32>,
}

impl GuideRail {
    pub fn new(id: u32, start: Vec2, end: Vec2, thickness: f32) -> Self {
        Self {
            id,
            start,
            end,
            thickness,
            boost: None,
        }
    }

    /// Restitution used when the ball bounces off this rail
    #[inline]
    pub fn restitution(&self) -> f32 {
        self.boost.unwrap_or(DEFAULT_RAIL_BOOST)
    }
}

/// Flipper geometry and kick tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipperConfig {
    pub length: f32,
    pub thickness: f32,
    /// Maximum angular speed (radians/sec)
    pub angular_speed: f32,
    pub left_pivot: Vec2,
    pub right_pivot: Vec2,
    pub left_rest: f32,
    pub left_active: f32,
    pub right_rest: f32,
    pub right_active: f32,
    /// Velocity multiplier applied after a flipper bounce
    #[serde(default)]
    pub damping: Option<f32>,
    /// Restitution while the flipper button is held
    #[serde(default = "default_flipper_active_boost")]
    pub active_boost: f32,
    /// Upward speed added on contact while the button is held
    #[serde(default = "default_flipper_kick_active")]
    pub kick_active: f32,
    /// Upward speed added on contact while resting
    #[serde(default = "default_flipper_kick_rest")]
    pub kick_rest: f32,
}

impl FlipperConfig {
    /// Damping factor, 1.0 when the table sets none
    #[inline]
    pub fn damping_factor(&self) -> f32 {
        self.damping.unwrap_or(1.0)
    }
}

fn default_flipper_active_boost() -> f32 {
    1.03
}
fn default_flipper_kick_active() -> f32 {
    70.0
}
fn default_flipper_kick_rest() -> f32 {
    20.0
}
fn default_bumper_boost() -> f32 {
    1.2
}
fn default_valve_boost() -> f32 {
    1.08
}
fn default_bonus_award() -> u32 {
    250
}
fn default_target_cooldown() -> f32 {
    0.6
}
fn default_port_cooldown() -> f32 {
    0.4
}

/// Complete table description (never mutated after construction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub width: f32,
    pub height: f32,
    pub wall_inset: f32,
    pub ball_radius: f32,
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    pub max_speed: f32,
    pub flipper: FlipperConfig,
    #[serde(default)]
    pub guides: Vec<GuideRail>,
    #[serde(default)]
    pub curves: Vec<ArcRail>,
    #[serde(default)]
    pub bumpers: Vec<CircleFeature>,
    #[serde(default)]
    pub valves: Vec<CircleFeature>,
    #[serde(default)]
    pub targets: Vec<CircleFeature>,
    #[serde(default)]
    pub ports: Vec<CircleFeature>,
    #[serde(default = "default_bumper_boost")]
    pub bumper_boost: f32,
    #[serde(default = "default_valve_boost")]
    pub valve_boost: f32,
    /// Bonus mode length (seconds)
    pub bonus_duration: f32,
    pub bonus_multiplier: u32,
    /// One-off award when all valves light up
    #[serde(default = "default_bonus_award")]
    pub bonus_award: u32,
    #[serde(default = "default_target_cooldown")]
    pub target_cooldown: f32,
    #[serde(default = "default_port_cooldown")]
    pub port_cooldown: f32,
    /// Launch vertical velocity (negative is up the table)
    pub launch_speed: f32,
    /// Launch horizontal kick, always applied leftward
    pub launch_side_kick: f32,
    pub launch_position: Vec2,
    pub drain_y: f32,
    pub lives: u32,
    /// Taunt display time after a drain; tables without a taunt omit it
    #[serde(default)]
    pub taunt_duration: Option<f32>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::classic()
    }
}

impl TableConfig {
    /// The reference table
    pub fn classic() -> Self {
        Self {
            width: 600.0,
            height: 900.0,
            wall_inset: 18.0,
            ball_radius: 8.0,
            gravity: 360.0,
            max_speed: 1100.0,
            flipper: FlipperConfig {
                length: 90.0,
                thickness: 14.0,
                angular_speed: 14.0,
                left_pivot: Vec2::new(170.0, 800.0),
                right_pivot: Vec2::new(430.0, 800.0),
                left_rest: 0.35,
                left_active: -0.45,
                right_rest: PI - 0.35,
                right_active: PI + 0.45,
                damping: Some(0.86),
                active_boost: default_flipper_active_boost(),
                kick_active: default_flipper_kick_active(),
                kick_rest: default_flipper_kick_rest(),
            },
            guides: vec![
                GuideRail::new(1, Vec2::new(80.0, 640.0), Vec2::new(180.0, 860.0), 12.0),
                GuideRail::new(2, Vec2::new(520.0, 640.0), Vec2::new(420.0, 860.0), 12.0),
            ],
            curves: Vec::new(),
            bumpers: vec![
                CircleFeature::new(1, 300.0, 370.0, 26.0, 180),
                CircleFeature::new(2, 235.0, 445.0, 24.0, 150),
                CircleFeature::new(3, 365.0, 445.0, 24.0, 150),
            ],
            valves: vec![
                CircleFeature::new(1, 255.0, 320.0, 10.0, 90),
                CircleFeature::new(2, 345.0, 320.0, 10.0, 90),
                CircleFeature::new(3, 205.0, 410.0, 10.0, 90),
                CircleFeature::new(4, 395.0, 410.0, 10.0, 90),
                CircleFeature::new(5, 280.0, 385.0, 10.0, 90),
                CircleFeature::new(6, 320.0, 385.0, 10.0, 90),
            ],
            targets: vec![
                CircleFeature::new(1, 300.0, 500.0, 18.0, 110),
                CircleFeature::new(2, 230.0, 590.0, 18.0, 110),
                CircleFeature::new(3, 370.0, 590.0, 18.0, 110),
            ],
            ports: vec![
                CircleFeature::new(1, 250.0, 660.0, 12.0, 70),
                CircleFeature::new(2, 350.0, 660.0, 12.0, 70),
            ],
            bumper_boost: default_bumper_boost(),
            valve_boost: default_valve_boost(),
            bonus_duration: 10.0,
            bonus_multiplier: 2,
            bonus_award: default_bonus_award(),
            target_cooldown: default_target_cooldown(),
            port_cooldown: default_port_cooldown(),
            launch_speed: -650.0,
            launch_side_kick: 45.0,
            launch_position: Vec2::new(545.0, 850.0),
            drain_y: 880.0,
            lives: 3,
            taunt_duration: Some(1.6),
        }
    }

    /// Narrower table with curved deflectors in the upper corners
    pub fn arcade() -> Self {
        Self {
            width: 560.0,
            height: 880.0,
            wall_inset: 16.0,
            ball_radius: 8.0,
            gravity: 380.0,
            max_speed: 1150.0,
            flipper: FlipperConfig {
                length: 82.0,
                thickness: 14.0,
                angular_speed: 15.0,
                left_pivot: Vec2::new(160.0, 780.0),
                right_pivot: Vec2::new(400.0, 780.0),
                left_rest: 0.35,
                left_active: -0.45,
                right_rest: PI - 0.35,
                right_active: PI + 0.45,
                damping: Some(0.88),
                active_boost: default_flipper_active_boost(),
                kick_active: 80.0,
                kick_rest: default_flipper_kick_rest(),
            },
            guides: vec![
                GuideRail::new(1, Vec2::new(70.0, 620.0), Vec2::new(155.0, 842.0), 12.0),
                GuideRail::new(2, Vec2::new(490.0, 620.0), Vec2::new(405.0, 842.0), 12.0),
            ],
            curves: vec![
                ArcRail::new(1, Vec2::new(110.0, 220.0), 36.0, -0.3, 2.2),
                ArcRail::new(2, Vec2::new(450.0, 220.0), 36.0, PI - 2.2, PI + 0.3),
            ],
            bumpers: vec![
                CircleFeature::new(1, 280.0, 340.0, 26.0, 200),
                CircleFeature::new(2, 215.0, 410.0, 24.0, 150),
                CircleFeature::new(3, 345.0, 410.0, 24.0, 150),
                CircleFeature::new(4, 280.0, 480.0, 20.0, 120),
            ],
            valves: vec![
                CircleFeature::new(1, 230.0, 290.0, 10.0, 100),
                CircleFeature::new(2, 330.0, 290.0, 10.0, 100),
                CircleFeature::new(3, 170.0, 380.0, 10.0, 100),
                CircleFeature::new(4, 390.0, 380.0, 10.0, 100),
            ],
            targets: vec![
                CircleFeature::new(1, 200.0, 560.0, 18.0, 120),
                CircleFeature::new(2, 360.0, 560.0, 18.0, 120),
            ],
            ports: vec![
                CircleFeature::new(1, 235.0, 640.0, 12.0, 80),
                CircleFeature::new(2, 325.0, 640.0, 12.0, 80),
            ],
            bumper_boost: default_bumper_boost(),
            valve_boost: default_valve_boost(),
            bonus_duration: 8.0,
            bonus_multiplier: 3,
            bonus_award: default_bonus_award(),
            target_cooldown: default_target_cooldown(),
            port_cooldown: default_port_cooldown(),
            launch_speed: -700.0,
            launch_side_kick: 40.0,
            launch_position: Vec2::new(505.0, 830.0),
            drain_y: 860.0,
            lives: 3,
            taunt_duration: None,
        }
    }

    /// Parse and validate a table from JSON
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let mut table: TableConfig = serde_json::from_str(json)?;
        table.validate()?;
        for curve in &mut table.curves {
            curve.start_angle = normalize_angle(curve.start_angle);
            curve.end_angle = normalize_angle(curve.end_angle);
        }
        Ok(table)
    }

    /// Serialize the table to pretty JSON
    pub fn to_json(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the table for values the engine cannot run with
    pub fn validate(&self) -> Result<(), TableError> {
        let invalid = |reason: String| -> Result<(), TableError> { Err(TableError::Invalid(reason)) };

        for (name, value) in [
            ("width", self.width),
            ("height", self.height),
            ("ball_radius", self.ball_radius),
            ("max_speed", self.max_speed),
            ("bonus_duration", self.bonus_duration),
            ("flipper.length", self.flipper.length),
            ("flipper.angular_speed", self.flipper.angular_speed),
            ("flipper.thickness", self.flipper.thickness),
            ("flipper.active_boost", self.flipper.active_boost),
            ("flipper.damping", self.flipper.damping_factor()),
            ("bumper_boost", self.bumper_boost),
            ("valve_boost", self.valve_boost),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("{} must be finite and > 0", name));
            }
        }
        for (name, value) in [
            ("flipper.kick_active", self.flipper.kick_active),
            ("flipper.kick_rest", self.flipper.kick_rest),
            ("target_cooldown", self.target_cooldown),
            ("port_cooldown", self.port_cooldown),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("{} must be finite and >= 0", name));
            }
        }
        if !self.wall_inset.is_finite() || self.wall_inset < 0.0 {
            return invalid("wall_inset must be finite and >= 0".to_string());
        }
        if 2.0 * (self.wall_inset + self.ball_radius) >= self.width {
            return invalid("ball does not fit between the walls".to_string());
        }
        if !self.gravity.is_finite() {
            return invalid("gravity must be finite".to_string());
        }
        if !self.drain_y.is_finite() || self.drain_y <= 0.0 || self.drain_y > self.height {
            return invalid("drain_y must lie on the board".to_string());
        }
        if !self.launch_position.is_finite() {
            return invalid("launch_position must be finite".to_string());
        }
        if self.launch_position.y - self.ball_radius >= self.drain_y {
            return invalid("launch_position is below the drain line".to_string());
        }
        if self.lives == 0 {
            return invalid("lives must be at least 1".to_string());
        }
        if self.bonus_multiplier == 0 {
            return invalid("bonus_multiplier must be at least 1".to_string());
        }
        if let Some(duration) = self.taunt_duration {
            if !duration.is_finite() || duration <= 0.0 {
                return invalid("taunt_duration must be finite and > 0".to_string());
            }
        }

        for (kind, features) in [
            ("bumper", &self.bumpers),
            ("valve", &self.valves),
            ("target", &self.targets),
            ("port", &self.ports),
        ] {
            let mut seen = HashSet::new();
            for feature in features {
                if !seen.insert(feature.id) {
                    return invalid(format!("duplicate {} id {}", kind, feature.id));
                }
                if !feature.pos.is_finite() || !feature.radius.is_finite() || feature.radius <= 0.0 {
                    return invalid(format!("{} {} has bad geometry", kind, feature.id));
                }
            }
        }

        let mut seen = HashSet::new();
        for guide in &self.guides {
            if !seen.insert(guide.id) {
                return invalid(format!("duplicate guide id {}", guide.id));
            }
            if !guide.start.is_finite() || !guide.end.is_finite() || !(guide.thickness >= 0.0) {
                return invalid(format!("guide {} has bad geometry", guide.id));
            }
        }

        let mut seen = HashSet::new();
        for curve in &self.curves {
            if !seen.insert(curve.id) {
                return invalid(format!("duplicate curve id {}", curve.id));
            }
            if !curve.center.is_finite()
                || !curve.radius.is_finite()
                || curve.radius <= 0.0
                || !curve.start_angle.is_finite()
                || !curve.end_angle.is_finite()
            {
                return invalid(format!("curve {} has bad geometry", curve.id));
            }
        }

        Ok(())
    }
}

/// Built-in table variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TablePreset {
    #[default]
    Classic,
    Arcade,
}

impl TablePreset {
    pub const ALL: [TablePreset; 2] = [TablePreset::Classic, TablePreset::Arcade];

    pub fn as_str(&self) -> &'static str {
        match self {
            TablePreset::Classic => "classic",
            TablePreset::Arcade => "arcade",
        }
    }

    /// Build the table this preset names
    pub fn config(&self) -> TableConfig {
        match self {
            TablePreset::Classic => TableConfig::classic(),
            TablePreset::Arcade => TableConfig::arcade(),
        }
    }
}

impl std::str::FromStr for TablePreset {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "classic" => Ok(TablePreset::Classic),
            "arcade" => Ok(TablePreset::Arcade),
            _ => Err(TableError::UnknownPreset(s.to_string())),
        }
    }
}

impl std::fmt::Display for TablePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
