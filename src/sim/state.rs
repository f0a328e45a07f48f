//! Game state and core simulation types
//!
//! A `GameState` is a self-contained snapshot: the tick function takes one by
//! reference and hands back a new, fully independent one.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Segment;
use crate::direction;
use crate::table::{CircleFeature, FlipperConfig, TableConfig};

/// Top-level game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Ball parked at the spawn point, waiting for launch input
    Waiting,
    /// Active gameplay
    Playing,
    /// Lives exhausted (terminal)
    GameOver,
}

/// The ball's kinematics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Ball {
    /// A motionless ball at `pos`
    pub fn at_rest(pos: Vec2) -> Self {
        Self { pos, vel: Vec2::ZERO }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Semi-implicit Euler step: gravity first, then translation, then the
    /// speed cap (by magnitude, direction preserved)
    pub fn integrate(&mut self, gravity: f32, max_speed: f32, dt: f32) {
        self.vel.y += gravity * dt;
        self.pos += self.vel * dt;
        self.cap_speed(max_speed);
    }

    /// Uniformly rescale velocity down to `max_speed` if it exceeds it
    pub fn cap_speed(&mut self, max_speed: f32) {
        let speed = self.speed();
        if speed > max_speed {
            self.vel *= max_speed / speed;
        }
    }
}

/// Which flipper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipperSide {
    Left,
    Right,
}

/// A flipper's runtime state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flipper {
    /// Current blade angle (radians, screen space)
    pub angle: f32,
}

impl Flipper {
    /// Move the angle toward `target` by at most `max_step`
    pub fn settle_toward(&mut self, target: f32, max_step: f32) {
        self.angle += (target - self.angle).clamp(-max_step, max_step);
    }

    /// The blade as a thick segment from the pivot
    pub fn blade(&self, pivot: Vec2, config: &FlipperConfig) -> Segment {
        Segment {
            start: pivot,
            end: pivot + direction(self.angle) * config.length,
            thickness: config.thickness,
        }
    }
}

/// Both flippers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flippers {
    pub left: Flipper,
    pub right: Flipper,
}

impl Flippers {
    /// Both flippers at their rest angles
    pub fn at_rest(config: &FlipperConfig) -> Self {
        Self {
            left: Flipper {
                angle: config.left_rest,
            },
            right: Flipper {
                angle: config.right_rest,
            },
        }
    }

    pub fn get(&self, side: FlipperSide) -> &Flipper {
        match side {
            FlipperSide::Left => &self.left,
            FlipperSide::Right => &self.right,
        }
    }
}

impl FlipperConfig {
    pub fn pivot(&self, side: FlipperSide) -> Vec2 {
        match side {
            FlipperSide::Left => self.left_pivot,
            FlipperSide::Right => self.right_pivot,
        }
    }

    /// Angle the flipper heads toward given whether its button is held
    pub fn target_angle(&self, side: FlipperSide, held: bool) -> f32 {
        match (side, held) {
            (FlipperSide::Left, true) => self.left_active,
            (FlipperSide::Left, false) => self.left_rest,
            (FlipperSide::Right, true) => self.right_active,
            (FlipperSide::Right, false) => self.right_rest,
        }
    }
}

/// A valve: scores once, then stays lit until bonus mode ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valve {
    #[serde(flatten)]
    pub feature: CircleFeature,
    pub lit: bool,
}

/// A target or port: scores on contact, throttled by a cooldown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    #[serde(flatten)]
    pub feature: CircleFeature,
    /// Seconds until this sensor can score again
    pub cooldown: f32,
}

impl Sensor {
    fn armed(feature: &CircleFeature) -> Self {
        Self {
            feature: feature.clone(),
            cooldown: 0.0,
        }
    }
}

/// Bonus mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bonus {
    pub active: bool,
    /// Seconds remaining while active
    pub timer: f32,
    /// Score multiplier applied while active
    pub multiplier: u32,
}

/// Cosmetic taunt shown after a drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Taunt {
    pub active: bool,
    pub timer: f32,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub status: GameStatus,
    pub score: u64,
    pub lives: u32,
    pub ball: Ball,
    pub flippers: Flippers,
    pub bumpers: Vec<CircleFeature>,
    pub valves: Vec<Valve>,
    pub targets: Vec<Sensor>,
    pub ports: Vec<Sensor>,
    pub bonus: Bonus,
    pub taunt: Taunt,
}

impl GameState {
    /// Fresh game on `table`: waiting, full lives, ball at the spawn point
    pub fn new(table: &TableConfig) -> Self {
        Self {
            status: GameStatus::Waiting,
            score: 0,
            lives: table.lives,
            ball: Ball::at_rest(table.launch_position),
            flippers: Flippers::at_rest(&table.flipper),
            bumpers: table.bumpers.clone(),
            valves: table
                .valves
                .iter()
                .map(|feature| Valve {
                    feature: feature.clone(),
                    lit: false,
                })
                .collect(),
            targets: table.targets.iter().map(Sensor::armed).collect(),
            ports: table.ports.iter().map(Sensor::armed).collect(),
            bonus: Bonus {
                active: false,
                timer: 0.0,
                multiplier: table.bonus_multiplier,
            },
            taunt: Taunt::default(),
        }
    }

    /// Award points, multiplied while bonus mode is active
    pub fn add_score(&mut self, amount: u32) {
        let multiplier = if self.bonus.active {
            self.bonus.multiplier
        } else {
            1
        };
        self.score += u64::from(amount) * u64::from(multiplier);
    }

    /// True when there are valves and every one is lit
    pub fn all_valves_lit(&self) -> bool {
        !self.valves.is_empty() && self.valves.iter().all(|valve| valve.lit)
    }

    /// Park the ball at the spawn point
    pub fn reset_ball(&mut self, table: &TableConfig) {
        self.ball = Ball::at_rest(table.launch_position);
    }

    /// Fire the ball up the table; the side-kick always pushes left
    pub fn launch(&mut self, table: &TableConfig) {
        self.ball.vel = Vec2::new(-table.launch_side_kick, table.launch_speed);
        self.status = GameStatus::Playing;
    }

    /// HUD text for bonus mode, e.g. "ACTIVE (7s)" or "OFF"
    pub fn bonus_readout(&self) -> String {
        if self.bonus.active {
            format!("ACTIVE ({}s)", self.bonus.timer.ceil() as u32)
        } else {
            "OFF".to_string()
        }
    }

    /// Taunt overlay opacity in [0, 1]
    pub fn taunt_fade(&self, table: &TableConfig) -> f32 {
        match table.taunt_duration {
            Some(duration) if self.taunt.active => (self.taunt.timer / duration).min(1.0),
            _ => 0.0,
        }
    }
}
