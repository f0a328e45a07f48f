//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (table order)
//! - No rendering, input capture or platform dependencies

pub mod arc;
pub mod clock;
pub mod collision;
pub mod state;
pub mod tick;

pub use arc::ArcRail;
pub use clock::FixedStepper;
pub use collision::{Contact, Obstacle, Segment};
pub use state::{
    Ball, Bonus, Flipper, FlipperSide, Flippers, GameState, GameStatus, Sensor, Taunt, Valve,
};
pub use tick::{TickInput, step};
