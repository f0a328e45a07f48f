//! Fixed-step driver
//!
//! Turns variable real frame time into whole `SIM_DT` ticks so the physics
//! stays independent of display frame rate.

use super::state::GameState;
use super::tick::{TickInput, step};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::table::TableConfig;

/// Longest frame time fed into the accumulator (seconds)
pub const MAX_FRAME_DT: f32 = 0.1;

/// Accumulates real time and runs whole simulation ticks
#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f32,
    paused: bool,
    ticks: u64,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            log::debug!("Simulation {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    /// Total ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run as many ticks as `real_dt` covers and return the resulting state
    ///
    /// `input.launch` is a one-shot: it is cleared once a tick has seen it,
    /// and dropped outright while paused. Paused time is discarded so resume
    /// does not burst.
    pub fn advance(
        &mut self,
        mut state: GameState,
        input: &mut TickInput,
        real_dt: f32,
        table: &TableConfig,
    ) -> GameState {
        if self.paused {
            self.accumulator = 0.0;
            input.launch = false;
            return state;
        }

        self.accumulator += real_dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            state = step(&state, input, SIM_DT, table);
            self.accumulator -= SIM_DT;
            self.ticks += 1;
            substeps += 1;

            // Clear one-shot inputs after processing
            input.launch = false;
        }
        state
    }
}
