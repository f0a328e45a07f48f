//! Pinball headless runner
//!
//! Drives the simulation at a fixed 60 Hz with a simple autopilot and
//! reports how the run went. Useful for tuning tables without a renderer.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use pinball::consts::SIM_DT;
use pinball::sim::{FixedStepper, FlipperSide, GameState, GameStatus, TickInput};
use pinball::{TableConfig, TablePreset};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a pinball table headless", long_about = None)]
struct Args {
    /// Built-in table to play (classic, arcade)
    #[arg(long, default_value_t = TablePreset::Classic)]
    table: TablePreset,
    /// Load the table from a JSON file instead of a preset
    #[arg(long)]
    table_file: Option<PathBuf>,
    /// Simulated seconds to run (stops early on game over)
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Print the selected table as JSON and exit
    #[arg(long)]
    dump_table: bool,
    /// Print the final game state as JSON
    #[arg(long)]
    json: bool,
}

fn load_table(args: &Args) -> Result<TableConfig> {
    match &args.table_file {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("read table file {:?}", path))?;
            let table = TableConfig::from_json(&json)
                .with_context(|| format!("load table file {:?}", path))?;
            log::info!("Loaded table from {:?}", path);
            Ok(table)
        }
        None => {
            log::info!("Using {} table", args.table);
            Ok(args.table.config())
        }
    }
}

/// Launch whenever waiting; hold a flipper while the ball drops near it
fn autopilot(state: &GameState, table: &TableConfig) -> TickInput {
    let near = |side: FlipperSide| {
        let pivot = table.flipper.pivot(side);
        let lane = (state.ball.pos.x - pivot.x).abs() <= table.flipper.length * 1.2;
        let height = pivot.y - state.ball.pos.y;
        lane && (-table.flipper.thickness..=table.flipper.length).contains(&height) && state.ball.vel.y > 0.0
    };
    TickInput {
        left_flip: near(FlipperSide::Left),
        right_flip: near(FlipperSide::Right),
        launch: state.status == GameStatus::Waiting,
    }
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    let args = Args::parse();
    let table = load_table(&args)?;

    if args.dump_table {
        println!("{}", table.to_json()?);
        return Ok(());
    }

    log::info!("Pinball (headless) starting: {:.1}s of play", args.seconds);

    let mut stepper = FixedStepper::new();
    let mut state = GameState::new(&table);
    let mut elapsed = 0.0;
    let mut last_lives = state.lives;
    let mut bonus_rounds = 0;
    let mut was_bonus = false;

    while elapsed < args.seconds && state.status != GameStatus::GameOver {
        let mut input = autopilot(&state, &table);
        state = stepper.advance(state, &mut input, SIM_DT, &table);
        elapsed += SIM_DT;

        if state.lives != last_lives {
            log::info!("Drained at {:.1}s, score {}, lives {}", elapsed, state.score, state.lives);
            last_lives = state.lives;
        }
        if state.bonus.active && !was_bonus {
            bonus_rounds += 1;
            log::info!("Bonus round {} at {:.1}s", bonus_rounds, elapsed);
        }
        was_bonus = state.bonus.active;
    }

    log::info!(
        "Run finished after {} ticks: score {}, lives {}, status {:?}, bonus {}",
        stepper.ticks(),
        state.score,
        state.lives,
        state.status,
        state.bonus_readout()
    );

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&state).context("serialize final state")?
        );
    } else {
        println!(
            "score {} | lives {} | {:?} | bonus rounds {} | {} ticks",
            state.score,
            state.lives,
            state.status,
            bonus_rounds,
            stepper.ticks()
        );
    }

    Ok(())
}
