//! Fixed timestep simulation tick
//!
//! `step` is a pure transform `(GameState, TickInput, dt) -> GameState`. The
//! order of the passes below decides which collisions can stack within one
//! tick, so it must not be shuffled.

use super::collision::{self, clamp_to_walls};
use super::state::{FlipperSide, GameState, GameStatus};
use crate::table::TableConfig;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Left flipper button held
    pub left_flip: bool,
    /// Right flipper button held
    pub right_flip: bool,
    /// Launch requested (consumed by the waiting -> playing transition)
    pub launch: bool,
}

impl TickInput {
    pub fn flip_held(&self, side: FlipperSide) -> bool {
        match side {
            FlipperSide::Left => self.left_flip,
            FlipperSide::Right => self.right_flip,
        }
    }
}

/// Advance the game by one fixed timestep, returning the next snapshot
pub fn step(state: &GameState, input: &TickInput, dt: f32, table: &TableConfig) -> GameState {
    let mut next = state.clone();

    // Flippers settle in every status, including game over
    update_flippers(&mut next, input, dt, table);
    update_taunt(&mut next, dt);

    match next.status {
        GameStatus::GameOver => return next,
        GameStatus::Waiting => {
            if input.launch {
                next.launch(table);
                log::debug!("Ball launched (lives: {})", next.lives);
            }
            return next;
        }
        GameStatus::Playing => {}
    }

    next.ball.integrate(table.gravity, table.max_speed, dt);
    clamp_to_walls(&mut next.ball, table);

    let ball_radius = table.ball_radius;

    for curve in &table.curves {
        collision::resolve(&mut next.ball, curve, ball_radius, curve.restitution());
    }

    for i in 0..next.bumpers.len() {
        if collision::resolve(&mut next.ball, &next.bumpers[i], ball_radius, table.bumper_boost) {
            let points = next.bumpers[i].score;
            log::trace!("Bumper {} hit (+{})", next.bumpers[i].id, points);
            next.add_score(points);
        }
    }

    handle_valves(&mut next, table);

    for side in [FlipperSide::Left, FlipperSide::Right] {
        let blade = next
            .flippers
            .get(side)
            .blade(table.flipper.pivot(side), &table.flipper);
        collision::resolve_flipper(
            &mut next.ball,
            &blade,
            input.flip_held(side),
            &table.flipper,
            ball_radius,
        );
    }

    for guide in &table.guides {
        collision::resolve(&mut next.ball, guide, ball_radius, guide.restitution());
    }

    sweep_sensors(&mut next, SensorBank::Targets, dt, table);
    sweep_sensors(&mut next, SensorBank::Ports, dt, table);

    update_bonus(&mut next, dt);
    handle_drain(&mut next, table);

    next
}

fn update_flippers(state: &mut GameState, input: &TickInput, dt: f32, table: &TableConfig) {
    let max_step = table.flipper.angular_speed * dt;
    let left_target = table.flipper.target_angle(FlipperSide::Left, input.left_flip);
    let right_target = table.flipper.target_angle(FlipperSide::Right, input.right_flip);
    state.flippers.left.settle_toward(left_target, max_step);
    state.flippers.right.settle_toward(right_target, max_step);
}

fn update_taunt(state: &mut GameState, dt: f32) {
    if !state.taunt.active {
        return;
    }
    state.taunt.timer -= dt;
    if state.taunt.timer > 0.0 {
        return;
    }
    state.taunt.active = false;
    state.taunt.timer = 0.0;
}

/// Valves light on their first bounce; lighting the last one starts bonus mode
fn handle_valves(state: &mut GameState, table: &TableConfig) {
    for i in 0..state.valves.len() {
        if state.valves[i].lit {
            continue;
        }
        if collision::resolve(
            &mut state.ball,
            &state.valves[i].feature,
            table.ball_radius,
            table.valve_boost,
        ) {
            state.valves[i].lit = true;
            let points = state.valves[i].feature.score;
            log::trace!("Valve {} lit (+{})", state.valves[i].feature.id, points);
            state.add_score(points);
        }
    }

    if state.all_valves_lit() && !state.bonus.active {
        state.bonus.active = true;
        state.bonus.timer = table.bonus_duration;
        // Awarded with the multiplier already in effect
        state.add_score(table.bonus_award);
        log::debug!(
            "Bonus mode started: x{} for {}s",
            state.bonus.multiplier,
            table.bonus_duration
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum SensorBank {
    Targets,
    Ports,
}

/// Tick sensor cooldowns and score the ones the ball is touching
fn sweep_sensors(state: &mut GameState, bank: SensorBank, dt: f32, table: &TableConfig) {
    let (sensors, cooldown) = match bank {
        SensorBank::Targets => (&mut state.targets, table.target_cooldown),
        SensorBank::Ports => (&mut state.ports, table.port_cooldown),
    };

    let mut awarded = Vec::new();
    for sensor in sensors.iter_mut() {
        sensor.cooldown = (sensor.cooldown - dt).max(0.0);
        if !collision::sense(&mut state.ball, &sensor.feature, table.ball_radius) {
            continue;
        }
        if sensor.cooldown <= 0.0 {
            log::trace!("{:?} sensor {} hit (+{})", bank, sensor.feature.id, sensor.feature.score);
            awarded.push(sensor.feature.score);
            sensor.cooldown = cooldown;
        }
    }

    for points in awarded {
        state.add_score(points);
    }
}

fn update_bonus(state: &mut GameState, dt: f32) {
    if !state.bonus.active {
        return;
    }
    state.bonus.timer -= dt;
    if state.bonus.timer > 0.0 {
        return;
    }
    state.bonus.active = false;
    state.bonus.timer = 0.0;
    for valve in &mut state.valves {
        valve.lit = false;
    }
    log::debug!("Bonus mode ended, valves reset");
}

/// Lose a life once the ball's top edge passes the drain line
fn handle_drain(state: &mut GameState, table: &TableConfig) {
    if state.ball.pos.y - table.ball_radius < table.drain_y {
        return;
    }

    state.lives = state.lives.saturating_sub(1);
    if let Some(duration) = table.taunt_duration {
        state.taunt.active = true;
        state.taunt.timer = duration;
    }

    if state.lives == 0 {
        state.status = GameStatus::GameOver;
        log::debug!("Game over with score {}", state.score);
    } else {
        state.reset_ball(table);
        state.status = GameStatus::Waiting;
        log::debug!("Ball drained, {} lives left", state.lives);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::direction;
    use crate::sim::state::Ball;
    use glam::Vec2;
    use proptest::prelude::*;

    fn playing(table: &TableConfig) -> GameState {
        let mut state = GameState::new(table);
        state.status = GameStatus::Playing;
        state
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_gravity_accelerates_free_ball() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        state.ball = Ball::at_rest(Vec2::new(200.0, 200.0));

        for _ in 0..10 {
            let next = step(&state, &idle(), SIM_DT, &table);
            assert!(next.ball.vel.y > state.ball.vel.y);
            assert!(next.ball.pos.y > state.ball.pos.y);
            state = next;
        }
    }

    #[test]
    fn test_gravity_applied_before_translation() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        state.ball = Ball::at_rest(Vec2::new(200.0, 200.0));

        let next = step(&state, &idle(), 1.0, &table);
        assert_eq!(next.ball.vel.y, 360.0);
        assert_eq!(next.ball.pos.y, 560.0);
    }

    #[test]
    fn test_left_wall_bounce() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        let left = table.wall_inset + table.ball_radius;
        state.ball.pos = Vec2::new(left + 1.0, 200.0);
        state.ball.vel = Vec2::new(-200.0, 0.0);

        let next = step(&state, &idle(), 0.05, &table);
        assert!(next.ball.vel.x > 0.0);
        assert!(next.ball.pos.x >= left);
    }

    #[test]
    fn test_bumper_scores_and_reflects() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        let bumper = state.bumpers[0].clone();
        state.ball.pos = Vec2::new(bumper.pos.x - bumper.radius - table.ball_radius + 1.0, bumper.pos.y);
        state.ball.vel = Vec2::new(180.0, 0.0);

        let next = step(&state, &idle(), SIM_DT, &table);
        assert_eq!(next.score, u64::from(bumper.score));
        assert!(next.ball.vel.x < 0.0);
    }

    #[test]
    fn test_bonus_doubles_identical_hit() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        let bumper = state.bumpers[0].clone();
        state.ball.pos = Vec2::new(bumper.pos.x - bumper.radius - table.ball_radius + 1.0, bumper.pos.y);
        state.ball.vel = Vec2::new(180.0, 0.0);

        let plain = step(&state, &idle(), SIM_DT, &table);

        let mut boosted = state.clone();
        boosted.bonus.active = true;
        boosted.bonus.timer = table.bonus_duration;
        let boosted = step(&boosted, &idle(), SIM_DT, &table);

        assert_eq!(boosted.score, plain.score * u64::from(table.bonus_multiplier));
    }

    fn hit_every_valve(table: &TableConfig) -> GameState {
        let mut state = playing(table);
        for i in 0..state.valves.len() {
            let valve = state.valves[i].feature.clone();
            state.ball.pos = Vec2::new(valve.pos.x - valve.radius - table.ball_radius + 1.0, valve.pos.y);
            state.ball.vel = Vec2::new(160.0, 0.0);
            state = step(&state, &idle(), SIM_DT, table);
        }
        state
    }

    #[test]
    fn test_all_valves_start_bonus_once() {
        let table = TableConfig::classic();
        let state = hit_every_valve(&table);

        assert!(state.valves.iter().all(|v| v.lit));
        assert!(state.bonus.active);
        assert!((state.bonus.timer - (table.bonus_duration - SIM_DT)).abs() < 1e-4);
        let valve_points: u64 = table.valves.iter().map(|v| u64::from(v.score)).sum();
        let award = u64::from(table.bonus_award * table.bonus_multiplier);
        assert_eq!(state.score, valve_points + award);

        // Still all lit on the next tick, but no second award
        let mut quiet = state.clone();
        quiet.ball = Ball::at_rest(Vec2::new(100.0, 200.0));
        let next = step(&quiet, &idle(), SIM_DT, &table);
        assert_eq!(next.score, state.score);
        assert!(next.bonus.active);
    }

    #[test]
    fn test_bonus_expiry_unlights_valves() {
        let table = TableConfig::classic();
        let mut state = hit_every_valve(&table);
        state.ball = Ball::at_rest(Vec2::new(100.0, 200.0));
        state.bonus.timer = SIM_DT / 2.0;

        let next = step(&state, &idle(), SIM_DT, &table);
        assert!(!next.bonus.active);
        assert_eq!(next.bonus.timer, 0.0);
        assert!(next.valves.iter().all(|v| !v.lit));
    }

    #[test]
    fn test_lit_valve_is_not_solid() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        state.valves[0].lit = true;
        let valve = state.valves[0].feature.clone();
        state.ball.pos = Vec2::new(valve.pos.x - valve.radius - table.ball_radius + 1.0, valve.pos.y);
        state.ball.vel = Vec2::new(160.0, 0.0);

        let next = step(&state, &idle(), SIM_DT, &table);
        assert!(next.ball.vel.x > 0.0);
        assert_eq!(next.score, 0);
    }

    #[test]
    fn test_drain_last_life_is_game_over() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        state.lives = 1;
        state.ball.pos.y = table.drain_y + table.ball_radius + 2.0;
        state.ball.vel = Vec2::ZERO;

        let next = step(&state, &idle(), SIM_DT, &table);
        assert_eq!(next.lives, 0);
        assert_eq!(next.status, GameStatus::GameOver);
        assert!(next.taunt.active);
    }

    #[test]
    fn test_drain_with_lives_left_resets_ball() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        state.score = 1234;
        state.ball.pos = Vec2::new(300.0, table.drain_y + table.ball_radius + 2.0);
        state.ball.vel = Vec2::new(40.0, 300.0);

        let next = step(&state, &idle(), SIM_DT, &table);
        assert_eq!(next.lives, table.lives - 1);
        assert_eq!(next.status, GameStatus::Waiting);
        assert_eq!(next.ball, Ball::at_rest(table.launch_position));
        assert_eq!(next.score, 1234);
        assert_eq!(next.taunt.timer, 1.6);
    }

    #[test]
    fn test_drain_without_taunt_table() {
        let table = TableConfig::arcade();
        let mut state = playing(&table);
        state.ball.pos = Vec2::new(280.0, table.drain_y + table.ball_radius + 2.0);

        let next = step(&state, &idle(), SIM_DT, &table);
        assert_eq!(next.status, GameStatus::Waiting);
        assert!(!next.taunt.active);
    }

    #[test]
    fn test_taunt_counts_down_in_any_status() {
        let table = TableConfig::classic();
        let mut state = GameState::new(&table);
        state.status = GameStatus::GameOver;
        state.lives = 0;
        state.taunt.active = true;
        state.taunt.timer = 2.5 * SIM_DT;

        let next = step(&state, &idle(), SIM_DT, &table);
        assert!(next.taunt.active);
        let next = step(&next, &idle(), SIM_DT, &table);
        let next = step(&next, &idle(), SIM_DT, &table);
        assert!(!next.taunt.active);
        assert_eq!(next.taunt.timer, 0.0);
    }

    #[test]
    fn test_waiting_launch() {
        let table = TableConfig::classic();
        let state = GameState::new(&table);

        let held = step(&state, &idle(), SIM_DT, &table);
        assert_eq!(held.status, GameStatus::Waiting);
        assert_eq!(held.ball, state.ball);

        let launch = TickInput {
            launch: true,
            ..Default::default()
        };
        let launched = step(&state, &launch, SIM_DT, &table);
        assert_eq!(launched.status, GameStatus::Playing);
        assert_eq!(launched.ball.pos, table.launch_position);
        assert_eq!(launched.ball.vel, Vec2::new(-table.launch_side_kick, table.launch_speed));

        // Launch has no effect once playing
        let again = step(&launched, &launch, SIM_DT, &table);
        assert!(again.ball.vel.y > launched.ball.vel.y);
    }

    #[test]
    fn test_flippers_settle_after_game_over() {
        let table = TableConfig::classic();
        let mut state = GameState::new(&table);
        state.status = GameStatus::GameOver;
        state.lives = 0;
        state.flippers.left.angle = table.flipper.left_active;

        let next = step(&state, &idle(), SIM_DT, &table);
        let max_step = table.flipper.angular_speed * SIM_DT;
        assert!((next.flippers.left.angle - (table.flipper.left_active + max_step)).abs() < 1e-5);
        assert_eq!(next.ball, state.ball);
    }

    #[test]
    fn test_flipper_reaches_active_angle() {
        let table = TableConfig::classic();
        let mut state = GameState::new(&table);
        let input = TickInput {
            right_flip: true,
            ..Default::default()
        };
        for _ in 0..10 {
            state = step(&state, &input, SIM_DT, &table);
        }
        assert!((state.flippers.right.angle - table.flipper.right_active).abs() < 1e-5);
        assert_eq!(state.flippers.left.angle, table.flipper.left_rest);
    }

    #[test]
    fn test_resting_flipper_bounces_ball_up() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        let blade = state
            .flippers
            .left
            .blade(table.flipper.left_pivot, &table.flipper);
        let mid = (blade.start + blade.end) / 2.0;
        let up = (blade.end - blade.start).normalize().perp() * -1.0;
        state.ball.pos = mid + up * 12.0;
        state.ball.vel = Vec2::new(0.0, 300.0);

        let next = step(&state, &idle(), SIM_DT, &table);
        assert!(next.ball.vel.y < 0.0);
        assert_eq!(next.score, 0);
    }

    #[test]
    fn test_target_cooldown_throttles_scoring() {
        let table = TableConfig::classic();
        let mut state = playing(&table);
        let target = state.targets[0].feature.clone();
        let inside = Ball::at_rest(target.pos - Vec2::new(0.0, 20.0));
        state.ball = inside;

        let first = step(&state, &idle(), SIM_DT, &table);
        assert_eq!(first.score, u64::from(target.score));
        assert_eq!(first.targets[0].cooldown, table.target_cooldown);
        assert!((first.ball.pos - target.pos).length() > target.radius + table.ball_radius);

        let mut again = first.clone();
        again.ball = inside;
        let second = step(&again, &idle(), SIM_DT, &table);
        assert_eq!(second.score, first.score);
    }

    #[test]
    fn test_curve_rail_only_deflects_within_span() {
        let table = TableConfig::arcade();
        let curve = table.curves[0].clone();
        let reach = curve.radius + table.ball_radius;

        let mut state = playing(&table);
        let inside_span = direction(0.8);
        state.ball.pos = curve.center + inside_span * (reach - 1.0);
        state.ball.vel = -inside_span * 200.0;
        let next = step(&state, &idle(), SIM_DT, &table);
        assert!(next.ball.vel.dot(inside_span) > 0.0);

        let mut state = playing(&table);
        let outside_span = direction(-1.6);
        state.ball.pos = curve.center + outside_span * (reach - 1.0);
        state.ball.vel = -outside_span * 200.0;
        let next = step(&state, &idle(), SIM_DT, &table);
        assert!(next.ball.vel.dot(outside_span) < 0.0);
    }

    #[test]
    fn test_step_leaves_previous_snapshot_untouched() {
        let table = TableConfig::classic();
        let state = hit_every_valve(&table);
        let before = state.clone();
        let mut next = step(&state, &idle(), SIM_DT, &table);
        next.valves[0].lit = false;
        next.targets[0].cooldown = 9.0;
        assert_eq!(state, before);
    }

    #[test]
    fn test_determinism() {
        let table = TableConfig::arcade();
        let inputs = [
            TickInput {
                launch: true,
                ..Default::default()
            },
            TickInput {
                left_flip: true,
                ..Default::default()
            },
            TickInput::default(),
            TickInput {
                right_flip: true,
                ..Default::default()
            },
        ];

        let mut a = GameState::new(&table);
        let mut b = GameState::new(&table);
        for _ in 0..60 {
            for input in &inputs {
                a = step(&a, input, SIM_DT, &table);
                b = step(&b, input, SIM_DT, &table);
            }
        }
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_game_over_is_frozen(
            left in any::<bool>(),
            right in any::<bool>(),
            launch in any::<bool>(),
            ticks in 1usize..30,
        ) {
            let table = TableConfig::classic();
            let mut state = GameState::new(&table);
            state.status = GameStatus::GameOver;
            state.lives = 0;
            state.score = 777;
            state.ball.pos.y = table.drain_y + 20.0;
            let start = state.clone();
            let input = TickInput { left_flip: left, right_flip: right, launch };

            for _ in 0..ticks {
                state = step(&state, &input, SIM_DT, &table);
            }
            prop_assert_eq!(state.status, GameStatus::GameOver);
            prop_assert_eq!(state.score, start.score);
            prop_assert_eq!(state.lives, start.lives);
            prop_assert_eq!(state.ball, start.ball);
        }

        #[test]
        fn prop_ball_never_leaves_side_walls(
            x in 30.0f32..570.0,
            y in 40.0f32..760.0,
            vx in -1100.0f32..1100.0,
            vy in -1100.0f32..1100.0,
        ) {
            let table = TableConfig::classic();
            let mut state = playing(&table);
            state.ball = Ball { pos: Vec2::new(x, y), vel: Vec2::new(vx, vy) };
            let next = step(&state, &idle(), SIM_DT, &table);
            let left = table.wall_inset + table.ball_radius;
            let right = table.width - table.wall_inset - table.ball_radius;
            prop_assert!(next.ball.pos.x >= left);
            prop_assert!(next.ball.pos.x <= right);
        }
    }
}
