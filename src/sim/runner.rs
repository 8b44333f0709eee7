//! Runner phase: drive the stolen van down a three-lane road
//!
//! Scroll speed ramps up forever and drives everything else: distance score,
//! how fast obstacles fall and how often new ones appear.

use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use super::PhaseCtx;
use super::input::{Intent, TickInput};
use super::state::{
    COIN_REMOVAL_Y, COIN_TRAIL_GAP, Collectible, GameEvent, OBSTACLE_REMOVAL_Y,
    OBSTACLE_SPAWN_DEPTH, Obstacle, ObstacleKind, RunnerVehicle,
};
use crate::consts::LANES;
use crate::settings::{RunnerTuning, Tuning};
use crate::shop::Loadout;

/// Result of one runner tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerOutcome {
    Continue,
    Crashed,
}

/// Everything that exists only while driving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerState {
    pub vehicle: RunnerVehicle,
    pub obstacles: Vec<Obstacle>,
    pub collectibles: Vec<Collectible>,
    /// Pixels per second everything falls at
    pub scroll_speed: f32,
    /// Seconds since the last spawn
    pub spawn_timer: f32,
    pub distance_score: f32,
    pub time_ticks: u64,
}

impl RunnerState {
    pub fn new(tuning: &RunnerTuning) -> Self {
        Self {
            vehicle: RunnerVehicle::default(),
            obstacles: Vec::new(),
            collectibles: Vec::new(),
            scroll_speed: tuning.start_speed,
            spawn_timer: 0.0,
            distance_score: 0.0,
            time_ticks: 0,
        }
    }

    /// Strict box overlap between the van and any obstacle
    pub fn hits_obstacle(&self) -> bool {
        let van = self.vehicle.bbox();
        self.obstacles.iter().any(|ob| van.overlaps(&ob.bbox()))
    }

    /// Drop an obstacle (and maybe a trailing coin) into a random lane
    pub fn spawn(&mut self, tuning: &RunnerTuning, rng: &mut impl Rng) {
        let lane = rng.random_range(0..LANES);
        let kind = match WeightedIndex::new(tuning.kind_weights) {
            Ok(dist) => ObstacleKind::ALL[rng.sample(dist)],
            Err(e) => {
                log::warn!("Bad obstacle weights {:?} ({}), spawning a worker", tuning.kind_weights, e);
                ObstacleKind::Worker
            }
        };
        let y = -(rng.random_range(OBSTACLE_SPAWN_DEPTH.0..=OBSTACLE_SPAWN_DEPTH.1) as f32);
        self.obstacles.push(Obstacle { lane, kind, y });

        let with_coin = rng.random_bool(tuning.coin_chance);
        if with_coin {
            self.collectibles.push(Collectible::new(lane, y - COIN_TRAIL_GAP));
        }
        log::debug!("Spawned {:?} in lane {} (coin: {})", kind, lane, with_coin);
    }

    /// Move everything down and forget what fell off the bottom
    fn scroll(&mut self, dt: f32) {
        let dy = self.scroll_speed * dt;
        for ob in &mut self.obstacles {
            ob.y += dy;
        }
        for coin in &mut self.collectibles {
            coin.y += dy;
            coin.anim.advance(dt);
        }
        self.obstacles.retain(|ob| ob.y <= OBSTACLE_REMOVAL_Y);
        self.collectibles.retain(|c| c.y <= COIN_REMOVAL_Y);
    }
}

/// Advance the runner phase by one frame.
///
/// Lane switches consume `left`/`right` from `input`.
pub fn tick<R: Rng>(
    state: &mut RunnerState,
    input: &mut TickInput,
    dt: f32,
    ctx: &mut PhaseCtx<'_, R>,
) -> RunnerOutcome {
    let tuning: &Tuning = ctx.tuning;
    let runner = &tuning.runner;
    state.time_ticks += 1;

    // Difficulty ramp and distance
    state.scroll_speed += runner.speed_ramp * dt;
    state.distance_score += dt * (state.scroll_speed / runner.distance_divisor);
    ctx.tally.distance_score = state.distance_score;

    // Spawning
    state.spawn_timer += dt;
    if state.spawn_timer >= tuning.spawn_interval(state.scroll_speed) {
        state.spawn(runner, &mut *ctx.rng);
        state.spawn_timer = 0.0;
    }

    state.scroll(dt);

    // Lane input (edge triggered)
    if input.take(Intent::Left) {
        state.vehicle.shift(-1);
    }
    if input.take(Intent::Right) {
        state.vehicle.shift(1);
    }
    state.vehicle.update(dt);

    // Collisions
    if state.hits_obstacle() {
        ctx.events.push(GameEvent::Crash);
        return RunnerOutcome::Crashed;
    }

    let van = state.vehicle.bbox();
    let before = state.collectibles.len();
    state.collectibles.retain(|c| !van.overlaps(&c.bbox()));
    let picked = (before - state.collectibles.len()) as u64;
    if picked > 0 {
        let multiplier = Loadout::from_profile(&ctx.session.profile).coin_multiplier;
        let gained = picked.saturating_mul(runner.coin_value).saturating_mul(multiplier);
        ctx.session.profile.credit(gained);
        ctx.tally.coins_collected = ctx.tally.coins_collected.saturating_add(gained);
        for _ in 0..picked {
            ctx.events.push(GameEvent::Coin);
        }
    }

    RunnerOutcome::Continue
}
