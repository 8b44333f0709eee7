//! Stealth phase: sneak past the patrolling workers and steal the van

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::PhaseCtx;
use super::collision::within;
use super::input::TickInput;
use super::state::{GameEvent, Player, Pursuer, PursuitChange, StealthVehicle};
use crate::settings::StealthTuning;
use crate::shop::Loadout;

/// How the player got caught
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureCause {
    /// A pursuer walked into the player
    Contact,
    /// A pursuer in detection range made the catch
    Spotted,
}

/// Result of one stealth tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StealthOutcome {
    Continue,
    Captured(CaptureCause),
    /// Van taken; the runner phase should start
    VehicleStolen,
}

/// Everything that exists only while sneaking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StealthState {
    pub player: Player,
    pub pursuers: Vec<Pursuer>,
    pub vehicle: StealthVehicle,
    pub time_ticks: u64,
}

impl StealthState {
    /// Fresh arena: player at the start, pursuers scattered, van parked
    pub fn new(tuning: &StealthTuning, loadout: &Loadout, rng: &mut impl Rng) -> Self {
        let pursuers = (0..tuning.pursuer_count)
            .map(|_| Pursuer::spawn(rng, tuning))
            .collect();
        Self {
            player: Player::new(tuning, loadout),
            pursuers,
            vehicle: StealthVehicle::default(),
            time_ticks: 0,
        }
    }

    /// Any pursuer currently chasing
    pub fn alarm_raised(&self) -> bool {
        self.pursuers.iter().any(|p| p.chasing)
    }
}

/// Advance the stealth phase by one frame
pub fn tick<R: Rng>(
    state: &mut StealthState,
    input: &TickInput,
    dt: f32,
    ctx: &mut PhaseCtx<'_, R>,
) -> StealthOutcome {
    let tuning = &ctx.tuning.stealth;
    state.time_ticks += 1;

    // Player
    state.player.update(input, dt, tuning);
    ctx.tally.stealth_score = state.player.score;

    // Pursuers
    let player_pos = state.player.pos;
    let detection_radius = state.player.detection_radius;
    for (i, pursuer) in state.pursuers.iter_mut().enumerate() {
        match pursuer.update(player_pos, detection_radius, dt, tuning, &mut *ctx.rng) {
            PursuitChange::Engaged => log::debug!("Pursuer {} started chasing", i),
            PursuitChange::Disengaged => log::debug!("Pursuer {} lost the player", i),
            PursuitChange::None => {}
        }
    }
    state.vehicle.update(dt);

    // Capture: hard contact first, then the softer detection roll
    if state
        .pursuers
        .iter()
        .any(|p| within(p.pos, player_pos, tuning.contact_radius))
    {
        ctx.events.push(GameEvent::Capture);
        return StealthOutcome::Captured(CaptureCause::Contact);
    }
    let capture_radius = state.player.capture_radius;
    for pursuer in &state.pursuers {
        if pursuer.pos.distance(player_pos) <= capture_radius
            && ctx.rng.random_bool(tuning.capture_chance)
        {
            ctx.events.push(GameEvent::Capture);
            return StealthOutcome::Captured(CaptureCause::Spotted);
        }
    }

    // Theft
    if state.vehicle.can_steal(player_pos, tuning.theft_radius) {
        state.vehicle.stolen = true;
        ctx.session.profile.credit(tuning.theft_bonus);
        ctx.tally.coins_collected += tuning.theft_bonus;
        ctx.events.push(GameEvent::Theft);
        log::info!(
            "Van stolen after {} ticks (+{} coins)",
            state.time_ticks,
            tuning.theft_bonus
        );
        return StealthOutcome::VehicleStolen;
    }

    StealthOutcome::Continue
}
