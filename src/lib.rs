//! Van Snatcher - sneak up on a delivery van, steal it, then outrun the road
//!
//! Core modules:
//! - `sim`: Simulation (stealth phase, runner phase, run outcome, mode controller)
//! - `profile`: Per-account progress and the profile store seam
//! - `shop`: Catalog, purchases, upgrade modifiers and cosmetic tints
//! - `settings`: Data-driven game balance (`Tuning`)
//! - `audio`: Sound cues for simulation events

pub mod audio;
pub mod profile;
pub mod settings;
pub mod shop;
pub mod sim;

pub use profile::{JsonFileStore, MemoryStore, Profile, ProfileError, ProfileStore, Session};
pub use settings::{Tuning, TuningError};
pub use shop::{Loadout, ShopError, Tintable};
pub use sim::{GameEvent, ModeController, ModeKind, SimError, Snapshot, TickInput};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Frame rate that per-frame speeds are expressed in
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Delta-time clamp (seconds) applied to every frame
    pub const MIN_DT: f32 = 1.0 / 1000.0;
    pub const MAX_DT: f32 = 1.0 / 30.0;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 1000.0;
    pub const ARENA_HEIGHT: f32 = 640.0;

    /// Stealth player footprint (used for clamping)
    pub const PLAYER_WIDTH: f32 = 64.0;
    pub const PLAYER_HEIGHT: f32 = 80.0;
    /// Pursuer and parked van sprite size
    pub const SPRITE_SIZE: f32 = 64.0;

    /// Runner road layout
    pub const LANES: usize = 3;
    pub const ROAD_WIDTH: f32 = 600.0;
    /// Vertical centre of the runner van
    pub const RUNNER_BASE_Y: f32 = ARENA_HEIGHT - 120.0;
    pub const RUNNER_VAN_WIDTH: f32 = 120.0;
    pub const RUNNER_VAN_HEIGHT: f32 = 84.0;
}

/// Clamp a raw frame delta into the range the simulation accepts
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_nan() {
        return consts::MIN_DT;
    }
    dt.clamp(consts::MIN_DT, consts::MAX_DT)
}

/// Horizontal centre of a runner lane
#[inline]
pub fn lane_center_x(lane: usize) -> f32 {
    use consts::*;
    let left = (ARENA_WIDTH / 2.0 - ROAD_WIDTH / 2.0).floor();
    let step = (ROAD_WIDTH / (LANES as f32 + 1.0)).floor();
    left + step * (lane as f32 + 1.0)
}

/// Step `from` toward `to` by at most `step`, stopping on the target
#[inline]
pub fn step_toward(from: Vec2, to: Vec2, step: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= step || dist == 0.0 {
        to
    } else {
        from + delta / dist * step
    }
}
