//! Deterministic simulation module
//!
//! All gameplay logic lives here. Nothing in this module renders, plays sound
//! or reads the clock:
//! - Delta time is clamped before it reaches a phase simulator
//! - Seeded RNG only
//! - Profile I/O only through `ProfileStore`

pub mod collision;
pub mod controller;
pub mod input;
pub mod outcome;
pub mod runner;
pub mod snapshot;
pub mod state;
pub mod stealth;

use rand::Rng;

use crate::profile::Session;
use crate::settings::Tuning;

pub use collision::Aabb;
pub use controller::{Mode, ModeController, ModeKind, SimError};
pub use input::{Intent, TickInput};
pub use outcome::{RunEndCause, RunOutcome, RunTally, resolve};
pub use runner::{RunnerOutcome, RunnerState};
pub use snapshot::Snapshot;
pub use state::{GameEvent, ObstacleKind};
pub use stealth::{CaptureCause, StealthOutcome, StealthState};

/// Shared context a phase simulator needs besides its own state
pub struct PhaseCtx<'a, R: Rng> {
    pub session: &'a mut Session,
    pub tally: &'a mut RunTally,
    /// One-shot events for the shell, drained by the controller's owner
    pub events: &'a mut Vec<GameEvent>,
    pub rng: &'a mut R,
    pub tuning: &'a Tuning,
}
