//! Mode state machine
//!
//! Owns the current mode, the session and the seeded RNG, forwards frame
//! ticks to whichever phase simulator is active and performs every
//! transition. The active phase's state lives inside [`Mode`], so only one
//! simulator can ever be running.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::PhaseCtx;
use super::input::TickInput;
use super::outcome::{RunEndCause, RunOutcome, RunTally, resolve, total_score};
use super::runner::{self, RunnerOutcome, RunnerState};
use super::snapshot::{RunnerData, Snapshot, StealthData};
use super::state::GameEvent;
use super::stealth::{self, StealthOutcome, StealthState};
use crate::clamp_dt;
use crate::profile::{Profile, ProfileError, ProfileStore, Session};
use crate::settings::Tuning;
use crate::shop::{self, Loadout, ShopError, ShopItem};

/// Current mode, with the active phase's state
#[derive(Debug, Clone)]
pub enum Mode {
    LoggedOut,
    Menu,
    Shop,
    Stealth(StealthState),
    Runner(RunnerState),
    /// Showing the result; returns to the menu when `remaining` runs out
    RunEnded { outcome: RunOutcome, remaining: f32 },
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::LoggedOut => ModeKind::LoggedOut,
            Mode::Menu => ModeKind::Menu,
            Mode::Shop => ModeKind::Shop,
            Mode::Stealth(_) => ModeKind::Stealth,
            Mode::Runner(_) => ModeKind::Runner,
            Mode::RunEnded { .. } => ModeKind::RunEnded,
        }
    }
}

/// Mode without its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    LoggedOut,
    Menu,
    Shop,
    Stealth,
    Runner,
    RunEnded,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("cannot {action} while in {from:?}")]
    InvalidTransition { from: ModeKind, action: &'static str },
    #[error("no account is logged in")]
    NoSession,
    #[error(transparent)]
    Shop(#[from] ShopError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Phase change requested by a tick
enum Next {
    Runner,
    End(RunEndCause),
    Menu,
}

pub struct ModeController<S: ProfileStore> {
    mode: Mode,
    store: S,
    tuning: Tuning,
    rng: Pcg32,
    session: Option<Session>,
    tally: RunTally,
    events: Vec<GameEvent>,
}

impl<S: ProfileStore> ModeController<S> {
    /// Start logged out. `seed` drives every random roll.
    pub fn new(store: S, tuning: Tuning, seed: u64) -> Self {
        Self {
            mode: Mode::LoggedOut,
            store,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            session: None,
            tally: RunTally::default(),
            events: Vec::new(),
        }
    }

    pub fn mode(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn mode_state(&self) -> &Mode {
        &self.mode
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current run's accumulator
    pub fn tally(&self) -> &RunTally {
        &self.tally
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Log in to an existing account
    pub fn login(&mut self, username: &str) -> Result<(), SimError> {
        self.expect_mode(ModeKind::LoggedOut, "log in")?;
        let profile = self.store.load(username)?;
        self.begin_session(username, profile);
        Ok(())
    }

    /// Create an account and log in to it
    pub fn signup(&mut self, username: &str) -> Result<(), SimError> {
        self.expect_mode(ModeKind::LoggedOut, "sign up")?;
        let profile = self.store.create(username)?;
        log::info!("Created account {}", username);
        self.begin_session(username, profile);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), SimError> {
        self.expect_mode(ModeKind::Menu, "log out")?;
        let mut session = self.session.take().ok_or(SimError::NoSession)?;
        session.profile.session_active = false;
        save(&mut self.store, &session);
        log::info!("{} logged out", session.username);
        self.mode = Mode::LoggedOut;
        Ok(())
    }

    pub fn open_shop(&mut self) -> Result<(), SimError> {
        self.expect_mode(ModeKind::Menu, "open the shop")?;
        self.mode = Mode::Shop;
        Ok(())
    }

    pub fn close_shop(&mut self) -> Result<(), SimError> {
        self.expect_mode(ModeKind::Shop, "close the shop")?;
        self.mode = Mode::Menu;
        Ok(())
    }

    /// Buy an item and persist the profile
    pub fn purchase(&mut self, id: &str) -> Result<&'static ShopItem, SimError> {
        self.expect_mode(ModeKind::Shop, "buy")?;
        let session = self.session.as_mut().ok_or(SimError::NoSession)?;
        let item = shop::purchase(&mut session.profile, id)?;
        save(&mut self.store, session);
        self.events.push(GameEvent::Purchase);
        log::info!(
            "{} bought {} for {} (balance {})",
            session.username,
            item.id,
            item.cost,
            session.profile.coins
        );
        Ok(item)
    }

    /// Equip an owned cosmetic and persist the profile
    pub fn equip(&mut self, id: &str) -> Result<(), SimError> {
        self.expect_mode(ModeKind::Shop, "equip")?;
        let session = self.session.as_mut().ok_or(SimError::NoSession)?;
        shop::equip(&mut session.profile, id)?;
        save(&mut self.store, session);
        Ok(())
    }

    /// Menu -> Stealth with a fresh arena and tally
    pub fn start_run(&mut self) -> Result<(), SimError> {
        self.expect_mode(ModeKind::Menu, "start a run")?;
        let session = self.session.as_ref().ok_or(SimError::NoSession)?;
        let loadout = Loadout::from_profile(&session.profile);
        self.tally = RunTally::default();
        self.mode = Mode::Stealth(StealthState::new(&self.tuning.stealth, &loadout, &mut self.rng));
        log::info!("{} started a run ({:?})", session.username, loadout);
        Ok(())
    }

    /// Drop the current run without paying it out
    pub fn abort_to_menu(&mut self) -> Result<(), SimError> {
        match self.mode.kind() {
            ModeKind::Stealth | ModeKind::Runner => {
                log::info!("Run aborted from {:?}", self.mode.kind());
                self.mode = Mode::Menu;
                Ok(())
            }
            from => Err(SimError::InvalidTransition {
                from,
                action: "abort a run",
            }),
        }
    }

    /// Advance one frame. `raw_dt` is clamped before use.
    ///
    /// Runner lane switches consume `left`/`right` from `input`.
    pub fn tick(&mut self, input: &mut TickInput, raw_dt: f32) -> Result<ModeKind, SimError> {
        let dt = clamp_dt(raw_dt);

        let next = match &mut self.mode {
            Mode::Stealth(state) => {
                let session = self.session.as_mut().ok_or(SimError::NoSession)?;
                let mut ctx = PhaseCtx {
                    session,
                    tally: &mut self.tally,
                    events: &mut self.events,
                    rng: &mut self.rng,
                    tuning: &self.tuning,
                };
                match stealth::tick(state, input, dt, &mut ctx) {
                    StealthOutcome::Continue => None,
                    StealthOutcome::Captured(cause) => {
                        log::info!("Captured ({:?}) after {} ticks", cause, state.time_ticks);
                        Some(Next::End(RunEndCause::Captured))
                    }
                    StealthOutcome::VehicleStolen => Some(Next::Runner),
                }
            }
            Mode::Runner(state) => {
                let session = self.session.as_mut().ok_or(SimError::NoSession)?;
                let mut ctx = PhaseCtx {
                    session,
                    tally: &mut self.tally,
                    events: &mut self.events,
                    rng: &mut self.rng,
                    tuning: &self.tuning,
                };
                match runner::tick(state, input, dt, &mut ctx) {
                    RunnerOutcome::Continue => None,
                    RunnerOutcome::Crashed => {
                        log::info!("Crashed at speed {:.0}", state.scroll_speed);
                        Some(Next::End(RunEndCause::Crashed))
                    }
                }
            }
            Mode::RunEnded { remaining, .. } => {
                *remaining -= dt;
                (*remaining <= 0.0).then_some(Next::Menu)
            }
            Mode::LoggedOut | Mode::Menu | Mode::Shop => None,
        };

        match next {
            Some(Next::Runner) => {
                self.mode = Mode::Runner(RunnerState::new(&self.tuning.runner));
                self.events.push(GameEvent::Engine);
                log::info!("Van stolen, runner phase started");
            }
            Some(Next::End(cause)) => self.finish_run(cause)?,
            Some(Next::Menu) => self.mode = Mode::Menu,
            None => {}
        }
        Ok(self.mode.kind())
    }

    /// Build the read-only view of the current frame
    pub fn snapshot(&self) -> Snapshot {
        let fallback = Profile::default();
        let profile = self.session.as_ref().map_or(&fallback, |s| &s.profile);
        let in_run = matches!(self.mode, Mode::Stealth(_) | Mode::Runner(_) | Mode::RunEnded { .. });

        Snapshot {
            mode: self.mode.kind(),
            username: self.session.as_ref().map(|s| s.username.clone()),
            coins: profile.coins,
            highscore: profile.highscore,
            score: if in_run { total_score(&self.tally) } else { 0 },
            stealth: match &self.mode {
                Mode::Stealth(state) => Some(StealthData::new(state, profile)),
                _ => None,
            },
            runner: match &self.mode {
                Mode::Runner(state) => Some(RunnerData::new(state, profile)),
                _ => None,
            },
            outcome: match &self.mode {
                Mode::RunEnded { outcome, .. } => Some(outcome.clone()),
                _ => None,
            },
        }
    }

    /// Pay out the run and show the result
    fn finish_run(&mut self, cause: RunEndCause) -> Result<(), SimError> {
        let session = self.session.as_mut().ok_or(SimError::NoSession)?;
        self.mode = match resolve(&mut self.tally, cause, session, &mut self.store, &self.tuning.reward) {
            Some(outcome) => Mode::RunEnded {
                outcome,
                remaining: self.tuning.reward.end_screen_secs,
            },
            None => Mode::Menu,
        };
        Ok(())
    }

    fn begin_session(&mut self, username: &str, mut profile: Profile) {
        profile.session_active = true;
        let session = Session::new(username, profile);
        save(&mut self.store, &session);
        log::info!(
            "{} logged in ({} coins, best {})",
            username,
            session.profile.coins,
            session.profile.highscore
        );
        self.session = Some(session);
        self.mode = Mode::Menu;
    }

    fn expect_mode(&self, expected: ModeKind, action: &'static str) -> Result<(), SimError> {
        let from = self.mode.kind();
        if from == expected {
            Ok(())
        } else {
            Err(SimError::InvalidTransition { from, action })
        }
    }
}

/// Save, logging instead of failing
fn save(store: &mut impl ProfileStore, session: &Session) {
    if let Err(e) = store.save(&session.username, &session.profile) {
        log::warn!("Failed to save profile for {}: {}", session.username, e);
    }
}
