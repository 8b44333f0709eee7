//! Van Snatcher headless driver
//!
//! Runs the simulation at a fixed 60 Hz with a simple autopilot instead of a
//! keyboard. Profiles persist in `users.json`; balance can be overridden with
//! `tuning.json`.
//!
//! Usage: `van-snatcher [username] [runs]`

use std::path::Path;

use van_snatcher::audio::{AudioSink, LogAudio};
use van_snatcher::consts::LANES;
use van_snatcher::shop::{MASK, SNEAKERS, WALLET2};
use van_snatcher::sim::{Mode, ModeKind, RunnerState, StealthState, TickInput};
use van_snatcher::{JsonFileStore, ModeController, SimError, Tuning};

const PROFILE_PATH: &str = "users.json";
const TUNING_PATH: &str = "tuning.json";
const FRAME_DT: f32 = 1.0 / 60.0;
/// Give up on a run after this many frames
const MAX_FRAMES_PER_RUN: u32 = 60 * 180;
/// Runner autopilot looks this far above the van for trouble
const LOOKAHEAD: f32 = 260.0;

fn main() {
    env_logger::init();
    log::info!("Van Snatcher (headless) starting...");

    let mut args = std::env::args().skip(1);
    let username = args.next().unwrap_or_else(|| "demo".to_string());
    let runs = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

    if let Err(e) = run(&username, runs) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(username: &str, runs: u32) -> Result<(), SimError> {
    let tuning = Tuning::load(Path::new(TUNING_PATH));
    let store = JsonFileStore::open(PROFILE_PATH)?;
    let resume = store.current_user().map(str::to_string);
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut game = ModeController::new(store, tuning, seed);
    let mut audio = LogAudio::new();

    match resume {
        Some(name) => game.login(&name)?,
        None => match game.login(username) {
            Ok(()) => {}
            Err(SimError::Profile(_)) => game.signup(username)?,
            Err(e) => return Err(e),
        },
    }

    for n in 1..=runs {
        game.start_run()?;
        let mut input = TickInput::default();
        let mut frames = 0;
        while matches!(game.mode(), ModeKind::Stealth | ModeKind::Runner) {
            if frames == MAX_FRAMES_PER_RUN {
                log::warn!("Run {} took too long, aborting", n);
                game.abort_to_menu()?;
                break;
            }
            autopilot(game.mode_state(), &mut input);
            game.tick(&mut input, FRAME_DT)?;
            audio.play_events(&game.drain_events());
            frames += 1;
        }

        if let Some(outcome) = game.snapshot().outcome {
            log::info!(
                "Run {}: {:?}, score {}, +{} coins (balance {}){}",
                n,
                outcome.cause,
                outcome.total_score,
                outcome.coins_earned,
                outcome.balance,
                if outcome.new_highscore { ", new high score!" } else { "" }
            );
        }
        while game.mode() == ModeKind::RunEnded {
            game.tick(&mut input, FRAME_DT)?;
        }

        shop_round(&mut game)?;
    }

    game.logout()?;
    Ok(())
}

/// Buy whatever upgrades the balance allows
fn shop_round(game: &mut ModeController<JsonFileStore>) -> Result<(), SimError> {
    game.open_shop()?;
    for id in [SNEAKERS, MASK, WALLET2] {
        match game.purchase(id) {
            Ok(item) => log::info!("Bought {}", item.name),
            Err(SimError::Shop(e)) => log::debug!("Skipped {}: {}", id, e),
            Err(e) => return Err(e),
        }
    }
    game.close_shop()
}

/// Fill in this frame's input from the current mode
fn autopilot(mode: &Mode, input: &mut TickInput) {
    match mode {
        Mode::Stealth(state) => sneak(state, input),
        Mode::Runner(state) => drive(state, input),
        _ => *input = TickInput::default(),
    }
}

/// Head straight for the van, sprinting once anyone is chasing
fn sneak(state: &StealthState, input: &mut TickInput) {
    let to_van = state.vehicle.pos - state.player.pos;
    *input = TickInput {
        left: to_van.x < -2.0,
        right: to_van.x > 2.0,
        up: to_van.y < -2.0,
        down: to_van.y > 2.0,
        sprint: state.alarm_raised(),
    };
}

/// Switch to the lane with the most room ahead
fn drive(state: &RunnerState, input: &mut TickInput) {
    let van_top = state.vehicle.bbox().min.y;
    let clearance = |lane: usize| {
        state
            .obstacles
            .iter()
            .filter(|ob| ob.lane == lane && ob.bbox().max.y > van_top - LOOKAHEAD)
            .map(|ob| van_top - ob.bbox().max.y)
            .fold(f32::INFINITY, f32::min)
    };

    let current = state.vehicle.lane;
    let best = (0..LANES)
        .filter(|lane| lane.abs_diff(current) <= 1)
        .max_by(|a, b| clearance(*a).total_cmp(&clearance(*b)))
        .unwrap_or(current);

    *input = TickInput::default();
    if clearance(best) > clearance(current) {
        input.left = best < current;
        input.right = best > current;
    }
}
