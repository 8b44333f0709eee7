//! Game balance tuning
//!
//! Every gameplay knob the simulators read lives here so a JSON file can
//! rebalance a build without touching code. Fixed geometry stays in `consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be a probability in [0, 1], got {value}")]
    NotProbability { field: &'static str, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("runner.kind_weights must not all be zero")]
    NoObstacleWeight,
}

/// Stealth phase balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthTuning {
    // === Player ===
    /// Base speed in pixels per reference frame
    pub player_speed: f32,
    /// Sprint speed multiplier
    pub sprint_boost: f32,
    /// Stamina drained per second while sprinting
    pub stamina_drain: f32,
    /// Stamina regained per second while not sprinting
    pub stamina_regen: f32,
    /// Score accrued per second (before coin multiplier)
    pub score_rate: f32,
    /// Base detection radius (before mask factor)
    pub detection_radius: f32,

    // === Pursuers ===
    pub pursuer_count: usize,
    pub pursuer_speed: f32,
    /// Speed multiplier while chasing
    pub chase_boost: f32,
    pub waypoint_count: usize,
    /// Distance at which a waypoint counts as reached
    pub arrival_tolerance: f32,
    /// Chasing stops once the player is farther than this
    pub disengage_distance: f32,
    /// Per-tick chance a pursuer in range starts chasing
    pub escalation_chance: f64,

    // === Capture / theft ===
    pub contact_radius: f32,
    /// Per-tick chance a pursuer in detection range captures the player
    pub capture_chance: f64,
    pub theft_radius: f32,
    pub theft_bonus: u64,
}

impl Default for StealthTuning {
    fn default() -> Self {
        Self {
            // Player
            player_speed: 2.0,
            sprint_boost: 1.6,
            stamina_drain: 20.0,
            stamina_regen: 12.0,
            score_rate: 6.0,
            detection_radius: 110.0,

            // Pursuers
            pursuer_count: 4,
            pursuer_speed: 1.0,
            chase_boost: 1.3,
            waypoint_count: 4,
            arrival_tolerance: 6.0,
            disengage_distance: 420.0,
            escalation_chance: 0.95,

            // Capture / theft
            contact_radius: 28.0,
            capture_chance: 0.85,
            theft_radius: 56.0,
            theft_bonus: 50,
        }
    }
}

/// Runner phase balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTuning {
    pub start_speed: f32,
    /// Scroll speed gained per second
    pub speed_ramp: f32,
    /// Distance score = dt * speed / distance_divisor
    pub distance_divisor: f32,
    pub base_spawn_interval: f32,
    pub min_spawn_interval: f32,
    /// Speed gain that shaves one second off the spawn interval
    pub interval_speed_scale: f32,
    /// Relative weights for worker, crate, cone
    pub kind_weights: [u32; 3],
    pub coin_chance: f64,
    pub coin_value: u64,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            start_speed: 220.0,
            speed_ramp: 6.0,
            distance_divisor: 40.0,
            base_spawn_interval: 1.0,
            min_spawn_interval: 0.45,
            interval_speed_scale: 800.0,
            kind_weights: [6, 3, 2],
            coin_chance: 0.45,
            coin_value: 10,
        }
    }
}

/// Run reward formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTuning {
    /// One coin per this many points of total score
    pub score_per_coin: u64,
    /// One bonus coin per this much distance score
    pub distance_per_coin: f32,
    /// Seconds the run-ended screen stays up before returning to the menu
    pub end_screen_secs: f32,
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            score_per_coin: 25,
            distance_per_coin: 100.0,
            end_screen_secs: 1.6,
        }
    }
}

/// All balance knobs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub stealth: StealthTuning,
    pub runner: RunnerTuning,
    pub reward: RewardTuning,
}

impl Tuning {
    /// Parse and validate tuning from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a file, falling back to defaults if it is missing or bad
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(e) => {
                    log::warn!("Bad tuning file {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No tuning file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Reject values the simulators cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let (s, r, w) = (&self.stealth, &self.runner, &self.reward);

        probability("stealth.escalation_chance", s.escalation_chance)?;
        probability("stealth.capture_chance", s.capture_chance)?;
        probability("runner.coin_chance", r.coin_chance)?;

        positive("stealth.player_speed", s.player_speed)?;
        positive("stealth.sprint_boost", s.sprint_boost)?;
        positive("stealth.detection_radius", s.detection_radius)?;
        positive("stealth.pursuer_speed", s.pursuer_speed)?;
        positive("stealth.chase_boost", s.chase_boost)?;
        positive("stealth.arrival_tolerance", s.arrival_tolerance)?;
        positive("stealth.disengage_distance", s.disengage_distance)?;
        positive("runner.start_speed", r.start_speed)?;
        positive("runner.distance_divisor", r.distance_divisor)?;
        positive("runner.base_spawn_interval", r.base_spawn_interval)?;
        positive("runner.min_spawn_interval", r.min_spawn_interval)?;
        positive("runner.interval_speed_scale", r.interval_speed_scale)?;
        positive("reward.distance_per_coin", w.distance_per_coin)?;
        positive("reward.end_screen_secs", w.end_screen_secs)?;
        if w.score_per_coin == 0 {
            return Err(TuningError::NotPositive { field: "reward.score_per_coin", value: 0.0 });
        }
        // Ramp may be zero (constant speed) but not negative or NaN
        if !(r.speed_ramp >= 0.0 && r.speed_ramp.is_finite()) {
            return Err(TuningError::NotPositive { field: "runner.speed_ramp", value: r.speed_ramp as f64 });
        }
        if r.kind_weights.iter().all(|&w| w == 0) {
            return Err(TuningError::NoObstacleWeight);
        }
        Ok(())
    }

    /// Spawn interval for a given scroll speed
    pub fn spawn_interval(&self, scroll_speed: f32) -> f32 {
        let r = &self.runner;
        let shrink = (scroll_speed - r.start_speed) / r.interval_speed_scale;
        (r.base_spawn_interval - shrink).max(r.min_spawn_interval)
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::NotProbability { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value: value as f64 })
    }
}
