//! Read-only per-frame view for the presentation shell
//!
//! Flattens the active mode's state into plain data: positions, animation
//! frames and resolved cosmetic tints. Serializable so a shell can ship it as
//! JSON.

use glam::Vec2;
use serde::Serialize;

use super::controller::ModeKind;
use super::outcome::RunOutcome;
use super::runner::RunnerState;
use super::state::ObstacleKind;
use super::stealth::StealthState;
use crate::profile::Profile;
use crate::shop::{Rgb, Tintable};

/// One drawable thing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteData {
    /// Top-left corner
    pub pos: Vec2,
    pub frame: usize,
    pub tint: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PursuerData {
    pub pos: Vec2,
    pub frame: usize,
    pub chasing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StealthData {
    pub player: SpriteData,
    pub stamina: f32,
    pub pursuers: Vec<PursuerData>,
    pub van: SpriteData,
    pub alarm: bool,
}

impl StealthData {
    pub fn new(state: &StealthState, profile: &Profile) -> Self {
        Self {
            player: SpriteData {
                pos: state.player.pos,
                frame: state.player.anim.index,
                tint: state.player.tint(profile),
            },
            stamina: state.player.stamina,
            pursuers: state
                .pursuers
                .iter()
                .map(|p| PursuerData {
                    pos: p.pos,
                    frame: p.anim.index,
                    chasing: p.chasing,
                })
                .collect(),
            van: SpriteData {
                pos: state.vehicle.pos,
                frame: state.vehicle.anim.index,
                tint: state.vehicle.tint(profile),
            },
            alarm: state.alarm_raised(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObstacleData {
    pub kind: ObstacleKind,
    pub pos: Vec2,
    pub size: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerData {
    pub van: SpriteData,
    pub lane: usize,
    pub scroll_speed: f32,
    pub obstacles: Vec<ObstacleData>,
    pub coins: Vec<SpriteData>,
}

impl RunnerData {
    pub fn new(state: &RunnerState, profile: &Profile) -> Self {
        Self {
            van: SpriteData {
                pos: state.vehicle.bbox().min,
                frame: state.vehicle.anim.index,
                tint: state.vehicle.tint(profile),
            },
            lane: state.vehicle.lane,
            scroll_speed: state.scroll_speed,
            obstacles: state
                .obstacles
                .iter()
                .map(|ob| {
                    let bbox = ob.bbox();
                    ObstacleData {
                        kind: ob.kind,
                        pos: bbox.min,
                        size: bbox.size(),
                    }
                })
                .collect(),
            coins: state
                .collectibles
                .iter()
                .map(|c| SpriteData {
                    pos: c.bbox().min,
                    frame: c.anim.index,
                    tint: None,
                })
                .collect(),
        }
    }
}

/// Everything the shell draws this frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub mode: ModeKind,
    pub username: Option<String>,
    pub coins: u64,
    pub highscore: u64,
    /// Running total for the current run (stealth + distance, truncated)
    pub score: u64,
    pub stealth: Option<StealthData>,
    pub runner: Option<RunnerData>,
    /// Set while the run-ended screen is showing
    pub outcome: Option<RunOutcome>,
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
