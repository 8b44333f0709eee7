//! Entity models and shared simulation types
//!
//! Entities hold position, movement intent and animation phase. Each has a
//! small per-frame update; the phase simulators decide when to call it.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, within};
use super::input::TickInput;
use crate::consts::*;
use crate::settings::StealthTuning;
use crate::shop::{CosmeticCategory, Loadout, Tintable};
use crate::{lane_center_x, step_toward};

/// Where the stealth player starts
pub const PLAYER_START: Vec2 = Vec2::new(80.0, ARENA_HEIGHT / 2.0 - 30.0);
/// Where the van waits to be stolen
pub const VAN_POSITION: Vec2 = Vec2::new(ARENA_WIDTH - 160.0, ARENA_HEIGHT / 2.0 - 26.0);

/// Pursuer spawn area (inclusive, whole pixels)
const PURSUER_SPAWN_X: (i32, i32) = (200, ARENA_WIDTH as i32 - 260);
const PURSUER_SPAWN_Y: (i32, i32) = (90, ARENA_HEIGHT as i32 - 150);
/// Patrol waypoint jitter around the spawn point
const WAYPOINT_JITTER: (i32, i32) = (120, 80);
/// Patrol waypoints stay inside this box
const WAYPOINT_MIN: Vec2 = Vec2::new(100.0, 60.0);
const WAYPOINT_MAX: Vec2 = Vec2::new(ARENA_WIDTH - 160.0, ARENA_HEIGHT - 120.0);

/// Obstacles spawn this far above the frame (inclusive range, pixels)
pub const OBSTACLE_SPAWN_DEPTH: (i32, i32) = (60, 200);
/// Coins trail their obstacle by this much
pub const COIN_TRAIL_GAP: f32 = 60.0;
/// Entities below these lines are dropped
pub const OBSTACLE_REMOVAL_Y: f32 = ARENA_HEIGHT + 220.0;
pub const COIN_REMOVAL_Y: f32 = ARENA_HEIGHT + 200.0;
pub const COIN_SIZE: f32 = 28.0;

/// Fixed-period animation counter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameClock {
    /// Seconds per frame
    pub period: f32,
    pub frames: usize,
    pub index: usize,
    elapsed: f32,
}

impl FrameClock {
    pub const fn new(period: f32, frames: usize) -> Self {
        Self {
            period,
            frames,
            index: 0,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
        while self.elapsed > self.period {
            self.elapsed -= self.period;
            self.index = (self.index + 1) % self.frames.max(1);
        }
    }
}

/// Animation timings per entity
pub mod anim {
    use super::FrameClock;

    pub const PLAYER: FrameClock = FrameClock::new(0.12, 6);
    pub const PURSUER: FrameClock = FrameClock::new(0.14, 4);
    pub const VAN: FrameClock = FrameClock::new(0.12, 3);
    pub const COIN: FrameClock = FrameClock::new(0.08, 8);
}

/// Sounds and other one-shot signals for the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameEvent {
    /// Player caught during the stealth phase
    Capture,
    /// Van hit an obstacle
    Crash,
    /// Coin picked up
    Coin,
    /// Van stolen
    Theft,
    /// Runner phase started
    Engine,
    /// Shop purchase went through
    Purchase,
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Capture => "capture",
            GameEvent::Crash => "crash",
            GameEvent::Coin => "coin",
            GameEvent::Theft => "theft",
            GameEvent::Engine => "engine",
            GameEvent::Purchase => "purchase",
        }
    }
}

/// Stealth phase player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    /// Pixels per reference frame
    pub speed: f32,
    /// 0..=100
    pub stamina: f32,
    pub score: f32,
    /// Pursuers within this distance may start chasing
    pub detection_radius: f32,
    /// Pursuers within this distance may make the catch; the mask shrinks
    /// it a second time on top of the detection radius
    pub capture_radius: f32,
    pub score_multiplier: f32,
    pub anim: FrameClock,
}

/// Largest top-left position that keeps the player on screen
pub fn player_max_pos() -> Vec2 {
    Vec2::new(ARENA_WIDTH - PLAYER_WIDTH, ARENA_HEIGHT - PLAYER_HEIGHT)
}

impl Player {
    pub fn new(tuning: &StealthTuning, loadout: &Loadout) -> Self {
        let detection_radius = tuning.detection_radius * loadout.detection_factor;
        Self {
            pos: PLAYER_START,
            speed: tuning.player_speed + loadout.speed_bonus,
            stamina: 100.0,
            score: 0.0,
            detection_radius,
            capture_radius: detection_radius * loadout.detection_factor,
            score_multiplier: loadout.coin_multiplier as f32,
            anim: anim::PLAYER,
        }
    }

    /// Move, spend or regain stamina, accrue score, animate
    pub fn update(&mut self, input: &TickInput, dt: f32, tuning: &StealthTuning) {
        let dir = input.direction();

        let mut speed = self.speed;
        if input.sprint && self.stamina > 1.0 {
            speed *= tuning.sprint_boost;
            self.stamina = (self.stamina - tuning.stamina_drain * dt).max(0.0);
        } else {
            self.stamina = (self.stamina + tuning.stamina_regen * dt).min(100.0);
        }
        if dir.x != 0.0 && dir.y != 0.0 {
            speed *= std::f32::consts::FRAC_1_SQRT_2;
        }

        self.pos = (self.pos + dir * speed * dt * REFERENCE_FPS).clamp(Vec2::ZERO, player_max_pos());
        debug_assert!(in_box(self.pos, Vec2::ZERO, player_max_pos()), "player left the arena");

        self.score += dt * tuning.score_rate * self.score_multiplier;
        self.anim.advance(dt);
    }
}

impl Tintable for Player {
    fn tint_category(&self) -> CosmeticCategory {
        CosmeticCategory::Alex
    }
}

/// What a pursuer's update changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PursuitChange {
    None,
    Engaged,
    Disengaged,
}

/// Patrolling worker that chases the player on sight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pursuer {
    pub pos: Vec2,
    /// Cyclic patrol route
    pub path: Vec<Vec2>,
    /// Index of the waypoint being walked to
    pub waypoint: usize,
    pub chasing: bool,
    /// Pixels per reference frame
    pub speed: f32,
    pub anim: FrameClock,
}

/// Largest position that keeps a pursuer on screen
pub fn pursuer_max_pos() -> Vec2 {
    Vec2::new(ARENA_WIDTH - SPRITE_SIZE, ARENA_HEIGHT - SPRITE_SIZE)
}

impl Pursuer {
    /// Spawn at a random spot with a random patrol loop around it
    pub fn spawn(rng: &mut impl Rng, tuning: &StealthTuning) -> Self {
        let pos = Vec2::new(
            rng.random_range(PURSUER_SPAWN_X.0..=PURSUER_SPAWN_X.1) as f32,
            rng.random_range(PURSUER_SPAWN_Y.0..=PURSUER_SPAWN_Y.1) as f32,
        );
        let (jx, jy) = WAYPOINT_JITTER;
        let path = (0..tuning.waypoint_count)
            .map(|_| {
                let offset = Vec2::new(
                    rng.random_range(-jx..=jx) as f32,
                    rng.random_range(-jy..=jy) as f32,
                );
                (pos + offset).clamp(WAYPOINT_MIN, WAYPOINT_MAX)
            })
            .collect();
        Self::with_path(pos, path, tuning)
    }

    pub fn with_path(pos: Vec2, path: Vec<Vec2>, tuning: &StealthTuning) -> Self {
        Self {
            pos,
            path,
            waypoint: 0,
            chasing: false,
            speed: tuning.pursuer_speed,
            anim: anim::PURSUER,
        }
    }

    /// Patrol or chase for one tick
    pub fn update(
        &mut self,
        player_pos: Vec2,
        detection_radius: f32,
        dt: f32,
        tuning: &StealthTuning,
        rng: &mut impl Rng,
    ) -> PursuitChange {
        let dist = self.pos.distance(player_pos);
        let mut change = PursuitChange::None;

        if !self.chasing && dist <= detection_radius && rng.random_bool(tuning.escalation_chance) {
            self.chasing = true;
            change = PursuitChange::Engaged;
        }

        if self.chasing {
            if dist > tuning.disengage_distance {
                self.chasing = false;
                self.waypoint = 0;
                change = PursuitChange::Disengaged;
            } else {
                let step = self.speed * tuning.chase_boost * dt * REFERENCE_FPS;
                self.pos = step_toward(self.pos, player_pos, step);
            }
        } else if let Some(&target) = self.path.get(self.waypoint) {
            if self.pos.distance(target) < tuning.arrival_tolerance {
                self.waypoint = (self.waypoint + 1) % self.path.len();
            } else {
                self.pos = step_toward(self.pos, target, self.speed * dt * REFERENCE_FPS);
            }
        }

        self.pos = self.pos.clamp(Vec2::ZERO, pursuer_max_pos());
        self.anim.advance(dt);
        change
    }
}

/// The van parked in the stealth arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StealthVehicle {
    pub pos: Vec2,
    /// Set once, never cleared
    pub stolen: bool,
    pub anim: FrameClock,
}

impl Default for StealthVehicle {
    fn default() -> Self {
        Self {
            pos: VAN_POSITION,
            stolen: false,
            anim: anim::VAN,
        }
    }
}

impl StealthVehicle {
    pub fn update(&mut self, dt: f32) {
        self.anim.advance(dt);
    }

    /// Whether the player is close enough to take it
    pub fn can_steal(&self, player_pos: Vec2, radius: f32) -> bool {
        !self.stolen && within(self.pos, player_pos, radius)
    }
}

impl Tintable for StealthVehicle {
    fn tint_category(&self) -> CosmeticCategory {
        CosmeticCategory::Van
    }
}

/// The van on the road
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerVehicle {
    pub lane: usize,
    /// Lane being moved to; snapped immediately for now
    pub target_lane: usize,
    pub size: Vec2,
    pub anim: FrameClock,
}

impl Default for RunnerVehicle {
    fn default() -> Self {
        Self {
            lane: LANES / 2,
            target_lane: LANES / 2,
            size: Vec2::new(RUNNER_VAN_WIDTH, RUNNER_VAN_HEIGHT),
            anim: anim::VAN,
        }
    }
}

impl RunnerVehicle {
    /// Move one lane left (-1) or right (+1), staying on the road
    pub fn shift(&mut self, delta: i32) {
        let lane = (self.lane as i32 + delta).clamp(0, LANES as i32 - 1) as usize;
        self.target_lane = lane;
        self.lane = lane;
    }

    pub fn update(&mut self, dt: f32) {
        self.anim.advance(dt);
    }

    pub fn bbox(&self) -> Aabb {
        Aabb::from_center(Vec2::new(lane_center_x(self.lane), RUNNER_BASE_Y), self.size)
    }
}

impl Tintable for RunnerVehicle {
    fn tint_category(&self) -> CosmeticCategory {
        CosmeticCategory::Van
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Worker,
    Crate,
    Cone,
}

impl ObstacleKind {
    /// Spawn order matching `RunnerTuning::kind_weights`
    pub const ALL: [ObstacleKind; 3] = [ObstacleKind::Worker, ObstacleKind::Crate, ObstacleKind::Cone];

    pub fn size(&self) -> Vec2 {
        match self {
            ObstacleKind::Worker => Vec2::splat(48.0),
            ObstacleKind::Crate => Vec2::splat(42.0),
            ObstacleKind::Cone => Vec2::splat(36.0),
        }
    }
}

/// Something in the road
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub lane: usize,
    pub kind: ObstacleKind,
    /// Top edge
    pub y: f32,
}

impl Obstacle {
    pub fn bbox(&self) -> Aabb {
        lane_box(self.lane, self.y, self.kind.size())
    }
}

/// A coin in the road
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub lane: usize,
    /// Top edge
    pub y: f32,
    pub anim: FrameClock,
}

impl Collectible {
    pub fn new(lane: usize, y: f32) -> Self {
        Self {
            lane,
            y,
            anim: anim::COIN,
        }
    }

    pub fn bbox(&self) -> Aabb {
        lane_box(self.lane, self.y, Vec2::splat(COIN_SIZE))
    }
}

/// Box horizontally centred in a lane with its top edge at `y`
fn lane_box(lane: usize, y: f32, size: Vec2) -> Aabb {
    Aabb::from_corner(Vec2::new(lane_center_x(lane) - size.x / 2.0, y), size)
}

fn in_box(p: Vec2, min: Vec2, max: Vec2) -> bool {
    p.x >= min.x && p.y >= min.y && p.x <= max.x && p.y <= max.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn tuning() -> StealthTuning {
        StealthTuning::default()
    }

    #[test]
    fn test_frame_clock_fixed_period() {
        let mut clock = FrameClock::new(0.1, 3);
        clock.advance(0.05);
        assert_eq!(clock.index, 0);
        clock.advance(0.06);
        assert_eq!(clock.index, 1);
        clock.advance(0.1);
        clock.advance(0.1);
        assert_eq!(clock.index, 0);
    }

    #[test]
    fn test_player_animation_ignores_speed() {
        let mut slow = Player::new(&tuning(), &Loadout::default());
        let mut fast = slow.clone();
        fast.speed *= 3.0;
        let input = TickInput { right: true, ..Default::default() };
        for _ in 0..20 {
            slow.update(&input, 1.0 / 60.0, &tuning());
            fast.update(&input, 1.0 / 60.0, &tuning());
        }
        assert_eq!(slow.anim.index, fast.anim.index);
        assert!(fast.pos.x > slow.pos.x);
    }

    #[test]
    fn test_diagonal_is_normalised() {
        let mut straight = Player::new(&tuning(), &Loadout::default());
        let mut diagonal = straight.clone();
        let start = straight.pos;
        straight.update(&TickInput { right: true, ..Default::default() }, 1.0 / 60.0, &tuning());
        diagonal.update(
            &TickInput { right: true, down: true, ..Default::default() },
            1.0 / 60.0,
            &tuning(),
        );
        let a = (straight.pos - start).length();
        let b = (diagonal.pos - start).length();
        assert!((a - b).abs() < 1e-3, "straight {a} vs diagonal {b}");
    }

    #[test]
    fn test_loadout_applies_to_player() {
        let loadout = Loadout { speed_bonus: 0.5, detection_factor: 0.8, coin_multiplier: 2 };
        let player = Player::new(&tuning(), &loadout);
        assert_eq!(player.speed, 2.5);
        assert!((player.detection_radius - 88.0).abs() < 1e-4);
        assert!((player.capture_radius - 70.4).abs() < 1e-4);
        assert_eq!(player.score_multiplier, 2.0);
    }

    #[test]
    fn test_pursuer_spawn_in_bounds() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            let p = Pursuer::spawn(&mut rng, &tuning());
            assert!(in_box(p.pos, Vec2::new(200.0, 90.0), Vec2::new(740.0, 490.0)));
            assert_eq!(p.path.len(), 4);
            for w in &p.path {
                assert!(in_box(*w, WAYPOINT_MIN, WAYPOINT_MAX));
            }
        }
    }

    #[test]
    fn test_pursuer_patrol_cycles_waypoints() {
        let mut rng = Pcg32::seed_from_u64(1);
        let path = vec![Vec2::new(300.0, 100.0), Vec2::new(400.0, 100.0)];
        let mut p = Pursuer::with_path(Vec2::new(300.0, 100.0), path, &tuning());
        let far = Vec2::new(900.0, 500.0);
        p.update(far, 110.0, 1.0 / 60.0, &tuning(), &mut rng);
        assert_eq!(p.waypoint, 1);
        for _ in 0..30 {
            p.update(far, 110.0, 1.0 / 60.0, &tuning(), &mut rng);
        }
        assert_eq!(p.waypoint, 1);
        assert!((p.pos.x - 330.0).abs() < 1e-3);

        p.pos = Vec2::new(398.0, 100.0);
        p.update(far, 110.0, 1.0 / 60.0, &tuning(), &mut rng);
        assert_eq!(p.waypoint, 0);
        assert!(!p.chasing);
    }

    #[test]
    fn test_pursuer_chase_and_disengage() {
        let mut rng = Pcg32::seed_from_u64(9);
        let always = StealthTuning { escalation_chance: 1.0, ..tuning() };
        let mut p = Pursuer::with_path(Vec2::new(300.0, 300.0), vec![Vec2::new(300.0, 300.0)], &always);
        let change = p.update(Vec2::new(350.0, 300.0), 110.0, 1.0 / 60.0, &always, &mut rng);
        assert_eq!(change, PursuitChange::Engaged);
        assert!(p.pos.x > 300.0);

        let change = p.update(Vec2::new(700.0, 300.0), 110.0, 1.0 / 60.0, &always, &mut rng);
        assert_eq!(change, PursuitChange::None);
        assert!(p.chasing, "still inside the disengage distance");

        p.pos = Vec2::new(0.0, 0.0);
        p.waypoint = 0;
        let change = p.update(Vec2::new(900.0, 500.0), 110.0, 1.0 / 60.0, &always, &mut rng);
        assert_eq!(change, PursuitChange::Disengaged);
        assert!(!p.chasing);
    }

    #[test]
    fn test_runner_vehicle_lane_clamped() {
        let mut van = RunnerVehicle::default();
        assert_eq!(van.lane, 1);
        for _ in 0..5 {
            van.shift(-1);
        }
        assert_eq!(van.lane, 0);
        for _ in 0..5 {
            van.shift(1);
        }
        assert_eq!(van.lane, LANES - 1);
        assert_eq!(van.target_lane, van.lane);
    }

    #[test]
    fn test_runner_boxes_match_layout() {
        let van = RunnerVehicle::default();
        let b = van.bbox();
        assert_eq!(b.min, Vec2::new(440.0, 478.0));
        assert_eq!(b.max, Vec2::new(560.0, 562.0));

        let ob = Obstacle { lane: 0, kind: ObstacleKind::Worker, y: -100.0 };
        assert_eq!(ob.bbox().min, Vec2::new(326.0, -100.0));
        let coin = Collectible::new(2, 10.0);
        assert_eq!(coin.bbox().min, Vec2::new(636.0, 10.0));
    }

    #[test]
    fn test_vehicle_steal_once() {
        let mut van = StealthVehicle::default();
        assert!(van.can_steal(VAN_POSITION + Vec2::new(20.0, 0.0), 56.0));
        assert!(!van.can_steal(PLAYER_START, 56.0));
        van.stolen = true;
        assert!(!van.can_steal(VAN_POSITION, 56.0));
    }
}
