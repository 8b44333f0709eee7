//! End-of-run scoring and rewards

use serde::{Deserialize, Serialize};

use crate::profile::{ProfileStore, Session};
use crate::settings::RewardTuning;
use crate::shop::Loadout;

/// Per-run accumulator handed from phase to phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTally {
    /// Time-based score from the stealth phase
    pub stealth_score: f32,
    /// Distance score from the runner phase
    pub distance_score: f32,
    /// Coins credited during the run (theft bonus, pickups)
    pub coins_collected: u64,
    /// Set once the outcome has been paid out
    pub settled: bool,
}

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEndCause {
    Captured,
    Crashed,
}

/// What the run-ended screen shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub cause: RunEndCause,
    pub total_score: u64,
    pub coins_earned: u64,
    pub coins_collected: u64,
    /// Balance after the payout
    pub balance: u64,
    pub new_highscore: bool,
}

/// Combined score, truncated
pub fn total_score(tally: &RunTally) -> u64 {
    (tally.stealth_score + tally.distance_score).max(0.0) as u64
}

/// Coins paid for a finished run
pub fn coins_earned(total: u64, distance_score: f32, multiplier: u64, reward: &RewardTuning) -> u64 {
    let from_score = total / reward.score_per_coin.max(1);
    let from_distance = (distance_score / reward.distance_per_coin).max(0.0) as u64;
    from_score.saturating_add(from_distance).saturating_mul(multiplier)
}

/// Pay out a finished run and persist the profile.
///
/// Returns `None` if this run was already settled. A failed save is logged;
/// the in-memory profile keeps the payout either way.
pub fn resolve(
    tally: &mut RunTally,
    cause: RunEndCause,
    session: &mut Session,
    store: &mut dyn ProfileStore,
    reward: &RewardTuning,
) -> Option<RunOutcome> {
    if tally.settled {
        log::warn!("Run outcome already settled, ignoring second resolve");
        return None;
    }
    tally.settled = true;

    let loadout = Loadout::from_profile(&session.profile);
    let total = total_score(tally);
    let coins = coins_earned(total, tally.distance_score, loadout.coin_multiplier, reward);

    let profile = &mut session.profile;
    profile.credit(coins);
    let new_highscore = profile.record_score(total);

    if let Err(e) = store.save(&session.username, profile) {
        log::warn!("Failed to save profile for {}: {}", session.username, e);
    }

    log::info!(
        "Run over ({:?}): score {}, +{} coins, balance {}",
        cause,
        total,
        coins,
        profile.coins
    );

    Some(RunOutcome {
        cause,
        total_score: total,
        coins_earned: coins,
        coins_collected: tally.coins_collected,
        balance: profile.coins,
        new_highscore,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{MemoryStore, Profile};
    use crate::shop::WALLET2;

    fn session_with(profile: Profile) -> Session {
        Session::new("alex", profile)
    }

    #[test]
    fn test_reward_formula() {
        let reward = RewardTuning::default();
        assert_eq!(coins_earned(130, 150.0, 1, &reward), 6);
        assert_eq!(coins_earned(130, 150.0, 2, &reward), 12);
        assert_eq!(coins_earned(24, 99.9, 1, &reward), 0);
    }

    #[test]
    fn test_reward_saturates_instead_of_overflowing() {
        let reward = RewardTuning { distance_per_coin: 0.0, ..Default::default() };
        assert_eq!(coins_earned(130, 150.0, 2, &reward), u64::MAX);
    }

    #[test]
    fn test_total_score_truncates() {
        let tally = RunTally { stealth_score: 20.7, distance_score: 109.6, ..Default::default() };
        assert_eq!(total_score(&tally), 130);
    }

    #[test]
    fn test_resolve_pays_and_saves() {
        let mut store = MemoryStore::new();
        let mut session = session_with(Profile { coins: 10, highscore: 50, ..Default::default() });
        let mut tally = RunTally { stealth_score: 30.0, distance_score: 150.0, ..Default::default() };

        let outcome = resolve(&mut tally, RunEndCause::Crashed, &mut session, &mut store, &RewardTuning::default())
            .unwrap();
        // total 180 -> 7 + 1
        assert_eq!(outcome.total_score, 180);
        assert_eq!(outcome.coins_earned, 8);
        assert_eq!(outcome.balance, 18);
        assert!(outcome.new_highscore);
        assert_eq!(session.profile.highscore, 180);
        assert_eq!(store.get("alex").map(|p| p.coins), Some(18));
    }

    #[test]
    fn test_resolve_doubles_with_wallet() {
        let mut store = MemoryStore::new();
        let mut profile = Profile::default();
        profile.owned.insert(WALLET2.to_string());
        let mut session = session_with(profile);
        let mut tally = RunTally { stealth_score: 0.0, distance_score: 130.0, ..Default::default() };
        let outcome = resolve(&mut tally, RunEndCause::Captured, &mut session, &mut store, &RewardTuning::default())
            .unwrap();
        assert_eq!(outcome.coins_earned, (5 + 1) * 2);
    }

    #[test]
    fn test_resolve_is_once_per_run() {
        let mut store = MemoryStore::new();
        let mut session = session_with(Profile::default());
        let mut tally = RunTally { stealth_score: 100.0, ..Default::default() };
        let reward = RewardTuning::default();
        assert!(resolve(&mut tally, RunEndCause::Captured, &mut session, &mut store, &reward).is_some());
        let coins = session.profile.coins;
        assert!(resolve(&mut tally, RunEndCause::Captured, &mut session, &mut store, &reward).is_none());
        assert_eq!(session.profile.coins, coins);
        assert_eq!(store.saves, 1);
    }

    #[test]
    fn test_failed_save_keeps_payout_in_memory() {
        let mut store = MemoryStore::new();
        store.fail_saves = true;
        let mut session = session_with(Profile::default());
        let mut tally = RunTally { stealth_score: 50.0, ..Default::default() };
        let outcome = resolve(&mut tally, RunEndCause::Captured, &mut session, &mut store, &RewardTuning::default())
            .unwrap();
        assert_eq!(outcome.coins_earned, 2);
        assert_eq!(session.profile.coins, 2);
        assert!(store.get("alex").is_none());
    }

    #[test]
    fn test_lower_score_keeps_highscore() {
        let mut store = MemoryStore::new();
        let mut session = session_with(Profile { highscore: 500, ..Default::default() });
        let mut tally = RunTally { stealth_score: 10.0, ..Default::default() };
        let outcome = resolve(&mut tally, RunEndCause::Captured, &mut session, &mut store, &RewardTuning::default())
            .unwrap();
        assert!(!outcome.new_highscore);
        assert_eq!(session.profile.highscore, 500);
    }
}
