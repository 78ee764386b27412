//! MasterChef-style proportional reward distribution.
//!
//! A pool keeps a single monotonically non-decreasing
//! `acc_reward_per_share` (scaled by [`PRECISION`]); each participant keeps a
//! `reward_debt` snapshot so pending reward is a plain difference. Every
//! share or debt mutation goes through [`RewardAccumulator::update`] first.

use borsh::{BorshDeserialize, BorshSerialize};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Accumulator scale factor, 10^18.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// Per-participant slice of one reward stream. Persists at zero shares so
/// historical debt is retained.
#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, Default, PartialEq,
)]
pub struct Position {
    pub shares: u128,
    /// `shares * acc_reward_per_share / PRECISION` as of the last checkpoint.
    pub reward_debt: u128,
    /// Reward that could not be delivered; added to the next harvest.
    pub failed_credit: u128,
}

#[derive(
    BorshSerialize, BorshDeserialize, Serialize, Deserialize, Clone, Debug, Default, PartialEq,
)]
pub struct RewardAccumulator {
    /// Emission rate for time-driven streams. 0 for deposit-fed streams.
    pub reward_rate_per_second: u128,
    /// Scaled by PRECISION. Monotonically non-decreasing.
    pub acc_reward_per_share: u128,
    pub last_reward_timestamp: u64,
    pub total_shares: u128,
}

impl RewardAccumulator {
    pub fn new(reward_rate_per_second: u128, now: u64) -> Self {
        Self {
            reward_rate_per_second,
            acc_reward_per_share: 0,
            last_reward_timestamp: now,
            total_shares: 0,
        }
    }

    /// Accrue time-based emission up to `now`.
    ///
    /// The timestamp advances even when the pool has no shares, so emission
    /// during an empty window is discarded rather than spiking onto the first
    /// participant to join. Economic behavior; do not change.
    pub fn update(&mut self, now: u64) {
        if now <= self.last_reward_timestamp {
            return;
        }
        if self.total_shares > 0 {
            let elapsed = (now - self.last_reward_timestamp) as u128;
            let accrued = U256::from(elapsed)
                * U256::from(self.reward_rate_per_second)
                * U256::from(PRECISION)
                / U256::from(self.total_shares);
            self.acc_reward_per_share += accrued.as_u128();
        }
        self.last_reward_timestamp = now;
    }

    /// Distribute a one-off reward deposit across current shares.
    /// Returns the distributed amount: 0 when the pool is empty, so the
    /// caller can route the deposit elsewhere instead of losing it.
    pub fn inject(&mut self, amount: u128) -> u128 {
        if self.total_shares == 0 {
            return 0;
        }
        self.acc_reward_per_share +=
            (U256::from(amount) * U256::from(PRECISION) / U256::from(self.total_shares)).as_u128();
        amount
    }

    pub fn has_shares(&self) -> bool {
        self.total_shares > 0
    }

    /// Reward accumulated for `position` since its last checkpoint.
    pub fn pending(&self, position: &Position) -> u128 {
        let entitled = self.debt_for(position.shares);
        debug_assert!(
            entitled >= position.reward_debt,
            "pending underflow: update() was skipped before a debt snapshot"
        );
        entitled.saturating_sub(position.reward_debt)
    }

    /// Checkpoint and add shares. Returns the reward pending before the
    /// change; the caller is responsible for delivering it.
    pub fn deposit_shares(&mut self, position: &mut Position, amount: u128, now: u64) -> u128 {
        self.update(now);
        let pending = self.pending(position);
        position.shares += amount;
        self.total_shares += amount;
        position.reward_debt = self.debt_for(position.shares);
        pending
    }

    /// Checkpoint and remove shares. Returns the reward pending before the
    /// change. Callers must not withdraw more shares than the position holds.
    pub fn withdraw_shares(&mut self, position: &mut Position, amount: u128, now: u64) -> u128 {
        debug_assert!(position.shares >= amount);
        self.update(now);
        let pending = self.pending(position);
        position.shares -= amount;
        self.total_shares -= amount;
        position.reward_debt = self.debt_for(position.shares);
        pending
    }

    /// Checkpoint and claim. Returns the pending reward and resets the debt
    /// snapshot so `pending` is zero immediately afterwards.
    pub fn harvest(&mut self, position: &mut Position, now: u64) -> u128 {
        self.update(now);
        let pending = self.pending(position);
        position.reward_debt = self.debt_for(position.shares);
        pending
    }

    /// Checkpoint, then change the emission rate.
    pub fn set_rate(&mut self, reward_rate_per_second: u128, now: u64) {
        self.update(now);
        self.reward_rate_per_second = reward_rate_per_second;
    }

    fn debt_for(&self, shares: u128) -> u128 {
        (U256::from(shares) * U256::from(self.acc_reward_per_share) / U256::from(PRECISION))
            .as_u128()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_staker_accrues_full_emission() {
        let mut acc = RewardAccumulator::new(100, 0);
        let mut pos = Position::default();
        acc.deposit_shares(&mut pos, 1, 0);

        acc.update(10);
        assert_eq!(acc.acc_reward_per_share, 1_000 * PRECISION);
        assert_eq!(acc.pending(&pos), 1_000);
    }

    #[test]
    fn pending_is_zero_right_after_harvest() {
        let mut acc = RewardAccumulator::new(7, 0);
        let mut pos = Position::default();
        acc.deposit_shares(&mut pos, 3, 0);

        acc.update(100);
        let claimed = acc.harvest(&mut pos, 100);
        assert!(claimed > 0);
        assert_eq!(acc.pending(&pos), 0);
    }

    #[test]
    fn pending_is_zero_right_after_share_change() {
        let mut acc = RewardAccumulator::new(5, 0);
        let mut pos = Position::default();
        acc.deposit_shares(&mut pos, 2, 0);

        let pending = acc.deposit_shares(&mut pos, 4, 50);
        assert_eq!(pending, 5 * 50);
        assert_eq!(acc.pending(&pos), 0);

        let pending = acc.withdraw_shares(&mut pos, 6, 80);
        assert_eq!(pending, 5 * 30);
        assert_eq!(acc.pending(&pos), 0);
        assert_eq!(pos.shares, 0);
    }

    #[test]
    fn emission_during_empty_pool_is_discarded() {
        let mut acc = RewardAccumulator::new(100, 0);
        // Nobody staked for 1000 seconds.
        acc.update(1_000);
        assert_eq!(acc.acc_reward_per_share, 0);
        assert_eq!(acc.last_reward_timestamp, 1_000);

        // First staker must not inherit the idle window's emission.
        let mut pos = Position::default();
        acc.deposit_shares(&mut pos, 1, 1_000);
        acc.update(1_010);
        assert_eq!(acc.pending(&pos), 1_000);
    }

    #[test]
    fn update_is_monotonic_and_ignores_stale_timestamps() {
        let mut acc = RewardAccumulator::new(10, 0);
        let mut pos = Position::default();
        acc.deposit_shares(&mut pos, 5, 0);

        let mut last = 0;
        for now in [3u64, 9, 9, 4, 20, 20] {
            acc.update(now);
            assert!(acc.acc_reward_per_share >= last);
            last = acc.acc_reward_per_share;
        }
        assert_eq!(acc.last_reward_timestamp, 20);
    }

    #[test]
    fn proportional_split_between_stakers() {
        let mut acc = RewardAccumulator::new(90, 0);
        let mut a = Position::default();
        let mut b = Position::default();
        acc.deposit_shares(&mut a, 1, 0);
        acc.deposit_shares(&mut b, 2, 0);

        acc.update(10);
        assert_eq!(acc.pending(&a), 300);
        assert_eq!(acc.pending(&b), 600);
    }

    #[test]
    fn inject_distributes_only_with_shares() {
        let mut acc = RewardAccumulator::new(0, 0);
        assert_eq!(acc.inject(1_000), 0);

        let mut pos = Position::default();
        acc.deposit_shares(&mut pos, 4, 0);
        assert_eq!(acc.inject(1_000), 1_000);
        assert_eq!(acc.pending(&pos), 1_000);
    }

    #[test]
    fn set_rate_checkpoints_first() {
        let mut acc = RewardAccumulator::new(100, 0);
        let mut pos = Position::default();
        acc.deposit_shares(&mut pos, 1, 0);

        acc.set_rate(1, 10);
        acc.update(20);
        // 10s at 100/s plus 10s at 1/s.
        assert_eq!(acc.pending(&pos), 1_010);
    }
}
