//! Pure accounting primitives shared by the Salvor contracts: the
//! floor-price ordered list and the per-share reward accumulator.
//!
//! Nothing in this crate touches the NEAR host environment. Callers pass
//! timestamps in (seconds) and handle payouts themselves, which keeps the
//! invariants testable off-chain.

mod accumulator;
mod error;
mod floor_list;

pub use accumulator::{Position, RewardAccumulator, PRECISION};
pub use error::PoolError;
pub use floor_list::{FloorList, ListingNode, NO_NODE};

/// Basis-point denominator (10,000 = 100%).
pub const BASIS_POINTS: u128 = 10_000;

/// `total * bps / 10_000` with floor division. The rounding-down bias is
/// relied on by reconciliation tests and must not be "improved".
pub fn portion_of(total: u128, bps: u128) -> u128 {
    total * bps / BASIS_POINTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portion_of_rounds_down() {
        assert_eq!(portion_of(100, 500), 5);
        assert_eq!(portion_of(100, 1000), 10);
        // 9999/10000 of a unit can be lost per call.
        assert_eq!(portion_of(9_999, 1), 0);
        assert_eq!(portion_of(10_001, 1), 1);
    }
}
