//! Dutch liquidation auction: armed at borrow time, opens the instant the
//! repayment deadline passes, and settles on the first bid.

use near_sdk::json_types::U128;
use near_sdk::{env, near, serde_json, AccountId};

use crate::events::*;
use crate::*;

impl Lending {
    /// Piecewise step price: `start_price` before the auction opens,
    /// `end_price` after it runs out, otherwise a linear step-down every
    /// `drop_interval_seconds`.
    pub(crate) fn dutch_price(auction: &DutchAuction, now: u64) -> u128 {
        if now < auction.start_time {
            return auction.start_price;
        }
        if now >= auction.start_time + auction.duration_seconds {
            return auction.end_price;
        }
        let steps = ((now - auction.start_time) / auction.drop_interval_seconds) as u128;
        let total_steps = (auction.duration_seconds / auction.drop_interval_seconds) as u128;
        let drop_per_step = (auction.start_price - auction.end_price) / total_steps;
        auction.start_price - steps * drop_per_step
    }
}

#[near]
impl Lending {
    /// Current asking price for a defaulted loan's collateral.
    pub fn get_dutch_price(&self, nft_contract_id: AccountId, token_id: String) -> Option<U128> {
        let key = format!("{}:{}", nft_contract_id, token_id);
        self.loans
            .get(&key)
            .map(|loan| U128(Self::dutch_price(&loan.auction, now_seconds())))
    }

    /// First successful bid wins: the bidder pays the current Dutch price,
    /// the collateral goes to the bidder, the lender side receives
    /// `bid - fee` where the fee is half the markup over `end_price`, and
    /// the loan (with its delegation bookkeeping) is cleared.
    #[payable]
    #[handle_result]
    pub fn bid(
        &mut self,
        nft_contract_id: AccountId,
        token_id: String,
    ) -> Result<U128, LendingError> {
        let bidder_id = env::predecessor_account_id();
        self.internal_credit(&bidder_id, env::attached_deposit().as_yoctonear());

        let key = format!("{}:{}", nft_contract_id, token_id);
        let loan = self
            .loans
            .get(&key)
            .cloned()
            .ok_or_else(LendingError::no_active_loan)?;
        let now = now_seconds();
        if now < loan.auction.start_time {
            return Err(LendingError::InvalidState(
                "Liquidation auction has not opened yet".into(),
            ));
        }
        if bidder_id == loan.borrower_id {
            return Err(LendingError::InvalidInput(
                "The borrower repays instead of bidding".into(),
            ));
        }

        let price = Self::dutch_price(&loan.auction, now);
        self.internal_debit(&bidder_id, price)?;

        // Half the markup over the floor is the liquidation fee.
        let fee = (price - loan.auction.end_price) / 2;
        let treasury_id = self.treasury_id.clone();
        self.internal_credit(&treasury_id, fee);
        self.internal_distribute_proceeds(&loan, price - fee);

        self.loans.remove(&key);
        self.internal_return_collateral(&nft_contract_id, &token_id, &bidder_id);

        emit_event(
            EVENT_AUCTION_BID,
            &bidder_id,
            serde_json::json!({
                "nft_contract_id": nft_contract_id.to_string(),
                "token_id": token_id,
                "price": price.to_string(),
                "fee": fee.to_string(),
                "lender_proceeds": (price - fee).to_string()
            }),
        );
        Ok(U128(price))
    }
}
