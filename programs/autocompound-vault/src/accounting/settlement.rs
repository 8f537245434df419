use anchor_lang::prelude::*;

use crate::{errors::VaultError, math::apply_bps, state::VaultConfig};

/// Where the tokens of one withdrawal go
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawSettlement {
    /// Gross tokens leaving the strategy
    pub payout: u64,
    pub hunter_bounty: u64,
    pub rule_fee_to_collector: u64,
    pub withdraw_fee: u64,
    pub to_recipient: u64,
}

impl WithdrawSettlement {
    /// Split a withdrawal.
    ///
    /// The payout is clamped to what is on hand after unstaking and to the
    /// total the strategy held before. With a bounty hunter the rule fee
    /// (clamped to the payout) is split per `rule_fee_bounty_bps`. The
    /// withdraw fee is taken from what is left.
    pub fn plan(
        amount: u64,
        on_hand: u64,
        total_before: u64,
        rule_fee: u64,
        has_hunter: bool,
        config: &VaultConfig,
    ) -> Result<Self> {
        let payout = amount.min(on_hand).min(total_before);
        let mut remaining = payout;

        let (hunter_bounty, rule_fee_to_collector) = if has_hunter {
            let rule_fee = rule_fee.min(remaining);
            let bounty = apply_bps(rule_fee, config.rule_fee_bounty_bps)?;
            remaining -= rule_fee;
            (bounty, rule_fee - bounty)
        } else {
            (0, 0)
        };

        let withdraw_fee = apply_bps(remaining, config.withdraw_fee_bps)?;
        let to_recipient = remaining
            .checked_sub(withdraw_fee)
            .ok_or(VaultError::MathUnderflow)?;

        Ok(Self {
            payout,
            hunter_bounty,
            rule_fee_to_collector,
            withdraw_fee,
            to_recipient,
        })
    }
}

/// Split of freshly harvested earn tokens
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HarvestFees {
    pub performance_fee: u64,
    pub bounty: u64,
    pub to_collector: u64,
    /// Left for reinvestment
    pub reinvest: u64,
}

impl HarvestFees {
    pub fn plan(harvested: u64, has_hunter: bool, config: &VaultConfig) -> Result<Self> {
        let performance_fee = apply_bps(harvested, config.performance_fee_bps)?;
        let bounty = if has_hunter {
            apply_bps(performance_fee, config.performance_fee_bounty_bps)?
        } else {
            0
        };

        Ok(Self {
            performance_fee,
            bounty,
            to_collector: performance_fee - bounty,
            reinvest: harvested - performance_fee,
        })
    }
}
