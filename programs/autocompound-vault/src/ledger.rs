use anchor_lang::prelude::*;

use crate::{
    accounting::{self, HarvestAccounts, StrategyAccounts, WithdrawTargets},
    errors::VaultError,
    events::Withdrawn,
    state::{StrategyState, UserPools, UserPosition, VaultConfig},
};

/// Set the reentrancy guard and persist it so a nested invocation of this
/// program sees it
pub fn enter(config: &mut Account<'_, VaultConfig>) -> Result<()> {
    config.enter()?;
    config.exit(&crate::ID)
}

pub fn leave(config: &mut Account<'_, VaultConfig>) {
    config.leave();
}

/// Share bookkeeping of one owner in one pool. No tokens move here; callers
/// measure the strategy totals around the token transfers.
pub struct PositionBook<'r> {
    pub pool_id: u32,
    pub strategy: &'r mut StrategyState,
    pub position: &'r mut UserPosition,
    pub user_pools: &'r mut UserPools,
}

impl PositionBook<'_> {
    pub fn redeemable(&self, total_stake_tokens: u64) -> Result<u64> {
        self.position
            .redeemable(total_stake_tokens, self.strategy.shares_total)
    }

    /// Mint and credit the shares a deposit earned by moving the strategy
    /// total from `total_before` to `total_after`. The pool joins the
    /// owner's active set once the position holds shares.
    pub fn credit_deposit(&mut self, total_before: u64, total_after: u64) -> Result<u64> {
        let shares = self.strategy.shares_for_deposit(total_before, total_after)?;
        self.strategy.mint_shares(shares)?;
        self.position.credit(shares)?;
        if self.position.shares > 0 {
            self.user_pools.insert(self.pool_id)?;
        }
        Ok(shares)
    }

    /// Clamp `requested` to what the position redeems at `total_stake_tokens`,
    /// burn the matching shares and debit them. An emptied position leaves
    /// the owner's active set. Returns the clamped amount and the shares
    /// removed.
    pub fn debit_withdraw(&mut self, requested: u64, total_stake_tokens: u64) -> Result<(u64, u64)> {
        require!(self.position.shares > 0, VaultError::NoShares);

        let amount = requested.min(self.redeemable(total_stake_tokens)?);
        let shares = self.strategy.shares_for_withdraw(amount, total_stake_tokens)?;
        self.strategy.burn_shares(shares)?;
        if self.position.debit(shares) {
            self.user_pools.remove(self.pool_id);
        }
        Ok((amount, shares))
    }
}

/// Ledger view of one owner's position in one pool, wired to the strategy
/// accounts of the current instruction
pub struct PoolLedger<'r, 'a, 'info> {
    pub config: &'r VaultConfig,
    pub book: PositionBook<'r>,
    pub accounts: &'r StrategyAccounts<'a, 'info>,
    pub harvest: Option<&'r HarvestAccounts<'a, 'info>>,
    pub system_program: &'r AccountInfo<'info>,
}

impl<'r, 'a, 'info> PoolLedger<'r, 'a, 'info> {
    pub fn redeemable(&self) -> Result<u64> {
        self.book.redeemable(self.accounts.total_stake_tokens()?)
    }

    pub fn try_harvest(&mut self) {
        if let Some(report) = accounting::try_harvest(
            self.book.strategy,
            self.accounts,
            self.harvest,
            self.config,
            self.system_program,
        ) {
            msg!("Pre-withdraw harvest: {}", report.harvested);
        }
    }

    /// Shared withdrawal routine of direct withdraws and rule execution.
    ///
    /// Fails when the owner has no shares. Unless `skip_harvest`, runs a
    /// best-effort harvest first. The request is clamped to what the shares
    /// redeem; the burned shares are debited and the strategy pays out.
    /// Returns the clamped amount.
    pub fn withdraw(
        &mut self,
        requested: u64,
        rule_fee: u64,
        targets: &WithdrawTargets<'_, 'info>,
        skip_harvest: bool,
    ) -> Result<u64> {
        require!(self.book.position.shares > 0, VaultError::NoShares);

        if !skip_harvest {
            self.try_harvest();
        }

        let total_before = self.accounts.total_stake_tokens()?;
        let (amount, shares_removed) = self.book.debit_withdraw(requested, total_before)?;
        let settlement =
            accounting::withdraw(self.accounts, self.config, amount, total_before, rule_fee, targets)?;

        emit!(Withdrawn {
            pool_id: self.book.pool_id,
            owner: self.book.position.owner,
            recipient: *targets.recipient.key,
            amount: settlement.payout,
            shares_removed,
            shares_total: self.book.strategy.shares_total,
            bounty_hunter: targets.bounty_hunter.map(|hunter| *hunter.key),
            timestamp: Clock::get()?.unix_timestamp,
        });

        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book<'r>(
        strategy: &'r mut StrategyState,
        position: &'r mut UserPosition,
        user_pools: &'r mut UserPools,
    ) -> PositionBook<'r> {
        PositionBook {
            pool_id: 7,
            strategy,
            position,
            user_pools,
        }
    }

    #[test]
    fn test_enter_is_persisted_for_nested_calls() {
        let key = Pubkey::new_unique();
        let mut lamports = 1_000_000u64;
        let mut data = Vec::new();
        VaultConfig::default().try_serialize(&mut data).unwrap();
        data.resize(8 + VaultConfig::INIT_SPACE, 0);
        let info = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &crate::ID, false, 0);

        let mut outer: Account<VaultConfig> = Account::try_from(&info).unwrap();
        enter(&mut outer).unwrap();

        // a nested invocation reloads the config from account data
        let mut nested: Account<VaultConfig> = Account::try_from(&info).unwrap();
        assert!(nested.entered);
        assert!(enter(&mut nested).is_err());

        leave(&mut outer);
        outer.exit(&crate::ID).unwrap();
        let mut after: Account<VaultConfig> = Account::try_from(&info).unwrap();
        enter(&mut after).unwrap();
    }

    #[test]
    fn test_first_deposit_joins_active_set() {
        let (mut strategy, mut position, mut user_pools) =
            (StrategyState::default(), UserPosition::default(), UserPools::default());
        let mut book = book(&mut strategy, &mut position, &mut user_pools);

        assert_eq!(book.credit_deposit(0, 500).unwrap(), 500);
        assert_eq!(book.strategy.shares_total, 500);
        assert_eq!(book.position.shares, 500);
        assert!(book.user_pools.contains(7));
    }

    #[test]
    fn test_dust_deposit_minting_nothing_stays_out_of_active_set() {
        let mut strategy = StrategyState {
            shares_total: 10,
            ..Default::default()
        };
        let (mut position, mut user_pools) = (UserPosition::default(), UserPools::default());
        let mut book = book(&mut strategy, &mut position, &mut user_pools);

        // 1 token into a pool where a share is worth 100
        assert_eq!(book.credit_deposit(1_000, 1_001).unwrap(), 0);
        assert!(!book.user_pools.contains(7));
    }

    #[test]
    fn test_withdraw_clamps_burns_and_leaves_active_set() {
        let (mut strategy, mut position, mut user_pools) =
            (StrategyState::default(), UserPosition::default(), UserPools::default());
        let mut book = book(&mut strategy, &mut position, &mut user_pools);
        book.credit_deposit(0, 1_000).unwrap();

        let (amount, shares) = book.debit_withdraw(400, 2_000).unwrap();
        assert_eq!((amount, shares), (400, 200));
        assert!(book.user_pools.contains(7));

        let (amount, shares) = book.debit_withdraw(u64::MAX, 1_600).unwrap();
        assert_eq!((amount, shares), (1_600, 800));
        assert_eq!(book.position.shares, 0);
        assert_eq!(book.strategy.shares_total, 0);
        assert!(!book.user_pools.contains(7));
    }

    #[test]
    fn test_withdraw_without_shares_fails() {
        let (mut strategy, mut position, mut user_pools) =
            (StrategyState::default(), UserPosition::default(), UserPools::default());
        let mut book = book(&mut strategy, &mut position, &mut user_pools);
        assert!(book.debit_withdraw(1, 1_000).is_err());
    }
}
