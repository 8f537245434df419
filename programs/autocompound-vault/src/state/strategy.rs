use anchor_lang::prelude::*;
use anchor_spl::token::spl_token::native_mint;

use crate::{constants::*, errors::VaultError, math::{mul_div, mul_div_ceil}};

/// Method naming scheme of the external farm a strategy stakes into
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub enum FarmKind {
    /// deposit / withdraw / emergency_withdraw
    #[default]
    Simple,
    /// enter_staking / leave_staking / emergency_withdraw
    Staking,
    /// deposit(amount, referrer) / withdraw / emergency_withdraw
    Referral,
}

/// Accounts and encoding details of the external farm
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct FarmConfig {
    pub kind: FarmKind,
    pub program: Pubkey,
    pub farm_state: Pubkey,

    /// Farm-side record of what this strategy has staked
    pub user_stake: Pubkey,

    pub stake_vault: Pubkey,
    pub reward_vault: Pubkey,

    /// Byte offset of the little-endian u64 staked amount inside `user_stake`
    pub staked_amount_offset: u16,

    /// Only used by `FarmKind::Referral`
    pub referrer: Pubkey,
}

/// Configured swap route between two mints
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq, InitSpace)]
pub struct SwapPath {
    pub from: Pubkey,
    pub to: Pubkey,
    #[max_len(4)]
    pub path: Vec<Pubkey>,
}

/// Accounting state of one auto-compounding strategy
///
/// PDA derived from ["strategy", stake_mint, farm_state]. Funds are held by
/// the authority PDA ["strategy_authority", strategy] and staked in the farm.
/// `shares_total` equals the sum of every position's shares in the pool.
#[account]
#[derive(InitSpace, Default)]
pub struct StrategyState {
    pub vault_config: Pubkey,

    /// Set once by `register_pool`; a strategy backs at most one pool
    pub pool_id: Option<u32>,

    pub stake_mint: Pubkey,

    /// Reward asset paid out by the farm on harvest
    pub earn_mint: Pubkey,

    /// Paired strategies stake LP tokens minted from token0 + token1
    pub paired: bool,
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,

    pub farm: FarmConfig,

    pub swap_router: Pubkey,
    pub liquidity_router: Pubkey,

    /// Route swaps through the liquidity router instead of the swap router
    pub use_liquidity_router: bool,

    pub shares_total: u64,

    pub paused: bool,

    /// One-way latch: once set the strategy can never be unpaused
    pub emergency_withdrawn: bool,

    #[max_len(8)]
    pub swap_paths: Vec<SwapPath>,

    #[max_len(5)]
    pub extra_earn_mints: Vec<Pubkey>,

    pub bump: u8,
    pub authority_bump: u8,
}

impl StrategyState {
    /// Everything the strategy controls: on-hand balance plus farm stake
    pub fn total_stake_tokens(on_hand: u64, farm_staked: u64) -> Result<u64> {
        on_hand
            .checked_add(farm_staked)
            .ok_or(error!(VaultError::MathOverflow))
    }

    /// Shares to mint for a deposit, measured from the actual change in
    /// total stake tokens.
    ///
    /// First deposit (no shares, or nothing staked before): shares = delta.
    /// Otherwise: shares = delta * shares_total / total_before, rounded down.
    pub fn shares_for_deposit(&self, total_before: u64, total_after: u64) -> Result<u64> {
        let delta = total_after.saturating_sub(total_before);

        if self.shares_total == 0 || total_before == 0 {
            return Ok(delta);
        }

        mul_div(delta, self.shares_total, total_before)
    }

    /// Shares to burn for withdrawing `amount`: ceil(amount * shares_total /
    /// total_stake_tokens), never more than shares_total.
    pub fn shares_for_withdraw(&self, amount: u64, total_stake_tokens: u64) -> Result<u64> {
        if amount == 0 {
            return Ok(0);
        }
        require!(self.shares_total > 0, VaultError::PoolHasNoShares);
        require!(total_stake_tokens > 0, VaultError::DivisionByZero);

        let shares = mul_div_ceil(amount, self.shares_total, total_stake_tokens)?;
        Ok(shares.min(self.shares_total))
    }

    pub fn mint_shares(&mut self, shares: u64) -> Result<()> {
        self.shares_total = self
            .shares_total
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    pub fn burn_shares(&mut self, shares: u64) -> Result<()> {
        self.shares_total = self
            .shares_total
            .checked_sub(shares)
            .ok_or(VaultError::MathUnderflow)?;
        Ok(())
    }

    /// Router used for every swap of this strategy
    pub fn active_router(&self) -> Pubkey {
        if self.use_liquidity_router {
            self.liquidity_router
        } else {
            self.swap_router
        }
    }

    pub fn swap_path(&self, from: &Pubkey, to: &Pubkey) -> Option<&Vec<Pubkey>> {
        self.swap_paths
            .iter()
            .find(|p| p.from == *from && p.to == *to)
            .map(|p| &p.path)
    }

    /// Configured path, or a direct hop when none is stored
    pub fn route(&self, from: &Pubkey, to: &Pubkey) -> Vec<Pubkey> {
        self.swap_path(from, to)
            .cloned()
            .unwrap_or_else(|| vec![*from, *to])
    }

    /// Path used to sweep a stray asset into the earn asset: the configured
    /// one, or a default hop through the wrapped native mint.
    pub fn sweep_route(&self, asset: &Pubkey) -> Vec<Pubkey> {
        if let Some(path) = self.swap_path(asset, &self.earn_mint) {
            return path.clone();
        }
        if *asset == native_mint::ID || self.earn_mint == native_mint::ID {
            vec![*asset, self.earn_mint]
        } else {
            vec![*asset, native_mint::ID, self.earn_mint]
        }
    }

    /// Store, replace, or (with an empty path) clear the route for a pair
    pub fn set_swap_path(&mut self, from: Pubkey, to: Pubkey, path: Vec<Pubkey>) -> Result<()> {
        let existing = self
            .swap_paths
            .iter()
            .position(|p| p.from == from && p.to == to);

        if path.is_empty() {
            if let Some(index) = existing {
                self.swap_paths.swap_remove(index);
            }
            return Ok(());
        }

        require!(
            (MIN_SWAP_PATH_LEN..=MAX_SWAP_PATH_LEN).contains(&path.len()),
            VaultError::InvalidSwapPath
        );
        require!(
            path.first() == Some(&from) && path.last() == Some(&to),
            VaultError::InvalidSwapPath
        );

        match existing {
            Some(index) => self.swap_paths[index].path = path,
            None => {
                require!(
                    self.swap_paths.len() < MAX_SWAP_PATHS,
                    VaultError::SwapPathTableFull
                );
                self.swap_paths.push(SwapPath { from, to, path });
            }
        }
        Ok(())
    }

    pub fn set_extra_earn_mints(&mut self, mints: Vec<Pubkey>) -> Result<()> {
        require!(
            mints.len() <= MAX_EXTRA_EARN_TOKENS,
            VaultError::TooManyExtraEarnTokens
        );
        require!(
            !mints.iter().any(|mint| self.is_protected_mint(mint)),
            VaultError::InvalidMint
        );
        self.extra_earn_mints = mints;
        Ok(())
    }

    /// Assets that `token_to_earn` never touches
    pub fn is_protected_mint(&self, mint: &Pubkey) -> bool {
        *mint == self.stake_mint || *mint == self.earn_mint
    }

    pub fn pause(&mut self) -> Result<()> {
        require!(!self.paused, VaultError::StrategyPaused);
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self) -> Result<()> {
        require!(!self.emergency_withdrawn, VaultError::EmergencyWithdrawn);
        require!(self.paused, VaultError::StrategyNotPaused);
        self.paused = false;
        Ok(())
    }

    /// Pause (if not already) and set the one-way emergency latch
    pub fn latch_emergency(&mut self) {
        self.paused = true;
        self.emergency_withdrawn = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy_with_shares(shares_total: u64) -> StrategyState {
        StrategyState {
            shares_total,
            stake_mint: Pubkey::new_unique(),
            earn_mint: Pubkey::new_unique(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_deposit_mints_actual_delta() {
        let strategy = strategy_with_shares(0);
        assert_eq!(strategy.shares_for_deposit(0, 1000).unwrap(), 1000);
    }

    #[test]
    fn test_deposit_into_emptied_farm_is_treated_as_first() {
        // shares exist but nothing is staked any more
        let strategy = strategy_with_shares(500);
        assert_eq!(strategy.shares_for_deposit(0, 42).unwrap(), 42);
    }

    #[test]
    fn test_deposit_after_compounding() {
        // 1000 shares backed by 2000 tokens: 500 new tokens buy 250 shares
        let strategy = strategy_with_shares(1000);
        assert_eq!(strategy.shares_for_deposit(2000, 2500).unwrap(), 250);
    }

    #[test]
    fn test_deposit_rounds_down() {
        let strategy = strategy_with_shares(333);
        assert_eq!(strategy.shares_for_deposit(1000, 1100).unwrap(), 33);
    }

    #[test]
    fn test_deposit_with_negative_delta_mints_nothing() {
        let strategy = strategy_with_shares(100);
        assert_eq!(strategy.shares_for_deposit(1000, 990).unwrap(), 0);
    }

    #[test]
    fn test_withdraw_rounds_up() {
        // 10 tokens of 3000 with 1000 shares = 3.33.. shares -> 4
        let strategy = strategy_with_shares(1000);
        assert_eq!(strategy.shares_for_withdraw(10, 3000).unwrap(), 4);
        assert_eq!(strategy.shares_for_withdraw(30, 3000).unwrap(), 10);
    }

    #[test]
    fn test_withdraw_never_burns_more_than_total() {
        let strategy = strategy_with_shares(1000);
        assert_eq!(strategy.shares_for_withdraw(u64::MAX / 2_000, 10).unwrap(), 1000);
    }

    #[test]
    fn test_withdraw_from_empty_pool_fails() {
        let strategy = strategy_with_shares(0);
        assert!(strategy.shares_for_withdraw(10, 100).is_err());
        assert_eq!(strategy.shares_for_withdraw(0, 100).unwrap(), 0);
    }

    #[test]
    fn test_burn_more_than_total_is_an_error() {
        let mut strategy = strategy_with_shares(10);
        assert!(strategy.burn_shares(11).is_err());
        assert_eq!(strategy.shares_total, 10);
    }

    #[test]
    fn test_unpause_is_blocked_after_emergency() {
        let mut strategy = strategy_with_shares(0);
        strategy.pause().unwrap();
        strategy.unpause().unwrap();
        assert!(!strategy.paused);

        strategy.latch_emergency();
        assert!(strategy.paused);
        assert!(strategy.unpause().is_err());
        assert!(strategy.paused);
    }

    #[test]
    fn test_swap_path_validation() {
        let mut strategy = strategy_with_shares(0);
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        assert!(strategy.set_swap_path(a, b, vec![a]).is_err());
        assert!(strategy.set_swap_path(a, b, vec![b, a]).is_err());
        assert!(strategy.set_swap_path(a, b, vec![a, c, c, c, b]).is_err());

        strategy.set_swap_path(a, b, vec![a, c, b]).unwrap();
        assert_eq!(strategy.route(&a, &b), vec![a, c, b]);

        strategy.set_swap_path(a, b, vec![a, b]).unwrap();
        assert_eq!(strategy.swap_paths.len(), 1);
        assert_eq!(strategy.route(&a, &b), vec![a, b]);

        strategy.set_swap_path(a, b, vec![]).unwrap();
        assert!(strategy.swap_paths.is_empty());
    }

    #[test]
    fn test_sweep_route_defaults_through_native_mint() {
        let strategy = strategy_with_shares(0);
        let stray = Pubkey::new_unique();
        assert_eq!(
            strategy.sweep_route(&stray),
            vec![stray, native_mint::ID, strategy.earn_mint]
        );
        assert_eq!(
            strategy.sweep_route(&native_mint::ID),
            vec![native_mint::ID, strategy.earn_mint]
        );
    }

    #[test]
    fn test_sweep_route_prefers_configured_path() {
        let mut strategy = strategy_with_shares(0);
        let (stray, hop) = (Pubkey::new_unique(), Pubkey::new_unique());
        let earn = strategy.earn_mint;
        strategy.set_swap_path(stray, earn, vec![stray, hop, earn]).unwrap();
        assert_eq!(strategy.sweep_route(&stray), vec![stray, hop, earn]);
    }

    #[test]
    fn test_extra_earn_mints_capped_at_five() {
        let mut strategy = strategy_with_shares(0);
        let six: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();
        assert!(strategy.set_extra_earn_mints(six.clone()).is_err());
        strategy.set_extra_earn_mints(six[..5].to_vec()).unwrap();
        assert_eq!(strategy.extra_earn_mints.len(), 5);
    }

    #[test]
    fn test_extra_earn_mints_exclude_stake_and_earn() {
        let mut strategy = strategy_with_shares(0);
        let stake = strategy.stake_mint;
        assert!(strategy.set_extra_earn_mints(vec![Pubkey::new_unique(), stake]).is_err());
        assert!(strategy.extra_earn_mints.is_empty());
    }

    #[test]
    fn test_active_router_toggle() {
        let mut strategy = strategy_with_shares(0);
        strategy.swap_router = Pubkey::new_unique();
        strategy.liquidity_router = Pubkey::new_unique();
        assert_eq!(strategy.active_router(), strategy.swap_router);
        strategy.use_liquidity_router = true;
        assert_eq!(strategy.active_router(), strategy.liquidity_router);
    }
}
