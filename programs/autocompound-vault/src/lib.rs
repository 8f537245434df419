// Autocompound Vault - share-based yield vault with user-authored automation rules
// Security: Reentrancy guard and rule lock persisted in VaultConfig before any external call
// Architecture: Pools backed by one strategy each; farms, routers and rule plugins reached over CPI

use anchor_lang::prelude::*;

pub mod accounting;
pub mod adapters;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod math;
pub mod plugins;
pub mod state;
pub mod swap;
pub mod utils;

use instructions::*;
use state::{FeeKind, Rule};

declare_id!("RVau1tg48gSTBib15hCi7tgivNKC3n4VhVrtD2jB4H5");

#[program]
pub mod autocompound_vault {
    use super::*;

    /// Create the vault configuration with default fees
    ///
    /// Security considerations:
    /// - Singleton PDA, can only be created once
    /// - Signer becomes owner and fee setter
    pub fn initialize(ctx: Context<Initialize>, fee_address: Pubkey) -> Result<()> {
        instructions::initialize::initialize_handler(ctx, fee_address)
    }

    /// Register a strategy as the next pool
    ///
    /// Security considerations:
    /// - Owner-only function (has_one constraint)
    /// - A strategy backs at most one pool
    pub fn register_pool(ctx: Context<RegisterPool>) -> Result<()> {
        instructions::register_pool::register_pool_handler(ctx)
    }

    /// Deposit stake tokens and credit shares to `beneficiary`
    ///
    /// Security considerations:
    /// - Validates depositor token account (mint, owner)
    /// - Shares derive from measured balance deltas
    /// - Reentrancy guard held for the body
    /// - Emits event for tracking
    pub fn deposit<'info>(
        ctx: Context<'_, '_, '_, 'info, DepositToPool<'info>>,
        amount: u64,
        beneficiary: Pubkey,
    ) -> Result<()> {
        instructions::deposit::deposit_handler(ctx, amount, beneficiary)
    }

    /// Withdraw up to `amount` stake tokens after a best-effort harvest
    pub fn withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, WithdrawFromPool<'info>>,
        amount: u64,
    ) -> Result<()> {
        instructions::withdraw::withdraw_handler(ctx, amount, false)
    }

    /// Withdraw everything the caller's shares redeem for
    pub fn withdraw_all<'info>(
        ctx: Context<'_, '_, '_, 'info, WithdrawFromPool<'info>>,
    ) -> Result<()> {
        instructions::withdraw::withdraw_handler(ctx, u64::MAX, false)
    }

    /// Withdraw everything without harvesting first
    ///
    /// Security considerations:
    /// - Stays available while the farm's reward side is broken
    pub fn emergency_withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, WithdrawFromPool<'info>>,
    ) -> Result<()> {
        instructions::withdraw::withdraw_handler(ctx, u64::MAX, true)
    }

    /// Harvest and compound one pool, paying the caller the performance bounty
    pub fn earn<'info>(ctx: Context<'_, '_, '_, 'info, Earn<'info>>) -> Result<u64> {
        instructions::earn::earn_handler(ctx)
    }

    /// Harvest and compound several pools packed in remaining accounts
    pub fn earn_many<'info>(
        ctx: Context<'_, '_, '_, 'info, Earn<'info>>,
        group_lens: Vec<u8>,
    ) -> Result<u64> {
        instructions::earn::earn_many_handler(ctx, group_lens)
    }

    /// Attach an "if condition then action" rule to the caller's position
    ///
    /// Security considerations:
    /// - Plugins must identify as condition / action
    /// - Argument counts and rule count are capped
    pub fn add_rule(ctx: Context<AddRule>, rule: Rule) -> Result<u32> {
        instructions::rules::add_handler(ctx, rule)
    }

    pub fn remove_rule(ctx: Context<RemoveRule>, index: u32) -> Result<()> {
        instructions::rules::remove_handler(ctx, index)
    }

    /// Evaluate a rule's condition without executing it
    pub fn check_rule<'info>(
        ctx: Context<'_, '_, '_, 'info, CheckRule<'info>>,
        index: u32,
    ) -> Result<bool> {
        instructions::check_rule::check_rule_handler(ctx, index)
    }

    /// Execute a user's rule and collect the executor's share of the rule fee
    ///
    /// Security considerations:
    /// - Top-level instructions only
    /// - Global rule lock and reentrancy guard persisted before plugin calls
    /// - Action output clamped to the user's redeemable balance
    /// - Emits event for tracking
    pub fn execute_rule<'info>(
        ctx: Context<'_, '_, '_, 'info, ExecuteRule<'info>>,
        index: u32,
    ) -> Result<()> {
        instructions::execute_rule::execute_rule_handler(ctx, index)
    }

    pub fn set_fee(ctx: Context<OwnerOnly>, kind: FeeKind, bps: u16) -> Result<()> {
        instructions::admin::set_fee_handler(ctx, kind, bps)
    }

    pub fn set_fee_address(ctx: Context<FeeSetterOnly>, new_fee_address: Pubkey) -> Result<()> {
        instructions::admin::set_fee_address_handler(ctx, new_fee_address)
    }

    pub fn set_fee_setter(ctx: Context<FeeSetterOnly>, new_fee_setter: Pubkey) -> Result<()> {
        instructions::admin::set_fee_setter_handler(ctx, new_fee_setter)
    }

    pub fn set_operator(ctx: Context<OwnerOnly>, operator: Pubkey, enabled: bool) -> Result<()> {
        instructions::admin::set_operator_handler(ctx, operator, enabled)
    }

    pub fn transfer_ownership(ctx: Context<OwnerOnly>, new_owner: Pubkey) -> Result<()> {
        instructions::admin::transfer_ownership_handler(ctx, new_owner)
    }

    /// Create a strategy
    ///
    /// Security considerations:
    /// - Operator-only function
    /// - Paired strategies need two distinct constituent mints
    pub fn init_strategy(ctx: Context<InitStrategy>, args: InitStrategyArgs) -> Result<()> {
        instructions::strategy_admin::init_handler(ctx, args)
    }

    pub fn pause(ctx: Context<ConfigureStrategy>) -> Result<()> {
        instructions::strategy_admin::pause_handler(ctx)
    }

    /// Fails once the strategy has been emergency withdrawn
    pub fn unpause(ctx: Context<ConfigureStrategy>) -> Result<()> {
        instructions::strategy_admin::unpause_handler(ctx)
    }

    /// Exit the farm and latch the strategy paused
    ///
    /// Security considerations:
    /// - Operator-only function
    /// - One-way: the strategy can never be unpaused afterwards
    pub fn emergency_farm_withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, StrategyFunds<'info>>,
    ) -> Result<()> {
        instructions::strategy_admin::emergency_farm_withdraw_handler(ctx)
    }

    pub fn set_use_liquidity_router(
        ctx: Context<ConfigureStrategy>,
        use_liquidity_router: bool,
    ) -> Result<()> {
        instructions::strategy_admin::set_use_liquidity_router_handler(ctx, use_liquidity_router)
    }

    pub fn set_swap_path(
        ctx: Context<ConfigureStrategy>,
        from: Pubkey,
        to: Pubkey,
        path: Vec<Pubkey>,
    ) -> Result<()> {
        instructions::strategy_admin::set_swap_path_handler(ctx, from, to, path)
    }

    pub fn set_extra_earn_tokens<'info>(
        ctx: Context<'_, '_, '_, 'info, ConfigureStrategy<'info>>,
        mints: Vec<Pubkey>,
    ) -> Result<()> {
        instructions::strategy_admin::set_extra_earn_tokens_handler(ctx, mints)
    }

    /// Sweep one held asset into the earn asset
    pub fn token_to_earn<'info>(
        ctx: Context<'_, '_, '_, 'info, StrategyFunds<'info>>,
        mint: Pubkey,
    ) -> Result<u64> {
        instructions::strategy_admin::token_to_earn_handler(ctx, mint)
    }

    pub fn pool_length(ctx: Context<PoolLength>) -> Result<u32> {
        instructions::views::pool_length_handler(ctx)
    }

    pub fn user_staked_pools(ctx: Context<UserStakedPools>) -> Result<Vec<u32>> {
        instructions::views::user_staked_pools_handler(ctx)
    }

    pub fn user_rules_length(ctx: Context<UserRules>) -> Result<u32> {
        instructions::views::user_rules_length_handler(ctx)
    }

    pub fn user_pool_rule(ctx: Context<UserRules>, index: u32) -> Result<Rule> {
        instructions::views::user_pool_rule_handler(ctx, index)
    }

    pub fn staked_want_tokens<'info>(
        ctx: Context<'_, '_, '_, 'info, StakedWantTokens<'info>>,
    ) -> Result<u64> {
        instructions::views::staked_want_tokens_handler(ctx)
    }
}
