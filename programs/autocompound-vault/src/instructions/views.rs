//! Read-only instructions. Results travel back as return data; nothing is
//! written.

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    accounting::StrategyAccounts,
    constants::*,
    errors::*,
    state::*,
    utils::{load_program_account, AccountCursor},
};

/// Positions and active-pool sets that were never created read as empty
fn load_or_default<T>(info: &AccountInfo) -> Result<T>
where
    T: AccountDeserialize + Owner + Default,
{
    if info.data_is_empty() {
        return Ok(T::default());
    }
    load_program_account(info)
}

#[derive(Accounts)]
pub struct PoolLength<'info> {
    #[account(
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
    )]
    pub vault_config: Account<'info, VaultConfig>,
}

pub fn pool_length_handler(ctx: Context<PoolLength>) -> Result<u32> {
    Ok(ctx.accounts.vault_config.pool_count)
}

#[derive(Accounts)]
pub struct UserStakedPools<'info> {
    /// CHECK: only used to derive the active-pool set
    pub user: UncheckedAccount<'info>,

    /// CHECK: may not exist yet; deserialized by the handler
    #[account(
        seeds = [USER_POOLS_SEED, user.key().as_ref()],
        bump,
    )]
    pub user_pools: UncheckedAccount<'info>,
}

pub fn user_staked_pools_handler(ctx: Context<UserStakedPools>) -> Result<Vec<u32>> {
    let user_pools: UserPools = load_or_default(&ctx.accounts.user_pools)?;
    Ok(user_pools.pools)
}

#[derive(Accounts)]
pub struct UserRules<'info> {
    /// CHECK: only used to derive the position
    pub user: UncheckedAccount<'info>,

    #[account(
        seeds = [POOL_SEED, &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
    )]
    pub pool: Account<'info, Pool>,

    /// CHECK: may not exist yet; deserialized by the handler
    #[account(
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump,
    )]
    pub position: UncheckedAccount<'info>,
}

pub fn user_rules_length_handler(ctx: Context<UserRules>) -> Result<u32> {
    let position: UserPosition = load_or_default(&ctx.accounts.position)?;
    Ok(position.rules.len() as u32)
}

pub fn user_pool_rule_handler(ctx: Context<UserRules>, index: u32) -> Result<Rule> {
    let position: UserPosition = load_or_default(&ctx.accounts.position)?;
    Ok(position.rule(index as usize)?.clone())
}

/// Stake tokens `user`'s shares in a pool currently redeem for
///
/// Remaining accounts: farm group.
#[derive(Accounts)]
pub struct StakedWantTokens<'info> {
    /// CHECK: only used to derive the position
    pub user: UncheckedAccount<'info>,

    #[account(
        seeds = [POOL_SEED, &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
        has_one = strategy @ VaultError::AccountMismatch,
        has_one = stake_mint @ VaultError::InvalidMint,
    )]
    pub pool: Box<Account<'info, Pool>>,

    pub strategy: Box<Account<'info, StrategyState>>,

    pub stake_mint: Box<Account<'info, Mint>>,

    /// CHECK: PDA owning the strategy token accounts, validated by seeds
    #[account(
        seeds = [STRATEGY_AUTHORITY_SEED, strategy.key().as_ref()],
        bump = strategy.authority_bump,
    )]
    pub strategy_authority: UncheckedAccount<'info>,

    #[account(
        associated_token::mint = stake_mint,
        associated_token::authority = strategy_authority,
    )]
    pub strategy_stake_token: Box<Account<'info, TokenAccount>>,

    /// CHECK: may not exist yet; deserialized by the handler
    #[account(
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump,
    )]
    pub position: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn staked_want_tokens_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, StakedWantTokens<'info>>,
) -> Result<u64> {
    let accounts = &ctx.accounts;
    let position: UserPosition = load_or_default(&accounts.position)?;
    if position.shares == 0 {
        return Ok(0);
    }

    let mut cursor = AccountCursor::new(ctx.remaining_accounts);
    let strategy_accounts = StrategyAccounts::load(
        accounts.strategy.key(),
        &accounts.strategy,
        accounts.strategy_authority.to_account_info(),
        accounts.strategy_stake_token.to_account_info(),
        accounts.token_program.to_account_info(),
        &mut cursor,
    )?;

    position.redeemable(
        strategy_accounts.total_stake_tokens()?,
        accounts.strategy.shares_total,
    )
}
