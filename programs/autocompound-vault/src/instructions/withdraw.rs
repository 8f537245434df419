use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    accounting::{HarvestAccounts, StrategyAccounts, WithdrawTargets},
    constants::*,
    errors::*,
    ledger::{self, PoolLedger, PositionBook},
    state::*,
    utils::AccountCursor,
};

/// Withdraw the caller's own stake tokens to the caller
///
/// Shared by `withdraw`, `withdraw_all` and `emergency_withdraw`.
/// Remaining accounts: farm group, then an optional harvest group.
#[derive(Accounts)]
pub struct WithdrawFromPool<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
    )]
    pub vault_config: Box<Account<'info, VaultConfig>>,

    #[account(
        seeds = [POOL_SEED, &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
        has_one = strategy @ VaultError::AccountMismatch,
        has_one = stake_mint @ VaultError::InvalidMint,
    )]
    pub pool: Box<Account<'info, Pool>>,

    #[account(mut)]
    pub strategy: Box<Account<'info, StrategyState>>,

    pub stake_mint: Box<Account<'info, Mint>>,

    /// CHECK: PDA owning the strategy token accounts, validated by seeds
    #[account(
        seeds = [STRATEGY_AUTHORITY_SEED, strategy.key().as_ref()],
        bump = strategy.authority_bump,
    )]
    pub strategy_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        associated_token::mint = stake_mint,
        associated_token::authority = strategy_authority,
    )]
    pub strategy_stake_token: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = owner_token.mint == pool.stake_mint @ VaultError::InvalidMint,
        constraint = owner_token.owner == owner.key() @ VaultError::InvalidOwner,
    )]
    pub owner_token: Box<Account<'info, TokenAccount>>,

    /// Receives the withdraw fee
    #[account(
        mut,
        constraint = fee_collector_stake_token.mint == pool.stake_mint @ VaultError::InvalidMint,
        constraint = fee_collector_stake_token.owner == vault_config.fee_address @ VaultError::InvalidOwner,
    )]
    pub fee_collector_stake_token: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        seeds = [POSITION_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump = position.bump,
    )]
    pub position: Box<Account<'info, UserPosition>>,

    #[account(
        mut,
        seeds = [USER_POOLS_SEED, owner.key().as_ref()],
        bump = user_pools.bump,
    )]
    pub user_pools: Box<Account<'info, UserPools>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Withdraw `requested` (clamped to the redeemable amount), no bounty and no
/// rule fee. `skip_harvest` is the emergency mode.
pub fn withdraw_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, WithdrawFromPool<'info>>,
    requested: u64,
    skip_harvest: bool,
) -> Result<()> {
    require!(requested > 0, VaultError::ZeroAmount);
    ledger::enter(&mut ctx.accounts.vault_config)?;

    let accounts = &mut *ctx.accounts;
    let mut cursor = AccountCursor::new(ctx.remaining_accounts);
    let strategy_accounts = StrategyAccounts::load(
        accounts.strategy.key(),
        &accounts.strategy,
        accounts.strategy_authority.to_account_info(),
        accounts.strategy_stake_token.to_account_info(),
        accounts.token_program.to_account_info(),
        &mut cursor,
    )?;
    let harvest = if skip_harvest {
        None
    } else {
        HarvestAccounts::try_from_cursor(
            &mut cursor,
            &accounts.strategy,
            &strategy_accounts,
            &accounts.vault_config.fee_address,
        )
    };

    let recipient = accounts.owner_token.to_account_info();
    let fee_collector = accounts.fee_collector_stake_token.to_account_info();
    let system_program = accounts.system_program.to_account_info();
    let targets = WithdrawTargets {
        recipient: &recipient,
        fee_collector: &fee_collector,
        bounty_hunter: None,
    };

    let mut pool_ledger = PoolLedger {
        config: &accounts.vault_config,
        book: PositionBook {
            pool_id: accounts.pool.pool_id,
            strategy: &mut accounts.strategy,
            position: &mut accounts.position,
            user_pools: &mut accounts.user_pools,
        },
        accounts: &strategy_accounts,
        harvest: harvest.as_ref(),
        system_program: &system_program,
    };
    let withdrawn = pool_ledger.withdraw(requested, 0, &targets, skip_harvest)?;

    msg!(
        "Withdrew {} from pool {}{}",
        withdrawn,
        accounts.pool.pool_id,
        if skip_harvest { " (emergency)" } else { "" }
    );

    ledger::leave(&mut accounts.vault_config);
    Ok(())
}
