use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Register a strategy as the next pool
///
/// Several `register_pool` instructions in one transaction register a batch
/// atomically.
#[derive(Accounts)]
pub struct RegisterPool<'info> {
    /// Vault owner
    /// Security: has_one constraint on vault_config
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
        has_one = owner @ VaultError::Unauthorized,
    )]
    pub vault_config: Account<'info, VaultConfig>,

    /// Strategy to register
    /// Security: must belong to this vault and not back a pool yet
    #[account(
        mut,
        constraint = strategy.vault_config == vault_config.key() @ VaultError::StrategyVaultMismatch,
        constraint = strategy.pool_id.is_none() @ VaultError::StrategyAlreadyRegistered,
    )]
    pub strategy: Account<'info, StrategyState>,

    #[account(
        init,
        payer = owner,
        space = 8 + Pool::INIT_SPACE,
        seeds = [POOL_SEED, &vault_config.pool_count.to_le_bytes()],
        bump
    )]
    pub pool: Account<'info, Pool>,

    pub system_program: Program<'info, System>,
}

pub fn register_pool_handler(ctx: Context<RegisterPool>) -> Result<()> {
    let pool_id = ctx.accounts.vault_config.next_pool_id()?;

    let strategy = &mut ctx.accounts.strategy;
    strategy.pool_id = Some(pool_id);

    let pool = &mut ctx.accounts.pool;
    pool.pool_id = pool_id;
    pool.stake_mint = strategy.stake_mint;
    pool.strategy = strategy.key();
    pool.bump = ctx.bumps.pool;

    msg!("Registered pool {} for strategy {}", pool_id, pool.strategy);

    emit!(PoolRegistered {
        pool: pool.key(),
        pool_id,
        strategy: pool.strategy,
        stake_mint: pool.stake_mint,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
