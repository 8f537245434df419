use anchor_lang::prelude::*;

use crate::{constants::*, events::*, state::*};

/// Create the process-wide vault configuration
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Becomes owner and fee setter
    /// Security: Must be signer, pays for the config account
    #[account(mut)]
    pub owner: Signer<'info>,

    /// Vault configuration PDA
    /// Security: Singleton, `init` fails if it already exists
    #[account(
        init,
        payer = owner,
        space = 8 + VaultConfig::INIT_SPACE,
        seeds = [VAULT_CONFIG_SEED],
        bump
    )]
    pub vault_config: Account<'info, VaultConfig>,

    pub system_program: Program<'info, System>,
}

pub fn initialize_handler(ctx: Context<Initialize>, fee_address: Pubkey) -> Result<()> {
    let config = &mut ctx.accounts.vault_config;

    // EFFECTS: Initialize configuration with default fees
    config.owner = ctx.accounts.owner.key();
    config.fee_setter = ctx.accounts.owner.key();
    config.fee_address = fee_address;
    config.deposit_fee_bps = DEFAULT_DEPOSIT_FEE_BPS;
    config.withdraw_fee_bps = DEFAULT_WITHDRAW_FEE_BPS;
    config.performance_fee_bps = DEFAULT_PERFORMANCE_FEE_BPS;
    config.rule_fee_bps = DEFAULT_RULE_FEE_BPS;
    config.performance_fee_bounty_bps = DEFAULT_PERFORMANCE_FEE_BOUNTY_BPS;
    config.rule_fee_bounty_bps = DEFAULT_RULE_FEE_BOUNTY_BPS;
    config.operators = Vec::new();
    config.pool_count = 0;
    config.entered = false;
    config.rule_execution_locked = false;
    config.bump = ctx.bumps.vault_config;

    // INTERACTIONS: Emit event
    emit!(VaultInitialized {
        vault_config: config.key(),
        owner: config.owner,
        fee_address,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
