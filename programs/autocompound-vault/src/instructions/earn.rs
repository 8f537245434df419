use anchor_lang::prelude::*;
use anchor_spl::token::{accessor, Token, TokenAccount};

use crate::{
    accounting::{self, HarvestAccounts, StrategyAccounts},
    constants::*,
    errors::*,
    events::*,
    ledger,
    state::*,
    utils::{load_program_account, AccountCursor},
};

/// Harvest and compound one or more pools for a bounty
///
/// Remaining accounts: one pool group per pool
/// (pool, strategy, strategy authority, strategy stake token, farm group,
/// harvest group).
#[derive(Accounts)]
pub struct Earn<'info> {
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
    )]
    pub vault_config: Box<Account<'info, VaultConfig>>,

    /// Caller's earn-asset account for the bounty; without it (or for pools
    /// with another earn asset) the harvest pays no bounty
    #[account(mut)]
    pub bounty_token: Option<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn earn_handler<'info>(ctx: Context<'_, '_, '_, 'info, Earn<'info>>) -> Result<u64> {
    let group_len = ctx.remaining_accounts.len();
    earn_groups(ctx, &[group_len])
}

/// `group_lens[i]` is the number of remaining accounts of the i-th pool group
pub fn earn_many_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, Earn<'info>>,
    group_lens: Vec<u8>,
) -> Result<u64> {
    let lens: Vec<usize> = group_lens.iter().map(|len| *len as usize).collect();
    earn_groups(ctx, &lens)
}

fn earn_groups<'info>(
    ctx: Context<'_, '_, '_, 'info, Earn<'info>>,
    group_lens: &[usize],
) -> Result<u64> {
    ledger::enter(&mut ctx.accounts.vault_config)?;

    let accounts = &mut *ctx.accounts;
    if let Some(bounty_token) = &accounts.bounty_token {
        require_keys_eq!(bounty_token.owner, accounts.caller.key(), VaultError::InvalidOwner);
    }

    let bounty_token = accounts.bounty_token.as_ref().map(|t| t.to_account_info());
    let token_program = accounts.token_program.to_account_info();
    let system_program = accounts.system_program.to_account_info();

    let mut cursor = AccountCursor::new(ctx.remaining_accounts);
    let mut total_bounty: u64 = 0;
    for len in group_lens {
        let group = cursor.take(*len)?;
        let bounty = earn_pool(
            group,
            &accounts.vault_config,
            accounts.vault_config.key(),
            &token_program,
            &system_program,
            bounty_token.as_ref(),
            accounts.caller.key(),
        )?;
        total_bounty = total_bounty
            .checked_add(bounty)
            .ok_or(VaultError::MathOverflow)?;
    }

    msg!("Earned {} pools, bounty {}", group_lens.len(), total_bounty);

    ledger::leave(&mut accounts.vault_config);
    Ok(total_bounty)
}

fn earn_pool<'a, 'info>(
    group: &'a [AccountInfo<'info>],
    config: &VaultConfig,
    config_key: Pubkey,
    token_program: &AccountInfo<'info>,
    system_program: &AccountInfo<'info>,
    bounty_token: Option<&AccountInfo<'info>>,
    caller: Pubkey,
) -> Result<u64> {
    let mut cursor = AccountCursor::new(group);
    let [pool_info, strategy_info, authority, stake_token] = cursor.take(EARN_POOL_HEADER_LEN)? else {
        return err!(VaultError::MissingAccounts);
    };

    let pool: Pool = load_program_account(pool_info)?;
    require_keys_eq!(pool.strategy, *strategy_info.key, VaultError::AccountMismatch);
    let strategy: StrategyState = load_program_account(strategy_info)?;
    require_keys_eq!(strategy.vault_config, config_key, VaultError::StrategyVaultMismatch);
    require!(strategy.pool_id == Some(pool.pool_id), VaultError::AccountMismatch);

    let strategy_accounts = StrategyAccounts::load(
        *strategy_info.key,
        &strategy,
        authority.clone(),
        stake_token.clone(),
        token_program.clone(),
        &mut cursor,
    )?;
    let harvest_accounts = HarvestAccounts::from_cursor(
        &mut cursor,
        &strategy,
        &strategy_accounts.authority,
        &strategy_accounts.token_program,
        &config.fee_address,
    )?;

    let bounty_hunter = bounty_token
        .filter(|token| matches!(accessor::mint(token), Ok(mint) if mint == strategy.earn_mint));

    let report = accounting::harvest(
        &strategy,
        &strategy_accounts,
        &harvest_accounts,
        config,
        bounty_hunter,
        system_program,
    )?;

    emit!(Harvested {
        pool_id: pool.pool_id,
        strategy: *strategy_info.key,
        harvested: report.harvested,
        performance_fee: report.fees.performance_fee,
        bounty: report.fees.bounty,
        bounty_hunter: bounty_hunter.map(|_| caller),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(report.fees.bounty)
}
