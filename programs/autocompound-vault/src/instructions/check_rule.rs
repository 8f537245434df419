use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::*,
    plugins::{addr_arg_accounts, Condition, CpiCondition, PluginCall, PluginProgram},
    state::*,
    utils::AccountCursor,
};

/// Evaluate a rule's condition without side effects
///
/// Remaining accounts: condition program, then the condition's
/// address-argument accounts.
#[derive(Accounts)]
pub struct CheckRule<'info> {
    /// CHECK: rule owner, only used to derive the position
    pub user: UncheckedAccount<'info>,

    #[account(
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
    )]
    pub vault_config: Box<Account<'info, VaultConfig>>,

    #[account(
        seeds = [POOL_SEED, &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
        has_one = strategy @ VaultError::AccountMismatch,
    )]
    pub pool: Box<Account<'info, Pool>>,

    pub strategy: Box<Account<'info, StrategyState>>,

    #[account(
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump = position.bump,
    )]
    pub position: Box<Account<'info, UserPosition>>,
}

/// Read-only vault accounts every plugin call receives
pub(crate) fn plugin_context<'info>(
    vault_config: AccountInfo<'info>,
    pool: AccountInfo<'info>,
    strategy: AccountInfo<'info>,
    position: AccountInfo<'info>,
) -> Vec<AccountInfo<'info>> {
    vec![vault_config, pool, strategy, position]
}

pub(crate) fn base_call(vault: Pubkey, strategy: Pubkey, user: Pubkey, pool_id: u32) -> PluginCall {
    PluginCall {
        vault,
        strategy,
        user,
        pool_id,
        int_args: Vec::new(),
        addr_args: Vec::new(),
    }
}

pub fn check_rule_handler<'info>(ctx: Context<'_, '_, '_, 'info, CheckRule<'info>>, index: u32) -> Result<bool> {
    let accounts = &ctx.accounts;
    let rule = accounts.position.rule(index as usize)?;

    let mut cursor = AccountCursor::new(ctx.remaining_accounts);
    let program = cursor.next()?;
    require_keys_eq!(*program.key, rule.condition, VaultError::AccountMismatch);

    let condition = CpiCondition(PluginProgram::new(
        program,
        plugin_context(
            accounts.vault_config.to_account_info(),
            accounts.pool.to_account_info(),
            accounts.strategy.to_account_info(),
            accounts.position.to_account_info(),
        ),
        addr_arg_accounts(&mut cursor, &rule.condition_addr_args)?,
    )?);

    let base = base_call(
        accounts.vault_config.key(),
        accounts.strategy.key(),
        accounts.user.key(),
        accounts.pool.pool_id,
    );
    let satisfied = condition.check(&PluginCall::for_condition(&base, rule))?;

    msg!("Rule {} of {}: condition {}", index, accounts.user.key(), satisfied);
    Ok(satisfied)
}
