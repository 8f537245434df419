use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::*,
    events::*,
    plugins::{require_plugin_roles, CpiAction, CpiCondition, PluginProgram},
    state::*,
};

/// Store an "if condition then action" rule on the caller's position
#[derive(Accounts)]
pub struct AddRule<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    #[account(
        seeds = [POOL_SEED, &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + UserPosition::INIT_SPACE,
        seeds = [POSITION_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump
    )]
    pub position: Box<Account<'info, UserPosition>>,

    /// Created alongside the position so rule execution always finds it
    #[account(
        init_if_needed,
        payer = owner,
        space = 8 + UserPools::INIT_SPACE,
        seeds = [USER_POOLS_SEED, owner.key().as_ref()],
        bump
    )]
    pub user_pools: Box<Account<'info, UserPools>>,

    /// CHECK: condition plugin, must answer `is_condition`
    #[account(executable)]
    pub condition_program: UncheckedAccount<'info>,

    /// CHECK: action plugin, must answer `is_action`
    #[account(executable)]
    pub action_program: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn add_handler(ctx: Context<AddRule>, rule: Rule) -> Result<u32> {
    let accounts = &mut *ctx.accounts;

    // CHECKS: Rule must reference the supplied plugins, which must identify
    // themselves correctly
    require_keys_eq!(rule.condition, accounts.condition_program.key(), VaultError::AccountMismatch);
    require_keys_eq!(rule.action, accounts.action_program.key(), VaultError::AccountMismatch);

    let condition_info = accounts.condition_program.to_account_info();
    let action_info = accounts.action_program.to_account_info();
    require_plugin_roles(
        &CpiCondition(PluginProgram::new(&condition_info, Vec::new(), Vec::new())?),
        &CpiAction(PluginProgram::new(&action_info, Vec::new(), Vec::new())?),
    )?;

    if accounts.position.owner == Pubkey::default() {
        accounts.position.pool = accounts.pool.key();
        accounts.position.owner = accounts.owner.key();
        accounts.position.bump = ctx.bumps.position;
    }
    if accounts.user_pools.owner == Pubkey::default() {
        accounts.user_pools.owner = accounts.owner.key();
        accounts.user_pools.bump = ctx.bumps.user_pools;
    }

    // EFFECTS: Append
    let index = accounts.position.add_rule(rule)? as u32;
    let stored = accounts.position.rule(index as usize)?;

    emit!(RuleAdded {
        pool_id: accounts.pool.pool_id,
        owner: accounts.owner.key(),
        index,
        condition: stored.condition,
        action: stored.action,
    });

    Ok(index)
}

/// Delete one of the caller's rules. The last rule moves into the freed
/// index.
#[derive(Accounts)]
pub struct RemoveRule<'info> {
    pub owner: Signer<'info>,

    #[account(
        seeds = [POOL_SEED, &pool.pool_id.to_le_bytes()],
        bump = pool.bump,
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        mut,
        seeds = [POSITION_SEED, pool.key().as_ref(), owner.key().as_ref()],
        bump = position.bump,
    )]
    pub position: Box<Account<'info, UserPosition>>,
}

pub fn remove_handler(ctx: Context<RemoveRule>, index: u32) -> Result<()> {
    ctx.accounts.position.remove_rule(index as usize)?;

    emit!(RuleRemoved {
        pool_id: ctx.accounts.pool.pool_id,
        owner: ctx.accounts.owner.key(),
        index,
    });

    Ok(())
}
