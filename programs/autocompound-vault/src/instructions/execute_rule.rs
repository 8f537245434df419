use anchor_lang::prelude::*;
use anchor_spl::token::{accessor, Mint, Token, TokenAccount};

use crate::{
    accounting::{HarvestAccounts, StrategyAccounts, WithdrawTargets},
    constants::*,
    engine::{self, RuleHost},
    errors::*,
    events::*,
    ledger::{self, PoolLedger, PositionBook},
    plugins::{addr_arg_accounts, CpiAction, CpiCondition, PluginProgram},
    state::*,
    utils::{require_top_level_call, AccountCursor},
};

use super::check_rule::{base_call, plugin_context};

/// Execute another user's rule for the rule fee bounty
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Executor must be signer of a top-level instruction
/// ✅ 2. ACCOUNT OWNERSHIP: Position and user_pools PDAs derived from the rule owner
/// ✅ 5. EXTERNAL CALLS: Plugins must be the programs stored in the rule
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Recipient account must belong to the action's recipient
/// ✅ 9. REENTRANCY: Rule lock and reentrancy guard persisted before any plugin call
/// ✅ 10. EVENTS: Emits RuleExecuted (and Withdrawn when funds move)
///
/// Remaining accounts: condition program, action program, the condition's
/// address-argument accounts, the action's address-argument accounts, farm
/// group, then an optional harvest group.
#[derive(Accounts)]
pub struct ExecuteRule<'info> {
    pub executor: Signer<'info>,

    /// CHECK: rule owner, only used to derive PDAs
    pub user: UncheckedAccount<'info>,

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
        seeds = [POSITION_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump = position.bump,
    )]
    pub position: Box<Account<'info, UserPosition>>,

    #[account(
        mut,
        seeds = [USER_POOLS_SEED, user.key().as_ref()],
        bump = user_pools.bump,
    )]
    pub user_pools: Box<Account<'info, UserPools>>,

    /// Stake-asset account of the recipient the action names
    #[account(
        mut,
        constraint = recipient_token.mint == pool.stake_mint @ VaultError::InvalidMint,
    )]
    pub recipient_token: Box<Account<'info, TokenAccount>>,

    /// Receives the executor's share of the rule fee
    #[account(
        mut,
        constraint = executor_token.mint == pool.stake_mint @ VaultError::InvalidMint,
        constraint = executor_token.owner == executor.key() @ VaultError::InvalidOwner,
    )]
    pub executor_token: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = fee_collector_stake_token.mint == pool.stake_mint @ VaultError::InvalidMint,
        constraint = fee_collector_stake_token.owner == vault_config.fee_address @ VaultError::InvalidOwner,
    )]
    pub fee_collector_stake_token: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// `RuleHost` over the accounts of one `execute_rule` instruction
struct LedgerRuleHost<'r, 'a, 'info> {
    config: &'r mut Account<'info, VaultConfig>,
    pool: &'r Pool,
    strategy: &'r mut Account<'info, StrategyState>,
    position: &'r mut Account<'info, UserPosition>,
    user_pools: &'r mut Account<'info, UserPools>,
    strategy_accounts: &'r StrategyAccounts<'a, 'info>,
    harvest: Option<&'r HarvestAccounts<'a, 'info>>,
    recipient_token: &'r AccountInfo<'info>,
    executor_token: &'r AccountInfo<'info>,
    fee_collector: &'r AccountInfo<'info>,
    system_program: &'r AccountInfo<'info>,
}

impl<'r, 'a, 'info> LedgerRuleHost<'r, 'a, 'info> {
    fn ledger(&mut self) -> PoolLedger<'_, 'a, 'info> {
        PoolLedger {
            config: &**self.config,
            book: PositionBook {
                pool_id: self.pool.pool_id,
                strategy: &mut **self.strategy,
                position: &mut **self.position,
                user_pools: &mut **self.user_pools,
            },
            accounts: self.strategy_accounts,
            harvest: self.harvest,
            system_program: self.system_program,
        }
    }
}

impl RuleHost for LedgerRuleHost<'_, '_, '_> {
    fn acquire_rule_lock(&mut self) -> Result<()> {
        self.config.acquire_rule_lock()?;
        ledger::enter(self.config)
    }

    fn release_rule_lock(&mut self) {
        self.config.release_rule_lock();
        ledger::leave(self.config);
    }

    fn try_harvest(&mut self) {
        self.ledger().try_harvest();
    }

    fn redeemable(&self) -> Result<u64> {
        self.position.redeemable(
            self.strategy_accounts.total_stake_tokens()?,
            self.strategy.shares_total,
        )
    }

    fn rule_fee_bps(&self) -> u16 {
        self.config.rule_fee_bps
    }

    fn withdraw_for_rule(&mut self, amount: u64, rule_fee: u64, recipient: Pubkey) -> Result<()> {
        require_keys_eq!(
            accessor::authority(self.recipient_token)?,
            recipient,
            VaultError::InvalidRecipient
        );

        let targets = WithdrawTargets {
            recipient: self.recipient_token,
            fee_collector: self.fee_collector,
            bounty_hunter: Some(self.executor_token),
        };
        self.ledger().withdraw(amount, rule_fee, &targets, true)?;

        // The action callback runs next and may read the settled state
        self.strategy.exit(&crate::ID)?;
        self.position.exit(&crate::ID)?;
        self.user_pools.exit(&crate::ID)
    }
}

pub fn execute_rule_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, ExecuteRule<'info>>,
    index: u32,
) -> Result<()> {
    // CHECKS: Only a top-level instruction may execute rules
    require_top_level_call()?;

    let accounts = &mut *ctx.accounts;
    let rule = accounts.position.rule(index as usize)?.clone();

    let mut cursor = AccountCursor::new(ctx.remaining_accounts);
    let condition_program = cursor.next()?;
    require_keys_eq!(*condition_program.key, rule.condition, VaultError::AccountMismatch);
    let action_program = cursor.next()?;
    require_keys_eq!(*action_program.key, rule.action, VaultError::AccountMismatch);

    let context = plugin_context(
        accounts.vault_config.to_account_info(),
        accounts.pool.to_account_info(),
        accounts.strategy.to_account_info(),
        accounts.position.to_account_info(),
    );
    let condition = CpiCondition(PluginProgram::new(
        condition_program,
        context.clone(),
        addr_arg_accounts(&mut cursor, &rule.condition_addr_args)?,
    )?);
    let action = CpiAction(PluginProgram::new(
        action_program,
        context,
        addr_arg_accounts(&mut cursor, &rule.action_addr_args)?,
    )?);

    let strategy_accounts = StrategyAccounts::load(
        accounts.strategy.key(),
        &accounts.strategy,
        accounts.strategy_authority.to_account_info(),
        accounts.strategy_stake_token.to_account_info(),
        accounts.token_program.to_account_info(),
        &mut cursor,
    )?;
    let harvest = HarvestAccounts::try_from_cursor(
        &mut cursor,
        &accounts.strategy,
        &strategy_accounts,
        &accounts.vault_config.fee_address,
    );

    let base = base_call(
        accounts.vault_config.key(),
        accounts.strategy.key(),
        accounts.user.key(),
        accounts.pool.pool_id,
    );

    let recipient_token = accounts.recipient_token.to_account_info();
    let executor_token = accounts.executor_token.to_account_info();
    let fee_collector = accounts.fee_collector_stake_token.to_account_info();
    let system_program = accounts.system_program.to_account_info();

    let mut host = LedgerRuleHost {
        config: &mut accounts.vault_config,
        pool: &accounts.pool,
        strategy: &mut accounts.strategy,
        position: &mut accounts.position,
        user_pools: &mut accounts.user_pools,
        strategy_accounts: &strategy_accounts,
        harvest: harvest.as_ref(),
        recipient_token: &recipient_token,
        executor_token: &executor_token,
        fee_collector: &fee_collector,
        system_program: &system_program,
    };
    let outcome = engine::execute_rule(&mut host, &condition, &action, &rule, &base)?;

    msg!(
        "Executed rule {} of {}: {} to {}, rule fee {}",
        index,
        accounts.user.key(),
        outcome.amount,
        outcome.recipient,
        outcome.rule_fee
    );

    emit!(RuleExecuted {
        pool_id: accounts.pool.pool_id,
        owner: accounts.user.key(),
        index,
        executor: accounts.executor.key(),
        amount: outcome.amount,
        recipient: outcome.recipient,
        rule_fee: outcome.rule_fee,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
