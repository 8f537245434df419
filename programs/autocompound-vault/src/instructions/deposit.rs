use anchor_lang::prelude::*;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::{
    accounting::{self, HarvestAccounts, StrategyAccounts},
    constants::*,
    errors::*,
    events::*,
    ledger::{self, PositionBook},
    state::*,
    utils::AccountCursor,
};

/// Deposit stake tokens into a pool, crediting shares to `beneficiary`
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Depositor must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Pool, position and user_pools PDAs validated with seeds
/// ✅ 6. MATH SAFETY: Shares derived from measured balance deltas
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Only the beneficiary opens a new pool in their active set
/// ✅ 9. REENTRANCY: vault_config.entered held for the body
/// ✅ 10. EVENTS: Emits Deposited event
///
/// Remaining accounts: farm group, then the harvest group (required once the
/// pool has shares).
#[derive(Accounts)]
#[instruction(amount: u64, beneficiary: Pubkey)]
pub struct DepositToPool<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,

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

    /// Strategy on-hand account
    #[account(
        mut,
        associated_token::mint = stake_mint,
        associated_token::authority = strategy_authority,
    )]
    pub strategy_stake_token: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = depositor_token.mint == pool.stake_mint @ VaultError::InvalidMint,
        constraint = depositor_token.owner == depositor.key() @ VaultError::InvalidOwner,
    )]
    pub depositor_token: Box<Account<'info, TokenAccount>>,

    /// Receives the deposit fee
    #[account(
        mut,
        constraint = fee_collector_stake_token.mint == pool.stake_mint @ VaultError::InvalidMint,
        constraint = fee_collector_stake_token.owner == vault_config.fee_address @ VaultError::InvalidOwner,
    )]
    pub fee_collector_stake_token: Box<Account<'info, TokenAccount>>,

    #[account(
        init_if_needed,
        payer = depositor,
        space = 8 + UserPosition::INIT_SPACE,
        seeds = [POSITION_SEED, pool.key().as_ref(), beneficiary.as_ref()],
        bump
    )]
    pub position: Box<Account<'info, UserPosition>>,

    #[account(
        init_if_needed,
        payer = depositor,
        space = 8 + UserPools::INIT_SPACE,
        seeds = [USER_POOLS_SEED, beneficiary.as_ref()],
        bump
    )]
    pub user_pools: Box<Account<'info, UserPools>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn deposit_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, DepositToPool<'info>>,
    amount: u64,
    beneficiary: Pubkey,
) -> Result<()> {
    // CHECKS: Validate amount
    require!(amount > 0, VaultError::ZeroAmount);
    ledger::enter(&mut ctx.accounts.vault_config)?;

    let accounts = &mut *ctx.accounts;

    if accounts.position.owner == Pubkey::default() {
        accounts.position.pool = accounts.pool.key();
        accounts.position.owner = beneficiary;
        accounts.position.bump = ctx.bumps.position;
    }
    if accounts.user_pools.owner == Pubkey::default() {
        accounts.user_pools.owner = beneficiary;
        accounts.user_pools.bump = ctx.bumps.user_pools;
    }
    accounts
        .user_pools
        .require_open_by(accounts.pool.pool_id, &accounts.depositor.key())?;

    let mut cursor = AccountCursor::new(ctx.remaining_accounts);
    let strategy_accounts = StrategyAccounts::load(
        accounts.strategy.key(),
        &accounts.strategy,
        accounts.strategy_authority.to_account_info(),
        accounts.strategy_stake_token.to_account_info(),
        accounts.token_program.to_account_info(),
        &mut cursor,
    )?;

    // CHECKS: Pending rewards must compound before the new shares are priced
    let harvest = HarvestAccounts::for_deposit(
        &mut cursor,
        &accounts.strategy,
        &strategy_accounts.authority,
        &strategy_accounts.token_program,
        &accounts.vault_config.fee_address,
    )?;
    accounting::try_harvest(
        &accounts.strategy,
        &strategy_accounts,
        harvest.as_ref(),
        &accounts.vault_config,
        &accounts.system_program.to_account_info(),
    );

    let total_before = strategy_accounts.total_stake_tokens()?;
    let on_hand_before = strategy_accounts.on_hand()?;

    // INTERACTIONS: Pull the tokens, then measure what actually arrived
    let transfer_ctx = CpiContext::new(
        accounts.token_program.to_account_info(),
        Transfer {
            from: accounts.depositor_token.to_account_info(),
            to: accounts.strategy_stake_token.to_account_info(),
            authority: accounts.depositor.to_account_info(),
        },
    );
    token::transfer(transfer_ctx, amount)?;

    let received = strategy_accounts
        .on_hand()?
        .checked_sub(on_hand_before)
        .ok_or(VaultError::MathUnderflow)?;

    let total_after = accounting::deposit(
        &accounts.strategy,
        &strategy_accounts,
        &accounts.vault_config,
        &accounts.fee_collector_stake_token.to_account_info(),
        received,
    )?;

    // EFFECTS: Mint and credit the beneficiary's shares
    let mut book = PositionBook {
        pool_id: accounts.pool.pool_id,
        strategy: &mut accounts.strategy,
        position: &mut accounts.position,
        user_pools: &mut accounts.user_pools,
    };
    let shares_added = book.credit_deposit(total_before, total_after)?;
    msg!("Deposit of {} minted {} shares", received, shares_added);

    emit!(Deposited {
        pool_id: accounts.pool.pool_id,
        depositor: accounts.depositor.key(),
        beneficiary,
        amount: received,
        shares_added,
        shares_total: accounts.strategy.shares_total,
        timestamp: Clock::get()?.unix_timestamp,
    });

    ledger::leave(&mut accounts.vault_config);
    Ok(())
}
