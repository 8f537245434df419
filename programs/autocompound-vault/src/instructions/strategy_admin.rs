use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{
    accounting::{self, StrategyAccounts},
    adapters::Farm,
    constants::*,
    errors::*,
    events::*,
    ledger,
    state::*,
    swap::{Router, SwapLeg},
    utils::{require_associated_token, token_amount, AccountCursor},
};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitStrategyArgs {
    pub paired: bool,
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,
    pub farm: FarmConfig,
    pub swap_router: Pubkey,
    pub liquidity_router: Pubkey,
}

/// Create a strategy for one stake asset staked into one farm
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Operator (or owner) must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Strategy PDA derived from stake mint and farm state
/// ✅ 3. PDA SEEDS: On-hand account is the authority PDA's associated token account
/// ✅ 10. EVENTS: Emits StrategyInitialized event
#[derive(Accounts)]
#[instruction(args: InitStrategyArgs)]
pub struct InitStrategy<'info> {
    #[account(mut)]
    pub operator: Signer<'info>,

    #[account(
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
        constraint = vault_config.is_operator(&operator.key()) @ VaultError::NotOperator,
    )]
    pub vault_config: Box<Account<'info, VaultConfig>>,

    pub stake_mint: Box<Account<'info, Mint>>,

    pub earn_mint: Box<Account<'info, Mint>>,

    #[account(
        init,
        payer = operator,
        space = 8 + StrategyState::INIT_SPACE,
        seeds = [STRATEGY_SEED, stake_mint.key().as_ref(), args.farm.farm_state.as_ref()],
        bump
    )]
    pub strategy: Box<Account<'info, StrategyState>>,

    /// CHECK: PDA that will own the strategy token accounts
    #[account(
        seeds = [STRATEGY_AUTHORITY_SEED, strategy.key().as_ref()],
        bump
    )]
    pub strategy_authority: UncheckedAccount<'info>,

    #[account(
        init_if_needed,
        payer = operator,
        associated_token::mint = stake_mint,
        associated_token::authority = strategy_authority,
    )]
    pub strategy_stake_token: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn init_handler(ctx: Context<InitStrategy>, args: InitStrategyArgs) -> Result<()> {
    let stake_mint = ctx.accounts.stake_mint.key();

    // CHECKS: A paired stake asset needs two distinct constituents
    if args.paired {
        require!(
            args.token0_mint != Pubkey::default()
                && args.token1_mint != Pubkey::default()
                && args.token0_mint != args.token1_mint,
            VaultError::InvalidPairConfig
        );
    }

    let strategy = &mut ctx.accounts.strategy;
    strategy.vault_config = ctx.accounts.vault_config.key();
    strategy.pool_id = None;
    strategy.stake_mint = stake_mint;
    strategy.earn_mint = ctx.accounts.earn_mint.key();
    strategy.paired = args.paired;
    (strategy.token0_mint, strategy.token1_mint) = if args.paired {
        (args.token0_mint, args.token1_mint)
    } else {
        (Pubkey::default(), Pubkey::default())
    };
    strategy.farm = args.farm;
    strategy.swap_router = args.swap_router;
    strategy.liquidity_router = args.liquidity_router;
    strategy.use_liquidity_router = false;
    strategy.shares_total = 0;
    strategy.paused = false;
    strategy.emergency_withdrawn = false;
    strategy.swap_paths = Vec::new();
    strategy.extra_earn_mints = Vec::new();
    strategy.bump = ctx.bumps.strategy;
    strategy.authority_bump = ctx.bumps.strategy_authority;

    msg!(
        "Strategy {} stakes {} into farm {}",
        strategy.key(),
        stake_mint,
        strategy.farm.farm_state
    );

    emit!(StrategyInitialized {
        strategy: strategy.key(),
        stake_mint,
        earn_mint: strategy.earn_mint,
        farm_program: strategy.farm.program,
        paired: strategy.paired,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

/// Operator-gated change to a strategy's own state
#[derive(Accounts)]
pub struct ConfigureStrategy<'info> {
    pub operator: Signer<'info>,

    #[account(
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
        constraint = vault_config.is_operator(&operator.key()) @ VaultError::NotOperator,
    )]
    pub vault_config: Box<Account<'info, VaultConfig>>,

    #[account(
        mut,
        constraint = strategy.vault_config == vault_config.key() @ VaultError::StrategyVaultMismatch,
    )]
    pub strategy: Box<Account<'info, StrategyState>>,
}

pub fn pause_handler(ctx: Context<ConfigureStrategy>) -> Result<()> {
    ctx.accounts.strategy.pause()?;
    emit!(StrategyPauseToggled {
        strategy: ctx.accounts.strategy.key(),
        paused: true,
    });
    Ok(())
}

pub fn unpause_handler(ctx: Context<ConfigureStrategy>) -> Result<()> {
    ctx.accounts.strategy.unpause()?;
    emit!(StrategyPauseToggled {
        strategy: ctx.accounts.strategy.key(),
        paused: false,
    });
    Ok(())
}

pub fn set_use_liquidity_router_handler(
    ctx: Context<ConfigureStrategy>,
    use_liquidity_router: bool,
) -> Result<()> {
    ctx.accounts.strategy.use_liquidity_router = use_liquidity_router;
    emit!(RouterToggled {
        strategy: ctx.accounts.strategy.key(),
        use_liquidity_router,
    });
    Ok(())
}

/// Store the route for `from -> to`; an empty path removes it
pub fn set_swap_path_handler(
    ctx: Context<ConfigureStrategy>,
    from: Pubkey,
    to: Pubkey,
    path: Vec<Pubkey>,
) -> Result<()> {
    ctx.accounts.strategy.set_swap_path(from, to, path.clone())?;
    emit!(SwapPathUpdated {
        strategy: ctx.accounts.strategy.key(),
        from,
        to,
        path,
    });
    Ok(())
}

/// Replace the extra reward assets swept into the earn asset on harvest
///
/// Remaining accounts: the strategy authority's token account for each mint,
/// in order. Each one is balance-checked so a bad mint fails here rather than
/// on every harvest.
pub fn set_extra_earn_tokens_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, ConfigureStrategy<'info>>,
    mints: Vec<Pubkey>,
) -> Result<()> {
    let strategy = &mut ctx.accounts.strategy;
    let (authority, _) = Pubkey::find_program_address(
        &[STRATEGY_AUTHORITY_SEED, strategy.key().as_ref()],
        &crate::ID,
    );

    let mut cursor = AccountCursor::new(ctx.remaining_accounts);
    for mint in &mints {
        let token = cursor.next()?;
        require_associated_token(token, &authority, mint)?;
        msg!("Extra earn token {}: balance {}", mint, token_amount(token)?);
    }

    strategy.set_extra_earn_mints(mints.clone())?;
    emit!(ExtraEarnTokensUpdated {
        strategy: strategy.key(),
        mints,
    });
    Ok(())
}

/// Operator-gated strategy action that moves tokens. Runs under the
/// reentrancy guard like every other asset-moving instruction.
#[derive(Accounts)]
pub struct StrategyFunds<'info> {
    pub operator: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
        constraint = vault_config.is_operator(&operator.key()) @ VaultError::NotOperator,
    )]
    pub vault_config: Box<Account<'info, VaultConfig>>,

    #[account(
        mut,
        constraint = strategy.vault_config == vault_config.key() @ VaultError::StrategyVaultMismatch,
        has_one = stake_mint @ VaultError::InvalidMint,
    )]
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

    pub token_program: Program<'info, Token>,
}

/// Pull everything out of the farm and latch the strategy paused for good
///
/// Remaining accounts: farm group.
pub fn emergency_farm_withdraw_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, StrategyFunds<'info>>,
) -> Result<()> {
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

    // EFFECTS: Latch before leaving the farm
    accounts.strategy.latch_emergency();

    // INTERACTIONS: Exit the farm
    let seeds = strategy_accounts.signer_seeds();
    strategy_accounts.farm.emergency_withdraw(&[&seeds[..]])?;
    let recovered = strategy_accounts.on_hand()?;

    msg!("Emergency withdrew farm of {}: {} on hand", accounts.strategy.key(), recovered);

    emit!(StrategyEmergencyWithdrawn {
        strategy: accounts.strategy.key(),
        recovered,
        timestamp: Clock::get()?.unix_timestamp,
    });

    ledger::leave(&mut accounts.vault_config);
    Ok(())
}

/// Sweep the strategy's whole balance of `mint` into the earn asset.
/// The stake and earn assets are never swept. A failed swap is logged and
/// sweeps nothing.
///
/// Remaining accounts: active router program, then the swap group for the
/// mint's sweep route.
pub fn token_to_earn_handler<'info>(
    ctx: Context<'_, '_, '_, 'info, StrategyFunds<'info>>,
    mint: Pubkey,
) -> Result<u64> {
    if ctx.accounts.strategy.is_protected_mint(&mint) {
        msg!("Not sweeping protected mint {}", mint);
        return Ok(0);
    }
    ledger::enter(&mut ctx.accounts.vault_config)?;

    let accounts = &mut *ctx.accounts;
    let strategy = &accounts.strategy;

    let authority = accounts.strategy_authority.to_account_info();
    let mut cursor = AccountCursor::new(ctx.remaining_accounts);
    let router = Router::new(
        cursor.next()?,
        &strategy.active_router(),
        authority.clone(),
        accounts.token_program.to_account_info(),
    )?;
    let leg = SwapLeg::from_cursor(&mut cursor, strategy.sweep_route(&mint), authority.key)?;

    let strategy_key = strategy.key();
    let bump = [strategy.authority_bump];
    let seeds = [STRATEGY_AUTHORITY_SEED, strategy_key.as_ref(), &bump];
    let amount = accounting::try_sweep(&router, &leg, &[&seeds[..]]);

    emit!(TokenSwept {
        strategy: strategy_key,
        mint,
        amount,
    });

    ledger::leave(&mut accounts.vault_config);
    Ok(amount)
}
