use anchor_lang::{
    prelude::*,
    system_program::{self, Transfer as SystemTransfer},
};
use anchor_spl::token::{self, accessor, spl_token::native_mint, SyncNative};

use crate::{
    adapters::Farm,
    errors::VaultError,
    state::{StrategyState, VaultConfig},
    swap::{LiquidityLeg, Router, SwapLeg},
    utils::{require_associated_token, require_token_account, token_amount, AccountCursor},
};

use super::{HarvestFees, StrategyAccounts};

/// How the earn balance left after fees goes back into the farm
pub enum Reinvest<'a, 'info> {
    /// Earn asset is the stake asset
    Restake,
    /// Swap everything into the stake asset
    Single(SwapLeg<'a, 'info>),
    /// Swap half into each constituent (unless the earn asset is one of
    /// them) and mint LP tokens
    Paired {
        to_token0: Option<SwapLeg<'a, 'info>>,
        to_token1: Option<SwapLeg<'a, 'info>>,
        liquidity: LiquidityLeg<'a, 'info>,
    },
}

/**
 * HARVEST GROUP ACCOUNT ORDER
 * 0 - strategy earn token account
 * 1 - fee collector earn token account
 * 2 - active router program
 * then the reinvest swap group (single pools) or the token0 / token1 swap
 * groups plus the liquidity group (paired pools), then one sweep swap group
 * per configured extra earn asset, sourced from the strategy's account of
 * that asset. Trailing sweep groups may be omitted.
 */
pub struct HarvestAccounts<'a, 'info> {
    earn_token: &'a AccountInfo<'info>,
    fee_collector_earn_token: &'a AccountInfo<'info>,
    router: Router<'a, 'info>,
    reinvest: Reinvest<'a, 'info>,
    sweeps: Vec<SwapLeg<'a, 'info>>,
}

impl<'a, 'info> HarvestAccounts<'a, 'info> {
    /// Validate the whole harvest group. Nothing is invoked here, so a
    /// failure leaves no side effects behind.
    pub fn from_cursor(
        cursor: &mut AccountCursor<'a, 'info>,
        strategy: &StrategyState,
        authority_info: &AccountInfo<'info>,
        token_program: &AccountInfo<'info>,
        fee_address: &Pubkey,
    ) -> Result<Self> {
        let authority = authority_info.key;
        let earn = strategy.earn_mint;

        let earn_token = cursor.next()?;
        require_associated_token(earn_token, authority, &earn)?;

        let fee_collector_earn_token = cursor.next()?;
        require_token_account(fee_collector_earn_token, &earn, fee_address)?;

        let router = Router::new(
            cursor.next()?,
            &strategy.active_router(),
            authority_info.clone(),
            token_program.clone(),
        )?;

        let reinvest = if strategy.paired {
            let (token0, token1) = (strategy.token0_mint, strategy.token1_mint);
            let to_token0 = if earn != token0 {
                Some(SwapLeg::from_cursor(cursor, strategy.route(&earn, &token0), authority)?)
            } else {
                None
            };
            let to_token1 = if earn != token1 {
                Some(SwapLeg::from_cursor(cursor, strategy.route(&earn, &token1), authority)?)
            } else {
                None
            };
            let liquidity = LiquidityLeg::from_cursor(
                cursor,
                &strategy.liquidity_router,
                authority,
                &token0,
                &token1,
                &strategy.stake_mint,
            )?;
            Reinvest::Paired {
                to_token0,
                to_token1,
                liquidity,
            }
        } else if earn != strategy.stake_mint {
            Reinvest::Single(SwapLeg::from_cursor(
                cursor,
                strategy.route(&earn, &strategy.stake_mint),
                authority,
            )?)
        } else {
            Reinvest::Restake
        };

        let mut sweeps = Vec::with_capacity(strategy.extra_earn_mints.len());
        for mint in &strategy.extra_earn_mints {
            if cursor.is_empty() {
                break;
            }
            match SwapLeg::from_cursor(cursor, strategy.sweep_route(mint), authority) {
                Ok(leg) => sweeps.push(leg),
                Err(err) => {
                    msg!("Not sweeping {}: {}", mint, err);
                    break;
                }
            }
        }

        Ok(Self {
            earn_token,
            fee_collector_earn_token,
            router,
            reinvest,
            sweeps,
        })
    }

    /// Harvest group of a deposit. Once the pool has shares the group is
    /// required and must validate, so new shares are always priced after
    /// pending rewards are compounded.
    pub fn for_deposit(
        cursor: &mut AccountCursor<'a, 'info>,
        strategy: &StrategyState,
        authority: &AccountInfo<'info>,
        token_program: &AccountInfo<'info>,
        fee_address: &Pubkey,
    ) -> Result<Option<Self>> {
        if strategy.shares_total == 0 {
            return Ok(None);
        }
        Self::from_cursor(cursor, strategy, authority, token_program, fee_address).map(Some)
    }

    /// `None` when no harvest group was supplied or it does not validate.
    /// Only for withdrawals, where skipping the harvest leaves the pending
    /// rewards to the remaining holders.
    pub fn try_from_cursor(
        cursor: &mut AccountCursor<'a, 'info>,
        strategy: &StrategyState,
        accounts: &StrategyAccounts<'a, 'info>,
        fee_address: &Pubkey,
    ) -> Option<Self> {
        if cursor.is_empty() {
            return None;
        }
        match Self::from_cursor(
            cursor,
            strategy,
            &accounts.authority,
            &accounts.token_program,
            fee_address,
        ) {
            Ok(harvest) => Some(harvest),
            Err(err) => {
                msg!("Harvest skipped: {}", err);
                None
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub harvested: u64,
    pub fees: HarvestFees,
}

/// Harvest the farm, take the performance fee (and bounty), reinvest the
/// rest and re-stake. A paused strategy harvests nothing.
pub fn harvest<'a, 'info>(
    strategy: &StrategyState,
    accounts: &StrategyAccounts<'a, 'info>,
    harvest: &HarvestAccounts<'a, 'info>,
    config: &VaultConfig,
    bounty_hunter: Option<&AccountInfo<'info>>,
    system_program: &AccountInfo<'info>,
) -> Result<HarvestReport> {
    if strategy.paused {
        msg!("Strategy paused, nothing harvested");
        return Ok(HarvestReport::default());
    }
    if let Some(hunter) = bounty_hunter {
        require_keys_eq!(accessor::mint(hunter)?, strategy.earn_mint, VaultError::InvalidMint);
    }

    let seeds = accounts.signer_seeds();
    let signer_seeds: &[&[&[u8]]] = &[&seeds[..]];

    let earn_before = token_amount(harvest.earn_token)?;
    accounts.farm.harvest(signer_seeds)?;

    if strategy.earn_mint == native_mint::ID {
        wrap_native_balance(accounts, harvest.earn_token, system_program)?;
    }

    for leg in &harvest.sweeps {
        try_sweep(&harvest.router, leg, signer_seeds);
    }

    let harvested = token_amount(harvest.earn_token)?.saturating_sub(earn_before);
    let mut fees = HarvestFees::default();
    if harvested > 0 {
        fees = HarvestFees::plan(harvested, bounty_hunter.is_some(), config)?;
        if let Some(hunter) = bounty_hunter {
            accounts.move_tokens(harvest.earn_token, hunter, fees.bounty)?;
        }
        accounts.move_tokens(
            harvest.earn_token,
            harvest.fee_collector_earn_token,
            fees.to_collector,
        )?;
    }

    let earn_balance = token_amount(harvest.earn_token)?;
    match &harvest.reinvest {
        Reinvest::Restake => {}
        Reinvest::Single(leg) => {
            harvest.router.swap_exact_in(leg, earn_balance, signer_seeds)?;
        }
        Reinvest::Paired {
            to_token0,
            to_token1,
            liquidity,
        } => {
            let half = earn_balance / 2;
            if let Some(leg) = to_token0 {
                harvest.router.swap_exact_in(leg, half, signer_seeds)?;
            }
            if let Some(leg) = to_token1 {
                harvest
                    .router
                    .swap_exact_in(leg, earn_balance - half, signer_seeds)?;
            }
            liquidity.add_liquidity(
                &accounts.authority,
                &accounts.stake_token,
                &accounts.token_program,
                signer_seeds,
            )?;
        }
    }

    let restaked = accounts.stake_on_hand()?;

    msg!(
        "Harvested {}: performance fee {}, bounty {}, restaked {}",
        harvested,
        fees.performance_fee,
        fees.bounty,
        restaked
    );
    Ok(HarvestReport { harvested, fees })
}

/// Harvest without a bounty, logging instead of failing on in-program errors
pub fn try_harvest<'a, 'info>(
    strategy: &StrategyState,
    accounts: &StrategyAccounts<'a, 'info>,
    harvest_accounts: Option<&HarvestAccounts<'a, 'info>>,
    config: &VaultConfig,
    system_program: &AccountInfo<'info>,
) -> Option<HarvestReport> {
    let harvest_accounts = harvest_accounts?;
    if strategy.shares_total == 0 {
        return None;
    }
    match harvest(strategy, accounts, harvest_accounts, config, None, system_program) {
        Ok(report) => Some(report),
        Err(err) => {
            msg!("Harvest skipped: {}", err);
            None
        }
    }
}

/// Swap the whole balance of a leg's source into the earn asset
pub fn sweep<'a, 'info>(
    router: &Router<'a, 'info>,
    leg: &SwapLeg<'a, 'info>,
    signer_seeds: &[&[&[u8]]],
) -> Result<u64> {
    let balance = token_amount(leg.source)?;
    if balance == 0 {
        return Ok(0);
    }
    router.swap_exact_in(leg, balance, signer_seeds)?;
    Ok(balance)
}

/// `sweep`, logging instead of failing. One stuck asset never blocks the
/// rest of a harvest.
pub fn try_sweep<'a, 'info>(
    router: &Router<'a, 'info>,
    leg: &SwapLeg<'a, 'info>,
    signer_seeds: &[&[&[u8]]],
) -> u64 {
    match sweep(router, leg, signer_seeds) {
        Ok(amount) => amount,
        Err(err) => {
            msg!("Sweep of {} failed: {}", leg.source.key, err);
            0
        }
    }
}

/// Wrap lamports the authority holds above its rent floor into the wSOL
/// earn account
fn wrap_native_balance<'info>(
    accounts: &StrategyAccounts<'_, 'info>,
    earn_token: &AccountInfo<'info>,
    system_program_info: &AccountInfo<'info>,
) -> Result<()> {
    require_keys_eq!(*system_program_info.key, system_program::ID, VaultError::AccountMismatch);

    let rent_floor = Rent::get()?.minimum_balance(0);
    let spare = accounts.authority.lamports().saturating_sub(rent_floor);
    if spare == 0 {
        return Ok(());
    }

    let seeds = accounts.signer_seeds();
    system_program::transfer(
        CpiContext::new_with_signer(
            system_program_info.clone(),
            SystemTransfer {
                from: accounts.authority.clone(),
                to: earn_token.clone(),
            },
            &[&seeds[..]],
        ),
        spare,
    )?;
    token::sync_native(CpiContext::new(
        accounts.token_program.clone(),
        SyncNative {
            account: earn_token.clone(),
        },
    ))?;

    msg!("Wrapped {} lamports", spare);
    Ok(())
}

#[cfg(test)]
mod tests {
    use anchor_spl::{associated_token::get_associated_token_address, token};

    use super::*;

    fn error_code(err: Error) -> u32 {
        match err {
            Error::AnchorError(e) => e.error_code_number,
            Error::ProgramError(_) => 0,
        }
    }

    /// Raw accounts for one single-hop swap group plus its router
    struct SwapFixture {
        keys: Vec<Pubkey>,
        owners: Vec<Pubkey>,
        lamports: Vec<u64>,
        data: Vec<Vec<u8>>,
        authority: Pubkey,
        path: Vec<Pubkey>,
    }

    fn token_data(mint: &Pubkey, amount: u64) -> Vec<u8> {
        let mut data = vec![0u8; 165];
        data[..32].copy_from_slice(mint.as_ref());
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        data
    }

    /// router, source, destination, then one hop
    fn swap_fixture(source_balance: u64) -> SwapFixture {
        let authority = Pubkey::new_unique();
        let (reward_mint, earn_mint) = (Pubkey::new_unique(), Pubkey::new_unique());
        let pair_owner = Pubkey::new_unique();

        SwapFixture {
            keys: vec![
                Pubkey::new_unique(),
                get_associated_token_address(&authority, &reward_mint),
                get_associated_token_address(&authority, &earn_mint),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                Pubkey::new_unique(),
            ],
            owners: vec![
                Pubkey::default(),
                token::ID,
                token::ID,
                pair_owner,
                token::ID,
                token::ID,
            ],
            lamports: vec![0; 6],
            data: vec![
                vec![],
                token_data(&reward_mint, source_balance),
                token_data(&earn_mint, 0),
                vec![],
                vec![],
                vec![],
            ],
            authority,
            path: vec![reward_mint, earn_mint],
        }
    }

    fn infos(f: &mut SwapFixture) -> Vec<AccountInfo<'_>> {
        f.keys
            .iter()
            .zip(f.owners.iter())
            .zip(f.lamports.iter_mut())
            .zip(f.data.iter_mut())
            .enumerate()
            .map(|(i, (((key, owner), lamports), data))| {
                AccountInfo::new(key, false, true, lamports, data, owner, i == 0, 0)
            })
            .collect()
    }

    #[test]
    fn test_failed_sweep_is_logged_and_skipped() {
        let mut f = swap_fixture(5_000);
        let (authority_key, path) = (f.authority, f.path.clone());
        let accounts = infos(&mut f);
        let (mut lamports, mut data) = (0u64, vec![]);
        let authority = AccountInfo::new(&authority_key, false, false, &mut lamports, &mut data, &authority_key, false, 0);

        let router = Router::new(&accounts[0], accounts[0].key, authority.clone(), authority).unwrap();
        let mut cursor = AccountCursor::new(&accounts[1..]);
        let leg = SwapLeg::from_cursor(&mut cursor, path, &authority_key).unwrap();

        // off chain the swap cannot read the clock, so it errors before any CPI
        assert!(sweep(&router, &leg, &[]).is_err());
        assert_eq!(try_sweep(&router, &leg, &[]), 0);
    }

    #[test]
    fn test_empty_sweep_source_is_a_noop() {
        let mut f = swap_fixture(0);
        let (authority_key, path) = (f.authority, f.path.clone());
        let accounts = infos(&mut f);
        let (mut lamports, mut data) = (0u64, vec![]);
        let authority = AccountInfo::new(&authority_key, false, false, &mut lamports, &mut data, &authority_key, false, 0);

        let router = Router::new(&accounts[0], accounts[0].key, authority.clone(), authority).unwrap();
        let mut cursor = AccountCursor::new(&accounts[1..]);
        let leg = SwapLeg::from_cursor(&mut cursor, path, &authority_key).unwrap();

        assert_eq!(sweep(&router, &leg, &[]).unwrap(), 0);
    }

    #[test]
    fn test_first_deposit_needs_no_harvest_group() {
        let strategy = StrategyState::default();
        let key = Pubkey::new_unique();
        let (mut lamports, mut data) = (0u64, vec![]);
        let authority = AccountInfo::new(&key, false, false, &mut lamports, &mut data, &key, false, 0);

        let mut cursor = AccountCursor::new(&[]);
        let harvest = HarvestAccounts::for_deposit(
            &mut cursor,
            &strategy,
            &authority,
            &authority,
            &Pubkey::new_unique(),
        )
        .unwrap();
        assert!(harvest.is_none());
    }

    #[test]
    fn test_deposit_into_pool_with_shares_requires_harvest_group() {
        let strategy = StrategyState {
            shares_total: 1_000,
            earn_mint: Pubkey::new_unique(),
            ..Default::default()
        };
        let key = Pubkey::new_unique();
        let (mut lamports, mut data) = (0u64, vec![]);
        let authority = AccountInfo::new(&key, false, false, &mut lamports, &mut data, &key, false, 0);

        // left out entirely
        let mut cursor = AccountCursor::new(&[]);
        let err = HarvestAccounts::for_deposit(&mut cursor, &strategy, &authority, &authority, &key)
            .err()
            .unwrap();
        assert_eq!(error_code(err), u32::from(VaultError::MissingAccounts));

        // supplied, but the earn account is not the strategy's
        let mut f = swap_fixture(0);
        let accounts = infos(&mut f);
        let mut cursor = AccountCursor::new(&accounts[1..]);
        let err = HarvestAccounts::for_deposit(&mut cursor, &strategy, &authority, &authority, &key)
            .err()
            .unwrap();
        assert_eq!(error_code(err), u32::from(VaultError::AccountMismatch));
    }
}
