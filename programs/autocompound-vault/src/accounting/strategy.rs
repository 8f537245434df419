use anchor_lang::prelude::*;

use crate::{
    adapters::{Farm, FarmAdapter},
    constants::{FARM_ACCOUNTS_LEN, STRATEGY_AUTHORITY_SEED},
    errors::VaultError,
    math::apply_bps,
    state::{StrategyState, VaultConfig},
    utils::{require_associated_token, token_amount, transfer_signed, AccountCursor},
};

use super::WithdrawSettlement;

/// Accounts every strategy-side operation works on
///
/// The on-hand account is the strategy authority's associated token account
/// for the stake mint; the farm group comes from remaining accounts.
pub struct StrategyAccounts<'a, 'info> {
    strategy_key: Pubkey,
    authority_bump: [u8; 1],
    pub authority: AccountInfo<'info>,
    pub stake_token: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
    pub farm: FarmAdapter<'a, 'info>,
}

impl<'a, 'info> StrategyAccounts<'a, 'info> {
    pub fn load(
        strategy_key: Pubkey,
        strategy: &StrategyState,
        authority: AccountInfo<'info>,
        stake_token: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        cursor: &mut AccountCursor<'a, 'info>,
    ) -> Result<Self> {
        let expected_authority = Pubkey::create_program_address(
            &[
                STRATEGY_AUTHORITY_SEED,
                strategy_key.as_ref(),
                &[strategy.authority_bump],
            ],
            &crate::ID,
        )
        .map_err(|_| error!(VaultError::AccountMismatch))?;
        require_keys_eq!(*authority.key, expected_authority, VaultError::AccountMismatch);
        require_associated_token(&stake_token, authority.key, &strategy.stake_mint)?;
        require_keys_eq!(*token_program.key, anchor_spl::token::ID, VaultError::AccountMismatch);

        let farm = FarmAdapter::from_account_slice(
            strategy,
            cursor.take(FARM_ACCOUNTS_LEN)?,
            authority.clone(),
            stake_token.clone(),
            token_program.clone(),
        )?;

        Ok(Self {
            strategy_key,
            authority_bump: [strategy.authority_bump],
            authority,
            stake_token,
            token_program,
            farm,
        })
    }

    pub fn signer_seeds(&self) -> [&[u8]; 3] {
        [
            STRATEGY_AUTHORITY_SEED,
            self.strategy_key.as_ref(),
            &self.authority_bump,
        ]
    }

    pub fn on_hand(&self) -> Result<u64> {
        token_amount(&self.stake_token)
    }

    pub fn total_stake_tokens(&self) -> Result<u64> {
        StrategyState::total_stake_tokens(self.on_hand()?, self.farm.total_staked()?)
    }

    /// Pay `amount` of stake tokens out of the on-hand account
    pub fn pay_out(&self, to: &AccountInfo<'info>, amount: u64) -> Result<()> {
        let seeds = self.signer_seeds();
        transfer_signed(
            &self.token_program,
            &self.stake_token,
            to,
            &self.authority,
            &[&seeds[..]],
            amount,
        )
    }

    /// Move a token balance between two accounts of the authority
    pub fn move_tokens(
        &self,
        from: &AccountInfo<'info>,
        to: &AccountInfo<'info>,
        amount: u64,
    ) -> Result<()> {
        let seeds = self.signer_seeds();
        transfer_signed(&self.token_program, from, to, &self.authority, &[&seeds[..]], amount)
    }

    /// Stake whatever is on hand into the farm
    pub fn stake_on_hand(&self) -> Result<u64> {
        let on_hand = self.on_hand()?;
        if on_hand > 0 {
            let seeds = self.signer_seeds();
            self.farm.deposit(on_hand, &[&seeds[..]])?;
        }
        Ok(on_hand)
    }
}

/// Strategy side of a deposit. `received` tokens already sit on hand. Takes
/// the deposit fee and stakes the rest; returns the strategy total after
/// staking, from which the caller prices the new shares.
pub fn deposit<'info>(
    strategy: &StrategyState,
    accounts: &StrategyAccounts<'_, 'info>,
    config: &VaultConfig,
    fee_collector: &AccountInfo<'info>,
    received: u64,
) -> Result<u64> {
    require!(!strategy.paused, VaultError::StrategyPaused);

    let fee = apply_bps(received, config.deposit_fee_bps)?;
    if fee > 0 {
        accounts.pay_out(fee_collector, fee)?;
    }

    let staked = accounts.stake_on_hand()?;
    msg!("Strategy deposit: received {}, fee {}, staked {}", received, fee, staked);

    accounts.total_stake_tokens()
}

/// Destinations of one strategy withdrawal
pub struct WithdrawTargets<'b, 'info> {
    pub recipient: &'b AccountInfo<'info>,
    pub fee_collector: &'b AccountInfo<'info>,
    pub bounty_hunter: Option<&'b AccountInfo<'info>>,
}

/// Strategy side of a withdrawal whose shares were already burned. Unstakes
/// `amount` and pays out per `WithdrawSettlement`; `total_before` is the
/// strategy total measured before the burn.
pub fn withdraw<'info>(
    accounts: &StrategyAccounts<'_, 'info>,
    config: &VaultConfig,
    amount: u64,
    total_before: u64,
    rule_fee: u64,
    targets: &WithdrawTargets<'_, 'info>,
) -> Result<WithdrawSettlement> {
    let farm_staked = accounts.farm.total_staked()?;
    if farm_staked > 0 {
        let seeds = accounts.signer_seeds();
        accounts.farm.withdraw(amount.min(farm_staked), &[&seeds[..]])?;
    }

    let settlement = WithdrawSettlement::plan(
        amount,
        accounts.on_hand()?,
        total_before,
        rule_fee,
        targets.bounty_hunter.is_some(),
        config,
    )?;

    if let Some(hunter) = targets.bounty_hunter {
        accounts.pay_out(hunter, settlement.hunter_bounty)?;
        accounts.pay_out(targets.fee_collector, settlement.rule_fee_to_collector)?;
    }
    accounts.pay_out(targets.fee_collector, settlement.withdraw_fee)?;
    accounts.pay_out(targets.recipient, settlement.to_recipient)?;

    msg!("Strategy withdraw: requested {}, paid {}", amount, settlement.payout);
    Ok(settlement)
}
