use anchor_lang::{
    prelude::*,
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program::invoke_signed,
    },
};
use enum_dispatch::enum_dispatch;

use crate::{
    constants::FARM_ACCOUNTS_LEN,
    errors::VaultError,
    state::{FarmKind, StrategyState},
    utils::{instruction_data, read_u64_at, require_associated_token, require_program},
};

use super::{ReferralFarm, SimpleFarm, StakingFarm};

/// Operations a strategy needs from the external farm it stakes into
#[enum_dispatch]
pub trait Farm {
    /// Stake `amount` stake tokens from the strategy's on-hand account
    fn deposit(&self, amount: u64, signer_seeds: &[&[&[u8]]]) -> Result<()>;

    /// Unstake `amount` back to the strategy's on-hand account
    fn withdraw(&self, amount: u64, signer_seeds: &[&[&[u8]]]) -> Result<()>;

    /// Pull everything out, forfeiting pending rewards
    fn emergency_withdraw(&self, signer_seeds: &[&[&[u8]]]) -> Result<()>;

    /// Claim pending rewards into the strategy's reward account
    fn harvest(&self, signer_seeds: &[&[&[u8]]]) -> Result<()>;

    /// Amount the farm currently records as staked by the strategy
    fn total_staked(&self) -> Result<u64>;
}

/**
 * FARM ACCOUNT ORDER (remaining accounts)
 * 0 - farm program
 * 1 - farm state
 * 2 - farm user stake record of the strategy authority
 * 3 - farm stake vault
 * 4 - farm reward vault
 * 5 - strategy reward (earn) token account
 *
 * Every farm method is invoked with:
 * farm state, user stake, stake vault, reward vault, strategy authority (signer),
 * strategy stake token account, strategy reward token account, token program
 */
pub struct FarmCpi<'a, 'info> {
    accounts: &'a [AccountInfo<'info>],
    authority: AccountInfo<'info>,
    stake_token: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    staked_amount_offset: usize,
}

impl<'a, 'info> FarmCpi<'a, 'info> {
    /// Validate the farm group against the strategy's stored configuration
    pub fn from_account_slice(
        strategy: &StrategyState,
        accounts: &'a [AccountInfo<'info>],
        authority: AccountInfo<'info>,
        stake_token: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
    ) -> Result<Self> {
        require!(
            accounts.len() == FARM_ACCOUNTS_LEN,
            VaultError::MissingAccounts
        );
        let farm = &strategy.farm;
        require_program(&accounts[0], &farm.program)?;
        require_keys_eq!(*accounts[1].key, farm.farm_state, VaultError::AccountMismatch);
        require_keys_eq!(*accounts[2].key, farm.user_stake, VaultError::AccountMismatch);
        require_keys_eq!(*accounts[3].key, farm.stake_vault, VaultError::AccountMismatch);
        require_keys_eq!(*accounts[4].key, farm.reward_vault, VaultError::AccountMismatch);
        require_associated_token(&accounts[5], authority.key, &strategy.earn_mint)?;

        Ok(Self {
            accounts,
            authority,
            stake_token,
            token_program,
            staked_amount_offset: farm.staked_amount_offset as usize,
        })
    }

    fn program(&self) -> &AccountInfo<'info> {
        &self.accounts[0]
    }

    fn user_stake(&self) -> &AccountInfo<'info> {
        &self.accounts[2]
    }

    pub fn reward_token(&self) -> &AccountInfo<'info> {
        &self.accounts[5]
    }

    pub fn staked_amount(&self) -> Result<u64> {
        let data = self.user_stake().try_borrow_data()?;
        read_u64_at(&data, self.staked_amount_offset)
    }

    /// Invoke `method` on the farm program signed by the strategy authority
    pub fn invoke<T: AnchorSerialize>(
        &self,
        method: &str,
        args: &T,
        signer_seeds: &[&[&[u8]]],
    ) -> Result<()> {
        let ix = Instruction {
            program_id: *self.program().key,
            accounts: vec![
                AccountMeta::new(*self.accounts[1].key, false),
                AccountMeta::new(*self.accounts[2].key, false),
                AccountMeta::new(*self.accounts[3].key, false),
                AccountMeta::new(*self.accounts[4].key, false),
                AccountMeta::new_readonly(*self.authority.key, true),
                AccountMeta::new(*self.stake_token.key, false),
                AccountMeta::new(*self.reward_token().key, false),
                AccountMeta::new_readonly(*self.token_program.key, false),
            ],
            data: instruction_data(method, args)?,
        };

        invoke_signed(
            &ix,
            &[
                self.accounts[1].clone(),
                self.accounts[2].clone(),
                self.accounts[3].clone(),
                self.accounts[4].clone(),
                self.authority.clone(),
                self.stake_token.clone(),
                self.reward_token().clone(),
                self.token_program.clone(),
                self.program().clone(),
            ],
            signer_seeds,
        )?;
        Ok(())
    }
}

#[enum_dispatch(Farm)]
pub enum FarmAdapter<'a, 'info> {
    Simple(SimpleFarm<'a, 'info>),
    Staking(StakingFarm<'a, 'info>),
    Referral(ReferralFarm<'a, 'info>),
}

impl<'a, 'info> FarmAdapter<'a, 'info> {
    pub fn from_account_slice(
        strategy: &StrategyState,
        accounts: &'a [AccountInfo<'info>],
        authority: AccountInfo<'info>,
        stake_token: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
    ) -> Result<Self> {
        let cpi = FarmCpi::from_account_slice(
            strategy,
            accounts,
            authority,
            stake_token,
            token_program,
        )?;

        let adapter = match strategy.farm.kind {
            FarmKind::Simple => FarmAdapter::Simple(SimpleFarm::new(cpi)),
            FarmKind::Staking => FarmAdapter::Staking(StakingFarm::new(cpi)),
            FarmKind::Referral => {
                FarmAdapter::Referral(ReferralFarm::new(cpi, strategy.farm.referrer))
            }
        };
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use anchor_spl::{associated_token::get_associated_token_address, token};

    use super::*;
    use crate::state::FarmConfig;

    struct Fixture {
        keys: Vec<Pubkey>,
        owners: Vec<Pubkey>,
        lamports: Vec<u64>,
        data: Vec<Vec<u8>>,
        authority: Pubkey,
        strategy: StrategyState,
    }

    fn fixture(kind: FarmKind) -> Fixture {
        let authority = Pubkey::new_unique();
        let earn_mint = Pubkey::new_unique();
        let farm = FarmConfig {
            kind,
            program: Pubkey::new_unique(),
            farm_state: Pubkey::new_unique(),
            user_stake: Pubkey::new_unique(),
            stake_vault: Pubkey::new_unique(),
            reward_vault: Pubkey::new_unique(),
            staked_amount_offset: 8,
            referrer: Pubkey::new_unique(),
        };

        let mut user_stake = vec![0u8; 24];
        user_stake[8..16].copy_from_slice(&777u64.to_le_bytes());
        let mut reward_token = vec![0u8; 165];
        reward_token[..32].copy_from_slice(earn_mint.as_ref());

        let farm_owner = Pubkey::new_unique();
        Fixture {
            keys: vec![
                farm.program,
                farm.farm_state,
                farm.user_stake,
                farm.stake_vault,
                farm.reward_vault,
                get_associated_token_address(&authority, &earn_mint),
            ],
            owners: vec![
                Pubkey::default(),
                farm_owner,
                farm_owner,
                token::ID,
                token::ID,
                token::ID,
            ],
            lamports: vec![0; FARM_ACCOUNTS_LEN],
            data: vec![vec![], vec![], user_stake, vec![], vec![], reward_token],
            authority,
            strategy: StrategyState {
                earn_mint,
                farm,
                ..Default::default()
            },
        }
    }

    fn infos(f: &mut Fixture) -> Vec<AccountInfo<'_>> {
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
    fn test_farm_group_parses_and_reads_stake() {
        let mut f = fixture(FarmKind::Staking);
        let (strategy, authority_key) = (f.strategy.clone(), f.authority);
        let accounts = infos(&mut f);
        let (mut lamports, mut data) = (0u64, vec![]);
        let authority = AccountInfo::new(&authority_key, false, false, &mut lamports, &mut data, &authority_key, false, 0);

        let adapter = FarmAdapter::from_account_slice(
            &strategy,
            &accounts,
            authority.clone(),
            authority.clone(),
            authority,
        )
        .unwrap();

        assert!(matches!(adapter, FarmAdapter::Staking(_)));
        assert_eq!(adapter.total_staked().unwrap(), 777);
    }

    #[test]
    fn test_farm_group_rejects_foreign_farm_state() {
        let mut f = fixture(FarmKind::Simple);
        f.keys[1] = Pubkey::new_unique();
        let (strategy, authority_key) = (f.strategy.clone(), f.authority);
        let accounts = infos(&mut f);
        let (mut lamports, mut data) = (0u64, vec![]);
        let authority = AccountInfo::new(&authority_key, false, false, &mut lamports, &mut data, &authority_key, false, 0);

        assert!(FarmAdapter::from_account_slice(
            &strategy,
            &accounts,
            authority.clone(),
            authority.clone(),
            authority,
        )
        .is_err());
    }
}
