use anchor_lang::{
    prelude::*,
    solana_program::instruction::{get_stack_height, TRANSACTION_LEVEL_STACK_HEIGHT},
};
use anchor_spl::{
    associated_token::get_associated_token_address,
    token::{self, accessor, Transfer},
};
use sha2::{Digest, Sha256};

use crate::errors::VaultError;

/// Sequential reader over `remaining_accounts`
///
/// Each consumer takes exactly the accounts of its group, so groups can be
/// laid out back to back without any length prefix.
pub struct AccountCursor<'a, 'info> {
    accounts: &'a [AccountInfo<'info>],
    position: usize,
}

impl<'a, 'info> AccountCursor<'a, 'info> {
    pub fn new(accounts: &'a [AccountInfo<'info>]) -> Self {
        Self {
            accounts,
            position: 0,
        }
    }

    pub fn next(&mut self) -> Result<&'a AccountInfo<'info>> {
        let account = self
            .accounts
            .get(self.position)
            .ok_or(error!(VaultError::MissingAccounts))?;
        self.position += 1;
        Ok(account)
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [AccountInfo<'info>]> {
        let end = self
            .position
            .checked_add(len)
            .ok_or(error!(VaultError::MissingAccounts))?;
        let group = self
            .accounts
            .get(self.position..end)
            .ok_or(error!(VaultError::MissingAccounts))?;
        self.position = end;
        Ok(group)
    }

    pub fn remaining(&self) -> usize {
        self.accounts.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

/// Anchor's 8 byte instruction discriminator for `method`
pub fn sighash(method: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(b"global:");
    hasher.update(method.as_bytes());
    let digest = hasher.finalize();
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest[..8]);
    discriminator
}

/// Discriminator followed by the borsh encoded arguments
pub fn instruction_data<T: AnchorSerialize>(method: &str, args: &T) -> Result<Vec<u8>> {
    let mut data = sighash(method).to_vec();
    args.serialize(&mut data)
        .map_err(|_| error!(anchor_lang::error::ErrorCode::InstructionDidNotSerialize))?;
    Ok(data)
}

/// Read a little-endian u64 at `offset`. Uninitialized (empty) accounts read as 0.
pub fn read_u64_at(data: &[u8], offset: usize) -> Result<u64> {
    if data.is_empty() {
        return Ok(0);
    }
    let bytes = data
        .get(offset..offset + 8)
        .ok_or(error!(VaultError::AccountMismatch))?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Ok(u64::from_le_bytes(buf))
}

/// Deserialize one of this program's accounts from a raw remaining account
pub fn load_program_account<T: AccountDeserialize + Owner>(info: &AccountInfo) -> Result<T> {
    require_keys_eq!(*info.owner, T::owner(), VaultError::InvalidOwner);
    let data = info.try_borrow_data()?;
    T::try_deserialize(&mut &data[..])
}

pub fn require_program(info: &AccountInfo, expected: &Pubkey) -> Result<()> {
    require_keys_eq!(*info.key, *expected, VaultError::AccountMismatch);
    require!(info.executable, VaultError::NotExecutable);
    Ok(())
}

/// Token balance straight from account data, so reads after a CPI are current
pub fn token_amount(info: &AccountInfo) -> Result<u64> {
    require_keys_eq!(*info.owner, token::ID, VaultError::InvalidOwner);
    accessor::amount(info)
}

/// A raw account must be `authority`'s associated token account for `mint`
pub fn require_associated_token(info: &AccountInfo, authority: &Pubkey, mint: &Pubkey) -> Result<()> {
    require_keys_eq!(
        *info.key,
        get_associated_token_address(authority, mint),
        VaultError::AccountMismatch
    );
    require_keys_eq!(*info.owner, token::ID, VaultError::InvalidOwner);
    require_keys_eq!(accessor::mint(info)?, *mint, VaultError::InvalidMint);
    Ok(())
}

/// A raw account must be a token account of `mint` owned by `owner`
pub fn require_token_account(info: &AccountInfo, mint: &Pubkey, owner: &Pubkey) -> Result<()> {
    require_keys_eq!(*info.owner, token::ID, VaultError::InvalidOwner);
    require_keys_eq!(accessor::mint(info)?, *mint, VaultError::InvalidMint);
    require_keys_eq!(accessor::authority(info)?, *owner, VaultError::InvalidOwner);
    Ok(())
}

/// SPL transfer signed by a PDA
pub fn transfer_signed<'info>(
    token_program: &AccountInfo<'info>,
    from: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    authority: &AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let transfer_ctx = CpiContext::new_with_signer(
        token_program.clone(),
        Transfer {
            from: from.clone(),
            to: to.clone(),
            authority: authority.clone(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, amount)
}

/// Reject calls made through CPI. Any program reached from another one runs
/// above the transaction-level stack height.
pub fn require_top_level_call() -> Result<()> {
    require_transaction_level(get_stack_height())
}

pub fn require_transaction_level(stack_height: usize) -> Result<()> {
    require_eq!(
        stack_height,
        TRANSACTION_LEVEL_STACK_HEIGHT,
        VaultError::CallerIsContract
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sighash_matches_anchor_discriminator() {
        use anchor_lang::Discriminator;

        assert_eq!(sighash("initialize"), [175, 175, 109, 31, 13, 152, 155, 237]);
        assert_eq!(sighash("deposit")[..], *crate::instruction::Deposit::DISCRIMINATOR);
        assert_eq!(sighash("execute_rule")[..], *crate::instruction::ExecuteRule::DISCRIMINATOR);
        assert_ne!(sighash("deposit"), sighash("withdraw"));
    }

    #[test]
    fn test_only_transaction_level_calls_pass() {
        assert!(require_transaction_level(TRANSACTION_LEVEL_STACK_HEIGHT).is_ok());

        // reached through one or more CPIs, e.g. from a plugin
        for height in [TRANSACTION_LEVEL_STACK_HEIGHT + 1, TRANSACTION_LEVEL_STACK_HEIGHT + 3] {
            let err = require_transaction_level(height).unwrap_err();
            assert!(matches!(
                err,
                Error::AnchorError(e) if e.error_code_number == u32::from(VaultError::CallerIsContract)
            ));
        }
    }

    #[test]
    fn test_instruction_data_appends_borsh_args() {
        let data = instruction_data("withdraw", &500u64).unwrap();
        assert_eq!(data.len(), 16);
        assert_eq!(data[8..], 500u64.to_le_bytes());
    }

    #[test]
    fn test_read_u64_at() {
        let mut data = vec![0u8; 48];
        data[40..48].copy_from_slice(&1234u64.to_le_bytes());
        assert_eq!(read_u64_at(&data, 40).unwrap(), 1234);
        assert_eq!(read_u64_at(&[], 40).unwrap(), 0);
        assert!(read_u64_at(&data, 41).is_err());
    }

    #[test]
    fn test_cursor_takes_groups_in_order() {
        let keys: Vec<Pubkey> = (0..5).map(|_| Pubkey::new_unique()).collect();
        let owner = Pubkey::new_unique();
        let mut lamports = vec![0u64; 5];
        let mut data: Vec<Vec<u8>> = vec![vec![]; 5];
        let infos: Vec<AccountInfo> = keys
            .iter()
            .zip(lamports.iter_mut())
            .zip(data.iter_mut())
            .map(|((key, lamports), data)| {
                AccountInfo::new(key, false, false, lamports, data, &owner, false, 0)
            })
            .collect();

        let mut cursor = AccountCursor::new(&infos);
        assert_eq!(*cursor.next().unwrap().key, keys[0]);
        let group = cursor.take(3).unwrap();
        assert_eq!(*group[2].key, keys[3]);
        assert_eq!(cursor.remaining(), 1);
        assert!(cursor.take(2).is_err());
        assert_eq!(*cursor.next().unwrap().key, keys[4]);
        assert!(cursor.is_empty());
        assert!(cursor.next().is_err());
    }
}
