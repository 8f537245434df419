use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Owner-gated vault configuration change
#[derive(Accounts)]
pub struct OwnerOnly<'info> {
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
        has_one = owner @ VaultError::Unauthorized,
    )]
    pub vault_config: Account<'info, VaultConfig>,
}

/// Fee-setter-gated vault configuration change
#[derive(Accounts)]
pub struct FeeSetterOnly<'info> {
    pub fee_setter: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_CONFIG_SEED],
        bump = vault_config.bump,
        has_one = fee_setter @ VaultError::NotFeeSetter,
    )]
    pub vault_config: Account<'info, VaultConfig>,
}

/// Set one fee. Fails with `FeeExceedsCap` above the kind's fixed cap.
pub fn set_fee_handler(ctx: Context<OwnerOnly>, kind: FeeKind, bps: u16) -> Result<()> {
    let config = &mut ctx.accounts.vault_config;
    let old_bps = config.fee(kind);
    config.set_fee(kind, bps)?;

    msg!("Fee {:?}: {} -> {} bps", kind, old_bps, bps);
    emit!(FeeUpdated {
        kind,
        old_bps,
        new_bps: bps,
    });

    Ok(())
}

pub fn set_fee_address_handler(ctx: Context<FeeSetterOnly>, new_fee_address: Pubkey) -> Result<()> {
    let config = &mut ctx.accounts.vault_config;
    let old_fee_address = config.fee_address;
    config.fee_address = new_fee_address;

    emit!(FeeAddressUpdated {
        old_fee_address,
        new_fee_address,
    });

    Ok(())
}

pub fn set_fee_setter_handler(ctx: Context<FeeSetterOnly>, new_fee_setter: Pubkey) -> Result<()> {
    let config = &mut ctx.accounts.vault_config;
    let old_fee_setter = config.fee_setter;
    config.fee_setter = new_fee_setter;

    emit!(FeeSetterUpdated {
        old_fee_setter,
        new_fee_setter,
    });

    Ok(())
}

pub fn set_operator_handler(ctx: Context<OwnerOnly>, operator: Pubkey, enabled: bool) -> Result<()> {
    ctx.accounts.vault_config.set_operator(operator, enabled)?;

    emit!(OperatorToggled { operator, enabled });

    Ok(())
}

pub fn transfer_ownership_handler(ctx: Context<OwnerOnly>, new_owner: Pubkey) -> Result<()> {
    require_keys_neq!(new_owner, Pubkey::default(), VaultError::InvalidOwner);

    let config = &mut ctx.accounts.vault_config;
    let previous_owner = config.owner;
    config.owner = new_owner;

    emit!(OwnershipTransferred {
        previous_owner,
        new_owner,
    });

    Ok(())
}
