use anchor_lang::prelude::*;

use crate::{constants::BPS_DENOMINATOR, errors::VaultError};

/// `amount * numerator / denominator`, rounded down, through a u128 intermediate
pub fn mul_div(amount: u64, numerator: u64, denominator: u64) -> Result<u64> {
    let result = (amount as u128)
        .checked_mul(numerator as u128)
        .ok_or(error!(VaultError::MathOverflow))?
        .checked_div(denominator as u128)
        .ok_or(error!(VaultError::DivisionByZero))?;

    u64::try_from(result).map_err(|_| error!(VaultError::MathOverflow))
}

/// `amount * numerator / denominator`, rounded up
pub fn mul_div_ceil(amount: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);

    let product = (amount as u128)
        .checked_mul(numerator as u128)
        .ok_or(error!(VaultError::MathOverflow))?;
    let denominator = denominator as u128;
    let result = product
        .checked_add(denominator - 1)
        .ok_or(error!(VaultError::MathOverflow))?
        / denominator;

    u64::try_from(result).map_err(|_| error!(VaultError::MathOverflow))
}

/// Apply a basis point rate to an amount
pub fn apply_bps(amount: u64, bps: u16) -> Result<u64> {
    mul_div(amount, bps as u64, BPS_DENOMINATOR)
}
