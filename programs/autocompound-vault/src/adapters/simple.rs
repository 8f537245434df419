use anchor_lang::prelude::*;

use super::{Farm, FarmCpi};

/// Farm with `deposit(amount)` / `withdraw(amount)` / `emergency_withdraw()`.
/// Rewards are claimed with `withdraw(0)`.
pub struct SimpleFarm<'a, 'info> {
    cpi: FarmCpi<'a, 'info>,
}

impl<'a, 'info> SimpleFarm<'a, 'info> {
    pub fn new(cpi: FarmCpi<'a, 'info>) -> Self {
        Self { cpi }
    }
}

impl Farm for SimpleFarm<'_, '_> {
    fn deposit(&self, amount: u64, signer_seeds: &[&[&[u8]]]) -> Result<()> {
        self.cpi.invoke("deposit", &amount, signer_seeds)
    }

    fn withdraw(&self, amount: u64, signer_seeds: &[&[&[u8]]]) -> Result<()> {
        self.cpi.invoke("withdraw", &amount, signer_seeds)
    }

    fn emergency_withdraw(&self, signer_seeds: &[&[&[u8]]]) -> Result<()> {
        self.cpi.invoke("emergency_withdraw", &(), signer_seeds)
    }

    fn harvest(&self, signer_seeds: &[&[&[u8]]]) -> Result<()> {
        self.withdraw(0, signer_seeds)
    }

    fn total_staked(&self) -> Result<u64> {
        self.cpi.staked_amount()
    }
}
