use anchor_lang::prelude::*;

use super::{Farm, FarmCpi};

/// Farm whose deposit also names a referrer: `deposit(amount, referrer)`
pub struct ReferralFarm<'a, 'info> {
    cpi: FarmCpi<'a, 'info>,
    referrer: Pubkey,
}

impl<'a, 'info> ReferralFarm<'a, 'info> {
    pub fn new(cpi: FarmCpi<'a, 'info>, referrer: Pubkey) -> Self {
        Self { cpi, referrer }
    }
}

impl Farm for ReferralFarm<'_, '_> {
    fn deposit(&self, amount: u64, signer_seeds: &[&[&[u8]]]) -> Result<()> {
        self.cpi
            .invoke("deposit", &(amount, self.referrer), signer_seeds)
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
