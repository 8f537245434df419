use anchor_lang::prelude::*;

use super::{Farm, FarmCpi};

/// Single-asset staking pool that stakes the reward token itself:
/// `enter_staking(amount)` / `leave_staking(amount)`
pub struct StakingFarm<'a, 'info> {
    cpi: FarmCpi<'a, 'info>,
}

impl<'a, 'info> StakingFarm<'a, 'info> {
    pub fn new(cpi: FarmCpi<'a, 'info>) -> Self {
        Self { cpi }
    }
}

impl Farm for StakingFarm<'_, '_> {
    fn deposit(&self, amount: u64, signer_seeds: &[&[&[u8]]]) -> Result<()> {
        self.cpi.invoke("enter_staking", &amount, signer_seeds)
    }

    fn withdraw(&self, amount: u64, signer_seeds: &[&[&[u8]]]) -> Result<()> {
        self.cpi.invoke("leave_staking", &amount, signer_seeds)
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
