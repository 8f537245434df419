use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError};

/// Fee parameters that can be tuned after deployment
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeKind {
    Deposit,
    Withdraw,
    Performance,
    Rule,
    PerformanceBounty,
    RuleBounty,
}

impl FeeKind {
    pub fn cap(&self) -> u16 {
        match self {
            FeeKind::Deposit => DEPOSIT_FEE_MAX_BPS,
            FeeKind::Withdraw => WITHDRAW_FEE_MAX_BPS,
            FeeKind::Performance => PERFORMANCE_FEE_MAX_BPS,
            FeeKind::Rule => RULE_FEE_MAX_BPS,
            FeeKind::PerformanceBounty => PERFORMANCE_FEE_BOUNTY_MAX_BPS,
            FeeKind::RuleBounty => RULE_FEE_BOUNTY_MAX_BPS,
        }
    }
}

/// Process-wide vault configuration
///
/// Fees are read when they are applied, never snapshotted per operation.
/// `entered` and `rule_execution_locked` are only true while an instruction
/// body is running.
#[account]
#[derive(InitSpace, Default)]
pub struct VaultConfig {
    /// Registers pools, sets fees, manages operators
    pub owner: Pubkey,

    /// Wallet whose token accounts collect every fee
    pub fee_address: Pubkey,

    /// Only this key may rotate `fee_address` and name the next setter
    pub fee_setter: Pubkey,

    pub deposit_fee_bps: u16,
    pub withdraw_fee_bps: u16,
    pub performance_fee_bps: u16,
    pub rule_fee_bps: u16,

    /// Share of the performance fee paid to whoever triggers a harvest
    pub performance_fee_bounty_bps: u16,

    /// Share of the rule fee paid to whoever executes a rule
    pub rule_fee_bounty_bps: u16,

    /// Keys allowed to create and manage strategies (the owner always is)
    #[max_len(10)]
    pub operators: Vec<Pubkey>,

    /// Number of registered pools; the next pool id
    pub pool_count: u32,

    /// Reentrancy guard for asset-moving instructions
    pub entered: bool,

    /// Held for the whole Checking..Settling span of one rule execution
    pub rule_execution_locked: bool,

    pub bump: u8,
}

impl VaultConfig {
    pub fn fee(&self, kind: FeeKind) -> u16 {
        match kind {
            FeeKind::Deposit => self.deposit_fee_bps,
            FeeKind::Withdraw => self.withdraw_fee_bps,
            FeeKind::Performance => self.performance_fee_bps,
            FeeKind::Rule => self.rule_fee_bps,
            FeeKind::PerformanceBounty => self.performance_fee_bounty_bps,
            FeeKind::RuleBounty => self.rule_fee_bounty_bps,
        }
    }

    /// Validate against the fixed cap, then assign
    pub fn set_fee(&mut self, kind: FeeKind, bps: u16) -> Result<()> {
        require!(bps <= kind.cap(), VaultError::FeeExceedsCap);

        let slot = match kind {
            FeeKind::Deposit => &mut self.deposit_fee_bps,
            FeeKind::Withdraw => &mut self.withdraw_fee_bps,
            FeeKind::Performance => &mut self.performance_fee_bps,
            FeeKind::Rule => &mut self.rule_fee_bps,
            FeeKind::PerformanceBounty => &mut self.performance_fee_bounty_bps,
            FeeKind::RuleBounty => &mut self.rule_fee_bounty_bps,
        };
        *slot = bps;
        Ok(())
    }

    pub fn is_operator(&self, key: &Pubkey) -> bool {
        self.owner == *key || self.operators.contains(key)
    }

    pub fn set_operator(&mut self, operator: Pubkey, enabled: bool) -> Result<()> {
        let present = self.operators.iter().position(|k| *k == operator);
        match (present, enabled) {
            (None, true) => {
                require!(
                    self.operators.len() < MAX_OPERATORS,
                    VaultError::OperatorListFull
                );
                self.operators.push(operator);
            }
            (Some(index), false) => {
                self.operators.swap_remove(index);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn next_pool_id(&mut self) -> Result<u32> {
        let id = self.pool_count;
        self.pool_count = id.checked_add(1).ok_or(VaultError::MathOverflow)?;
        Ok(id)
    }

    pub fn enter(&mut self) -> Result<()> {
        require!(!self.entered, VaultError::ReentrancyDetected);
        self.entered = true;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.entered = false;
    }

    pub fn acquire_rule_lock(&mut self) -> Result<()> {
        require!(!self.rule_execution_locked, VaultError::RuleExecutionLocked);
        self.rule_execution_locked = true;
        Ok(())
    }

    pub fn release_rule_lock(&mut self) {
        self.rule_execution_locked = false;
    }
}
