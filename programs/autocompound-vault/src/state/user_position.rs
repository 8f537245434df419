use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError, math::mul_div};

/// A stored "if condition then action" pair
///
/// The argument payloads are opaque to the vault; only the referenced
/// plugins interpret them.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct Rule {
    pub condition: Pubkey,
    #[max_len(8)]
    pub condition_int_args: Vec<u64>,
    #[max_len(4)]
    pub condition_addr_args: Vec<Pubkey>,

    pub action: Pubkey,
    #[max_len(8)]
    pub action_int_args: Vec<u64>,
    #[max_len(4)]
    pub action_addr_args: Vec<Pubkey>,
}

impl Rule {
    pub fn validate_args(&self) -> Result<()> {
        require!(
            self.condition_int_args.len() <= MAX_RULE_INT_ARGS
                && self.action_int_args.len() <= MAX_RULE_INT_ARGS
                && self.condition_addr_args.len() <= MAX_RULE_ADDR_ARGS
                && self.action_addr_args.len() <= MAX_RULE_ADDR_ARGS,
            VaultError::TooManyRuleArgs
        );
        Ok(())
    }
}

/// A user's claim on one pool plus the rules they authored for it
///
/// PDA derived from ["position", pool, owner]. `shares` is proportional:
/// redeemable = shares * total_stake_tokens / shares_total.
#[account]
#[derive(InitSpace, Default)]
pub struct UserPosition {
    pub pool: Pubkey,
    pub owner: Pubkey,
    pub shares: u64,

    /// Sized for MAX_USER_RULES_PER_POOL + 1, see `add_rule`
    #[max_len(11)]
    pub rules: Vec<Rule>,

    pub bump: u8,
}

impl UserPosition {
    /// Append a rule and return its index.
    ///
    /// The cap check uses `<=`, so a bucket can hold one rule more than
    /// MAX_USER_RULES_PER_POOL. Kept as-is for compatibility with existing
    /// rule sets.
    pub fn add_rule(&mut self, rule: Rule) -> Result<usize> {
        require!(
            self.rules.len() <= MAX_USER_RULES_PER_POOL,
            VaultError::TooManyRules
        );
        rule.validate_args()?;
        self.rules.push(rule);
        Ok(self.rules.len() - 1)
    }

    /// Remove a rule by moving the last rule into its slot.
    ///
    /// Indices are NOT stable: after removing `index`, the rule that was last
    /// now lives at `index`.
    pub fn remove_rule(&mut self, index: usize) -> Result<Rule> {
        require!(index < self.rules.len(), VaultError::RuleIndexOutOfRange);
        Ok(self.rules.swap_remove(index))
    }

    pub fn rule(&self, index: usize) -> Result<&Rule> {
        self.rules
            .get(index)
            .ok_or(error!(VaultError::RuleIndexOutOfRange))
    }

    pub fn credit(&mut self, shares: u64) -> Result<()> {
        self.shares = self
            .shares
            .checked_add(shares)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Burn shares, flooring at zero. Returns true when the position is empty.
    pub fn debit(&mut self, shares: u64) -> bool {
        self.shares = self.shares.saturating_sub(shares);
        self.shares == 0
    }

    /// Amount of stake tokens these shares can redeem right now
    pub fn redeemable(&self, total_stake_tokens: u64, shares_total: u64) -> Result<u64> {
        if shares_total == 0 {
            return Ok(0);
        }
        mul_div(self.shares, total_stake_tokens, shares_total)
    }
}
