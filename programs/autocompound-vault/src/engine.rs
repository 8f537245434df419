use anchor_lang::prelude::*;

use crate::{
    errors::VaultError,
    math::apply_bps,
    plugins::{Action, Condition, PluginCall},
    state::Rule,
};

/// Ledger operations the rule engine drives
///
/// The on-chain implementation is backed by the vault accounts of one
/// `execute_rule` instruction.
pub trait RuleHost {
    fn acquire_rule_lock(&mut self) -> Result<()>;

    fn release_rule_lock(&mut self);

    /// Harvest and reinvest if possible; failures are logged and ignored
    fn try_harvest(&mut self);

    /// Stake tokens the rule owner's shares can redeem right now
    fn redeemable(&self) -> Result<u64>;

    fn rule_fee_bps(&self) -> u16;

    /// Withdraw `amount` of the owner's stake to `recipient`, paying
    /// `rule_fee` to the executor and fee collector out of it
    fn withdraw_for_rule(&mut self, amount: u64, rule_fee: u64, recipient: Pubkey) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleOutcome {
    pub amount: u64,
    pub recipient: Pubkey,
    pub rule_fee: u64,
}

/// Run one rule: check, harvest, execute, clamp, settle, callback.
///
/// The rule lock is held for the whole run and released on every exit path.
pub fn execute_rule<H, C, A>(
    host: &mut H,
    condition: &C,
    action: &A,
    rule: &Rule,
    base: &PluginCall,
) -> Result<RuleOutcome>
where
    H: RuleHost,
    C: Condition,
    A: Action,
{
    host.acquire_rule_lock()?;
    let outcome = run_locked(host, condition, action, rule, base);
    host.release_rule_lock();
    outcome
}

fn run_locked<H, C, A>(
    host: &mut H,
    condition: &C,
    action: &A,
    rule: &Rule,
    base: &PluginCall,
) -> Result<RuleOutcome>
where
    H: RuleHost,
    C: Condition,
    A: Action,
{
    let condition_call = PluginCall::for_condition(base, rule);
    require!(condition.check(&condition_call)?, VaultError::ConditionNotMet);

    host.try_harvest();

    let action_call = PluginCall::for_action(base, rule);
    let order = action.execute(&action_call)?;

    let amount = order.amount.min(host.redeemable()?);
    let rule_fee = apply_bps(amount, host.rule_fee_bps())?;

    if amount > 0 {
        host.withdraw_for_rule(amount, rule_fee, order.recipient)?;
    }

    action.callback(&action_call)?;

    Ok(RuleOutcome {
        amount,
        recipient: order.recipient,
        rule_fee,
    })
}
