/// Security tests for the Autocompound Vault
///
/// Exercise the authorization, locking and capping rules of the vault state
/// and drive the rule engine against an in-memory ledger.
///
/// Security coverage:
///  Fee caps
///  Operator and active-pool limits
///  Reentrancy guard and rule lock
///  Rule capacity and argument limits
///  Strategy lifecycle latch
///  Swap path validation
use std::{cell::RefCell, rc::Rc};

use anchor_lang::prelude::*;
use autocompound_vault::{
    accounting::WithdrawSettlement,
    constants::*,
    engine::{execute_rule, RuleHost},
    errors::VaultError,
    ledger::PositionBook,
    plugins::{require_plugin_roles, Action, ActionOrder, Condition, PluginCall},
    state::{FeeKind, Rule, StrategyState, UserPools, UserPosition, VaultConfig},
};

fn error_code(err: Error) -> u32 {
    match err {
        Error::AnchorError(e) => e.error_code_number,
        Error::ProgramError(_) => 0,
    }
}

fn assert_vault_error<T: std::fmt::Debug>(result: Result<T>, expected: VaultError) {
    assert_eq!(error_code(result.unwrap_err()), u32::from(expected));
}

// =============================================================================
// SECURITY TESTS - Fee Caps
// =============================================================================

#[test]
fn test_every_fee_rejects_values_above_its_cap() {
    let mut config = VaultConfig::default();
    let kinds = [
        FeeKind::Deposit,
        FeeKind::Withdraw,
        FeeKind::Performance,
        FeeKind::Rule,
        FeeKind::PerformanceBounty,
        FeeKind::RuleBounty,
    ];

    for kind in kinds {
        config.set_fee(kind, kind.cap()).unwrap();
        assert_eq!(config.fee(kind), kind.cap());
        assert_vault_error(config.set_fee(kind, kind.cap() + 1), VaultError::FeeExceedsCap);
        assert_eq!(config.fee(kind), kind.cap(), "rejected update must not apply");
    }
}

#[test]
fn test_defaults_sit_within_caps() {
    assert!(DEFAULT_DEPOSIT_FEE_BPS <= DEPOSIT_FEE_MAX_BPS);
    assert!(DEFAULT_WITHDRAW_FEE_BPS <= WITHDRAW_FEE_MAX_BPS);
    assert!(DEFAULT_PERFORMANCE_FEE_BPS <= PERFORMANCE_FEE_MAX_BPS);
    assert!(DEFAULT_RULE_FEE_BPS <= RULE_FEE_MAX_BPS);
    assert!(DEFAULT_PERFORMANCE_FEE_BOUNTY_BPS <= PERFORMANCE_FEE_BOUNTY_MAX_BPS);
    assert!(DEFAULT_RULE_FEE_BOUNTY_BPS <= RULE_FEE_BOUNTY_MAX_BPS);
}

// =============================================================================
// SECURITY TESTS - Authorization Lists
// =============================================================================

#[test]
fn test_owner_is_always_an_operator() {
    let owner = Pubkey::new_unique();
    let mut config = VaultConfig {
        owner,
        ..Default::default()
    };
    assert!(config.is_operator(&owner));

    let operator = Pubkey::new_unique();
    assert!(!config.is_operator(&operator));
    config.set_operator(operator, true).unwrap();
    assert!(config.is_operator(&operator));
    config.set_operator(operator, false).unwrap();
    assert!(!config.is_operator(&operator));
}

#[test]
fn test_operator_list_is_capped() {
    let mut config = VaultConfig::default();
    for _ in 0..MAX_OPERATORS {
        config.set_operator(Pubkey::new_unique(), true).unwrap();
    }
    assert_vault_error(
        config.set_operator(Pubkey::new_unique(), true),
        VaultError::OperatorListFull,
    );
}

#[test]
fn test_active_pool_set_is_capped() {
    let mut pools = UserPools::default();
    for pool_id in 0..MAX_ACTIVE_POOLS as u32 {
        pools.insert(pool_id).unwrap();
    }
    // re-inserting a held pool is fine, a new one is not
    pools.insert(0).unwrap();
    assert_vault_error(
        pools.insert(MAX_ACTIVE_POOLS as u32),
        VaultError::ActivePoolLimitReached,
    );
}

// =============================================================================
// SECURITY TESTS - Reentrancy
// =============================================================================

#[test]
fn test_reentrancy_guard_rejects_nested_entry() {
    let mut config = VaultConfig::default();
    config.enter().unwrap();
    assert_vault_error(config.enter(), VaultError::ReentrancyDetected);
    config.leave();
    config.enter().unwrap();
}

#[test]
fn test_rule_lock_rejects_second_holder() {
    let mut config = VaultConfig::default();
    config.acquire_rule_lock().unwrap();
    assert_vault_error(config.acquire_rule_lock(), VaultError::RuleExecutionLocked);
    config.release_rule_lock();
    config.acquire_rule_lock().unwrap();
}

// =============================================================================
// SECURITY TESTS - Rules
// =============================================================================

#[test]
fn test_rule_bucket_admits_one_rule_past_the_limit() {
    let mut position = UserPosition::default();
    for expected in 0..=MAX_USER_RULES_PER_POOL {
        assert_eq!(position.add_rule(Rule::default()).unwrap(), expected);
    }
    assert_eq!(position.rules.len(), MAX_USER_RULES_PER_POOL + 1);
    assert_vault_error(position.add_rule(Rule::default()), VaultError::TooManyRules);
}

#[test]
fn test_rule_arguments_are_capped() {
    let mut position = UserPosition::default();
    let too_many_ints = Rule {
        action_int_args: vec![0; MAX_RULE_INT_ARGS + 1],
        ..Default::default()
    };
    assert_vault_error(position.add_rule(too_many_ints), VaultError::TooManyRuleArgs);

    let too_many_addrs = Rule {
        condition_addr_args: vec![Pubkey::default(); MAX_RULE_ADDR_ARGS + 1],
        ..Default::default()
    };
    assert_vault_error(position.add_rule(too_many_addrs), VaultError::TooManyRuleArgs);
    assert!(position.rules.is_empty());
}

#[test]
fn test_removing_a_rule_moves_the_last_into_its_slot() {
    let mut position = UserPosition::default();
    let conditions: Vec<Pubkey> = (0..3).map(|_| Pubkey::new_unique()).collect();
    for condition in &conditions {
        position
            .add_rule(Rule {
                condition: *condition,
                ..Default::default()
            })
            .unwrap();
    }

    let removed = position.remove_rule(0).unwrap();
    assert_eq!(removed.condition, conditions[0]);
    assert_eq!(position.rule(0).unwrap().condition, conditions[2]);
    assert_eq!(position.rule(1).unwrap().condition, conditions[1]);
    assert_vault_error(position.rule(2), VaultError::RuleIndexOutOfRange);
    assert_vault_error(position.remove_rule(2), VaultError::RuleIndexOutOfRange);
}

// =============================================================================
// SECURITY TESTS - Strategy Lifecycle
// =============================================================================

#[test]
fn test_emergency_latch_blocks_unpause() {
    let mut strategy = StrategyState::default();
    strategy.pause().unwrap();
    assert_vault_error(strategy.pause(), VaultError::StrategyPaused);
    strategy.unpause().unwrap();
    assert_vault_error(strategy.unpause(), VaultError::StrategyNotPaused);

    strategy.latch_emergency();
    assert!(strategy.paused);
    assert_vault_error(strategy.unpause(), VaultError::EmergencyWithdrawn);
}

#[test]
fn test_swap_paths_must_connect_their_pair() {
    let mut strategy = StrategyState::default();
    let (from, hop, to) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

    assert_vault_error(strategy.set_swap_path(from, to, vec![hop, to]), VaultError::InvalidSwapPath);
    assert_vault_error(strategy.set_swap_path(from, to, vec![from]), VaultError::InvalidSwapPath);
    assert_vault_error(
        strategy.set_swap_path(from, to, vec![from, hop, hop, hop, to]),
        VaultError::InvalidSwapPath,
    );

    strategy.set_swap_path(from, to, vec![from, hop, to]).unwrap();
    assert_eq!(strategy.route(&from, &to), vec![from, hop, to]);

    strategy.set_swap_path(from, to, vec![]).unwrap();
    assert_eq!(strategy.route(&from, &to), vec![from, to]);
}

// =============================================================================
// RULE ENGINE - In-memory ledger
// =============================================================================

/// One pool with a single rule owner, settled the way the program settles
/// rule withdrawals
struct LedgerHost {
    config: Rc<RefCell<VaultConfig>>,
    strategy: StrategyState,
    position: UserPosition,
    user_pools: UserPools,
    staked: u64,
    paid: Vec<(Pubkey, u64)>,
    executor_bounty: u64,
    collector: u64,
}

impl LedgerHost {
    fn with_deposit(config: Rc<RefCell<VaultConfig>>, amount: u64) -> Self {
        let mut host = Self {
            config,
            strategy: StrategyState::default(),
            position: UserPosition::default(),
            user_pools: UserPools::default(),
            staked: 0,
            paid: vec![],
            executor_bounty: 0,
            collector: 0,
        };
        host.staked = amount;
        host.book().credit_deposit(0, amount).unwrap();
        host
    }

    fn book(&mut self) -> PositionBook<'_> {
        PositionBook {
            pool_id: 0,
            strategy: &mut self.strategy,
            position: &mut self.position,
            user_pools: &mut self.user_pools,
        }
    }
}

impl RuleHost for LedgerHost {
    fn acquire_rule_lock(&mut self) -> Result<()> {
        let mut config = self.config.borrow_mut();
        config.acquire_rule_lock()?;
        config.enter()
    }

    fn release_rule_lock(&mut self) {
        let mut config = self.config.borrow_mut();
        config.release_rule_lock();
        config.leave();
    }

    fn try_harvest(&mut self) {}

    fn redeemable(&self) -> Result<u64> {
        self.position.redeemable(self.staked, self.strategy.shares_total)
    }

    fn rule_fee_bps(&self) -> u16 {
        self.config.borrow().rule_fee_bps
    }

    fn withdraw_for_rule(&mut self, amount: u64, rule_fee: u64, recipient: Pubkey) -> Result<()> {
        assert!(self.config.borrow().entered, "rule withdrawal outside the guard");

        let staked = self.staked;
        let (amount, _) = self.book().debit_withdraw(amount, staked)?;

        let plan = WithdrawSettlement::plan(
            amount,
            self.staked,
            self.staked,
            rule_fee,
            true,
            &self.config.borrow(),
        )?;
        self.staked -= plan.payout;
        self.executor_bounty += plan.hunter_bounty;
        self.collector += plan.rule_fee_to_collector + plan.withdraw_fee;
        self.paid.push((recipient, plan.to_recipient));
        Ok(())
    }
}

/// Plugin that answers both role checks with a fixed flag
struct Impersonator(bool);

impl Condition for Impersonator {
    fn is_condition(&self) -> Result<bool> {
        Ok(self.0)
    }

    fn check(&self, _call: &PluginCall) -> Result<bool> {
        Ok(true)
    }
}

impl Action for Impersonator {
    fn is_action(&self) -> Result<bool> {
        Ok(self.0)
    }

    fn execute(&self, call: &PluginCall) -> Result<ActionOrder> {
        Ok(ActionOrder {
            amount: 0,
            recipient: call.user,
        })
    }

    fn callback(&self, _call: &PluginCall) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_rule_plugins_must_declare_their_roles() {
    require_plugin_roles(&Impersonator(true), &Impersonator(true)).unwrap();
    assert_vault_error(
        require_plugin_roles(&Impersonator(false), &Impersonator(true)),
        VaultError::NotACondition,
    );
    assert_vault_error(
        require_plugin_roles(&Impersonator(true), &Impersonator(false)),
        VaultError::NotAnAction,
    );
}

struct Always(bool);

impl Condition for Always {
    fn is_condition(&self) -> Result<bool> {
        Ok(true)
    }

    fn check(&self, _call: &PluginCall) -> Result<bool> {
        Ok(self.0)
    }
}

/// Withdraws the amount in its first integer argument to a fixed recipient
struct PayOut {
    recipient: Pubkey,
}

impl Action for PayOut {
    fn is_action(&self) -> Result<bool> {
        Ok(true)
    }

    fn execute(&self, call: &PluginCall) -> Result<ActionOrder> {
        Ok(ActionOrder {
            amount: call.int_args.first().copied().unwrap_or_default(),
            recipient: self.recipient,
        })
    }

    fn callback(&self, _call: &PluginCall) -> Result<()> {
        Ok(())
    }
}

fn rule_config() -> Rc<RefCell<VaultConfig>> {
    Rc::new(RefCell::new(VaultConfig {
        withdraw_fee_bps: 0,
        rule_fee_bps: 100,
        rule_fee_bounty_bps: 5_000,
        ..Default::default()
    }))
}

fn base_call() -> PluginCall {
    PluginCall {
        vault: Pubkey::new_unique(),
        strategy: Pubkey::new_unique(),
        user: Pubkey::new_unique(),
        pool_id: 0,
        int_args: vec![],
        addr_args: vec![],
    }
}

fn payout_rule(amount: u64) -> Rule {
    Rule {
        action_int_args: vec![amount],
        ..Default::default()
    }
}

#[test]
fn test_rule_execution_conserves_tokens_and_shares() {
    let config = rule_config();
    let mut host = LedgerHost::with_deposit(config.clone(), 100_000);
    let recipient = Pubkey::new_unique();

    let outcome = execute_rule(
        &mut host,
        &Always(true),
        &PayOut { recipient },
        &payout_rule(40_000),
        &base_call(),
    )
    .unwrap();

    assert_eq!(outcome.amount, 40_000);
    assert_eq!(outcome.rule_fee, 400);
    assert_eq!(host.paid, vec![(recipient, 39_600)]);
    assert_eq!(host.executor_bounty, 200);
    assert_eq!(host.collector, 200);
    assert_eq!(host.staked, 60_000);
    assert_eq!(host.strategy.shares_total, host.position.shares);

    let state = config.borrow();
    assert!(!state.rule_execution_locked);
    assert!(!state.entered);
}

#[test]
fn test_rule_cannot_withdraw_more_than_the_position_holds() {
    let config = rule_config();
    let mut host = LedgerHost::with_deposit(config, 1_000);

    let outcome = execute_rule(
        &mut host,
        &Always(true),
        &PayOut {
            recipient: Pubkey::new_unique(),
        },
        &payout_rule(u64::MAX),
        &base_call(),
    )
    .unwrap();

    assert_eq!(outcome.amount, 1_000);
    assert_eq!(host.position.shares, 0);
    assert_eq!(host.strategy.shares_total, 0);
    assert_eq!(host.staked, 0);
    assert!(!host.user_pools.contains(0));
}

#[test]
fn test_unmet_condition_leaves_ledger_untouched() {
    let config = rule_config();
    let mut host = LedgerHost::with_deposit(config.clone(), 1_000);

    let result = execute_rule(
        &mut host,
        &Always(false),
        &PayOut {
            recipient: Pubkey::new_unique(),
        },
        &payout_rule(500),
        &base_call(),
    );

    assert_vault_error(result, VaultError::ConditionNotMet);
    assert_eq!(host.staked, 1_000);
    assert!(host.paid.is_empty());
    assert!(!config.borrow().rule_execution_locked);
}

#[test]
fn test_concurrent_rule_execution_is_rejected() {
    let config = rule_config();
    let mut host = LedgerHost::with_deposit(config.clone(), 1_000);

    // another execution already holds the lock
    config.borrow_mut().acquire_rule_lock().unwrap();

    let result = execute_rule(
        &mut host,
        &Always(true),
        &PayOut {
            recipient: Pubkey::new_unique(),
        },
        &payout_rule(500),
        &base_call(),
    );

    assert_vault_error(result, VaultError::RuleExecutionLocked);
    assert_eq!(host.staked, 1_000);
}
