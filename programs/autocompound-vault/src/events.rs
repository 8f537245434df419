use anchor_lang::prelude::*;

use crate::state::FeeKind;

/// Event emitted when the vault configuration is created
#[event]
pub struct VaultInitialized {
    pub vault_config: Pubkey,
    pub owner: Pubkey,
    pub fee_address: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when a strategy is registered as a pool
#[event]
pub struct PoolRegistered {
    pub pool: Pubkey,
    pub pool_id: u32,
    pub strategy: Pubkey,
    pub stake_mint: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when stake tokens are deposited
#[event]
pub struct Deposited {
    pub pool_id: u32,
    pub depositor: Pubkey,
    pub beneficiary: Pubkey,
    pub amount: u64,
    pub shares_added: u64,
    pub shares_total: u64,
    pub timestamp: i64,
}

/// Event emitted when stake tokens leave a pool
#[event]
pub struct Withdrawn {
    pub pool_id: u32,
    pub owner: Pubkey,
    pub recipient: Pubkey,
    pub amount: u64,
    pub shares_removed: u64,
    pub shares_total: u64,
    pub bounty_hunter: Option<Pubkey>,
    pub timestamp: i64,
}

/// Event emitted after a harvest-and-reinvest cycle
#[event]
pub struct Harvested {
    pub pool_id: u32,
    pub strategy: Pubkey,
    pub harvested: u64,
    pub performance_fee: u64,
    pub bounty: u64,
    pub bounty_hunter: Option<Pubkey>,
    pub timestamp: i64,
}

#[event]
pub struct RuleAdded {
    pub pool_id: u32,
    pub owner: Pubkey,
    pub index: u32,
    pub condition: Pubkey,
    pub action: Pubkey,
}

#[event]
pub struct RuleRemoved {
    pub pool_id: u32,
    pub owner: Pubkey,
    pub index: u32,
}

/// Event emitted when a third party executes a user's rule
#[event]
pub struct RuleExecuted {
    pub pool_id: u32,
    pub owner: Pubkey,
    pub index: u32,
    pub executor: Pubkey,
    pub amount: u64,
    pub recipient: Pubkey,
    pub rule_fee: u64,
    pub timestamp: i64,
}

#[event]
pub struct FeeUpdated {
    pub kind: FeeKind,
    pub old_bps: u16,
    pub new_bps: u16,
}

#[event]
pub struct FeeAddressUpdated {
    pub old_fee_address: Pubkey,
    pub new_fee_address: Pubkey,
}

#[event]
pub struct FeeSetterUpdated {
    pub old_fee_setter: Pubkey,
    pub new_fee_setter: Pubkey,
}

#[event]
pub struct OperatorToggled {
    pub operator: Pubkey,
    pub enabled: bool,
}

#[event]
pub struct OwnershipTransferred {
    pub previous_owner: Pubkey,
    pub new_owner: Pubkey,
}

/// Event emitted when an operator creates a strategy
#[event]
pub struct StrategyInitialized {
    pub strategy: Pubkey,
    pub stake_mint: Pubkey,
    pub earn_mint: Pubkey,
    pub farm_program: Pubkey,
    pub paired: bool,
    pub timestamp: i64,
}

#[event]
pub struct StrategyPauseToggled {
    pub strategy: Pubkey,
    pub paused: bool,
}

/// Event emitted when a strategy exits its farm for good
#[event]
pub struct StrategyEmergencyWithdrawn {
    pub strategy: Pubkey,
    pub recovered: u64,
    pub timestamp: i64,
}

#[event]
pub struct SwapPathUpdated {
    pub strategy: Pubkey,
    pub from: Pubkey,
    pub to: Pubkey,
    pub path: Vec<Pubkey>,
}

#[event]
pub struct ExtraEarnTokensUpdated {
    pub strategy: Pubkey,
    pub mints: Vec<Pubkey>,
}

#[event]
pub struct RouterToggled {
    pub strategy: Pubkey,
    pub use_liquidity_router: bool,
}

#[event]
pub struct TokenSwept {
    pub strategy: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}
