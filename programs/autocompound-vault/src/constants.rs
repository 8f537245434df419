// Constants for the Autocompound Vault program

/// Seed for the process-wide vault configuration PDA
pub const VAULT_CONFIG_SEED: &[u8] = b"vault_config";

/// Seed for pool PDAs: ["pool", pool_id.to_le_bytes()]
pub const POOL_SEED: &[u8] = b"pool";

/// Seed for strategy PDAs: ["strategy", stake_mint, farm_state]
pub const STRATEGY_SEED: &[u8] = b"strategy";

/// Seed for the PDA that owns a strategy's token accounts: ["strategy_authority", strategy]
pub const STRATEGY_AUTHORITY_SEED: &[u8] = b"strategy_authority";

/// Seed for user positions: ["position", pool, owner]
pub const POSITION_SEED: &[u8] = b"position";

/// Seed for the per-owner active pool set: ["user_pools", owner]
pub const USER_POOLS_SEED: &[u8] = b"user_pools";

// =============================================================================
// FEES (basis points, 1 BPS = 0.01%)
// =============================================================================

pub const BPS_DENOMINATOR: u64 = 10_000;

pub const DEPOSIT_FEE_MAX_BPS: u16 = 500;
pub const WITHDRAW_FEE_MAX_BPS: u16 = 500;
pub const PERFORMANCE_FEE_MAX_BPS: u16 = 500;
pub const RULE_FEE_MAX_BPS: u16 = 500;

/// Bounty shares are a percentage of the fee they split, so they may reach 100%
pub const PERFORMANCE_FEE_BOUNTY_MAX_BPS: u16 = 10_000;
pub const RULE_FEE_BOUNTY_MAX_BPS: u16 = 10_000;

pub const DEFAULT_DEPOSIT_FEE_BPS: u16 = 0;
pub const DEFAULT_WITHDRAW_FEE_BPS: u16 = 10;
pub const DEFAULT_PERFORMANCE_FEE_BPS: u16 = 300;
pub const DEFAULT_RULE_FEE_BPS: u16 = 100;
pub const DEFAULT_PERFORMANCE_FEE_BOUNTY_BPS: u16 = 1_000;
pub const DEFAULT_RULE_FEE_BOUNTY_BPS: u16 = 5_000;

// =============================================================================
// LIMITS
// =============================================================================

/// Rules a user may keep per pool. `add_rule` compares with `<=`, so one
/// extra rule fits; account space is sized for `MAX_USER_RULES_PER_POOL + 1`.
pub const MAX_USER_RULES_PER_POOL: usize = 10;

pub const MAX_RULE_INT_ARGS: usize = 8;
pub const MAX_RULE_ADDR_ARGS: usize = 4;

/// Pools a single owner can hold shares in at once
pub const MAX_ACTIVE_POOLS: usize = 32;

pub const MAX_OPERATORS: usize = 10;

pub const MAX_EXTRA_EARN_TOKENS: usize = 5;

pub const MAX_SWAP_PATHS: usize = 8;
pub const MIN_SWAP_PATH_LEN: usize = 2;
pub const MAX_SWAP_PATH_LEN: usize = 4;

// =============================================================================
// REMAINING ACCOUNT LAYOUTS
// =============================================================================

/// farm program, farm state, farm user stake, farm stake vault,
/// farm reward vault, strategy reward token account
pub const FARM_ACCOUNTS_LEN: usize = 6;

/// Router accounts the swap layer expects for every hop of a path
pub const ACCOUNTS_PER_HOP: usize = 3;

/// liquidity router, token0 account, token1 account, pair state,
/// pair vault 0, pair vault 1, lp mint
pub const LIQUIDITY_ACCOUNTS_LEN: usize = 7;

/// pool, strategy, strategy authority, strategy stake token account
pub const EARN_POOL_HEADER_LEN: usize = 4;
