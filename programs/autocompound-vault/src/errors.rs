use anchor_lang::prelude::*;

/// Custom error codes for the Autocompound Vault program
///
/// Every variant aborts the whole instruction; nothing is recovered locally
/// except inside the best-effort harvest wrapper.
#[error_code]
pub enum VaultError {
    // Authorization
    #[msg("Unauthorized - only the vault owner can perform this action")]
    Unauthorized,

    #[msg("Caller is not an operator")]
    NotOperator,

    #[msg("Only the current fee setter can perform this action")]
    NotFeeSetter,

    #[msg("Rules can only be executed from a top-level instruction")]
    CallerIsContract,

    // Invariant violations
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Fee exceeds its maximum allowed value")]
    FeeExceedsCap,

    #[msg("Strategy already backs a pool")]
    StrategyAlreadyRegistered,

    #[msg("Strategy does not belong to this vault")]
    StrategyVaultMismatch,

    #[msg("Rule index out of range")]
    RuleIndexOutOfRange,

    #[msg("Rule limit reached for this pool")]
    TooManyRules,

    #[msg("Too many rule arguments")]
    TooManyRuleArgs,

    #[msg("Condition plugin failed self-identification")]
    NotACondition,

    #[msg("Action plugin failed self-identification")]
    NotAnAction,

    #[msg("Rule condition is not satisfied")]
    ConditionNotMet,

    #[msg("Operator list is full")]
    OperatorListFull,

    #[msg("Active pool limit reached for this owner")]
    ActivePoolLimitReached,

    #[msg("Only the owner can open a position in a new pool")]
    NewPoolNotOpenedByOwner,

    #[msg("Too many extra earn tokens - maximum 5")]
    TooManyExtraEarnTokens,

    #[msg("Swap path is invalid")]
    InvalidSwapPath,

    #[msg("Swap path table is full")]
    SwapPathTableFull,

    #[msg("Paired strategy requires both constituent mints")]
    InvalidPairConfig,

    // Insufficient state
    #[msg("Owner has no shares in this pool")]
    NoShares,

    #[msg("Pool has no outstanding shares")]
    PoolHasNoShares,

    #[msg("Strategy is paused")]
    StrategyPaused,

    #[msg("Strategy is not paused")]
    StrategyNotPaused,

    #[msg("Strategy funds were emergency withdrawn - cannot unpause")]
    EmergencyWithdrawn,

    // Lock conflicts
    #[msg("Reentrant call into an asset-moving instruction")]
    ReentrancyDetected,

    #[msg("Another rule execution is in progress")]
    RuleExecutionLocked,

    // Math
    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Math underflow occurred during calculation")]
    MathUnderflow,

    #[msg("Cannot divide by zero")]
    DivisionByZero,

    // Account validation
    #[msg("Invalid token mint")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    #[msg("Recipient token account does not belong to the action's recipient")]
    InvalidRecipient,

    #[msg("Not enough remaining accounts supplied")]
    MissingAccounts,

    #[msg("Supplied account does not match the configured account")]
    AccountMismatch,

    #[msg("Account is not a program")]
    NotExecutable,

    // External interfaces
    #[msg("Plugin returned no data or data from the wrong program")]
    InvalidReturnData,
}
