use anchor_lang::prelude::*;

/// One registered stake-asset/strategy pairing
///
/// PDA derived from ["pool", pool_id.to_le_bytes()]. Immutable after creation.
#[account]
#[derive(InitSpace)]
pub struct Pool {
    pub pool_id: u32,

    /// Mint users deposit into this pool, copied from the strategy
    pub stake_mint: Pubkey,

    /// Strategy that custodies the pool's funds
    pub strategy: Pubkey,

    pub bump: u8,
}
