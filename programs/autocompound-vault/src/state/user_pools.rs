use anchor_lang::prelude::*;

use crate::{constants::MAX_ACTIVE_POOLS, errors::VaultError};

/// Pools in which an owner currently holds a nonzero number of shares
///
/// PDA derived from ["user_pools", owner]. A pool id is present exactly when
/// the owner's position in that pool has shares.
#[account]
#[derive(InitSpace, Default)]
pub struct UserPools {
    pub owner: Pubkey,

    #[max_len(32)]
    pub pools: Vec<u32>,

    pub bump: u8,
}

impl UserPools {
    pub fn contains(&self, pool_id: u32) -> bool {
        self.pools.contains(&pool_id)
    }

    pub fn insert(&mut self, pool_id: u32) -> Result<()> {
        if self.contains(pool_id) {
            return Ok(());
        }
        require!(
            self.pools.len() < MAX_ACTIVE_POOLS,
            VaultError::ActivePoolLimitReached
        );
        self.pools.push(pool_id);
        Ok(())
    }

    /// A deposit by `depositor` may only add a pool the owner does not hold
    /// yet when the owner makes it. Third parties can top up held pools but
    /// cannot fill the set with dust positions.
    pub fn require_open_by(&self, pool_id: u32, depositor: &Pubkey) -> Result<()> {
        if !self.contains(pool_id) {
            require_keys_eq!(*depositor, self.owner, VaultError::NewPoolNotOpenedByOwner);
        }
        Ok(())
    }

    pub fn remove(&mut self, pool_id: u32) {
        if let Some(index) = self.pools.iter().position(|id| *id == pool_id) {
            self.pools.swap_remove(index);
        }
    }
}
