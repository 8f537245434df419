use anchor_lang::{
    prelude::*,
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program::invoke_signed,
    },
};
use anchor_spl::token::accessor;

use crate::{
    constants::{ACCOUNTS_PER_HOP, LIQUIDITY_ACCOUNTS_LEN},
    errors::VaultError,
    utils::{instruction_data, require_associated_token, require_program, AccountCursor},
};

#[derive(AnchorSerialize)]
struct SwapExactTokensForTokensArgs {
    amount_in: u64,
    amount_out_min: u64,
    path: Vec<Pubkey>,
    deadline: i64,
}

#[derive(AnchorSerialize)]
struct AddLiquidityArgs {
    amount_a_desired: u64,
    amount_b_desired: u64,
    amount_a_min: u64,
    amount_b_min: u64,
    deadline: i64,
}

/**
 * SWAP GROUP ACCOUNT ORDER
 * 0 - source token account (strategy authority ATA of path[0])
 * 1 - destination token account (strategy authority ATA of path[last])
 * then for every hop of the path:
 *   pair state, pair vault in, pair vault out
 */
pub struct SwapLeg<'a, 'info> {
    pub source: &'a AccountInfo<'info>,
    pub destination: &'a AccountInfo<'info>,
    hops: &'a [AccountInfo<'info>],
    path: Vec<Pubkey>,
}

impl<'a, 'info> SwapLeg<'a, 'info> {
    pub fn accounts_len(path_len: usize) -> usize {
        2 + ACCOUNTS_PER_HOP * path_len.saturating_sub(1)
    }

    /// Take one swap group for `path` off the cursor. Source and destination
    /// must be the strategy authority's token accounts for the path's ends.
    pub fn from_cursor(
        cursor: &mut AccountCursor<'a, 'info>,
        path: Vec<Pubkey>,
        authority: &Pubkey,
    ) -> Result<Self> {
        let (first, last) = match (path.first(), path.last()) {
            (Some(first), Some(last)) if path.len() >= 2 => (*first, *last),
            _ => return err!(VaultError::InvalidSwapPath),
        };

        require!(
            cursor.remaining() >= Self::accounts_len(path.len()),
            VaultError::MissingAccounts
        );
        let source = cursor.next()?;
        let destination = cursor.next()?;
        let hops = cursor.take(ACCOUNTS_PER_HOP * (path.len() - 1))?;

        require_associated_token(source, authority, &first)?;
        require_associated_token(destination, authority, &last)?;

        Ok(Self {
            source,
            destination,
            hops,
            path,
        })
    }
}

/// Router program signed for by the strategy authority
pub struct Router<'a, 'info> {
    program: &'a AccountInfo<'info>,
    authority: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
}

impl<'a, 'info> Router<'a, 'info> {
    pub fn new(
        program: &'a AccountInfo<'info>,
        expected: &Pubkey,
        authority: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
    ) -> Result<Self> {
        require_program(program, expected)?;
        Ok(Self {
            program,
            authority,
            token_program,
        })
    }

    /// Exact-input swap along the leg's path. No minimum output is enforced
    /// and the deadline is the current block time.
    pub fn swap_exact_in(
        &self,
        leg: &SwapLeg<'a, 'info>,
        amount_in: u64,
        signer_seeds: &[&[&[u8]]],
    ) -> Result<()> {
        if amount_in == 0 {
            return Ok(());
        }

        let args = SwapExactTokensForTokensArgs {
            amount_in,
            amount_out_min: 0,
            path: leg.path.clone(),
            deadline: Clock::get()?.unix_timestamp,
        };

        let mut metas = vec![
            AccountMeta::new_readonly(*self.authority.key, true),
            AccountMeta::new(*leg.source.key, false),
            AccountMeta::new(*leg.destination.key, false),
            AccountMeta::new_readonly(*self.token_program.key, false),
        ];
        let mut infos = vec![
            self.authority.clone(),
            leg.source.clone(),
            leg.destination.clone(),
            self.token_program.clone(),
        ];
        for hop in leg.hops {
            metas.push(AccountMeta::new(*hop.key, false));
            infos.push(hop.clone());
        }
        infos.push(self.program.clone());

        let ix = Instruction {
            program_id: *self.program.key,
            accounts: metas,
            data: instruction_data(
                "swap_exact_tokens_for_tokens_supporting_fee_on_transfer_tokens",
                &args,
            )?,
        };
        invoke_signed(&ix, &infos, signer_seeds)?;
        Ok(())
    }
}

/**
 * LIQUIDITY GROUP ACCOUNT ORDER
 * 0 - liquidity router program
 * 1 - strategy token0 account
 * 2 - strategy token1 account
 * 3 - pair state
 * 4 - pair vault 0
 * 5 - pair vault 1
 * 6 - lp mint
 */
pub struct LiquidityLeg<'a, 'info> {
    accounts: &'a [AccountInfo<'info>],
}

impl<'a, 'info> LiquidityLeg<'a, 'info> {
    pub fn from_cursor(
        cursor: &mut AccountCursor<'a, 'info>,
        liquidity_router: &Pubkey,
        authority: &Pubkey,
        token0_mint: &Pubkey,
        token1_mint: &Pubkey,
        lp_mint: &Pubkey,
    ) -> Result<Self> {
        let accounts = cursor.take(LIQUIDITY_ACCOUNTS_LEN)?;
        require_program(&accounts[0], liquidity_router)?;
        require_associated_token(&accounts[1], authority, token0_mint)?;
        require_associated_token(&accounts[2], authority, token1_mint)?;
        require_keys_eq!(*accounts[6].key, *lp_mint, VaultError::InvalidMint);
        Ok(Self { accounts })
    }

    pub fn token0(&self) -> &AccountInfo<'info> {
        &self.accounts[1]
    }

    pub fn token1(&self) -> &AccountInfo<'info> {
        &self.accounts[2]
    }

    /// Provide the strategy's whole token0 and token1 balances as liquidity,
    /// minting LP tokens into `lp_destination`
    pub fn add_liquidity(
        &self,
        authority: &AccountInfo<'info>,
        lp_destination: &AccountInfo<'info>,
        token_program: &AccountInfo<'info>,
        signer_seeds: &[&[&[u8]]],
    ) -> Result<()> {
        let amount_a = accessor::amount(self.token0())?;
        let amount_b = accessor::amount(self.token1())?;
        if amount_a == 0 || amount_b == 0 {
            msg!("Skipping add_liquidity: token0 {} token1 {}", amount_a, amount_b);
            return Ok(());
        }

        let args = AddLiquidityArgs {
            amount_a_desired: amount_a,
            amount_b_desired: amount_b,
            amount_a_min: 0,
            amount_b_min: 0,
            deadline: Clock::get()?.unix_timestamp,
        };

        let program = &self.accounts[0];
        let ix = Instruction {
            program_id: *program.key,
            accounts: vec![
                AccountMeta::new_readonly(*authority.key, true),
                AccountMeta::new(*self.accounts[1].key, false),
                AccountMeta::new(*self.accounts[2].key, false),
                AccountMeta::new(*self.accounts[3].key, false),
                AccountMeta::new(*self.accounts[4].key, false),
                AccountMeta::new(*self.accounts[5].key, false),
                AccountMeta::new(*self.accounts[6].key, false),
                AccountMeta::new(*lp_destination.key, false),
                AccountMeta::new_readonly(*token_program.key, false),
            ],
            data: instruction_data("add_liquidity", &args)?,
        };

        invoke_signed(
            &ix,
            &[
                authority.clone(),
                self.accounts[1].clone(),
                self.accounts[2].clone(),
                self.accounts[3].clone(),
                self.accounts[4].clone(),
                self.accounts[5].clone(),
                self.accounts[6].clone(),
                lp_destination.clone(),
                token_program.clone(),
                program.clone(),
            ],
            signer_seeds,
        )?;
        Ok(())
    }
}
