use anchor_lang::{
    prelude::*,
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program::{get_return_data, invoke},
    },
};

use crate::{errors::VaultError, state::Rule};

/// Payload handed to every condition/action plugin call
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PluginCall {
    pub vault: Pubkey,
    pub strategy: Pubkey,
    pub user: Pubkey,
    pub pool_id: u32,
    pub int_args: Vec<u64>,
    pub addr_args: Vec<Pubkey>,
}

impl PluginCall {
    pub fn for_condition(base: &PluginCall, rule: &Rule) -> Self {
        Self {
            int_args: rule.condition_int_args.clone(),
            addr_args: rule.condition_addr_args.clone(),
            ..base.clone()
        }
    }

    pub fn for_action(base: &PluginCall, rule: &Rule) -> Self {
        Self {
            int_args: rule.action_int_args.clone(),
            addr_args: rule.action_addr_args.clone(),
            ..base.clone()
        }
    }
}

/// What an action asks the vault to withdraw, and for whom
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionOrder {
    pub amount: u64,
    pub recipient: Pubkey,
}

pub trait Condition {
    fn is_condition(&self) -> Result<bool>;

    /// Side-effect free predicate over the user's pool state
    fn check(&self, call: &PluginCall) -> Result<bool>;
}

pub trait Action {
    fn is_action(&self) -> Result<bool>;

    /// Side-effect free: how much to withdraw and where to send it
    fn execute(&self, call: &PluginCall) -> Result<ActionOrder>;

    /// Invoked after settlement; may have side effects
    fn callback(&self, call: &PluginCall) -> Result<()>;
}

/// A new rule's plugins must identify as a condition and an action
pub fn require_plugin_roles(condition: &impl Condition, action: &impl Action) -> Result<()> {
    require!(condition.is_condition()?, VaultError::NotACondition);
    require!(action.is_action()?, VaultError::NotAnAction);
    Ok(())
}

/// A plugin program reached over CPI
///
/// `context` accounts (vault state the plugin may inspect) are forwarded
/// read-only on every call, followed by the accounts named in the rule's
/// address arguments. Only `callback` passes the latter on as writable.
pub struct PluginProgram<'a, 'info> {
    program: &'a AccountInfo<'info>,
    context: Vec<AccountInfo<'info>>,
    addr_accounts: Vec<AccountInfo<'info>>,
}

impl<'a, 'info> PluginProgram<'a, 'info> {
    pub fn new(
        program: &'a AccountInfo<'info>,
        context: Vec<AccountInfo<'info>>,
        addr_accounts: Vec<AccountInfo<'info>>,
    ) -> Result<Self> {
        require!(program.executable, VaultError::NotExecutable);
        Ok(Self {
            program,
            context,
            addr_accounts,
        })
    }

    fn invoke_method(
        &self,
        method: &str,
        payload: Option<&PluginCall>,
        writable: bool,
    ) -> Result<()> {
        let data = match payload {
            Some(call) => crate::utils::instruction_data(method, call)?,
            None => crate::utils::sighash(method).to_vec(),
        };

        let read_only = self.context.iter().map(|info| AccountMeta::new_readonly(*info.key, false));
        let addr_args = self.addr_accounts.iter().map(|info| AccountMeta {
            pubkey: *info.key,
            is_signer: false,
            is_writable: writable && info.is_writable,
        });
        let accounts = read_only.chain(addr_args).collect();

        let mut infos = self.context.clone();
        infos.extend(self.addr_accounts.iter().cloned());
        infos.push(self.program.clone());

        invoke(
            &Instruction {
                program_id: *self.program.key,
                accounts,
                data,
            },
            &infos,
        )?;
        Ok(())
    }

    /// Call a view-style method and decode what the plugin returned
    fn query<T: AnchorDeserialize>(&self, method: &str, payload: Option<&PluginCall>) -> Result<T> {
        self.invoke_method(method, payload, false)?;

        let (program_id, data) =
            get_return_data().ok_or(error!(VaultError::InvalidReturnData))?;
        require_keys_eq!(program_id, *self.program.key, VaultError::InvalidReturnData);

        T::try_from_slice(&data).map_err(|_| error!(VaultError::InvalidReturnData))
    }
}

pub struct CpiCondition<'a, 'info>(pub PluginProgram<'a, 'info>);

impl Condition for CpiCondition<'_, '_> {
    fn is_condition(&self) -> Result<bool> {
        self.0.query("is_condition", None)
    }

    fn check(&self, call: &PluginCall) -> Result<bool> {
        self.0.query("check", Some(call))
    }
}

pub struct CpiAction<'a, 'info>(pub PluginProgram<'a, 'info>);

impl Action for CpiAction<'_, '_> {
    fn is_action(&self) -> Result<bool> {
        self.0.query("is_action", None)
    }

    fn execute(&self, call: &PluginCall) -> Result<ActionOrder> {
        self.0.query("execute", Some(call))
    }

    fn callback(&self, call: &PluginCall) -> Result<()> {
        self.0.invoke_method("callback", Some(call), true)
    }
}

/// Take the accounts backing a rule's address arguments off the cursor,
/// checking they are exactly the stored keys in order
pub fn addr_arg_accounts<'a, 'info>(
    cursor: &mut crate::utils::AccountCursor<'a, 'info>,
    addr_args: &[Pubkey],
) -> Result<Vec<AccountInfo<'info>>> {
    let accounts = cursor.take(addr_args.len())?;
    for (info, expected) in accounts.iter().zip(addr_args) {
        require_keys_eq!(*info.key, *expected, VaultError::AccountMismatch);
    }
    Ok(accounts.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_and_action_calls_carry_their_own_args() {
        let rule = Rule {
            condition: Pubkey::new_unique(),
            condition_int_args: vec![1, 2],
            condition_addr_args: vec![Pubkey::new_unique()],
            action: Pubkey::new_unique(),
            action_int_args: vec![3],
            action_addr_args: vec![],
        };
        let base = PluginCall {
            vault: Pubkey::new_unique(),
            strategy: Pubkey::new_unique(),
            user: Pubkey::new_unique(),
            pool_id: 4,
            int_args: vec![],
            addr_args: vec![],
        };

        let condition = PluginCall::for_condition(&base, &rule);
        assert_eq!(condition.int_args, vec![1, 2]);
        assert_eq!(condition.addr_args, rule.condition_addr_args);
        assert_eq!(condition.pool_id, 4);

        let action = PluginCall::for_action(&base, &rule);
        assert_eq!(action.int_args, vec![3]);
        assert!(action.addr_args.is_empty());
        assert_eq!(action.user, base.user);
    }

    #[test]
    fn test_action_order_wire_format() {
        let order = ActionOrder {
            amount: 42,
            recipient: Pubkey::new_unique(),
        };
        let mut bytes = Vec::new();
        order.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 40);
        assert_eq!(ActionOrder::try_from_slice(&bytes).unwrap(), order);
    }
}
