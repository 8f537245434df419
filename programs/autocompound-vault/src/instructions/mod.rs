pub mod admin;
pub mod check_rule;
pub mod deposit;
pub mod earn;
pub mod execute_rule;
pub mod initialize;
pub mod register_pool;
pub mod rules;
pub mod strategy_admin;
pub mod views;
pub mod withdraw;

pub use admin::*;
pub use check_rule::*;
pub use deposit::*;
pub use earn::*;
pub use execute_rule::*;
pub use initialize::*;
pub use register_pool::*;
pub use rules::*;
pub use strategy_admin::*;
pub use views::*;
pub use withdraw::*;
