pub mod pool;
pub mod strategy;
pub mod user_pools;
pub mod user_position;
pub mod vault_config;

pub use pool::*;
pub use strategy::*;
pub use user_pools::*;
pub use user_position::*;
pub use vault_config::*;
