pub mod farm;
pub mod referral;
pub mod simple;
pub mod staking;

pub use farm::*;
pub use referral::*;
pub use simple::*;
pub use staking::*;
