//! Strategy side of the vault: custody, share conversion, harvest and
//! reinvest, fee distribution.

pub mod harvest;
pub mod settlement;
pub mod strategy;

pub use harvest::*;
pub use settlement::*;
pub use strategy::*;
