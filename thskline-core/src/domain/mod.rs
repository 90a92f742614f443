//! Domain types for the THS k-line crawler

pub mod kdata;
pub mod security;

pub use kdata::{AdjustFlag, KDataRecord, KLevel};
pub use security::{Exchange, Security, SecurityType};
