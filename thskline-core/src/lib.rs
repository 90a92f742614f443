//! THS k-line core: domain types, payload decoder, source, store.
//!
//! This crate contains:
//! - Domain types (securities, daily k-line records, adjustment flags)
//! - The decoder for the 10jqka `all.js` payload (calendar + delta-from-low prices)
//! - The `KlineSource` trait and its blocking HTTP implementation
//! - Stock-list loading and the per-security on-disk store
//! - A dispatch throttle shared across worker threads

pub mod data;
pub mod decode;
pub mod domain;

pub use decode::{decode, decode_independent, DecodeError, DecodeOutcome};
