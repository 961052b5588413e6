//! Core types and pure transformations for slugsync
//!
//! This crate contains the slug decoder, the search-key normalizer and the
//! domain types shared across all other crates. Nothing here performs I/O.

mod constants;
mod decode;
mod env_config;
mod error;
mod normalize;
mod slug;

pub use constants::*;
pub use decode::*;
pub use env_config::*;
pub use error::*;
pub use normalize::*;
pub use slug::*;
