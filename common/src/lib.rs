//! MonieKing Common Types
//!
//! This crate contains shared types used across the MonieKing wallet,
//! including identifiers, monetary types, errors and the clock abstraction.

pub mod identifiers;
pub mod monetary;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
pub use time::*;
