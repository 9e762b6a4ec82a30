//! Exact power indices for weighted voting games.
//!
//! Coalition counts grow like `2^n`, so everything is counted exactly with a large-number
//! engine ([`bignum`]) that picks a native, arbitrary-precision or multi-modulus representation
//! from an a-priori magnitude bound.

pub mod error;
pub mod bignum;
pub mod counting;
pub mod game;
pub mod bound;
pub mod index;
pub mod config;
