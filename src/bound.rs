//! A-priori magnitude bounds.
//!
//! The engine trusts whatever bound it is given; an estimate below the true maximum makes the
//! computation void (reported as a bound violation where the backend can see it).

use num_bigint::BigUint;
use num_traits::One;

use crate::game::Game;
use crate::bignum::Operation;

/// Upper bound on every value a computation over `game` will hold.
pub trait MagnitudeEstimator {
    fn estimate(&self, game: &Game, op: Operation) -> BigUint;
}

/// Cheap closed-form bound in the number of non-null players `n`.
///
/// Addition: `2^n`, which dominates any count of coalitions and any sum of such counts taken
/// over disjoint weight ranges. Multiplication: `n! * 2^n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastUpperBound;

impl MagnitudeEstimator for FastUpperBound {
    fn estimate(&self, game: &Game, op: Operation) -> BigUint {
        let n = game.non_null_count();
        let subsets = BigUint::one() << n;
        match op {
            Operation::Addition => subsets,
            Operation::Multiplication => {
                let factorial: BigUint = (1..=n as u64).map(BigUint::from).product();
                factorial * subsets
            }
        }
    }
}
