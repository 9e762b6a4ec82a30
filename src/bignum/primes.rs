//! Prime selection for the multi-modulus representation.
//!
//! The selector picks the fewest, largest primes whose product strictly exceeds a magnitude
//! bound. Which primes are admissible depends on the dominant operation:
//! - addition: primes below 2^63, so `a + b` of two residues never wraps a `u64`,
//! - multiplication: primes below 2^32, so `a * b` of two residues never wraps a `u64`.
//!
//! Bounds below [`NATIVE_PRIME`] need no residues at all: a single machine word suffices.

use num_bigint::BigUint;
use num_traits::One;

use crate::bignum::Operation;

/// Largest prime below 2^64. Bounds below it fit one machine word.
pub const NATIVE_PRIME: u64 = 18_446_744_073_709_551_557;

/// Largest prime below 2^63 (first prime of the addition class).
pub const LARGEST_ADDITION_PRIME: u64 = 9_223_372_036_854_775_783;

/// Largest prime below 2^32 (first prime of the multiplication class).
pub const LARGEST_MULTIPLICATION_PRIME: u64 = 4_294_967_291;

const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

#[derive(Debug, Clone, PartialEq, Eq)]
/// The moduli chosen for one bound/operation pair.
pub struct PrimesInfo {
    primes: Vec<u64>,
    capacity: BigUint,
    native: bool,
}

impl PrimesInfo {
    #[inline]
    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    #[inline]
    pub fn amount(&self) -> usize {
        self.primes.len()
    }

    /// Product of the primes: every value in `[0, capacity)` is representable.
    #[inline]
    pub fn capacity(&self) -> &BigUint {
        &self.capacity
    }

    /// Degenerate single-modulus case served by the native word backend.
    #[inline]
    pub fn is_native(&self) -> bool {
        self.native
    }
}

/// Exclusive upper limit of the primes usable for `op`.
#[inline]
pub fn prime_limit(op: Operation) -> u64 {
    match op {
        Operation::Addition => 1u64 << 63,
        Operation::Multiplication => 1u64 << 32,
    }
}

/// Select moduli for `bound`, preferring the native word when it suffices.
pub fn select_primes(bound: &BigUint, op: Operation) -> PrimesInfo {
    if *bound < BigUint::from(NATIVE_PRIME) {
        return PrimesInfo {
            primes: vec![NATIVE_PRIME],
            capacity: BigUint::from(NATIVE_PRIME),
            native: true,
        };
    }
    select_crt_primes(bound, op)
}

/// Select primes of `op`'s class only (at least one), as needed by the CRT backend.
pub fn select_crt_primes(bound: &BigUint, op: Operation) -> PrimesInfo {
    let mut primes = Vec::new();
    let mut capacity = BigUint::one();
    let mut candidate = prime_limit(op);

    while capacity <= *bound || primes.is_empty() {
        candidate = prev_prime(candidate).expect("prime classes hold far more primes than needed");
        primes.push(candidate);
        capacity *= candidate;
    }

    PrimesInfo {
        primes,
        capacity,
        native: false,
    }
}

/// Largest prime strictly below `n`.
pub fn prev_prime(n: u64) -> Option<u64> {
    if n <= 2 {
        return None;
    }
    let mut c = n - 1;
    if c > 2 && c % 2 == 0 {
        c -= 1;
    }
    loop {
        if is_prime(c) {
            return Some(c);
        }
        // odd candidates only; 3 is prime, so this never underflows
        c -= 2;
    }
}

/// Deterministic Miller–Rabin for the whole `u64` range.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0u32;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[inline]
pub(crate) fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

pub(crate) fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut acc = 1 % m;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}
