//! Multi-modulus backend: a value is stored as its residues modulo k pairwise distinct primes,
//! plus one residue modulo a check prime that does not count towards the capacity.
//!
//! Arithmetic runs independently per residue, each reduced by its own prime; no carries cross
//! residues. [`CrtCalculator::to_biguint`] is the only place residues are combined:
//!
//! ```text
//! value = Σ r_i · c_i  mod M,   M = Π p_i,   c_i = (M / p_i) · ((M / p_i)^-1 mod p_i)
//! ```
//!
//! A value that wrapped past M reconstructs to the wrong number; its residue modulo the check
//! prime q then disagrees with `value mod q` (unless the error is a multiple of q).
//!
//! A buffer of N values is one flat `Vec<u64>` of N·(k+1) residues (stride k+1, check last).

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::error::EngineError;
use crate::bignum::primes::{is_prime, pow_mod, prev_prime, prime_limit};
use crate::bignum::resources::AllocTracker;
use crate::bignum::{Backend, BackendKind, Init, Operation};

#[derive(Debug)]
pub struct CrtCalculator {
    op: Operation,
    /// Base primes followed by the check prime.
    moduli: Vec<u64>,
    coefficients: Vec<BigUint>,
    modulus: BigUint,
    bound: BigUint,
    tracker: AllocTracker,
}

impl CrtCalculator {
    /// Build a CRT calculator over `primes`.
    ///
    /// The primes must be distinct, of `op`'s class (so residue arithmetic never wraps a
    /// `u64`), and their product must exceed `bound`. The check prime is the largest prime of
    /// the same class that is not in `primes`.
    pub fn new(
        primes: &[u64],
        bound: &BigUint,
        op: Operation,
        tracker: AllocTracker,
    ) -> Result<Self, EngineError> {
        if primes.is_empty() {
            return Err(EngineError::invalid("CRT backend needs at least one prime"));
        }
        let limit = prime_limit(op);
        for (i, &p) in primes.iter().enumerate() {
            if p >= limit || !is_prime(p) {
                return Err(EngineError::invalid(format!(
                    "{p} is not a prime below {limit} (required for {})",
                    op.as_str()
                )));
            }
            if primes[..i].contains(&p) {
                return Err(EngineError::invalid(format!("prime {p} listed twice")));
            }
        }

        let modulus: BigUint = primes.iter().map(|&p| BigUint::from(p)).product();
        if modulus <= *bound {
            return Err(EngineError::invalid(format!(
                "product of {} primes does not exceed the bound",
                primes.len()
            )));
        }

        let mut check = prev_prime(limit);
        while let Some(q) = check.filter(|q| primes.contains(q)) {
            check = prev_prime(q);
        }
        let check =
            check.ok_or_else(|| EngineError::invalid("no check prime left outside the base primes"))?;

        let coefficients = primes
            .iter()
            .map(|&p| {
                let m_i = &modulus / p;
                let m_i_mod = (&m_i % p)
                    .to_u64()
                    .expect("residue modulo a u64 prime fits u64");
                // p is prime and does not divide m_i
                let inv = pow_mod(m_i_mod, p - 2, p);
                m_i * inv
            })
            .collect();

        let mut moduli = primes.to_vec();
        moduli.push(check);
        Ok(Self {
            op,
            moduli,
            coefficients,
            modulus,
            bound: bound.clone(),
            tracker,
        })
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut AllocTracker {
        &mut self.tracker
    }

    /// The base primes; their product is the capacity.
    #[inline]
    pub fn primes(&self) -> &[u64] {
        &self.moduli[..self.moduli.len() - 1]
    }

    #[inline]
    pub fn check_prime(&self) -> u64 {
        self.moduli[self.moduli.len() - 1]
    }

    /// Product of the base primes.
    #[inline]
    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    #[inline]
    fn stride(&self) -> usize {
        self.moduli.len()
    }

    #[inline]
    fn range(&self, i: usize) -> std::ops::Range<usize> {
        let k = self.stride();
        i * k..(i + 1) * k
    }

    /// Residues of `value` modulo each base prime, then modulo the check prime.
    pub fn residues_of(&self, value: &BigUint) -> Vec<u64> {
        self.moduli
            .iter()
            .map(|&p| {
                (value % p)
                    .to_u64()
                    .expect("residue modulo a u64 prime fits u64")
            })
            .collect()
    }

    /// Recombine the base residues into the unique value in `[0, M)`.
    ///
    /// A trailing check residue, if present, is ignored.
    pub fn reconstruct(&self, residues: &[u64]) -> BigUint {
        debug_assert!(residues.len() >= self.coefficients.len());
        let mut acc = BigUint::zero();
        for (&r, c) in residues.iter().zip(&self.coefficients) {
            acc += c * r;
        }
        acc % &self.modulus
    }

    #[inline]
    fn combine(&self, d: &mut [u64], s: &[u64]) {
        match self.op {
            // p < 2^63: a + b < 2^64
            Operation::Addition => {
                for ((a, &b), &p) in d.iter_mut().zip(s).zip(&self.moduli) {
                    let sum = *a + b;
                    *a = if sum >= p { sum - p } else { sum };
                }
            }
            // p < 2^32: a * b < 2^64
            Operation::Multiplication => {
                for ((a, &b), &p) in d.iter_mut().zip(s).zip(&self.moduli) {
                    *a = (*a * b) % p;
                }
            }
        }
    }

    #[inline]
    fn difference(&self, d: &mut [u64], s: &[u64]) {
        for ((a, &b), &p) in d.iter_mut().zip(s).zip(&self.moduli) {
            *a = if *a >= b { *a - b } else { *a + (p - b) };
        }
    }

    /// Lanes of two distinct elements of one buffer.
    fn lanes<'b>(&self, buf: &'b mut [u64], di: usize, si: usize) -> (&'b mut [u64], &'b [u64]) {
        debug_assert_ne!(di, si);
        let k = self.stride();
        if di < si {
            let (lo, hi) = buf.split_at_mut(si * k);
            (&mut lo[di * k..(di + 1) * k], &hi[..k])
        } else {
            let (lo, hi) = buf.split_at_mut(di * k);
            (&mut hi[..k], &lo[si * k..(si + 1) * k])
        }
    }
}

impl Backend for CrtCalculator {
    type Buffer = Vec<u64>;

    fn kind(&self) -> BackendKind {
        BackendKind::Crt
    }

    fn operation(&self) -> Operation {
        self.op
    }

    fn bound(&self) -> &BigUint {
        &self.bound
    }

    fn element_size(&self) -> usize {
        self.stride() * std::mem::size_of::<u64>()
    }

    fn tracker(&self) -> &AllocTracker {
        &self.tracker
    }

    fn alloc_buffer(&self, len: usize, init: Init) -> Result<Vec<u64>, EngineError> {
        let total = len
            .checked_mul(self.stride())
            .ok_or(EngineError::AllocationFailed {
                stage: "crt_alloc",
                structure: "residue buffer",
                bytes: None,
            })?;
        let mut v = Vec::new();
        self.tracker
            .try_reserve_vec("crt_alloc", "residue buffer", &mut v, total)?;
        let fill = match init {
            Init::Zero => 0,
            Init::One => 1,
        };
        v.resize(total, fill);
        Ok(v)
    }

    fn set_zero(&self, buf: &mut Vec<u64>, i: usize) {
        let r = self.range(i);
        buf[r].fill(0);
    }

    fn set_one(&self, buf: &mut Vec<u64>, i: usize) {
        let r = self.range(i);
        buf[r].fill(1);
    }

    fn set_value(&self, buf: &mut Vec<u64>, i: usize, value: &BigUint) -> Result<(), EngineError> {
        if *value > self.bound {
            return Err(EngineError::BoundViolation {
                operation: "crt assign",
                bound: self.bound.clone(),
            });
        }
        let residues = self.residues_of(value);
        let r = self.range(i);
        buf[r].copy_from_slice(&residues);
        Ok(())
    }

    fn copy_from(&self, dst: &mut Vec<u64>, di: usize, src: &Vec<u64>, si: usize) {
        let (rd, rs) = (self.range(di), self.range(si));
        dst[rd].copy_from_slice(&src[rs]);
    }

    fn copy_within(&self, buf: &mut Vec<u64>, di: usize, si: usize) {
        let rs = self.range(si);
        buf.copy_within(rs, di * self.stride());
    }

    fn accumulate_from(
        &self,
        dst: &mut Vec<u64>,
        di: usize,
        src: &Vec<u64>,
        si: usize,
    ) -> Result<(), EngineError> {
        let (rd, rs) = (self.range(di), self.range(si));
        self.combine(&mut dst[rd], &src[rs]);
        Ok(())
    }

    fn accumulate_within(&self, buf: &mut Vec<u64>, di: usize, si: usize) -> Result<(), EngineError> {
        if di == si {
            let s = buf[self.range(si)].to_vec();
            self.combine(&mut buf[self.range(di)], &s);
        } else {
            let (d, s) = self.lanes(buf, di, si);
            self.combine(d, s);
        }
        Ok(())
    }

    fn subtract_from(
        &self,
        dst: &mut Vec<u64>,
        di: usize,
        src: &Vec<u64>,
        si: usize,
    ) -> Result<(), EngineError> {
        let (rd, rs) = (self.range(di), self.range(si));
        self.difference(&mut dst[rd], &src[rs]);
        Ok(())
    }

    fn subtract_within(&self, buf: &mut Vec<u64>, di: usize, si: usize) -> Result<(), EngineError> {
        if di == si {
            self.set_zero(buf, di);
        } else {
            let (d, s) = self.lanes(buf, di, si);
            self.difference(d, s);
        }
        Ok(())
    }

    fn to_biguint(&self, buf: &Vec<u64>, i: usize) -> Result<BigUint, EngineError> {
        let lane = &buf[self.range(i)];
        let value = self.reconstruct(lane);
        if value > self.bound {
            return Err(EngineError::BoundViolation {
                operation: "crt reconstruct",
                bound: self.bound.clone(),
            });
        }
        // a wrap past M is off by t·M, caught unless q divides t
        let check = lane[lane.len() - 1];
        if &value % self.check_prime() != BigUint::from(check) {
            return Err(EngineError::BoundViolation {
                operation: "crt check residue",
                bound: self.bound.clone(),
            });
        }
        Ok(value)
    }
}
