//! Arbitrary-precision backend: one [`BigUint`] per value.
//!
//! Used when the CRT representation would need too many primes, or when explicitly requested.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::EngineError;
use crate::bignum::resources::AllocTracker;
use crate::bignum::{Backend, BackendKind, Init, Operation};

#[derive(Debug)]
pub struct BigIntCalculator {
    op: Operation,
    bound: BigUint,
    element_size: usize,
    tracker: AllocTracker,
}

impl BigIntCalculator {
    pub fn new(bound: &BigUint, op: Operation, tracker: AllocTracker) -> Self {
        // header plus the limbs a value up to `bound` occupies on the heap
        let limbs = bound.bits().div_ceil(64) as usize;
        Self {
            op,
            bound: bound.clone(),
            element_size: std::mem::size_of::<BigUint>() + limbs * std::mem::size_of::<u64>(),
            tracker,
        }
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut AllocTracker {
        &mut self.tracker
    }

    #[inline]
    fn check(&self, v: &BigUint, operation: &'static str) -> Result<(), EngineError> {
        if *v > self.bound {
            return Err(EngineError::BoundViolation {
                operation,
                bound: self.bound.clone(),
            });
        }
        Ok(())
    }

    fn combine(&self, dst: &mut BigUint, src: &BigUint) -> Result<(), EngineError> {
        let name = match self.op {
            Operation::Addition => {
                *dst += src;
                "bigint add"
            }
            Operation::Multiplication => {
                *dst *= src;
                "bigint multiply"
            }
        };
        self.check(dst, name)
    }

    fn difference(&self, dst: &mut BigUint, src: &BigUint) -> Result<(), EngineError> {
        if *src > *dst {
            return Err(EngineError::BoundViolation {
                operation: "bigint subtract",
                bound: self.bound.clone(),
            });
        }
        *dst -= src;
        Ok(())
    }
}

impl Backend for BigIntCalculator {
    type Buffer = Vec<BigUint>;

    fn kind(&self) -> BackendKind {
        BackendKind::BigInt
    }

    fn operation(&self) -> Operation {
        self.op
    }

    fn bound(&self) -> &BigUint {
        &self.bound
    }

    fn element_size(&self) -> usize {
        self.element_size
    }

    fn tracker(&self) -> &AllocTracker {
        &self.tracker
    }

    fn alloc_buffer(&self, len: usize, init: Init) -> Result<Vec<BigUint>, EngineError> {
        let mut v = Vec::new();
        self.tracker
            .try_reserve_vec("bigint_alloc", "number buffer", &mut v, len)?;
        let fill = match init {
            Init::Zero => BigUint::zero(),
            Init::One => BigUint::one(),
        };
        v.resize(len, fill);
        Ok(v)
    }

    fn set_zero(&self, buf: &mut Vec<BigUint>, i: usize) {
        buf[i].set_zero();
    }

    fn set_one(&self, buf: &mut Vec<BigUint>, i: usize) {
        buf[i].set_one();
    }

    fn set_value(
        &self,
        buf: &mut Vec<BigUint>,
        i: usize,
        value: &BigUint,
    ) -> Result<(), EngineError> {
        self.check(value, "bigint assign")?;
        buf[i].clone_from(value);
        Ok(())
    }

    fn copy_from(&self, dst: &mut Vec<BigUint>, di: usize, src: &Vec<BigUint>, si: usize) {
        dst[di].clone_from(&src[si]);
    }

    fn copy_within(&self, buf: &mut Vec<BigUint>, di: usize, si: usize) {
        if di != si {
            let v = buf[si].clone();
            buf[di] = v;
        }
    }

    fn accumulate_from(
        &self,
        dst: &mut Vec<BigUint>,
        di: usize,
        src: &Vec<BigUint>,
        si: usize,
    ) -> Result<(), EngineError> {
        self.combine(&mut dst[di], &src[si])
    }

    fn accumulate_within(
        &self,
        buf: &mut Vec<BigUint>,
        di: usize,
        si: usize,
    ) -> Result<(), EngineError> {
        let (d, s) = pair_mut(buf, di, si);
        match s {
            Some(s) => self.combine(d, s),
            None => {
                let s = d.clone();
                self.combine(d, &s)
            }
        }
    }

    fn subtract_from(
        &self,
        dst: &mut Vec<BigUint>,
        di: usize,
        src: &Vec<BigUint>,
        si: usize,
    ) -> Result<(), EngineError> {
        self.difference(&mut dst[di], &src[si])
    }

    fn subtract_within(
        &self,
        buf: &mut Vec<BigUint>,
        di: usize,
        si: usize,
    ) -> Result<(), EngineError> {
        let (d, s) = pair_mut(buf, di, si);
        match s {
            Some(s) => self.difference(d, s),
            None => {
                d.set_zero();
                Ok(())
            }
        }
    }

    fn to_biguint(&self, buf: &Vec<BigUint>, i: usize) -> Result<BigUint, EngineError> {
        Ok(buf[i].clone())
    }
}

/// Mutable `buf[di]` next to shared `buf[si]`; `None` when both name the same element.
fn pair_mut(buf: &mut [BigUint], di: usize, si: usize) -> (&mut BigUint, Option<&BigUint>) {
    if di < si {
        let (lo, hi) = buf.split_at_mut(si);
        (&mut lo[di], Some(&hi[0]))
    } else if di > si {
        let (lo, hi) = buf.split_at_mut(di);
        (&mut hi[0], Some(&lo[si]))
    } else {
        (&mut buf[di], None)
    }
}
