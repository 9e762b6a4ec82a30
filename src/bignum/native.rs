//! Native word backend: one `u64` per value.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::EngineError;
use crate::bignum::resources::AllocTracker;
use crate::bignum::{Backend, BackendKind, Init, Operation};

#[derive(Debug)]
pub struct NativeCalculator {
    op: Operation,
    limit: u64,
    bound: BigUint,
    tracker: AllocTracker,
}

impl NativeCalculator {
    pub fn new(bound: &BigUint, op: Operation, tracker: AllocTracker) -> Result<Self, EngineError> {
        let limit = bound
            .to_u64()
            .ok_or_else(|| EngineError::UnsupportedRepresentation {
                requested: "native",
                reason: format!("bound of {} bits does not fit one machine word", bound.bits()),
            })?;
        Ok(Self {
            op,
            limit,
            bound: bound.clone(),
            tracker,
        })
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut AllocTracker {
        &mut self.tracker
    }

    #[inline]
    fn violation(&self, operation: &'static str) -> EngineError {
        EngineError::BoundViolation {
            operation,
            bound: self.bound.clone(),
        }
    }

    #[inline]
    fn combine(&self, a: u64, b: u64) -> Result<u64, EngineError> {
        let (r, name) = match self.op {
            Operation::Addition => (a.checked_add(b), "native add"),
            Operation::Multiplication => (a.checked_mul(b), "native multiply"),
        };
        match r {
            Some(v) if v <= self.limit => Ok(v),
            _ => Err(self.violation(name)),
        }
    }

    #[inline]
    fn difference(&self, a: u64, b: u64) -> Result<u64, EngineError> {
        a.checked_sub(b)
            .ok_or_else(|| self.violation("native subtract"))
    }
}

impl Backend for NativeCalculator {
    type Buffer = Vec<u64>;

    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn operation(&self) -> Operation {
        self.op
    }

    fn bound(&self) -> &BigUint {
        &self.bound
    }

    fn element_size(&self) -> usize {
        std::mem::size_of::<u64>()
    }

    fn tracker(&self) -> &AllocTracker {
        &self.tracker
    }

    fn alloc_buffer(&self, len: usize, init: Init) -> Result<Vec<u64>, EngineError> {
        let mut v = Vec::new();
        self.tracker
            .try_reserve_vec("native_alloc", "number buffer", &mut v, len)?;
        let fill = match init {
            Init::Zero => 0,
            Init::One => 1,
        };
        v.resize(len, fill);
        Ok(v)
    }

    #[inline]
    fn set_zero(&self, buf: &mut Vec<u64>, i: usize) {
        buf[i] = 0;
    }

    #[inline]
    fn set_one(&self, buf: &mut Vec<u64>, i: usize) {
        buf[i] = 1;
    }

    fn set_value(&self, buf: &mut Vec<u64>, i: usize, value: &BigUint) -> Result<(), EngineError> {
        match value.to_u64() {
            Some(v) if v <= self.limit => {
                buf[i] = v;
                Ok(())
            }
            _ => Err(self.violation("native assign")),
        }
    }

    #[inline]
    fn copy_from(&self, dst: &mut Vec<u64>, di: usize, src: &Vec<u64>, si: usize) {
        dst[di] = src[si];
    }

    #[inline]
    fn copy_within(&self, buf: &mut Vec<u64>, di: usize, si: usize) {
        buf[di] = buf[si];
    }

    #[inline]
    fn accumulate_from(
        &self,
        dst: &mut Vec<u64>,
        di: usize,
        src: &Vec<u64>,
        si: usize,
    ) -> Result<(), EngineError> {
        dst[di] = self.combine(dst[di], src[si])?;
        Ok(())
    }

    #[inline]
    fn accumulate_within(&self, buf: &mut Vec<u64>, di: usize, si: usize) -> Result<(), EngineError> {
        buf[di] = self.combine(buf[di], buf[si])?;
        Ok(())
    }

    #[inline]
    fn subtract_from(
        &self,
        dst: &mut Vec<u64>,
        di: usize,
        src: &Vec<u64>,
        si: usize,
    ) -> Result<(), EngineError> {
        dst[di] = self.difference(dst[di], src[si])?;
        Ok(())
    }

    #[inline]
    fn subtract_within(&self, buf: &mut Vec<u64>, di: usize, si: usize) -> Result<(), EngineError> {
        buf[di] = self.difference(buf[di], buf[si])?;
        Ok(())
    }

    #[inline]
    fn to_biguint(&self, buf: &Vec<u64>, i: usize) -> Result<BigUint, EngineError> {
        Ok(BigUint::from(buf[i]))
    }
}
