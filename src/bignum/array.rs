//! Scoped large-number storage.
//!
//! A [`NumberArray`] owns a backend buffer plus its accounting entry in the calculator's
//! [`AllocTracker`](crate::bignum::resources::AllocTracker); dropping it releases both. A
//! [`LargeNumber`] is a one-element array with value-style helpers.

use num_bigint::BigUint;

use crate::error::EngineError;
use crate::bignum::{Backend, Init};

pub struct NumberArray<'c, B: Backend> {
    calc: &'c B,
    buf: B::Buffer,
    len: usize,
    bytes: u64,
}

impl<'c, B: Backend> NumberArray<'c, B> {
    /// Acquire `len` values, all set to `init`.
    pub fn new(calc: &'c B, len: usize, init: Init) -> Result<Self, EngineError> {
        let bytes = (len as u64)
            .checked_mul(calc.element_size() as u64)
            .ok_or(EngineError::AllocationFailed {
                stage: "number_array",
                structure: "number array",
                bytes: None,
            })?;

        calc.tracker().acquire("number_array", bytes)?;
        let buf = match calc.alloc_buffer(len, init) {
            Ok(b) => b,
            Err(e) => {
                calc.tracker().release(bytes);
                return Err(e);
            }
        };

        Ok(Self {
            calc,
            buf,
            len,
            bytes,
        })
    }

    #[inline]
    pub fn zeroed(calc: &'c B, len: usize) -> Result<Self, EngineError> {
        Self::new(calc, len, Init::Zero)
    }

    #[inline]
    pub fn calculator(&self) -> &'c B {
        self.calc
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes accounted for this array.
    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    #[inline]
    fn same_calculator(&self, other: &Self) {
        assert!(
            std::ptr::eq(self.calc, other.calc),
            "numbers from different calculators cannot be combined"
        );
    }

    #[inline]
    pub fn set_zero(&mut self, i: usize) {
        self.calc.set_zero(&mut self.buf, i);
    }

    #[inline]
    pub fn set_one(&mut self, i: usize) {
        self.calc.set_one(&mut self.buf, i);
    }

    pub fn set_all_zero(&mut self) {
        for i in 0..self.len {
            self.calc.set_zero(&mut self.buf, i);
        }
    }

    #[inline]
    pub fn set_value(&mut self, i: usize, value: &BigUint) -> Result<(), EngineError> {
        self.calc.set_value(&mut self.buf, i, value)
    }

    #[inline]
    pub fn copy_within(&mut self, di: usize, si: usize) {
        self.calc.copy_within(&mut self.buf, di, si);
    }

    #[inline]
    pub fn copy_from(&mut self, di: usize, src: &Self, si: usize) {
        self.same_calculator(src);
        self.calc.copy_from(&mut self.buf, di, &src.buf, si);
    }

    /// Copy every element of `src` (same length) into `self`.
    pub fn copy_all_from(&mut self, src: &Self) {
        assert_eq!(self.len, src.len);
        for i in 0..self.len {
            self.copy_from(i, src, i);
        }
    }

    #[inline]
    pub fn accumulate_within(&mut self, di: usize, si: usize) -> Result<(), EngineError> {
        self.calc.accumulate_within(&mut self.buf, di, si)
    }

    #[inline]
    pub fn accumulate_from(&mut self, di: usize, src: &Self, si: usize) -> Result<(), EngineError> {
        self.same_calculator(src);
        self.calc.accumulate_from(&mut self.buf, di, &src.buf, si)
    }

    #[inline]
    pub fn subtract_within(&mut self, di: usize, si: usize) -> Result<(), EngineError> {
        self.calc.subtract_within(&mut self.buf, di, si)
    }

    #[inline]
    pub fn subtract_from(&mut self, di: usize, src: &Self, si: usize) -> Result<(), EngineError> {
        self.same_calculator(src);
        self.calc.subtract_from(&mut self.buf, di, &src.buf, si)
    }

    #[inline]
    pub fn to_biguint(&self, i: usize) -> Result<BigUint, EngineError> {
        self.calc.to_biguint(&self.buf, i)
    }

    pub fn to_biguints(&self) -> Result<Vec<BigUint>, EngineError> {
        (0..self.len).map(|i| self.to_biguint(i)).collect()
    }
}

impl<B: Backend> Drop for NumberArray<'_, B> {
    fn drop(&mut self) {
        self.calc.tracker().release(self.bytes);
    }
}

impl<B: Backend> std::fmt::Debug for NumberArray<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberArray")
            .field("backend", &self.calc.kind())
            .field("len", &self.len)
            .field("bytes", &self.bytes)
            .finish()
    }
}

/// One exact value owned by a calculator.
#[derive(Debug)]
pub struct LargeNumber<'c, B: Backend> {
    inner: NumberArray<'c, B>,
}

impl<'c, B: Backend> LargeNumber<'c, B> {
    /// Acquire a value initialized to zero.
    pub fn zero(calc: &'c B) -> Result<Self, EngineError> {
        Ok(Self {
            inner: NumberArray::new(calc, 1, Init::Zero)?,
        })
    }

    /// Acquire a value initialized to one (the multiplicative identity).
    pub fn one(calc: &'c B) -> Result<Self, EngineError> {
        Ok(Self {
            inner: NumberArray::new(calc, 1, Init::One)?,
        })
    }

    pub fn from_biguint(calc: &'c B, value: &BigUint) -> Result<Self, EngineError> {
        let mut n = Self::zero(calc)?;
        n.assign_value(value)?;
        Ok(n)
    }

    #[inline]
    pub fn assign_zero(&mut self) {
        self.inner.set_zero(0);
    }

    #[inline]
    pub fn assign_one(&mut self) {
        self.inner.set_one(0);
    }

    #[inline]
    pub fn assign_value(&mut self, value: &BigUint) -> Result<(), EngineError> {
        self.inner.set_value(0, value)
    }

    #[inline]
    pub fn assign(&mut self, other: &Self) {
        self.inner.copy_from(0, &other.inner, 0);
    }

    /// `self = self ⊕ other`.
    #[inline]
    pub fn accumulate(&mut self, other: &Self) -> Result<(), EngineError> {
        self.inner.accumulate_from(0, &other.inner, 0)
    }

    /// `self = self ⊕ array[i]`.
    #[inline]
    pub fn accumulate_element(&mut self, array: &NumberArray<'c, B>, i: usize) -> Result<(), EngineError> {
        self.inner.accumulate_from(0, array, i)
    }

    #[inline]
    pub fn subtract(&mut self, other: &Self) -> Result<(), EngineError> {
        self.inner.subtract_from(0, &other.inner, 0)
    }

    #[inline]
    pub fn to_biguint(&self) -> Result<BigUint, EngineError> {
        self.inner.to_biguint(0)
    }
}
