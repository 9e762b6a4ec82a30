//! Large-number arrays addressed by an integer key range.
//!
//! Counting tables are indexed by coalition weight, and only weights in `[quota, total]`
//! matter. [`OffsetArray`] maps keys `[lo, hi]` onto a zero-based [`NumberArray`] so callers
//! never do the offset arithmetic themselves.

use num_bigint::BigUint;

use crate::error::EngineError;
use crate::bignum::array::{LargeNumber, NumberArray};
use crate::bignum::{Backend, Init};

#[derive(Debug)]
pub struct OffsetArray<'c, B: Backend> {
    lo: u64,
    hi: u64,
    data: NumberArray<'c, B>,
}

impl<'c, B: Backend> OffsetArray<'c, B> {
    /// Acquire storage for keys `lo..=hi`.
    pub fn new(calc: &'c B, lo: u64, hi: u64, init: Init) -> Result<Self, EngineError> {
        if lo > hi {
            return Err(EngineError::invalid(format!(
                "empty key range [{lo}, {hi}]"
            )));
        }
        let len = usize::try_from(hi - lo)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or(EngineError::AllocationFailed {
                stage: "offset_array",
                structure: "offset array",
                bytes: None,
            })?;
        Ok(Self {
            lo,
            hi,
            data: NumberArray::new(calc, len, init)?,
        })
    }

    /// Zero-initialized storage for keys `lo..=hi`.
    #[inline]
    pub fn zeroed(calc: &'c B, lo: u64, hi: u64) -> Result<Self, EngineError> {
        Self::new(calc, lo, hi, Init::Zero)
    }

    #[inline]
    pub fn lo(&self) -> u64 {
        self.lo
    }

    #[inline]
    pub fn hi(&self) -> u64 {
        self.hi
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.lo <= key && key <= self.hi
    }

    #[inline]
    pub fn calculator(&self) -> &'c B {
        self.data.calculator()
    }

    #[inline]
    fn slot(&self, key: u64) -> usize {
        assert!(
            self.contains(key),
            "key {key} outside [{}, {}]",
            self.lo,
            self.hi
        );
        (key - self.lo) as usize
    }

    #[inline]
    fn same_range(&self, other: &Self) {
        assert!(
            self.lo == other.lo && self.hi == other.hi,
            "offset arrays cover different key ranges"
        );
    }

    pub fn set_zero(&mut self, key: u64) {
        let i = self.slot(key);
        self.data.set_zero(i);
    }

    pub fn set_one(&mut self, key: u64) {
        let i = self.slot(key);
        self.data.set_one(i);
    }

    pub fn set_all_zero(&mut self) {
        self.data.set_all_zero();
    }

    pub fn set_value(&mut self, key: u64, value: &BigUint) -> Result<(), EngineError> {
        let i = self.slot(key);
        self.data.set_value(i, value)
    }

    /// `self[dst] = self[dst] ⊕ self[src]`.
    #[inline]
    pub fn accumulate_key(&mut self, dst: u64, src: u64) -> Result<(), EngineError> {
        let (d, s) = (self.slot(dst), self.slot(src));
        self.data.accumulate_within(d, s)
    }

    /// `self[dst] = self[dst] - self[src]`.
    #[inline]
    pub fn subtract_key(&mut self, dst: u64, src: u64) -> Result<(), EngineError> {
        let (d, s) = (self.slot(dst), self.slot(src));
        self.data.subtract_within(d, s)
    }

    /// `self[key] = other[key]`.
    #[inline]
    pub fn copy_key_from(&mut self, key: u64, other: &Self) {
        self.same_range(other);
        let i = self.slot(key);
        self.data.copy_from(i, &other.data, i);
    }

    /// Replicate every key of `other` (same key range).
    pub fn copy_from(&mut self, other: &Self) {
        self.same_range(other);
        self.data.copy_all_from(&other.data);
    }

    /// `out = out ⊕ self[key]`.
    #[inline]
    pub fn accumulate_into(&self, key: u64, out: &mut LargeNumber<'c, B>) -> Result<(), EngineError> {
        let i = self.slot(key);
        out.accumulate_element(&self.data, i)
    }

    pub fn to_biguint(&self, key: u64) -> Result<BigUint, EngineError> {
        let i = self.slot(key);
        self.data.to_biguint(i)
    }

    /// Values for every key, in key order.
    pub fn to_biguints(&self) -> Result<Vec<BigUint>, EngineError> {
        self.data.to_biguints()
    }
}
