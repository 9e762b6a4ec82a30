//! Exact large-number arithmetic with automatic backend selection.
//!
//! Three interchangeable backends implement one contract, [`Backend`]:
//!
//! - [`native`]: one `u64` per value, checked arithmetic,
//! - [`bigint`]: one [`BigUint`] per value,
//! - [`crt`]: one residue per selected prime, reconstructed with the Chinese Remainder Theorem.
//!
//! The closed [`Calculator`] variant wraps them; [`new_calculator`] is the only place that
//! decides which one a computation gets. Call sites allocate through the scoped handles in
//! [`array`] and [`offset`] and never see a backend-specific representation.

pub mod array;
pub mod bigint;
pub mod crt;
pub mod native;
pub mod offset;
pub mod primes;
pub mod resources;

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::bignum::bigint::BigIntCalculator;
use crate::bignum::crt::CrtCalculator;
use crate::bignum::native::NativeCalculator;
use crate::bignum::primes::{select_crt_primes, select_primes, NATIVE_PRIME};
use crate::bignum::resources::{AllocTracker, ResourceLimits};

pub use array::{LargeNumber, NumberArray};
pub use offset::OffsetArray;

/// Above this many primes the automatic choice prefers one arbitrary-precision integer.
pub const MAX_CRT_PRIMES: usize = 4;

/// Widest bound [`bound_of_width`] builds.
pub const MAX_BOUND_BITS: u32 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The dominant operation a computation performs on large numbers.
pub enum Operation {
    Addition,
    Multiplication,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Addition => "addition",
            Operation::Multiplication => "multiplication",
        }
    }
}

impl FromStr for Operation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "addition" | "add" => Ok(Operation::Addition),
            "multiplication" | "mul" => Ok(Operation::Multiplication),
            other => Err(EngineError::invalid(format!("unknown operation '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Requested backend preference.
pub enum IntRepresentation {
    #[default]
    Auto,
    BigInt,
    Primes,
    Native,
}

impl IntRepresentation {
    pub fn as_str(self) -> &'static str {
        match self {
            IntRepresentation::Auto => "auto",
            IntRepresentation::BigInt => "bigint",
            IntRepresentation::Primes => "primes",
            IntRepresentation::Native => "native",
        }
    }
}

impl FromStr for IntRepresentation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" | "default" => Ok(IntRepresentation::Auto),
            "bigint" | "gmp" => Ok(IntRepresentation::BigInt),
            "primes" | "crt" => Ok(IntRepresentation::Primes),
            "native" => Ok(IntRepresentation::Native),
            other => Err(EngineError::UnsupportedRepresentation {
                requested: "unknown",
                reason: format!("'{other}' is not one of auto, bigint, primes, native"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Native,
    BigInt,
    Crt,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Native => "native",
            BackendKind::BigInt => "bigint",
            BackendKind::Crt => "crt",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Initial value of freshly acquired storage.
pub enum Init {
    Zero,
    One,
}

/// The calculator contract shared by all backends.
///
/// Values live in backend-owned buffers addressed by element index. Every operation that can
/// move a value outside `[0, bound]` returns [`EngineError::BoundViolation`] instead of
/// wrapping; the CRT backend can only observe this when residues are recombined.
///
/// Application code uses [`NumberArray`], [`LargeNumber`] and [`OffsetArray`] rather than
/// calling these methods directly.
pub trait Backend {
    type Buffer;

    fn kind(&self) -> BackendKind;
    fn operation(&self) -> Operation;
    fn bound(&self) -> &BigUint;
    /// Bytes per stored value.
    fn element_size(&self) -> usize;
    fn tracker(&self) -> &AllocTracker;

    fn alloc_buffer(&self, len: usize, init: Init) -> Result<Self::Buffer, EngineError>;

    fn set_zero(&self, buf: &mut Self::Buffer, i: usize);
    fn set_one(&self, buf: &mut Self::Buffer, i: usize);
    fn set_value(&self, buf: &mut Self::Buffer, i: usize, value: &BigUint)
        -> Result<(), EngineError>;

    fn copy_from(&self, dst: &mut Self::Buffer, di: usize, src: &Self::Buffer, si: usize);
    fn copy_within(&self, buf: &mut Self::Buffer, di: usize, si: usize);

    /// `dst[di] = dst[di] ⊕ src[si]` with the calculator's operation.
    fn accumulate_from(
        &self,
        dst: &mut Self::Buffer,
        di: usize,
        src: &Self::Buffer,
        si: usize,
    ) -> Result<(), EngineError>;
    /// `buf[di] = buf[di] ⊕ buf[si]`.
    fn accumulate_within(&self, buf: &mut Self::Buffer, di: usize, si: usize)
        -> Result<(), EngineError>;

    /// `dst[di] = dst[di] - src[si]`.
    fn subtract_from(
        &self,
        dst: &mut Self::Buffer,
        di: usize,
        src: &Self::Buffer,
        si: usize,
    ) -> Result<(), EngineError>;
    fn subtract_within(&self, buf: &mut Self::Buffer, di: usize, si: usize)
        -> Result<(), EngineError>;

    fn to_biguint(&self, buf: &Self::Buffer, i: usize) -> Result<BigUint, EngineError>;
}

#[derive(Debug)]
/// A calculator selected by [`new_calculator`].
pub enum Calculator {
    Native(NativeCalculator),
    BigInt(BigIntCalculator),
    Crt(CrtCalculator),
}

#[derive(Debug)]
/// Storage of a [`Calculator`]; the variant always matches the calculator that allocated it.
pub enum NumberBuffer {
    Native(Vec<u64>),
    BigInt(Vec<BigUint>),
    Residues(Vec<u64>),
}

macro_rules! with_buffer {
    ($calc:expr, $buf:expr, |$c:ident, $b:ident| $body:expr) => {
        match ($calc, $buf) {
            (Calculator::Native($c), NumberBuffer::Native($b)) => $body,
            (Calculator::BigInt($c), NumberBuffer::BigInt($b)) => $body,
            (Calculator::Crt($c), NumberBuffer::Residues($b)) => $body,
            _ => unreachable!("number buffer does not belong to this calculator"),
        }
    };
}

macro_rules! with_buffers {
    ($calc:expr, $dst:expr, $src:expr, |$c:ident, $d:ident, $s:ident| $body:expr) => {
        match ($calc, $dst, $src) {
            (Calculator::Native($c), NumberBuffer::Native($d), NumberBuffer::Native($s)) => $body,
            (Calculator::BigInt($c), NumberBuffer::BigInt($d), NumberBuffer::BigInt($s)) => $body,
            (Calculator::Crt($c), NumberBuffer::Residues($d), NumberBuffer::Residues($s)) => {
                $body
            }
            _ => unreachable!("number buffer does not belong to this calculator"),
        }
    };
}

impl Calculator {
    /// Replace the resource budget (builder style).
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        match &mut self {
            Calculator::Native(c) => c.tracker_mut().set_limits(limits),
            Calculator::BigInt(c) => c.tracker_mut().set_limits(limits),
            Calculator::Crt(c) => c.tracker_mut().set_limits(limits),
        }
        self
    }

    /// Moduli in use: the native prime, the CRT primes, or none for arbitrary precision.
    pub fn primes(&self) -> &[u64] {
        match self {
            Calculator::Native(_) => &[NATIVE_PRIME],
            Calculator::BigInt(_) => &[],
            Calculator::Crt(c) => c.primes(),
        }
    }
}

impl Backend for Calculator {
    type Buffer = NumberBuffer;

    fn kind(&self) -> BackendKind {
        match self {
            Calculator::Native(c) => c.kind(),
            Calculator::BigInt(c) => c.kind(),
            Calculator::Crt(c) => c.kind(),
        }
    }

    fn operation(&self) -> Operation {
        match self {
            Calculator::Native(c) => c.operation(),
            Calculator::BigInt(c) => c.operation(),
            Calculator::Crt(c) => c.operation(),
        }
    }

    fn bound(&self) -> &BigUint {
        match self {
            Calculator::Native(c) => c.bound(),
            Calculator::BigInt(c) => c.bound(),
            Calculator::Crt(c) => c.bound(),
        }
    }

    fn element_size(&self) -> usize {
        match self {
            Calculator::Native(c) => c.element_size(),
            Calculator::BigInt(c) => c.element_size(),
            Calculator::Crt(c) => c.element_size(),
        }
    }

    fn tracker(&self) -> &AllocTracker {
        match self {
            Calculator::Native(c) => c.tracker(),
            Calculator::BigInt(c) => c.tracker(),
            Calculator::Crt(c) => c.tracker(),
        }
    }

    fn alloc_buffer(&self, len: usize, init: Init) -> Result<NumberBuffer, EngineError> {
        Ok(match self {
            Calculator::Native(c) => NumberBuffer::Native(c.alloc_buffer(len, init)?),
            Calculator::BigInt(c) => NumberBuffer::BigInt(c.alloc_buffer(len, init)?),
            Calculator::Crt(c) => NumberBuffer::Residues(c.alloc_buffer(len, init)?),
        })
    }

    fn set_zero(&self, buf: &mut NumberBuffer, i: usize) {
        with_buffer!(self, buf, |c, b| c.set_zero(b, i))
    }

    fn set_one(&self, buf: &mut NumberBuffer, i: usize) {
        with_buffer!(self, buf, |c, b| c.set_one(b, i))
    }

    fn set_value(
        &self,
        buf: &mut NumberBuffer,
        i: usize,
        value: &BigUint,
    ) -> Result<(), EngineError> {
        with_buffer!(self, buf, |c, b| c.set_value(b, i, value))
    }

    fn copy_from(&self, dst: &mut NumberBuffer, di: usize, src: &NumberBuffer, si: usize) {
        with_buffers!(self, dst, src, |c, d, s| c.copy_from(d, di, s, si))
    }

    fn copy_within(&self, buf: &mut NumberBuffer, di: usize, si: usize) {
        with_buffer!(self, buf, |c, b| c.copy_within(b, di, si))
    }

    fn accumulate_from(
        &self,
        dst: &mut NumberBuffer,
        di: usize,
        src: &NumberBuffer,
        si: usize,
    ) -> Result<(), EngineError> {
        with_buffers!(self, dst, src, |c, d, s| c.accumulate_from(d, di, s, si))
    }

    fn accumulate_within(
        &self,
        buf: &mut NumberBuffer,
        di: usize,
        si: usize,
    ) -> Result<(), EngineError> {
        with_buffer!(self, buf, |c, b| c.accumulate_within(b, di, si))
    }

    fn subtract_from(
        &self,
        dst: &mut NumberBuffer,
        di: usize,
        src: &NumberBuffer,
        si: usize,
    ) -> Result<(), EngineError> {
        with_buffers!(self, dst, src, |c, d, s| c.subtract_from(d, di, s, si))
    }

    fn subtract_within(
        &self,
        buf: &mut NumberBuffer,
        di: usize,
        si: usize,
    ) -> Result<(), EngineError> {
        with_buffer!(self, buf, |c, b| c.subtract_within(b, di, si))
    }

    fn to_biguint(&self, buf: &NumberBuffer, i: usize) -> Result<BigUint, EngineError> {
        with_buffer!(self, buf, |c, b| c.to_biguint(b, i))
    }
}

/// Build the calculator for one computation with default resource limits.
pub fn new_calculator(
    bound: &BigUint,
    op: Operation,
    representation: IntRepresentation,
) -> Result<Calculator, EngineError> {
    new_calculator_with_limits(bound, op, representation, ResourceLimits::default())
}

/// `2^bits - 1`, the largest value of the given width, for `1 <= bits <= MAX_BOUND_BITS`.
pub fn bound_of_width(bits: u32) -> Result<BigUint, EngineError> {
    if bits == 0 || bits > MAX_BOUND_BITS {
        return Err(EngineError::invalid(format!(
            "bound width must be between 1 and {MAX_BOUND_BITS} bits, got {bits}"
        )));
    }
    Ok((BigUint::one() << bits) - 1u32)
}

/// Select a backend from the magnitude bound, the dominant operation and the preference.
///
/// With [`IntRepresentation::Auto`]: a bound that fits one machine word gets the native
/// backend, 2..=[`MAX_CRT_PRIMES`] primes get the CRT backend, anything larger gets
/// arbitrary precision. Explicit preferences always override the automatic choice.
pub fn new_calculator_with_limits(
    bound: &BigUint,
    op: Operation,
    representation: IntRepresentation,
    limits: ResourceLimits,
) -> Result<Calculator, EngineError> {
    if bound.bits() == 0 {
        return Err(EngineError::invalid("magnitude bound must be at least 1"));
    }
    let tracker = AllocTracker::new(limits);

    let calc = match representation {
        IntRepresentation::Auto => {
            let info = select_primes(bound, op);
            if info.is_native() {
                Calculator::Native(NativeCalculator::new(bound, op, tracker)?)
            } else if info.amount() > MAX_CRT_PRIMES {
                Calculator::BigInt(BigIntCalculator::new(bound, op, tracker))
            } else {
                Calculator::Crt(CrtCalculator::new(info.primes(), bound, op, tracker)?)
            }
        }
        IntRepresentation::BigInt => Calculator::BigInt(BigIntCalculator::new(bound, op, tracker)),
        IntRepresentation::Primes => {
            let info = select_crt_primes(bound, op);
            Calculator::Crt(CrtCalculator::new(info.primes(), bound, op, tracker)?)
        }
        IntRepresentation::Native => {
            if *bound >= BigUint::from(NATIVE_PRIME) {
                return Err(EngineError::UnsupportedRepresentation {
                    requested: representation.as_str(),
                    reason: format!(
                        "bound needs {} bits, more than one machine word holds",
                        bound.bits()
                    ),
                });
            }
            Calculator::Native(NativeCalculator::new(bound, op, tracker)?)
        }
    };

    tracing::debug!(
        backend = %calc.kind(),
        operation = op.as_str(),
        requested = representation.as_str(),
        bound_bits = bound.bits(),
        primes = calc.primes().len(),
        element_size = calc.element_size(),
        "selected large-number backend"
    );

    Ok(calc)
}
