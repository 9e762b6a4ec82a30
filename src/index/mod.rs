//! Power indices built on the counting primitives.
//!
//! Each index declares the operation it needs, the magnitude bound it will reach and the
//! memory it will hold; [`compute`] checks all three before any counting array exists, runs
//! the index on a fresh calculator and maps the result back to the caller's player numbers.

mod banzhaf_owen;
mod swing;

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::bound::{FastUpperBound, MagnitudeEstimator};
use crate::error::EngineError;
use crate::game::Game;
use crate::bignum::resources::ResourceLimits;
use crate::bignum::{new_calculator_with_limits, Backend, BackendKind, Calculator, IntRepresentation, Operation};

pub use banzhaf_owen::BanzhafOwen;
pub use swing::SwingIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    RawBanzhaf,
    Banzhaf,
    AbsoluteBanzhaf,
    Nevison,
    ColemanCollective,
    ColemanInitiative,
    ColemanPreventive,
    BanzhafOwen,
}

impl IndexKind {
    pub const ALL: [IndexKind; 8] = [
        IndexKind::RawBanzhaf,
        IndexKind::Banzhaf,
        IndexKind::AbsoluteBanzhaf,
        IndexKind::Nevison,
        IndexKind::ColemanCollective,
        IndexKind::ColemanInitiative,
        IndexKind::ColemanPreventive,
        IndexKind::BanzhafOwen,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            IndexKind::RawBanzhaf => "RBZ",
            IndexKind::Banzhaf => "BZ",
            IndexKind::AbsoluteBanzhaf => "ABZ",
            IndexKind::Nevison => "N",
            IndexKind::ColemanCollective => "CC",
            IndexKind::ColemanInitiative => "CI",
            IndexKind::ColemanPreventive => "CP",
            IndexKind::BanzhafOwen => "BO",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            IndexKind::RawBanzhaf => "RawBanzhaf",
            IndexKind::Banzhaf => "Banzhaf",
            IndexKind::AbsoluteBanzhaf => "AbsoluteBanzhaf",
            IndexKind::Nevison => "Nevison",
            IndexKind::ColemanCollective => "ColemanCollective",
            IndexKind::ColemanInitiative => "ColemanInitiative",
            IndexKind::ColemanPreventive => "ColemanPreventive",
            IndexKind::BanzhafOwen => "BanzhafOwen",
        }
    }

    /// The implementation behind this kind.
    pub fn index(self) -> Box<dyn PowerIndex> {
        match self {
            IndexKind::BanzhafOwen => Box::new(BanzhafOwen),
            kind => Box::new(SwingIndex { kind }),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for IndexKind {
    type Err = EngineError;

    /// Accepts the abbreviation (any case) or the full name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndexKind::ALL
            .into_iter()
            .find(|k| k.abbreviation().eq_ignore_ascii_case(s) || k.full_name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = IndexKind::ALL.iter().map(|k| k.abbreviation()).collect();
                EngineError::invalid(format!(
                    "unknown index '{s}' (known: {})",
                    known.join(", ")
                ))
            })
    }
}

/// Per-player values of one index, in the game's internal player order.
#[derive(Debug, Clone)]
pub struct IndexValues {
    pub values: Vec<BigRational>,
    /// Integer count behind each value, scaled to the full game (null players included).
    pub raw: Vec<BigUint>,
    pub total_winning: Option<BigUint>,
}

pub trait PowerIndex {
    fn kind(&self) -> IndexKind;

    fn full_name(&self) -> &'static str {
        self.kind().full_name()
    }

    fn operation_requirement(&self) -> Operation {
        Operation::Addition
    }

    /// Largest value the computation will hold.
    fn max_value_requirement(&self, game: &Game, estimator: &dyn MagnitudeEstimator) -> BigUint {
        estimator.estimate(game, self.operation_requirement())
    }

    /// Bytes of large-number storage the computation will hold at its peak with `calc`;
    /// `None` when that number does not even fit a `u64`.
    fn memory_requirement(&self, game: &Game, calc: &Calculator) -> Option<u64>;

    fn calculate(&self, game: &Game, calc: &Calculator) -> Result<IndexValues, EngineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeOptions {
    pub representation: IntRepresentation,
    pub limits: ResourceLimits,
    /// Keep the raw per-player counts in the diagnostics.
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub backend: BackendKind,
    pub primes: usize,
    pub element_size: usize,
    pub bound_bits: u64,
    pub memory_requirement: u64,
    pub peak_bytes: u64,
    pub total_winning: Option<BigUint>,
    /// Per-player counts in the caller's numbering; only filled when verbose.
    pub raw_counts: Option<Vec<BigUint>>,
}

#[derive(Debug, Clone)]
pub struct PowerIndexResult {
    pub kind: IndexKind,
    /// One exact value per player, in the caller's numbering.
    pub values: Vec<BigRational>,
    pub diagnostics: Diagnostics,
}

/// Compute `kind` for `game`.
pub fn compute(
    game: &Game,
    kind: IndexKind,
    options: &ComputeOptions,
) -> Result<PowerIndexResult, EngineError> {
    let span = tracing::info_span!(
        "power_index",
        index = kind.abbreviation(),
        players = game.player_count(),
        quota = game.quota(),
    );
    let _guard = span.enter();

    if kind == IndexKind::BanzhafOwen {
        tracing::debug!(blocks = game.precoalitions().len(), "precoalition structure");
    } else if game.has_nontrivial_precoalitions() {
        tracing::warn!("precoalitions are ignored by {}", kind.full_name());
    }

    let index = kind.index();
    let op = index.operation_requirement();
    let bound = index.max_value_requirement(game, &FastUpperBound);
    let calc = new_calculator_with_limits(&bound, op, options.representation, options.limits)?;

    let memory = index
        .memory_requirement(game, &calc)
        .ok_or(EngineError::AllocationFailed {
            stage: "memory_requirement",
            structure: "counting arrays",
            bytes: None,
        })?;
    if memory > options.limits.max_memory_bytes {
        return Err(EngineError::LimitExceeded {
            stage: "memory_requirement",
            metric: "memory_bytes",
            limit: options.limits.max_memory_bytes,
            observed: memory,
        });
    }

    let computed = index.calculate(game, &calc)?;
    let counts = calc.tracker().counts();
    debug_assert_eq!(counts.live_bytes, 0, "counting storage outlived the computation");

    tracing::info!(
        backend = %calc.kind(),
        memory,
        peak_bytes = counts.peak_bytes,
        arrays = counts.total_arrays,
        "computed {}",
        index.full_name()
    );

    Ok(PowerIndexResult {
        kind,
        values: game.to_original_order(&computed.values),
        diagnostics: Diagnostics {
            backend: calc.kind(),
            primes: calc.primes().len(),
            element_size: calc.element_size(),
            bound_bits: bound.bits(),
            memory_requirement: memory,
            peak_bytes: counts.peak_bytes,
            total_winning: computed.total_winning,
            raw_counts: options
                .verbose
                .then(|| game.to_original_order(&computed.raw)),
        },
    })
}

/// `num / den` as an exact rational.
pub(crate) fn ratio(num: &BigUint, den: &BigUint) -> Result<BigRational, EngineError> {
    if den.is_zero() {
        return Err(EngineError::invalid("degenerate game: index denominator is zero"));
    }
    Ok(BigRational::new(
        BigInt::from(num.clone()),
        BigInt::from(den.clone()),
    ))
}

#[inline]
pub(crate) fn pow2(k: usize) -> BigUint {
    BigUint::one() << k
}

/// `(arrays * (total - quota + 1) + singles) * element_size`, or `None` on overflow.
pub(crate) fn table_bytes(game: &Game, calc: &Calculator, arrays: u64, singles: u64) -> Option<u64> {
    let span = (game.total_weight() - game.quota()).checked_add(1)?;
    span.checked_mul(arrays)?
        .checked_add(singles)?
        .checked_mul(calc.element_size() as u64)
}
