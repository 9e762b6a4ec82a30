//! Structured errors shared by the arithmetic engine, the counting primitives and the indices.

use std::fmt;

use num_bigint::BigUint;

#[derive(Debug)]
/// Structured errors returned by engine routines.
pub enum EngineError {
    /// A value left `[0, bound]`. The magnitude estimate was too small; the whole computation
    /// is void.
    BoundViolation {
        operation: &'static str,
        bound: BigUint,
    },
    /// The input is inconsistent (quota, weights, precoalitions, index name, ...).
    InvalidConfiguration { reason: String },
    /// An explicit representation request cannot be honoured.
    UnsupportedRepresentation {
        requested: &'static str,
        reason: String,
    },
    /// A configured resource limit was exceeded.
    LimitExceeded {
        stage: &'static str,
        metric: &'static str,
        limit: u64,
        observed: u64,
    },
    /// A `try_reserve` allocation failed, or the size is not even representable.
    AllocationFailed {
        stage: &'static str,
        structure: &'static str,
        bytes: Option<u64>,
    },
    /// I/O failure (used when loading run configurations).
    Io {
        stage: &'static str,
        path: String,
        error: String,
    },
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// True for errors that say "too big for this machine" rather than "wrong".
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            EngineError::LimitExceeded { .. } | EngineError::AllocationFailed { .. }
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::BoundViolation { operation, bound } => write!(
                f,
                "bound violation in {operation}: value left [0, {bound}] \
                 (magnitude bound was under-estimated)"
            ),
            EngineError::InvalidConfiguration { reason } => {
                write!(f, "invalid configuration: {reason}")
            }
            EngineError::UnsupportedRepresentation { requested, reason } => {
                write!(f, "unsupported representation '{requested}': {reason}")
            }
            EngineError::LimitExceeded {
                stage,
                metric,
                limit,
                observed,
            } => write!(
                f,
                "limit exceeded at {stage}: {metric} (limit={limit}, observed={observed})"
            ),
            EngineError::AllocationFailed {
                stage,
                structure,
                bytes,
            } => match bytes {
                Some(b) => write!(
                    f,
                    "infeasible at this scale: allocation of {b} bytes failed at {stage} for {structure}"
                ),
                None => write!(
                    f,
                    "infeasible at this scale: size of {structure} at {stage} is not representable"
                ),
            },
            EngineError::Io { stage, path, error } => {
                write!(f, "io error at {stage} for {path}: {error}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
