//! JSON run configurations.
//!
//! ```json
//! {
//!   "index": "BZ",
//!   "weights": [4, 3, 2],
//!   "quota": 5,
//!   "precoalitions": [[0], [1, 2]],
//!   "representation": "auto",
//!   "weighted_majority": false,
//!   "float_weights": false,
//!   "filter_null_players": false,
//!   "verbose": false,
//!   "limits": { "max_memory_bytes": 1073741824 }
//! }
//! ```
//!
//! Everything but `index`, `weights` and `quota` is optional. Weights and quota must be
//! non-negative integers unless `float_weights` is set; decimal values are then scaled by the
//! smallest power of ten that makes all of them integral.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::EngineError;
use crate::game::Game;
use crate::index::{ComputeOptions, IndexKind};
use crate::bignum::resources::ResourceLimits;
use crate::bignum::IntRepresentation;

fn default_max_memory_bytes() -> u64 {
    ResourceLimits::default().max_memory_bytes
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct LimitsSpec {
    #[serde(default = "default_max_memory_bytes")]
    pub max_memory_bytes: u64,
}

impl Default for LimitsSpec {
    fn default() -> Self {
        Self {
            max_memory_bytes: default_max_memory_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunSpec {
    pub index: String,
    pub weights: Vec<Number>,
    pub quota: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precoalitions: Option<Vec<Vec<usize>>>,
    #[serde(default)]
    pub representation: IntRepresentation,
    /// Use `quota + 1` as the effective quota.
    #[serde(default)]
    pub weighted_majority: bool,
    /// Accept decimal weights and quota.
    #[serde(default)]
    pub float_weights: bool,
    /// Leave null players out of the reported values.
    #[serde(default)]
    pub filter_null_players: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub limits: LimitsSpec,
}

/// Weights and quota as exact integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerWeights {
    pub weights: Vec<u64>,
    pub quota: u64,
    /// Power of ten the inputs were multiplied by (1 for integer input).
    pub multiplier: u64,
}

/// `value = digits / 10^places`, with no trailing zero in `digits` when `places > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Decimal {
    digits: u128,
    places: u32,
}

impl Decimal {
    fn parse(n: &Number, what: &str) -> Result<Self, EngineError> {
        if let Some(v) = n.as_u64() {
            return Ok(Self {
                digits: v.into(),
                places: 0,
            });
        }
        let bad = || EngineError::invalid(format!("{what} {n} is not a non-negative number"));
        let text = n.to_string();
        if text.starts_with('-') {
            return Err(bad());
        }

        let (mantissa, exponent) = match text.split_once(|c: char| c == 'e' || c == 'E') {
            Some((m, e)) => (m, e.parse::<i64>().map_err(|_| bad())?),
            None => (text.as_str(), 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let frac_part = frac_part.trim_end_matches('0');

        let mut digits = 0u128;
        for c in int_part.chars().chain(frac_part.chars()) {
            let d = c.to_digit(10).ok_or_else(bad)?;
            digits = digits
                .checked_mul(10)
                .and_then(|v| v.checked_add(d.into()))
                .ok_or_else(|| too_wide(what, n))?;
        }

        let mut places = frac_part.len() as i64 - exponent;
        while places < 0 {
            digits = digits.checked_mul(10).ok_or_else(|| too_wide(what, n))?;
            places += 1;
        }
        while places > 0 && digits % 10 == 0 {
            digits /= 10;
            places -= 1;
        }
        let places = u32::try_from(places).map_err(|_| too_wide(what, n))?;
        Ok(Self { digits, places })
    }

    /// `digits · 10^(scale - places)`, which must fit a `u64`.
    fn scaled(self, scale: u32) -> Option<u64> {
        10u128
            .checked_pow(scale - self.places)
            .and_then(|f| self.digits.checked_mul(f))
            .and_then(|v| u64::try_from(v).ok())
    }
}

fn too_wide(what: &str, n: &Number) -> EngineError {
    EngineError::invalid(format!("{what} {n} does not fit 64 bits as an integer"))
}

impl RunSpec {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let bytes = std::fs::read(path).map_err(|e| EngineError::Io {
            stage: "load_run_spec",
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let spec: Self = serde_json::from_slice(&bytes).map_err(|e| {
            EngineError::invalid(format!("invalid JSON in {}: {e}", path.display()))
        })?;
        spec.integer_weights()?;
        Ok(spec)
    }

    pub fn from_json(s: &str) -> Result<Self, EngineError> {
        let spec: Self =
            serde_json::from_str(s).map_err(|e| EngineError::invalid(format!("invalid JSON: {e}")))?;
        spec.integer_weights()?;
        Ok(spec)
    }

    pub fn index_kind(&self) -> Result<IndexKind, EngineError> {
        self.index.parse()
    }

    /// Weights and quota as integers, scaled by a common power of ten under `float_weights`.
    pub fn integer_weights(&self) -> Result<IntegerWeights, EngineError> {
        let mut values = self
            .weights
            .iter()
            .map(|w| Decimal::parse(w, "weight"))
            .collect::<Result<Vec<_>, _>>()?;
        values.push(Decimal::parse(&self.quota, "quota")?);

        let scale = values.iter().map(|d| d.places).max().unwrap_or(0);
        if scale > 0 && !self.float_weights {
            return Err(EngineError::invalid(
                "non-integer weight or quota; set float_weights to scale decimals",
            ));
        }
        let multiplier = 10u64
            .checked_pow(scale)
            .ok_or_else(|| EngineError::invalid(format!("scaling by 10^{scale} overflows 64 bits")))?;

        let mut scaled = values
            .into_iter()
            .map(|d| {
                d.scaled(scale).ok_or_else(|| {
                    EngineError::invalid(format!("weights scaled by {multiplier} overflow 64 bits"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let quota = scaled.pop().unwrap_or_default();
        if scale > 0 {
            tracing::debug!(multiplier, "scaled decimal weights to integers");
        }
        Ok(IntegerWeights {
            weights: scaled,
            quota,
            multiplier,
        })
    }

    pub fn effective_quota(&self) -> Result<u64, EngineError> {
        let quota = self.integer_weights()?.quota;
        if self.weighted_majority {
            quota
                .checked_add(1)
                .ok_or_else(|| EngineError::invalid("quota + 1 overflows"))
        } else {
            Ok(quota)
        }
    }

    pub fn build_game(&self) -> Result<Game, EngineError> {
        let weights = self.integer_weights()?.weights;
        let game = Game::new(&weights, self.effective_quota()?)?;
        match &self.precoalitions {
            Some(blocks) => game.with_precoalitions(blocks),
            None => Ok(game),
        }
    }

    /// Caller numbers of the players whose values are reported, ascending.
    pub fn reported_players(&self, game: &Game) -> Vec<usize> {
        let all = 0..game.player_count();
        if !self.filter_null_players {
            return all.collect();
        }
        let null = game.null_players();
        all.filter(|p| null.binary_search(p).is_err()).collect()
    }

    /// `values` (in caller order) restricted to [`RunSpec::reported_players`].
    pub fn reported_values<T: Clone>(&self, game: &Game, values: &[T]) -> Vec<T> {
        self.reported_players(game)
            .into_iter()
            .map(|p| values[p].clone())
            .collect()
    }

    pub fn options(&self) -> ComputeOptions {
        ComputeOptions {
            representation: self.representation,
            limits: ResourceLimits {
                max_memory_bytes: self.limits.max_memory_bytes,
            },
            verbose: self.verbose,
        }
    }
}
