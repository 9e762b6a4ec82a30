//! Indices derived from one counting pass over all non-null players.
//!
//! With `n` non-null players, `z` null players, `W` winning coalitions and `s_i` swings of
//! player `i`, all counted over the non-null players only:
//!
//! ```text
//! RBZ  s_i * 2^z            BZ  s_i / Σ s_j          ABZ  s_i / 2^(n-1)
//! N    W_i / 2^n            CC  W / 2^n              CI   s_i / (2^n - W)
//! CP   s_i / W
//! ```
//!
//! Every null player doubles both numerator and denominator, so these match the full-game
//! definitions. Null players get 0, except under N (`W / 2^(n+1)`) and CC (same for everyone).

use num_bigint::BigUint;
use num_rational::BigRational;
use num_traits::Zero;

use crate::counting::{self, swing_counts_per_player, winning_coalitions_per_weight, winning_containing_per_player};
use crate::error::EngineError;
use crate::game::Game;
use crate::index::{pow2, ratio, table_bytes, IndexKind, IndexValues, PowerIndex};
use crate::bignum::{Calculator, LargeNumber};

#[derive(Debug, Clone, Copy)]
pub struct SwingIndex {
    pub(super) kind: IndexKind,
}

impl SwingIndex {
    /// Fails with InvalidConfiguration on [`IndexKind::BanzhafOwen`], which needs a
    /// precoalition structure.
    pub fn new(kind: IndexKind) -> Result<Self, EngineError> {
        if kind == IndexKind::BanzhafOwen {
            return Err(EngineError::invalid("Banzhaf-Owen is not a swing index"));
        }
        Ok(Self { kind })
    }

    fn needs_per_player(&self) -> bool {
        self.kind != IndexKind::ColemanCollective
    }
}

impl PowerIndex for SwingIndex {
    fn kind(&self) -> IndexKind {
        self.kind
    }

    fn memory_requirement(&self, game: &Game, calc: &Calculator) -> Option<u64> {
        // c, plus cw and one scratch value per player pass, plus the total
        if self.needs_per_player() {
            table_bytes(game, calc, 2, 2)
        } else {
            table_bytes(game, calc, 1, 1)
        }
    }

    fn calculate(&self, game: &Game, calc: &Calculator) -> Result<IndexValues, EngineError> {
        let weights = game.non_null_weights();
        let n = game.non_null_count();
        let z = game.null_count();

        let c = winning_coalitions_per_weight(calc, weights, game.quota(), game.total_weight())?;
        let total_winning = {
            let mut t = LargeNumber::zero(calc)?;
            counting::total(&c, &mut t)?;
            t.to_biguint()?
        };

        let per_player = match self.kind {
            IndexKind::ColemanCollective => Vec::new(),
            IndexKind::Nevison => winning_containing_per_player(&c, weights)?,
            _ => swing_counts_per_player(&c, weights)?,
        };
        drop(c);

        let scale = pow2(z);
        let full_total = &total_winning * &scale;
        let swing_sum: BigUint = per_player.iter().sum();

        let mut values = Vec::with_capacity(game.player_count());
        let mut raw = Vec::with_capacity(game.player_count());

        for i in 0..game.player_count() {
            let null = game.is_null_player(i);
            let count = if null { BigUint::zero() } else { per_player.get(i).cloned().unwrap_or_default() };

            let value = match self.kind {
                IndexKind::RawBanzhaf => BigRational::from_integer((&count * &scale).into()),
                IndexKind::Banzhaf => ratio(&count, &swing_sum)?,
                IndexKind::AbsoluteBanzhaf => ratio(&count, &pow2(n - 1))?,
                IndexKind::Nevison if null => ratio(&total_winning, &pow2(n + 1))?,
                IndexKind::Nevison => ratio(&count, &pow2(n))?,
                IndexKind::ColemanCollective => ratio(&total_winning, &pow2(n))?,
                IndexKind::ColemanInitiative => ratio(&count, &(pow2(n) - &total_winning))?,
                IndexKind::ColemanPreventive => ratio(&count, &total_winning)?,
                IndexKind::BanzhafOwen => {
                    return Err(EngineError::invalid("Banzhaf-Owen is not a swing index"))
                }
            };

            let raw_count = match self.kind {
                IndexKind::ColemanCollective => full_total.clone(),
                // a null player sits in exactly half of all winning coalitions
                IndexKind::Nevison if null => &full_total >> 1,
                _ => count * &scale,
            };

            values.push(value);
            raw.push(raw_count);
        }

        tracing::debug!(
            index = self.kind.abbreviation(),
            non_null = n,
            null = z,
            total_winning = %full_total,
            "normalized counts"
        );

        Ok(IndexValues {
            values,
            raw,
            total_winning: Some(full_total),
        })
    }
}
