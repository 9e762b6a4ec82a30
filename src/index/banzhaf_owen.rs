//! Banzhaf-Owen: Banzhaf value of the quotient game between precoalitions, then Banzhaf within
//! each precoalition.
//!
//! For a player `i` in block `k` of size `s`, among `m` blocks, the index is the number of
//! pairs (set of other blocks, subset of block `k`) in which `i` swings, divided by
//! `2^(m-1) * 2^(s-1)`. Counting runs twice: once over block weights, then, per block, over the
//! member weights starting from the coalitions that contain the whole block.
//!
//! Null players are left out of their blocks and blocks left empty are dropped; each one would
//! double numerator and denominator alike.

use num_bigint::BigUint;
use num_rational::BigRational;
use num_traits::Zero;

use crate::counting::{
    backward_counting_per_weight, coalitions_containing_player_from_above, seed_full_weight,
    swing_count,
};
use crate::error::EngineError;
use crate::game::Game;
use crate::index::{pow2, ratio, table_bytes, IndexKind, IndexValues, PowerIndex};
use crate::bignum::{Calculator, LargeNumber, OffsetArray};

#[derive(Debug, Clone, Copy, Default)]
pub struct BanzhafOwen;

struct Block {
    members: Vec<usize>,
    weights: Vec<u64>,
    weight: u64,
}

fn blocks(game: &Game) -> Vec<Block> {
    game.precoalitions()
        .iter()
        .filter_map(|block| {
            let members: Vec<usize> = block
                .iter()
                .copied()
                .filter(|&p| !game.is_null_player(p))
                .collect();
            if members.is_empty() {
                return None;
            }
            let weights: Vec<u64> = members.iter().map(|&p| game.weights()[p]).collect();
            Some(Block {
                weight: weights.iter().sum(),
                members,
                weights,
            })
        })
        .collect()
}

impl PowerIndex for BanzhafOwen {
    fn kind(&self) -> IndexKind {
        IndexKind::BanzhafOwen
    }

    fn memory_requirement(&self, game: &Game, calc: &Calculator) -> Option<u64> {
        // c, cw, cw2, cwi, one scratch value, and the member weights of the largest block
        let max_block = game.precoalitions().iter().map(Vec::len).max().unwrap_or(0) as u64;
        table_bytes(game, calc, 4, 1)?.checked_add(max_block.checked_mul(8)?)
    }

    fn calculate(&self, game: &Game, calc: &Calculator) -> Result<IndexValues, EngineError> {
        let (quota, total) = (game.quota(), game.total_weight());
        let blocks = blocks(game);
        let block_weights: Vec<u64> = blocks.iter().map(|b| b.weight).collect();

        let mut c = OffsetArray::zeroed(calc, quota, total)?;
        seed_full_weight(&mut c);
        backward_counting_per_weight(&mut c, &block_weights)?;

        let mut cw = OffsetArray::zeroed(calc, quota, total)?;
        let mut cw2 = OffsetArray::zeroed(calc, quota, total)?;
        let mut cwi = OffsetArray::zeroed(calc, quota, total)?;
        let mut out = LargeNumber::zero(calc)?;

        let external = pow2(blocks.len() - 1);
        let scale = pow2(game.null_count());
        let mut values = vec![BigRational::zero(); game.player_count()];
        let mut raw = vec![BigUint::zero(); game.player_count()];

        for block in &blocks {
            coalitions_containing_player_from_above(&mut cw, &c, block.weight)?;

            if block.members.len() == 1 {
                swing_count(&cw, block.weight, &mut out)?;
                let swings = out.to_biguint()?;
                let p = block.members[0];
                values[p] = ratio(&swings, &external)?;
                raw[p] = swings * &scale;
                continue;
            }

            cw2.copy_from(&cw);
            backward_counting_per_weight(&mut cw2, &block.weights)?;
            let denominator = &external * pow2(block.members.len() - 1);

            for (&p, &w) in block.members.iter().zip(&block.weights) {
                coalitions_containing_player_from_above(&mut cwi, &cw2, w)?;
                swing_count(&cwi, w, &mut out)?;
                let swings = out.to_biguint()?;
                values[p] = ratio(&swings, &denominator)?;
                raw[p] = swings * &scale;
            }

            tracing::trace!(
                members = block.members.len(),
                weight = block.weight,
                "block done"
            );
        }

        tracing::debug!(
            blocks = blocks.len(),
            dropped = game.precoalitions().len() - blocks.len(),
            "banzhaf-owen done"
        );

        Ok(IndexValues {
            values,
            raw,
            total_winning: None,
        })
    }
}
