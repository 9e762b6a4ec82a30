use rustc_hash::FxHashSet;

use crate::error::EngineError;

/// A weighted voting game.
///
/// Players are stored sorted by decreasing weight; `player_number(i)` maps the internal index
/// back to the caller's numbering. Players of weight 0 (null players) form a suffix of the
/// internal order and are excluded from all counting work.
#[derive(Clone, Debug)]
pub struct Game {
    weights: Vec<u64>,
    order: Vec<usize>,
    quota: u64,
    total_weight: u64,
    non_null: usize,
    precoalitions: Vec<Vec<usize>>,
}

impl Game {
    /// Build a game where every player forms its own precoalition.
    ///
    /// Requires at least one player and `0 < quota <= sum(weights)`.
    pub fn new(weights: &[u64], quota: u64) -> Result<Self, EngineError> {
        if weights.is_empty() {
            return Err(EngineError::invalid("a game needs at least one player"));
        }

        let total_weight = weights
            .iter()
            .try_fold(0u64, |acc, &w| acc.checked_add(w))
            .ok_or_else(|| EngineError::invalid("total weight does not fit 64 bits"))?;

        if quota == 0 || quota > total_weight {
            return Err(EngineError::invalid(format!(
                "quota {quota} outside (0, {total_weight}]"
            )));
        }

        let mut order: Vec<usize> = (0..weights.len()).collect();
        order.sort_by(|&a, &b| weights[b].cmp(&weights[a]));
        let sorted: Vec<u64> = order.iter().map(|&i| weights[i]).collect();
        let non_null = sorted.iter().take_while(|&&w| w > 0).count();

        Ok(Self {
            precoalitions: (0..sorted.len()).map(|i| vec![i]).collect(),
            weights: sorted,
            order,
            quota,
            total_weight,
            non_null,
        })
    }

    /// Replace the precoalition structure.
    ///
    /// `blocks` use the caller's player numbering (0-based) and must partition all players.
    pub fn with_precoalitions(mut self, blocks: &[Vec<usize>]) -> Result<Self, EngineError> {
        let n = self.weights.len();
        let mut position = vec![0usize; n];
        for (internal, &original) in self.order.iter().enumerate() {
            position[original] = internal;
        }

        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut internal_blocks = Vec::with_capacity(blocks.len());
        for block in blocks {
            if block.is_empty() {
                return Err(EngineError::invalid("precoalitions must not be empty"));
            }
            let mut members = Vec::with_capacity(block.len());
            for &p in block {
                if p >= n {
                    return Err(EngineError::invalid(format!(
                        "precoalition references player {p}, but the game has {n} players"
                    )));
                }
                if !seen.insert(p) {
                    return Err(EngineError::invalid(format!(
                        "player {p} appears in more than one precoalition"
                    )));
                }
                members.push(position[p]);
            }
            members.sort_unstable();
            internal_blocks.push(members);
        }

        if seen.len() != n {
            return Err(EngineError::invalid(format!(
                "precoalitions cover {} of {n} players",
                seen.len()
            )));
        }

        self.precoalitions = internal_blocks;
        Ok(self)
    }

    /// Weights sorted decreasingly (null players last).
    #[inline]
    pub fn weights(&self) -> &[u64] {
        &self.weights
    }

    /// Weights of the non-null players, sorted decreasingly.
    #[inline]
    pub fn non_null_weights(&self) -> &[u64] {
        &self.weights[..self.non_null]
    }

    #[inline]
    pub fn quota(&self) -> u64 {
        self.quota
    }

    #[inline]
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn non_null_count(&self) -> usize {
        self.non_null
    }

    #[inline]
    pub fn null_count(&self) -> usize {
        self.weights.len() - self.non_null
    }

    #[inline]
    pub fn is_null_player(&self, internal: usize) -> bool {
        internal >= self.non_null
    }

    /// Caller's player number of internal player `internal`.
    #[inline]
    pub fn player_number(&self, internal: usize) -> usize {
        self.order[internal]
    }

    /// Caller numbers of the null players, ascending.
    pub fn null_players(&self) -> Vec<usize> {
        let mut numbers = self.order[self.non_null..].to_vec();
        numbers.sort_unstable();
        numbers
    }

    /// Precoalitions as lists of internal player indices.
    #[inline]
    pub fn precoalitions(&self) -> &[Vec<usize>] {
        &self.precoalitions
    }

    #[inline]
    pub fn has_nontrivial_precoalitions(&self) -> bool {
        self.precoalitions.iter().any(|b| b.len() > 1)
    }

    /// Put values computed in internal order back into the caller's numbering.
    pub fn to_original_order<T: Clone>(&self, internal: &[T]) -> Vec<T> {
        assert_eq!(internal.len(), self.weights.len());
        let mut out: Vec<Option<T>> = vec![None; internal.len()];
        for (i, v) in internal.iter().enumerate() {
            out[self.order[i]] = Some(v.clone());
        }
        out.into_iter()
            .map(|v| v.expect("player order is a permutation"))
            .collect()
    }
}
