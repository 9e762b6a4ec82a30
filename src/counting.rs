//! Weight-indexed coalition counting.
//!
//! Every array here is an [`OffsetArray`] over `[quota, total]`. Seeded with a single one at
//! `total` and folded with a weight list, entry `x` holds the number of subsets of those
//! weights whose complement sums to `x`, i.e. the number of coalitions of weight `x`.
//! Keys below the quota are never stored; nothing that reads these arrays needs them.
//!
//! The primitives only know about weights and keys. Which weights are folded (all players,
//! the blocks of a precoalition structure, the members of one block) is up to the caller.

use num_bigint::BigUint;

use crate::error::EngineError;
use crate::bignum::{Backend, LargeNumber, OffsetArray, Operation};

fn require_addition<B: Backend>(calc: &B, what: &str) -> Result<(), EngineError> {
    if calc.operation() != Operation::Addition {
        return Err(EngineError::invalid(format!(
            "{what} needs an addition calculator, got {}",
            calc.operation().as_str()
        )));
    }
    Ok(())
}

/// `c[hi] = 1`: the grand coalition of the weights about to be folded.
pub fn seed_full_weight<B: Backend>(c: &mut OffsetArray<'_, B>) {
    let hi = c.hi();
    c.set_one(hi);
}

/// Fold `weights` into `c`, one weight at a time.
///
/// For each `w`, keys are scanned low to high with `c[x] += c[x + w]`, so a weight is never
/// counted twice in one subset.
pub fn backward_counting_per_weight<B: Backend>(
    c: &mut OffsetArray<'_, B>,
    weights: &[u64],
) -> Result<(), EngineError> {
    require_addition(c.calculator(), "backward counting")?;
    if weights.is_empty() {
        return Err(EngineError::invalid("backward counting over an empty weight list"));
    }

    let (lo, hi) = (c.lo(), c.hi());
    for &w in weights {
        if w > hi - lo {
            continue;
        }
        for x in lo..=hi - w {
            c.accumulate_key(x, x + w)?;
        }
    }

    tracing::trace!(
        players = weights.len(),
        lo,
        hi,
        "folded weights into coalition counts"
    );
    Ok(())
}

/// Number of winning coalitions per weight over `[quota, total]`.
pub fn winning_coalitions_per_weight<'c, B: Backend>(
    calc: &'c B,
    weights: &[u64],
    quota: u64,
    total: u64,
) -> Result<OffsetArray<'c, B>, EngineError> {
    require_addition(calc, "winning coalition counting")?;
    if quota == 0 || quota > total {
        return Err(EngineError::invalid(format!(
            "quota {quota} outside (0, {total}]"
        )));
    }
    let mut c = OffsetArray::zeroed(calc, quota, total)?;
    seed_full_weight(&mut c);
    backward_counting_per_weight(&mut c, weights)?;
    Ok(c)
}

/// Derive, into `cw`, the counts of coalitions in `c` that contain a player of weight `w`.
///
/// With `c_without` the counts over the other players, `cw[x] = c_without[x - w]` and
/// `c[x] = c_without[x] + cw[x]`. Keys below `lo` are absent, so the shift is evaluated from
/// the top instead: `cw[x] = c[x] - cw[x + w]`, taking `cw[x + w] = 0` past `hi`.
///
/// `cw` must cover the same keys as `c`.
pub fn coalitions_containing_player_from_above<'c, B: Backend>(
    cw: &mut OffsetArray<'c, B>,
    c: &OffsetArray<'c, B>,
    w: u64,
) -> Result<(), EngineError> {
    require_addition(c.calculator(), "coalition derivation")?;
    if w == 0 {
        return Err(EngineError::invalid(
            "cannot derive coalitions containing a player of weight 0",
        ));
    }
    if cw.lo() != c.lo() || cw.hi() != c.hi() {
        return Err(EngineError::invalid(format!(
            "derivation target covers [{}, {}], counts cover [{}, {}]",
            cw.lo(),
            cw.hi(),
            c.lo(),
            c.hi()
        )));
    }

    cw.copy_from(c);
    let hi = c.hi();
    for x in (c.lo()..=c.hi()).rev() {
        match x.checked_add(w) {
            Some(above) if above <= hi => cw.subtract_key(x, above)?,
            _ => {}
        }
    }
    Ok(())
}

/// `out = Σ c[x]` for `x` in `[from, to]`, clipped to the stored keys.
pub fn sum_range<'c, B: Backend>(
    c: &OffsetArray<'c, B>,
    from: u64,
    to: u64,
    out: &mut LargeNumber<'c, B>,
) -> Result<(), EngineError> {
    out.assign_zero();
    let from = from.max(c.lo());
    let to = to.min(c.hi());
    if from > to {
        return Ok(());
    }
    for x in from..=to {
        c.accumulate_into(x, out)?;
    }
    Ok(())
}

/// `out = Σ c[x]` over every stored key.
pub fn total<'c, B: Backend>(
    c: &OffsetArray<'c, B>,
    out: &mut LargeNumber<'c, B>,
) -> Result<(), EngineError> {
    sum_range(c, c.lo(), c.hi(), out)
}

/// Coalitions in which a member of weight `w` is a swing player: `Σ cw[x]` for `x` in
/// `[quota, quota + w - 1]`, where `quota = cw.lo()`.
pub fn swing_count<'c, B: Backend>(
    cw: &OffsetArray<'c, B>,
    w: u64,
    out: &mut LargeNumber<'c, B>,
) -> Result<(), EngineError> {
    if w == 0 {
        out.assign_zero();
        return Ok(());
    }
    let quota = cw.lo();
    sum_range(cw, quota, quota.saturating_add(w - 1), out)
}

/// Run `per_weight` once per distinct weight; equal neighbours share the result.
///
/// Equal weights are only shared when adjacent, as in the sorted order of
/// [`Game`](crate::game::Game).
fn per_player<'c, B: Backend>(
    c: &OffsetArray<'c, B>,
    weights: &[u64],
    mut per_weight: impl FnMut(&OffsetArray<'c, B>, u64, &mut LargeNumber<'c, B>) -> Result<(), EngineError>,
) -> Result<Vec<BigUint>, EngineError> {
    let calc = c.calculator();
    require_addition(calc, "per-player counting")?;

    let mut cw = OffsetArray::zeroed(calc, c.lo(), c.hi())?;
    let mut out = LargeNumber::zero(calc)?;
    let mut values: Vec<BigUint> = Vec::with_capacity(weights.len());

    for (i, &w) in weights.iter().enumerate() {
        if i > 0 && weights[i - 1] == w {
            let prev = values[i - 1].clone();
            values.push(prev);
            continue;
        }
        coalitions_containing_player_from_above(&mut cw, c, w)?;
        per_weight(&cw, w, &mut out)?;
        values.push(out.to_biguint()?);
    }

    tracing::debug!(players = weights.len(), lo = c.lo(), hi = c.hi(), "per-player counts done");
    Ok(values)
}

/// Swing counts of every player, in the order of `weights`.
pub fn swing_counts_per_player<B: Backend>(
    c: &OffsetArray<'_, B>,
    weights: &[u64],
) -> Result<Vec<BigUint>, EngineError> {
    per_player(c, weights, |cw, w, out| swing_count(cw, w, out))
}

/// Winning coalitions containing each player, in the order of `weights`.
pub fn winning_containing_per_player<B: Backend>(
    c: &OffsetArray<'_, B>,
    weights: &[u64],
) -> Result<Vec<BigUint>, EngineError> {
    per_player(c, weights, |cw, _, out| total(cw, out))
}
