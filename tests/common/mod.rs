//! Brute-force references over all `2^n` coalitions, for small games.

#![allow(dead_code)]

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use power_index::index::IndexKind;

pub fn rat(num: u64, den: u64) -> BigRational {
    BigRational::new(BigInt::from(num), BigInt::from(den))
}

pub fn big_rat(num: &BigUint, den: &BigUint) -> BigRational {
    BigRational::new(BigInt::from(num.clone()), BigInt::from(den.clone()))
}

fn weight_of(weights: &[u64], mask: u64) -> u64 {
    (0..weights.len())
        .filter(|&i| mask & (1 << i) != 0)
        .map(|i| weights[i])
        .sum()
}

#[derive(Debug)]
pub struct Reference {
    pub total_winning: u64,
    pub swings: Vec<u64>,
    pub containing: Vec<u64>,
    /// Number of coalitions per weight, index = weight.
    pub per_weight: Vec<u64>,
}

pub fn brute_force(weights: &[u64], quota: u64) -> Reference {
    let n = weights.len();
    let total: u64 = weights.iter().sum();
    let mut r = Reference {
        total_winning: 0,
        swings: vec![0; n],
        containing: vec![0; n],
        per_weight: vec![0; total as usize + 1],
    };

    for mask in 0..(1u64 << n) {
        let w = weight_of(weights, mask);
        r.per_weight[w as usize] += 1;
        if w < quota {
            continue;
        }
        r.total_winning += 1;
        for i in 0..n {
            if mask & (1 << i) == 0 {
                continue;
            }
            r.containing[i] += 1;
            if w - weights[i] < quota {
                r.swings[i] += 1;
            }
        }
    }
    r
}

/// Index values from the full-game definitions, in the given player order.
pub fn reference_index(kind: IndexKind, weights: &[u64], quota: u64) -> Vec<BigRational> {
    let r = brute_force(weights, quota);
    let n = weights.len() as u32;
    let all = 1u64 << n;
    let swing_sum: u64 = r.swings.iter().sum();

    (0..weights.len())
        .map(|i| match kind {
            IndexKind::RawBanzhaf => rat(r.swings[i], 1),
            IndexKind::Banzhaf => rat(r.swings[i], swing_sum),
            IndexKind::AbsoluteBanzhaf => rat(r.swings[i], all / 2),
            IndexKind::Nevison => rat(r.containing[i], all),
            IndexKind::ColemanCollective => rat(r.total_winning, all),
            IndexKind::ColemanInitiative => rat(r.swings[i], all - r.total_winning),
            IndexKind::ColemanPreventive => rat(r.swings[i], r.total_winning),
            IndexKind::BanzhafOwen => {
                let singletons: Vec<Vec<usize>> = (0..weights.len()).map(|p| vec![p]).collect();
                banzhaf_owen(weights, quota, &singletons)[i].clone()
            }
        })
        .collect()
}

/// Banzhaf-Owen by enumerating, for each player, every set of other blocks and every subset
/// of its own block.
pub fn banzhaf_owen(weights: &[u64], quota: u64, blocks: &[Vec<usize>]) -> Vec<BigRational> {
    let m = blocks.len() as u32;
    let block_weight: Vec<u64> = blocks
        .iter()
        .map(|b| b.iter().map(|&p| weights[p]).sum())
        .collect();
    let mut out = vec![rat(0, 1); weights.len()];

    for (k, block) in blocks.iter().enumerate() {
        let s = block.len() as u32;
        for &i in block {
            let mates: Vec<usize> = block.iter().copied().filter(|&p| p != i).collect();
            let mut count = 0u64;
            for outer in 0..(1u64 << m) {
                if outer & (1 << k) != 0 {
                    continue;
                }
                let t: u64 = (0..blocks.len())
                    .filter(|&b| outer & (1 << b) != 0)
                    .map(|b| block_weight[b])
                    .sum();
                for inner in 0..(1u64 << mates.len()) {
                    let r: u64 = (0..mates.len())
                        .filter(|&j| inner & (1 << j) != 0)
                        .map(|j| weights[mates[j]])
                        .sum();
                    if t + r < quota && t + r + weights[i] >= quota {
                        count += 1;
                    }
                }
            }
            out[i] = rat(count, (1u64 << (m - 1)) * (1u64 << (s - 1)));
        }
    }
    out
}

pub fn binomial(n: u64, k: u64) -> BigUint {
    let mut acc = BigUint::from(1u32);
    for j in 0..k {
        acc = acc * (n - j) / (j + 1);
    }
    acc
}
