mod common;

use num_bigint::BigUint;
use proptest::prelude::*;

use power_index::counting::{
    backward_counting_per_weight, coalitions_containing_player_from_above, seed_full_weight,
    sum_range, swing_count, swing_counts_per_player, total, winning_coalitions_per_weight,
    winning_containing_per_player,
};
use power_index::error::EngineError;
use power_index::bignum::{
    new_calculator, Calculator, IntRepresentation, LargeNumber, OffsetArray, Operation,
};

fn calc(repr: IntRepresentation) -> Calculator {
    new_calculator(&BigUint::from(1u64 << 40), Operation::Addition, repr).unwrap()
}

fn all_backends() -> Vec<Calculator> {
    [
        IntRepresentation::Native,
        IntRepresentation::BigInt,
        IntRepresentation::Primes,
    ]
    .into_iter()
    .map(calc)
    .collect()
}

fn big(v: &[u64]) -> Vec<BigUint> {
    v.iter().map(|&x| BigUint::from(x)).collect()
}

#[test]
fn three_player_example_counts_per_weight() {
    for calc in all_backends() {
        let c = winning_coalitions_per_weight(&calc, &[4, 3, 2], 5, 9).unwrap();
        assert_eq!(c.to_biguints().unwrap(), big(&[1, 1, 1, 0, 1]));

        let mut t = LargeNumber::zero(&calc).unwrap();
        total(&c, &mut t).unwrap();
        assert_eq!(t.to_biguint().unwrap(), BigUint::from(4u32));
    }
}

#[test]
fn three_player_example_per_player() {
    for calc in all_backends() {
        let c = winning_coalitions_per_weight(&calc, &[4, 3, 2], 5, 9).unwrap();
        assert_eq!(swing_counts_per_player(&c, &[4, 3, 2]).unwrap(), big(&[2, 2, 2]));
        assert_eq!(winning_containing_per_player(&c, &[4, 3, 2]).unwrap(), big(&[3, 3, 3]));
    }
}

#[test]
fn containing_a_player_is_a_shift_of_the_other_players_counts() {
    let calc = calc(IntRepresentation::Auto);
    let c = winning_coalitions_per_weight(&calc, &[4, 3, 2], 5, 9).unwrap();
    let mut cw = OffsetArray::zeroed(&calc, 5, 9).unwrap();
    coalitions_containing_player_from_above(&mut cw, &c, 4).unwrap();
    // winning coalitions with the weight-4 player: {4,2}, {4,3}, {4,3,2}
    assert_eq!(cw.to_biguints().unwrap(), big(&[0, 1, 1, 0, 1]));

    let mut out = LargeNumber::zero(&calc).unwrap();
    swing_count(&cw, 4, &mut out).unwrap();
    assert_eq!(out.to_biguint().unwrap(), BigUint::from(2u32));
}

#[test]
fn sum_range_clips_to_the_stored_keys() {
    let calc = calc(IntRepresentation::Auto);
    let c = winning_coalitions_per_weight(&calc, &[4, 3, 2], 5, 9).unwrap();
    let mut out = LargeNumber::zero(&calc).unwrap();

    sum_range(&c, 0, 6, &mut out).unwrap();
    assert_eq!(out.to_biguint().unwrap(), BigUint::from(2u32));
    sum_range(&c, 8, 100, &mut out).unwrap();
    assert_eq!(out.to_biguint().unwrap(), BigUint::from(1u32));
    sum_range(&c, 7, 6, &mut out).unwrap();
    assert_eq!(out.to_biguint().unwrap(), BigUint::from(0u32));
}

#[test]
fn equal_weights_share_one_derivation() {
    let calc = calc(IntRepresentation::Auto);
    let weights = [3, 3, 3, 1];
    let c = winning_coalitions_per_weight(&calc, &weights, 6, 10).unwrap();
    let before = calc_arrays(&calc);
    let swings = swing_counts_per_player(&c, &weights).unwrap();
    let r = common::brute_force(&weights, 6);
    assert_eq!(swings, big(&r.swings));
    // one cw array plus one scratch value, whatever the number of players
    assert_eq!(calc_arrays(&calc) - before, 2);
}

fn calc_arrays(calc: &Calculator) -> u64 {
    use power_index::bignum::Backend;
    calc.tracker().counts().total_arrays
}

#[test]
fn folding_from_a_manual_seed_matches_the_helper() {
    let calc = calc(IntRepresentation::BigInt);
    let mut c = OffsetArray::zeroed(&calc, 1, 6).unwrap();
    seed_full_weight(&mut c);
    backward_counting_per_weight(&mut c, &[1, 2, 3]).unwrap();
    // coalitions of {1,2,3} per weight 1..=6
    assert_eq!(c.to_biguints().unwrap(), big(&[1, 1, 2, 1, 1, 1]));
}

#[test]
fn quota_equal_to_total_leaves_only_the_grand_coalition() {
    let calc = calc(IntRepresentation::Auto);
    let c = winning_coalitions_per_weight(&calc, &[5, 1, 1], 7, 7).unwrap();
    assert_eq!(c.to_biguints().unwrap(), big(&[1]));
    assert_eq!(swing_counts_per_player(&c, &[5, 1, 1]).unwrap(), big(&[1, 1, 1]));
}

#[test]
fn empty_weight_list_is_rejected() {
    let calc = calc(IntRepresentation::Auto);
    let mut c = OffsetArray::zeroed(&calc, 1, 3).unwrap();
    seed_full_weight(&mut c);
    let err = backward_counting_per_weight(&mut c, &[]).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
}

#[test]
fn zero_weight_derivation_is_rejected() {
    let calc = calc(IntRepresentation::Auto);
    let c = winning_coalitions_per_weight(&calc, &[2, 1], 1, 3).unwrap();
    let mut cw = OffsetArray::zeroed(&calc, 1, 3).unwrap();
    let err = coalitions_containing_player_from_above(&mut cw, &c, 0).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
}

#[test]
fn derivation_into_a_different_key_range_is_rejected() {
    let calc = calc(IntRepresentation::Auto);
    let c = winning_coalitions_per_weight(&calc, &[4, 3, 2], 5, 9).unwrap();
    for (lo, hi) in [(4, 9), (5, 8), (1, 3)] {
        let mut cw = OffsetArray::zeroed(&calc, lo, hi).unwrap();
        let err = coalitions_containing_player_from_above(&mut cw, &c, 4).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration { .. }), "[{lo}, {hi}]");
    }
}

#[test]
fn multiplication_calculators_cannot_count() {
    let calc = new_calculator(&BigUint::from(1000u32), Operation::Multiplication, IntRepresentation::Auto)
        .unwrap();
    let err = winning_coalitions_per_weight(&calc, &[2, 1], 1, 3).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
}

#[test]
fn quota_outside_the_weight_range_is_rejected() {
    let calc = calc(IntRepresentation::Auto);
    assert!(winning_coalitions_per_weight(&calc, &[2, 1], 0, 3).is_err());
    assert!(winning_coalitions_per_weight(&calc, &[2, 1], 4, 3).is_err());
}

fn game_strategy() -> impl Strategy<Value = (Vec<u64>, u64)> {
    prop::collection::vec(1u64..=9, 1..=10).prop_flat_map(|mut weights| {
        weights.sort_unstable_by(|a, b| b.cmp(a));
        let total: u64 = weights.iter().sum();
        (Just(weights), 1..=total)
    })
}

proptest! {
    #[test]
    fn counts_match_brute_force((weights, quota) in game_strategy()) {
        let total: u64 = weights.iter().sum();
        let r = common::brute_force(&weights, quota);
        for calc in all_backends() {
            let c = winning_coalitions_per_weight(&calc, &weights, quota, total).unwrap();
            prop_assert_eq!(c.to_biguints().unwrap(), big(&r.per_weight[quota as usize..]));
            prop_assert_eq!(swing_counts_per_player(&c, &weights).unwrap(), big(&r.swings));
            prop_assert_eq!(winning_containing_per_player(&c, &weights).unwrap(), big(&r.containing));
        }
    }
}
