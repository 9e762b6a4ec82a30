use num_bigint::BigUint;
use num_traits::One;
use proptest::prelude::*;

use power_index::error::EngineError;
use power_index::bignum::crt::CrtCalculator;
use power_index::bignum::primes::{
    prev_prime, LARGEST_ADDITION_PRIME, LARGEST_MULTIPLICATION_PRIME,
};
use power_index::bignum::resources::{AllocTracker, ResourceLimits};
use power_index::bignum::{Backend, LargeNumber, Operation};

fn tracker() -> AllocTracker {
    AllocTracker::new(ResourceLimits::default())
}

fn two_addition_primes() -> Vec<u64> {
    let p1 = LARGEST_ADDITION_PRIME;
    let p2 = prev_prime(p1).unwrap();
    vec![p1, p2]
}

fn addition_calc() -> CrtCalculator {
    let bound = BigUint::from(u128::MAX);
    CrtCalculator::new(&two_addition_primes(), &bound, Operation::Addition, tracker()).unwrap()
}

#[test]
fn residues_are_reduced_per_prime() {
    let calc = addition_calc();
    let v = BigUint::from(LARGEST_ADDITION_PRIME) + 5u32;
    let r = calc.residues_of(&v);
    assert_eq!(r[0], 5);
    assert_eq!(r[1], ((LARGEST_ADDITION_PRIME as u128 + 5) % calc.primes()[1] as u128) as u64);
}

#[test]
fn modulus_is_the_product_of_the_primes() {
    let calc = addition_calc();
    let want = BigUint::from(calc.primes()[0]) * calc.primes()[1];
    assert_eq!(calc.modulus(), &want);
}

#[test]
fn values_past_one_word_survive_accumulation() {
    let calc = addition_calc();
    let big = BigUint::from(u64::MAX) * 3u32;
    let mut x = LargeNumber::from_biguint(&calc, &big).unwrap();
    let y = LargeNumber::from_biguint(&calc, &big).unwrap();
    x.accumulate(&y).unwrap();
    assert_eq!(x.to_biguint().unwrap(), big * 2u32);
}

#[test]
fn duplicate_primes_are_rejected() {
    let p = LARGEST_ADDITION_PRIME;
    let err = CrtCalculator::new(&[p, p], &BigUint::one(), Operation::Addition, tracker()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
}

#[test]
fn composites_are_rejected() {
    let err = CrtCalculator::new(&[15, 7], &BigUint::one(), Operation::Addition, tracker()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
}

#[test]
fn addition_primes_are_too_wide_for_multiplication() {
    let err = CrtCalculator::new(
        &[LARGEST_ADDITION_PRIME],
        &BigUint::one(),
        Operation::Multiplication,
        tracker(),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
    assert!(CrtCalculator::new(
        &[LARGEST_MULTIPLICATION_PRIME],
        &BigUint::one(),
        Operation::Multiplication,
        tracker(),
    )
    .is_ok());
}

#[test]
fn capacity_must_exceed_the_bound() {
    let bound = BigUint::from(LARGEST_ADDITION_PRIME);
    let err = CrtCalculator::new(&[LARGEST_ADDITION_PRIME], &bound, Operation::Addition, tracker())
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfiguration { .. }));
}

#[test]
fn empty_prime_list_is_rejected() {
    assert!(CrtCalculator::new(&[], &BigUint::one(), Operation::Addition, tracker()).is_err());
}

proptest! {
    #[test]
    fn reconstruct_inverts_residues(v in any::<u128>()) {
        let calc = addition_calc();
        let value = BigUint::from(v);
        let residues = calc.residues_of(&value);
        prop_assert_eq!(calc.reconstruct(&residues), value);
    }

    #[test]
    fn stored_values_read_back_exactly(v in any::<u128>()) {
        let calc = addition_calc();
        let value = BigUint::from(v);
        let x = LargeNumber::from_biguint(&calc, &value).unwrap();
        prop_assert_eq!(x.to_biguint().unwrap(), value);
        prop_assert!(calc.tracker().counts().live_bytes > 0);
    }
}

#[test]
fn check_prime_is_outside_the_base_primes() {
    let calc = addition_calc();
    let q = calc.check_prime();
    assert!(!calc.primes().contains(&q));
    assert!(q < LARGEST_ADDITION_PRIME);
    assert_eq!(calc.primes().len(), 2);
    assert_eq!(calc.element_size(), 3 * 8);

    let r = calc.residues_of(&BigUint::from(u128::MAX));
    assert_eq!(r.len(), 3);
    assert_eq!(r[2], (u128::MAX % q as u128) as u64);
}

#[test]
fn tampered_check_residue_reads_back_as_a_violation() {
    let calc = addition_calc();
    let mut lane = calc.residues_of(&BigUint::from(12345u32));
    assert_eq!(calc.to_biguint(&lane, 0).unwrap(), BigUint::from(12345u32));
    lane[2] += 1;
    // the base residues still agree, so only the check can notice
    assert_eq!(calc.reconstruct(&lane), BigUint::from(12345u32));
    assert!(matches!(
        calc.to_biguint(&lane, 0),
        Err(EngineError::BoundViolation { .. })
    ));
}
