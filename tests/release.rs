use num_bigint::BigUint;
use num_traits::One;

use power_index::counting::{swing_counts_per_player, winning_coalitions_per_weight};
use power_index::error::EngineError;
use power_index::bignum::resources::ResourceLimits;
use power_index::bignum::{
    new_calculator, new_calculator_with_limits, Backend, Calculator, IntRepresentation,
    LargeNumber, NumberArray, OffsetArray, Operation,
};

fn all_backends(bound: &BigUint) -> Vec<Calculator> {
    [
        IntRepresentation::BigInt,
        IntRepresentation::Primes,
        IntRepresentation::Auto,
    ]
    .into_iter()
    .map(|r| new_calculator(bound, Operation::Addition, r).unwrap())
    .collect()
}

#[test]
fn counting_passes_release_everything() {
    for calc in all_backends(&(BigUint::one() << 20)) {
        {
            let c = winning_coalitions_per_weight(&calc, &[5, 4, 3, 2, 1], 8, 15).unwrap();
            swing_counts_per_player(&c, &[5, 4, 3, 2, 1]).unwrap();
            assert!(calc.tracker().counts().live_bytes > 0);
        }
        let counts = calc.tracker().counts();
        assert_eq!(counts.live_bytes, 0, "backend {}", calc.kind());
        assert_eq!(counts.live_arrays, 0, "backend {}", calc.kind());
        assert!(counts.peak_bytes >= 2 * 8 * calc.element_size() as u64);
        assert_eq!(counts.total_arrays, 3);
    }
}

#[test]
fn accounted_bytes_follow_the_element_size() {
    for calc in all_backends(&(BigUint::one() << 100)) {
        let a = NumberArray::zeroed(&calc, 10).unwrap();
        assert_eq!(a.bytes(), 10 * calc.element_size() as u64);
        assert_eq!(calc.tracker().counts().live_bytes, a.bytes());
        drop(a);
        assert_eq!(calc.tracker().counts().live_bytes, 0);
    }
}

#[test]
fn early_error_returns_release_storage() {
    let calc = new_calculator(&BigUint::from(1u32 << 20), Operation::Addition, IntRepresentation::Auto)
        .unwrap();
    let run = || -> Result<(), EngineError> {
        let _a = OffsetArray::zeroed(&calc, 1, 100)?;
        let _x = LargeNumber::one(&calc)?;
        Err(EngineError::InvalidConfiguration {
            reason: "stop".into(),
        })
    };
    assert!(run().is_err());
    assert_eq!(calc.tracker().counts().live_bytes, 0);
    assert_eq!(calc.tracker().counts().live_arrays, 0);
}

#[test]
fn over_budget_acquisition_is_refused_before_allocating() {
    let calc = new_calculator_with_limits(
        &BigUint::from(1000u32),
        Operation::Addition,
        IntRepresentation::Auto,
        ResourceLimits {
            max_memory_bytes: 64,
        },
    )
    .unwrap();

    let small = NumberArray::zeroed(&calc, 4).unwrap();
    let err = NumberArray::zeroed(&calc, 8).unwrap_err();
    match err {
        EngineError::LimitExceeded { limit, observed, .. } => {
            assert_eq!(limit, 64);
            assert_eq!(observed, 96);
        }
        other => panic!("expected LimitExceeded, got {other}"),
    }
    assert!(err_is_exhaustion(&calc));
    drop(small);
    assert_eq!(calc.tracker().counts().live_bytes, 0);
}

fn err_is_exhaustion(calc: &Calculator) -> bool {
    NumberArray::zeroed(calc, 1 << 20)
        .map(|_| false)
        .unwrap_or_else(|e| e.is_resource_exhaustion())
}

#[test]
fn with_limits_replaces_the_budget() {
    let calc = new_calculator(&BigUint::from(1000u32), Operation::Addition, IntRepresentation::Auto)
        .unwrap()
        .with_limits(ResourceLimits {
            max_memory_bytes: 8,
        });
    assert!(LargeNumber::zero(&calc).is_ok());
    assert!(NumberArray::zeroed(&calc, 2).is_err());
}
