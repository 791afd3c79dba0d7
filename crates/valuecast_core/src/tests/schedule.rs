//! Tests for growth schedule construction
//!
//! These tests verify:
//! - Length equals high growth years plus transition years
//! - The high growth phase is flat and the last period hits the stable rate
//! - The transition is monotone between the two rates

use crate::error::ValuationError;
use crate::growth::GrowthSchedule;

#[test]
fn test_schedule_shape_over_durations() {
    for high_years in 1..=8 {
        for transition_years in 1..=8 {
            let schedule = GrowthSchedule::build(0.18, 0.03, high_years, transition_years).unwrap();

            assert_eq!(schedule.len(), high_years + transition_years);
            assert!(schedule.rates()[..high_years].iter().all(|&g| g == 0.18));
            assert!(
                (schedule.last_rate().unwrap() - 0.03).abs() < 1e-9,
                "last rate should be stable for ({high_years}, {transition_years})"
            );
        }
    }
}

#[test]
fn test_transition_is_monotone() {
    let declining = GrowthSchedule::build(0.20, 0.02, 3, 7).unwrap();
    for pair in declining.rates().windows(2) {
        assert!(pair[1] <= pair[0]);
    }

    // A turnaround story: growth accelerates towards the stable rate
    let rising = GrowthSchedule::build(-0.05, 0.02, 2, 4).unwrap();
    for pair in rising.rates().windows(2) {
        assert!(pair[1] >= pair[0]);
    }
}

#[test]
fn test_one_based_rate_lookup() {
    let schedule = GrowthSchedule::build(0.10, 0.04, 2, 3).unwrap();
    assert_eq!(schedule.rate(0), None);
    assert_eq!(schedule.rate(1), Some(0.10));
    assert_eq!(schedule.rate(6), None);
    assert!((schedule.rate(3).unwrap() - 0.08).abs() < 1e-12);
}

#[test]
fn test_zero_durations_are_configuration_errors() {
    for (high, transition) in [(0, 5), (5, 0), (0, 0)] {
        let err = GrowthSchedule::build(0.10, 0.03, high, transition).unwrap_err();
        assert!(matches!(err, ValuationError::InvalidParameter { .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
