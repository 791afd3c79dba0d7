//! Tests for cash flow projection
//!
//! These tests verify:
//! - Projection is deterministic down to the bit
//! - Present values match a direct compounding loop
//! - The terminal-share check flags terminal-dominated valuations

use crate::growth::GrowthSchedule;
use crate::primitives::{net_present_value, present_value};
use crate::projection::{FlowKind, project};
use crate::terminal::TerminalValueMethod;

/// Test that identical inputs give bit-identical records
#[test]
fn test_projection_is_idempotent() {
    let schedule = GrowthSchedule::build(0.137, 0.021, 4, 6).unwrap();
    let first = project(873.21, &schedule, 0.0873, FlowKind::Fcff).unwrap();
    let second = project(873.21, &schedule, 0.0873, FlowKind::Fcff).unwrap();

    assert_eq!(first.records().len(), second.records().len());
    for (a, b) in first.records().iter().zip(second.records()) {
        assert_eq!(a.period, b.period);
        assert_eq!(a.cash_flow.to_bits(), b.cash_flow.to_bits());
        assert_eq!(a.growth_rate.to_bits(), b.growth_rate.to_bits());
        assert_eq!(a.present_value.to_bits(), b.present_value.to_bits());
    }
}

#[test]
fn test_present_values_match_npv() {
    let schedule = GrowthSchedule::build(0.12, 0.03, 2, 3).unwrap();
    let projection = project(100.0, &schedule, 0.10, FlowKind::Fcfe).unwrap();

    // NPV leaves index 0 undiscounted, and projected periods start at year 1
    let flows: Vec<f64> = std::iter::once(0.0)
        .chain(projection.records().iter().map(|r| r.cash_flow))
        .collect();
    let npv = net_present_value(0.10, &flows).unwrap();
    assert!((projection.sum_of_period_pvs() - npv).abs() < 1e-9);

    for record in projection.records() {
        let pv = present_value(record.cash_flow, 0.10, record.period).unwrap();
        assert!((record.present_value - pv).abs() < 1e-9);
    }
    assert!(projection.records().iter().all(|r| r.kind == FlowKind::Fcfe));

    let mut expected = 100.0;
    for (record, g) in projection.records().iter().zip(schedule.iter()) {
        expected *= 1.0 + g;
        assert!((record.cash_flow - expected).abs() < 1e-9);
    }
}

#[test]
fn test_terminal_share_flags_dominance() {
    // A long stable tail and a short horizon push almost all value into the terminal
    let schedule = GrowthSchedule::two_stage(0.05, 0.04, 2).unwrap();
    let projection = project(100.0, &schedule, 0.06, FlowKind::Fcff)
        .unwrap()
        .with_terminal(TerminalValueMethod::GordonGrowth {
            stable_growth: 0.04,
            discount_rate: 0.06,
        })
        .unwrap();

    let check = projection.check_terminal_share(0.80).unwrap();
    assert!(check.share > 0.90);
    assert!(!check.acceptable);

    let share = projection.terminal_value_share().unwrap();
    assert!((share - check.share).abs() < 1e-12);
}

#[test]
fn test_terminal_share_acceptable_with_long_horizon() {
    let schedule = GrowthSchedule::from_rates(vec![0.02; 40], 0.0).unwrap();
    let projection = project(100.0, &schedule, 0.12, FlowKind::Fcff)
        .unwrap()
        .with_terminal(TerminalValueMethod::GordonGrowth {
            stable_growth: 0.0,
            discount_rate: 0.12,
        })
        .unwrap();
    assert!(projection.check_terminal_share(0.80).unwrap().acceptable);
}

#[test]
fn test_invalid_base_cash_flow() {
    let schedule = GrowthSchedule::build(0.10, 0.03, 5, 5).unwrap();
    for base in [0.0, -10.0, f64::NAN, f64::INFINITY] {
        assert!(project(base, &schedule, 0.09, FlowKind::Fcff).is_err());
    }
}
