//! Tests for sensitivity sweeps
//!
//! These tests verify:
//! - Grid dimensions follow the axes
//! - Cells are laid out row-major against the axes
//! - An infeasible combination invalidates only its own cell

use crate::error::ValuationError;
use crate::primitives::gordon_growth;
use crate::sensitivity::{Axis, GridCell, sweep, sweep_labeled};

#[test]
fn test_grid_dimensions_follow_axes() {
    for rows in 1..=4 {
        for cols in 1..=4 {
            let row_axis: Vec<f64> = (0..rows).map(|i| i as f64).collect();
            let col_axis: Vec<f64> = (0..cols).map(|i| i as f64).collect();
            let grid = sweep(|r, c| Ok(r * c), &row_axis, &col_axis).unwrap();
            assert_eq!(grid.shape(), (rows, cols));
            assert_eq!(grid.cells().len(), rows * cols);
        }
    }
}

#[test]
fn test_difference_grid_values() {
    let grid = sweep(|r, c| Ok(r - c), &[0.08, 0.09, 0.10], &[0.02, 0.03]).unwrap();
    assert_eq!(grid.shape(), (3, 2));
    assert!((grid.value(0, 0).unwrap() - 0.06).abs() < 1e-12);
    assert!((grid.value(2, 1).unwrap() - 0.07).abs() < 1e-12);
    assert_eq!(grid.invalid_count(), 0);
}

#[test]
fn test_infeasible_cell_is_isolated() {
    let rates = [0.08, 0.09, 0.10];
    let growths = [0.02, 0.10];
    let grid = sweep_labeled(
        |r, g| gordon_growth(100.0, r, g),
        Axis::new("Discount Rate", rates.to_vec()),
        Axis::new("Growth", growths.to_vec()),
    )
    .unwrap();

    assert_eq!(grid.invalid_count(), 3);
    for (row, &r) in rates.iter().enumerate() {
        let expected = 100.0 * 1.02 / (r - 0.02);
        assert!((grid.value(row, 0).unwrap() - expected).abs() < 1e-9);
        assert!(matches!(grid.get(row, 1), Some(GridCell::Invalid(_))));
    }

    // At g = 0.09 only the rows at or below it fail
    let grid = sweep(|r, g| gordon_growth(100.0, r, g), &rates, &[0.02, 0.09]).unwrap();
    assert_eq!(grid.invalid_count(), 2);
    assert!(grid.value(2, 1).is_some());
    let expected = 100.0 * 1.09 / (0.10 - 0.09);
    assert!((grid.value(2, 1).unwrap() - expected).abs() < 1e-6);
}

#[test]
fn test_invalid_reason_is_error_text() {
    let grid = sweep(|r, g| gordon_growth(100.0, r, g), &[0.05], &[0.05]).unwrap();
    let GridCell::Invalid(reason) = grid.get(0, 0).unwrap() else {
        panic!("expected an invalid cell");
    };
    let expected = ValuationError::DiscountGrowthInversion {
        growth_rate: 0.05,
        discount_rate: 0.05,
    }
    .to_string();
    assert_eq!(reason, &expected);
}

#[test]
fn test_empty_axes_fail_up_front() {
    assert_eq!(
        sweep(|r, c| Ok(r + c), &[], &[0.1]),
        Err(ValuationError::EmptyAxis("row"))
    );
    assert_eq!(
        sweep(|r, c| Ok(r + c), &[0.1], &[]),
        Err(ValuationError::EmptyAxis("column"))
    );
}
