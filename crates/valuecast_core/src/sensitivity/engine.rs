//! Two-axis sweep with per-cell failure isolation

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::grid::{Axis, GridCell, SensitivityGrid};
use crate::error::{Result, ValuationError};

/// Turn one evaluation into a cell. Errors and non-finite values never
/// escape a sweep.
fn to_cell(result: Result<f64>) -> GridCell {
    match result {
        Ok(value) if value.is_finite() => GridCell::Valid(value),
        Ok(value) => GridCell::Invalid(format!("non-finite result ({value})")),
        Err(err) => GridCell::Invalid(err.to_string()),
    }
}

/// Evaluate `valuation(row, col)` over the Cartesian product of two axes.
///
/// Cells are stored row-major. A failing combination only invalidates its own
/// cell; empty axes are rejected before anything is evaluated.
pub fn sweep_labeled<F>(valuation: F, rows: Axis, columns: Axis) -> Result<SensitivityGrid>
where
    F: Fn(f64, f64) -> Result<f64> + Sync,
{
    if rows.is_empty() {
        return Err(ValuationError::EmptyAxis("row"));
    }
    if columns.is_empty() {
        return Err(ValuationError::EmptyAxis("column"));
    }

    let points: Vec<(f64, f64)> = rows
        .values
        .iter()
        .flat_map(|&r| columns.values.iter().map(move |&c| (r, c)))
        .collect();

    tracing::debug!(
        rows = rows.len(),
        columns = columns.len(),
        row_axis = %rows.label,
        column_axis = %columns.label,
        "starting sensitivity sweep"
    );

    #[cfg(feature = "parallel")]
    let cells: Vec<GridCell> = points
        .par_iter()
        .map(|&(r, c)| to_cell(valuation(r, c)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let cells: Vec<GridCell> = points
        .iter()
        .map(|&(r, c)| to_cell(valuation(r, c)))
        .collect();

    let grid = SensitivityGrid::from_cells(rows, columns, cells)?;
    tracing::debug!(
        valid = grid.valid_count(),
        invalid = grid.invalid_count(),
        "sensitivity sweep complete"
    );
    Ok(grid)
}

/// [`sweep_labeled`] with generic axis labels
pub fn sweep<F>(valuation: F, rows: &[f64], columns: &[f64]) -> Result<SensitivityGrid>
where
    F: Fn(f64, f64) -> Result<f64> + Sync,
{
    sweep_labeled(
        valuation,
        Axis::new("row", rows.to_vec()),
        Axis::new("column", columns.to_vec()),
    )
}
