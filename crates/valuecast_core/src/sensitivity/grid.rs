//! Sensitivity grid storage

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};

/// One evaluated combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridCell {
    Valid(f64),
    /// The valuation failed or was not finite; holds the reason
    Invalid(String),
}

impl GridCell {
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self {
            GridCell::Valid(v) => Some(*v),
            GridCell::Invalid(_) => None,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, GridCell::Valid(_))
    }
}

/// A labeled, ordered sequence of swept values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub label: String,
    pub values: Vec<f64>,
}

impl Axis {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    /// `steps` evenly spaced values from `min` to `max` inclusive.
    /// One step (or zero) yields just `min`.
    pub fn linspace(label: impl Into<String>, min: f64, max: f64, steps: usize) -> Self {
        let values = if steps <= 1 {
            vec![min]
        } else {
            let step_size = (max - min) / (steps - 1) as f64;
            (0..steps).map(|i| min + step_size * i as f64).collect()
        };
        Self::new(label, values)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Results of a two-parameter sweep, stored row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityGrid {
    rows: Axis,
    columns: Axis,
    cells: Vec<GridCell>,
}

impl SensitivityGrid {
    /// Build a grid from row-major cells; the cell count must equal
    /// `rows.len() * columns.len()`.
    pub fn from_cells(rows: Axis, columns: Axis, cells: Vec<GridCell>) -> Result<Self> {
        let expected = rows.len() * columns.len();
        if cells.len() != expected {
            return Err(ValuationError::DimensionMismatch {
                what: "sensitivity grid cells",
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            cells,
        })
    }

    #[must_use]
    pub fn rows(&self) -> &Axis {
        &self.rows
    }

    #[must_use]
    pub fn columns(&self) -> &Axis {
        &self.columns
    }

    /// `(rows, columns)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&GridCell> {
        if row >= self.rows.len() || col >= self.columns.len() {
            return None;
        }
        self.cells.get(row * self.columns.len() + col)
    }

    /// Valid value at `(row, col)`
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.get(row, col).and_then(GridCell::value)
    }

    /// Cells of one row
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[GridCell]> {
        let width = self.columns.len();
        let start = row.checked_mul(width)?;
        self.cells.get(start..start + width)
    }

    fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().filter_map(GridCell::value)
    }

    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.valid_values().count()
    }

    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.cells.len() - self.valid_count()
    }

    /// Smallest valid value
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.valid_values().reduce(f64::min)
    }

    /// Largest valid value
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.valid_values().reduce(f64::max)
    }

    /// `max - min` over valid cells
    #[must_use]
    pub fn range(&self) -> Option<f64> {
        Some(self.max()? - self.min()?)
    }

    /// Middle row, middle column; the usual base case
    #[must_use]
    pub fn center(&self) -> Option<&GridCell> {
        self.get(self.rows.len() / 2, self.columns.len() / 2)
    }

    /// `(row value, column value, cell)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, &GridCell)> {
        let width = self.columns.len();
        self.cells.iter().enumerate().map(move |(i, cell)| {
            (self.rows.values[i / width], self.columns.values[i % width], cell)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SensitivityGrid {
        let rows = Axis::new("r", vec![1.0, 2.0, 3.0]);
        let cols = Axis::new("c", vec![10.0, 20.0]);
        let cells = vec![
            GridCell::Valid(11.0),
            GridCell::Valid(21.0),
            GridCell::Invalid("bad".into()),
            GridCell::Valid(22.0),
            GridCell::Valid(13.0),
            GridCell::Valid(23.0),
        ];
        SensitivityGrid::from_cells(rows, cols, cells).unwrap()
    }

    #[test]
    fn test_dimension_check() {
        let rows = Axis::new("r", vec![1.0, 2.0]);
        let cols = Axis::new("c", vec![1.0, 2.0]);
        let result = SensitivityGrid::from_cells(rows, cols, vec![GridCell::Valid(0.0)]);
        assert_eq!(
            result,
            Err(ValuationError::DimensionMismatch {
                what: "sensitivity grid cells",
                expected: 4,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_accessors() {
        let grid = grid();
        assert_eq!(grid.shape(), (3, 2));
        assert_eq!(grid.value(0, 1), Some(21.0));
        assert_eq!(grid.value(1, 0), None);
        assert!(grid.get(3, 0).is_none());
        assert!(grid.get(0, 2).is_none());
        assert_eq!(grid.row(2).unwrap().len(), 2);
        assert!(grid.row(3).is_none());
        assert_eq!(grid.valid_count(), 5);
        assert_eq!(grid.invalid_count(), 1);
    }

    #[test]
    fn test_summary_accessors_skip_invalid() {
        let grid = grid();
        assert_eq!(grid.min(), Some(11.0));
        assert_eq!(grid.max(), Some(23.0));
        assert_eq!(grid.range(), Some(12.0));
        assert_eq!(grid.center(), Some(&GridCell::Valid(22.0)));
    }

    #[test]
    fn test_iter_coordinates() {
        let grid = grid();
        let coords: Vec<(f64, f64)> = grid.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(coords[0], (1.0, 10.0));
        assert_eq!(coords[3], (2.0, 20.0));
        assert_eq!(coords[5], (3.0, 20.0));
    }

    #[test]
    fn test_linspace() {
        let axis = Axis::linspace("wacc", 0.07, 0.11, 5);
        assert_eq!(axis.len(), 5);
        assert!((axis.values[0] - 0.07).abs() < 1e-12);
        assert!((axis.values[2] - 0.09).abs() < 1e-12);
        assert!((axis.values[4] - 0.11).abs() < 1e-12);
        assert_eq!(Axis::linspace("x", 3.0, 9.0, 1).values, vec![3.0]);
    }
}
