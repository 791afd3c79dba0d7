//! Deterministic two-parameter sensitivity analysis
//!
//! Sweeps a valuation closure over two axes and stores one [`GridCell`] per
//! combination. Infeasible combinations are recorded, never propagated.

mod engine;
mod grid;
pub mod presets;

pub use engine::{sweep, sweep_labeled};
pub use grid::{Axis, GridCell, SensitivityGrid};
pub use presets::{GrowthFade, RevenueModel, revenue_growth_vs_margin, wacc_vs_terminal_growth};
