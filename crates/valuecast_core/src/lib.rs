//! Equity valuation library
//!
//! This crate provides the numeric core of a discounted cash flow toolkit:
//! - Multi-phase growth schedules (high growth, linear transition, stable)
//! - FCFF/FCFE projections with Gordon, exit-multiple and reinvestment-aware
//!   terminal values
//! - Two-dimensional sensitivity grids with per-cell failure isolation
//! - Monte Carlo simulation with rank-correlated inputs and summary statistics
//! - Probability-weighted scenario analysis
//!
//! # Builder DSL
//!
//! ```ignore
//! use valuecast_core::config::ValuationBuilder;
//!
//! let config = ValuationBuilder::new()
//!     .company("Acme Corp")
//!     .base_cash_flow(1_200.0)
//!     .discount_rate(0.09)
//!     .bridge(3_000.0, 500.0)
//!     .build()?;
//!
//! let valuation = config.run_dcf()?;
//! let grid = config.run_sensitivity()?;
//! let simulation = config.run_monte_carlo(Some(10_000), Some(42))?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod dcf;
pub mod error;
pub mod growth;
pub mod primitives;
pub mod projection;
pub mod terminal;

// ============================================================================
// Analysis modules
// ============================================================================

pub mod monte_carlo;
pub mod scenario;
pub mod sensitivity;

// ============================================================================
// Configuration
// ============================================================================

pub mod config;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{ValuationBuilder, ValuationConfig};
pub use dcf::{DcfInputs, DcfValuation, EquityBridge, EquityValue, run_dcf};
pub use error::{ErrorKind, Result, ValuationError};
pub use growth::GrowthSchedule;
pub use monte_carlo::{SimulationResult, StochasticParameterSpec, SummaryStatistics, simulate};
pub use projection::{CashFlowProjection, FlowKind, project};
pub use scenario::ScenarioAnalysis;
pub use sensitivity::{GridCell, SensitivityGrid, sweep};
pub use terminal::TerminalValueMethod;
