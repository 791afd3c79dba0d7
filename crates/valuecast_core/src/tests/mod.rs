//! Integration tests for the valuation engines
//!
//! Tests are organized by topic:
//! - `schedule` - Growth schedule shape and phase boundaries
//! - `terminal_values` - Gordon growth, exit multiple and feasibility checks
//! - `projection` - Period records, determinism and terminal share
//! - `sensitivity` - Grid dimensions and per-cell failure isolation
//! - `monte_carlo` - Reproducibility, statistics ordering and correlation
//! - `config_pipeline` - End-to-end runs driven by `ValuationConfig`

mod projection;
mod schedule;
mod sensitivity;
