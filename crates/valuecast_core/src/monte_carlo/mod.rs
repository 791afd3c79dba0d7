//! Monte Carlo valuation
//!
//! Samples named assumptions from their marginal distributions, optionally
//! imposes a rank correlation between them, evaluates a valuation closure per
//! draw and summarizes the valid outcomes.
//!
//! Every draw owns a `SmallRng` seeded from `(seed, draw index)`, so a seeded
//! run gives the same result with or without the `parallel` feature.

mod correlation;
mod distribution;
mod engine;
pub mod presets;
mod stats;

pub use correlation::{CorrelationPair, CorrelationSpec, induce_rank_correlation, rank_correlation};
pub use distribution::{Distribution, StochasticParameterSpec};
pub use engine::{
    DEFAULT_DRAWS, MonteCarloConfig, ParameterSet, SimulationResult, draw_seed, simulate,
    simulate_with_config,
};
pub use presets::{default_dcf_parameters, monte_carlo_dcf};
pub use stats::{Histogram, PERCENTILE_LEVELS, Percentiles, SummaryStatistics, percentile};
