//! DCF-specific Monte Carlo run

use super::correlation::CorrelationSpec;
use super::distribution::{Distribution, StochasticParameterSpec};
use super::engine::{ParameterSet, SimulationResult, simulate};
use crate::dcf::EquityBridge;
use crate::error::{Result, ValuationError};
use crate::growth::GrowthSchedule;
use crate::projection::{FlowKind, project};
use crate::terminal::TerminalValueMethod;

pub const WACC: &str = "wacc";
pub const HIGH_GROWTH: &str = "high_growth";
pub const STABLE_GROWTH: &str = "stable_growth";

/// Years of constant high growth before the fade
const HIGH_GROWTH_YEARS: usize = 5;
/// Years over which growth converges to the stable rate
const FADE_YEARS: usize = 5;

/// Default assumptions: WACC ~ N(9%, 1%), high growth ~ N(10%, 3%),
/// stable growth ~ Tri(1.5%, 2.5%, 3.5%)
#[must_use]
pub fn default_dcf_parameters() -> Vec<StochasticParameterSpec> {
    vec![
        StochasticParameterSpec {
            name: WACC.to_string(),
            distribution: Distribution::Normal {
                mean: 0.09,
                std_dev: 0.01,
            },
        },
        StochasticParameterSpec {
            name: HIGH_GROWTH.to_string(),
            distribution: Distribution::Normal {
                mean: 0.10,
                std_dev: 0.03,
            },
        },
        StochasticParameterSpec {
            name: STABLE_GROWTH.to_string(),
            distribution: Distribution::Triangular {
                min: 0.015,
                mode: 0.025,
                max: 0.035,
            },
        },
    ]
}

/// Equity value per share for one draw of the DCF assumptions
pub fn dcf_value_per_share(
    base_fcff: f64,
    bridge: &EquityBridge,
    params: &ParameterSet<'_>,
) -> Result<f64> {
    let wacc = params.get(WACC)?;
    let high = params.get(HIGH_GROWTH)?;
    let stable = params.get(STABLE_GROWTH)?;

    if wacc <= 0.0 {
        return Err(ValuationError::Infeasible {
            name: "wacc",
            value: wacc,
            reason: "must be positive",
        });
    }

    let schedule = GrowthSchedule::build(high, stable, HIGH_GROWTH_YEARS, FADE_YEARS)?;
    let projection = project(base_fcff, &schedule, wacc, FlowKind::Fcff)?.with_terminal(
        TerminalValueMethod::GordonGrowth {
            stable_growth: stable,
            discount_rate: wacc,
        },
    )?;
    bridge.value_per_share(FlowKind::Fcff, projection.total_value())
}

/// Monte Carlo of equity value per share under a 10-year, three-phase DCF.
///
/// `parameters` defaults to [`default_dcf_parameters`]; custom sets must
/// define `wacc`, `high_growth` and `stable_growth`. Draws where WACC does not
/// exceed stable growth are counted as failed.
pub fn monte_carlo_dcf(
    base_fcff: f64,
    bridge: &EquityBridge,
    parameters: Option<&[StochasticParameterSpec]>,
    num_draws: usize,
    seed: Option<u64>,
    correlations: Option<&CorrelationSpec>,
) -> Result<SimulationResult> {
    if bridge.shares_outstanding <= 0.0 {
        return Err(ValuationError::InvalidParameter {
            name: "shares_outstanding",
            value: bridge.shares_outstanding,
            reason: "must be positive",
        });
    }
    if base_fcff <= 0.0 || !base_fcff.is_finite() {
        return Err(ValuationError::InvalidParameter {
            name: "base_fcff",
            value: base_fcff,
            reason: "must be positive and finite",
        });
    }

    let defaults;
    let parameters = match parameters {
        Some(custom) => custom,
        None => {
            defaults = default_dcf_parameters();
            &defaults
        }
    };
    for required in [WACC, HIGH_GROWTH, STABLE_GROWTH] {
        if !parameters.iter().any(|p| p.name == required) {
            return Err(ValuationError::MissingParameter(required.to_string()));
        }
    }

    simulate(
        parameters,
        |params| dcf_value_per_share(base_fcff, bridge, params),
        num_draws,
        seed,
        correlations,
    )
}
