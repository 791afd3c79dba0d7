//! Valuation configuration
//!
//! `ValuationConfig` is the serializable description of one company's
//! valuation: the base DCF inputs, the equity bridge and the optional
//! sensitivity, Monte Carlo and scenario sections. It also knows how to run
//! each analysis against its own base case.
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
//!     .high_growth(0.12)
//!     .stable_growth(0.025)
//!     .bridge(3_000.0, 500.0)
//!     .current_price(42.0)
//!     .monte_carlo_draws(5_000)
//!     .seed(7)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::dcf::{DcfInputs, DcfValuation, EquityBridge, TerminalSpec, run_dcf};
use crate::error::{Result, ValuationError};
use crate::monte_carlo::{
    MonteCarloConfig, ParameterSet, SimulationResult, default_dcf_parameters,
    simulate_with_config,
};
use crate::scenario::{ScenarioAnalysis, ScenarioDefinition};
use crate::sensitivity::presets::{DEFAULT_TERMINAL_GROWTH_AXIS, DEFAULT_WACC_AXIS};
use crate::sensitivity::{Axis, SensitivityGrid, sweep_labeled};
use crate::terminal::DEFAULT_TERMINAL_SHARE_THRESHOLD;

pub mod builder;

pub use builder::ValuationBuilder;

/// Names a Monte Carlo draw or a scenario may override on the base inputs
pub const OVERRIDABLE_PARAMETERS: [&str; 7] = [
    "base_cash_flow",
    "discount_rate",
    "exit_multiple",
    "high_growth",
    "roic",
    "stable_growth",
    "wacc",
];

/// Axes of the discount rate by stable growth table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    #[serde(default = "default_discount_rates")]
    pub discount_rates: Vec<f64>,
    #[serde(default = "default_growth_rates")]
    pub growth_rates: Vec<f64>,
}

fn default_discount_rates() -> Vec<f64> {
    DEFAULT_WACC_AXIS.to_vec()
}

fn default_growth_rates() -> Vec<f64> {
    DEFAULT_TERMINAL_GROWTH_AXIS.to_vec()
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            discount_rates: default_discount_rates(),
            growth_rates: default_growth_rates(),
        }
    }
}

/// Full description of one valuation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    #[serde(default)]
    pub company: String,
    pub dcf: DcfInputs,
    /// Without a bridge every analysis reports total value instead of value
    /// per share
    #[serde(default)]
    pub bridge: Option<EquityBridge>,
    #[serde(default)]
    pub sensitivity: Option<SensitivityConfig>,
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloConfig>,
    #[serde(default)]
    pub scenarios: Option<Vec<ScenarioDefinition>>,
    #[serde(default = "default_terminal_share_threshold")]
    pub terminal_share_threshold: f64,
}

fn default_terminal_share_threshold() -> f64 {
    DEFAULT_TERMINAL_SHARE_THRESHOLD
}

impl ValuationConfig {
    #[must_use]
    pub fn new(dcf: DcfInputs) -> Self {
        Self {
            company: String::new(),
            dcf,
            bridge: None,
            sensitivity: None,
            monte_carlo: None,
            scenarios: None,
            terminal_share_threshold: DEFAULT_TERMINAL_SHARE_THRESHOLD,
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Structural checks that do not depend on the projection succeeding
    pub fn validate(&self) -> Result<()> {
        let base = self.dcf.base_cash_flow;
        if base <= 0.0 || !base.is_finite() {
            return Err(ValuationError::InvalidParameter {
                name: "base_cash_flow",
                value: base,
                reason: "must be positive and finite",
            });
        }
        if self.dcf.discount_rate <= -1.0 || !self.dcf.discount_rate.is_finite() {
            return Err(ValuationError::InvalidParameter {
                name: "discount_rate",
                value: self.dcf.discount_rate,
                reason: "must be finite and greater than -100%",
            });
        }
        self.dcf.schedule()?;

        let threshold = self.terminal_share_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ValuationError::InvalidParameter {
                name: "terminal_share_threshold",
                value: threshold,
                reason: "must be in (0, 1]",
            });
        }

        if let Some(bridge) = &self.bridge
            && bridge.shares_outstanding <= 0.0
        {
            return Err(ValuationError::InvalidParameter {
                name: "shares_outstanding",
                value: bridge.shares_outstanding,
                reason: "must be positive",
            });
        }

        if let Some(sensitivity) = &self.sensitivity {
            if sensitivity.discount_rates.is_empty() {
                return Err(ValuationError::EmptyAxis("discount rate"));
            }
            if sensitivity.growth_rates.is_empty() {
                return Err(ValuationError::EmptyAxis("growth rate"));
            }
        }

        if let Some(mc) = &self.monte_carlo {
            if mc.draws == 0 {
                return Err(ValuationError::InvalidParameter {
                    name: "draws",
                    value: 0.0,
                    reason: "must be at least 1",
                });
            }
            for spec in &mc.parameters {
                spec.validate()?;
                self.check_override(&spec.name)?;
            }
        }

        if let Some(scenarios) = &self.scenarios {
            for scenario in scenarios {
                if !(0.0..=1.0).contains(&scenario.probability) {
                    return Err(ValuationError::InvalidParameter {
                        name: "probability",
                        value: scenario.probability,
                        reason: "must be between 0 and 1",
                    });
                }
                for name in scenario.parameters.keys() {
                    self.check_override(name)?;
                }
            }
        }

        Ok(())
    }

    // =========================================================================
    // Valuation
    // =========================================================================

    /// Base case DCF with the terminal-share check
    pub fn run_dcf(&self) -> Result<DcfValuation> {
        run_dcf(&self.dcf, self.terminal_share_threshold)
    }

    /// Value per share when a bridge is configured, total value otherwise
    pub fn value_of(&self, inputs: &DcfInputs) -> Result<f64> {
        let total = inputs.total_value()?;
        match &self.bridge {
            Some(bridge) => bridge.value_per_share(inputs.flow_kind, total),
            None => Ok(total),
        }
    }

    /// Copy of the base inputs with named values replaced.
    ///
    /// `wacc` is an alias of `discount_rate`. `roic` switches the terminal
    /// value to the reinvestment variant; `exit_multiple` needs an exit
    /// multiple terminal to act on.
    pub fn with_overrides(&self, params: &ParameterSet<'_>) -> Result<DcfInputs> {
        let mut inputs = self.dcf.clone();
        for (name, value) in params.iter() {
            match name {
                "wacc" | "discount_rate" => inputs.discount_rate = value,
                "high_growth" => inputs.high_growth = value,
                "stable_growth" => inputs.stable_growth = value,
                "base_cash_flow" => inputs.base_cash_flow = value,
                "roic" => inputs.terminal = TerminalSpec::Reinvestment { roic: value },
                "exit_multiple" => match inputs.terminal {
                    TerminalSpec::ExitMultiple { metric, .. } => {
                        inputs.terminal = TerminalSpec::ExitMultiple {
                            multiple: value,
                            metric,
                        };
                    }
                    _ => {
                        return Err(ValuationError::InvalidParameter {
                            name: "exit_multiple",
                            value,
                            reason: "terminal value is not an exit multiple",
                        });
                    }
                },
                other => return Err(ValuationError::UnknownParameter(other.to_string())),
            }
        }
        Ok(inputs)
    }

    /// Whether `name` can be overridden on these inputs
    fn check_override(&self, name: &str) -> Result<()> {
        if !OVERRIDABLE_PARAMETERS.contains(&name) {
            return Err(ValuationError::UnknownParameter(name.to_string()));
        }
        let exit_multiple_terminal = matches!(self.dcf.terminal, TerminalSpec::ExitMultiple { .. });
        if name == "exit_multiple" && !exit_multiple_terminal {
            return Err(ValuationError::InvalidParameter {
                name: "exit_multiple",
                value: f64::NAN,
                reason: "terminal value is not an exit multiple",
            });
        }
        Ok(())
    }

    // =========================================================================
    // Analyses
    // =========================================================================

    /// Discount rate rows by stable growth columns around the base inputs
    pub fn run_sensitivity(&self) -> Result<SensitivityGrid> {
        let section = self.sensitivity.clone().unwrap_or_default();
        let rows = Axis::new("Discount Rate", section.discount_rates);
        let columns = Axis::new("Stable Growth", section.growth_rates);

        sweep_labeled(
            |discount_rate, stable_growth| {
                let mut inputs = self.dcf.clone();
                inputs.discount_rate = discount_rate;
                inputs.stable_growth = stable_growth;
                self.value_of(&inputs)
            },
            rows,
            columns,
        )
    }

    /// Monte Carlo over the configured parameters, or the default DCF
    /// assumptions when none are listed. `draws` and `seed` override the
    /// configured values.
    pub fn run_monte_carlo(
        &self,
        draws: Option<usize>,
        seed: Option<u64>,
    ) -> Result<SimulationResult> {
        let mut mc = self.monte_carlo.clone().unwrap_or_default();
        if let Some(draws) = draws {
            mc.draws = draws;
        }
        if seed.is_some() {
            mc.seed = seed;
        }
        if mc.parameters.is_empty() {
            mc.parameters = default_dcf_parameters();
        }
        for spec in &mc.parameters {
            self.check_override(&spec.name)?;
        }

        simulate_with_config(&mc, |params| self.value_of(&self.with_overrides(params)?))
    }

    /// Configured scenarios, or the standard best/base/worst set around the
    /// base case value when none are listed
    pub fn run_scenarios(&self) -> Result<ScenarioAnalysis> {
        match &self.scenarios {
            Some(definitions) if !definitions.is_empty() => ScenarioAnalysis::evaluate(
                |params| self.value_of(&self.with_overrides(params)?),
                definitions,
            ),
            _ => ScenarioAnalysis::standard_default(self.value_of(&self.dcf)?),
        }
    }
}
