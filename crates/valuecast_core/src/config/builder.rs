//! Valuation Builder
//!
//! Fluent construction of a [`ValuationConfig`]; `build()` runs
//! [`ValuationConfig::validate`] before handing the config back.
//!
//! # Example
//!
//! ```ignore
//! use valuecast_core::config::ValuationBuilder;
//! use valuecast_core::monte_carlo::StochasticParameterSpec;
//!
//! let config = ValuationBuilder::new()
//!     .company("Acme Corp")
//!     .base_cash_flow(1_200.0)
//!     .discount_rate(0.09)
//!     .phases(5, 5)
//!     .reinvestment_terminal(0.12)
//!
//!     // Equity bridge
//!     .bridge(3_000.0, 500.0)
//!     .current_price(42.0)
//!
//!     // Analyses
//!     .sensitivity_axes(vec![0.08, 0.09, 0.10], vec![0.02, 0.025, 0.03])
//!     .stochastic(StochasticParameterSpec::normal("wacc", 0.09, 0.01)?)
//!     .stochastic(StochasticParameterSpec::normal("high_growth", 0.12, 0.03)?)
//!     .correlate("wacc", "high_growth", -0.3)
//!     .scenario("Recession", 0.3, [("wacc", 0.11)])
//!     .scenario("Steady", 0.7, [("high_growth", 0.15)])
//!     .build()?;
//! ```

use std::collections::BTreeMap;

use super::{SensitivityConfig, ValuationConfig};
use crate::dcf::{DcfInputs, EquityBridge, Fundamentals, TerminalSpec};
use crate::error::Result;
use crate::monte_carlo::{MonteCarloConfig, StochasticParameterSpec};
use crate::projection::FlowKind;
use crate::scenario::ScenarioDefinition;

/// Builder for [`ValuationConfig`]
pub struct ValuationBuilder {
    config: ValuationConfig,
    // Applied to the bridge during build, whichever order the calls came in
    pending_price: Option<f64>,
}

impl Default for ValuationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationBuilder {
    /// Start from default DCF inputs with no cash flow or discount rate set
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ValuationConfig::new(DcfInputs::new(0.0, 0.0)),
            pending_price: None,
        }
    }

    // =========================================================================
    // Basic Configuration
    // =========================================================================

    #[must_use]
    pub fn company(mut self, name: impl Into<String>) -> Self {
        self.config.company = name.into();
        self
    }

    #[must_use]
    pub fn base_cash_flow(mut self, amount: f64) -> Self {
        self.config.dcf.base_cash_flow = amount;
        self
    }

    #[must_use]
    pub fn flow_kind(mut self, kind: FlowKind) -> Self {
        self.config.dcf.flow_kind = kind;
        self
    }

    /// WACC for FCFF, cost of equity for FCFE
    #[must_use]
    pub fn discount_rate(mut self, rate: f64) -> Self {
        self.config.dcf.discount_rate = rate;
        self
    }

    #[must_use]
    pub fn terminal_share_threshold(mut self, threshold: f64) -> Self {
        self.config.terminal_share_threshold = threshold;
        self
    }

    /// Base cash flow from FCFF and bridge from net debt and share count
    #[must_use]
    pub fn fundamentals(mut self, fundamentals: &Fundamentals) -> Self {
        self.config.dcf.base_cash_flow = fundamentals.base_fcff();
        self.config.dcf.flow_kind = FlowKind::Fcff;
        self.config.bridge = Some(EquityBridge::from_fundamentals(fundamentals));
        self
    }

    // =========================================================================
    // Growth Schedule
    // =========================================================================

    #[must_use]
    pub fn high_growth(mut self, rate: f64) -> Self {
        self.config.dcf.high_growth = rate;
        self
    }

    #[must_use]
    pub fn stable_growth(mut self, rate: f64) -> Self {
        self.config.dcf.stable_growth = rate;
        self
    }

    /// Years of high growth followed by years of linear transition
    #[must_use]
    pub fn phases(mut self, high_growth_years: usize, transition_years: usize) -> Self {
        self.config.dcf.high_growth_years = high_growth_years;
        self.config.dcf.transition_years = transition_years;
        self
    }

    /// High growth for `years`, then straight to the stable rate
    #[must_use]
    pub fn two_stage(self, years: usize) -> Self {
        self.phases(years, 0)
    }

    // =========================================================================
    // Terminal Value
    // =========================================================================

    #[must_use]
    pub fn gordon_terminal(mut self) -> Self {
        self.config.dcf.terminal = TerminalSpec::Gordon;
        self
    }

    #[must_use]
    pub fn exit_multiple(mut self, multiple: f64, metric: f64) -> Self {
        self.config.dcf.terminal = TerminalSpec::ExitMultiple { multiple, metric };
        self
    }

    #[must_use]
    pub fn reinvestment_terminal(mut self, roic: f64) -> Self {
        self.config.dcf.terminal = TerminalSpec::Reinvestment { roic };
        self
    }

    /// After-tax operating income fed to the reinvestment terminal value
    #[must_use]
    pub fn terminal_operating_income(mut self, amount: f64) -> Self {
        self.config.dcf.terminal_operating_income = Some(amount);
        self
    }

    // =========================================================================
    // Equity Bridge
    // =========================================================================

    #[must_use]
    pub fn bridge(mut self, net_debt: f64, shares_outstanding: f64) -> Self {
        self.config.bridge = Some(EquityBridge {
            net_debt,
            shares_outstanding,
            current_price: None,
        });
        self
    }

    /// Market price for the upside figure; ignored without a bridge
    #[must_use]
    pub fn current_price(mut self, price: f64) -> Self {
        self.pending_price = Some(price);
        self
    }

    // =========================================================================
    // Analyses
    // =========================================================================

    #[must_use]
    pub fn sensitivity_axes(mut self, discount_rates: Vec<f64>, growth_rates: Vec<f64>) -> Self {
        self.config.sensitivity = Some(SensitivityConfig {
            discount_rates,
            growth_rates,
        });
        self
    }

    #[must_use]
    pub fn monte_carlo_draws(mut self, draws: usize) -> Self {
        self.monte_carlo().draws = draws;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.monte_carlo().seed = Some(seed);
        self
    }

    /// Add a sampled assumption; its name must be one of
    /// [`super::OVERRIDABLE_PARAMETERS`]
    #[must_use]
    pub fn stochastic(mut self, spec: StochasticParameterSpec) -> Self {
        self.monte_carlo().parameters.push(spec);
        self
    }

    #[must_use]
    pub fn correlate(mut self, first: &str, second: &str, rho: f64) -> Self {
        self.monte_carlo().correlations.insert(first, second, rho);
        self
    }

    #[must_use]
    pub fn scenario<'a>(
        mut self,
        name: impl Into<String>,
        probability: f64,
        parameters: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        let parameters: BTreeMap<String, f64> = parameters
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        self.config
            .scenarios
            .get_or_insert_with(Vec::new)
            .push(ScenarioDefinition {
                name: name.into(),
                probability,
                parameters,
            });
        self
    }

    fn monte_carlo(&mut self) -> &mut MonteCarloConfig {
        self.config
            .monte_carlo
            .get_or_insert_with(MonteCarloConfig::default)
    }

    // =========================================================================
    // Build
    // =========================================================================

    /// Validate and return the config
    pub fn build(mut self) -> Result<ValuationConfig> {
        if let (Some(price), Some(bridge)) = (self.pending_price, self.config.bridge.as_mut()) {
            bridge.current_price = Some(price);
        }
        self.config.validate()?;
        Ok(self.config)
    }
}
