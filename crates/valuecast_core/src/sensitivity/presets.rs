//! Ready-made sweeps over common DCF assumptions
//!
//! Both presets report equity value per share.

use serde::{Deserialize, Serialize};

use super::engine::sweep_labeled;
use super::grid::{Axis, SensitivityGrid};
use crate::dcf::EquityBridge;
use crate::error::{Result, ValuationError};
use crate::growth::GrowthSchedule;
use crate::primitives::discount_factor;
use crate::projection::{FlowKind, project};
use crate::terminal::TerminalValueMethod;

pub const DEFAULT_WACC_AXIS: [f64; 7] = [0.07, 0.08, 0.085, 0.09, 0.095, 0.10, 0.11];
pub const DEFAULT_TERMINAL_GROWTH_AXIS: [f64; 5] = [0.015, 0.020, 0.025, 0.030, 0.035];
pub const DEFAULT_REVENUE_GROWTH_AXIS: [f64; 5] = [0.03, 0.05, 0.08, 0.10, 0.15];
pub const DEFAULT_MARGIN_AXIS: [f64; 5] = [0.15, 0.20, 0.25, 0.30, 0.35];

/// Horizon and starting growth for [`wacc_vs_terminal_growth`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthFade {
    pub years: usize,
    /// Growth before the fade; year `t` grows at
    /// `initial - (initial - g) * t / years`
    pub initial_growth: f64,
}

impl Default for GrowthFade {
    fn default() -> Self {
        Self {
            years: 10,
            initial_growth: 0.10,
        }
    }
}

/// Revenue-driven cash flow assumptions for [`revenue_growth_vs_margin`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevenueModel {
    pub base_revenue: f64,
    pub discount_rate: f64,
    pub tax_rate: f64,
    #[serde(default = "default_capex_share")]
    pub capex_share: f64,
    #[serde(default = "default_depreciation_share")]
    pub depreciation_share: f64,
    #[serde(default = "default_revenue_years")]
    pub years: usize,
    #[serde(default = "default_revenue_terminal_growth")]
    pub terminal_growth: f64,
}

fn default_capex_share() -> f64 {
    0.05
}

fn default_depreciation_share() -> f64 {
    0.04
}

fn default_revenue_years() -> usize {
    10
}

fn default_revenue_terminal_growth() -> f64 {
    0.025
}

impl RevenueModel {
    #[must_use]
    pub fn new(base_revenue: f64, discount_rate: f64, tax_rate: f64) -> Self {
        Self {
            base_revenue,
            discount_rate,
            tax_rate,
            capex_share: default_capex_share(),
            depreciation_share: default_depreciation_share(),
            years: default_revenue_years(),
            terminal_growth: default_revenue_terminal_growth(),
        }
    }

    /// Firm value for constant revenue growth and operating margin.
    ///
    /// The terminal value assumes ROIC equal to the discount rate, so terminal
    /// growth is value-neutral.
    pub fn firm_value(&self, revenue_growth: f64, margin: f64) -> Result<f64> {
        let r = self.discount_rate;
        let mut revenue = self.base_revenue;
        let mut value = 0.0;
        for year in 1..=self.years {
            revenue *= 1.0 + revenue_growth;
            let nopat = revenue * margin * (1.0 - self.tax_rate);
            let net_capex = revenue * (self.capex_share - self.depreciation_share);
            value += (nopat - net_capex) * discount_factor(r, year as u32);
        }

        let terminal = TerminalValueMethod::GordonWithReinvestment {
            stable_growth: self.terminal_growth,
            return_on_invested_capital: r,
            discount_rate: r,
        };
        let terminal_nopat = revenue * margin * (1.0 - self.tax_rate);
        let tv = terminal.compute(terminal_nopat)?;
        Ok(value + tv * discount_factor(r, self.years as u32))
    }
}

fn check_bridge(bridge: &EquityBridge) -> Result<()> {
    if bridge.shares_outstanding <= 0.0 {
        return Err(ValuationError::InvalidParameter {
            name: "shares_outstanding",
            value: bridge.shares_outstanding,
            reason: "must be positive",
        });
    }
    Ok(())
}

/// Equity value per share over WACC rows and terminal growth columns.
///
/// Each cell fades growth linearly from `fade.initial_growth` to the column's
/// terminal rate over the horizon and closes with a Gordon terminal value.
/// Empty axis slices fall back to the default axes.
pub fn wacc_vs_terminal_growth(
    base_fcff: f64,
    bridge: &EquityBridge,
    wacc_axis: &[f64],
    growth_axis: &[f64],
    fade: GrowthFade,
) -> Result<SensitivityGrid> {
    check_bridge(bridge)?;
    if fade.years < 1 {
        return Err(ValuationError::InvalidParameter {
            name: "years",
            value: fade.years as f64,
            reason: "must be at least 1",
        });
    }

    let rows = axis_or_default("WACC", wacc_axis, &DEFAULT_WACC_AXIS);
    let columns = axis_or_default("Terminal Growth", growth_axis, &DEFAULT_TERMINAL_GROWTH_AXIS);

    sweep_labeled(
        |wacc, g| {
            let n = fade.years as f64;
            let rates = (1..=fade.years)
                .map(|t| fade.initial_growth - (fade.initial_growth - g) * (t as f64 / n))
                .collect();
            let schedule = GrowthSchedule::from_rates(rates, g)?;
            let projection = project(base_fcff, &schedule, wacc, FlowKind::Fcff)?
                .with_terminal(TerminalValueMethod::GordonGrowth {
                    stable_growth: g,
                    discount_rate: wacc,
                })?;
            bridge.value_per_share(FlowKind::Fcff, projection.total_value())
        },
        rows,
        columns,
    )
}

/// Equity value per share over revenue growth rows and operating margin
/// columns. Empty axis slices fall back to the default axes.
pub fn revenue_growth_vs_margin(
    model: &RevenueModel,
    bridge: &EquityBridge,
    growth_axis: &[f64],
    margin_axis: &[f64],
) -> Result<SensitivityGrid> {
    check_bridge(bridge)?;
    if model.years < 1 {
        return Err(ValuationError::InvalidParameter {
            name: "years",
            value: model.years as f64,
            reason: "must be at least 1",
        });
    }

    let rows = axis_or_default("Revenue Growth", growth_axis, &DEFAULT_REVENUE_GROWTH_AXIS);
    let columns = axis_or_default("Operating Margin", margin_axis, &DEFAULT_MARGIN_AXIS);

    sweep_labeled(
        |growth, margin| bridge.value_per_share(FlowKind::Fcff, model.firm_value(growth, margin)?),
        rows,
        columns,
    )
}

fn axis_or_default(label: &str, values: &[f64], default: &[f64]) -> Axis {
    let values = if values.is_empty() { default } else { values };
    Axis::new(label, values.to_vec())
}
