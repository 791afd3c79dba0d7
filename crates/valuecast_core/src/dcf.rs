//! Multi-stage DCF pipeline
//!
//! Ties the growth schedule, projection and terminal value together, then
//! bridges the resulting firm or equity value down to a per-share figure.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};
use crate::growth::GrowthSchedule;
use crate::primitives::fcff;
use crate::projection::{CashFlowProjection, FlowKind, project};
use crate::terminal::{
    DEFAULT_TERMINAL_SHARE_THRESHOLD, TerminalValueCheck, TerminalValueMethod,
};

/// Band around the market price inside which a value is considered fair
pub const FAIR_VALUE_BAND: f64 = 0.10;

/// Terminal method selector, resolved against the projection at run time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum TerminalSpec {
    /// Gordon growth at the schedule's stable rate
    #[default]
    Gordon,
    /// Exit multiple applied to a terminal-year metric such as EBITDA
    ExitMultiple { multiple: f64, metric: f64 },
    /// Gordon growth net of the reinvestment implied by `roic`
    Reinvestment { roic: f64 },
}

/// Inputs of a single DCF run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfInputs {
    pub base_cash_flow: f64,
    #[serde(default)]
    pub flow_kind: FlowKind,
    /// WACC for FCFF, cost of equity for FCFE
    pub discount_rate: f64,
    #[serde(default = "default_high_growth")]
    pub high_growth: f64,
    #[serde(default = "default_stable_growth")]
    pub stable_growth: f64,
    #[serde(default = "default_phase_years")]
    pub high_growth_years: usize,
    /// Zero gives a two-stage schedule
    #[serde(default = "default_phase_years")]
    pub transition_years: usize,
    #[serde(default)]
    pub terminal: TerminalSpec,
    /// Final after-tax operating income for the reinvestment variant.
    /// Defaults to the last projected flow.
    #[serde(default)]
    pub terminal_operating_income: Option<f64>,
}

fn default_high_growth() -> f64 {
    0.15
}

fn default_stable_growth() -> f64 {
    0.025
}

fn default_phase_years() -> usize {
    5
}

impl DcfInputs {
    /// FCFF inputs with the default 5 + 5 year schedule and Gordon terminal value
    #[must_use]
    pub fn new(base_cash_flow: f64, discount_rate: f64) -> Self {
        Self {
            base_cash_flow,
            flow_kind: FlowKind::Fcff,
            discount_rate,
            high_growth: default_high_growth(),
            stable_growth: default_stable_growth(),
            high_growth_years: default_phase_years(),
            transition_years: default_phase_years(),
            terminal: TerminalSpec::Gordon,
            terminal_operating_income: None,
        }
    }

    pub fn schedule(&self) -> Result<GrowthSchedule> {
        if self.transition_years == 0 {
            GrowthSchedule::two_stage(self.high_growth, self.stable_growth, self.high_growth_years)
        } else {
            GrowthSchedule::build(
                self.high_growth,
                self.stable_growth,
                self.high_growth_years,
                self.transition_years,
            )
        }
    }

    fn terminal_method(&self) -> TerminalValueMethod {
        match self.terminal {
            TerminalSpec::Gordon => TerminalValueMethod::GordonGrowth {
                stable_growth: self.stable_growth,
                discount_rate: self.discount_rate,
            },
            TerminalSpec::ExitMultiple { multiple, metric } => TerminalValueMethod::ExitMultiple {
                terminal_metric: metric,
                multiple,
            },
            TerminalSpec::Reinvestment { roic } => TerminalValueMethod::GordonWithReinvestment {
                stable_growth: self.stable_growth,
                return_on_invested_capital: roic,
                discount_rate: self.discount_rate,
            },
        }
    }
}

/// Result of [`run_dcf`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcfValuation {
    pub schedule: GrowthSchedule,
    pub projection: CashFlowProjection,
    pub check: TerminalValueCheck,
}

impl DcfInputs {
    /// Schedule and projection with the terminal value attached, without the
    /// terminal-share check. Used where many runs would repeat its warning.
    pub fn project(&self) -> Result<(GrowthSchedule, CashFlowProjection)> {
        let schedule = self.schedule()?;
        let projection = project(
            self.base_cash_flow,
            &schedule,
            self.discount_rate,
            self.flow_kind,
        )?;

        let method = self.terminal_method();
        let projection = match (self.terminal, self.terminal_operating_income) {
            (TerminalSpec::Reinvestment { .. }, Some(income)) => {
                projection.with_terminal_from(method, income)?
            }
            _ => projection.with_terminal(method)?,
        };
        Ok((schedule, projection))
    }

    /// Total discounted value (firm value for FCFF, equity for FCFE)
    pub fn total_value(&self) -> Result<f64> {
        Ok(self.project()?.1.total_value())
    }
}

/// Run the full pipeline: schedule, projection, terminal value, share check
pub fn run_dcf(inputs: &DcfInputs, terminal_share_threshold: f64) -> Result<DcfValuation> {
    let (schedule, projection) = inputs.project()?;

    let check = projection
        .check_terminal_share(terminal_share_threshold)
        .ok_or(ValuationError::EmptyInput("terminal value"))?;

    tracing::debug!(
        kind = inputs.flow_kind.label(),
        periods = projection.horizon(),
        total = projection.total_value(),
        "DCF complete"
    );

    Ok(DcfValuation {
        schedule,
        projection,
        check,
    })
}

/// [`run_dcf`] with the default terminal-share threshold
pub fn run_dcf_default(inputs: &DcfInputs) -> Result<DcfValuation> {
    run_dcf(inputs, DEFAULT_TERMINAL_SHARE_THRESHOLD)
}

/// Firm-to-equity bridge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityBridge {
    /// Total debt minus cash
    pub net_debt: f64,
    pub shares_outstanding: f64,
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl EquityBridge {
    #[must_use]
    pub fn from_fundamentals(fundamentals: &Fundamentals) -> Self {
        Self {
            net_debt: fundamentals.net_debt(),
            shares_outstanding: fundamentals.shares_outstanding,
            current_price: None,
        }
    }

    /// Equity value from a projection total; net debt applies only to FCFF
    #[must_use]
    pub fn equity_value(&self, kind: FlowKind, total_value: f64) -> f64 {
        match kind {
            FlowKind::Fcff => total_value - self.net_debt,
            FlowKind::Fcfe => total_value,
        }
    }

    pub fn value_per_share(&self, kind: FlowKind, total_value: f64) -> Result<f64> {
        if self.shares_outstanding <= 0.0 {
            return Err(ValuationError::Infeasible {
                name: "shares_outstanding",
                value: self.shares_outstanding,
                reason: "must be positive",
            });
        }
        Ok(self.equity_value(kind, total_value) / self.shares_outstanding)
    }
}

/// Market verdict from the upside against the current price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceVerdict {
    Undervalued,
    FairValue,
    Overvalued,
}

impl PriceVerdict {
    #[must_use]
    pub fn from_upside(upside: f64) -> Self {
        if upside > FAIR_VALUE_BAND {
            PriceVerdict::Undervalued
        } else if upside < -FAIR_VALUE_BAND {
            PriceVerdict::Overvalued
        } else {
            PriceVerdict::FairValue
        }
    }
}

/// Equity value and per-share figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityValue {
    /// Firm value for FCFF projections, equity value for FCFE
    pub total_value: f64,
    pub equity_value: f64,
    pub value_per_share: f64,
    /// `(value - price) / price` when a positive price is known
    pub upside: Option<f64>,
    pub verdict: Option<PriceVerdict>,
}

impl DcfValuation {
    /// Sum of discounted periods and terminal value
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.projection.total_value()
    }

    /// Bridge to equity. Net debt is subtracted only for FCFF projections.
    pub fn equity(&self, bridge: &EquityBridge) -> Result<EquityValue> {
        let kind = self.projection.kind();
        let total_value = self.total_value();
        let value_per_share = bridge.value_per_share(kind, total_value)?;
        let equity_value = bridge.equity_value(kind, total_value);
        if equity_value < 0.0 {
            tracing::warn!(
                equity_value,
                net_debt = bridge.net_debt,
                "net debt exceeds firm value, equity value is negative"
            );
        }

        let upside = bridge
            .current_price
            .filter(|&price| price > 0.0)
            .map(|price| (value_per_share - price) / price);

        Ok(EquityValue {
            total_value,
            equity_value,
            value_per_share,
            upside,
            verdict: upside.map(PriceVerdict::from_upside),
        })
    }
}

/// Plain numeric record supplied by an upstream fundamentals provider
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Fundamentals {
    pub revenue: f64,
    pub operating_income: f64,
    pub tax_rate: f64,
    pub total_debt: f64,
    pub cash: f64,
    pub shares_outstanding: f64,
    #[serde(default)]
    pub capex: f64,
    #[serde(default)]
    pub depreciation: f64,
    #[serde(default)]
    pub delta_working_capital: f64,
}

impl Fundamentals {
    #[must_use]
    pub fn net_debt(&self) -> f64 {
        self.total_debt - self.cash
    }

    #[must_use]
    pub fn after_tax_operating_income(&self) -> f64 {
        self.operating_income * (1.0 - self.tax_rate)
    }

    #[must_use]
    pub fn operating_margin(&self) -> Option<f64> {
        (self.revenue != 0.0).then(|| self.operating_income / self.revenue)
    }

    /// Base-year FCFF from operating income and reinvestment
    #[must_use]
    pub fn base_fcff(&self) -> f64 {
        fcff(
            self.operating_income,
            self.tax_rate,
            self.capex,
            self.depreciation,
            self.delta_working_capital,
        )
    }
}
