//! Explicit-horizon cash-flow projection

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};
use crate::growth::GrowthSchedule;
use crate::primitives::discount_factor;
use crate::terminal::{
    TerminalValue, TerminalValueCheck, TerminalValueMethod, check_terminal_share,
    discount_terminal_value,
};

/// Which free cash flow a projection carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FlowKind {
    /// Free cash flow to the firm, discounted at WACC
    #[default]
    Fcff,
    /// Free cash flow to equity, discounted at the cost of equity
    Fcfe,
}

impl FlowKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            FlowKind::Fcff => "FCFF",
            FlowKind::Fcfe => "FCFE",
        }
    }
}

/// One projected period
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodRecord {
    /// 1-based
    pub period: u32,
    pub kind: FlowKind,
    pub cash_flow: f64,
    /// Growth applied to reach this period's flow
    pub growth_rate: f64,
    pub discount_rate: f64,
    pub present_value: f64,
}

/// Period-by-period projection with an optional terminal value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowProjection {
    kind: FlowKind,
    base_cash_flow: f64,
    discount_rate: f64,
    records: Vec<PeriodRecord>,
    terminal: Option<TerminalValue>,
}

/// Project `base_cash_flow` through `schedule` and discount each period.
///
/// Period `i` carries `base * prod(1 + g_k, k <= i)` and its present value
/// `cf_i / (1 + r)^i`.
pub fn project(
    base_cash_flow: f64,
    schedule: &GrowthSchedule,
    discount_rate: f64,
    kind: FlowKind,
) -> Result<CashFlowProjection> {
    if base_cash_flow <= 0.0 || !base_cash_flow.is_finite() {
        return Err(ValuationError::InvalidParameter {
            name: "base_cash_flow",
            value: base_cash_flow,
            reason: "must be positive and finite",
        });
    }
    if !discount_rate.is_finite() || discount_rate <= -1.0 {
        return Err(ValuationError::Infeasible {
            name: "discount_rate",
            value: discount_rate,
            reason: "rate must be finite and greater than -1",
        });
    }

    let mut records = Vec::with_capacity(schedule.len());
    let mut cash_flow = base_cash_flow;
    for (idx, growth_rate) in schedule.iter().enumerate() {
        let period = idx as u32 + 1;
        cash_flow *= 1.0 + growth_rate;
        records.push(PeriodRecord {
            period,
            kind,
            cash_flow,
            growth_rate,
            discount_rate,
            present_value: cash_flow * discount_factor(discount_rate, period),
        });
    }

    Ok(CashFlowProjection {
        kind,
        base_cash_flow,
        discount_rate,
        records,
        terminal: None,
    })
}

impl CashFlowProjection {
    /// Attach a terminal value computed from the final projected flow
    pub fn with_terminal(self, method: TerminalValueMethod) -> Result<Self> {
        let last = self.last_cash_flow().ok_or(ValuationError::EmptyInput("projection"))?;
        self.with_terminal_from(method, last)
    }

    /// Attach a terminal value computed from an explicit final-period amount,
    /// e.g. after-tax operating income for the reinvestment variant
    pub fn with_terminal_from(mut self, method: TerminalValueMethod, last_amount: f64) -> Result<Self> {
        let value = method.compute(last_amount)?;
        let present_value = discount_terminal_value(value, self.discount_rate, self.horizon());
        self.terminal = Some(TerminalValue {
            method,
            value,
            present_value,
            growth_rate: method.growth_rate(),
            discount_rate: method.discount_rate().unwrap_or(self.discount_rate),
            diagnostics: method.diagnostics(),
        });
        Ok(self)
    }

    #[must_use]
    pub fn records(&self) -> &[PeriodRecord] {
        &self.records
    }

    #[must_use]
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    #[must_use]
    pub fn base_cash_flow(&self) -> f64 {
        self.base_cash_flow
    }

    #[must_use]
    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    /// Number of explicit periods
    #[must_use]
    pub fn horizon(&self) -> u32 {
        self.records.len() as u32
    }

    #[must_use]
    pub fn last_cash_flow(&self) -> Option<f64> {
        self.records.last().map(|r| r.cash_flow)
    }

    #[must_use]
    pub fn terminal(&self) -> Option<&TerminalValue> {
        self.terminal.as_ref()
    }

    #[must_use]
    pub fn sum_of_period_pvs(&self) -> f64 {
        self.records.iter().map(|r| r.present_value).sum()
    }

    /// Period PVs plus the discounted terminal value (zero if none attached)
    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.sum_of_period_pvs() + self.terminal.map_or(0.0, |tv| tv.present_value)
    }

    /// Discounted terminal value as a share of total value
    #[must_use]
    pub fn terminal_value_share(&self) -> Option<f64> {
        let terminal = self.terminal?;
        let total = self.total_value();
        (total != 0.0).then(|| terminal.present_value / total)
    }

    /// Run the terminal-share sanity check; `None` without a terminal value
    #[must_use]
    pub fn check_terminal_share(&self, threshold: f64) -> Option<TerminalValueCheck> {
        let terminal = self.terminal?;
        Some(check_terminal_share(
            self.sum_of_period_pvs(),
            terminal.present_value,
            threshold,
        ))
    }
}
