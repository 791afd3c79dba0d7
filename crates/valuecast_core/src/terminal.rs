//! Terminal value engine
//!
//! Values everything beyond the explicit horizon with one of three methods and
//! checks how much of the total the perpetuity accounts for.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};
use crate::primitives::{discount_factor, perpetuity_spread, stable_reinvestment_rate};

/// Share of total value above which a valuation is flagged as dominated by
/// the terminal value
pub const DEFAULT_TERMINAL_SHARE_THRESHOLD: f64 = 0.80;

/// How the terminal value is computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TerminalValueMethod {
    /// `CF * (1 + g) / (r - g)`
    GordonGrowth {
        stable_growth: f64,
        discount_rate: f64,
    },
    /// `metric * multiple`, e.g. terminal EBITDA times EV/EBITDA
    ExitMultiple { terminal_metric: f64, multiple: f64 },
    /// Gordon growth on the after-tax operating income net of the
    /// reinvestment needed to sustain `stable_growth`
    GordonWithReinvestment {
        stable_growth: f64,
        return_on_invested_capital: f64,
        discount_rate: f64,
    },
}

/// Whether growth in the terminal phase adds value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueCreation {
    /// ROIC above the discount rate
    Creates,
    /// ROIC below the discount rate
    Destroys,
    /// ROIC equal to the discount rate
    Neutral,
}

impl ValueCreation {
    fn classify(roic: f64, discount_rate: f64) -> Self {
        if roic > discount_rate {
            ValueCreation::Creates
        } else if roic < discount_rate {
            ValueCreation::Destroys
        } else {
            ValueCreation::Neutral
        }
    }

    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            ValueCreation::Creates => "growth creates value (ROIC > discount rate)",
            ValueCreation::Destroys => "growth destroys value (ROIC < discount rate)",
            ValueCreation::Neutral => "growth is value-neutral (ROIC = discount rate)",
        }
    }
}

/// Informational output of the reinvestment variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReinvestmentDiagnostics {
    /// `g / ROIC`, not clamped
    pub implied_reinvestment_rate: f64,
    pub value_creation: ValueCreation,
}

impl TerminalValueMethod {
    /// Terminal value at the end of the explicit horizon.
    ///
    /// `last_cash_flow` is the final projected flow, or the final after-tax
    /// operating income for the reinvestment variant. Exit multiples ignore it.
    pub fn compute(&self, last_cash_flow: f64) -> Result<f64> {
        match *self {
            TerminalValueMethod::GordonGrowth {
                stable_growth,
                discount_rate,
            } => {
                let spread = perpetuity_spread(discount_rate, stable_growth)?;
                Ok(last_cash_flow * (1.0 + stable_growth) / spread)
            }
            TerminalValueMethod::ExitMultiple {
                terminal_metric,
                multiple,
            } => {
                if terminal_metric <= 0.0 {
                    return Err(ValuationError::Infeasible {
                        name: "terminal_metric",
                        value: terminal_metric,
                        reason: "must be positive",
                    });
                }
                if multiple <= 0.0 {
                    return Err(ValuationError::Infeasible {
                        name: "multiple",
                        value: multiple,
                        reason: "must be positive",
                    });
                }
                Ok(terminal_metric * multiple)
            }
            TerminalValueMethod::GordonWithReinvestment {
                stable_growth,
                return_on_invested_capital,
                discount_rate,
            } => {
                let rir = stable_reinvestment_rate(stable_growth, return_on_invested_capital)?;
                let spread = perpetuity_spread(discount_rate, stable_growth)?;
                let terminal_flow = last_cash_flow * (1.0 + stable_growth) * (1.0 - rir);
                Ok(terminal_flow / spread)
            }
        }
    }

    /// Implied reinvestment rate and value-creation verdict.
    ///
    /// `None` for methods without a reinvestment assumption or when ROIC is
    /// not positive.
    #[must_use]
    pub fn diagnostics(&self) -> Option<ReinvestmentDiagnostics> {
        let TerminalValueMethod::GordonWithReinvestment {
            stable_growth,
            return_on_invested_capital,
            discount_rate,
        } = *self
        else {
            return None;
        };
        let rir = stable_reinvestment_rate(stable_growth, return_on_invested_capital).ok()?;
        Some(ReinvestmentDiagnostics {
            implied_reinvestment_rate: rir,
            value_creation: ValueCreation::classify(return_on_invested_capital, discount_rate),
        })
    }

    /// Perpetual growth rate assumed by the method, if any
    #[must_use]
    pub fn growth_rate(&self) -> Option<f64> {
        match *self {
            TerminalValueMethod::GordonGrowth { stable_growth, .. }
            | TerminalValueMethod::GordonWithReinvestment { stable_growth, .. } => {
                Some(stable_growth)
            }
            TerminalValueMethod::ExitMultiple { .. } => None,
        }
    }

    /// Discount rate carried by the method, if any
    #[must_use]
    pub fn discount_rate(&self) -> Option<f64> {
        match *self {
            TerminalValueMethod::GordonGrowth { discount_rate, .. }
            | TerminalValueMethod::GordonWithReinvestment { discount_rate, .. } => {
                Some(discount_rate)
            }
            TerminalValueMethod::ExitMultiple { .. } => None,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            TerminalValueMethod::GordonGrowth { .. } => "Gordon growth",
            TerminalValueMethod::ExitMultiple { .. } => "Exit multiple",
            TerminalValueMethod::GordonWithReinvestment { .. } => "Gordon growth with reinvestment",
        }
    }
}

/// Terminal value attached to a projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TerminalValue {
    pub method: TerminalValueMethod,
    /// Undiscounted, as of the end of the horizon
    pub value: f64,
    /// Discounted to period 0
    pub present_value: f64,
    pub growth_rate: Option<f64>,
    pub discount_rate: f64,
    pub diagnostics: Option<ReinvestmentDiagnostics>,
}

/// Discount a terminal value from the end of an `horizon`-period projection
#[must_use]
pub fn discount_terminal_value(terminal_value: f64, discount_rate: f64, horizon: u32) -> f64 {
    terminal_value * discount_factor(discount_rate, horizon)
}

/// Outcome of the terminal-share sanity check
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TerminalValueCheck {
    /// `TV_PV / (sum of period PVs + TV_PV)`
    pub share: f64,
    pub threshold: f64,
    pub acceptable: bool,
}

/// Flag valuations where the discounted terminal value exceeds `threshold`
/// of the total. Never fails; emits a warning when the share is too high.
#[must_use]
pub fn check_terminal_share(
    sum_of_period_pvs: f64,
    terminal_pv: f64,
    threshold: f64,
) -> TerminalValueCheck {
    let total = sum_of_period_pvs + terminal_pv;
    if total == 0.0 {
        return TerminalValueCheck {
            share: 0.0,
            threshold,
            acceptable: false,
        };
    }

    let share = terminal_pv / total;
    let acceptable = share <= threshold;
    if !acceptable {
        tracing::warn!(
            share,
            threshold,
            "terminal value dominates the valuation, result is driven by perpetuity assumptions"
        );
    }

    TerminalValueCheck {
        share,
        threshold,
        acceptable,
    }
}
