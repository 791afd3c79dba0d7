//! Shared financial primitives
//!
//! Closed-form helpers used by the projection, terminal value and DCF
//! modules: discounting, compounding, perpetuity growth and the cash-flow
//! identities that turn fundamentals into a base free cash flow.

use crate::error::{Result, ValuationError};

/// Denominators smaller than this are treated as zero
pub const DENOMINATOR_EPSILON: f64 = 1e-12;

fn check_rate(name: &'static str, rate: f64) -> Result<()> {
    if !rate.is_finite() || rate <= -1.0 {
        return Err(ValuationError::Infeasible {
            name,
            value: rate,
            reason: "rate must be finite and greater than -1",
        });
    }
    Ok(())
}

/// Discount factor `1 / (1 + rate)^period`
#[must_use]
#[inline]
pub fn discount_factor(rate: f64, period: u32) -> f64 {
    (1.0 + rate).powi(period as i32).recip()
}

/// Present value of an amount received `periods` from now
pub fn present_value(future_value: f64, rate: f64, periods: u32) -> Result<f64> {
    check_rate("discount_rate", rate)?;
    Ok(future_value * discount_factor(rate, periods))
}

/// Future value of an amount compounded for `periods`
pub fn future_value(present_value: f64, rate: f64, periods: u32) -> Result<f64> {
    check_rate("rate", rate)?;
    Ok(present_value * (1.0 + rate).powi(periods as i32))
}

/// Net present value of a cash-flow series.
///
/// The first element is the flow at time 0 and is not discounted.
pub fn net_present_value(rate: f64, cash_flows: &[f64]) -> Result<f64> {
    if cash_flows.is_empty() {
        return Err(ValuationError::EmptyInput("cash flow series"));
    }
    check_rate("discount_rate", rate)?;
    Ok(cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf * discount_factor(rate, t as u32))
        .sum())
}

/// Compound annual growth rate between two positive values
pub fn cagr(initial_value: f64, final_value: f64, years: u32) -> Result<f64> {
    if initial_value <= 0.0 {
        return Err(ValuationError::InvalidParameter {
            name: "initial_value",
            value: initial_value,
            reason: "must be positive",
        });
    }
    if final_value <= 0.0 {
        return Err(ValuationError::InvalidParameter {
            name: "final_value",
            value: final_value,
            reason: "must be positive",
        });
    }
    if years == 0 {
        return Err(ValuationError::InvalidParameter {
            name: "years",
            value: 0.0,
            reason: "must be positive",
        });
    }
    Ok((final_value / initial_value).powf(1.0 / f64::from(years)) - 1.0)
}

/// Apply a sequence of per-period growth rates to a starting value
#[must_use]
pub fn compound_growth(value: f64, rates: &[f64]) -> f64 {
    rates.iter().fold(value, |acc, g| acc * (1.0 + g))
}

/// Gordon growth perpetuity: `cash_flow * (1 + g) / (r - g)`
pub fn gordon_growth(cash_flow: f64, discount_rate: f64, growth_rate: f64) -> Result<f64> {
    Ok(cash_flow * (1.0 + growth_rate) / perpetuity_spread(discount_rate, growth_rate)?)
}

/// Checked `r - g` denominator shared by every perpetuity formula
pub(crate) fn perpetuity_spread(discount_rate: f64, growth_rate: f64) -> Result<f64> {
    if growth_rate >= discount_rate {
        return Err(ValuationError::DiscountGrowthInversion {
            growth_rate,
            discount_rate,
        });
    }
    let spread = discount_rate - growth_rate;
    if spread.abs() < DENOMINATOR_EPSILON {
        return Err(ValuationError::NumericDegeneracy {
            denominator: spread,
        });
    }
    Ok(spread)
}

/// Fundamental growth: reinvestment rate times return on invested capital
#[must_use]
#[inline]
pub fn fundamental_growth(reinvestment_rate: f64, roic: f64) -> f64 {
    reinvestment_rate * roic
}

/// Share of after-tax operating income reinvested in the business.
///
/// `(capex - depreciation + delta_wc) / after_tax_ebit`
pub fn reinvestment_rate(
    capex: f64,
    depreciation: f64,
    delta_working_capital: f64,
    after_tax_ebit: f64,
) -> Result<f64> {
    if after_tax_ebit <= 0.0 {
        return Err(ValuationError::Infeasible {
            name: "after_tax_ebit",
            value: after_tax_ebit,
            reason: "must be positive to compute a reinvestment rate",
        });
    }
    Ok((capex - depreciation + delta_working_capital) / after_tax_ebit)
}

/// Reinvestment rate consistent with stable growth: `g / ROIC`.
///
/// Not bounded above; `g` close to ROIC gives a rate close to 1.
pub fn stable_reinvestment_rate(stable_growth: f64, roic: f64) -> Result<f64> {
    if roic <= 0.0 {
        return Err(ValuationError::Infeasible {
            name: "return_on_invested_capital",
            value: roic,
            reason: "must be positive",
        });
    }
    Ok(stable_growth / roic)
}

/// Free cash flow to the firm: `EBIT(1 - t) + D&A - capex - delta WC`
#[must_use]
pub fn fcff(
    ebit: f64,
    tax_rate: f64,
    capex: f64,
    depreciation: f64,
    delta_working_capital: f64,
) -> f64 {
    ebit * (1.0 - tax_rate) + depreciation - capex - delta_working_capital
}

/// Free cash flow to equity from net income.
///
/// `net_debt_repayment` is positive when the firm repays more than it borrows.
#[must_use]
pub fn fcfe(
    net_income: f64,
    depreciation: f64,
    capex: f64,
    delta_working_capital: f64,
    net_debt_repayment: f64,
) -> f64 {
    net_income + depreciation - capex - delta_working_capital - net_debt_repayment
}

/// Free cash flow to equity derived from FCFF: `FCFF - interest(1 - t) + net new debt`
#[must_use]
pub fn fcfe_from_fcff(fcff: f64, interest: f64, tax_rate: f64, net_new_debt: f64) -> f64 {
    fcff - interest * (1.0 - tax_rate) + net_new_debt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_and_future_value() {
        let pv = present_value(1_100.0, 0.10, 1).unwrap();
        assert!((pv - 1_000.0).abs() < 1e-9);

        let fv = future_value(1_000.0, 0.05, 2).unwrap();
        assert!((fv - 1_102.5).abs() < 1e-9);

        assert!(present_value(100.0, -1.0, 3).is_err());
    }

    #[test]
    fn test_net_present_value() {
        let npv = net_present_value(0.10, &[-100.0, 60.0, 60.0]).unwrap();
        let expected = -100.0 + 60.0 / 1.1 + 60.0 / 1.21;
        assert!((npv - expected).abs() < 1e-9);

        assert_eq!(
            net_present_value(0.1, &[]),
            Err(ValuationError::EmptyInput("cash flow series"))
        );
    }

    #[test]
    fn test_cagr() {
        let rate = cagr(100.0, 121.0, 2).unwrap();
        assert!((rate - 0.10).abs() < 1e-12);
        assert!(cagr(0.0, 121.0, 2).is_err());
        assert!(cagr(100.0, 121.0, 0).is_err());
    }

    #[test]
    fn test_compound_growth() {
        let value = compound_growth(100.0, &[0.10, 0.10]);
        assert!((value - 121.0).abs() < 1e-9);
        assert_eq!(compound_growth(50.0, &[]), 50.0);
    }

    #[test]
    fn test_gordon_growth_reference_value() {
        let tv = gordon_growth(100.0, 0.10, 0.03).unwrap();
        assert!((tv - 1471.428_571_428_571).abs() < 1e-6);
    }

    #[test]
    fn test_gordon_growth_rejects_inversion() {
        assert!(matches!(
            gordon_growth(100.0, 0.10, 0.10),
            Err(ValuationError::DiscountGrowthInversion { .. })
        ));
        assert!(matches!(
            gordon_growth(100.0, 0.10, 0.12),
            Err(ValuationError::DiscountGrowthInversion { .. })
        ));
    }

    #[test]
    fn test_gordon_growth_rejects_degenerate_spread() {
        let r = 0.10;
        let g = r - 1e-14;
        assert!(matches!(
            gordon_growth(100.0, r, g),
            Err(ValuationError::NumericDegeneracy { .. })
        ));
    }

    #[test]
    fn test_reinvestment_helpers() {
        let rir = reinvestment_rate(120.0, 40.0, 20.0, 200.0).unwrap();
        assert!((rir - 0.5).abs() < 1e-12);
        assert!(reinvestment_rate(1.0, 1.0, 1.0, 0.0).is_err());

        let stable = stable_reinvestment_rate(0.03, 0.12).unwrap();
        assert!((stable - 0.25).abs() < 1e-12);
        assert!(stable_reinvestment_rate(0.03, 0.0).is_err());

        assert!((fundamental_growth(0.5, 0.15) - 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_cash_flow_identities() {
        let firm = fcff(200.0, 0.25, 60.0, 40.0, 10.0);
        assert!((firm - 120.0).abs() < 1e-9);

        let equity = fcfe(100.0, 40.0, 60.0, 10.0, 5.0);
        assert!((equity - 65.0).abs() < 1e-9);

        let bridged = fcfe_from_fcff(120.0, 20.0, 0.25, 10.0);
        assert!((bridged - 115.0).abs() < 1e-9);
    }
}
