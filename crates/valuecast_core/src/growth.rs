//! Multi-phase growth schedules
//!
//! A schedule lists one growth rate per explicit projection period. The
//! stable (perpetual) phase is never part of the list; it is carried on the
//! schedule as `stable_growth` and consumed by the terminal value.

use serde::Serialize;

use crate::error::{Result, ValuationError};
use crate::primitives::{cagr, fundamental_growth};

/// Ordered per-period growth rates for the explicit horizon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSchedule {
    rates: Vec<f64>,
    stable_growth: f64,
    high_growth_years: usize,
    transition_years: usize,
}

impl GrowthSchedule {
    /// Three-phase schedule: constant high growth, then a linear glide to
    /// the stable rate.
    ///
    /// The i-th transition period (1-based) gets
    /// `high + (stable - high) * i / transition_years`, so the last element
    /// is the stable rate.
    pub fn build(
        high_growth: f64,
        stable_growth: f64,
        high_growth_years: usize,
        transition_years: usize,
    ) -> Result<Self> {
        if high_growth_years < 1 {
            return Err(ValuationError::InvalidParameter {
                name: "high_growth_years",
                value: high_growth_years as f64,
                reason: "must be at least 1",
            });
        }
        if transition_years < 1 {
            return Err(ValuationError::InvalidParameter {
                name: "transition_years",
                value: transition_years as f64,
                reason: "must be at least 1",
            });
        }

        let mut rates = Vec::with_capacity(high_growth_years + transition_years);
        rates.extend(std::iter::repeat_n(high_growth, high_growth_years));

        let span = stable_growth - high_growth;
        for i in 1..=transition_years {
            let fraction = i as f64 / transition_years as f64;
            rates.push(high_growth + span * fraction);
        }

        Ok(Self {
            rates,
            stable_growth,
            high_growth_years,
            transition_years,
        })
    }

    /// Two-phase schedule: `high_growth_years` periods of constant growth,
    /// with the stable rate applied only from the terminal value onward.
    pub fn two_stage(
        high_growth: f64,
        stable_growth: f64,
        high_growth_years: usize,
    ) -> Result<Self> {
        if high_growth_years < 1 {
            return Err(ValuationError::InvalidParameter {
                name: "high_growth_years",
                value: high_growth_years as f64,
                reason: "must be at least 1",
            });
        }
        Ok(Self {
            rates: vec![high_growth; high_growth_years],
            stable_growth,
            high_growth_years,
            transition_years: 0,
        })
    }

    /// Schedule from explicit per-period rates
    pub fn from_rates(rates: Vec<f64>, stable_growth: f64) -> Result<Self> {
        if rates.is_empty() {
            return Err(ValuationError::EmptyInput("growth schedule"));
        }
        if let Some(bad) = rates.iter().find(|r| !r.is_finite()) {
            return Err(ValuationError::InvalidParameter {
                name: "growth_rate",
                value: *bad,
                reason: "must be finite",
            });
        }
        let len = rates.len();
        Ok(Self {
            rates,
            stable_growth,
            high_growth_years: len,
            transition_years: 0,
        })
    }

    /// All rates in period order
    #[must_use]
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Rate for a 1-based period
    #[must_use]
    pub fn rate(&self, period: usize) -> Option<f64> {
        period
            .checked_sub(1)
            .and_then(|idx| self.rates.get(idx))
            .copied()
    }

    /// Number of explicit periods
    #[must_use]
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate applied in the final explicit period
    #[must_use]
    pub fn last_rate(&self) -> Option<f64> {
        self.rates.last().copied()
    }

    /// Perpetual growth used by the terminal value
    #[must_use]
    pub fn stable_growth(&self) -> f64 {
        self.stable_growth
    }

    #[must_use]
    pub fn high_growth_years(&self) -> usize {
        self.high_growth_years
    }

    #[must_use]
    pub fn transition_years(&self) -> usize {
        self.transition_years
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.rates.iter().copied()
    }
}

/// Growth estimates from history and fundamentals
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrowthEstimate {
    pub revenue_cagr: Option<f64>,
    pub earnings_cagr: Option<f64>,
    pub fundamental_growth: Option<f64>,
    /// Simple average of the available estimates
    pub recommended: Option<f64>,
}

/// Blend historical CAGRs with fundamental growth (`RIR * ROIC`).
///
/// Series are ordered oldest to newest. A series contributes only when it has
/// at least two points and positive endpoints.
#[must_use]
pub fn estimate_growth(
    revenues: &[f64],
    earnings: Option<&[f64]>,
    reinvestment_rate: Option<f64>,
    roic: Option<f64>,
) -> GrowthEstimate {
    fn series_cagr(series: &[f64]) -> Option<f64> {
        let (first, last) = (*series.first()?, *series.last()?);
        if series.len() < 2 {
            return None;
        }
        cagr(first, last, (series.len() - 1) as u32).ok()
    }

    let revenue_cagr = series_cagr(revenues);
    let earnings_cagr = earnings.and_then(series_cagr);
    let fundamental = match (reinvestment_rate, roic) {
        (Some(rir), Some(roic)) => Some(fundamental_growth(rir, roic)),
        _ => None,
    };

    let available: Vec<f64> = [revenue_cagr, earnings_cagr, fundamental]
        .into_iter()
        .flatten()
        .collect();
    let recommended =
        (!available.is_empty()).then(|| available.iter().sum::<f64>() / available.len() as f64);

    GrowthEstimate {
        revenue_cagr,
        earnings_cagr,
        fundamental_growth: fundamental,
        recommended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_phase_shape() {
        let schedule = GrowthSchedule::build(0.15, 0.025, 5, 5).unwrap();
        assert_eq!(schedule.len(), 10);
        assert!(schedule.rates()[..5].iter().all(|&r| r == 0.15));
        assert!((schedule.last_rate().unwrap() - 0.025).abs() < 1e-9);
        assert_eq!(schedule.rate(1), Some(0.15));
        assert_eq!(schedule.rate(0), None);
        assert_eq!(schedule.rate(11), None);
    }

    #[test]
    fn test_transition_is_linear() {
        let schedule = GrowthSchedule::build(0.20, 0.00, 1, 4).unwrap();
        let expected = [0.20, 0.15, 0.10, 0.05, 0.0];
        for (actual, expected) in schedule.iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_schedule_invariants_over_durations() {
        for high_years in 1..=8 {
            for transition_years in 1..=8 {
                let schedule =
                    GrowthSchedule::build(0.12, 0.03, high_years, transition_years).unwrap();
                assert_eq!(schedule.len(), high_years + transition_years);
                assert!(schedule.rates()[..high_years].iter().all(|&r| r == 0.12));
                assert!((schedule.last_rate().unwrap() - 0.03).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_rejects_zero_durations() {
        assert!(matches!(
            GrowthSchedule::build(0.1, 0.02, 0, 5),
            Err(ValuationError::InvalidParameter {
                name: "high_growth_years",
                ..
            })
        ));
        assert!(matches!(
            GrowthSchedule::build(0.1, 0.02, 5, 0),
            Err(ValuationError::InvalidParameter {
                name: "transition_years",
                ..
            })
        ));
    }

    #[test]
    fn test_two_stage_and_explicit_rates() {
        let two = GrowthSchedule::two_stage(0.2, 0.025, 3).unwrap();
        assert_eq!(two.rates(), &[0.2, 0.2, 0.2]);
        assert_eq!(two.stable_growth(), 0.025);
        assert!(GrowthSchedule::two_stage(0.2, 0.025, 0).is_err());

        let explicit = GrowthSchedule::from_rates(vec![0.1, 0.05], 0.02).unwrap();
        assert_eq!(explicit.len(), 2);
        assert!(GrowthSchedule::from_rates(vec![], 0.02).is_err());
        assert!(GrowthSchedule::from_rates(vec![f64::NAN], 0.02).is_err());
    }

    #[test]
    fn test_estimate_growth_blends_sources() {
        let estimate = estimate_growth(
            &[100.0, 110.0, 121.0],
            Some(&[10.0, 12.1]),
            Some(0.5),
            Some(0.10),
        );
        assert!((estimate.revenue_cagr.unwrap() - 0.10).abs() < 1e-12);
        assert!((estimate.earnings_cagr.unwrap() - 0.21).abs() < 1e-12);
        assert!((estimate.fundamental_growth.unwrap() - 0.05).abs() < 1e-12);
        let expected = (0.10 + 0.21 + 0.05) / 3.0;
        assert!((estimate.recommended.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_growth_with_no_usable_data() {
        let estimate = estimate_growth(&[100.0], None, Some(0.5), None);
        assert_eq!(estimate, GrowthEstimate::default());
    }
}
