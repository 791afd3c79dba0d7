//! Marginal distributions for stochastic assumptions

use rand::Rng;
use rand_distr::Distribution as _;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValuationError};

/// Marginal distribution of one stochastic parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Distribution {
    Normal { mean: f64, std_dev: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
    /// Parameters of the underlying normal
    LogNormal { mean_log: f64, sigma_log: f64 },
}

impl Distribution {
    /// Check parameters without sampling
    pub fn validate(&self, parameter: &str) -> Result<()> {
        let invalid = |reason: &str| ValuationError::InvalidDistribution {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        };

        match *self {
            Distribution::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() {
                    return Err(invalid("normal parameters must be finite"));
                }
                if std_dev <= 0.0 {
                    return Err(invalid("normal std_dev must be positive"));
                }
            }
            Distribution::Triangular { min, mode, max } => {
                if !min.is_finite() || !mode.is_finite() || !max.is_finite() {
                    return Err(invalid("triangular bounds must be finite"));
                }
                if !(min <= mode && mode <= max) {
                    return Err(invalid("triangular requires min <= mode <= max"));
                }
            }
            Distribution::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(invalid("uniform bounds must be finite"));
                }
                if min >= max {
                    return Err(invalid("uniform requires min < max"));
                }
            }
            Distribution::LogNormal {
                mean_log,
                sigma_log,
            } => {
                if !mean_log.is_finite() || !sigma_log.is_finite() {
                    return Err(invalid("log-normal parameters must be finite"));
                }
                if sigma_log <= 0.0 {
                    return Err(invalid("log-normal sigma must be positive"));
                }
            }
        }
        Ok(())
    }

    /// Draw one value
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let invalid = |reason: &'static str| ValuationError::InvalidDistribution {
            parameter: self.label().to_string(),
            reason: reason.to_string(),
        };

        match *self {
            Distribution::Normal { mean, std_dev } => rand_distr::Normal::new(mean, std_dev)
                .map(|d| d.sample(rng))
                .map_err(|_| invalid("std_dev must be non-negative and finite")),
            Distribution::Triangular { min, mode, max } => {
                if min == max {
                    return Ok(min);
                }
                rand_distr::Triangular::new(min, max, mode)
                    .map(|d| d.sample(rng))
                    .map_err(|_| invalid("requires min <= mode <= max"))
            }
            Distribution::Uniform { min, max } => rand::distr::Uniform::new(min, max)
                .map(|d| d.sample(rng))
                .map_err(|_| invalid("requires min < max")),
            Distribution::LogNormal {
                mean_log,
                sigma_log,
            } => rand_distr::LogNormal::new(mean_log, sigma_log)
                .map(|d| d.sample(rng))
                .map_err(|_| invalid("sigma must be non-negative and finite")),
        }
    }

    /// Analytic mean
    #[must_use]
    pub fn mean(&self) -> f64 {
        match *self {
            Distribution::Normal { mean, .. } => mean,
            Distribution::Triangular { min, mode, max } => (min + mode + max) / 3.0,
            Distribution::Uniform { min, max } => (min + max) / 2.0,
            Distribution::LogNormal {
                mean_log,
                sigma_log,
            } => (mean_log + sigma_log * sigma_log / 2.0).exp(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Distribution::Normal { .. } => "normal",
            Distribution::Triangular { .. } => "triangular",
            Distribution::Uniform { .. } => "uniform",
            Distribution::LogNormal { .. } => "log-normal",
        }
    }
}

/// A named stochastic assumption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StochasticParameterSpec {
    pub name: String,
    pub distribution: Distribution,
}

impl StochasticParameterSpec {
    /// Validated constructor
    pub fn new(name: impl Into<String>, distribution: Distribution) -> Result<Self> {
        let spec = Self {
            name: name.into(),
            distribution,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn normal(name: impl Into<String>, mean: f64, std_dev: f64) -> Result<Self> {
        Self::new(name, Distribution::Normal { mean, std_dev })
    }

    pub fn triangular(name: impl Into<String>, min: f64, mode: f64, max: f64) -> Result<Self> {
        Self::new(name, Distribution::Triangular { min, mode, max })
    }

    pub fn uniform(name: impl Into<String>, min: f64, max: f64) -> Result<Self> {
        Self::new(name, Distribution::Uniform { min, max })
    }

    pub fn log_normal(name: impl Into<String>, mean_log: f64, sigma_log: f64) -> Result<Self> {
        Self::new(
            name,
            Distribution::LogNormal {
                mean_log,
                sigma_log,
            },
        )
    }

    /// Re-check a spec that may have been deserialized
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ValuationError::EmptyInput("parameter name"));
        }
        self.distribution.validate(&self.name)
    }
}
