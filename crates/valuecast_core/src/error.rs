use serde::{Deserialize, Serialize};

/// Broad classification of a [`ValuationError`].
///
/// Batch engines use this to decide what is absorbed per unit and what
/// aborts the whole call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input detected before any computation starts
    Configuration,
    /// A parameter combination violates a financial precondition
    DomainInfeasibility,
    /// A denominator is numerically indistinguishable from zero
    NumericDegeneracy,
}

impl ErrorKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::DomainInfeasibility => "domain infeasibility",
            ErrorKind::NumericDegeneracy => "numeric degeneracy",
        }
    }
}

/// Errors raised by the valuation core
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValuationError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("infeasible input `{name}` = {value}: {reason}")]
    Infeasible {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error(
        "growth rate ({growth_rate:.4}) must be below the discount rate ({discount_rate:.4})"
    )]
    DiscountGrowthInversion {
        growth_rate: f64,
        discount_rate: f64,
    },

    #[error("denominator {denominator:e} is too close to zero, value would be unbounded")]
    NumericDegeneracy { denominator: f64 },

    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error("{0} axis has no values")]
    EmptyAxis(&'static str),

    #[error("invalid distribution for `{parameter}`: {reason}")]
    InvalidDistribution { parameter: String, reason: String },

    #[error("parameter `{0}` is specified more than once")]
    DuplicateParameter(String),

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("correlation between `{first}` and `{second}` is {rho}, expected a value in [-1, 1]")]
    CorrelationOutOfRange {
        first: String,
        second: String,
        rho: f64,
    },

    #[error("parameter `{0}` is missing from the draw")]
    MissingParameter(String),
}

impl ValuationError {
    /// Classify the error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValuationError::Infeasible { .. }
            | ValuationError::DiscountGrowthInversion { .. }
            | ValuationError::MissingParameter(_) => ErrorKind::DomainInfeasibility,
            ValuationError::NumericDegeneracy { .. } => ErrorKind::NumericDegeneracy,
            ValuationError::InvalidParameter { .. }
            | ValuationError::DimensionMismatch { .. }
            | ValuationError::EmptyInput(_)
            | ValuationError::EmptyAxis(_)
            | ValuationError::InvalidDistribution { .. }
            | ValuationError::DuplicateParameter(_)
            | ValuationError::UnknownParameter(_)
            | ValuationError::CorrelationOutOfRange { .. } => ErrorKind::Configuration,
        }
    }

    /// True for errors that a batch engine records per unit instead of aborting
    #[must_use]
    pub fn is_per_unit(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Configuration)
    }
}

pub type Result<T> = std::result::Result<T, ValuationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let inversion = ValuationError::DiscountGrowthInversion {
            growth_rate: 0.12,
            discount_rate: 0.10,
        };
        assert_eq!(inversion.kind(), ErrorKind::DomainInfeasibility);
        assert!(inversion.is_per_unit());

        let degenerate = ValuationError::NumericDegeneracy { denominator: 1e-15 };
        assert_eq!(degenerate.kind(), ErrorKind::NumericDegeneracy);

        let config = ValuationError::InvalidParameter {
            name: "high_growth_years",
            value: 0.0,
            reason: "must be at least 1",
        };
        assert_eq!(config.kind(), ErrorKind::Configuration);
        assert!(!config.is_per_unit());
    }

    #[test]
    fn test_error_display() {
        let err = ValuationError::DiscountGrowthInversion {
            growth_rate: 0.1,
            discount_rate: 0.1,
        };
        assert_eq!(
            err.to_string(),
            "growth rate (0.1000) must be below the discount rate (0.1000)"
        );
    }
}
