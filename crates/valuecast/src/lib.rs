//! Command-line front end for valuecast_core
//!
//! Reads a YAML [`ValuationConfig`], runs every configured analysis and
//! renders a plain-text report.

// ============================================================================
// Modules
// ============================================================================

pub mod format;
pub mod logging;
pub mod report;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use logging::init_logging;
pub use report::{ReportOptions, render_report};

use std::path::Path;

use color_eyre::eyre::WrapErr;
use valuecast_core::ValuationConfig;

/// Parse a YAML config string and validate it
pub fn parse_config(yaml: &str) -> color_eyre::Result<ValuationConfig> {
    let config: ValuationConfig =
        serde_saphyr::from_str(yaml).wrap_err("failed to parse valuation config")?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate the config at `path`
pub fn load_config(path: &Path) -> color_eyre::Result<ValuationConfig> {
    let yaml = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    let config = parse_config(&yaml)?;
    tracing::info!(
        company = %config.company,
        path = %path.display(),
        "loaded valuation config"
    );
    Ok(config)
}
