//! Full text report for one valuation config

use std::fmt::Write;

use color_eyre::eyre::WrapErr;
use valuecast_core::ValuationConfig;
use valuecast_core::dcf::{DcfValuation, PriceVerdict};
use valuecast_core::monte_carlo::SimulationResult;

use crate::format::{
    format_currency, format_histogram, format_percentage, format_scenarios,
    format_sensitivity_table, format_statistics,
};

/// Command-line overrides for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub draws: Option<usize>,
    pub seed: Option<u64>,
    pub histogram_bins: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            draws: None,
            seed: None,
            histogram_bins: 20,
        }
    }
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}\n{}", "=".repeat(title.len()));
}

fn write_dcf(
    out: &mut String,
    config: &ValuationConfig,
    valuation: &DcfValuation,
) -> color_eyre::Result<()> {
    let projection = &valuation.projection;
    section(out, &format!("DCF ({})", projection.kind().label()));

    let _ = writeln!(
        out,
        "{:>6} | {:>8} | {:>16} | {:>16}",
        "Year", "Growth", "Cash flow", "Present value"
    );
    for record in projection.records() {
        let _ = writeln!(
            out,
            "{:>6} | {:>8} | {:>16} | {:>16}",
            record.period,
            format_percentage(record.growth_rate),
            format_currency(record.cash_flow),
            format_currency(record.present_value)
        );
    }

    if let Some(terminal) = projection.terminal() {
        let _ = writeln!(
            out,
            "Terminal value ({}): {} (present value {})",
            terminal.method.label(),
            format_currency(terminal.value),
            format_currency(terminal.present_value)
        );
        if let Some(diagnostics) = terminal.diagnostics {
            let _ = writeln!(
                out,
                "  Implied reinvestment rate {}, {}",
                format_percentage(diagnostics.implied_reinvestment_rate),
                diagnostics.value_creation.describe()
            );
        }
    }

    let _ = writeln!(out, "Total value: {}", format_currency(valuation.total_value()));
    let check = &valuation.check;
    let _ = writeln!(
        out,
        "Terminal value share: {}{}",
        format_percentage(check.share),
        if check.acceptable {
            String::new()
        } else {
            format!(" (above {}, review the assumptions)", format_percentage(check.threshold))
        }
    );

    if let Some(bridge) = &config.bridge {
        let equity = valuation.equity(bridge)?;
        let _ = writeln!(out, "Equity value: {}", format_currency(equity.equity_value));
        let _ = writeln!(out, "Value per share: {}", format_currency(equity.value_per_share));
        if let (Some(upside), Some(verdict)) = (equity.upside, equity.verdict) {
            let verdict = match verdict {
                PriceVerdict::Undervalued => "undervalued",
                PriceVerdict::FairValue => "fairly valued",
                PriceVerdict::Overvalued => "overvalued",
            };
            let _ = writeln!(out, "Upside: {} ({verdict})", format_percentage(upside));
        }
    }
    Ok(())
}

fn write_simulation(out: &mut String, result: &SimulationResult, bins: usize) {
    let _ = writeln!(
        out,
        "Seed {}, {} draws{}",
        result.seed,
        result.total_draws(),
        if result.correlated { ", correlated inputs" } else { "" }
    );
    if result.failed_count > 0 {
        let _ = write!(out, "{} draws could not be valued", result.failed_count);
        if let Some((reason, count)) = result.dominant_failure() {
            let _ = write!(out, " (mostly {reason}: {count})");
        }
        out.push('\n');
    }

    match &result.statistics {
        Some(stats) => {
            out.push_str(&format_statistics(stats));
            if let Some(histogram) = result.histogram(bins) {
                out.push('\n');
                out.push_str(&format_histogram(&histogram));
            }
        }
        None => out.push_str("No valid draws, statistics are undefined\n"),
    }
}

/// Run the base DCF and every analysis, rendering each as a text section.
///
/// The Monte Carlo section runs when the config has one or when `options`
/// overrides the draws or seed.
pub fn render_report(
    config: &ValuationConfig,
    options: &ReportOptions,
) -> color_eyre::Result<String> {
    let mut out = String::new();
    let title = if config.company.is_empty() {
        "Valuation"
    } else {
        config.company.as_str()
    };
    let _ = writeln!(out, "{title}\n{}", "#".repeat(title.len()));

    let valuation = config.run_dcf().wrap_err("base case valuation failed")?;
    write_dcf(&mut out, config, &valuation)?;
    tracing::info!(total = valuation.total_value(), "base case valued");

    let grid = config.run_sensitivity().wrap_err("sensitivity table failed")?;
    section(&mut out, "Sensitivity");
    out.push_str(&format_sensitivity_table(&grid));
    tracing::info!(
        valid = grid.valid_count(),
        invalid = grid.invalid_count(),
        "sensitivity table built"
    );

    if config.monte_carlo.is_some() || options.draws.is_some() || options.seed.is_some() {
        let result = config
            .run_monte_carlo(options.draws, options.seed)
            .wrap_err("Monte Carlo simulation failed")?;
        section(&mut out, "Monte Carlo");
        write_simulation(&mut out, &result, options.histogram_bins);
        tracing::info!(
            valid = result.valid_count,
            failed = result.failed_count,
            seed = result.seed,
            "Monte Carlo complete"
        );
    }

    let scenarios = config.run_scenarios().wrap_err("scenario analysis failed")?;
    section(&mut out, "Scenarios");
    out.push_str(&format_scenarios(&scenarios));

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config;

    const CONFIG: &str = "\
company: Example Co
dcf:
  base_cash_flow: 1000.0
  discount_rate: 0.09
  high_growth: 0.12
bridge:
  net_debt: 2000.0
  shares_outstanding: 100.0
  current_price: 150.0
";

    #[test]
    fn test_report_sections() {
        let config = parse_config(CONFIG).unwrap();
        let report = render_report(&config, &ReportOptions::default()).unwrap();
        assert!(report.starts_with("Example Co\n"));
        assert!(report.contains("DCF (FCFF)"));
        assert!(report.contains("Value per share"));
        assert!(report.contains("Sensitivity"));
        assert!(report.contains("Expected value"));
        assert!(!report.contains("Monte Carlo"));
    }

    #[test]
    fn test_seed_enables_monte_carlo() {
        let config = parse_config(CONFIG).unwrap();
        let options = ReportOptions {
            draws: Some(500),
            seed: Some(3),
            ..ReportOptions::default()
        };
        let report = render_report(&config, &options).unwrap();
        assert!(report.contains("Monte Carlo"));
        assert!(report.contains("Seed 3, 500 draws"));
        assert_eq!(report, render_report(&config, &options).unwrap());
    }

    #[test]
    fn test_infeasible_base_case_is_an_error() {
        let yaml = CONFIG.replace("discount_rate: 0.09", "discount_rate: 0.02");
        let config = parse_config(&yaml).unwrap();
        assert!(render_report(&config, &ReportOptions::default()).is_err());
    }
}
