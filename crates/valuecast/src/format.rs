//! Plain-text rendering of valuation results

use std::fmt::Write;

use valuecast_core::monte_carlo::{Histogram, SummaryStatistics};
use valuecast_core::scenario::ScenarioAnalysis;
use valuecast_core::sensitivity::{GridCell, SensitivityGrid};

/// Width of the longest histogram bar
const HISTOGRAM_WIDTH: usize = 40;

fn group_thousands(whole: u64) -> String {
    let digits = whole.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Format a currency value, e.g. `-$1,234.56`
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// Format a currency value in compact form (e.g., $2.1B, $450.0M, $12K)
pub fn format_compact_currency(value: f64) -> String {
    let abs_value = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    if abs_value >= 1e9 {
        format!("{sign}${:.2}B", abs_value / 1e9)
    } else if abs_value >= 1e6 {
        format!("{sign}${:.1}M", abs_value / 1e6)
    } else if abs_value >= 1e3 {
        format!("{sign}${:.0}K", abs_value / 1e3)
    } else {
        format!("{sign}${abs_value:.0}")
    }
}

/// Format a rate as a percentage, e.g. `0.1234` as `12.34%`
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn format_axis_value(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Sensitivity grid as a table: one row per row-axis value, invalid cells as `n/a`
pub fn format_sensitivity_table(grid: &SensitivityGrid) -> String {
    let corner = format!("{} \\ {}", grid.rows().label, grid.columns().label);

    let header: Vec<String> = grid
        .columns()
        .values
        .iter()
        .map(|&v| format_axis_value(v))
        .collect();
    let body: Vec<(String, Vec<String>)> = grid
        .rows()
        .values
        .iter()
        .enumerate()
        .map(|(row, &r)| {
            let cells = grid
                .row(row)
                .unwrap_or_default()
                .iter()
                .map(|cell| match cell {
                    GridCell::Valid(v) => format_currency(*v),
                    GridCell::Invalid(_) => "n/a".to_string(),
                })
                .collect();
            (format_axis_value(r), cells)
        })
        .collect();

    let label_width = body
        .iter()
        .map(|(label, _)| label.len())
        .chain(std::iter::once(corner.len()))
        .max()
        .unwrap_or(0);
    let cell_width = body
        .iter()
        .flat_map(|(_, cells)| cells.iter().map(String::len))
        .chain(header.iter().map(String::len))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = write!(out, "{corner:<label_width$}");
    for h in &header {
        let _ = write!(out, " | {h:>cell_width$}");
    }
    out.push('\n');
    let rule_len = label_width + header.len() * (cell_width + 3);
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for (label, cells) in &body {
        let _ = write!(out, "{label:<label_width$}");
        for cell in cells {
            let _ = write!(out, " | {cell:>cell_width$}");
        }
        out.push('\n');
    }
    if grid.invalid_count() > 0 {
        let _ = writeln!(
            out,
            "{} of {} combinations could not be valued (n/a)",
            grid.invalid_count(),
            grid.cells().len()
        );
    }
    out
}

/// Key statistics of a simulation, one per line
pub fn format_statistics(stats: &SummaryStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Valid draws:        {}", stats.count);
    let _ = writeln!(out, "Mean:               {}", format_currency(stats.mean));
    let _ = writeln!(out, "Median:             {}", format_currency(stats.median));
    let _ = writeln!(out, "Std deviation:      {}", format_currency(stats.std_dev));
    let _ = writeln!(
        out,
        "Range:              {} to {}",
        format_currency(stats.min),
        format_currency(stats.max)
    );
    let _ = writeln!(
        out,
        "90% interval:       {} to {}",
        format_currency(stats.ci_90.0),
        format_currency(stats.ci_90.1)
    );
    let _ = writeln!(
        out,
        "50% interval:       {} to {}",
        format_currency(stats.ci_50.0),
        format_currency(stats.ci_50.1)
    );
    let _ = writeln!(
        out,
        "P(value < 0):       {}",
        format_percentage(stats.probability_negative)
    );
    for (level, value) in stats.percentiles.to_pairs() {
        let _ = writeln!(out, "  P{level:<3.0}              {}", format_currency(value));
    }
    out
}

/// Horizontal ASCII histogram, bars scaled to the fullest bin
pub fn format_histogram(histogram: &Histogram) -> String {
    let max_count = histogram.max_count().max(1);
    let labels: Vec<String> = histogram
        .edges
        .windows(2)
        .map(|edge| format!("{} to {}", format_currency(edge[0]), format_currency(edge[1])))
        .collect();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    for (label, &count) in labels.iter().zip(&histogram.counts) {
        let bar = (count * HISTOGRAM_WIDTH).div_ceil(max_count);
        let _ = writeln!(out, "{label:>label_width$} | {} {count}", "#".repeat(bar));
    }
    out
}

/// Scenario table with the probability-weighted value underneath
pub fn format_scenarios(analysis: &ScenarioAnalysis) -> String {
    let name_width = analysis
        .scenarios
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0)
        .max("Scenario".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$} | {:>11} | {:>16} | {:>16}",
        "Scenario", "Probability", "Value", "Weighted"
    );
    out.push_str(&"-".repeat(name_width + 53));
    out.push('\n');
    for scenario in &analysis.scenarios {
        let value = scenario.value.map_or_else(|| "n/a".to_string(), format_currency);
        let _ = writeln!(
            out,
            "{:<name_width$} | {:>11} | {:>16} | {:>16}",
            scenario.name,
            format_percentage(scenario.probability),
            value,
            format_currency(scenario.weighted_value())
        );
        if let Some(note) = &scenario.note {
            let _ = writeln!(out, "  {note}");
        }
    }
    let _ = writeln!(
        out,
        "Expected value: {}",
        format_currency(analysis.expected_value())
    );
    if !analysis.probabilities_valid() {
        let _ = writeln!(
            out,
            "Warning: probabilities sum to {}, not 100%",
            format_percentage(analysis.probability_sum())
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuecast_core::sensitivity::sweep;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1_234.5), "$1,234.50");
        assert_eq!(format_currency(-1_234_567.891), "-$1,234,567.89");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(f64::NAN), "n/a");
    }

    #[test]
    fn test_format_compact_currency() {
        assert_eq!(format_compact_currency(2_100_000_000.0), "$2.10B");
        assert_eq!(format_compact_currency(450_000_000.0), "$450.0M");
        assert_eq!(format_compact_currency(-12_000.0), "-$12K");
        assert_eq!(format_compact_currency(50.0), "$50");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.1234), "12.34%");
        assert_eq!(format_percentage(-0.05), "-5.00%");
    }

    #[test]
    fn test_sensitivity_table_marks_invalid_cells() {
        let grid = sweep(
            |r, g| valuecast_core::primitives::gordon_growth(100.0, r, g),
            &[0.08, 0.10],
            &[0.02, 0.08],
        )
        .unwrap();
        let table = format_sensitivity_table(&grid);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].contains("2.0%") && lines[0].contains("8.0%"));
        assert!(lines[2].starts_with("8.0%"));
        assert!(lines[2].contains("$1,700.00"));
        assert!(lines[2].ends_with("n/a"));
        assert!(lines[3].contains("$5,400.00"));
        assert!(table.contains("1 of 4 combinations"));
    }

    #[test]
    fn test_histogram_bars_scale_to_max() {
        let histogram = Histogram::from_values(&[1.0, 2.0, 2.0, 2.0, 3.0], 3).unwrap();
        let text = format_histogram(&histogram);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(&"#".repeat(HISTOGRAM_WIDTH)));
        assert!(lines[0].ends_with(" 1"));
    }

    #[test]
    fn test_scenarios_show_expected_value() {
        let analysis = ScenarioAnalysis::standard_default(100.0).unwrap();
        let text = format_scenarios(&analysis);
        assert!(text.contains("Best Case"));
        assert!(text.contains("$130.00"));
        assert!(text.contains("Expected value: $99.75"));
        assert!(!text.contains("Warning"));
    }
}
