use std::path::PathBuf;

use clap::Parser;
use valuecast::{ReportOptions, init_logging, load_config, render_report};

#[derive(Parser, Debug)]
#[command(name = "valuecast")]
#[command(about = "DCF valuation with sensitivity tables, Monte Carlo and scenarios")]
struct Args {
    /// Path to the YAML valuation config
    #[arg(short, long)]
    config: PathBuf,

    /// Number of Monte Carlo draws (overrides the config)
    #[arg(short, long)]
    draws: Option<usize>,

    /// Monte Carlo seed (overrides the config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Histogram bins for the Monte Carlo distribution
    #[arg(long, default_value_t = 20)]
    bins: usize,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    let config = load_config(&args.config)?;
    let options = ReportOptions {
        draws: args.draws,
        seed: args.seed,
        histogram_bins: args.bins,
    };

    let report = render_report(&config, &options)?;
    println!("{report}");

    tracing::info!("valuation complete");
    Ok(())
}
