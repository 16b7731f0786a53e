mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::cash_flow::{CashFlowArgs, ScheduleArgs};
use commands::portfolio::PortfolioArgs;

/// Bond cash-flow schedules and yield analytics
#[derive(Parser)]
#[command(
    name = "bcf",
    version,
    about = "Bond cash-flow schedules and yield analytics",
    long_about = "Builds French-method amortization schedules for bonds with optional \
                  grace periods, and computes TCEA, TREA, duration, convexity and \
                  maximum price with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Path to a JSON engine configuration
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full cash-flow analysis: schedule, TCEA/TREA, duration, max price
    CashFlow(CashFlowArgs),
    /// Payment schedule rows only
    Schedule(ScheduleArgs),
    /// Summarize a collection of bonds
    Portfolio(PortfolioArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.config.as_deref();
    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::CashFlow(args) => commands::cash_flow::run_cash_flow(args, config),
        Commands::Schedule(args) => commands::cash_flow::run_schedule(args, config),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args, config),
        Commands::Version => {
            println!("bcf {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
