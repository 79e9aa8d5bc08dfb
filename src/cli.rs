//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::bar::Bar;
use crate::domain::config::SimConfig;
use crate::domain::engine::{run_simulation, RunSummary};
use crate::domain::error::BarsimError;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::EmaCrossover;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "barsim", about = "Bar-by-bar trading strategy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Override the data file named in the config
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Trace per-bar decisions and fills
        #[arg(short, long)]
        verbose: bool,
    },
    /// Re-run the simulation across a range of trend SMA periods
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Validate a configuration file without touching data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the date range of a data file
    Info {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            data,
            verbose,
        } => run_sim(&config, data.as_deref(), verbose),
        Command::Sweep {
            config,
            from,
            to,
            data,
        } => run_sweep(&config, from, to, data.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Info { data } => run_info(&data),
    }
}

fn fail(err: &BarsimError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn load_config(path: &Path) -> Result<FileConfigAdapter, BarsimError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn resolve_data_path(
    adapter: &FileConfigAdapter,
    data_override: Option<&Path>,
) -> Result<PathBuf, BarsimError> {
    match data_override {
        Some(path) => Ok(path.to_path_buf()),
        None => adapter
            .get_string("data", "file")
            .map(PathBuf::from)
            .ok_or_else(|| BarsimError::ConfigMissing {
                section: "data".into(),
                key: "file".into(),
            }),
    }
}

fn load_bars(path: &Path) -> Result<Vec<Bar>, BarsimError> {
    eprintln!("Loading bars from {}", path.display());
    let bars = CsvAdapter::new(path.to_path_buf()).load_bars()?;
    eprintln!(
        "Loaded {} bars, {} to {}",
        bars.len(),
        bars[0].date,
        bars[bars.len() - 1].date
    );
    Ok(bars)
}

fn run_sim(config_path: &Path, data: Option<&Path>, verbose: bool) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let mut config = match SimConfig::from_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if verbose {
        config.verbose = true;
    }

    let data_path = match resolve_data_path(&adapter, data) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let bars = match load_bars(&data_path) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    println!("Start portfolio value: {:.2}", config.start_cash);

    let mut strategy = EmaCrossover::new(config.verbose);
    let summary = match run_simulation(&bars, &mut strategy, &config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    print_summary(&summary);
    ExitCode::SUCCESS
}

fn run_sweep(config_path: &Path, from: usize, to: usize, data: Option<&Path>) -> ExitCode {
    if from < 1 || from > to {
        let err = BarsimError::ConfigInvalid {
            section: "sweep".into(),
            key: "range".into(),
            reason: format!("invalid period range {from}..={to}"),
        };
        return fail(&err);
    }

    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let base = match SimConfig::from_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let data_path = match resolve_data_path(&adapter, data) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let bars = match load_bars(&data_path) {
        Ok(b) => b,
        Err(e) => return fail(&e),
    };

    // Each period gets a fresh strategy, broker and indicator set; the runs
    // share nothing but the bar feed.
    for period in from..=to {
        let config = SimConfig {
            sma_period: period,
            verbose: false,
            ..base.clone()
        };
        let mut strategy = EmaCrossover::new(false);
        match run_simulation(&bars, &mut strategy, &config) {
            Ok(summary) => {
                println!(
                    "sma_period: {period}, end portfolio value: {:.2}",
                    summary.ending_value
                );
            }
            Err(e) => return fail(&e),
        }
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    match SimConfig::from_config(&adapter) {
        Ok(config) => {
            println!("Config OK");
            println!(
                "  broker: start_cash={:.2} commission_rate={} sizer_percent={}",
                config.start_cash, config.commission_rate, config.sizer_percent
            );
            println!(
                "  strategy: sma={} short_ema={} long_ema={}",
                config.sma_period, config.short_ema_period, config.long_ema_period
            );
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_info(data_path: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_path.to_path_buf());
    match adapter.data_range() {
        Ok(Some((first, last, count))) => {
            println!(
                "{}: {} bars, {} to {}",
                data_path.display(),
                count,
                first,
                last
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("error: no bars in {}", data_path.display());
            ExitCode::from(3)
        }
        Err(e) => fail(&e),
    }
}

fn print_summary(summary: &RunSummary) {
    let metrics = Metrics::compute(summary);

    println!("End portfolio value: {:.2}", summary.ending_value);
    println!("Total return: {:.2}%", metrics.total_return * 100.0);
    println!(
        "Max drawdown: {:.2}% over {} bars",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    );
    println!(
        "Trades: {} ({} won / {} lost / {} breakeven), win rate {:.1}%",
        summary.closed_trades.len(),
        metrics.trades_won,
        metrics.trades_lost,
        metrics.trades_breakeven,
        metrics.win_rate * 100.0
    );

    for trade in &summary.closed_trades {
        println!(
            "  {} -> {} ({} bars): {} @ {:.2} -> {:.2}, net {:.2}",
            trade.entry_date,
            trade.exit_date,
            trade.bars_held,
            trade.size,
            trade.entry_price,
            trade.exit_price,
            trade.net_pnl
        );
    }
}
