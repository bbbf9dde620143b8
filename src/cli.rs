//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvDatasetAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::JsonDatasetAdapter;
use crate::adapters::report_adapter::{print_summary, JsonResultWriter};
use crate::adapters::threshold_routine::ThresholdRoutine;
use crate::domain::config::EngineConfig;
use crate::domain::engine::Engine;
use crate::domain::error::TradesimError;
use crate::domain::metrics::PerformanceSummary;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DatasetProvider;
use crate::ports::report_port::ResultWriter;

#[derive(Parser, Debug)]
#[command(name = "tradesim", about = "Trading-strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of per-ticker daily-bar CSV files
        #[arg(long)]
        data: Option<PathBuf>,
        /// Algorithm-ready JSON dataset file
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Backtest a single ticker, overriding the config
        #[arg(long)]
        ticker: Option<String>,
        /// Abort on the first routine or data failure
        #[arg(long)]
        strict: bool,
    },
    /// Validate an algorithm configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show dataset coverage for configured tickers
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long)]
        ticker: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            dataset,
            output,
            ticker,
            strict,
        } => run_backtest(
            &config,
            data.as_ref(),
            dataset.as_ref(),
            output.as_ref(),
            ticker.as_deref(),
            strict,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            config,
            data,
            dataset,
            ticker,
        } => run_info(&config, data.as_ref(), dataset.as_ref(), ticker.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradesimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Resolve the dataset provider from CLI arguments, falling back to the
/// `[data]` config section. A JSON dataset file wins over a CSV directory.
fn resolve_provider(
    adapter: &FileConfigAdapter,
    data: Option<&PathBuf>,
    dataset: Option<&PathBuf>,
) -> Result<Box<dyn DatasetProvider>, ExitCode> {
    let dataset_path = dataset
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("data", "dataset_file"));
    if let Some(path) = dataset_path {
        return JsonDatasetAdapter::from_file(&path)
            .map(|a| Box::new(a) as Box<dyn DatasetProvider>)
            .map_err(|e| {
                eprintln!("error: {e}");
                ExitCode::from(&e)
            });
    }

    let csv_dir = data
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("data", "csv_dir"));
    match csv_dir {
        Some(dir) => Ok(Box::new(CsvDatasetAdapter::new(PathBuf::from(dir)))),
        None => {
            eprintln!("error: no data source (use --data, --dataset or the [data] section)");
            Err(ExitCode::from(2))
        }
    }
}

fn run_backtest(
    config_path: &PathBuf,
    data: Option<&PathBuf>,
    dataset: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
    ticker_override: Option<&str>,
    strict: bool,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut engine_config = match EngineConfig::from_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Some(ticker) = ticker_override {
        engine_config.tickers = vec![ticker.to_uppercase()];
    }
    if strict {
        engine_config.strict_errors = true;
    }

    // Stage 2: Resolve dataset provider
    let provider = match resolve_provider(&adapter, data, dataset) {
        Ok(p) => p,
        Err(code) => return code,
    };

    // Stage 3: Build the engine with the configured decision routine
    let routine = ThresholdRoutine::from_config(&adapter);
    eprintln!(
        "Running {}: {} tickers, balance {:.2}, commission {:.2}",
        engine_config.name,
        engine_config.tickers.len(),
        engine_config.starting_balance,
        engine_config.commission,
    );
    let starting_balance = engine_config.starting_balance;
    let mut engine = Engine::new(engine_config, Box::new(routine));

    // Stage 4: Run
    if let Err(e) = engine.run(provider.as_ref()) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 5: Summarize and write the report
    let result = engine.result();
    let summary = PerformanceSummary::compute(&result, starting_balance);
    print_summary(&summary);

    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("result.json"));
    match JsonResultWriter.write(&result, &summary, &output) {
        Ok(()) => {
            eprintln!("\nResult written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write result: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let engine_config = match EngineConfig::from_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nAlgorithm:");
    eprintln!("  name:             {}", engine_config.name);
    eprintln!("  tickers:          {}", engine_config.tickers.join(", "));
    eprintln!("  balance:          {:.2}", engine_config.starting_balance);
    eprintln!("  commission:       {:.2}", engine_config.commission);
    eprintln!("  auto_fill:        {}", engine_config.auto_fill);
    eprintln!("  strict:           {}", engine_config.strict_errors);
    eprintln!("  exit_on_step_end: {}", engine_config.exit_on_step_end);

    let routine = ThresholdRoutine::from_config(&adapter);
    eprintln!("\nStrategy thresholds:");
    match routine.buy_below {
        Some(v) => eprintln!("  buy_below:  {v:.2}"),
        None => eprintln!("  buy_below:  (unset)"),
    }
    match routine.sell_above {
        Some(v) => eprintln!("  sell_above: {v:.2}"),
        None => eprintln!("  sell_above: (unset)"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(
    config_path: &PathBuf,
    data: Option<&PathBuf>,
    dataset: Option<&PathBuf>,
    ticker: Option<&str>,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let provider = match resolve_provider(&adapter, data, dataset) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let tickers: Vec<String> = match ticker {
        Some(t) => vec![t.to_uppercase()],
        None => match EngineConfig::from_config(&adapter) {
            Ok(c) => c.tickers,
            Err(_) => match provider.list_tickers() {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("error: {e}");
                    return (&e).into();
                }
            },
        },
    };

    for t in &tickers {
        match provider.coverage(t) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} snapshots, {} to {}", t, count, first, last);
            }
            Ok(None) => {
                eprintln!("{}: no data found", t);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", t, e);
            }
        }
    }
    ExitCode::SUCCESS
}
