use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use portfolio_mc::config::AppConfig;
use portfolio_mc::export::export_top_n;
use portfolio_mc::quant::portfolio::ResultStore;
use portfolio_mc::quant::portfolio::SimulationRunner;
use portfolio_mc::quant::portfolio::TickerList;
use portfolio_mc::quant::providers::CsvDirectoryProvider;
use portfolio_mc::traits::PriceHistoryProvider;
use portfolio_mc::visualization::plot_performance;
use portfolio_mc::visualization::plot_risk_return;
use portfolio_mc::visualization::top_table;
use tracing::Level;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

/// Monte Carlo search for risk/return efficient portfolio weights.
#[derive(Parser)]
#[command(name = "portfolio-mc")]
#[command(version)]
#[command(about = "Monte Carlo simulation of random portfolio weights")]
struct Cli {
  /// Verbosity level
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  /// TOML configuration file
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Directory of <TICKER>.csv price files used instead of downloading
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Location of the stored result table
  #[arg(long, global = true)]
  results: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Chart cumulative percent performance of 1 to 10 tickers
  Performance {
    tickers: Vec<String>,

    /// Output HTML file
    #[arg(long)]
    html: Option<PathBuf>,
  },
  /// Run the simulation for 2 to 10 tickers and store the ranked result
  Simulate {
    tickers: Vec<String>,

    /// Number of random weight trials
    #[arg(short, long)]
    trials: Option<usize>,

    /// Lookback window in years
    #[arg(long)]
    years: Option<u32>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Score trials in parallel
    #[arg(long)]
    parallel: bool,
  },
  /// Chart the stored result as a volatility/return scatter
  Chart {
    /// Output HTML file
    #[arg(long)]
    html: Option<PathBuf>,
  },
  /// Print the top rows of the stored result
  Top {
    #[arg(short = 'n', long)]
    rows: Option<usize>,
  },
  /// Export the stored result to CSV
  Export {
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export only the first N rows
    #[arg(short = 'n', long)]
    rows: Option<usize>,
  },
}

fn init_tracing(verbose: u8) {
  let level = match verbose {
    0 => Level::WARN,
    1 => Level::INFO,
    2 => Level::DEBUG,
    _ => Level::TRACE,
  };
  let subscriber = FmtSubscriber::builder()
    .with_max_level(level)
    .with_target(false)
    .with_writer(std::io::stderr)
    .finish();
  if tracing::subscriber::set_global_default(subscriber).is_err() {
    eprintln!("tracing subscriber already installed");
  }
}

fn price_provider(data_dir: Option<&Path>) -> Result<Box<dyn PriceHistoryProvider>> {
  if let Some(dir) = data_dir {
    return Ok(Box::new(CsvDirectoryProvider::new(dir)));
  }
  #[cfg(feature = "yahoo")]
  {
    Ok(Box::new(portfolio_mc::quant::yahoo::YahooProvider::new()?))
  }
  #[cfg(not(feature = "yahoo"))]
  {
    anyhow::bail!("no price source: pass --data-dir or build with the `yahoo` feature")
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let mut config = match &cli.config {
    Some(path) => AppConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
    None => AppConfig::default(),
  };
  if let Some(path) = &cli.results {
    config.store.result_path = path.clone();
  }
  let store = ResultStore::new(&config.store.result_path);

  match cli.command {
    Commands::Performance { tickers, html } => {
      let tickers = TickerList::for_performance(&tickers)?;
      let provider = price_provider(cli.data_dir.as_deref())?;
      let runner = SimulationRunner::new(provider, config.simulation.clone())?;
      let perf = runner.performance(&tickers)?;
      let path = html.unwrap_or(config.charts.performance_html);
      plot_performance(&perf, &path)?;
      if let Some(last) = perf.last() {
        for (ticker, pct) in perf.tickers.iter().zip(last.iter()) {
          println!("{ticker}: {pct:.2}%");
        }
      }
      println!("chart written to {}", path.display());
    }
    Commands::Simulate {
      tickers,
      trials,
      years,
      seed,
      parallel,
    } => {
      let tickers = TickerList::for_simulation(&tickers)?;
      let mut sim = config.simulation.clone();
      if let Some(trials) = trials {
        sim.trial_count = trials;
      }
      if let Some(years) = years {
        sim.lookback_years = years;
      }
      if seed.is_some() {
        sim.seed = seed;
      }
      sim.parallel |= parallel;
      sim.show_progress = true;

      let provider = price_provider(cli.data_dir.as_deref())?;
      let runner = SimulationRunner::new(provider, sim)?;
      let table = runner.run(&tickers)?;
      store
        .persist(&table)
        .with_context(|| format!("storing result at {}", store.path().display()))?;
      info!(rows = table.len(), "simulation stored");
      println!("{}", top_table(&table, config.charts.top_rows));
      println!("{} trials stored at {}", table.len(), store.path().display());
    }
    Commands::Chart { html } => {
      let table = store.load()?;
      let path = html.unwrap_or(config.charts.risk_return_html);
      plot_risk_return(&table, &path)?;
      println!("chart written to {}", path.display());
    }
    Commands::Top { rows } => {
      let table = store.load()?;
      println!("{}", top_table(&table, rows.unwrap_or(config.charts.top_rows)));
    }
    Commands::Export { output, rows } => {
      let table = store.load()?;
      let path = output.unwrap_or(config.export.path);
      export_top_n(&table, &path, rows.or(config.export.rows))?;
      println!("results exported to {}", path.display());
    }
  }

  Ok(())
}
