//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::signal_adapter::read_signals;
use crate::adapters::transaction_file_adapter::TransactionFile;
use crate::domain::config_validation::validate_simulation_config;
use crate::domain::error::DaytraderError;
use crate::domain::portfolio::{DEFAULT_INITIAL_BALANCE, DEFAULT_VOLUME_CAP, Portfolio};
use crate::domain::price_table::{load_price_table, PriceTable};
use crate::domain::replay::replay_into;
use crate::domain::simulation::{run_simulation, SimulationConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::transaction_port::TransactionStore;

#[derive(Parser, Debug)]
#[command(name = "daytrader", about = "Rule-based day-trading simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the trading strategy over the configured price data
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Signal file, overriding [data] signals
        #[arg(short, long)]
        signals: Option<PathBuf>,
        /// Transaction file to write, overriding [output] transactions
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rebuild a ledger from a transaction file and report its state
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        transactions: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols found in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            signals,
            output,
        } => run_simulate(&config, signals.as_deref(), output.as_deref()),
        Command::Replay {
            config,
            transactions,
        } => run_replay(&config, &transactions),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

fn fail(err: DaytraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Load and validate a config file in one step.
fn load_valid_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    validate_simulation_config(&adapter).map_err(fail)?;
    Ok(adapter)
}

pub fn build_simulation_config(adapter: &dyn ConfigPort) -> SimulationConfig {
    SimulationConfig {
        initial_balance: adapter.get_double("simulation", "initial_balance", DEFAULT_INITIAL_BALANCE),
        volume_cap: adapter.get_double("simulation", "volume_cap", DEFAULT_VOLUME_CAP),
        days_to_start_mass_sell: adapter.get_int("simulation", "days_to_start_mass_sell", 0),
    }
}

pub fn data_dir(adapter: &dyn ConfigPort) -> Result<PathBuf, DaytraderError> {
    adapter
        .get_string("data", "dir")
        .map(PathBuf::from)
        .ok_or_else(|| DaytraderError::ConfigMissing {
            section: "data".into(),
            key: "dir".into(),
        })
}

/// Price table from the data port, with the signal file overlaid when one
/// is given.
pub fn build_price_table(
    data_port: &dyn DataPort,
    signals_path: Option<&Path>,
) -> Result<PriceTable, DaytraderError> {
    let mut table = load_price_table(data_port)?;
    eprintln!(
        "Loaded {} rows for {} symbols over {} days",
        table.row_count(),
        table.symbols().len(),
        table.days().count()
    );

    if let Some(path) = signals_path {
        let records = read_signals(path)?;
        let total = records.len();
        let unmatched = table.attach_signals(records);
        eprintln!(
            "Attached {} signal rows from {} ({} without a price row)",
            total - unmatched,
            path.display(),
            unmatched
        );
    }
    Ok(table)
}

fn run_simulate(config_path: &Path, signals: Option<&Path>, output: Option<&Path>) -> ExitCode {
    // Stage 1: config
    let adapter = match load_valid_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let sim_config = build_simulation_config(&adapter);

    // Stage 2: price data
    let dir = match data_dir(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let signals_path = signals
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("data", "signals").map(PathBuf::from));
    let output_path = output
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("output", "transactions").map(PathBuf::from));

    let data_port = CsvAdapter::new(dir);
    let table = match build_price_table(&data_port, signals_path.as_deref()) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    // Stage 3: simulate and write
    let store = output_path.map(TransactionFile::new);
    run_simulate_pipeline(
        &table,
        &sim_config,
        store.as_ref().map(|s| s as &dyn TransactionStore),
    )
}

pub fn run_simulate_pipeline(
    table: &PriceTable,
    config: &SimulationConfig,
    store: Option<&dyn TransactionStore>,
) -> ExitCode {
    eprintln!(
        "Simulating with balance {}, volume cap {}, mass sell {} days before horizon",
        config.initial_balance, config.volume_cap, config.days_to_start_mass_sell
    );

    let result = match run_simulation(table, config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    println!("Transactions: {}", result.transaction_count());
    println!("Balance:      {:.6}", result.balance());
    if let Some(day) = result.last_day {
        println!("Net worth:    {:.6} (on {})", result.net_worth, day);
    }
    for (symbol, count) in result.holdings() {
        println!("  {}: {}", symbol.to_uppercase(), count);
    }

    if let Some(store) = store {
        if let Err(e) = store.write(result.portfolio.history()) {
            return fail(e);
        }
        eprintln!("Wrote {} transactions", result.transaction_count());
    }
    ExitCode::SUCCESS
}

fn run_replay(config_path: &Path, transactions_path: &Path) -> ExitCode {
    let adapter = match load_valid_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let sim_config = build_simulation_config(&adapter);
    let dir = match data_dir(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let table = match build_price_table(&CsvAdapter::new(dir), None) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };

    let store = TransactionFile::new(transactions_path.to_path_buf());
    run_replay_pipeline(&table, &sim_config, &store)
}

pub fn run_replay_pipeline(
    table: &PriceTable,
    config: &SimulationConfig,
    store: &dyn TransactionStore,
) -> ExitCode {
    let transactions = match store.read() {
        Ok(t) => t,
        Err(e) => return fail(e),
    };
    eprintln!("Replaying {} transactions", transactions.len());

    let portfolio = match replay_into(config.new_portfolio(), table, &transactions) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    print_portfolio(&portfolio, table);
    ExitCode::SUCCESS
}

fn print_portfolio(portfolio: &Portfolio, table: &PriceTable) {
    println!("Balance:      {:.6}", portfolio.get_balance());
    if let Some(day) = portfolio.last_day().or_else(|| table.last_day()) {
        println!("Net worth:    {:.6} (on {})", portfolio.net_worth(table, day), day);
    }
    for (symbol, count) in portfolio.get_holdings() {
        println!("  {}: {}", symbol.to_uppercase(), count);
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_valid_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let c = build_simulation_config(&adapter);
    eprintln!("  initial_balance:         {}", c.initial_balance);
    eprintln!("  volume_cap:              {}", c.volume_cap);
    eprintln!("  days_to_start_mass_sell: {}", c.days_to_start_mass_sell);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let dir = match data_dir(&adapter) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    match CsvAdapter::new(dir).list_symbols() {
        Ok(symbols) => {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            eprintln!("{} symbols found", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
