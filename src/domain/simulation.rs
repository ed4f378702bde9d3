//! Simulation run configuration and result.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::DaytraderError;
use super::portfolio::{DEFAULT_INITIAL_BALANCE, DEFAULT_VOLUME_CAP, Portfolio};
use super::price_table::PriceTable;
use super::trader::{Trader, TraderConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub initial_balance: f64,
    pub volume_cap: f64,
    pub days_to_start_mass_sell: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            volume_cap: DEFAULT_VOLUME_CAP,
            days_to_start_mass_sell: 0,
        }
    }
}

impl SimulationConfig {
    pub fn trader_config(&self) -> TraderConfig {
        TraderConfig {
            volume_cap: self.volume_cap,
            days_to_start_mass_sell: self.days_to_start_mass_sell,
        }
    }

    pub fn new_portfolio(&self) -> Portfolio {
        Portfolio::new(self.initial_balance).with_volume_cap(self.volume_cap)
    }
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub portfolio: Portfolio,
    pub last_day: Option<NaiveDate>,
    /// Cash plus holdings marked at the last day's closes.
    pub net_worth: f64,
}

impl SimulationResult {
    pub fn balance(&self) -> f64 {
        self.portfolio.get_balance()
    }

    pub fn holdings(&self) -> &BTreeMap<String, i64> {
        self.portfolio.get_holdings()
    }

    pub fn transaction_count(&self) -> usize {
        self.portfolio.history().len()
    }
}

pub fn run_simulation(
    table: &PriceTable,
    config: &SimulationConfig,
) -> Result<SimulationResult, DaytraderError> {
    let mut trader = Trader::new(table, config.new_portfolio(), config.trader_config());
    trader.trade()?;
    let portfolio = trader.into_portfolio();

    let last_day = table.last_day();
    let net_worth = match last_day {
        Some(day) => portfolio.net_worth(table, day),
        None => portfolio.get_balance(),
    };

    Ok(SimulationResult {
        portfolio,
        last_day,
        net_worth,
    })
}
