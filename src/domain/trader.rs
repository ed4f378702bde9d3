//! Day-by-day trading engine.
//!
//! Each trading day runs the same fixed sequence against the ledger:
//!
//! 1. flag intraday patterns per held symbol (sell-high/rebuy-close wins
//!    over sell-open/rebuy-low)
//! 2. flag symbols whose holding reached their remaining sell capacity
//! 3. sell flagged open/low symbols at the open, reserving cash to rebuy at the low
//! 4. split the unreserved balance across buy candidates, buy at the low
//! 5. sell wanted and forced symbols at the high
//! 6. rebuy the step 3 shares at the low
//! 7. sell flagged high/close symbols at the high
//! 8. rebuy the step 7 shares at the close
//!
//! Any ledger rejection aborts the run.

use chrono::{Duration, NaiveDate};
use log::{debug, info};
use std::collections::BTreeMap;

use super::error::DaytraderError;
use super::portfolio::{DEFAULT_VOLUME_CAP, Portfolio};
use super::price_row::PriceRow;
use super::price_table::PriceTable;
use super::transaction::TransactionType;

/// Symbol to share count for one phase.
pub type Trades = BTreeMap<String, i64>;

#[derive(Debug, Clone, PartialEq)]
pub struct TraderConfig {
    /// Largest order as a fraction of the day's volume.
    pub volume_cap: f64,
    /// Days before the horizon at which intraday trading and buying stop.
    pub days_to_start_mass_sell: i64,
}

impl Default for TraderConfig {
    fn default() -> Self {
        TraderConfig {
            volume_cap: DEFAULT_VOLUME_CAP,
            days_to_start_mass_sell: 0,
        }
    }
}

/// Per-symbol decisions for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayFlags {
    pub sell_high_rebuy_close: bool,
    pub sell_open_rebuy_low: bool,
    pub must_liquidate: bool,
}

impl DayFlags {
    fn intraday(&self) -> bool {
        self.sell_high_rebuy_close || self.sell_open_rebuy_low
    }
}

/// What one day executed, phase by phase. The rebuy-low phase repeats
/// `sell_open`; the closing phase repeats `sell_high_rebuy_close`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayTrades {
    pub sell_open: Trades,
    pub reserved_for_rebuy: f64,
    pub buy_low: Trades,
    pub sell_high: Trades,
    pub sell_high_rebuy_close: Trades,
}

impl DayTrades {
    pub fn is_empty(&self) -> bool {
        self.sell_open.is_empty()
            && self.buy_low.is_empty()
            && self.sell_high.is_empty()
            && self.sell_high_rebuy_close.is_empty()
    }
}

pub struct Trader<'a> {
    table: &'a PriceTable,
    portfolio: Portfolio,
    config: TraderConfig,
    horizon: Option<NaiveDate>,
}

impl<'a> Trader<'a> {
    /// The ledger adopts the configured volume cap so its checks agree with
    /// the order sizes computed here.
    pub fn new(table: &'a PriceTable, portfolio: Portfolio, config: TraderConfig) -> Self {
        Trader {
            table,
            portfolio: portfolio.with_volume_cap(config.volume_cap),
            config,
            horizon: table.horizon(),
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn into_portfolio(self) -> Portfolio {
        self.portfolio
    }

    pub fn mass_sell_start(&self) -> Option<NaiveDate> {
        self.horizon
            .map(|end| end - Duration::days(self.config.days_to_start_mass_sell))
    }

    pub fn trade(&mut self) -> Result<(), DaytraderError> {
        let (Some(horizon), Some(mass_sell_start)) = (self.horizon, self.mass_sell_start()) else {
            info!("price table is empty, nothing to trade");
            return Ok(());
        };
        info!("horizon {horizon}, mass selling from {mass_sell_start}");
        if let Some(min_close) = self.table.all_time_min_close_date() {
            debug!("earliest all-time-min close date {min_close}");
        }

        let table = self.table;
        for day in table.days() {
            let trades = self.trade_day(day)?;
            if !trades.is_empty() {
                debug!("{day}: {trades:?}");
            }
        }
        Ok(())
    }

    /// Run every phase for one day.
    pub fn trade_day(&mut self, day: NaiveDate) -> Result<DayTrades, DaytraderError> {
        let table = self.table;
        let rows: Vec<&'a PriceRow> = table.rows_on(day).collect();
        let wind_down = self.in_mass_sell_window(day);

        let flags: Vec<DayFlags> = rows.iter().map(|row| self.flags(row, wind_down)).collect();
        let (rows_ref, flags_ref) = (&rows, &flags);
        let flagged = move |pick: fn(&DayFlags) -> bool| {
            rows_ref
                .iter()
                .zip(flags_ref)
                .filter(move |(_, f)| pick(f))
                .map(|(row, _)| *row)
        };

        // opening
        let sell_open = self.sell_counts(flagged(|f| f.sell_open_rebuy_low));
        let reserved_for_rebuy: f64 = sell_open
            .iter()
            .map(|(symbol, &count)| count as f64 * self.row(day, symbol).map_or(0.0, |r| r.low))
            .sum();
        self.execute_trades(day, &sell_open, TransactionType::SellOpen)?;

        // midday buy
        let budget = self.portfolio.get_balance() - reserved_for_rebuy;
        let candidates = rows.iter().zip(&flags).filter(|(row, f)| {
            row.signals.want_to_buy
                && row.low < budget
                && !f.intraday()
                && !f.must_liquidate
                && !wind_down
        });
        let buy_low = self.allocate_budget(candidates.map(|(row, _)| *row), budget);
        self.execute_trades(day, &buy_low, TransactionType::BuyLow)?;

        // midday sell
        let sell_set = rows.iter().zip(&flags).filter(|(row, f)| {
            (row.signals.want_to_sell || f.must_liquidate) && self.portfolio.held(&row.symbol) > 0
        });
        let sell_high = self.sell_counts(sell_set.map(|(row, _)| *row));
        self.execute_trades(day, &sell_high, TransactionType::SellHigh)?;

        // rebuy low
        self.execute_trades(day, &sell_open, TransactionType::BuyLow)?;

        // sell high to rebuy at close
        let sell_high_rebuy_close = self.sell_counts(flagged(|f| f.sell_high_rebuy_close));
        self.execute_trades(day, &sell_high_rebuy_close, TransactionType::SellHigh)?;

        // closing
        self.execute_trades(day, &sell_high_rebuy_close, TransactionType::BuyClose)?;

        Ok(DayTrades {
            sell_open,
            reserved_for_rebuy,
            buy_low,
            sell_high,
            sell_high_rebuy_close,
        })
    }

    pub fn in_mass_sell_window(&self, day: NaiveDate) -> bool {
        self.horizon
            .is_some_and(|end| (end - day).num_days() < self.config.days_to_start_mass_sell)
    }

    /// Intraday and liquidation flags for one row against the current ledger.
    pub fn flags(&self, row: &PriceRow, wind_down: bool) -> DayFlags {
        let held = self.portfolio.held(&row.symbol);
        // also true for an unheld symbol with no capacity left, which keeps it out of buying
        let must_liquidate = held >= row.signals.can_sell;
        let eligible = held > 0 && !row.signals.want_to_sell && !must_liquidate && !wind_down;

        let sell_high_rebuy_close = eligible && row.closes_at_low();
        let sell_open_rebuy_low = eligible && !sell_high_rebuy_close && row.opens_at_high();

        DayFlags {
            sell_high_rebuy_close,
            sell_open_rebuy_low,
            must_liquidate,
        }
    }

    /// Sell as much as permitted: min(held, volume cap) per symbol.
    fn sell_counts<'r>(&self, rows: impl Iterator<Item = &'r PriceRow>) -> Trades {
        rows.map(|row| {
            let count = self
                .portfolio
                .held(&row.symbol)
                .min(row.volume_cap(self.config.volume_cap));
            (row.symbol.clone(), count)
        })
        .filter(|(_, count)| *count > 0)
        .collect()
    }

    // TODO: weight the split by signal strength instead of dividing evenly.
    fn allocate_budget<'r>(&self, rows: impl Iterator<Item = &'r PriceRow>, budget: f64) -> Trades {
        let rows: Vec<&PriceRow> = rows.collect();
        if rows.is_empty() || budget <= 0.0 {
            return Trades::new();
        }

        let share = budget / rows.len() as f64;
        rows.into_iter()
            .map(|row| {
                let affordable = (share / row.low).floor() as i64;
                let count = affordable.min(row.volume_cap(self.config.volume_cap));
                (row.symbol.clone(), count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    fn execute_trades(
        &mut self,
        day: NaiveDate,
        trades: &Trades,
        transaction_type: TransactionType,
    ) -> Result<(), DaytraderError> {
        for (symbol, &count) in trades {
            let row = self
                .row(day, symbol)
                .ok_or_else(|| DaytraderError::MissingPriceRow {
                    day,
                    symbol: symbol.clone(),
                })?;
            self.portfolio.apply(row, transaction_type, count)?;
        }
        Ok(())
    }

    fn row(&self, day: NaiveDate, symbol: &str) -> Option<&'a PriceRow> {
        self.table.row(day, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::LedgerError;
    use crate::domain::price_row::Signals;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 1, d).unwrap()
    }

    fn bar(symbol: &str, d: u32, ohlc: [f64; 4], volume: i64) -> PriceRow {
        PriceRow {
            day: day(d),
            symbol: symbol.to_string(),
            open: ohlc[0],
            high: ohlc[1],
            low: ohlc[2],
            close: ohlc[3],
            volume,
            signals: Signals::default(),
        }
    }

    fn buy_signal(mut row: PriceRow) -> PriceRow {
        row.signals.want_to_buy = true;
        row
    }

    /// A ledger already holding `count` of `symbol`, bought on day 1.
    fn holding(symbol: &str, count: i64, balance: f64) -> Portfolio {
        let mut p = Portfolio::new(balance + count as f64);
        p.buy(
            &bar(symbol, 1, [1.0, 1.0, 1.0, 1.0], count * 10),
            TransactionType::BuyLow,
            count,
        )
        .unwrap();
        p
    }

    #[test]
    fn closes_at_low_wins_over_opens_at_high() {
        // open == high and low == close: both shapes
        let table = PriceTable::new(vec![bar("x", 2, [5.0, 5.0, 3.0, 3.0], 1000)]);
        let mut trader = Trader::new(&table, holding("x", 10, 0.0), TraderConfig::default());

        let trades = trader.trade_day(day(2)).unwrap();

        assert!(trades.sell_open.is_empty());
        assert_eq!(trades.sell_high_rebuy_close.get("x"), Some(&10));
        assert_eq!(trader.portfolio().held("x"), 10);
        // sold at 5, rebought at 3
        assert_relative_eq!(trader.portfolio().get_balance(), 20.0);
    }

    #[test]
    fn sell_open_rebuy_low_sized_by_volume() {
        let table = PriceTable::new(vec![bar("x", 2, [4.0, 4.0, 2.0, 3.0], 50)]);
        let mut trader = Trader::new(&table, holding("x", 10, 0.0), TraderConfig::default());

        let trades = trader.trade_day(day(2)).unwrap();

        assert_eq!(trades.sell_open.get("x"), Some(&5));
        assert_relative_eq!(trades.reserved_for_rebuy, 10.0);
        assert_eq!(trader.portfolio().held("x"), 10);

        let history = trader.portfolio().history();
        let last_two: Vec<_> = history[history.len() - 2..]
            .iter()
            .map(|t| (t.transaction_type, t.count))
            .collect();
        assert_eq!(
            last_two,
            vec![(TransactionType::SellOpen, 5), (TransactionType::BuyLow, 5)]
        );
    }

    #[test]
    fn reserve_is_not_spent_on_buys() {
        let table = PriceTable::new(vec![
            bar("x", 2, [4.0, 4.0, 2.0, 3.0], 50),
            buy_signal(bar("y", 2, [1.0, 1.0, 1.0, 1.0], 10_000)),
        ]);
        let mut trader = Trader::new(&table, holding("x", 10, 0.0), TraderConfig::default());

        let trades = trader.trade_day(day(2)).unwrap();

        // 20 from the open sale, 10 reserved, 10 left for y at 1.0
        assert_eq!(trades.buy_low.get("y"), Some(&10));
        assert_eq!(trader.portfolio().held("x"), 10);
        assert_relative_eq!(trader.portfolio().get_balance(), 0.0);
    }

    #[test]
    fn intraday_skips_unheld_and_want_to_sell() {
        let mut wants_out = bar("w", 2, [5.0, 5.0, 3.0, 3.0], 1000);
        wants_out.signals.want_to_sell = true;
        let table = PriceTable::new(vec![wants_out.clone(), bar("u", 2, [5.0, 5.0, 3.0, 3.0], 1000)]);
        let trader = Trader::new(&table, holding("w", 10, 0.0), TraderConfig::default());

        assert_eq!(trader.flags(&wants_out, false), DayFlags::default());
        assert_eq!(
            trader.flags(table.row(day(2), "u").unwrap(), false),
            DayFlags::default()
        );
    }

    #[test]
    fn forced_liquidation_overrides_intraday() {
        let mut row = bar("x", 2, [5.0, 5.0, 3.0, 3.0], 1000);
        row.signals.can_sell = 10;
        let table = PriceTable::new(vec![row.clone()]);
        let mut trader = Trader::new(&table, holding("x", 10, 0.0), TraderConfig::default());

        let flags = trader.flags(&row, false);
        assert!(flags.must_liquidate);
        assert!(!flags.sell_high_rebuy_close);

        let trades = trader.trade_day(day(2)).unwrap();
        assert_eq!(trades.sell_high.get("x"), Some(&10));
        assert!(trader.portfolio().get_holdings().is_empty());
    }

    #[test]
    fn liquidation_excludes_buying() {
        let mut row = buy_signal(bar("x", 2, [1.0, 2.0, 1.0, 1.5], 1000));
        row.signals.can_sell = 5;
        let table = PriceTable::new(vec![row]);
        let mut trader = Trader::new(&table, holding("x", 10, 100.0), TraderConfig::default());

        let trades = trader.trade_day(day(2)).unwrap();
        assert!(trades.buy_low.is_empty());
        assert_eq!(trades.sell_high.get("x"), Some(&10));
    }

    #[test]
    fn no_buy_without_sell_capacity() {
        let mut row = buy_signal(bar("x", 1, [1.0, 1.0, 0.5, 1.0], 1000));
        row.signals.can_sell = 0;
        let table = PriceTable::new(vec![row.clone()]);
        let mut trader = Trader::new(&table, Portfolio::new(10.0), TraderConfig::default());

        assert!(trader.flags(&row, false).must_liquidate);
        let trades = trader.trade_day(day(1)).unwrap();
        assert!(trades.is_empty());
        assert_eq!(trader.portfolio().held("x"), 0);
        assert_relative_eq!(trader.portfolio().get_balance(), 10.0);
    }

    #[test]
    fn trade_aborts_on_ledger_rejection() {
        let table = PriceTable::new(vec![
            buy_signal(bar("a", 1, [1.0, 1.0, 0.5, 1.0], 1000)),
            buy_signal(bar("a", 3, [1.0, 1.0, 0.5, 1.0], 1000)),
        ]);
        // history already on day 2, so the day 1 buy is out of order
        let mut portfolio = Portfolio::new(20.0);
        portfolio
            .buy(&bar("b", 2, [1.0, 1.0, 1.0, 1.0], 1000), TransactionType::BuyLow, 1)
            .unwrap();
        let mut trader = Trader::new(&table, portfolio, TraderConfig::default());

        let err = trader.trade().unwrap_err();
        assert!(matches!(
            err,
            DaytraderError::Ledger(LedgerError::OutOfOrderDay { .. })
        ));
        assert_eq!(trader.portfolio().history().len(), 1);
        assert_eq!(trader.portfolio().held("a"), 0);
    }

    #[test]
    fn budget_split_equally() {
        let table = PriceTable::new(vec![
            buy_signal(bar("a", 1, [1.0, 1.0, 0.5, 1.0], 10_000)),
            buy_signal(bar("b", 1, [1.0, 1.0, 0.25, 1.0], 10_000)),
        ]);
        let mut trader = Trader::new(&table, Portfolio::new(10.0), TraderConfig::default());

        let trades = trader.trade_day(day(1)).unwrap();
        assert_eq!(trades.buy_low.get("a"), Some(&10));
        assert_eq!(trades.buy_low.get("b"), Some(&20));
        assert_relative_eq!(trader.portfolio().get_balance(), 0.0);
    }

    #[test]
    fn buy_capped_by_volume_and_drops_zero() {
        let table = PriceTable::new(vec![
            buy_signal(bar("a", 1, [1.0, 1.0, 0.5, 1.0], 30)),
            buy_signal(bar("b", 1, [1.0, 1.0, 0.5, 1.0], 5)),
        ]);
        let mut trader = Trader::new(&table, Portfolio::new(100.0), TraderConfig::default());

        let trades = trader.trade_day(day(1)).unwrap();
        assert_eq!(trades.buy_low.len(), 1);
        assert_eq!(trades.buy_low.get("a"), Some(&3));
    }

    #[test]
    fn unaffordable_candidates_skipped() {
        let table = PriceTable::new(vec![buy_signal(bar("a", 1, [3.0, 3.0, 2.0, 3.0], 1000))]);
        let mut trader = Trader::new(&table, Portfolio::default(), TraderConfig::default());

        let trades = trader.trade_day(day(1)).unwrap();
        assert!(trades.is_empty());
        assert_eq!(trader.portfolio().get_balance(), 1.0);
    }

    #[test]
    fn want_to_sell_sold_at_high() {
        let mut row = bar("x", 2, [2.0, 3.0, 1.0, 2.0], 40);
        row.signals.want_to_sell = true;
        let table = PriceTable::new(vec![row]);
        let mut trader = Trader::new(&table, holding("x", 10, 0.0), TraderConfig::default());

        let trades = trader.trade_day(day(2)).unwrap();
        assert_eq!(trades.sell_high.get("x"), Some(&4));
        assert_eq!(trader.portfolio().held("x"), 6);
        assert_relative_eq!(trader.portfolio().get_balance(), 12.0);
    }

    #[test]
    fn mass_sell_window_suppresses_buys_and_intraday() {
        let table = PriceTable::new(vec![
            buy_signal(bar("a", 1, [1.0, 1.0, 0.5, 1.0], 1000)),
            buy_signal(bar("a", 9, [1.0, 1.0, 0.5, 1.0], 1000)),
            buy_signal(bar("a", 10, [1.0, 1.0, 0.5, 1.0], 1000)),
        ]);
        let config = TraderConfig {
            days_to_start_mass_sell: 2,
            ..TraderConfig::default()
        };
        let mut trader = Trader::new(&table, Portfolio::default(), config);

        assert_eq!(trader.mass_sell_start(), Some(day(8)));
        assert!(!trader.in_mass_sell_window(day(8)));
        assert!(trader.in_mass_sell_window(day(9)));

        assert!(!trader.trade_day(day(1)).unwrap().buy_low.is_empty());
        assert!(trader.trade_day(day(9)).unwrap().buy_low.is_empty());
    }

    #[test]
    fn trade_walks_every_day() {
        let table = PriceTable::new(vec![
            buy_signal(bar("a", 1, [1.0, 1.0, 0.5, 1.0], 1000)),
            bar("a", 2, [0.9, 1.0, 0.5, 0.8], 1000),
        ]);
        let mut trader = Trader::new(&table, Portfolio::default(), TraderConfig::default());
        trader.trade().unwrap();

        let p = trader.into_portfolio();
        assert_eq!(p.held("a"), 2);
        assert_eq!(p.history().len(), 1);
    }

    #[test]
    fn empty_table_is_a_no_op() {
        let table = PriceTable::default();
        let mut trader = Trader::new(&table, Portfolio::default(), TraderConfig::default());
        trader.trade().unwrap();
        assert!(trader.portfolio().history().is_empty());
    }
}
