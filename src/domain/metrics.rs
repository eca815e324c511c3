//! Run summary and trade statistics.

use std::fmt;

use super::ledger::{CashSnapshot, Ledger};
use super::portfolio::Portfolio;

/// Pipeline counters kept by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub ticks_processed: u64,
    pub ticks_rejected: u64,
    pub orders_rejected: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub initial_cash: f64,
    pub final_cash: f64,
    pub final_equity: f64,
    pub total_return: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub trade_count: usize,
    pub open_positions: usize,
    pub ticks_processed: u64,
    pub ticks_rejected: u64,
    pub orders_rejected: u64,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub max_drawdown: f64,
}

impl RunSummary {
    pub fn compute(portfolio: &Portfolio, ledger: &Ledger, counters: RunCounters) -> Self {
        let initial_cash = portfolio.initial_cash();
        let final_equity = portfolio.equity();
        let total_return = if initial_cash > 0.0 {
            (final_equity - initial_cash) / initial_cash
        } else {
            0.0
        };

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in ledger.trades() {
            let pnl = trade.realized_pnl;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
        }

        let trade_count = ledger.trades().len();
        let win_rate = if trade_count > 0 {
            trades_won as f64 / trade_count as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };
        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        RunSummary {
            initial_cash,
            final_cash: portfolio.cash(),
            final_equity,
            total_return,
            realized_pnl: ledger.realized_pnl(),
            unrealized_pnl: portfolio.unrealized_pnl(),
            trade_count,
            open_positions: portfolio.position_count(),
            ticks_processed: counters.ticks_processed,
            ticks_rejected: counters.ticks_rejected,
            orders_rejected: counters.orders_rejected,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            max_drawdown: max_drawdown(ledger.cash_history()),
        }
    }
}

/// Largest peak-to-trough fall in equity, as a fraction of the peak.
pub fn max_drawdown(history: &[CashSnapshot]) -> f64 {
    let Some(first) = history.first() else {
        return 0.0;
    };
    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    for point in history {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run summary ===")?;
        writeln!(f, "Initial cash    : {:.2}", self.initial_cash)?;
        writeln!(f, "Final cash      : {:.2}", self.final_cash)?;
        writeln!(f, "Portfolio value : {:.2}", self.final_equity)?;
        writeln!(f, "Total return    : {:.2}%", self.total_return * 100.0)?;
        writeln!(f, "Realized P&L    : {:.2}", self.realized_pnl)?;
        writeln!(f, "Unrealized P&L  : {:.2}", self.unrealized_pnl)?;
        writeln!(
            f,
            "# trades        : {} ({} won, {} lost, {} flat)",
            self.trade_count, self.trades_won, self.trades_lost, self.trades_breakeven
        )?;
        writeln!(f, "Win rate        : {:.2}%", self.win_rate * 100.0)?;
        writeln!(f, "Profit factor   : {:.2}", self.profit_factor)?;
        writeln!(f, "Avg win / loss  : {:.2} / {:.2}", self.avg_win, self.avg_loss)?;
        writeln!(
            f,
            "Largest win/loss: {:.2} / {:.2}",
            self.largest_win, self.largest_loss
        )?;
        writeln!(f, "Max drawdown    : {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "Open positions  : {}", self.open_positions)?;
        write!(
            f,
            "Ticks           : {} processed, {} rejected; {} orders rejected",
            self.ticks_processed, self.ticks_rejected, self.orders_rejected
        )
    }
}
