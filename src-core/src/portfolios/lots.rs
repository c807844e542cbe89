use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::VecDeque;

use crate::constants::{is_units_significant, UNIT_EPSILON};
use crate::portfolios::portfolios_errors::PortfolioError;
use crate::transactions::{Transaction, TransactionType};

/// A BUY's remaining unsold units at the NAV it was bought. Derived from
/// the log on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub tx_id: i64,
    pub units: Decimal,
    pub nav: Decimal,
    pub executed_at: NaiveDateTime,
}

/// The cached aggregate as pure numbers. `avg_nav` is preserved across
/// SELLs; a SELL rescales `invested_value` to `total_units × avg_nav`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionAggregate {
    pub total_units: Decimal,
    pub invested_value: Decimal,
    pub avg_nav: Decimal,
}

impl PositionAggregate {
    pub fn is_empty(&self) -> bool {
        !is_units_significant(&self.total_units)
    }

    pub fn differs_from(&self, other: &PositionAggregate) -> bool {
        (self.total_units - other.total_units).abs() > UNIT_EPSILON
            || (self.invested_value - other.invested_value).abs() > UNIT_EPSILON
    }
}

/// Derive the open lot queue from a log ordered by `(executed_at, id)`
/// ascending. Each SELL consumes from the head; partial consumption leaves
/// the residual at the head.
pub fn open_lots(log: &[Transaction]) -> VecDeque<Lot> {
    let mut lots: VecDeque<Lot> = VecDeque::new();

    for tx in log {
        match tx.tx_type {
            TransactionType::Buy => lots.push_back(Lot {
                tx_id: tx.id,
                units: tx.units,
                nav: tx.nav,
                executed_at: tx.executed_at,
            }),
            TransactionType::Sell => {
                let mut to_consume = tx.units;
                while to_consume > UNIT_EPSILON {
                    let Some(head) = lots.front_mut() else {
                        // An oversold log cannot be produced through the
                        // engine; tolerate it rather than panic.
                        break;
                    };
                    if head.units <= to_consume + UNIT_EPSILON {
                        to_consume -= head.units;
                        lots.pop_front();
                    } else {
                        head.units -= to_consume;
                        to_consume = Decimal::ZERO;
                    }
                }
            }
        }
    }

    lots
}

/// Consume `units` from the head of the open lot queue at `sell_nav` and
/// return the realized P/L: `Σ (sell_nav − lot_nav) × δ`.
pub fn consume_units(
    lots: &mut VecDeque<Lot>,
    units: Decimal,
    sell_nav: Decimal,
) -> Result<Decimal, PortfolioError> {
    let held: Decimal = lots.iter().map(|lot| lot.units).sum();
    if held + UNIT_EPSILON < units {
        return Err(PortfolioError::InsufficientUnits {
            requested: units,
            held,
        });
    }

    let mut remaining = units;
    let mut realized = Decimal::ZERO;

    while remaining > UNIT_EPSILON {
        let Some(head) = lots.front_mut() else {
            break;
        };
        let slice = remaining.min(head.units);
        realized += (sell_nav - head.nav) * slice;
        if head.units - slice <= UNIT_EPSILON {
            lots.pop_front();
        } else {
            head.units -= slice;
        }
        remaining -= slice;
    }

    Ok(realized)
}

/// Rebuild the cached aggregate by replaying the ordered log.
pub fn replay(log: &[Transaction]) -> PositionAggregate {
    let mut agg = PositionAggregate::default();

    for tx in log {
        match tx.tx_type {
            TransactionType::Buy => {
                agg.total_units += tx.units;
                agg.invested_value += tx.units * tx.nav;
                if is_units_significant(&agg.total_units) {
                    agg.avg_nav = agg.invested_value / agg.total_units;
                }
            }
            TransactionType::Sell => {
                agg.total_units -= tx.units;
                if is_units_significant(&agg.total_units) {
                    agg.invested_value = agg.total_units * agg.avg_nav;
                } else {
                    agg.total_units = Decimal::ZERO;
                    agg.invested_value = Decimal::ZERO;
                }
            }
        }
    }

    agg
}

/// Replay only the log entries executed on or before the end of `date`.
/// Used by the valuation history sweep.
pub fn replay_through(log: &[Transaction], date: chrono::NaiveDate) -> PositionAggregate {
    let cutoff: Vec<Transaction> = log
        .iter()
        .filter(|tx| tx.executed_at.date() <= date)
        .cloned()
        .collect();
    replay(&cutoff)
}
