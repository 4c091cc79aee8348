use core::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmstock_core::{LotId, SupplyId};

/// A sealed, dated batch (`lote`) of a supply.
///
/// `quantity` is what was received and never changes. `remaining` starts equal
/// to `quantity` and drops to 0 exactly once, when the lot is consumed into
/// floor stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,
    pub supply_id: SupplyId,
    pub label: String,
    pub quantity: i64,
    pub remaining: i64,
    pub expiration_date: Option<NaiveDate>,
    pub unit_price: Option<Decimal>,
    pub location: Option<String>,
    pub active: bool,
    pub received_at: DateTime<Utc>,
}

impl Lot {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_available(&self) -> bool {
        self.remaining > 0
    }
}

/// First-expire-first-out comparison: earlier expiration first, lots without
/// an expiration date last.
pub fn fefo_cmp(a: &Lot, b: &Lot) -> Ordering {
    match (a.expiration_date, b.expiration_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort lots FEFO in place.
///
/// The sort is stable: callers pass lots in creation order and ties keep it.
pub fn sort_fefo(lots: &mut [Lot]) {
    lots.sort_by(fefo_cmp);
}
