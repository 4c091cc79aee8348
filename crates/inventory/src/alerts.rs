//! Alert evaluation: low stock, upcoming expirations, expired items, and
//! the stock severity band shown next to each supply.
//!
//! Everything here is a pure function of the supplies passed in and the date
//! considered "today". Nothing is cached or persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pharmstock_core::{DomainError, DomainResult, SupplyId};

use crate::supply::Supply;

/// Default look-ahead for the near-expiration set.
pub const DEFAULT_EXPIRY_HORIZON_DAYS: u32 = 30;

/// Warning threshold used when a supply has no minimum configured.
pub const UNCONFIGURED_WARNING_STOCK: i64 = 25;

/// Look-ahead window for near-expiration alerts, in days (inclusive).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpiryHorizon(u32);

impl ExpiryHorizon {
    pub fn days(days: i64) -> DomainResult<Self> {
        if days < 0 {
            return Err(DomainError::validation(format!(
                "horizon must be 0 or more days (got {days})"
            )));
        }
        u32::try_from(days).map(Self).map_err(|_| {
            DomainError::validation(format!(
                "horizon must be at most {} days (got {days})",
                u32::MAX
            ))
        })
    }

    pub fn as_days(self) -> u32 {
        self.0
    }
}

impl Default for ExpiryHorizon {
    fn default() -> Self {
        Self(DEFAULT_EXPIRY_HORIZON_DAYS)
    }
}

/// Severity band for displaying floor stock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBand {
    Critical,
    Warning,
    Normal,
}

/// Where a supply's own expiration date falls relative to today.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExpirationStatus {
    NoExpiration,
    Expired { days_overdue: i64 },
    ExpiringSoon { days_remaining: i64 },
    Ok { days_remaining: i64 },
}

/// Alert state of a single supply, returned after every ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyAlertSnapshot {
    pub supply_id: SupplyId,
    pub low_stock: bool,
    pub band: StockBand,
    pub expiration: ExpirationStatus,
}

/// Dashboard counters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlertSummary {
    pub low_stock: usize,
    pub expiring_soon: usize,
    pub expired: usize,
}

impl AlertSummary {
    /// Badge count: low stock plus expiring soon. Expired supplies are
    /// reported on their own and do not add to it.
    pub fn total(&self) -> usize {
        self.low_stock + self.expiring_soon
    }
}

/// Low stock: a minimum is configured and floor stock is at or below it.
pub fn is_low_stock(supply: &Supply) -> bool {
    supply.has_min_stock() && supply.stock <= supply.min_stock
}

pub fn stock_band(supply: &Supply) -> StockBand {
    if is_low_stock(supply) {
        return StockBand::Critical;
    }
    let warning_at = if supply.has_min_stock() {
        supply.min_stock.saturating_mul(2)
    } else {
        UNCONFIGURED_WARNING_STOCK
    };
    if supply.stock <= warning_at {
        StockBand::Warning
    } else {
        StockBand::Normal
    }
}

pub fn expiration_status(supply: &Supply, today: NaiveDate, horizon: ExpiryHorizon) -> ExpirationStatus {
    let Some(expires) = supply.expiration_date else {
        return ExpirationStatus::NoExpiration;
    };
    let days = (expires - today).num_days();
    if days < 0 {
        ExpirationStatus::Expired { days_overdue: -days }
    } else if days <= i64::from(horizon.as_days()) {
        ExpirationStatus::ExpiringSoon { days_remaining: days }
    } else {
        ExpirationStatus::Ok { days_remaining: days }
    }
}

pub fn snapshot(supply: &Supply, today: NaiveDate, horizon: ExpiryHorizon) -> SupplyAlertSnapshot {
    SupplyAlertSnapshot {
        supply_id: supply.id,
        low_stock: is_low_stock(supply),
        band: stock_band(supply),
        expiration: expiration_status(supply, today, horizon),
    }
}

/// Active supplies at or below their configured minimum, by name.
pub fn low_stock<'a, I>(supplies: I) -> Vec<Supply>
where
    I: IntoIterator<Item = &'a Supply>,
{
    let mut out: Vec<Supply> = supplies
        .into_iter()
        .filter(|s| s.active && is_low_stock(s))
        .cloned()
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Active supplies whose own expiration date lies in `[today, today + horizon]`,
/// soonest first. Already-expired supplies are not included; see [`expired`].
pub fn expiring_soon<'a, I>(supplies: I, today: NaiveDate, horizon: ExpiryHorizon) -> Vec<Supply>
where
    I: IntoIterator<Item = &'a Supply>,
{
    by_expiration(supplies, |s| {
        matches!(
            expiration_status(s, today, horizon),
            ExpirationStatus::ExpiringSoon { .. }
        )
    })
}

/// Active supplies whose own expiration date is before today, oldest first.
pub fn expired<'a, I>(supplies: I, today: NaiveDate) -> Vec<Supply>
where
    I: IntoIterator<Item = &'a Supply>,
{
    by_expiration(supplies, |s| {
        matches!(
            expiration_status(s, today, ExpiryHorizon::default()),
            ExpirationStatus::Expired { .. }
        )
    })
}

pub fn summary(supplies: &[Supply], today: NaiveDate, horizon: ExpiryHorizon) -> AlertSummary {
    AlertSummary {
        low_stock: low_stock(supplies).len(),
        expiring_soon: expiring_soon(supplies, today, horizon).len(),
        expired: expired(supplies, today).len(),
    }
}

fn by_expiration<'a, I, F>(supplies: I, keep: F) -> Vec<Supply>
where
    I: IntoIterator<Item = &'a Supply>,
    F: Fn(&Supply) -> bool,
{
    let mut out: Vec<Supply> = supplies
        .into_iter()
        .filter(|s| s.active && keep(s))
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        a.expiration_date
            .cmp(&b.expiration_date)
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}
