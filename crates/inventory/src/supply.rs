use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmstock_core::{DomainError, DomainResult, SupplyId};

/// Catalog record of a supply (`insumo`).
///
/// `stock` is the open floor stock available for dispensing. Sealed reserve
/// lives in [`crate::Lot`]s and is not counted here until a lot is consumed.
/// `lot_label` and `expiration_date` describe the currently open reserve: they
/// are entered with the record and overwritten when a lot is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub id: SupplyId,
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub reference_code: Option<String>,
    pub supplier_id: Option<i64>,
    pub min_stock: i64,
    pub unit_price: Option<Decimal>,
    pub storage_location: Option<String>,
    pub category: Option<String>,
    pub active: bool,
    pub stock: i64,
    pub lot_label: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    /// Store-managed record version (optimistic concurrency).
    pub version: u64,
}

/// Input for creating a supply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewSupply {
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub reference_code: Option<String>,
    pub supplier_id: Option<i64>,
    pub stock: i64,
    pub min_stock: i64,
    pub unit_price: Option<Decimal>,
    pub storage_location: Option<String>,
    pub category: Option<String>,
    pub lot_label: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    /// Defaults to `true` when absent.
    pub active: Option<bool>,
}

/// Partial update of a supply. `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupplyPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub unit_of_measure: Option<Option<String>>,
    pub reference_code: Option<Option<String>>,
    pub supplier_id: Option<Option<i64>>,
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
    pub unit_price: Option<Option<Decimal>>,
    pub storage_location: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub lot_label: Option<Option<String>>,
    pub expiration_date: Option<Option<NaiveDate>>,
    pub active: Option<bool>,
}

impl SupplyPatch {
    pub fn is_empty(&self) -> bool {
        self == &SupplyPatch::default()
    }
}

impl Supply {
    /// Build a new, validated supply record (version 0, not yet stored).
    pub fn create(id: SupplyId, input: NewSupply) -> DomainResult<Self> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        ensure_non_negative("stock", input.stock)?;
        ensure_non_negative("min_stock", input.min_stock)?;
        ensure_price(input.unit_price)?;

        Ok(Self {
            id,
            name,
            description: normalize_text(input.description),
            unit_of_measure: normalize_text(input.unit_of_measure),
            reference_code: normalize_text(input.reference_code),
            supplier_id: input.supplier_id,
            min_stock: input.min_stock,
            unit_price: input.unit_price,
            storage_location: normalize_text(input.storage_location),
            category: normalize_text(input.category),
            active: input.active.unwrap_or(true),
            stock: input.stock,
            lot_label: normalize_text(input.lot_label),
            expiration_date: input.expiration_date,
            version: 0,
        })
    }

    /// Apply a partial update. Validation happens before any field changes.
    pub fn apply_patch(&mut self, patch: SupplyPatch) -> DomainResult<()> {
        let name = match patch.name {
            Some(n) => {
                let n = n.trim().to_string();
                if n.is_empty() {
                    return Err(DomainError::validation("name cannot be empty"));
                }
                Some(n)
            }
            None => None,
        };
        if let Some(stock) = patch.stock {
            ensure_non_negative("stock", stock)?;
        }
        if let Some(min) = patch.min_stock {
            ensure_non_negative("min_stock", min)?;
        }
        if let Some(price) = patch.unit_price {
            ensure_price(price)?;
        }

        if let Some(n) = name {
            self.name = n;
        }
        if let Some(v) = patch.description {
            self.description = normalize_text(v);
        }
        if let Some(v) = patch.unit_of_measure {
            self.unit_of_measure = normalize_text(v);
        }
        if let Some(v) = patch.reference_code {
            self.reference_code = normalize_text(v);
        }
        if let Some(v) = patch.supplier_id {
            self.supplier_id = v;
        }
        if let Some(v) = patch.stock {
            self.stock = v;
        }
        if let Some(v) = patch.min_stock {
            self.min_stock = v;
        }
        if let Some(v) = patch.unit_price {
            self.unit_price = v;
        }
        if let Some(v) = patch.storage_location {
            self.storage_location = normalize_text(v);
        }
        if let Some(v) = patch.category {
            self.category = normalize_text(v);
        }
        if let Some(v) = patch.lot_label {
            self.lot_label = normalize_text(v);
        }
        if let Some(v) = patch.expiration_date {
            self.expiration_date = v;
        }
        if let Some(v) = patch.active {
            self.active = v;
        }
        Ok(())
    }

    /// A minimum of 0 means no minimum is configured.
    pub fn has_min_stock(&self) -> bool {
        self.min_stock > 0
    }
}

fn ensure_non_negative(field: &str, value: i64) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

pub(crate) fn ensure_price(price: Option<Decimal>) -> DomainResult<()> {
    match price {
        Some(p) if p.is_sign_negative() && !p.is_zero() => {
            Err(DomainError::validation("price cannot be negative"))
        }
        _ => Ok(()),
    }
}

/// Trim free text; blank strings become `None`.
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
