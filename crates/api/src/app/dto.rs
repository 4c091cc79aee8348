use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use pharmstock_core::date::parse_optional_calendar_date;
use pharmstock_core::{DomainResult, LotId, SupplyId};
use pharmstock_infra::NewLot;
use pharmstock_inventory::{
    AlertSummary, ExpirationStatus, Lot, NewSupply, StockBand, Supply, SupplyAlertSnapshot,
    SupplyPatch, alerts,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateSupplyRequest {
    pub nombre: String,
    pub descripcion: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub stock_minimo: i64,
    pub precio: Option<Decimal>,
    pub unidad_medida: Option<String>,
    pub codigo_referencia: Option<String>,
    pub proveedor_id: Option<i64>,
    pub fecha_vencimiento: Option<String>,
    pub lote: Option<String>,
    pub ubicacion_almacen: Option<String>,
    pub categoria: Option<String>,
    pub activo: Option<bool>,
}

impl CreateSupplyRequest {
    pub fn into_new_supply(self) -> DomainResult<NewSupply> {
        Ok(NewSupply {
            expiration_date: parse_optional_calendar_date(self.fecha_vencimiento.as_deref())?,
            name: self.nombre,
            description: self.descripcion,
            unit_of_measure: self.unidad_medida,
            reference_code: self.codigo_referencia,
            supplier_id: self.proveedor_id,
            stock: self.stock,
            min_stock: self.stock_minimo,
            unit_price: self.precio,
            storage_location: self.ubicacion_almacen,
            category: self.categoria,
            lot_label: self.lote,
            active: self.activo,
        })
    }
}

/// Partial update. Absent fields are left alone; an explicit `null` clears a
/// nullable field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSupplyRequest {
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub descripcion: Option<Option<String>>,
    pub stock: Option<i64>,
    pub stock_minimo: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub precio: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub unidad_medida: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub codigo_referencia: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub proveedor_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub fecha_vencimiento: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub lote: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub ubicacion_almacen: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub categoria: Option<Option<String>>,
    pub activo: Option<bool>,
}

impl UpdateSupplyRequest {
    pub fn into_patch(self) -> DomainResult<SupplyPatch> {
        let expiration_date = match self.fecha_vencimiento {
            None => None,
            Some(raw) => Some(parse_optional_calendar_date(raw.as_deref())?),
        };
        Ok(SupplyPatch {
            name: self.nombre,
            description: self.descripcion,
            unit_of_measure: self.unidad_medida,
            reference_code: self.codigo_referencia,
            supplier_id: self.proveedor_id,
            stock: self.stock,
            min_stock: self.stock_minimo,
            unit_price: self.precio,
            storage_location: self.ubicacion_almacen,
            category: self.categoria,
            lot_label: self.lote,
            expiration_date,
            active: self.activo,
        })
    }
}

/// Present-but-null becomes `Some(None)`; absence stays `None` via `#[serde(default)]`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterLotRequest {
    pub lote: String,
    pub cantidad: i64,
    pub fecha_vencimiento: Option<String>,
    pub precio_unitario: Option<Decimal>,
    pub ubicacion: Option<String>,
}

impl RegisterLotRequest {
    pub fn into_new_lot(self) -> DomainResult<NewLot> {
        Ok(NewLot {
            expiration_date: parse_optional_calendar_date(self.fecha_vencimiento.as_deref())?,
            label: self.lote,
            quantity: self.cantidad,
            unit_price: self.precio_unitario,
            location: self.ubicacion,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ConsumeLotRequest {
    #[serde(rename = "loteId")]
    pub lote_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSuppliesQuery {
    pub activo: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpiringQuery {
    pub dias: Option<i64>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SupplyResponse {
    pub id: SupplyId,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub stock: i64,
    pub stock_minimo: i64,
    pub precio: Option<Decimal>,
    pub unidad_medida: Option<String>,
    pub codigo_referencia: Option<String>,
    pub proveedor_id: Option<i64>,
    #[serde(with = "pharmstock_core::date::serde_opt")]
    pub fecha_vencimiento: Option<NaiveDate>,
    pub lote: Option<String>,
    pub ubicacion_almacen: Option<String>,
    pub activo: bool,
    pub categoria: Option<String>,
    pub estado_stock: &'static str,
}

impl From<&Supply> for SupplyResponse {
    fn from(s: &Supply) -> Self {
        Self {
            id: s.id,
            nombre: s.name.clone(),
            descripcion: s.description.clone(),
            stock: s.stock,
            stock_minimo: s.min_stock,
            precio: s.unit_price,
            unidad_medida: s.unit_of_measure.clone(),
            codigo_referencia: s.reference_code.clone(),
            proveedor_id: s.supplier_id,
            fecha_vencimiento: s.expiration_date,
            lote: s.lot_label.clone(),
            ubicacion_almacen: s.storage_location.clone(),
            activo: s.active,
            categoria: s.category.clone(),
            estado_stock: band_label(alerts::stock_band(s)),
        }
    }
}

pub fn band_label(band: StockBand) -> &'static str {
    match band {
        StockBand::Critical => "critico",
        StockBand::Warning => "advertencia",
        StockBand::Normal => "normal",
    }
}

#[derive(Debug, Serialize)]
pub struct LotResponse {
    pub id: LotId,
    pub insumo_id: SupplyId,
    pub lote: String,
    pub cantidad: i64,
    pub cantidad_restante: i64,
    #[serde(with = "pharmstock_core::date::serde_opt")]
    pub fecha_vencimiento: Option<NaiveDate>,
    pub precio_unitario: Option<Decimal>,
    pub ubicacion: Option<String>,
    pub activo: bool,
}

impl From<&Lot> for LotResponse {
    fn from(l: &Lot) -> Self {
        Self {
            id: l.id,
            insumo_id: l.supply_id,
            lote: l.label.clone(),
            cantidad: l.quantity,
            cantidad_restante: l.remaining,
            fecha_vencimiento: l.expiration_date,
            precio_unitario: l.unit_price,
            ubicacion: l.location.clone(),
            activo: l.active,
        }
    }
}

/// Alert state attached to mutation responses.
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub stock_bajo: bool,
    pub estado_stock: &'static str,
    pub vencimiento: ExpirationStatus,
}

impl From<&SupplyAlertSnapshot> for AlertsResponse {
    fn from(a: &SupplyAlertSnapshot) -> Self {
        Self {
            stock_bajo: a.low_stock,
            estado_stock: band_label(a.band),
            vencimiento: a.expiration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub stock_bajo: usize,
    pub proximos_vencer: usize,
    pub vencidos: usize,
    pub total: usize,
}

impl From<AlertSummary> for SummaryResponse {
    fn from(s: AlertSummary) -> Self {
        Self {
            stock_bajo: s.low_stock,
            proximos_vencer: s.expiring_soon,
            vencidos: s.expired,
            total: s.total(),
        }
    }
}

pub fn supplies_to_json(supplies: &[Supply]) -> Vec<SupplyResponse> {
    supplies.iter().map(SupplyResponse::from).collect()
}
