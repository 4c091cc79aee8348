use axum::Router;

use pharmstock_core::{DomainError, LotId, SupplyId};

use crate::app::errors;

pub mod alerts;
pub mod lots;
pub mod supplies;
pub mod system;

/// Router for every `/insumos` endpoint.
pub fn router() -> Router {
    Router::new()
        .merge(supplies::router())
        .merge(lots::router())
        .merge(alerts::router())
}

pub(crate) fn parse_supply_id(raw: &str) -> Result<SupplyId, axum::response::Response> {
    raw.parse::<SupplyId>()
        .map_err(errors::domain_error_to_response)
}

pub(crate) fn parse_lot_id(raw: &str) -> Result<LotId, axum::response::Response> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(errors::domain_error_to_response(DomainError::validation(
            "loteId is required",
        )));
    }
    raw.parse::<LotId>().map_err(errors::domain_error_to_response)
}
