use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};

use crate::app::routes::{parse_lot_id, parse_supply_id};
use crate::app::services::{AppServices, run_blocking};
use crate::app::{dto, errors};

/// Lot routes, mounted under `/insumos` and under `/insumosFarmacia`, the
/// prefix the pharmacy client uses for lot operations.
pub fn router() -> Router {
    let mut router = Router::new();
    for prefix in ["/insumos", "/insumosFarmacia"] {
        router = router
            .route(&format!("{prefix}/:id/lotes"), get(list_lots).post(register_lot))
            .route(&format!("{prefix}/:id/consumir"), patch(consume_lot));
    }
    router
}

/// Lots in FEFO order: earliest expiration first, undated lots last.
pub async fn list_lots(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_supply_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.list_lots(id) {
        Ok(lots) => {
            let body: Vec<dto::LotResponse> = lots.iter().map(dto::LotResponse::from).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn register_lot(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RegisterLotRequest>,
) -> axum::response::Response {
    let id = match parse_supply_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let input = match body.into_new_lot() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match run_blocking(services, move |s| s.ledger.register_lot(id, input)).await {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "lote": dto::LotResponse::from(&receipt.lot),
                "alertas": dto::AlertsResponse::from(&receipt.alerts),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Open a lot into the supply's floor stock. Only allowed once floor stock is 0.
pub async fn consume_lot(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ConsumeLotRequest>,
) -> axum::response::Response {
    let id = match parse_supply_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lot_id = match parse_lot_id(&body.lote_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match run_blocking(services, move |s| s.ledger.consume_lot(id, lot_id)).await {
        Ok(update) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "insumo": dto::SupplyResponse::from(&update.supply),
                "alertas": dto::AlertsResponse::from(&update.alerts),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
