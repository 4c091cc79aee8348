use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use pharmstock_infra::ActiveFilter;

use crate::app::routes::parse_supply_id;
use crate::app::services::{AppServices, run_blocking};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/insumos", get(list_supplies).post(create_supply))
        .route(
            "/insumos/:id",
            get(get_supply).put(update_supply).delete(deactivate_supply),
        )
        .route("/insumos/:id/reactivar", post(reactivate_supply))
        .route("/insumos/:id/stock", post(adjust_stock))
}

pub async fn list_supplies(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListSuppliesQuery>,
) -> axum::response::Response {
    match services
        .catalog
        .list_supplies(ActiveFilter::from_flag(query.activo))
    {
        Ok(supplies) => (StatusCode::OK, Json(dto::supplies_to_json(&supplies))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_supply(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateSupplyRequest>,
) -> axum::response::Response {
    let input = match body.into_new_supply() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.create_supply(input) {
        Ok(supply) => (StatusCode::CREATED, Json(dto::SupplyResponse::from(&supply))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_supply(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_supply_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.get_supply(id) {
        Ok(supply) => (StatusCode::OK, Json(dto::SupplyResponse::from(&supply))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_supply(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateSupplyRequest>,
) -> axum::response::Response {
    let id = match parse_supply_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = match body.into_patch() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match run_blocking(services, move |s| s.catalog.update_supply(id, patch)).await {
        Ok(supply) => (StatusCode::OK, Json(dto::SupplyResponse::from(&supply))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Soft delete: the supply and its lots stay on record.
pub async fn deactivate_supply(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, &id, false).await
}

pub async fn reactivate_supply(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    set_active(services, &id, true).await
}

async fn set_active(
    services: Arc<AppServices>,
    raw_id: &str,
    active: bool,
) -> axum::response::Response {
    let id = match parse_supply_id(raw_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match run_blocking(services, move |s| s.catalog.set_active(id, active)).await {
        Ok(supply) => (StatusCode::OK, Json(dto::SupplyResponse::from(&supply))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let id = match parse_supply_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let delta = body.delta;
    match run_blocking(services, move |s| s.ledger.adjust_stock(id, delta)).await {
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
