use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/insumos/alertas/stock-minimo", get(low_stock))
        .route("/insumos/alertas/proximos-vencer", get(expiring_soon))
        .route("/insumos/alertas/vencidos", get(expired))
        .route("/insumos/alertas/resumen", get(summary))
}

pub async fn low_stock(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.alerts.low_stock_alerts() {
        Ok(supplies) => (StatusCode::OK, Json(dto::supplies_to_json(&supplies))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn expiring_soon(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ExpiringQuery>,
) -> axum::response::Response {
    match services.alerts.expiring_soon_alerts(query.dias) {
        Ok(supplies) => (StatusCode::OK, Json(dto::supplies_to_json(&supplies))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn expired(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.alerts.expired_alerts() {
        Ok(supplies) => (StatusCode::OK, Json(dto::supplies_to_json(&supplies))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ExpiringQuery>,
) -> axum::response::Response {
    match services.alerts.summary(query.dias) {
        Ok(summary) => (StatusCode::OK, Json(dto::SummaryResponse::from(summary))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
