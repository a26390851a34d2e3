use crate::error::ApiError;
use crate::state::MonitorState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::crowd::{
    CrowdDataPoint, DetectRequest, DetectResponse, FlowReportRequest, HeatmapCell,
    OverviewSnapshot, PredictRequest, PredictionResult,
};
use common::parking::{ParkingFilter, ParkingRefreshRequest, ParkingSlot};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(state: MonitorState) -> Router {
    Router::new()
        // Health check
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        // Read surface
        .route("/v1/overview", get(overview))
        .route("/v1/temporal", get(temporal))
        .route("/v1/heatmap", get(heatmap))
        .route("/v1/parking", get(parking))
        .route("/v1/alerts", get(alerts))
        .route("/v1/alerts/export", get(export_alerts))
        // Command surface
        .route("/v1/detect", post(detect))
        .route("/v1/parking/refresh", post(refresh_parking))
        .route("/v1/parking/:slot_id/toggle", post(toggle_slot))
        .route("/v1/parking/:slot_id/reserve", post(reserve_slot))
        .route("/v1/predict", post(predict))
        .route("/v1/reports", post(report_flow))
        .route("/v1/alerts/:alert_id/dismiss", post(dismiss_alert))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "monitor-service"
    }))
}

async fn readyz(State(state): State<MonitorState>) -> impl IntoResponse {
    // a facility without parking slots can still serve crowd analytics
    let fleet = state.parking_fleet_size().await;
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "zones": state.config().zones.len(),
            "parking_slots": fleet
        })),
    )
}

/// Metrics endpoint (Prometheus format)
async fn metrics() -> impl IntoResponse {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = telemetry::metrics::REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics",
        )
            .into_response();
    }

    match String::from_utf8(buffer) {
        Ok(s) => s.into_response(),
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to convert metrics",
            )
                .into_response()
        }
    }
}

async fn overview(State(state): State<MonitorState>) -> Json<OverviewSnapshot> {
    Json(state.overview().await)
}

async fn temporal(State(state): State<MonitorState>) -> Json<Vec<CrowdDataPoint>> {
    Json(state.temporal().await)
}

async fn heatmap(State(state): State<MonitorState>) -> Json<Vec<HeatmapCell>> {
    Json(state.heatmap().await)
}

#[derive(Debug, Deserialize)]
struct ParkingQuery {
    #[serde(rename = "type")]
    slot_type: Option<String>,
}

async fn parking(
    State(state): State<MonitorState>,
    Query(query): Query<ParkingQuery>,
) -> Result<Json<Vec<ParkingSlot>>, ApiError> {
    let filter = match query.slot_type {
        Some(raw) => raw.parse::<ParkingFilter>().map_err(ApiError::bad_request)?,
        None => ParkingFilter::All,
    };
    Ok(Json(state.parking_view(filter).await))
}

async fn alerts(State(state): State<MonitorState>) -> Json<Vec<common::alerts::Alert>> {
    Json(state.open_alerts().await)
}

async fn export_alerts(State(state): State<MonitorState>) -> impl IntoResponse {
    let csv = state.export_alert_log().await;
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"alert_log.csv\"",
            ),
        ],
        csv,
    )
}

async fn detect(
    State(state): State<MonitorState>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    let ack = state.ingest_detections(request).await?;
    Ok(Json(ack))
}

async fn refresh_parking(
    State(state): State<MonitorState>,
    Json(request): Json<ParkingRefreshRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let applied = state.refresh_parking(&request.slots).await?;
    Ok(Json(json!({
        "observations": request.slots.len(),
        "applied": applied
    })))
}

async fn toggle_slot(
    State(state): State<MonitorState>,
    Path(slot_id): Path<String>,
) -> Result<Json<ParkingSlot>, ApiError> {
    let slot = state.toggle_slot(&slot_id).await?;
    Ok(Json(slot))
}

async fn reserve_slot(
    State(state): State<MonitorState>,
    Path(slot_id): Path<String>,
) -> Result<Json<ParkingSlot>, ApiError> {
    let slot = state.reserve_slot(&slot_id).await?;
    Ok(Json(slot))
}

/// Never an error: remote failures are indistinguishable from a
/// successful-but-conservative forecast, apart from the `degraded` flag.
async fn predict(
    State(state): State<MonitorState>,
    Json(request): Json<PredictRequest>,
) -> Json<PredictionResult> {
    Json(state.predict(request).await)
}

async fn report_flow(
    State(state): State<MonitorState>,
    Json(request): Json<FlowReportRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let fired = state.report_flow(request).await?;
    Ok(Json(json!({
        "accepted": true,
        "alert": fired
    })))
}

async fn dismiss_alert(
    State(state): State<MonitorState>,
    Path(alert_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.dismiss_alert(&alert_id).await {
        Ok(Json(json!({ "dismissed": true })))
    } else {
        Err(ApiError::not_found(format!(
            "alert '{}' not found",
            alert_id
        )))
    }
}
