//! Monitoring orchestrator.
//!
//! Owns every sub-component behind its own lock and serves consistent
//! snapshots to the read surface. The aggregate overview is rebuilt
//! atomically after every completed refresh cycle and every mutation, so a
//! reader never observes fields spanning two cycles.

use crate::alert_engine::{AlertEngine, AlertLog, EvaluationInputs, ZoneObservation};
use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::heatmap::HeatmapAggregator;
use crate::parking::ParkingStateManager;
use crate::predict::{HttpInferenceClient, InferenceClient, RiskPredictor};
use crate::trend::TrendStore;
use chrono::{DateTime, Utc};
use common::alerts::Alert;
use common::crowd::{
    CrowdDataPoint, DetectRequest, DetectResponse, FlowReportRequest, HeatmapCell,
    OverviewSnapshot, PredictRequest, PredictionResult, Zone,
};
use common::parking::{ParkingFilter, ParkingSlot, SlotObservation};
use common::validation;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Clone)]
pub struct MonitorState {
    inner: Arc<MonitorStateInner>,
}

struct MonitorStateInner {
    config: MonitorConfig,
    zone_index: HashMap<String, Zone>,
    observations: RwLock<HashMap<String, ZoneObservation>>,
    heatmap: RwLock<HeatmapAggregator>,
    trend: RwLock<TrendStore>,
    parking: RwLock<ParkingStateManager>,
    alerts: RwLock<AlertLog>,
    overview: RwLock<OverviewSnapshot>,
    predictor: RiskPredictor,
    /// Serializes refresh cycles; a tick that finds it held is skipped.
    refresh_gate: Mutex<()>,
}

impl MonitorState {
    pub fn new(config: MonitorConfig) -> anyhow::Result<Self> {
        let client: Option<Arc<dyn InferenceClient>> = match config.inference.endpoint {
            Some(_) => Some(Arc::new(HttpInferenceClient::new(&config.inference)?)),
            None => None,
        };
        Ok(Self::with_inference_client(config, client))
    }

    /// Construction seam for tests and alternative inference transports.
    pub fn with_inference_client(
        config: MonitorConfig,
        client: Option<Arc<dyn InferenceClient>>,
    ) -> Self {
        let zone_index = config
            .zones
            .iter()
            .map(|z| (z.id.clone(), z.clone()))
            .collect();
        let predictor = RiskPredictor::new(client, config.inference.attempt_timeout);

        Self {
            inner: Arc::new(MonitorStateInner {
                zone_index,
                observations: RwLock::new(HashMap::new()),
                heatmap: RwLock::new(HeatmapAggregator::new(&config.zones)),
                trend: RwLock::new(TrendStore::new(config.trend_window)),
                parking: RwLock::new(ParkingStateManager::provision(config.parking_slots)),
                alerts: RwLock::new(AlertLog::new(config.alert_cooldown_secs)),
                overview: RwLock::new(OverviewSnapshot::default()),
                predictor,
                refresh_gate: Mutex::new(()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Ingest a detection batch from the sensor pipeline: classify, update
    /// heatmap and trend, then re-evaluate alerts.
    pub async fn ingest_detections(
        &self,
        request: DetectRequest,
    ) -> Result<DetectResponse, MonitorError> {
        validation::validate_id(&request.zone_id, "zone_id")
            .map_err(|e| MonitorError::InvalidInput(e.to_string()))?;
        validation::validate_batch_size(request.detections.len(), "detections")
            .map_err(|e| MonitorError::InvalidInput(e.to_string()))?;

        let zone = self
            .inner
            .zone_index
            .get(&request.zone_id)
            .cloned()
            .ok_or_else(|| MonitorError::UnknownZone(request.zone_id.clone()))?;

        let count = request.detections.len() as u64;
        let density = self.inner.config.thresholds.classify(count as i64)?;
        let now = Utc::now();

        {
            let mut heatmap = self.inner.heatmap.write().await;
            heatmap.observe(&zone.id, count);
        }
        {
            let mut observations = self.inner.observations.write().await;
            observations.insert(
                zone.id.clone(),
                ZoneObservation {
                    zone: zone.clone(),
                    count,
                    density,
                    observed_at: now,
                },
            );
        }

        let total = self.total_count().await;
        {
            let mut trend = self.inner.trend.write().await;
            trend.append(now, total, self.inner.config.expected_baseline);
        }

        telemetry::metrics::MONITOR_DETECTIONS_INGESTED
            .with_label_values(&[&zone.id])
            .inc();
        tracing::info!(zone = %zone.id, count, density = %density, "detection batch ingested");

        self.evaluate_alerts(now).await;
        self.rebuild_overview().await;

        Ok(DetectResponse { count, density })
    }

    /// One periodic refresh pass: append a trend sample, re-evaluate alerts,
    /// rebuild the overview. Returns false when the previous pass still holds
    /// the gate (the tick is dropped, never queued).
    pub async fn run_refresh_cycle(&self) -> bool {
        let Ok(_gate) = self.inner.refresh_gate.try_lock() else {
            tracing::warn!("previous refresh cycle still running, skipping tick");
            telemetry::metrics::MONITOR_REFRESH_CYCLES
                .with_label_values(&["skipped"])
                .inc();
            return false;
        };

        let now = Utc::now();
        let total = self.total_count().await;
        {
            let mut trend = self.inner.trend.write().await;
            trend.append(now, total, self.inner.config.expected_baseline);
        }
        self.evaluate_alerts(now).await;
        self.rebuild_overview().await;

        telemetry::metrics::MONITOR_REFRESH_CYCLES
            .with_label_values(&["completed"])
            .inc();
        true
    }

    pub async fn overview(&self) -> OverviewSnapshot {
        self.inner.overview.read().await.clone()
    }

    pub async fn temporal(&self) -> Vec<CrowdDataPoint> {
        self.inner.trend.read().await.series()
    }

    pub async fn heatmap(&self) -> Vec<HeatmapCell> {
        self.inner.heatmap.read().await.snapshot()
    }

    pub async fn parking_view(&self, filter: ParkingFilter) -> Vec<ParkingSlot> {
        self.inner.parking.read().await.view(filter)
    }

    pub async fn parking_fleet_size(&self) -> usize {
        self.inner.parking.read().await.len()
    }

    pub async fn refresh_parking(&self, feed: &[SlotObservation]) -> Result<usize, MonitorError> {
        let applied = {
            let mut parking = self.inner.parking.write().await;
            parking.refresh(feed)?
        };
        self.evaluate_alerts(Utc::now()).await;
        self.rebuild_overview().await;
        Ok(applied)
    }

    pub async fn toggle_slot(&self, slot_id: &str) -> Result<ParkingSlot, MonitorError> {
        validation::validate_id(slot_id, "slot_id")
            .map_err(|e| MonitorError::InvalidInput(e.to_string()))?;
        let slot = {
            let mut parking = self.inner.parking.write().await;
            parking.toggle(slot_id)?
        };
        self.rebuild_overview().await;
        Ok(slot)
    }

    pub async fn reserve_slot(&self, slot_id: &str) -> Result<ParkingSlot, MonitorError> {
        validation::validate_id(slot_id, "slot_id")
            .map_err(|e| MonitorError::InvalidInput(e.to_string()))?;
        let slot = {
            let mut parking = self.inner.parking.write().await;
            parking.reserve(slot_id)?
        };
        self.rebuild_overview().await;
        Ok(slot)
    }

    pub async fn open_alerts(&self) -> Vec<Alert> {
        self.inner.alerts.read().await.open()
    }

    /// Idempotent dismissal. Returns false when the id was never issued.
    pub async fn dismiss_alert(&self, alert_id: &str) -> bool {
        let known = {
            let mut alerts = self.inner.alerts.write().await;
            alerts.dismiss(alert_id)
        };
        if known {
            self.rebuild_overview().await;
        }
        known
    }

    pub async fn export_alert_log(&self) -> String {
        let alerts = self.inner.alerts.read().await;
        common::export::alert_log_csv(alerts.history())
    }

    /// Externally supplied flow report; feeds the SAFETY rule directly.
    pub async fn report_flow(
        &self,
        request: FlowReportRequest,
    ) -> Result<Option<Alert>, MonitorError> {
        let zone = self
            .inner
            .zone_index
            .get(&request.zone_id)
            .cloned()
            .ok_or_else(|| MonitorError::UnknownZone(request.zone_id.clone()))?;

        let fired = {
            let mut alerts = self.inner.alerts.write().await;
            AlertEngine::report(&mut alerts, &zone, request.kind, Utc::now())
        };
        self.rebuild_overview().await;
        Ok(fired)
    }

    /// Short-horizon risk forecast. Infallible: remote failures degrade to
    /// the deterministic heuristic.
    pub async fn predict(&self, request: PredictRequest) -> PredictionResult {
        let trend = if request.recent_trend.is_empty() {
            self.temporal().await
        } else {
            request.recent_trend
        };
        self.inner
            .predictor
            .predict(request.current_count, request.density, &trend)
            .await
    }

    async fn total_count(&self) -> u64 {
        let observations = self.inner.observations.read().await;
        observations.values().map(|o| o.count).sum()
    }

    async fn evaluate_alerts(&self, now: DateTime<Utc>) -> Vec<Alert> {
        let mut zones: Vec<ZoneObservation> = {
            let observations = self.inner.observations.read().await;
            observations.values().cloned().collect()
        };
        zones.sort_by(|a, b| a.zone.id.cmp(&b.zone.id));

        let trend_rising = self.inner.trend.read().await.rising(2);
        let sector_rates = self.inner.parking.read().await.sector_rates();

        let mut alerts = self.inner.alerts.write().await;
        AlertEngine::evaluate(
            &mut alerts,
            &EvaluationInputs {
                zones: &zones,
                trend_rising,
                sector_rates: &sector_rates,
            },
            now,
        )
    }

    /// Replaces the aggregate snapshot wholesale so readers never see a
    /// partially updated overview.
    async fn rebuild_overview(&self) {
        let current_count = self.total_count().await;
        let density = self
            .inner
            .config
            .thresholds
            .classify(current_count.min(i64::MAX as u64) as i64)
            .unwrap_or_default();
        let alert_count = self.inner.alerts.read().await.open_count() as u64;
        let parking_occupancy = self
            .inner
            .parking
            .read()
            .await
            .occupancy_rate()
            .unwrap_or(0.0);

        telemetry::metrics::MONITOR_PARKING_OCCUPANCY.set(parking_occupancy);

        let snapshot = OverviewSnapshot {
            current_count,
            density,
            alert_count,
            parking_occupancy,
        };
        *self.inner.overview.write().await = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InferenceConfig;
    use crate::density::DensityThresholds;
    use common::crowd::{DensityLevel, Detection, ReportKind};
    use std::time::Duration;

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            zones: vec![
                Zone::new("north-gate", "North Gate"),
                Zone::new("central-plaza", "Central Plaza"),
            ],
            thresholds: DensityThresholds {
                medium: 50,
                high: 100,
                critical_ceiling: 110,
            },
            trend_window: 13,
            expected_baseline: 1100,
            alert_cooldown_secs: 300,
            refresh_interval: Duration::from_secs(10),
            parking_slots: 2,
            inference: InferenceConfig {
                endpoint: None,
                api_key: None,
                model: "gemini-3-flash-preview".to_string(),
                attempt_timeout: Duration::from_millis(50),
            },
        }
    }

    fn batch(zone_id: &str, count: usize) -> DetectRequest {
        DetectRequest {
            zone_id: zone_id.to_string(),
            detections: vec![
                Detection {
                    class: "person".to_string(),
                    confidence: 0.9,
                };
                count
            ],
        }
    }

    #[tokio::test]
    async fn ingest_classifies_and_updates_overview() {
        let state = MonitorState::with_inference_client(test_config(), None);

        let ack = state.ingest_detections(batch("north-gate", 60)).await.unwrap();
        assert_eq!(ack.count, 60);
        assert_eq!(ack.density, DensityLevel::Medium);

        let overview = state.overview().await;
        assert_eq!(overview.current_count, 60);
        assert_eq!(overview.density, DensityLevel::Medium);
        assert_eq!(state.temporal().await.len(), 1);
    }

    #[tokio::test]
    async fn ingest_unknown_zone_is_rejected() {
        let state = MonitorState::with_inference_client(test_config(), None);
        let err = state
            .ingest_detections(batch("loading-dock", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::UnknownZone(ref z) if z == "loading-dock"));
    }

    #[tokio::test]
    async fn critical_ingest_fires_exactly_one_alert() {
        let state = MonitorState::with_inference_client(test_config(), None);

        let ack = state
            .ingest_detections(batch("north-gate", 120))
            .await
            .unwrap();
        assert_eq!(ack.density, DensityLevel::Critical);

        let alerts = state.open_alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].zone, "North Gate");

        // identical ingestion within the cool-down adds nothing
        state
            .ingest_detections(batch("north-gate", 120))
            .await
            .unwrap();
        assert_eq!(state.open_alerts().await.len(), 1);
    }

    #[tokio::test]
    async fn refresh_cycle_appends_trend_and_completes() {
        let state = MonitorState::with_inference_client(test_config(), None);
        assert!(state.run_refresh_cycle().await);
        assert!(state.run_refresh_cycle().await);
        // duplicate-timestamp replacement aside, both cycles leave a series
        assert!(!state.temporal().await.is_empty());
    }

    #[tokio::test]
    async fn flow_report_fires_safety_alert_once_per_window() {
        let state = MonitorState::with_inference_client(test_config(), None);

        let fired = state
            .report_flow(FlowReportRequest {
                zone_id: "central-plaza".to_string(),
                kind: ReportKind::IrregularFlow,
            })
            .await
            .unwrap();
        assert!(fired.is_some());

        let repeat = state
            .report_flow(FlowReportRequest {
                zone_id: "central-plaza".to_string(),
                kind: ReportKind::IrregularFlow,
            })
            .await
            .unwrap();
        assert!(repeat.is_none());
        assert_eq!(state.overview().await.alert_count, 1);
    }

    #[tokio::test]
    async fn parking_mutations_keep_overview_consistent() {
        let state = MonitorState::with_inference_client(test_config(), None);

        state
            .refresh_parking(&[
                SlotObservation {
                    slot_id: "P-0".to_string(),
                    occupied: true,
                },
                SlotObservation {
                    slot_id: "P-1".to_string(),
                    occupied: false,
                },
            ])
            .await
            .unwrap();
        assert_eq!(state.overview().await.parking_occupancy, 0.5);

        state.toggle_slot("P-1").await.unwrap();
        assert_eq!(state.overview().await.parking_occupancy, 1.0);
    }

    #[tokio::test]
    async fn predict_without_endpoint_is_the_heuristic() {
        let state = MonitorState::with_inference_client(test_config(), None);
        let result = state
            .predict(PredictRequest {
                current_count: 200,
                density: DensityLevel::Medium,
                recent_trend: Vec::new(),
            })
            .await;
        assert_eq!(result.risk_score, 45.0);
        assert_eq!(result.forecasted_count, 300);
        assert!(result.degraded);
    }
}
