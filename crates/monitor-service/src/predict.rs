//! Predictive risk adapter.
//!
//! Wraps a remote structured-inference service behind the [`InferenceClient`]
//! trait and validates its JSON response against the forecast schema. The
//! caller-facing contract is infallible: any transport error, timeout, empty
//! body or schema violation degrades to a deterministic heuristic, never an
//! error. At most two remote calls are made per invocation (one retry, no
//! backoff), each bounded by the per-attempt timeout.

use crate::config::InferenceConfig;
use async_trait::async_trait;
use common::crowd::{CrowdDataPoint, DensityLevel, PredictionResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const FALLBACK_RISK_SCORE: f64 = 45.0;
pub const FALLBACK_COUNT_MARGIN: u64 = 100;

/// Internal failure taxonomy for the remote call. Never surfaced to callers.
#[derive(Debug, Error)]
pub enum RemoteInferenceError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("empty response body")]
    EmptyBody,

    #[error("schema violation: {0}")]
    Schema(String),
}

/// One structured-generation attempt against the remote service. The
/// predictor applies the per-attempt timeout on top of whatever transport
/// limits an implementation carries.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<String, RemoteInferenceError>;
}

/// HTTP client for the structured-inference endpoint.
pub struct HttpInferenceClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpInferenceClient {
    pub fn new(config: &InferenceConfig) -> anyhow::Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("inference endpoint not configured"))?;
        let client = reqwest::Client::builder()
            .timeout(config.attempt_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn generate(
        &self,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<String, RemoteInferenceError> {
        let body = json!({
            "model": self.model,
            "contents": prompt,
            "config": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema,
            },
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("x-goog-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteInferenceError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RemoteInferenceError::Transport(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RemoteInferenceError::Transport(e.to_string()))?;
        let text = payload
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(RemoteInferenceError::EmptyBody);
        }

        Ok(text)
    }
}

/// Remote forecast wire shape enforced by the response schema.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPayload {
    risk_score: f64,
    forecasted_count: i64,
    recommendations: Vec<String>,
}

pub struct RiskPredictor {
    client: Option<Arc<dyn InferenceClient>>,
    attempt_timeout: Duration,
}

impl RiskPredictor {
    pub fn new(client: Option<Arc<dyn InferenceClient>>, attempt_timeout: Duration) -> Self {
        Self {
            client,
            attempt_timeout,
        }
    }

    /// Always returns a well-formed result. Falls back to the deterministic
    /// heuristic when the remote service is unconfigured or misbehaves.
    pub async fn predict(
        &self,
        current_count: u64,
        density: DensityLevel,
        recent_trend: &[CrowdDataPoint],
    ) -> PredictionResult {
        let Some(client) = &self.client else {
            tracing::debug!("no inference endpoint configured, serving heuristic forecast");
            telemetry::metrics::MONITOR_PREDICTIONS
                .with_label_values(&["fallback"])
                .inc();
            return Self::fallback(current_count);
        };

        let prompt = Self::prompt(current_count, density, recent_trend);
        let schema = Self::response_schema();

        for attempt in 1..=2u32 {
            match self.attempt(client.as_ref(), &prompt, &schema).await {
                Ok(result) => {
                    telemetry::metrics::MONITOR_PREDICTIONS
                        .with_label_values(&["model"])
                        .inc();
                    return result;
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "remote inference attempt failed");
                }
            }
        }

        telemetry::metrics::MONITOR_PREDICTIONS
            .with_label_values(&["fallback"])
            .inc();
        Self::fallback(current_count)
    }

    async fn attempt(
        &self,
        client: &dyn InferenceClient,
        prompt: &str,
        schema: &Value,
    ) -> Result<PredictionResult, RemoteInferenceError> {
        let started = Instant::now();
        let text = tokio::time::timeout(self.attempt_timeout, client.generate(prompt, schema))
            .await
            .map_err(|_| RemoteInferenceError::Timeout(self.attempt_timeout))??;
        telemetry::metrics::MONITOR_PREDICTION_LATENCY.observe(started.elapsed().as_secs_f64());

        Self::validate(&text)
    }

    fn prompt(current_count: u64, density: DensityLevel, recent_trend: &[CrowdDataPoint]) -> String {
        let trend = serde_json::to_string(recent_trend).unwrap_or_else(|_| "[]".to_string());
        format!(
            "Analyze current crowd metrics for the monitored facility:\n\
             - Current Count: {}\n\
             - Current Density: {}\n\
             - Recent Trend: {}\n\n\
             Predict congestion risk for the next hour and provide management \
             recommendations focused on preventive crowd control.",
            current_count, density, trend
        )
    }

    fn response_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "riskScore": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "Risk score from 0 to 100"
                },
                "forecastedCount": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Expected count in 60 minutes"
                },
                "recommendations": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Actionable crowd control measures"
                }
            },
            "required": ["riskScore", "forecastedCount", "recommendations"]
        })
    }

    fn validate(text: &str) -> Result<PredictionResult, RemoteInferenceError> {
        let payload: ForecastPayload = serde_json::from_str(text)
            .map_err(|e| RemoteInferenceError::Schema(e.to_string()))?;

        if !payload.risk_score.is_finite() || !(0.0..=100.0).contains(&payload.risk_score) {
            return Err(RemoteInferenceError::Schema(format!(
                "riskScore {} outside [0, 100]",
                payload.risk_score
            )));
        }
        if payload.forecasted_count < 0 {
            return Err(RemoteInferenceError::Schema(format!(
                "forecastedCount {} is negative",
                payload.forecasted_count
            )));
        }

        Ok(PredictionResult {
            risk_score: payload.risk_score,
            forecasted_count: payload.forecasted_count as u64,
            recommendations: payload.recommendations,
            degraded: false,
        })
    }

    /// Deterministic heuristic substitute for a failed remote call.
    pub fn fallback(current_count: u64) -> PredictionResult {
        PredictionResult {
            risk_score: FALLBACK_RISK_SCORE,
            forecasted_count: current_count + FALLBACK_COUNT_MARGIN,
            recommendations: vec![
                "Maintain current surveillance".to_string(),
                "Monitor exit flow".to_string(),
            ],
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticClient {
        text: String,
    }

    #[async_trait]
    impl InferenceClient for StaticClient {
        async fn generate(
            &self,
            _prompt: &str,
            _schema: &Value,
        ) -> Result<String, RemoteInferenceError> {
            Ok(self.text.clone())
        }
    }

    #[test]
    fn fallback_is_the_documented_heuristic() {
        let result = RiskPredictor::fallback(1428);
        assert_eq!(result.risk_score, 45.0);
        assert_eq!(result.forecasted_count, 1528);
        assert_eq!(
            result.recommendations,
            vec![
                "Maintain current surveillance".to_string(),
                "Monitor exit flow".to_string()
            ]
        );
        assert!(result.degraded);
    }

    #[test]
    fn validate_accepts_in_range_forecasts() {
        let result = RiskPredictor::validate(
            r#"{"riskScore": 72.5, "forecastedCount": 1600, "recommendations": ["Open gate C"]}"#,
        )
        .unwrap();
        assert_eq!(result.risk_score, 72.5);
        assert_eq!(result.forecasted_count, 1600);
        assert!(!result.degraded);
    }

    #[test]
    fn validate_rejects_out_of_range_and_malformed_payloads() {
        for text in [
            "",
            "not json",
            r#"{"riskScore": 250, "forecastedCount": 10, "recommendations": []}"#,
            r#"{"riskScore": 50, "forecastedCount": -3, "recommendations": []}"#,
            r#"{"riskScore": 50, "recommendations": []}"#,
        ] {
            assert!(RiskPredictor::validate(text).is_err(), "accepted: {}", text);
        }
    }

    #[tokio::test]
    async fn unconfigured_predictor_serves_fallback() {
        let predictor = RiskPredictor::new(None, Duration::from_millis(50));
        let result = predictor.predict(100, DensityLevel::Medium, &[]).await;
        assert_eq!(result, RiskPredictor::fallback(100));
    }

    #[tokio::test]
    async fn model_output_passes_through_unchanged() {
        let client = Arc::new(StaticClient {
            text: r#"{"riskScore": 61.0, "forecastedCount": 1500, "recommendations": ["Stagger exits"]}"#
                .to_string(),
        });
        let predictor = RiskPredictor::new(Some(client), Duration::from_millis(100));

        let result = predictor.predict(1400, DensityLevel::High, &[]).await;
        assert_eq!(result.risk_score, 61.0);
        assert_eq!(result.forecasted_count, 1500);
        assert!(!result.degraded);
    }
}
