//! Crowd-monitoring contracts shared between the monitor service and its
//! collaborators: zone roster, density classification, detection ingest,
//! heatmap/trend read models and the predictive forecast shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named physical area of the monitored facility with its own detection feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Ordered classification of crowd intensity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum DensityLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for DensityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DensityLevel::Low => write!(f, "Low"),
            DensityLevel::Medium => write!(f, "Medium"),
            DensityLevel::High => write!(f, "High"),
            DensityLevel::Critical => write!(f, "Critical"),
        }
    }
}

impl std::str::FromStr for DensityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(DensityLevel::Low),
            "medium" => Ok(DensityLevel::Medium),
            "high" => Ok(DensityLevel::High),
            "critical" => Ok(DensityLevel::Critical),
            _ => Err(format!("Invalid density level: {}", s)),
        }
    }
}

/// One detection reported by the external sensor pipeline. Counts are derived
/// from batch length; the per-detection payload is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default = "default_detection_class")]
    pub class: String,

    #[serde(default)]
    pub confidence: f32,
}

fn default_detection_class() -> String {
    "person".to_string()
}

/// Request to ingest a detection batch for a zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    pub zone_id: String,

    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Acknowledgement returned for an ingested batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub count: u64,
    pub density: DensityLevel,
}

/// One cell of the fixed 10x10 spatial grid carrying a normalized intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub x: u8,
    pub y: u8,
    /// Normalized occupancy in [0, 1].
    pub intensity: f32,
}

/// One sample of the bounded rolling crowd trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrowdDataPoint {
    pub timestamp: DateTime<Utc>,
    pub observed: u64,
    pub expected: u64,
}

/// Aggregate dashboard snapshot assembled by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverviewSnapshot {
    pub current_count: u64,
    pub density: DensityLevel,
    pub alert_count: u64,
    /// Occupied-or-reserved share of the parking fleet in [0, 1].
    pub parking_occupancy: f64,
}

/// Request for a short-horizon risk forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub current_count: u64,
    pub density: DensityLevel,

    /// Trend context for the forecast prompt. When empty, the service fills
    /// in its own recent series.
    #[serde(default)]
    pub recent_trend: Vec<CrowdDataPoint>,
}

/// Forecast returned to the caller. Never an error: remote failures degrade
/// to a deterministic heuristic instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Congestion risk in [0, 100].
    pub risk_score: f64,
    pub forecasted_count: u64,
    pub recommendations: Vec<String>,
    /// True when the result came from the local heuristic rather than the
    /// remote model.
    pub degraded: bool,
}

/// Kind of an externally supplied flow report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    IrregularFlow,
    Obstruction,
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::IrregularFlow => write!(f, "irregular_flow"),
            ReportKind::Obstruction => write!(f, "obstruction"),
        }
    }
}

/// An irregular-flow (or similar) signal pushed by a sensor collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowReportRequest {
    pub zone_id: String,
    pub kind: ReportKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_levels_are_totally_ordered() {
        assert!(DensityLevel::Low < DensityLevel::Medium);
        assert!(DensityLevel::Medium < DensityLevel::High);
        assert!(DensityLevel::High < DensityLevel::Critical);
    }

    #[test]
    fn density_level_round_trips_through_strings() {
        for level in [
            DensityLevel::Low,
            DensityLevel::Medium,
            DensityLevel::High,
            DensityLevel::Critical,
        ] {
            let parsed: DensityLevel = level.to_string().parse().unwrap();
            assert_eq!(parsed, level);
        }
        assert!("extreme".parse::<DensityLevel>().is_err());
    }

    #[test]
    fn density_level_serializes_as_original_wire_labels() {
        assert_eq!(
            serde_json::to_string(&DensityLevel::Critical).unwrap(),
            "\"Critical\""
        );
    }

    #[test]
    fn detect_request_defaults_detection_class() {
        let req: DetectRequest =
            serde_json::from_str(r#"{"zone_id":"north-gate","detections":[{}]}"#).unwrap();
        assert_eq!(req.detections.len(), 1);
        assert_eq!(req.detections[0].class, "person");
    }
}
