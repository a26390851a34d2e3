//! Alert contracts: closed tagged variants for type and severity plus the
//! immutable alert record itself. Severity is totally ordered
//! Info < Warning < Danger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Congestion,
    Safety,
    Parking,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::Congestion => write!(f, "CONGESTION"),
            AlertType::Safety => write!(f, "SAFETY"),
            AlertType::Parking => write!(f, "PARKING"),
        }
    }
}

impl std::str::FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CONGESTION" => Ok(AlertType::Congestion),
            "SAFETY" => Ok(AlertType::Safety),
            "PARKING" => Ok(AlertType::Parking),
            _ => Err(format!("Invalid alert type: {}", s)),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    #[default]
    Info,
    Warning,
    Danger,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "INFO"),
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Danger => write!(f, "DANGER"),
        }
    }
}

impl std::str::FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INFO" => Ok(AlertSeverity::Info),
            "WARNING" => Ok(AlertSeverity::Warning),
            "DANGER" => Ok(AlertSeverity::Danger),
            _ => Err(format!("Invalid alert severity: {}", s)),
        }
    }
}

/// An emitted alert. Immutable once created; dismissal lives in a side table
/// owned by the alert log, never on the record itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub zone: String,
}

impl Alert {
    pub fn new(
        kind: AlertType,
        severity: AlertSeverity,
        message: impl Into<String>,
        zone: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            kind,
            severity,
            message: message.into(),
            zone: zone.into(),
        }
    }
}
