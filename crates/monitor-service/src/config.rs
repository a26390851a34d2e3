use crate::density::DensityThresholds;
use crate::trend;
use anyhow::{bail, Context, Result};
use common::crowd::Zone;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Address to bind the HTTP server to
    pub bind_addr: String,

    /// Facility zone roster (static reference data)
    pub zones: Vec<Zone>,

    /// Density classification thresholds
    pub thresholds: DensityThresholds,

    /// Rolling trend window length
    pub trend_window: usize,

    /// Expected crowd count baseline supplied to the trend store
    pub expected_baseline: u64,

    /// Minimum seconds between re-emitting an alert with the same type and zone
    pub alert_cooldown_secs: i64,

    /// Periodic alert refresh interval
    pub refresh_interval: Duration,

    /// Number of parking slots to provision
    pub parking_slots: usize,

    /// Remote inference settings
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Structured-inference endpoint; unset means heuristic-only forecasts
    pub endpoint: Option<String>,

    /// API key forwarded with each request
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Bound on each remote attempt
    pub attempt_timeout: Duration,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("MONITOR_ADDR").unwrap_or_else(|_| "0.0.0.0:8091".to_string());

        let zones = match env::var("FACILITY_ZONES") {
            Ok(raw) => parse_zones(&raw).context("Invalid FACILITY_ZONES")?,
            Err(_) => default_zones(),
        };
        if zones.is_empty() {
            bail!("facility zone roster cannot be empty");
        }

        let thresholds = DensityThresholds {
            medium: env_parse("DENSITY_MEDIUM_THRESHOLD", 50),
            high: env_parse("DENSITY_HIGH_THRESHOLD", 100),
            critical_ceiling: env_parse("DENSITY_CRITICAL_CEILING", 250),
        };
        thresholds
            .validate()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        let inference = InferenceConfig {
            endpoint: env::var("INFERENCE_URL").ok(),
            api_key: env::var("INFERENCE_API_KEY").ok(),
            model: env::var("INFERENCE_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            attempt_timeout: Duration::from_secs(env_parse("INFERENCE_TIMEOUT_SECS", 8)),
        };

        Ok(Self {
            bind_addr,
            zones,
            thresholds,
            trend_window: env_parse("TREND_WINDOW", trend::DEFAULT_WINDOW),
            expected_baseline: env_parse("EXPECTED_BASELINE", 1100),
            alert_cooldown_secs: env_parse("ALERT_COOLDOWN_SECS", 300),
            refresh_interval: Duration::from_secs(env_parse("REFRESH_INTERVAL_SECS", 10)),
            parking_slots: env_parse("PARKING_SLOTS", 48),
            inference,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Zone roster format: `id=Name,id=Name,...`
fn parse_zones(raw: &str) -> Result<Vec<Zone>> {
    let mut zones = Vec::new();
    for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
        let Some((id, name)) = entry.split_once('=') else {
            bail!("zone entry '{}' is not of the form id=Name", entry);
        };
        let id = id.trim();
        let name = name.trim();
        common::validation::validate_id(id, "zone id")?;
        common::validation::validate_name(name, "zone name")?;
        zones.push(Zone::new(id, name));
    }
    Ok(zones)
}

fn default_zones() -> Vec<Zone> {
    vec![
        Zone::new("north-gate", "North Gate"),
        Zone::new("south-gate", "South Gate"),
        Zone::new("central-plaza", "Central Plaza"),
        Zone::new("west-corridor", "West Corridor"),
        Zone::new("east-concourse", "East Concourse"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zone_roster() {
        let zones = parse_zones("north-gate=North Gate, pit-lane=Pit Lane").unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id, "north-gate");
        assert_eq!(zones[1].name, "Pit Lane");
    }

    #[test]
    fn rejects_malformed_zone_entries() {
        assert!(parse_zones("north-gate").is_err());
        assert!(parse_zones("=Nameless").is_err());
        assert!(parse_zones("bad/id=Bad").is_err());
    }

    #[test]
    fn default_roster_covers_the_facility() {
        let zones = default_zones();
        assert!(zones.iter().any(|z| z.name == "North Gate"));
        assert!(zones.iter().any(|z| z.name == "Central Plaza"));
    }
}
