//! Rule evaluation and the append-only alert log.
//!
//! The engine itself is stateless: each pass evaluates the latest classifier,
//! trend and parking outputs plus externally supplied flow reports against a
//! fixed rule table. The log owns history, the dismissal side table and the
//! per-(type, zone) cool-down used for deduplication.

use chrono::{DateTime, Duration, Utc};
use common::alerts::{Alert, AlertSeverity, AlertType};
use common::crowd::{DensityLevel, ReportKind, Zone};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_COOLDOWN_SECS: i64 = 300;

/// Sector occupancy at or above this fires the PARKING capacity rule.
pub const PARKING_CAPACITY_THRESHOLD: f64 = 0.95;

/// Latest per-zone classifier output, as seen by the engine.
#[derive(Debug, Clone)]
pub struct ZoneObservation {
    pub zone: Zone,
    pub count: u64,
    pub density: DensityLevel,
    pub observed_at: DateTime<Utc>,
}

/// Inputs for one evaluation pass.
pub struct EvaluationInputs<'a> {
    pub zones: &'a [ZoneObservation],
    /// Observed counts strictly rising over the last two trend points.
    pub trend_rising: bool,
    pub sector_rates: &'a [(String, f64)],
}

pub struct AlertLog {
    cooldown: Duration,
    history: Vec<Alert>,
    dismissed: HashSet<String>,
    last_fired: HashMap<(AlertType, String), DateTime<Utc>>,
}

impl AlertLog {
    pub fn new(cooldown_secs: i64) -> Self {
        Self {
            cooldown: Duration::seconds(cooldown_secs.max(0)),
            history: Vec::new(),
            dismissed: HashSet::new(),
            last_fired: HashMap::new(),
        }
    }

    /// Records a new alert unless the same (type, zone) fired within the
    /// cool-down window.
    pub fn fire(
        &mut self,
        kind: AlertType,
        severity: AlertSeverity,
        message: String,
        zone: String,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let key = (kind, zone.clone());
        if let Some(last) = self.last_fired.get(&key) {
            if now - *last < self.cooldown {
                tracing::debug!(kind = %kind, zone = %zone, "alert suppressed by cool-down");
                telemetry::metrics::MONITOR_ALERTS_SUPPRESSED.inc();
                return None;
            }
        }

        let alert = Alert::new(kind, severity, message, zone, now);
        self.last_fired.insert(key, now);
        self.history.push(alert.clone());

        telemetry::metrics::MONITOR_ALERTS_FIRED
            .with_label_values(&[&kind.to_string(), &severity.to_string()])
            .inc();
        tracing::info!(
            alert_id = %alert.id,
            kind = %kind,
            severity = %severity,
            zone = %alert.zone,
            "alert fired"
        );

        Some(alert)
    }

    /// Marks an alert closed. Idempotent: dismissing twice is a no-op.
    /// Returns false when the id was never issued.
    pub fn dismiss(&mut self, alert_id: &str) -> bool {
        if !self.history.iter().any(|a| a.id == alert_id) {
            return false;
        }
        if !self.dismissed.insert(alert_id.to_string()) {
            tracing::debug!(alert_id = %alert_id, "alert already dismissed");
        }
        true
    }

    /// Open (not dismissed) alerts, most recent first.
    pub fn open(&self) -> Vec<Alert> {
        self.history
            .iter()
            .rev()
            .filter(|a| !self.dismissed.contains(&a.id))
            .cloned()
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.history
            .iter()
            .filter(|a| !self.dismissed.contains(&a.id))
            .count()
    }

    /// Full history including dismissed alerts, oldest first. Backs the
    /// export artifact; history is never deleted.
    pub fn history(&self) -> &[Alert] {
        &self.history
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}

pub struct AlertEngine;

impl AlertEngine {
    /// One evaluation pass over the rule table. First match per category
    /// wins; categories fire independently.
    pub fn evaluate(
        log: &mut AlertLog,
        inputs: &EvaluationInputs<'_>,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut fired = Vec::new();

        for observation in inputs.zones {
            let alert = if observation.density == DensityLevel::Critical {
                log.fire(
                    AlertType::Congestion,
                    AlertSeverity::Danger,
                    format!(
                        "Extreme density detected at {} ({} people).",
                        observation.zone.name, observation.count
                    ),
                    observation.zone.name.clone(),
                    now,
                )
            } else if observation.density == DensityLevel::High && inputs.trend_rising {
                log.fire(
                    AlertType::Congestion,
                    AlertSeverity::Warning,
                    format!(
                        "Sustained crowd build-up at {} ({} people and rising).",
                        observation.zone.name, observation.count
                    ),
                    observation.zone.name.clone(),
                    now,
                )
            } else {
                None
            };
            fired.extend(alert);
        }

        for (sector, rate) in inputs.sector_rates {
            if *rate >= PARKING_CAPACITY_THRESHOLD {
                fired.extend(log.fire(
                    AlertType::Parking,
                    AlertSeverity::Info,
                    format!("Parking sector {} is reaching full capacity.", sector),
                    format!("Sector {}", sector),
                    now,
                ));
            }
        }

        fired
    }

    /// Externally supplied flow report from a sensor collaborator.
    pub fn report(
        log: &mut AlertLog,
        zone: &Zone,
        kind: ReportKind,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let message = match kind {
            ReportKind::IrregularFlow => {
                format!("Irregular flow pattern identified in {}.", zone.name)
            }
            ReportKind::Obstruction => format!("Exit obstruction reported in {}.", zone.name),
        };
        log.fire(
            AlertType::Safety,
            AlertSeverity::Warning,
            message,
            zone.name.clone(),
            now,
        )
    }
}
