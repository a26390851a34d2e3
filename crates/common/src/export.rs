//! Alert-log export artifact consumed by the external reporting collaborator.
//!
//! Delimited text with a fixed header and one row per alert. The message
//! field is quoted so embedded delimiters survive the round trip.

use crate::alerts::Alert;

pub const ALERT_LOG_HEADER: &str = "Timestamp,Type,Severity,Message,Zone";

/// Renders the alert log as CSV, newest entry last.
pub fn alert_log_csv(alerts: &[Alert]) -> String {
    let mut out = String::with_capacity(64 + alerts.len() * 96);
    out.push_str(ALERT_LOG_HEADER);
    out.push('\n');
    for alert in alerts {
        out.push_str(&alert.timestamp.to_rfc3339());
        out.push(',');
        out.push_str(&alert.kind.to_string());
        out.push(',');
        out.push_str(&alert.severity.to_string());
        out.push(',');
        out.push('"');
        out.push_str(&alert.message.replace('"', "\"\""));
        out.push('"');
        out.push(',');
        out.push_str(&alert.zone);
        out.push('\n');
    }
    out
}
