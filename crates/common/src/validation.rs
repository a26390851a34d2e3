//! Input validation for external identifiers and payload sizes.
//!
//! Everything arriving from sensor collaborators or the presentation layer is
//! bounded here before it reaches component state, so a malformed feed cannot
//! crash the service or blow up memory.

use anyhow::{anyhow, Result};

/// Maximum length for zone and slot identifiers.
pub const MAX_ID_LENGTH: usize = 256;

/// Maximum length for human-readable names.
pub const MAX_NAME_LENGTH: usize = 512;

/// Maximum number of detections accepted in a single ingest batch.
pub const MAX_DETECTION_BATCH: usize = 10_000;

/// Validate string length against a maximum.
pub fn validate_length(value: &str, max_length: usize, field_name: &str) -> Result<()> {
    if value.len() > max_length {
        return Err(anyhow!(
            "{} exceeds maximum length of {} bytes (got {})",
            field_name,
            max_length,
            value.len()
        ));
    }
    Ok(())
}

/// Validate non-empty string.
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{} cannot be empty", field_name));
    }
    Ok(())
}

/// Validate a resource identifier (zone id, slot id, alert id).
pub fn validate_id(id: &str, field_name: &str) -> Result<()> {
    validate_non_empty(id, field_name)?;
    validate_length(id, MAX_ID_LENGTH, field_name)?;

    // Prevent path traversal in IDs
    if id.contains("..") || id.contains('/') || id.contains('\\') {
        return Err(anyhow!(
            "{} contains invalid characters (no path separators or '..' allowed)",
            field_name
        ));
    }

    Ok(())
}

/// Validate a display name (zone name, sector name).
pub fn validate_name(name: &str, field_name: &str) -> Result<()> {
    validate_non_empty(name, field_name)?;
    validate_length(name, MAX_NAME_LENGTH, field_name)?;
    Ok(())
}

/// Validate a detection batch size before the count is derived from it.
pub fn validate_batch_size(len: usize, field_name: &str) -> Result<()> {
    if len > MAX_DETECTION_BATCH {
        return Err(anyhow!(
            "{} exceeds maximum batch size of {} (got {})",
            field_name,
            MAX_DETECTION_BATCH,
            len
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_ids() {
        assert!(validate_id("north-gate", "zone_id").is_ok());
        assert!(validate_id("P-17", "slot_id").is_ok());
    }

    #[test]
    fn rejects_empty_and_traversal_ids() {
        assert!(validate_id("", "zone_id").is_err());
        assert!(validate_id("  ", "zone_id").is_err());
        assert!(validate_id("../etc", "zone_id").is_err());
        assert!(validate_id("a/b", "zone_id").is_err());
    }

    #[test]
    fn rejects_oversized_ids() {
        let long = "z".repeat(MAX_ID_LENGTH + 1);
        assert!(validate_id(&long, "zone_id").is_err());
    }

    #[test]
    fn rejects_oversized_batches() {
        assert!(validate_batch_size(MAX_DETECTION_BATCH, "detections").is_ok());
        assert!(validate_batch_size(MAX_DETECTION_BATCH + 1, "detections").is_err());
    }
}
