//! Parking contracts: slot taxonomy, operator-visible slot state and the
//! sensor resync feed shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParkingSlotType {
    Standard,
    Disabled,
    Ev,
}

impl std::fmt::Display for ParkingSlotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParkingSlotType::Standard => write!(f, "STANDARD"),
            ParkingSlotType::Disabled => write!(f, "DISABLED"),
            ParkingSlotType::Ev => write!(f, "EV"),
        }
    }
}

/// Occupancy state of one slot. `Reserved` counts as occupied for capacity
/// purposes but stays distinguishable for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    #[default]
    Vacant,
    Occupied,
    Reserved,
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotStatus::Vacant => write!(f, "VACANT"),
            SlotStatus::Occupied => write!(f, "OCCUPIED"),
            SlotStatus::Reserved => write!(f, "RESERVED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSlot {
    pub id: String,
    #[serde(rename = "type")]
    pub slot_type: ParkingSlotType,
    pub status: SlotStatus,
}

impl ParkingSlot {
    /// Whether the slot counts against capacity.
    pub fn occupied(&self) -> bool {
        matches!(self.status, SlotStatus::Occupied | SlotStatus::Reserved)
    }
}

/// One entry of a bulk sensor resync feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotObservation {
    pub slot_id: String,
    pub occupied: bool,
}

/// Bulk sensor resync request. Slots absent from the feed retain prior state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingRefreshRequest {
    pub slots: Vec<SlotObservation>,
}

/// Filter for the parking read surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParkingFilter {
    #[default]
    All,
    Standard,
    Disabled,
    Ev,
}

impl ParkingFilter {
    pub fn matches(&self, slot_type: ParkingSlotType) -> bool {
        match self {
            ParkingFilter::All => true,
            ParkingFilter::Standard => slot_type == ParkingSlotType::Standard,
            ParkingFilter::Disabled => slot_type == ParkingSlotType::Disabled,
            ParkingFilter::Ev => slot_type == ParkingSlotType::Ev,
        }
    }
}

impl std::str::FromStr for ParkingFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(ParkingFilter::All),
            "STANDARD" => Ok(ParkingFilter::Standard),
            "DISABLED" => Ok(ParkingFilter::Disabled),
            "EV" => Ok(ParkingFilter::Ev),
            _ => Err(format!("Invalid parking filter: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_counts_as_occupied() {
        let slot = ParkingSlot {
            id: "P-3".to_string(),
            slot_type: ParkingSlotType::Standard,
            status: SlotStatus::Reserved,
        };
        assert!(slot.occupied());
    }

    #[test]
    fn filter_parses_wire_values() {
        assert_eq!("ev".parse::<ParkingFilter>().unwrap(), ParkingFilter::Ev);
        assert_eq!("ALL".parse::<ParkingFilter>().unwrap(), ParkingFilter::All);
        assert!("compact".parse::<ParkingFilter>().is_err());
    }

    #[test]
    fn slot_type_serializes_under_type_key() {
        let slot = ParkingSlot {
            id: "P-0".to_string(),
            slot_type: ParkingSlotType::Ev,
            status: SlotStatus::Vacant,
        };
        let value = serde_json::to_value(&slot).unwrap();
        assert_eq!(value["type"], "EV");
        assert_eq!(value["status"], "VACANT");
    }
}
