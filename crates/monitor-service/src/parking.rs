//! Authoritative occupancy state of the parking fleet.
//!
//! Slots are provisioned once with stable ids that are never reused. Sensor
//! resyncs may flip a slot between vacant and occupied; `Reserved` is an
//! operator override the sensor feed cannot touch, and an occupied slot must
//! be released before it can be reserved.

use crate::error::MonitorError;
use common::parking::{ParkingFilter, ParkingSlot, ParkingSlotType, SlotObservation, SlotStatus};
use std::collections::{BTreeMap, HashMap};

pub struct ParkingStateManager {
    /// Slots in provisioning order; read views preserve this ordering.
    slots: Vec<ParkingSlot>,
    index: HashMap<String, usize>,
}

impl ParkingStateManager {
    pub fn new(slots: Vec<ParkingSlot>) -> Self {
        let index = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.id.clone(), i))
            .collect();
        Self { slots, index }
    }

    /// Default fleet shape: every 10th slot accessible, every 8th an EV point.
    pub fn provision(count: usize) -> Self {
        let slots = (0..count)
            .map(|i| ParkingSlot {
                id: format!("P-{}", i),
                slot_type: if i % 10 == 0 {
                    ParkingSlotType::Disabled
                } else if i % 8 == 0 {
                    ParkingSlotType::Ev
                } else {
                    ParkingSlotType::Standard
                },
                status: SlotStatus::Vacant,
            })
            .collect();
        Self::new(slots)
    }

    /// Bulk sensor resync. Unknown slot ids reject the whole feed before any
    /// slot is touched, so a read never observes a half-applied refresh.
    /// Known slots absent from the feed retain prior state; reserved slots
    /// are skipped. Returns the number of slots that changed state.
    pub fn refresh(&mut self, feed: &[SlotObservation]) -> Result<usize, MonitorError> {
        for observation in feed {
            if !self.index.contains_key(&observation.slot_id) {
                return Err(MonitorError::UnknownSlot(observation.slot_id.clone()));
            }
        }

        let mut applied = 0;
        for observation in feed {
            let idx = self.index[&observation.slot_id];
            let slot = &mut self.slots[idx];

            if slot.status == SlotStatus::Reserved {
                tracing::debug!(slot = %slot.id, "sensor feed ignored for reserved slot");
                continue;
            }

            let next = if observation.occupied {
                SlotStatus::Occupied
            } else {
                SlotStatus::Vacant
            };
            if slot.status != next {
                slot.status = next;
                applied += 1;
            }
        }

        tracing::info!(observations = feed.len(), applied, "parking resync applied");
        Ok(applied)
    }

    /// Operator override: Occupied/Reserved flip to Vacant, Vacant flips to
    /// Occupied.
    pub fn toggle(&mut self, slot_id: &str) -> Result<ParkingSlot, MonitorError> {
        let idx = *self
            .index
            .get(slot_id)
            .ok_or_else(|| MonitorError::UnknownSlot(slot_id.to_string()))?;
        let slot = &mut self.slots[idx];

        slot.status = match slot.status {
            SlotStatus::Vacant => SlotStatus::Occupied,
            SlotStatus::Occupied | SlotStatus::Reserved => SlotStatus::Vacant,
        };
        tracing::info!(slot = %slot.id, status = %slot.status, "slot toggled");
        Ok(slot.clone())
    }

    /// Operator override: Vacant to Reserved. An occupied slot must be
    /// released first.
    pub fn reserve(&mut self, slot_id: &str) -> Result<ParkingSlot, MonitorError> {
        let idx = *self
            .index
            .get(slot_id)
            .ok_or_else(|| MonitorError::UnknownSlot(slot_id.to_string()))?;
        let slot = &mut self.slots[idx];

        if slot.status == SlotStatus::Occupied {
            return Err(MonitorError::InvalidInput(format!(
                "slot '{}' must be released before it can be reserved",
                slot_id
            )));
        }

        slot.status = SlotStatus::Reserved;
        tracing::info!(slot = %slot.id, "slot reserved");
        Ok(slot.clone())
    }

    /// Filtered read view preserving slot id ordering.
    pub fn view(&self, filter: ParkingFilter) -> Vec<ParkingSlot> {
        self.slots
            .iter()
            .filter(|slot| filter.matches(slot.slot_type))
            .cloned()
            .collect()
    }

    /// Occupied-or-reserved share of the whole fleet.
    pub fn occupancy_rate(&self) -> Result<f64, MonitorError> {
        if self.slots.is_empty() {
            return Err(MonitorError::EmptyFleet);
        }
        let taken = self.slots.iter().filter(|slot| slot.occupied()).count();
        Ok(taken as f64 / self.slots.len() as f64)
    }

    /// Per-sector occupancy, sector being the slot id prefix before the
    /// first '-'. Deterministically ordered by sector name.
    pub fn sector_rates(&self) -> Vec<(String, f64)> {
        let mut sectors: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for slot in &self.slots {
            let sector = slot
                .id
                .split_once('-')
                .map(|(prefix, _)| prefix)
                .unwrap_or(slot.id.as_str())
                .to_string();
            let entry = sectors.entry(sector).or_insert((0, 0));
            entry.1 += 1;
            if slot.occupied() {
                entry.0 += 1;
            }
        }

        sectors
            .into_iter()
            .map(|(sector, (taken, total))| (sector, taken as f64 / total as f64))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(slot_id: &str, occupied: bool) -> SlotObservation {
        SlotObservation {
            slot_id: slot_id.to_string(),
            occupied,
        }
    }

    #[test]
    fn provisioned_fleet_matches_original_shape() {
        let manager = ParkingStateManager::provision(48);
        assert_eq!(manager.len(), 48);

        let view = manager.view(ParkingFilter::All);
        assert_eq!(view[0].slot_type, ParkingSlotType::Disabled);
        assert_eq!(view[8].slot_type, ParkingSlotType::Ev);
        assert_eq!(view[1].slot_type, ParkingSlotType::Standard);
        assert!(view.iter().all(|s| s.status == SlotStatus::Vacant));
    }

    #[test]
    fn refresh_applies_feed_and_preserves_absent_slots() {
        let mut manager = ParkingStateManager::provision(4);
        manager
            .refresh(&[observation("P-0", true), observation("P-1", true)])
            .unwrap();
        manager.refresh(&[observation("P-1", false)]).unwrap();

        let view = manager.view(ParkingFilter::All);
        assert_eq!(view[0].status, SlotStatus::Occupied);
        assert_eq!(view[1].status, SlotStatus::Vacant);
        assert_eq!(view[2].status, SlotStatus::Vacant);
    }

    #[test]
    fn refresh_rejects_unknown_slots_without_mutating() {
        let mut manager = ParkingStateManager::provision(2);
        let err = manager
            .refresh(&[observation("P-0", true), observation("P-9", true)])
            .unwrap_err();

        assert!(matches!(err, MonitorError::UnknownSlot(ref id) if id == "P-9"));
        // all-or-nothing: the known slot in the bad feed stays vacant
        assert_eq!(manager.view(ParkingFilter::All)[0].status, SlotStatus::Vacant);
    }

    #[test]
    fn occupancy_counts_occupied_and_reserved() {
        let mut manager = ParkingStateManager::provision(2);
        manager.refresh(&[observation("P-0", true)]).unwrap();
        assert_eq!(manager.occupancy_rate().unwrap(), 0.5);

        manager.reserve("P-1").unwrap();
        assert_eq!(manager.occupancy_rate().unwrap(), 1.0);
    }

    #[test]
    fn occupancy_fails_for_empty_fleet() {
        let manager = ParkingStateManager::provision(0);
        assert!(matches!(
            manager.occupancy_rate(),
            Err(MonitorError::EmptyFleet)
        ));
    }

    #[test]
    fn toggle_is_its_own_inverse_for_vacant_occupied_pairs() {
        let mut manager = ParkingStateManager::provision(2);

        let before = manager.view(ParkingFilter::All)[1].clone();
        manager.toggle("P-1").unwrap();
        let after = manager.toggle("P-1").unwrap();
        assert_eq!(after, before);

        manager.refresh(&[observation("P-1", true)]).unwrap();
        let before = manager.view(ParkingFilter::All)[1].clone();
        manager.toggle("P-1").unwrap();
        let after = manager.toggle("P-1").unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn reserved_slots_release_to_vacant_on_toggle() {
        let mut manager = ParkingStateManager::provision(2);
        manager.reserve("P-1").unwrap();
        let slot = manager.toggle("P-1").unwrap();
        assert_eq!(slot.status, SlotStatus::Vacant);
    }

    #[test]
    fn occupied_slot_cannot_be_reserved_directly() {
        let mut manager = ParkingStateManager::provision(2);
        manager.refresh(&[observation("P-1", true)]).unwrap();
        let err = manager.reserve("P-1").unwrap_err();
        assert!(matches!(err, MonitorError::InvalidInput(_)));
    }

    #[test]
    fn sensor_feed_cannot_touch_reserved_slots() {
        let mut manager = ParkingStateManager::provision(2);
        manager.reserve("P-0").unwrap();
        manager.refresh(&[observation("P-0", false)]).unwrap();
        assert_eq!(
            manager.view(ParkingFilter::All)[0].status,
            SlotStatus::Reserved
        );
    }

    #[test]
    fn toggle_unknown_slot_is_an_error() {
        let mut manager = ParkingStateManager::provision(1);
        assert!(matches!(
            manager.toggle("P-7"),
            Err(MonitorError::UnknownSlot(_))
        ));
    }

    #[test]
    fn filtered_views_preserve_provisioning_order() {
        let manager = ParkingStateManager::provision(48);
        let ev = manager.view(ParkingFilter::Ev);
        assert!(!ev.is_empty());
        assert!(ev.iter().all(|s| s.slot_type == ParkingSlotType::Ev));

        let ids: Vec<&str> = ev.iter().map(|s| s.id.as_str()).collect();
        let mut sorted_by_index: Vec<&str> = ids.clone();
        sorted_by_index.sort_by_key(|id| {
            id.trim_start_matches("P-").parse::<usize>().unwrap_or(0)
        });
        assert_eq!(ids, sorted_by_index);
    }

    #[test]
    fn sector_rates_group_by_id_prefix() {
        let slots = vec![
            ParkingSlot {
                id: "G-0".to_string(),
                slot_type: ParkingSlotType::Standard,
                status: SlotStatus::Occupied,
            },
            ParkingSlot {
                id: "G-1".to_string(),
                slot_type: ParkingSlotType::Standard,
                status: SlotStatus::Occupied,
            },
            ParkingSlot {
                id: "H-0".to_string(),
                slot_type: ParkingSlotType::Standard,
                status: SlotStatus::Vacant,
            },
        ];
        let manager = ParkingStateManager::new(slots);

        let rates = manager.sector_rates();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0], ("G".to_string(), 1.0));
        assert_eq!(rates[1], ("H".to_string(), 0.0));
    }
}
