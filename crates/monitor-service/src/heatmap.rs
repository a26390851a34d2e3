//! Fixed 10x10 spatial projection of the facility.
//!
//! Each zone owns a block of grid rows assigned at construction. Intensity is
//! normalized against a per-zone rolling maximum, so a cell value is always in
//! [0, 1] and decays gracefully as the rolling max grows.

use common::crowd::{HeatmapCell, Zone};
use std::collections::HashMap;

pub const GRID_SIZE: usize = 10;

pub struct HeatmapAggregator {
    intensity: Vec<f32>,
    regions: HashMap<String, Vec<usize>>,
    rolling_max: HashMap<String, u64>,
}

impl HeatmapAggregator {
    pub fn new(zones: &[Zone]) -> Self {
        let mut regions = HashMap::new();
        if !zones.is_empty() {
            let rows_per_zone = (GRID_SIZE / zones.len()).max(1);
            for (idx, zone) in zones.iter().enumerate() {
                let start_row = (idx * rows_per_zone).min(GRID_SIZE - 1);
                let end_row = if idx == zones.len() - 1 {
                    GRID_SIZE
                } else {
                    ((idx + 1) * rows_per_zone).min(GRID_SIZE)
                };

                let mut cells = Vec::new();
                for y in start_row..end_row {
                    for x in 0..GRID_SIZE {
                        cells.push(y * GRID_SIZE + x);
                    }
                }
                regions.insert(zone.id.clone(), cells);
            }
        }

        Self {
            intensity: vec![0.0; GRID_SIZE * GRID_SIZE],
            regions,
            rolling_max: HashMap::new(),
        }
    }

    /// Recompute the intensity of the cells mapped to a zone. Malformed zone
    /// identifiers are logged and ignored, never propagated.
    pub fn observe(&mut self, zone_id: &str, count: u64) {
        let Some(cells) = self.regions.get(zone_id) else {
            tracing::warn!(zone = %zone_id, "dropping heatmap update for unknown zone");
            return;
        };

        let max = self.rolling_max.entry(zone_id.to_string()).or_insert(0);
        if count > *max {
            *max = count;
        }
        let intensity = if *max == 0 {
            0.0
        } else {
            (count as f32 / *max as f32).min(1.0)
        };

        for &cell in cells {
            self.intensity[cell] = intensity;
        }
    }

    /// Fully populated grid, ordered by (y, x). Exactly 100 cells even before
    /// any update.
    pub fn snapshot(&self) -> Vec<HeatmapCell> {
        let mut cells = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                cells.push(HeatmapCell {
                    x: x as u8,
                    y: y as u8,
                    intensity: self.intensity[y * GRID_SIZE + x],
                });
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones() -> Vec<Zone> {
        vec![
            Zone::new("north-gate", "North Gate"),
            Zone::new("central-plaza", "Central Plaza"),
        ]
    }

    #[test]
    fn snapshot_is_fully_populated_before_any_update() {
        let aggregator = HeatmapAggregator::new(&zones());
        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.len(), GRID_SIZE * GRID_SIZE);
        assert!(snapshot.iter().all(|c| c.intensity == 0.0));
    }

    #[test]
    fn snapshot_has_no_duplicate_coordinates() {
        let aggregator = HeatmapAggregator::new(&zones());
        let snapshot = aggregator.snapshot();
        let mut seen = std::collections::HashSet::new();
        for cell in &snapshot {
            assert!(seen.insert((cell.x, cell.y)));
            assert!(cell.x < GRID_SIZE as u8);
            assert!(cell.y < GRID_SIZE as u8);
        }
    }

    #[test]
    fn intensity_stays_in_unit_interval() {
        let mut aggregator = HeatmapAggregator::new(&zones());
        for count in [0, 1, 80, 5000, 3] {
            aggregator.observe("north-gate", count);
            assert!(aggregator
                .snapshot()
                .iter()
                .all(|c| (0.0..=1.0).contains(&c.intensity)));
        }
    }

    #[test]
    fn intensity_normalizes_against_rolling_max() {
        let mut aggregator = HeatmapAggregator::new(&zones());
        aggregator.observe("north-gate", 100);
        let peak = aggregator.snapshot()[0].intensity;
        assert_eq!(peak, 1.0);

        aggregator.observe("north-gate", 50);
        let halved = aggregator.snapshot()[0].intensity;
        assert!((halved - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_zone_updates_are_ignored() {
        let mut aggregator = HeatmapAggregator::new(&zones());
        aggregator.observe("loading-dock", 500);
        assert!(aggregator.snapshot().iter().all(|c| c.intensity == 0.0));
    }

    #[test]
    fn zones_map_to_disjoint_row_blocks() {
        let mut aggregator = HeatmapAggregator::new(&zones());
        aggregator.observe("north-gate", 10);

        let snapshot = aggregator.snapshot();
        // first zone owns the upper half of the grid, second zone untouched
        assert!(snapshot[0].intensity > 0.0);
        assert_eq!(snapshot[GRID_SIZE * GRID_SIZE - 1].intensity, 0.0);
    }
}
