//! Bounded, time-ordered series of observed vs expected crowd counts.

use chrono::{DateTime, Utc};
use common::crowd::CrowdDataPoint;
use std::collections::VecDeque;

pub const DEFAULT_WINDOW: usize = 13;

#[derive(Debug)]
pub struct TrendStore {
    window: usize,
    points: VecDeque<CrowdDataPoint>,
}

impl TrendStore {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            points: VecDeque::with_capacity(window.max(1)),
        }
    }

    /// Appends a sample, evicting the oldest point once the window is full.
    /// A duplicate timestamp replaces the existing entry instead of growing
    /// the window; out-of-order samples are inserted in timestamp order.
    pub fn append(&mut self, timestamp: DateTime<Utc>, observed: u64, expected: u64) {
        let point = CrowdDataPoint {
            timestamp,
            observed,
            expected,
        };

        if let Some(pos) = self.points.iter().position(|p| p.timestamp == timestamp) {
            self.points[pos] = point;
            return;
        }

        let insert_at = self
            .points
            .iter()
            .position(|p| p.timestamp > timestamp)
            .unwrap_or(self.points.len());
        self.points.insert(insert_at, point);

        if self.points.len() > self.window {
            self.points.pop_front();
        }
    }

    pub fn series(&self) -> Vec<CrowdDataPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether observed counts are strictly increasing over the most recent
    /// `n` points. False when the series is shorter than `n`.
    pub fn rising(&self, n: usize) -> bool {
        if n < 2 || self.points.len() < n {
            return false;
        }
        let tail: Vec<u64> = self
            .points
            .iter()
            .skip(self.points.len() - n)
            .map(|p| p.observed)
            .collect();
        tail.windows(2).all(|pair| pair[0] < pair[1])
    }
}

impl Default for TrendStore {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
