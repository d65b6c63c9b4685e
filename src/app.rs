use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::constants::MIN_MAX_RATE;
use crate::error::FetchError;
use crate::history::{self, ShardHistory, ShardId};
use crate::rate::{self, DerivedMetrics};

// One shard entry of the node's info response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardSnapshot {
    pub shard_id: ShardId,
    pub max_height: u64,
    pub block_delay: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShardView {
    pub snapshot: ShardSnapshot,
    pub metrics: DerivedMetrics,
}

impl ShardView {
    /// Fraction of the target height already reached.
    pub fn sync_ratio(&self) -> f64 {
        let total = self.snapshot.max_height as f64 + self.snapshot.block_delay as f64;
        self.snapshot.max_height as f64 / total.max(1.0)
    }

    /// Seconds until the remaining delay is consumed at the window average rate.
    pub fn eta_secs(&self) -> Option<u64> {
        let m = &self.metrics;
        if m.instantaneous_rate > 0.0 && m.average_rate > 0.0 {
            Some((self.snapshot.block_delay as f64 / m.average_rate) as u64)
        } else {
            None
        }
    }

    /// Rate relative to the fastest shard of the same poll, clamped to `0..=1`.
    pub fn rate_ratio(&self, max_rate: f64) -> f64 {
        (self.metrics.instantaneous_rate / max_rate.max(MIN_MAX_RATE)).clamp(0.0, 1.0)
    }
}

pub enum PollResult {
    Success {
        snapshots: Vec<ShardSnapshot>,
        observed_at: DateTime<Local>,
    },
    Failure {
        error: FetchError,
        observed_at: DateTime<Local>,
    },
}

/// Everything the renderer needs for one frame.
///
/// A new value is produced for every poll by [`DashboardState::advance`];
/// nothing mutates a published state in place.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub shards: BTreeMap<ShardId, ShardView>,
    pub max_rate: f64,
    pub last_error: Option<String>,
    pub as_of: DateTime<Local>,
    histories: HashMap<ShardId, ShardHistory>,
    capacity: usize,
}

impl DashboardState {
    pub fn new(capacity: usize) -> Self {
        Self {
            shards: BTreeMap::new(),
            max_rate: MIN_MAX_RATE,
            last_error: None,
            as_of: Local::now(),
            histories: HashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn history(&self, shard_id: ShardId) -> Option<&ShardHistory> {
        self.histories.get(&shard_id)
    }

    pub fn advance(&self, poll: PollResult) -> DashboardState {
        match poll {
            PollResult::Success {
                snapshots,
                observed_at,
            } => self.apply_snapshots(&snapshots, observed_at),
            PollResult::Failure { error, observed_at } => {
                tracing::warn!(error = %error, "poll failed, keeping last known state");
                DashboardState {
                    last_error: Some(error.to_string()),
                    as_of: observed_at,
                    ..self.clone()
                }
            }
        }
    }

    fn apply_snapshots(
        &self,
        snapshots: &[ShardSnapshot],
        observed_at: DateTime<Local>,
    ) -> DashboardState {
        let histories = history::merge(&self.histories, snapshots, observed_at, self.capacity);

        let mut shards = BTreeMap::new();
        let mut max_rate = MIN_MAX_RATE;
        for snapshot in snapshots {
            let Some(history) = histories.get(&snapshot.shard_id) else {
                continue;
            };
            let previous = self.shards.get(&snapshot.shard_id).map(|v| &v.metrics);
            let metrics = rate::derive(history, previous);
            max_rate = max_rate.max(metrics.instantaneous_rate);
            shards.insert(
                snapshot.shard_id,
                ShardView {
                    snapshot: *snapshot,
                    metrics,
                },
            );
        }

        tracing::debug!(shards = shards.len(), max_rate, "applied poll");

        DashboardState {
            shards,
            max_rate,
            last_error: None,
            as_of: observed_at,
            histories,
            capacity: self.capacity,
        }
    }
}
