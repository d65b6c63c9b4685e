use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Local};

use crate::app::ShardSnapshot;

pub type ShardId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub height: u64,
    pub observed_at: DateTime<Local>,
}

// Most recent `capacity` samples of one shard, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct ShardHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl ShardHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn samples(&self) -> &VecDeque<Sample> {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }
}

/// Folds one poll's snapshots into the histories of the previous cycle.
///
/// Every reported shard gets exactly one new sample; if a poll lists the same
/// shard more than once, its last entry wins. Shards missing from this poll
/// are carried over untouched so their window survives a gap in reporting.
pub fn merge(
    previous: &HashMap<ShardId, ShardHistory>,
    snapshots: &[ShardSnapshot],
    observed_at: DateTime<Local>,
    capacity: usize,
) -> HashMap<ShardId, ShardHistory> {
    let mut merged = previous.clone();

    let mut latest: HashMap<ShardId, u64> = HashMap::with_capacity(snapshots.len());
    for snapshot in snapshots {
        latest.insert(snapshot.shard_id, snapshot.max_height);
    }

    for (shard_id, height) in latest {
        let history = merged
            .entry(shard_id)
            .or_insert_with(|| ShardHistory::new(capacity));
        history.push(Sample {
            height,
            observed_at,
        });
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn snap(shard_id: ShardId, max_height: u64) -> ShardSnapshot {
        ShardSnapshot {
            shard_id,
            max_height,
            block_delay: 0,
        }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let capacity = 5;
        let mut histories = HashMap::new();
        for i in 0..(capacity as u64 + 3) {
            histories = merge(&histories, &[snap(1, 100 + i)], at(i as i64), capacity);
        }

        let history = &histories[&1];
        assert_eq!(history.len(), capacity);
        let heights: Vec<u64> = history.samples().iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![103, 104, 105, 106, 107]);
        assert_eq!(history.first().unwrap().observed_at, at(3));
        assert_eq!(history.last().unwrap().observed_at, at(7));
    }

    #[test]
    fn exactly_capacity_after_one_extra_poll() {
        let capacity = 3;
        let mut histories = HashMap::new();
        for i in 0..=capacity as i64 {
            histories = merge(&histories, &[snap(9, i as u64)], at(i), capacity);
        }
        assert_eq!(histories[&9].len(), capacity);
        assert_eq!(histories[&9].first().unwrap().height, 1);
    }

    #[test]
    fn absent_shard_is_kept_unchanged() {
        let first = merge(&HashMap::new(), &[snap(1, 10), snap(2, 20)], at(0), 10);
        let second = merge(&first, &[snap(2, 25)], at(2), 10);

        assert_eq!(second[&1], first[&1]);
        assert_eq!(second[&1].len(), 1);
        assert_eq!(second[&2].len(), 2);
    }

    #[test]
    fn merge_does_not_touch_previous() {
        let first = merge(&HashMap::new(), &[snap(1, 10)], at(0), 10);
        let before = first.clone();
        let _ = merge(&first, &[snap(1, 11)], at(1), 10);
        assert_eq!(first, before);
    }

    #[test]
    fn order_of_snapshots_does_not_matter() {
        let a = merge(&HashMap::new(), &[snap(1, 10), snap(2, 20)], at(0), 10);
        let b = merge(&HashMap::new(), &[snap(2, 20), snap(1, 10)], at(0), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_shard_in_one_poll_keeps_last_entry() {
        let first = merge(&HashMap::new(), &[snap(3, 10)], at(0), 10);
        let second = merge(&first, &[snap(3, 11), snap(5, 1), snap(3, 12)], at(1), 10);

        let h = &second[&3];
        assert_eq!(h.len(), 2);
        assert_eq!(h.last().unwrap().height, 12);
        assert_eq!(second[&5].len(), 1);
    }

    #[test]
    fn new_shard_starts_with_one_sample() {
        let histories = merge(&HashMap::new(), &[snap(4, 77)], at(5), 10);
        let h = &histories[&4];
        assert_eq!(h.len(), 1);
        assert_eq!(
            *h.last().unwrap(),
            Sample {
                height: 77,
                observed_at: at(5)
            }
        );
    }
}
