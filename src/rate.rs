use chrono::{DateTime, Local};

use crate::history::ShardHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Growth rates of one shard for a single poll, in blocks per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedMetrics {
    /// Height change between the oldest and newest sample of the window.
    pub instantaneous_rate: f64,
    /// Duration-weighted mean of the per-step rates inside the window.
    pub average_rate: f64,
    /// `instantaneous_rate` of the same shard in the previous poll.
    pub previous_instantaneous_rate: f64,
}

impl DerivedMetrics {
    pub fn trend(&self) -> Trend {
        if self.instantaneous_rate > self.previous_instantaneous_rate {
            Trend::Up
        } else if self.instantaneous_rate < self.previous_instantaneous_rate {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

pub fn seconds_between(start: DateTime<Local>, end: DateTime<Local>) -> f64 {
    let delta = end.signed_duration_since(start);
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Rate over the whole window span. `None` when the span is not positive.
pub fn instantaneous_rate(history: &ShardHistory) -> Option<f64> {
    let (first, last) = (history.first()?, history.last()?);
    let elapsed = seconds_between(first.observed_at, last.observed_at);
    if elapsed <= 0.0 {
        return None;
    }
    Some((last.height as f64 - first.height as f64) / elapsed)
}

/// Sum of step deltas over sum of step durations, skipping steps whose
/// duration is zero or negative. `None` when no step qualifies.
pub fn average_rate(history: &ShardHistory) -> Option<f64> {
    let mut total_blocks = 0.0;
    let mut total_secs = 0.0;

    let samples = history.samples();
    for (prev, next) in samples.iter().zip(samples.iter().skip(1)) {
        let dt = seconds_between(prev.observed_at, next.observed_at);
        if dt > 0.0 {
            total_blocks += next.height as f64 - prev.height as f64;
            total_secs += dt;
        }
    }

    if total_secs > 0.0 {
        Some(total_blocks / total_secs)
    } else {
        None
    }
}

pub fn derive(history: &ShardHistory, previous: Option<&DerivedMetrics>) -> DerivedMetrics {
    let prior = previous.copied().unwrap_or_default();

    if history.len() < 2 {
        return DerivedMetrics {
            instantaneous_rate: 0.0,
            average_rate: 0.0,
            previous_instantaneous_rate: prior.instantaneous_rate,
        };
    }

    DerivedMetrics {
        instantaneous_rate: instantaneous_rate(history).unwrap_or(prior.instantaneous_rate),
        average_rate: average_rate(history).unwrap_or(prior.average_rate),
        previous_instantaneous_rate: prior.instantaneous_rate,
    }
}
