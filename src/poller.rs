use std::{
    io,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
    thread,
    time::{Duration, Instant},
};

use chrono::Local;

use crate::app::PollResult;
use crate::error::FetchError;
use crate::source::SampleSource;

/// Background thread that runs one fetch per request.
///
/// The UI thread stays responsive to keys while a request is in flight and
/// only ever has a single request outstanding.
pub struct Poller {
    requests: Sender<()>,
    results: Receiver<PollResult>,
}

impl Poller {
    pub fn spawn<S: SampleSource>(source: S) -> io::Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<()>();
        let (res_tx, res_rx) = mpsc::channel::<PollResult>();

        thread::Builder::new()
            .name("fetch".into())
            .spawn(move || {
                let target = source.describe();
                while req_rx.recv().is_ok() {
                    tracing::debug!(target = %target, "fetching");
                    let result = match source.fetch() {
                        Ok(snapshots) => PollResult::Success {
                            snapshots,
                            observed_at: Local::now(),
                        },
                        Err(error) => PollResult::Failure {
                            error,
                            observed_at: Local::now(),
                        },
                    };
                    if res_tx.send(result).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            requests: req_tx,
            results: res_rx,
        })
    }

    pub fn request(&self) {
        // a dead worker is reported through try_recv
        if self.requests.send(()).is_err() {
            tracing::warn!("fetch worker is not running");
        }
    }

    pub fn try_recv(&self) -> Option<PollResult> {
        match self.results.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(PollResult::Failure {
                error: FetchError::WorkerGone,
                observed_at: Local::now(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Rendering,
}

/// Fixed-period cycle: Idle -> Fetching -> Rendering -> Idle.
///
/// The next fetch is due one period after the previous cycle was drawn, so
/// cycles never overlap no matter how slow a fetch is.
#[derive(Debug)]
pub struct Scheduler {
    phase: Phase,
    period: Duration,
    next_due: Instant,
}

impl Scheduler {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            phase: Phase::Idle,
            period,
            next_due: now,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.phase == Phase::Idle && now >= self.next_due
    }

    pub fn start_fetch(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.phase = Phase::Fetching;
        true
    }

    pub fn fetch_done(&mut self) {
        if self.phase == Phase::Fetching {
            self.phase = Phase::Rendering;
        }
    }

    pub fn rendered(&mut self, now: Instant) {
        if self.phase == Phase::Rendering {
            self.phase = Phase::Idle;
            self.next_due = now + self.period;
        }
    }

    // How long the UI may block waiting for input before the schedule needs attention
    pub fn wait_timeout(&self, now: Instant, cap: Duration) -> Duration {
        match self.phase {
            Phase::Idle => self.next_due.saturating_duration_since(now).min(cap),
            Phase::Fetching => cap,
            Phase::Rendering => Duration::ZERO,
        }
    }
}
