//! Fibonacci polling schedule.
//!
//! A schedule is a list of step counts, each a multiple of the schedule's time unit: `[1, 1, 2, 3, 5, 8, ...]`. The
//! list is cut off before the cumulative sum would exceed the tracking window, so a loop that follows the schedule
//! never outlives the record it is reconciling.
use std::time::Duration;

use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    steps: Vec<u64>,
    unit: Duration,
}

impl BackoffSchedule {
    /// Builds the Fibonacci schedule for `max_window`, measured in `unit`s.
    ///
    /// The schedule always starts with `[1, 1]`, even when the window is shorter than two units.
    pub fn fibonacci(max_window: Duration, unit: Duration) -> Self {
        let budget = if unit.is_zero() { 0 } else { max_window.as_nanos() / unit.as_nanos() };
        let mut steps = vec![1u64, 1];
        let mut total = 2u128;
        let (mut prev, mut last) = (1u64, 1u64);
        loop {
            let next = prev.saturating_add(last);
            if total + u128::from(next) > budget {
                break;
            }
            steps.push(next);
            total += u128::from(next);
            prev = last;
            last = next;
        }
        Self { steps, unit }
    }

    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The waiting time of step `i`, if there is one.
    pub fn delay(&self, i: usize) -> Option<Duration> {
        let step = *self.steps.get(i)?;
        Some(self.unit.saturating_mul(u32::try_from(step).unwrap_or(u32::MAX)))
    }

    /// Total time spent waiting if every step is slept through.
    pub fn total(&self) -> Duration {
        (0..self.len()).filter_map(|i| self.delay(i)).fold(Duration::ZERO, Duration::saturating_add)
    }

    pub fn ticker(&self, shutdown: watch::Receiver<bool>) -> Ticker {
        Ticker { schedule: self.clone(), next: 0, shutdown }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The n-th wait (1-based) elapsed.
    Tick(usize),
    /// Every step has been waited through.
    Exhausted,
    /// The shutdown signal fired.
    Cancelled,
}

/// Walks through a [`BackoffSchedule`], sleeping for each step. Every sleep ends early when shutdown is signalled.
#[derive(Debug)]
pub struct Ticker {
    schedule: BackoffSchedule,
    next: usize,
    shutdown: watch::Receiver<bool>,
}

impl Ticker {
    pub async fn next_tick(&mut self) -> Tick {
        if *self.shutdown.borrow() {
            return Tick::Cancelled;
        }
        let Some(delay) = self.schedule.delay(self.next) else {
            return Tick::Exhausted;
        };
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                self.next += 1;
                Tick::Tick(self.next)
            },
            _ = shutdown_signalled(&mut self.shutdown) => Tick::Cancelled,
        }
    }
}

/// Resolves once the flag flips to `true`. Never resolves if the sender goes away without signalling.
async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
