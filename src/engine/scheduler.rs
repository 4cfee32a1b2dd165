//! Scheduled-callback handles with explicit cancel.

use std::time::{Duration, Instant};

/// How often a lab wants its tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    /// Every host refresh.
    Frame,
    /// A coarse fixed interval, for slow experiments.
    Every(Duration),
}

/// Captured when a tick is scheduled; goes stale on cancel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickHandle {
    generation: u64,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    handle: TickHandle,
    due: Instant,
}

/// Holds at most one pending tick. A new tick is armed only after the
/// previous one has been taken, so ticks never overlap.
#[derive(Debug)]
pub struct TickScheduler {
    cadence: Cadence,
    generation: u64,
    pending: Option<Pending>,
    last_fired: Option<Instant>,
}

impl TickScheduler {
    pub fn new(cadence: Cadence) -> Self {
        Self { cadence, generation: 0, pending: None, last_fired: None }
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn arm(&mut self, now: Instant) -> TickHandle {
        let due = match self.cadence {
            Cadence::Frame => now,
            Cadence::Every(interval) => now + interval,
        };
        let handle = TickHandle { generation: self.generation };
        self.pending = Some(Pending { handle, due });
        handle
    }

    /// Drops the pending tick and invalidates every handle issued so far.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.generation += 1;
        self.last_fired = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_current(&self, handle: TickHandle) -> bool {
        handle.generation == self.generation
    }

    /// Takes the pending tick if its due time has passed.
    pub fn due(&mut self, now: Instant) -> Option<TickHandle> {
        match self.pending {
            Some(p) if p.due <= now => {
                self.pending = None;
                Some(p.handle)
            }
            _ => None,
        }
    }

    /// Seconds of wall time this tick covers. The first tick after arming
    /// from rest covers nothing; frame ticks are capped at `max_step`.
    pub fn step(&mut self, now: Instant, max_step: f64) -> f64 {
        let previous = self.last_fired.replace(now);
        match self.cadence {
            Cadence::Every(interval) => interval.as_secs_f64(),
            Cadence::Frame => match previous {
                Some(prev) => now.saturating_duration_since(prev).as_secs_f64().min(max_step),
                None => 0.0,
            },
        }
    }
}
