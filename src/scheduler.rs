//! Mutation filtering and debounced re-scan scheduling
//!
//! The host page mutates in bursts: expanding a collapsed file can add
//! hundreds of nodes in one frame. Each qualifying burst arms (or
//! re-arms) a single deadline; the scan fires only once the page has
//! been quiet for the full delay. Navigation events arm the same
//! deadline, so a route change lands in the same coalescing window.
//!
//! Time is injected as `Instant` values, never read from a clock here.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::dom::{Dom, NodeId};
use crate::schema::HostSchema;

/// Last-trigger-wins deadline timer.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm or push back the deadline to `now + delay`.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True and disarmed once `now` reaches the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}

/// Decides which mutations matter and when a scan is due.
#[derive(Debug)]
pub struct MutationScheduler {
    debouncer: Debouncer,
}

impl MutationScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
        }
    }

    /// Feed one mutation batch (the nodes added by the host). Arms the
    /// debouncer iff any added node, or a descendant of one, matches the
    /// schema's panel, header, or row predicate.
    pub fn note_batch(&mut self, dom: &Dom, schema: &HostSchema, added: &[NodeId], now: Instant) {
        let qualifies = added.iter().any(|&n| schema.qualifies_mutation(dom, n));
        if qualifies {
            trace!(added = added.len(), "qualifying mutation batch");
            self.debouncer.trigger(now);
        }
    }

    /// A navigation/route change always schedules a scan.
    pub fn note_navigation(&mut self, now: Instant) {
        trace!("navigation noted");
        self.debouncer.trigger(now);
    }

    /// True once the quiet period has elapsed; the caller scans then.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.debouncer.fire(now)
    }

    pub fn is_armed(&self) -> bool {
        self.debouncer.is_armed()
    }
}
