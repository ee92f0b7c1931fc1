//! Cost accounting: a passive [`EventSink`] that turns fetch/hit/miss
//! events into a cycle count and a unique-memory-footprint report.
//!
//! The tracker never calls into the CPU or memory — it only observes
//! what they choose to broadcast, so attaching or detaching it changes
//! nothing about simulation behavior.

use rv16_core::{Address, Event, EventBus, EventSink, SinkTable};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

const FETCH_NS: u64 = 1;
const HIT_NS: u64 = 1;
const MISS_NS: u64 = 80;

#[derive(Debug, Default)]
struct Counters {
    cycles: u64,
    ram_locations: HashSet<Address>,
    cache_locations: HashSet<(usize, usize)>,
}

impl EventSink for Counters {
    fn notify(&mut self, event: Event) {
        match event {
            Event::Fetch(_) => self.cycles += FETCH_NS,
            Event::Hit(_) => self.cycles += HIT_NS,
            Event::Miss(addr) => {
                self.cycles += MISS_NS;
                self.ram_locations.insert(addr);
            }
            Event::WriteCache { set, way } => {
                self.cache_locations.insert((set, way));
            }
        }
    }
}

/// Totals accumulated since a [`CostTracker`] was attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostReport {
    pub total_ns: u64,
    pub cache_locations_used: u32,
    pub ram_locations_used: u32,
}

/// An observer that subscribes to an [`EventBus`] for its lifetime.
///
/// Modeled as a scoped acquisition: [`CostTracker::attach`] installs the
/// subscription and returns both the tracker and an [`Attachment`] guard.
/// The counters keep accumulating for as long as the sink stays attached
/// to the bus.
#[derive(Debug, Clone)]
pub struct CostTracker {
    counters: Rc<RefCell<Counters>>,
}

impl CostTracker {
    /// Subscribe a fresh tracker to `events`, returning the tracker and a
    /// guard that unsubscribes it on drop.
    pub fn attach(events: &mut EventBus) -> (Self, Attachment) {
        let counters = Rc::new(RefCell::new(Counters::default()));
        let handle = events.attach(counters.clone());
        let sinks = events.sink_table();
        let tracker = CostTracker { counters };
        (tracker.clone(), Attachment { sinks, handle })
    }

    /// A snapshot of the totals accumulated so far.
    #[must_use]
    pub fn report(&self) -> CostReport {
        let counters = self.counters.borrow();
        CostReport {
            total_ns: counters.cycles,
            cache_locations_used: counters.cache_locations.len() as u32,
            ram_locations_used: counters.ram_locations.len() as u32,
        }
    }
}

/// Guard returned by [`CostTracker::attach`]. Holds its own clone of the
/// bus's shared sink storage, so `Drop` removes this attachment's slot
/// directly — no `&mut EventBus` needs to be threaded back in, and the
/// subscription is torn down on every exit path, including `?` and panic
/// unwinding.
pub struct Attachment {
    sinks: SinkTable,
    handle: usize,
}

impl Attachment {
    #[must_use]
    pub fn handle(&self) -> usize {
        self.handle
    }

    /// Unsubscribe immediately rather than waiting for the guard to drop.
    pub fn detach(self) {
        drop(self);
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        if let Some(slot) = self.sinks.borrow_mut().get_mut(self.handle) {
            *slot = None;
        }
        tracing::trace!(handle = self.handle, "cost tracker attachment detached");
    }
}
