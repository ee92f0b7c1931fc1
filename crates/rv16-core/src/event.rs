//! Observer events emitted by the CPU and memory, and the bus that
//! carries them to whatever sinks are attached.
//!
//! Nothing in `rv16-cpu` or `rv16-mem` ever calls into the cost tracker
//! directly — they push `Event`s to the `EventBus`. The tracker in
//! `rv16-cost` is one possible sink; a host is free to attach others
//! (e.g. a trace logger) without the core knowing they exist.

use crate::Address;
use std::cell::RefCell;
use std::rc::Rc;

/// Something the CPU or memory noticed while doing its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// An instruction fetch at the given address.
    Fetch(Address),
    /// A LOAD/STORE hit the cache.
    Hit(Address),
    /// A LOAD/STORE missed the cache and was routed to RAM.
    Miss(Address),
    /// A cache line was filled or overwritten.
    WriteCache { set: usize, way: usize },
}

/// A passive observer of `Event`s.
///
/// Implementors must not mutate CPU or memory state from `notify` — the
/// contract is read-only, one-way notification.
pub trait EventSink {
    fn notify(&mut self, event: Event);
}

/// Shared storage for attached sinks. Held behind `Rc<RefCell<_>>` so a
/// subscription guard living outside this module (e.g. the cost tracker's
/// `Attachment`) can keep its own clone and remove its slot directly from
/// `Drop`, without needing a `&mut EventBus` handed back to it.
pub type SinkTable = Rc<RefCell<Vec<Option<Rc<RefCell<dyn EventSink>>>>>>;

/// A small fixed-shape event bus. Sinks subscribe with [`EventBus::attach`]
/// and are removed with [`EventBus::detach`], or by dropping a guard built
/// from [`EventBus::sink_table`]'s shared handle.
#[derive(Default)]
pub struct EventBus {
    sinks: SinkTable,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self { sinks: Rc::new(RefCell::new(Vec::new())) }
    }

    /// Subscribe a sink, returning a handle used to `detach` it later.
    pub fn attach(&mut self, sink: Rc<RefCell<dyn EventSink>>) -> usize {
        let mut sinks = self.sinks.borrow_mut();
        if let Some(slot) = sinks.iter().position(Option::is_none) {
            sinks[slot] = Some(sink);
            slot
        } else {
            sinks.push(Some(sink));
            sinks.len() - 1
        }
    }

    /// Unsubscribe a previously attached sink. No-op if already detached.
    pub fn detach(&mut self, handle: usize) {
        if let Some(slot) = self.sinks.borrow_mut().get_mut(handle) {
            *slot = None;
        }
    }

    /// A clone of the shared sink storage, for building a teardown guard
    /// that can remove its own slot from `Drop` without borrowing this bus.
    #[must_use]
    pub fn sink_table(&self) -> SinkTable {
        self.sinks.clone()
    }

    /// Broadcast an event to every attached sink.
    pub fn notify(&mut self, event: Event) {
        tracing::trace!(?event, "broadcast");
        for slot in self.sinks.borrow_mut().iter_mut() {
            if let Some(sink) = slot {
                sink.borrow_mut().notify(event);
            }
        }
    }
}

impl EventSink for Vec<Event> {
    fn notify(&mut self, event: Event) {
        self.push(event);
    }
}
