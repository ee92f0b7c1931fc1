//! Shared traits and types for the rv16sim microprocessor simulator.
//!
//! Every crate in the workspace builds on the same `Word`/`Address`
//! aliases and the same observer plumbing, so field widths and event
//! shapes are defined exactly once.

mod bus;
mod event;
mod observable;
mod printer;

pub use bus::Bus;
pub use event::{Event, EventBus, EventSink, SinkTable};
pub use observable::{Observable, Value};
pub use printer::PrinterHook;

/// A 32-bit data word. All arithmetic on it wraps modulo 2^32.
pub type Word = u32;

/// A 16-bit memory address. The address space has exactly 2^16 cells.
pub type Address = u16;
