//! Bit codec, register file, decoder and executor for the rv16sim CPU.

mod codec;
mod cpu;
mod decode;
mod error;
mod regs;

pub use codec::{Fields, JmpFlags, LoadStoreFlags};
pub use cpu::Cpu;
pub use decode::{decode, Op};
pub use error::SimError;
pub use regs::RegisterFile;
