//! Error kinds raised while running a program.
//!
//! `BadRegisterIndex` and `AssemblerError` from the wider error taxonomy
//! are deliberately absent here: register/status indices are masked to 5
//! bits rather than validated (see [`crate::regs::RegisterFile`]), and the
//! assembler is an external collaborator with no representation in this
//! crate.

use rv16_core::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown opcode {opcode:#04x} at pc={pc:#06x}")]
    BadInstruction { opcode: u8, pc: Address },

    #[error("failed to load memory image: {0}")]
    Io(#[from] std::io::Error),
}
