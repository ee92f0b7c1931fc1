//! Decode a fetched word into a tagged `Op` variant.
//!
//! A single decode function plus an executor that matches on the result
//! keeps the whole opcode table in one auditable place instead of a
//! dispatch-table-per-instruction-class design.

use crate::codec::{self, Fields, JmpFlags, LoadStoreFlags};
use rv16_core::{Address, Word};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    Halt,
    Add { a: u8, b: u8, d: u8 },
    Sub { a: u8, b: u8, d: u8 },
    Lshift { a: u8, b: u8, d: u8 },
    Rshift { a: u8, b: u8, d: u8 },
    Comp { a: u8, b: u8, d: u8 },
    CompGrt { a: u8, b: u8, d: u8 },
    CompLst { a: u8, b: u8, d: u8 },
    Load {
        dest: u8,
        addr: Address,
        flags: LoadStoreFlags,
    },
    Store {
        src: u8,
        addr: Address,
        flags: LoadStoreFlags,
    },
    Jmp {
        cond: u8,
        flags: JmpFlags,
        displacement: Address,
    },
    Print { a: u8, b: u8, addr: Address },
}

/// Decode a raw instruction word, or `None` for an unrecognised opcode.
pub fn decode(word: Word) -> Option<Op> {
    let f = Fields::unpack(word);
    Some(match f.opcode {
        codec::OP_NOP => Op::Nop,
        codec::OP_HALT => Op::Halt,
        codec::OP_ADD => Op::Add { a: f.arg1, b: f.arg2, d: f.data5() },
        codec::OP_SUB => Op::Sub { a: f.arg1, b: f.arg2, d: f.data5() },
        codec::OP_LSHIFT => Op::Lshift { a: f.arg1, b: f.arg2, d: f.data5() },
        codec::OP_RSHIFT => Op::Rshift { a: f.arg1, b: f.arg2, d: f.data5() },
        codec::OP_COMP => Op::Comp { a: f.arg1, b: f.arg2, d: f.data5() },
        codec::OP_COMPGRT => Op::CompGrt { a: f.arg1, b: f.arg2, d: f.data5() },
        codec::OP_COMPLST => Op::CompLst { a: f.arg1, b: f.arg2, d: f.data5() },
        codec::OP_LOAD => Op::Load {
            dest: f.arg1,
            addr: f.data,
            flags: LoadStoreFlags::from_arg2(f.arg2),
        },
        codec::OP_STORE => Op::Store {
            src: f.arg1,
            addr: f.data,
            flags: LoadStoreFlags::from_arg2(f.arg2),
        },
        codec::OP_JMP => Op::Jmp {
            cond: f.arg1,
            flags: JmpFlags::from_arg2(f.arg2),
            displacement: f.data,
        },
        codec::OP_PRINT => Op::Print { a: f.arg1, b: f.arg2, addr: f.data },
        _ => return None,
    })
}
