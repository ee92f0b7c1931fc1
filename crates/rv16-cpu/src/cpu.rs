//! The fetch/decode/execute loop.

use crate::codec::{Fields, LoadStoreFlags};
use crate::decode::{self, Op};
use crate::error::SimError;
use crate::regs::RegisterFile;
use rv16_core::{Address, Bus, Event, EventBus, Observable, PrinterHook, Value, Word};

/// Splice a 16-bit half into (or replace) a 32-bit value per the
/// LOAD/STORE flag register.
///
/// `source` is the 32-bit value the half is drawn from: for a
/// non-immediate access this is the real register/memory word; for an
/// immediate access the instruction carries only a 16-bit literal, so the
/// caller duplicates it into both halves before calling this function,
/// making `FROM_SIG` a no-op in that case (there is only one half to
/// draw from either way).
fn merge_half(current: Word, flags: LoadStoreFlags, source: Word) -> Word {
    if !flags.hlf {
        return source;
    }
    let half: u16 = if flags.from_sig {
        (source >> 16) as u16
    } else {
        (source & 0xFFFF) as u16
    };
    let base = if flags.ow { 0 } else { current };
    if flags.to_sig {
        (base & 0x0000_FFFF) | ((half as Word) << 16)
    } else {
        (base & 0xFFFF_0000) | (half as Word)
    }
}

/// The 32-bit view of an immediate LOAD/STORE's source: the instruction's
/// `data` field duplicated into both halves, so extracting either half
/// yields the literal back regardless of `FROM_SIG`.
fn immediate_source(data: Address) -> Word {
    let d = Word::from(data);
    (d << 16) | d
}

#[derive(Debug, Default)]
pub struct Cpu {
    pub regs: RegisterFile,
}

impl Cpu {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the documented power-on state: all registers and status
    /// bits zero, `PC = 0`, running. Does not touch memory or cache —
    /// callers reset those separately (e.g. `Memory::reset_cache`), since
    /// RAM as loaded is part of the documented reset state, not cleared.
    pub fn reset(&mut self) {
        self.regs = RegisterFile::new();
    }

    /// Run until HALT, a fatal error, or `max_instructions` is reached
    /// (if given). Returns the number of instructions executed.
    pub fn run<B: Bus>(
        &mut self,
        mem: &mut B,
        events: &mut EventBus,
        printer: &mut dyn PrinterHook,
        max_instructions: Option<u64>,
    ) -> Result<u64, SimError> {
        let mut count = 0u64;
        while self.regs.running {
            if max_instructions.is_some_and(|max| count >= max) {
                break;
            }
            self.step(mem, events, printer)?;
            count += 1;
        }
        Ok(count)
    }

    /// Fetch, decode and execute exactly one instruction, advancing `PC`.
    #[tracing::instrument(skip(self, mem, events, printer), level = "trace")]
    pub fn step<B: Bus>(
        &mut self,
        mem: &mut B,
        events: &mut EventBus,
        printer: &mut dyn PrinterHook,
    ) -> Result<(), SimError> {
        let pc = self.regs.pc;
        let word = mem.fetch_word(pc);
        events.notify(Event::Fetch(pc));

        let op = decode::decode(word).ok_or_else(|| {
            let opcode = Fields::unpack(word).opcode;
            tracing::error!(opcode, pc, "unknown opcode");
            SimError::BadInstruction { opcode, pc }
        })?;
        tracing::trace!(?op, pc, "decoded");

        let next_pc = self.next_pc(pc, op);
        self.execute(op, word, mem, events, printer);
        self.regs.pc = next_pc;
        Ok(())
    }

    /// `PC`'s value after this instruction, computed from the original
    /// `PC` before dispatch — JMP's displacement is relative to the
    /// address it was fetched from, not a pre-incremented value.
    fn next_pc(&self, pc: Address, op: Op) -> Address {
        if let Op::Jmp { cond, flags, displacement } = op {
            let condition_met = self.regs.read_s(cond) == flags.on_high;
            if condition_met {
                return if flags.dec {
                    pc.wrapping_sub(displacement)
                } else {
                    pc.wrapping_add(displacement)
                };
            }
        }
        pc.wrapping_add(1)
    }

    fn execute<B: Bus>(
        &mut self,
        op: Op,
        word: Word,
        mem: &mut B,
        events: &mut EventBus,
        printer: &mut dyn PrinterHook,
    ) {
        let _ = word;
        match op {
            Op::Nop => {}
            Op::Halt => self.regs.running = false,
            Op::Add { a, b, d } => {
                let value = self.regs.read_r(a).wrapping_add(self.regs.read_r(b));
                self.regs.write_r(d, value);
            }
            Op::Sub { a, b, d } => {
                let value = self.regs.read_r(a).wrapping_sub(self.regs.read_r(b));
                self.regs.write_r(d, value);
            }
            Op::Lshift { a, b, d } => {
                let value = self.regs.read_r(a).wrapping_shl(self.regs.read_r(b));
                self.regs.write_r(d, value);
            }
            Op::Rshift { a, b, d } => {
                let value = self.regs.read_r(a).wrapping_shr(self.regs.read_r(b));
                self.regs.write_r(d, value);
            }
            Op::Comp { a, b, d } => {
                let value = self.regs.read_r(a) == self.regs.read_r(b);
                self.regs.write_s(d, value);
            }
            Op::CompGrt { a, b, d } => {
                let value = self.regs.read_r(a) > self.regs.read_r(b);
                self.regs.write_s(d, value);
            }
            Op::CompLst { a, b, d } => {
                let value = self.regs.read_r(a) < self.regs.read_r(b);
                self.regs.write_s(d, value);
            }
            Op::Load { dest, addr, flags } => {
                let source = if flags.im {
                    immediate_source(addr)
                } else {
                    mem.load_word(addr, events)
                };
                let current = self.regs.read_r(dest);
                self.regs.write_r(dest, merge_half(current, flags, source));
            }
            Op::Store { src, addr, flags } => {
                let source = if flags.im {
                    immediate_source(addr)
                } else {
                    self.regs.read_r(src)
                };
                let current = mem.peek_word(addr);
                let merged = merge_half(current, flags, source);
                mem.store_word(addr, merged, events);
            }
            Op::Jmp { .. } => {
                // PC was already set by `next_pc` before this ran.
            }
            Op::Print { a, b, addr } => {
                let mem_word = mem.peek_word(addr);
                printer.print(self.regs.read_r(a), self.regs.read_r(b), mem_word);
            }
        }
    }
}

impl Observable for Cpu {
    fn query(&self, path: &str) -> Option<Value> {
        self.regs.query(path)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        self.regs.query_paths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{self, Fields};
    use rv16_core::Bus;

    /// A bare-RAM `Bus` with no cache, for exercising the executor in
    /// isolation from `rv16-mem`'s cache timing.
    struct FlatBus {
        ram: Vec<Word>,
    }

    impl FlatBus {
        fn new() -> Self {
            Self { ram: vec![0; 1 << 16] }
        }
    }

    impl Bus for FlatBus {
        fn fetch_word(&mut self, address: Address) -> Word {
            self.ram[address as usize]
        }
        fn load_word(&mut self, address: Address, _events: &mut EventBus) -> Word {
            self.ram[address as usize]
        }
        fn store_word(&mut self, address: Address, value: Word, _events: &mut EventBus) {
            self.ram[address as usize] = value;
        }
        fn peek_word(&self, address: Address) -> Word {
            self.ram[address as usize]
        }
    }

    struct NullPrinter;
    impl PrinterHook for NullPrinter {
        fn print(&mut self, _r_a: Word, _r_b: Word, _mem_word: Word) {}
    }

    fn word(opcode: u8, arg1: u8, arg2: u8, data: u16) -> Word {
        Fields { opcode, arg1, arg2, data }.pack()
    }

    #[test]
    fn add_r2_r3_into_r4() {
        let mut cpu = Cpu::new();
        cpu.regs.write_r(2, 5);
        cpu.regs.write_r(3, 7);
        let mut mem = FlatBus::new();
        mem.ram[0] = word(codec::OP_ADD, 2, 3, 4);
        let mut events = EventBus::new();
        let mut printer = NullPrinter;
        cpu.step(&mut mem, &mut events, &mut printer).unwrap();
        assert_eq!(cpu.regs.read_r(4), 12);
        assert_eq!(cpu.regs.pc, 1);
    }

    #[test]
    fn immediate_load_splices_upper_half_of_instruction() {
        let mut cpu = Cpu::new();
        let flags = 0b1_1011u8; // IM=1, OW=1, TO_SIG=0, FROM_SIG=1, HLF=1
        let mut mem = FlatBus::new();
        mem.ram[0] = word(codec::OP_LOAD, 2, flags, 0xABCD);
        let mut events = EventBus::new();
        let mut printer = NullPrinter;
        cpu.step(&mut mem, &mut events, &mut printer).unwrap();
        assert_eq!(cpu.regs.read_r(2), 0x0000_ABCD);
    }

    #[test]
    fn self_modifying_store_patches_low_half_of_target() {
        let mut cpu = Cpu::new();
        let flags = 0b1_0001u8; // IM=1, HLF=1, FROM_SIG=0, TO_SIG=0, OW=0
        let mut mem = FlatBus::new();
        mem.ram[0] = word(codec::OP_STORE, 5, flags, 0x0002);
        mem.ram[2] = 0xFFFF_0000;
        let mut events = EventBus::new();
        let mut printer = NullPrinter;
        cpu.step(&mut mem, &mut events, &mut printer).unwrap();
        assert_eq!(mem.peek_word(2), 0xFFFF_0002);
    }

    #[test]
    fn jmp_displacement_is_relative_to_pre_increment_pc() {
        let mut cpu = Cpu::new();
        cpu.regs.pc = 20;
        cpu.regs.write_s(3, true);
        let mut mem = FlatBus::new();
        // arg2 bit0 = ON_HIGH, bit1 = DEC
        mem.ram[20] = word(codec::OP_JMP, 3, 0b011, 5);
        let mut events = EventBus::new();
        let mut printer = NullPrinter;
        cpu.step(&mut mem, &mut events, &mut printer).unwrap();
        assert_eq!(cpu.regs.pc, 15);
    }

    #[test]
    fn jmp_falls_through_when_condition_not_met() {
        let mut cpu = Cpu::new();
        cpu.regs.pc = 20;
        cpu.regs.write_s(3, false);
        let mut mem = FlatBus::new();
        mem.ram[20] = word(codec::OP_JMP, 3, 0b011, 5);
        let mut events = EventBus::new();
        let mut printer = NullPrinter;
        cpu.step(&mut mem, &mut events, &mut printer).unwrap();
        assert_eq!(cpu.regs.pc, 21);
    }

    #[test]
    fn unknown_opcode_is_fatal() {
        let mut cpu = Cpu::new();
        let mut mem = FlatBus::new();
        mem.ram[0] = word(0b111110, 0, 0, 0);
        let mut events = EventBus::new();
        let mut printer = NullPrinter;
        let err = cpu.step(&mut mem, &mut events, &mut printer).unwrap_err();
        assert!(matches!(err, SimError::BadInstruction { opcode: 0b111110, pc: 0 }));
    }

    #[test]
    fn reset_clears_registers_and_pc_but_keeps_running() {
        let mut cpu = Cpu::new();
        cpu.regs.write_r(4, 99);
        cpu.regs.pc = 10;
        cpu.regs.running = false;
        cpu.reset();
        assert_eq!(cpu.regs.read_r(4), 0);
        assert_eq!(cpu.regs.pc, 0);
        assert!(cpu.regs.running);
    }

    #[test]
    fn compare_opcodes_set_status_bits_unsigned() {
        let mut cpu = Cpu::new();
        cpu.regs.write_r(2, 3);
        cpu.regs.write_r(3, 0xFFFF_FFFF); // unsigned: larger than 3
        let mut mem = FlatBus::new();
        mem.ram[0] = word(codec::OP_COMPGRT, 3, 2, 0);
        mem.ram[1] = word(codec::OP_COMPLST, 2, 3, 1);
        mem.ram[2] = word(codec::OP_COMP, 2, 2, 2);
        let mut events = EventBus::new();
        let mut printer = NullPrinter;
        cpu.step(&mut mem, &mut events, &mut printer).unwrap();
        cpu.step(&mut mem, &mut events, &mut printer).unwrap();
        cpu.step(&mut mem, &mut events, &mut printer).unwrap();
        assert!(cpu.regs.read_s(0), "0xFFFFFFFF > 3 unsigned");
        assert!(cpu.regs.read_s(1), "3 < 0xFFFFFFFF unsigned");
        assert!(cpu.regs.read_s(2), "r2 == r2");
    }

    #[test]
    fn halt_stops_the_run_loop() {
        let mut cpu = Cpu::new();
        let mut mem = FlatBus::new();
        mem.ram[0] = word(codec::OP_NOP, 0, 0, 0);
        mem.ram[1] = word(codec::OP_HALT, 0, 0, 0);
        let mut events = EventBus::new();
        let mut printer = NullPrinter;
        let count = cpu.run(&mut mem, &mut events, &mut printer, None).unwrap();
        assert_eq!(count, 2);
        assert!(!cpu.regs.running);
    }
}
