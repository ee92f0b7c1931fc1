//! Default `PrinterHook` for the CLI runner.

use rv16_core::{PrinterHook, Word};

/// Writes PRINT output to stdout and logs it at info level.
#[derive(Debug, Default)]
pub struct StdoutPrinter;

impl PrinterHook for StdoutPrinter {
    fn print(&mut self, r_a: Word, r_b: Word, mem_word: Word) {
        tracing::info!(r_a, r_b, mem_word, "print");
        println!("{r_a:#010x} {r_b:#010x} {mem_word:#010x}");
    }

    fn debug(&mut self, which: u8) {
        tracing::info!(which, "debug");
        eprintln!("debug({which})");
    }
}
