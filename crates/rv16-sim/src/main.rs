//! CLI runner: load a memory image, run the CPU to completion (or an
//! instruction ceiling), and print the cost report.

mod loader;
mod printer;

use printer::StdoutPrinter;
use rv16_core::EventBus;
use rv16_cost::CostTracker;
use rv16_cpu::{Cpu, SimError};
use rv16_mem::Memory;
use std::path::PathBuf;
use std::process::ExitCode;

struct Args {
    image_path: PathBuf,
    max_instructions: Option<u64>,
}

fn parse_args() -> Result<Args, String> {
    let mut image_path = None;
    let mut max_instructions = None;
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--max-instructions" => {
                let value = iter
                    .next()
                    .ok_or("--max-instructions requires a value")?;
                max_instructions = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("invalid --max-instructions value: {value}"))?,
                );
            }
            other if image_path.is_none() => image_path = Some(PathBuf::from(other)),
            other => return Err(format!("unexpected argument: {other}")),
        }
    }
    Ok(Args {
        image_path: image_path.ok_or("usage: rv16-sim <image.bin> [--max-instructions N]")?,
        max_instructions,
    })
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    let words = loader::read_image(&args.image_path)
        .map_err(|e| SimError::Io(e).to_string())?;

    let mut cpu = Cpu::new();
    let mut mem = Memory::new();
    mem.load_image(&words);
    let mut events = EventBus::new();
    let (tracker, attachment) = CostTracker::attach(&mut events);
    let mut printer = StdoutPrinter;

    let result = cpu.run(&mut mem, &mut events, &mut printer, args.max_instructions);
    attachment.detach();

    match result {
        Ok(count) => {
            let report = tracker.report();
            tracing::info!(
                instructions = count,
                total_ns = report.total_ns,
                cache_locations_used = report.cache_locations_used,
                ram_locations_used = report.ram_locations_used,
                "run complete"
            );
            println!("instructions executed: {count}");
            println!("total_ns: {}", report.total_ns);
            println!("cache_locations_used: {}", report.cache_locations_used);
            println!("ram_locations_used: {}", report.ram_locations_used);
            Ok(())
        }
        Err(SimError::BadInstruction { opcode, pc }) => {
            Err(format!("bad instruction {opcode:#04x} at pc={pc:#06x}"))
        }
        Err(SimError::Io(e)) => Err(e.to_string()),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
