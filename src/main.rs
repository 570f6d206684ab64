// src/main.rs
use rv5pipe::demos;
use rv5pipe::pvm::loader::{FlatBinaryLoader, LoadedProgram, ProgramLoader};
use rv5pipe::{Core, CoreConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Building the accumulation demo program...");
    let program = demos::addi_chain();

    let mut bytes = Vec::with_capacity(program.len() * 4);
    for word in &program {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    let loaded: LoadedProgram = FlatBinaryLoader.load(&bytes)?;

    println!("Initializing the core...");
    let mut core = Core::new(
        loaded,
        CoreConfig {
            max_cycles: 64,
            ..CoreConfig::default()
        },
    )?;

    println!("Running...");
    let stats = core.run();

    println!("Done.");
    println!("x1 = {}", core.registers().read(1));
    println!("x2 = {}", core.registers().read(2));
    println!("x3 = {}", core.registers().read(3));

    println!("\nStats:");
    println!("  cycles: {}", stats.cycles);
    println!("  instructions completed: {}", stats.instructions_completed);
    println!("  ipc: {:.3}", stats.ipc());
    println!("  stalls: {}", stats.stalls);
    println!("  forwards: {}", stats.forwards);
    println!("  branch flushes: {}", stats.branch_flushes);

    Ok(())
}
