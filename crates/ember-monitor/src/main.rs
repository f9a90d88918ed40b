//! Ember monitor entry point.
//!
//! A simulated bare-metal system monitor: startup banner, SDRAM
//! initialization, boot-medium fallback, then the interactive console loop
//! (read line, tokenize, dispatch, re-prompt). The console never exits on
//! malformed input; EOF on stdin ends the session, standing in for firmware
//! that never returns.

mod commands;

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Result;

use ember_boot::{build_boot_methods, BootEnv, BootOutcome, BootSequencer};
use ember_console::{
    register_i2c_commands, register_mem_commands, register_sdram_commands,
    register_storage_commands, register_system_commands, tokenize, CommandRegistry,
    DispatchOutcome, Env, RegistryBuilder,
};
use ember_soc::{
    BlockDevice, I2cBus, NetLoader, SdramControl, SerialLoader, SimControl, SimSoc, SpiFlash,
};
use ember_types::config::MonitorConfig;

/// Printed at startup and after every completed command.
const PROMPT: &str = "\x1b[92;1member\x1b[0m> ";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = resolve_config()?;
    log::info!(
        "Starting Ember monitor ({} @ {} MHz)",
        config.cpu_name,
        config.clock_hz / 1_000_000
    );

    let mut soc = SimSoc::from_config(&config);
    let registry = build_registry(&config)?;
    log::info!("{} commands registered", registry.len());

    banner(&config);

    // Bring up the SDRAM controller before anything tries to boot from it.
    if let Some(sdram) = soc.sdram.as_mut() {
        if !sdram.init() {
            println!("init failed");
        }
        println!();
    }

    run_boot_sequence(&mut soc, &config);

    console_loop(&registry, &mut soc, &config)
}

/// Configuration precedence: CLI argument, `EMBER_CONFIG`, defaults.
fn resolve_config() -> Result<MonitorConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("EMBER_CONFIG").ok());
    match path {
        Some(p) => Ok(MonitorConfig::load(Path::new(&p))?),
        None => Ok(MonitorConfig::default()),
    }
}

fn build_registry(config: &MonitorConfig) -> Result<CommandRegistry> {
    let mut b = RegistryBuilder::new();
    register_system_commands(&mut b, &config.caps)?;
    register_mem_commands(&mut b, &config.caps)?;
    register_i2c_commands(&mut b, &config.caps)?;
    register_sdram_commands(&mut b, &config.caps)?;
    register_storage_commands(&mut b, &config.caps)?;
    commands::register_app_commands(&mut b)?;
    Ok(b.build())
}

fn banner(config: &MonitorConfig) {
    println!();
    println!(
        "\x1b[1mCPU\x1b[0m:\t\t{} @ {}MHz",
        config.cpu_name,
        config.clock_hz / 1_000_000
    );
    println!();
}

/// Run the fallback chain once. Success reports the image and proceeds;
/// exhaustion prints the fixed diagnostic and falls through to the console.
fn run_boot_sequence(soc: &mut SimSoc, config: &MonitorConfig) {
    let methods = build_boot_methods(&config.caps, &config.memory);
    let mut env = BootEnv {
        bus: &mut soc.bus,
        load_addr: config.memory.main_ram_base,
        serial: soc.serial.as_mut().map(|x| x as &mut dyn SerialLoader),
        flash: soc.flash.as_mut().map(|x| x as &mut dyn SpiFlash),
        card: soc.card.as_mut().map(|x| x as &mut dyn BlockDevice),
        net: soc.net.as_mut().map(|x| x as &mut dyn NetLoader),
    };
    match BootSequencer::new(methods).run(&mut env) {
        BootOutcome::Succeeded { label, image } => {
            println!(
                "Executing booted program at {:#010x} ({} bytes from {label})",
                image.entry, image.size
            );
        },
        BootOutcome::Exhausted => println!("No boot medium found"),
    }
}

fn console_loop(registry: &CommandRegistry, soc: &mut SimSoc, config: &MonitorConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n{PROMPT}");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        handle_line(registry, soc, config, &line?);
    }
    println!();
    log::info!("console closed");
    Ok(())
}

fn handle_line(registry: &CommandRegistry, soc: &mut SimSoc, config: &MonitorConfig, line: &str) {
    let parsed = match tokenize(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            println!("{e}");
            return;
        },
    };
    if parsed.is_empty() {
        return;
    }
    // `boot` re-runs the fallback chain; intercepted here because it needs
    // the boot transports, which the handler environment doesn't carry.
    if parsed.command == "boot" {
        run_boot_sequence(soc, config);
        return;
    }

    let mut out = String::new();
    let outcome = {
        let mut env = Env {
            out: &mut out,
            bus: &mut soc.bus,
            sys: &mut soc.sys,
            cache: &mut soc.cache,
            i2c: soc.i2c.as_mut().map(|x| x as &mut dyn I2cBus),
            sdram: soc.sdram.as_mut().map(|x| x as &mut dyn SdramControl),
            card: soc.card.as_mut().map(|x| x as &mut dyn BlockDevice),
            sim: soc.sim.as_mut().map(|x| x as &mut dyn SimControl),
        };
        registry.dispatch(&parsed, &mut env)
    };
    // Whatever the handler printed before aborting still goes out.
    print!("{out}");
    match outcome {
        DispatchOutcome::NotFound => println!("Command not found"),
        DispatchOutcome::Failed(e) => println!("{e}"),
        DispatchOutcome::Empty | DispatchOutcome::Done => {},
    }
}
