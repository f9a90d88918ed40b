//! Command console core.
//!
//! The console is a registry-based dispatch system: commands implement the
//! `Command` trait and are collected into an immutable table before the
//! first prompt. `tokenize` splits an input line, the registry resolves the
//! command name, and `dispatch` runs the handler against an `Env` of
//! peripheral services.

mod hexdump;
mod i2c_commands;
mod line;
mod mem_commands;
mod num;
mod registry;
mod sdram_commands;
mod storage_commands;
mod system_commands;
#[cfg(test)]
mod testutil;

/// Hexadecimal + ASCII dump used by the memory and I2C read commands.
pub use hexdump::dump_bytes;
/// Register the I2C commands (i2creset, i2cwr, i2crd, i2cscan).
pub use i2c_commands::register as register_i2c_commands;
/// Line tokenizer and its bounds.
pub use line::{tokenize, ParsedLine, MAX_LINE_LEN, MAX_PARAMS};
/// Register the memory commands (mr, mw, mc, memtest).
pub use mem_commands::register as register_mem_commands;
/// C-style unsigned numeric literal parsing.
pub use num::{parse_u32, parse_u64};
/// A single executable command.
pub use registry::Command;
/// Command category used to section help output.
pub use registry::CommandGroup;
/// Immutable command table with lookup, enumeration, and dispatch.
pub use registry::{CommandRegistry, RegistryBuilder};
/// Result of dispatching one parsed line.
pub use registry::DispatchOutcome;
/// Peripheral services and output sink passed to every handler.
pub use registry::Env;
/// Register the SDRAM commands (sdrinit, sdrsw, sdrhw, sdrrow, spdread).
pub use sdram_commands::register as register_sdram_commands;
/// Register the storage commands (sdinit, sdread).
pub use storage_commands::register as register_storage_commands;
/// Register the system/cache/misc commands (help, ident, uptime, reboot,
/// crc, cache flushes, trace, finish).
pub use system_commands::register as register_system_commands;
