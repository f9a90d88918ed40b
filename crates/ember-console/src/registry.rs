//! Command trait, registry, and dispatch logic.
//!
//! Every module contributes commands to a `RegistryBuilder`, which freezes
//! into an immutable `CommandRegistry` before the first prompt: the whole
//! table is known before any input is read. Lookup is a case-sensitive
//! exact match; enumeration preserves registration order.

use std::collections::HashMap;
use std::fmt::{self, Write};

use ember_soc::{
    BlockDevice, CacheControl, I2cBus, MemoryBus, SdramControl, SimControl, SysControl,
};
use ember_types::error::{EmberError, Result};

use crate::line::ParsedLine;

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Command category used to section `help` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandGroup {
    System,
    Memory,
    Cache,
    I2c,
    Storage,
    Misc,
}

impl CommandGroup {
    /// All groups, in the order `help` prints them.
    pub const ALL: [CommandGroup; 6] = [
        CommandGroup::System,
        CommandGroup::Memory,
        CommandGroup::Cache,
        CommandGroup::I2c,
        CommandGroup::Storage,
        CommandGroup::Misc,
    ];

    /// Section header shown in `help`.
    pub fn title(self) -> &'static str {
        match self {
            CommandGroup::System => "System",
            CommandGroup::Memory => "Memory",
            CommandGroup::Cache => "Cache",
            CommandGroup::I2c => "I2C",
            CommandGroup::Storage => "Storage",
            CommandGroup::Misc => "Misc",
        }
    }
}

// ---------------------------------------------------------------------------
// Handler environment
// ---------------------------------------------------------------------------

/// Peripheral services and output sink passed to every handler.
///
/// Optional peripherals are `None` exactly when the capability is absent;
/// commands depending on one are then not registered at all, so a handler
/// normally finds its services present.
pub struct Env<'a> {
    /// Console output. Handlers print here, never to stdout directly.
    pub out: &'a mut dyn fmt::Write,
    pub bus: &'a mut dyn MemoryBus,
    pub sys: &'a mut dyn SysControl,
    pub cache: &'a mut dyn CacheControl,
    pub i2c: Option<&'a mut dyn I2cBus>,
    pub sdram: Option<&'a mut dyn SdramControl>,
    pub card: Option<&'a mut dyn BlockDevice>,
    pub sim: Option<&'a mut dyn SimControl>,
}

// ---------------------------------------------------------------------------
// Command trait
// ---------------------------------------------------------------------------

/// A single executable command.
pub trait Command {
    /// The command name (what the user types). Unique, case-sensitive.
    fn name(&self) -> &str;

    /// One-line help text; empty renders as `-` in the listing.
    fn help(&self) -> &str {
        ""
    }

    /// Category for grouping in `help` output.
    fn group(&self) -> CommandGroup;

    /// Execute with the given arguments. Handlers validate their own arity
    /// and argument syntax; all side effects happen here.
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Collects command descriptors before the console starts.
#[derive(Default)]
pub struct RegistryBuilder {
    commands: Vec<Box<dyn Command>>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. Duplicate names are a construction-time error: the
    /// table invariant is one descriptor per name.
    pub fn register(&mut self, cmd: Box<dyn Command>) -> Result<()> {
        let name = cmd.name().to_string();
        if self.index.contains_key(&name) {
            return Err(EmberError::Config(format!("duplicate command name: {name}")));
        }
        self.index.insert(name, self.commands.len());
        self.commands.push(cmd);
        Ok(())
    }

    /// Freeze the table. Nothing can be added or removed afterward.
    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            commands: self.commands,
            index: self.index,
        }
    }
}

/// Immutable command table with lookup, enumeration, and dispatch.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    index: HashMap<String, usize>,
}

/// Result of dispatching one parsed line.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Empty command name; the loop just re-prompts.
    Empty,
    /// No descriptor matched; the caller prints the fixed diagnostic.
    NotFound,
    /// Handler ran to completion.
    Done,
    /// Handler aborted; the payload renders the printed diagnostic.
    Failed(EmberError),
}

impl CommandRegistry {
    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&dyn Command> {
        self.index.get(name).map(|&i| self.commands[i].as_ref())
    }

    /// All commands of `group`, in registration order.
    pub fn enumerate(&self, group: CommandGroup) -> impl Iterator<Item = &dyn Command> {
        self.commands
            .iter()
            .map(|c| c.as_ref())
            .filter(move |c| c.group() == group)
    }

    /// All commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Render the grouped `help` listing: non-empty groups only, names
    /// padded to 16 columns, `-` for commands without help text.
    pub fn render_help(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Ember monitor, available commands:");
        for group in CommandGroup::ALL {
            let mut header_done = false;
            for cmd in self.enumerate(group) {
                if !header_done {
                    let _ = writeln!(out);
                    let _ = writeln!(out, "{}:", group.title());
                    header_done = true;
                }
                let help = if cmd.help().is_empty() { "-" } else { cmd.help() };
                let _ = writeln!(out, "{:<16} - {}", cmd.name(), help);
            }
        }
        out
    }

    /// Resolve and run one parsed line.
    ///
    /// The dispatcher's only job is the lookup; side effects happen inside
    /// the invoked handler. `help` is intercepted here because it needs
    /// the table itself.
    pub fn dispatch(&self, parsed: &ParsedLine, env: &mut Env<'_>) -> DispatchOutcome {
        if parsed.is_empty() {
            return DispatchOutcome::Empty;
        }
        if parsed.command == "help" {
            return match env.out.write_str(&self.render_help()) {
                Ok(()) => DispatchOutcome::Done,
                Err(e) => DispatchOutcome::Failed(e.into()),
            };
        }
        match self.lookup(&parsed.command) {
            Some(cmd) => match cmd.execute(&parsed.args(), env) {
                Ok(()) => DispatchOutcome::Done,
                Err(e) => DispatchOutcome::Failed(e),
            },
            None => {
                log::debug!("command not found: {}", parsed.command);
                DispatchOutcome::NotFound
            },
        }
    }
}
