//! App-level commands registered on top of the console builtins.

use ember_console::{Command, CommandGroup, Env, RegistryBuilder};
use ember_types::error::Result;

/// Register the monitor's own commands.
pub fn register_app_commands(b: &mut RegistryBuilder) -> Result<()> {
    b.register(Box::new(BootCmd))
}

// ---------------------------------------------------------------------------
// boot
// ---------------------------------------------------------------------------

struct BootCmd;
impl Command for BootCmd {
    fn name(&self) -> &str {
        "boot"
    }
    fn help(&self) -> &str {
        "Boot from the configured media"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::System
    }
    fn execute(&self, _args: &[&str], _env: &mut Env<'_>) -> Result<()> {
        // The console loop intercepts the name: re-running the fallback
        // chain needs the boot transports, which the handler environment
        // does not carry. This descriptor exists so `boot` shows up in
        // `help`.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_command_is_registered_in_system_group() {
        let mut b = RegistryBuilder::new();
        register_app_commands(&mut b).unwrap();
        let reg = b.build();
        let cmd = reg.lookup("boot").unwrap();
        assert_eq!(cmd.help(), "Boot from the configured media");
        assert!(matches!(cmd.group(), CommandGroup::System));
    }
}
