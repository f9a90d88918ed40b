//! SDRAM controller commands: sdrinit, sdrsw, sdrhw, sdrrow, spdread.
//!
//! These live in the Memory group; `spdread` additionally needs the I2C
//! master to reach the SPD EEPROM.

use std::fmt::Write;

use ember_types::config::Capabilities;
use ember_types::error::{EmberError, Result};

use crate::hexdump::dump_bytes;
use crate::num::parse_u32;
use crate::registry::{Command, CommandGroup, Env, RegistryBuilder};

/// SPD EEPROMs answer at 0b1010_xxx; the low bits come from the A0-A2 pins.
const SPD_ADDR_PREAMBLE: u8 = 0b1010;

/// Register the SDRAM commands when the capability is present.
pub fn register(b: &mut RegistryBuilder, caps: &Capabilities) -> Result<()> {
    if !caps.sdram {
        return Ok(());
    }
    b.register(Box::new(SdrInitCmd))?;
    b.register(Box::new(SdrSwCmd))?;
    b.register(Box::new(SdrHwCmd))?;
    b.register(Box::new(SdrRowCmd))?;
    if caps.i2c {
        b.register(Box::new(SpdReadCmd))?;
    }
    Ok(())
}

fn sdram<'e, 'a>(env: &'e mut Env<'a>) -> Result<&'e mut &'a mut dyn ember_soc::SdramControl> {
    env.sdram
        .as_mut()
        .ok_or_else(|| EmberError::Hardware("SDRAM controller not available".into()))
}

// ---------------------------------------------------------------------------
// sdrinit
// ---------------------------------------------------------------------------

struct SdrInitCmd;
impl Command for SdrInitCmd {
    fn name(&self) -> &str {
        "sdrinit"
    }
    fn help(&self) -> &str {
        "Start SDRAM initialisation"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if !sdram(env)?.init() {
            return Err(EmberError::Hardware("SDRAM init failed".into()));
        }
        writeln!(env.out, "SDRAM initialized")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// sdrsw / sdrhw
// ---------------------------------------------------------------------------

struct SdrSwCmd;
impl Command for SdrSwCmd {
    fn name(&self) -> &str {
        "sdrsw"
    }
    fn help(&self) -> &str {
        "Gives SDRAM control to SW"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        sdram(env)?.software_control();
        writeln!(env.out, "SDRAM now under software control")?;
        Ok(())
    }
}

struct SdrHwCmd;
impl Command for SdrHwCmd {
    fn name(&self) -> &str {
        "sdrhw"
    }
    fn help(&self) -> &str {
        "Gives SDRAM control to HW"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        sdram(env)?.hardware_control();
        writeln!(env.out, "SDRAM now under hardware control")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// sdrrow
// ---------------------------------------------------------------------------

struct SdrRowCmd;
impl Command for SdrRowCmd {
    fn name(&self) -> &str {
        "sdrrow"
    }
    fn help(&self) -> &str {
        "Precharge/Activate row"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        match args.first() {
            None => {
                sdram(env)?.precharge_all();
                writeln!(env.out, "Precharged")?;
            },
            Some(s) => {
                let row = parse_u32(s).ok_or(EmberError::BadArgument("row"))?;
                sdram(env)?.activate_row(row);
                writeln!(env.out, "Activated row {row}")?;
            },
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// spdread
// ---------------------------------------------------------------------------

struct SpdReadCmd;
impl Command for SpdReadCmd {
    fn name(&self) -> &str {
        "spdread"
    }
    fn help(&self) -> &str {
        "Read SPD EEPROM"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.is_empty() {
            return Err(EmberError::Usage("spdread <spdaddr> [<send_stop>]"));
        }
        let spdaddr = parse_u32(args[0]).ok_or(EmberError::BadArgument("address"))?;
        if spdaddr > 0b111 {
            return Err(EmberError::Hardware(
                "SPD EEPROM max address is 0b111 (defined by A0, A1, A2 pins)".into(),
            ));
        }
        let send_stop = match args.get(1) {
            Some(s) => parse_u32(s).ok_or(EmberError::BadArgument("send_stop value"))? != 0,
            None => true,
        };
        let slave = SPD_ADDR_PREAMBLE << 3 | spdaddr as u8;

        let mut buf = [0u8; 256];
        {
            let Some(i2c) = env.i2c.as_mut() else {
                return Err(EmberError::Hardware("I2C not available".into()));
            };
            i2c.read(slave, 0, &mut buf, send_stop)
                .map_err(|_| EmberError::Hardware("Error when reading SPD EEPROM".into()))?;
        }
        dump_bytes(env.out, &buf, 0)
    }
}
