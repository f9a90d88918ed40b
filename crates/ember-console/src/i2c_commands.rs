//! I2C commands: i2creset, i2cwr, i2crd, i2cscan.
//!
//! All transfers use 7-bit slave addresses and 8-bit memory addresses.

use std::fmt::Write;

use ember_types::config::Capabilities;
use ember_types::error::{EmberError, Result};

use crate::hexdump::dump_bytes;
use crate::num::parse_u32;
use crate::registry::{Command, CommandGroup, Env, RegistryBuilder};

/// Most data bytes one `i2cwr` accepts.
const MAX_WRITE_DATA: usize = 32;

/// Most bytes one `i2crd` reads.
const MAX_READ_DATA: usize = 256;

/// Register the I2C commands when the capability is present.
pub fn register(b: &mut RegistryBuilder, caps: &Capabilities) -> Result<()> {
    if !caps.i2c {
        return Ok(());
    }
    b.register(Box::new(I2cResetCmd))?;
    b.register(Box::new(I2cWrCmd))?;
    b.register(Box::new(I2cRdCmd))?;
    b.register(Box::new(I2cScanCmd))?;
    Ok(())
}

fn parse_byte(s: &str, index: usize) -> Result<u8> {
    let v = parse_u32(s).ok_or(EmberError::BadParameter(index))?;
    u8::try_from(v).map_err(|_| EmberError::BadParameter(index))
}

// ---------------------------------------------------------------------------
// i2creset
// ---------------------------------------------------------------------------

struct I2cResetCmd;
impl Command for I2cResetCmd {
    fn name(&self) -> &str {
        "i2creset"
    }
    fn help(&self) -> &str {
        "Reset I2C line state"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::I2c
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        let Some(i2c) = env.i2c.as_mut() else {
            return Err(EmberError::Hardware("I2C not available".into()));
        };
        i2c.reset();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// i2cwr
// ---------------------------------------------------------------------------

struct I2cWrCmd;
impl Command for I2cWrCmd {
    fn name(&self) -> &str {
        "i2cwr"
    }
    fn help(&self) -> &str {
        "Write over I2C"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::I2c
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.len() < 2 {
            return Err(EmberError::Usage("i2cwr <slaveaddr7bit> <addr> [<data>, ...]"));
        }
        if args.len() - 2 > MAX_WRITE_DATA {
            return Err(EmberError::TooManyParams(MAX_WRITE_DATA));
        }

        // Validate everything before the first bus cycle: rejection is
        // wholly pre-transaction, there are no partial writes.
        let mut bytes = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            bytes.push(parse_byte(arg, i)?);
        }
        let (slave, addr, data) = (bytes[0], bytes[1], &bytes[2..]);

        let Some(i2c) = env.i2c.as_mut() else {
            return Err(EmberError::Hardware("I2C not available".into()));
        };
        i2c.write(slave, addr, data)
            .map_err(|_| EmberError::Hardware("Error during I2C write".into()))
    }
}

// ---------------------------------------------------------------------------
// i2crd
// ---------------------------------------------------------------------------

struct I2cRdCmd;
impl Command for I2cRdCmd {
    fn name(&self) -> &str {
        "i2crd"
    }
    fn help(&self) -> &str {
        "Read over I2C"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::I2c
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.len() < 3 {
            return Err(EmberError::Usage(
                "i2crd <slaveaddr7bit> <addr> <len> [<send_stop>]",
            ));
        }
        let slave = parse_u32(args[0])
            .filter(|&v| v <= 0x7f)
            .ok_or(EmberError::BadArgument("slave address"))? as u8;
        let addr = parse_u32(args[1])
            .filter(|&v| v <= 0xff)
            .ok_or(EmberError::BadArgument("memory address"))? as u8;
        let len = parse_u32(args[2]).ok_or(EmberError::BadArgument("data length"))? as usize;
        if len > MAX_READ_DATA {
            return Err(EmberError::Hardware(format!(
                "Max data count is {MAX_READ_DATA}"
            )));
        }
        let send_stop = match args.get(3) {
            Some(s) => parse_u32(s).ok_or(EmberError::BadArgument("send_stop value"))? != 0,
            None => true,
        };

        let mut buf = vec![0u8; len];
        {
            let Some(i2c) = env.i2c.as_mut() else {
                return Err(EmberError::Hardware("I2C not available".into()));
            };
            i2c.read(slave, addr, &mut buf, send_stop)
                .map_err(|_| EmberError::Hardware("Error during I2C read".into()))?;
        }
        dump_bytes(env.out, &buf, u32::from(addr))
    }
}

// ---------------------------------------------------------------------------
// i2cscan
// ---------------------------------------------------------------------------

struct I2cScanCmd;
impl Command for I2cScanCmd {
    fn name(&self) -> &str {
        "i2cscan"
    }
    fn help(&self) -> &str {
        "Scan for I2C slaves"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::I2c
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        let Some(i2c) = env.i2c.as_mut() else {
            return Err(EmberError::Hardware("I2C not available".into()));
        };
        writeln!(env.out, "      0 1 2 3 4 5 6 7 8 9 a b c d e f")?;
        for row in 0..8u8 {
            write!(env.out, "{:#04x}  ", row << 4)?;
            for col in 0..16u8 {
                let mark = if i2c.probe(row << 4 | col) { "+ " } else { ". " };
                write!(env.out, "{mark}")?;
            }
            writeln!(env.out)?;
        }
        Ok(())
    }
}
