//! Storage commands: sdinit, sdread.

use ember_soc::BLOCK_SIZE;
use ember_types::config::Capabilities;
use ember_types::error::{EmberError, Result};

use std::fmt::Write;

use crate::hexdump::dump_bytes;
use crate::num::parse_u32;
use crate::registry::{Command, CommandGroup, Env, RegistryBuilder};

/// Register the storage commands when a card controller is present.
pub fn register(b: &mut RegistryBuilder, caps: &Capabilities) -> Result<()> {
    if !caps.sdcard {
        return Ok(());
    }
    b.register(Box::new(SdInitCmd))?;
    b.register(Box::new(SdReadCmd))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// sdinit
// ---------------------------------------------------------------------------

struct SdInitCmd;
impl Command for SdInitCmd {
    fn name(&self) -> &str {
        "sdinit"
    }
    fn help(&self) -> &str {
        "Initialize the SD card"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Storage
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        let Some(card) = env.card.as_mut() else {
            return Err(EmberError::Hardware("SD card not available".into()));
        };
        card.init()
            .map_err(|_| EmberError::Hardware("Error during SD card initialization".into()))?;
        writeln!(env.out, "Card initialized")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// sdread
// ---------------------------------------------------------------------------

struct SdReadCmd;
impl Command for SdReadCmd {
    fn name(&self) -> &str {
        "sdread"
    }
    fn help(&self) -> &str {
        "Read a block from the SD card"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Storage
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.is_empty() {
            return Err(EmberError::Usage("sdread <block>"));
        }
        let block = parse_u32(args[0]).ok_or(EmberError::BadArgument("block"))?;

        let mut buf = [0u8; BLOCK_SIZE];
        {
            let Some(card) = env.card.as_mut() else {
                return Err(EmberError::Hardware("SD card not available".into()));
            };
            card.read_block(block, &mut buf)?;
        }
        dump_bytes(env.out, &buf, block.wrapping_mul(BLOCK_SIZE as u32))
    }
}
