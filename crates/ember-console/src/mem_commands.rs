//! Memory commands: mr, mw, mc, memtest.

use std::fmt::Write;

use ember_types::config::Capabilities;
use ember_types::error::{EmberError, Result};

use crate::hexdump::dump_bytes;
use crate::num::parse_u32;
use crate::registry::{Command, CommandGroup, Env, RegistryBuilder};

/// Register the memory commands. All of them ride the memory bus, which is
/// always present, so `caps` currently gates nothing here.
pub fn register(b: &mut RegistryBuilder, _caps: &Capabilities) -> Result<()> {
    b.register(Box::new(MrCmd))?;
    b.register(Box::new(MwCmd))?;
    b.register(Box::new(McCmd))?;
    b.register(Box::new(MemtestCmd))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// mr
// ---------------------------------------------------------------------------

struct MrCmd;
impl Command for MrCmd {
    fn name(&self) -> &str {
        "mr"
    }
    fn help(&self) -> &str {
        "Read address space"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.is_empty() {
            return Err(EmberError::Usage("mr <address> [length]"));
        }
        let addr = parse_u32(args[0]).ok_or(EmberError::BadArgument("address"))?;
        let length = match args.get(1) {
            Some(s) => parse_u32(s).ok_or(EmberError::BadArgument("length"))?,
            None => 4,
        };

        // Collect row by row so a bus fault aborts before any output.
        let mut data = Vec::new();
        let mut buf = [0u8; 16];
        let mut cursor = addr;
        let mut remaining = length as usize;
        while remaining > 0 {
            let n = remaining.min(buf.len());
            env.bus.read_bytes(cursor, &mut buf[..n])?;
            data.extend_from_slice(&buf[..n]);
            cursor = cursor.wrapping_add(n as u32);
            remaining -= n;
        }
        dump_bytes(env.out, &data, addr)
    }
}

// ---------------------------------------------------------------------------
// mw
// ---------------------------------------------------------------------------

struct MwCmd;
impl Command for MwCmd {
    fn name(&self) -> &str {
        "mw"
    }
    fn help(&self) -> &str {
        "Write address space"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.len() < 2 {
            return Err(EmberError::Usage("mw <address> <value> [count]"));
        }
        let addr = parse_u32(args[0]).ok_or(EmberError::BadArgument("address"))?;
        let value = parse_u32(args[1]).ok_or(EmberError::BadArgument("value"))?;
        let count = match args.get(2) {
            Some(s) => parse_u32(s).ok_or(EmberError::BadArgument("count"))?,
            None => 1,
        };
        for i in 0..count {
            env.bus.write_u32(addr.wrapping_add(4 * i), value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// mc
// ---------------------------------------------------------------------------

struct McCmd;
impl Command for McCmd {
    fn name(&self) -> &str {
        "mc"
    }
    fn help(&self) -> &str {
        "Copy address space"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.len() < 2 {
            return Err(EmberError::Usage("mc <dst> <src> [count]"));
        }
        let dst = parse_u32(args[0]).ok_or(EmberError::BadArgument("destination address"))?;
        let src = parse_u32(args[1]).ok_or(EmberError::BadArgument("source address"))?;
        let count = match args.get(2) {
            Some(s) => parse_u32(s).ok_or(EmberError::BadArgument("count"))?,
            None => 1,
        };
        for i in 0..count {
            let word = env.bus.read_u32(src.wrapping_add(4 * i))?;
            env.bus.write_u32(dst.wrapping_add(4 * i), word)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// memtest
// ---------------------------------------------------------------------------

/// Default span exercised when no size is given.
const MEMTEST_DEFAULT_SIZE: u32 = 0x1000;

struct MemtestCmd;
impl Command for MemtestCmd {
    fn name(&self) -> &str {
        "memtest"
    }
    fn help(&self) -> &str {
        "Run a memory test"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Memory
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.is_empty() {
            return Err(EmberError::Usage("memtest <address> [size]"));
        }
        let addr = parse_u32(args[0]).ok_or(EmberError::BadArgument("address"))?;
        let size = match args.get(1) {
            Some(s) => parse_u32(s).ok_or(EmberError::BadArgument("size"))?,
            None => MEMTEST_DEFAULT_SIZE,
        };

        // Address-derived pattern: catches stuck data bits and aliased
        // address lines. Destructive over the tested span.
        let words = size / 4;
        for i in 0..words {
            let a = addr.wrapping_add(4 * i);
            env.bus.write_u32(a, a ^ 0xa5a5_a5a5)?;
        }
        let mut errors: u32 = 0;
        for i in 0..words {
            let a = addr.wrapping_add(4 * i);
            if env.bus.read_u32(a)? != a ^ 0xa5a5_a5a5 {
                errors += 1;
            }
        }
        if errors == 0 {
            writeln!(env.out, "Memtest OK")?;
        } else {
            writeln!(env.out, "Memtest failed: {errors}/{words} words")?;
        }
        Ok(())
    }
}
