//! System, cache, and miscellaneous commands: help, ident, uptime, reboot,
//! crc, cache flushes, and the simulation-harness hooks.

use std::fmt::Write;

use ember_types::config::Capabilities;
use ember_types::crc::{crc32_update, CRC32_INIT};
use ember_types::error::{EmberError, Result};

use crate::num::parse_u32;
use crate::registry::{Command, CommandGroup, Env, RegistryBuilder};

/// Register the system/cache/misc commands enabled by `caps`.
pub fn register(b: &mut RegistryBuilder, caps: &Capabilities) -> Result<()> {
    b.register(Box::new(HelpCmd))?;
    b.register(Box::new(IdentCmd))?;
    b.register(Box::new(UptimeCmd))?;
    b.register(Box::new(RebootCmd))?;
    b.register(Box::new(CrcCmd))?;
    b.register(Box::new(FlushDCacheCmd))?;
    if caps.l2_cache {
        b.register(Box::new(FlushL2Cmd))?;
    }
    if caps.sim {
        b.register(Box::new(TraceCmd))?;
        b.register(Box::new(FinishCmd))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;
impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn help(&self) -> &str {
        "Print this help"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Misc
    }
    fn execute(&self, _args: &[&str], _env: &mut Env<'_>) -> Result<()> {
        // The listing needs the table itself, so the registry intercepts
        // the name before lookup. This descriptor exists so `help` shows
        // up in its own output.
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ident
// ---------------------------------------------------------------------------

struct IdentCmd;
impl Command for IdentCmd {
    fn name(&self) -> &str {
        "ident"
    }
    fn help(&self) -> &str {
        "Identifier of the system"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::System
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        let ident = env.sys.ident();
        let shown = if ident.is_empty() { "-" } else { &ident };
        writeln!(env.out, "Ident: {shown}")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// uptime
// ---------------------------------------------------------------------------

struct UptimeCmd;
impl Command for UptimeCmd {
    fn name(&self) -> &str {
        "uptime"
    }
    fn help(&self) -> &str {
        "Uptime of the system since power-up"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::System
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        let cycles = env.sys.uptime_cycles();
        let hz = u64::from(env.sys.clock_hz());
        let seconds = cycles.checked_div(hz).unwrap_or(0);
        writeln!(env.out, "Uptime: {cycles} sys_clk cycles / {seconds} seconds")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// reboot
// ---------------------------------------------------------------------------

struct RebootCmd;
impl Command for RebootCmd {
    fn name(&self) -> &str {
        "reboot"
    }
    fn help(&self) -> &str {
        "Reboot the system"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::System
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        env.sys.reset();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// crc
// ---------------------------------------------------------------------------

struct CrcCmd;
impl Command for CrcCmd {
    fn name(&self) -> &str {
        "crc"
    }
    fn help(&self) -> &str {
        "Compute CRC32 of a part of the address space"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Misc
    }
    fn execute(&self, args: &[&str], env: &mut Env<'_>) -> Result<()> {
        if args.len() < 2 {
            return Err(EmberError::Usage("crc <address> <length>"));
        }
        let addr = parse_u32(args[0]).ok_or(EmberError::BadArgument("address"))?;
        let length = parse_u32(args[1]).ok_or(EmberError::BadArgument("length"))?;

        // Stream in small chunks so the read stays bounded; a bus fault
        // aborts before anything is printed.
        let mut state = CRC32_INIT;
        let mut buf = [0u8; 256];
        let mut cursor = addr;
        let mut remaining = length as usize;
        while remaining > 0 {
            let n = remaining.min(buf.len());
            env.bus.read_bytes(cursor, &mut buf[..n])?;
            state = crc32_update(state, &buf[..n]);
            cursor = cursor.wrapping_add(n as u32);
            remaining -= n;
        }
        writeln!(env.out, "CRC32: {:08x}", !state)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// flush_cpu_dcache / flush_l2_cache
// ---------------------------------------------------------------------------

struct FlushDCacheCmd;
impl Command for FlushDCacheCmd {
    fn name(&self) -> &str {
        "flush_cpu_dcache"
    }
    fn help(&self) -> &str {
        "Flush CPU data cache"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Cache
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        env.cache.flush_dcache();
        Ok(())
    }
}

struct FlushL2Cmd;
impl Command for FlushL2Cmd {
    fn name(&self) -> &str {
        "flush_l2_cache"
    }
    fn help(&self) -> &str {
        "Flush L2 cache"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Cache
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        env.cache.flush_l2();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// trace / finish
// ---------------------------------------------------------------------------

struct TraceCmd;
impl Command for TraceCmd {
    fn name(&self) -> &str {
        "trace"
    }
    fn help(&self) -> &str {
        "Toggle simulation tracing"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Misc
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        let Some(sim) = env.sim.as_mut() else {
            return Err(EmberError::Hardware("simulation harness not available".into()));
        };
        let enable = !sim.trace_enabled();
        sim.set_trace(enable);
        Ok(())
    }
}

struct FinishCmd;
impl Command for FinishCmd {
    fn name(&self) -> &str {
        "finish"
    }
    fn help(&self) -> &str {
        "Finish simulation"
    }
    fn group(&self) -> CommandGroup {
        CommandGroup::Misc
    }
    fn execute(&self, _args: &[&str], env: &mut Env<'_>) -> Result<()> {
        let Some(sim) = env.sim.as_mut() else {
            return Err(EmberError::Hardware("simulation harness not available".into()));
        };
        sim.finish();
        Ok(())
    }
}
