//! Peripheral service traits.
//!
//! The console and boot sequencer call through these boundaries and never
//! see registers. All traits assume a single logical thread of control;
//! stateful operations take `&mut self` rather than relying on locks.

use ember_types::error::Result;

// ---------------------------------------------------------------------------
// Memory bus
// ---------------------------------------------------------------------------

/// Word- and byte-granular access to the system address space.
pub trait MemoryBus {
    /// Read one 32-bit word. `addr` must be word-aligned.
    fn read_u32(&self, addr: u32) -> Result<u32>;

    /// Write one 32-bit word. `addr` must be word-aligned.
    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()>;

    /// Fill `buf` with bytes starting at `addr`.
    fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Copy `data` into the address space starting at `addr`.
    fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// System control
// ---------------------------------------------------------------------------

/// Identification, timing, and reset.
pub trait SysControl {
    /// Identifier string of the build (may be empty).
    fn ident(&self) -> String;

    /// System clock frequency in Hz.
    fn clock_hz(&self) -> u32;

    /// Latch and read the uptime cycle counter.
    fn uptime_cycles(&mut self) -> u64;

    /// Assert the reset line.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// Caches
// ---------------------------------------------------------------------------

/// CPU cache maintenance.
pub trait CacheControl {
    /// Flush the CPU data cache.
    fn flush_dcache(&mut self);

    /// Flush the L2 cache. Only called when the target carries one.
    fn flush_l2(&mut self);
}

// ---------------------------------------------------------------------------
// I2C master
// ---------------------------------------------------------------------------

/// I2C master using 7-bit slave addresses and 8-bit memory addresses.
pub trait I2cBus {
    /// Force the line back to idle in case a slave locks it.
    fn reset(&mut self);

    /// Address a slave and report whether it ACKs.
    fn probe(&mut self, slave_addr: u8) -> bool;

    /// Read `buf.len()` bytes of slave memory starting at `addr`.
    fn read(&mut self, slave_addr: u8, addr: u8, buf: &mut [u8], send_stop: bool) -> Result<()>;

    /// Write `data` into slave memory starting at `addr`.
    fn write(&mut self, slave_addr: u8, addr: u8, data: &[u8]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SDRAM controller
// ---------------------------------------------------------------------------

/// SDRAM controller and PHY.
pub trait SdramControl {
    /// Run controller/PHY initialization. `false` when training fails.
    fn init(&mut self) -> bool;

    /// Hand the controller to software (direct command) control.
    fn software_control(&mut self);

    /// Hand the controller back to hardware control.
    fn hardware_control(&mut self);

    /// Precharge all banks.
    fn precharge_all(&mut self);

    /// Activate `row` for subsequent direct accesses.
    fn activate_row(&mut self, row: u32);
}

// ---------------------------------------------------------------------------
// SPI flash
// ---------------------------------------------------------------------------

/// Memory-mapped SPI flash, read-only from the monitor's point of view.
pub trait SpiFlash {
    /// Total flash size in bytes.
    fn size(&self) -> u32;

    /// Fill `buf` from flash starting at `offset`.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Block storage
// ---------------------------------------------------------------------------

/// Block size used by the storage commands and the sdcard boot method.
pub const BLOCK_SIZE: usize = 512;

/// SD/MMC-style block device.
pub trait BlockDevice {
    /// Initialize the card. Must be called before the first read.
    fn init(&mut self) -> Result<()>;

    /// Read the block at `lba` into `buf`.
    fn read_block(&mut self, lba: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Boot-image transports
// ---------------------------------------------------------------------------

/// Serial image download: one handshake attempt per call.
pub trait SerialLoader {
    /// Offer the download handshake; returns the received image, or an
    /// error when no host answers.
    fn receive(&mut self) -> Result<Vec<u8>>;
}

/// Network image download (e.g. TFTP against a boot server).
pub trait NetLoader {
    /// Fetch `filename` from the boot server.
    fn fetch(&mut self, filename: &str) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// Simulation harness
// ---------------------------------------------------------------------------

/// Trace/finish hooks exposed by a simulation run.
pub trait SimControl {
    /// Whether trace dumping is currently enabled.
    fn trace_enabled(&self) -> bool;

    /// Enable or disable trace dumping.
    fn set_trace(&mut self, enable: bool);

    /// End the simulation.
    fn finish(&mut self);
}
