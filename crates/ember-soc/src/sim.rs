//! In-memory simulated SoC.
//!
//! One small struct per peripheral so callers can borrow them
//! independently, plus `SimSoc` which assembles a board from a
//! `MonitorConfig`. The I2C model keeps a transaction log so tests can
//! assert exactly which bus cycles happened.

use std::collections::BTreeMap;

use ember_types::config::MonitorConfig;
use ember_types::error::{EmberError, Result};

use crate::services::{
    BlockDevice, CacheControl, I2cBus, MemoryBus, NetLoader, SdramControl, SerialLoader,
    SimControl, SpiFlash, SysControl, BLOCK_SIZE,
};

// ---------------------------------------------------------------------------
// Memory bus
// ---------------------------------------------------------------------------

/// RAM window mapped at a fixed base address. Accesses outside the window
/// are bus faults, the closest a simulation gets to a hung wishbone cycle.
pub struct SimBus {
    base: u32,
    ram: Vec<u8>,
}

impl SimBus {
    pub fn new(base: u32, size: u32) -> Self {
        Self {
            base,
            ram: vec![0; size as usize],
        }
    }

    fn offset(&self, addr: u32, len: usize) -> Result<usize> {
        let end = self.base as u64 + self.ram.len() as u64;
        let span = addr as u64 + len as u64;
        if addr < self.base || span > end {
            return Err(EmberError::Hardware(format!("bus fault at {addr:#010x}")));
        }
        Ok((addr - self.base) as usize)
    }
}

impl MemoryBus for SimBus {
    fn read_u32(&self, addr: u32) -> Result<u32> {
        let i = self.offset(addr, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.ram[i..i + 4]);
        Ok(u32::from_le_bytes(word))
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<()> {
        let i = self.offset(addr, 4)?;
        self.ram[i..i + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn read_bytes(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let i = self.offset(addr, buf.len())?;
        buf.copy_from_slice(&self.ram[i..i + buf.len()]);
        Ok(())
    }

    fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let i = self.offset(addr, data.len())?;
        self.ram[i..i + data.len()].copy_from_slice(data);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// System control
// ---------------------------------------------------------------------------

/// Ident/clock/uptime/reset. The cycle counter advances by one clock
/// millisecond per latch so successive `uptime` reads move forward.
pub struct SimSys {
    ident: String,
    clock_hz: u32,
    cycles: u64,
    /// Number of times the reset line was asserted.
    pub reset_count: u32,
}

impl SimSys {
    pub fn new(ident: &str, clock_hz: u32) -> Self {
        Self {
            ident: ident.to_string(),
            clock_hz,
            cycles: 0,
            reset_count: 0,
        }
    }
}

impl SysControl for SimSys {
    fn ident(&self) -> String {
        self.ident.clone()
    }

    fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn uptime_cycles(&mut self) -> u64 {
        self.cycles += u64::from(self.clock_hz / 1000);
        self.cycles
    }

    fn reset(&mut self) {
        self.reset_count += 1;
        log::info!("reset line asserted");
    }
}

// ---------------------------------------------------------------------------
// Caches
// ---------------------------------------------------------------------------

/// Flush counters stand in for the real maintenance operations.
#[derive(Default)]
pub struct SimCache {
    pub dcache_flushes: u32,
    pub l2_flushes: u32,
}

impl CacheControl for SimCache {
    fn flush_dcache(&mut self) {
        self.dcache_flushes += 1;
    }

    fn flush_l2(&mut self) {
        self.l2_flushes += 1;
    }
}

// ---------------------------------------------------------------------------
// I2C
// ---------------------------------------------------------------------------

/// One observed I2C bus cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cTransaction {
    Reset,
    Probe { slave: u8 },
    Read { slave: u8, addr: u8, len: usize },
    Write { slave: u8, addr: u8, len: usize },
}

/// I2C master with a map of simulated slaves, each a 256-byte memory.
#[derive(Default)]
pub struct SimI2c {
    devices: BTreeMap<u8, [u8; 256]>,
    /// Every bus cycle in order, for tests.
    pub transactions: Vec<I2cTransaction>,
}

impl SimI2c {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a slave at `slave_addr` with the given initial memory
    /// (truncated/zero-padded to 256 bytes).
    pub fn with_device(mut self, slave_addr: u8, contents: &[u8]) -> Self {
        let mut mem = [0u8; 256];
        let n = contents.len().min(256);
        mem[..n].copy_from_slice(&contents[..n]);
        self.devices.insert(slave_addr, mem);
        self
    }
}

impl I2cBus for SimI2c {
    fn reset(&mut self) {
        self.transactions.push(I2cTransaction::Reset);
    }

    fn probe(&mut self, slave_addr: u8) -> bool {
        self.transactions.push(I2cTransaction::Probe { slave: slave_addr });
        self.devices.contains_key(&slave_addr)
    }

    fn read(&mut self, slave_addr: u8, addr: u8, buf: &mut [u8], _send_stop: bool) -> Result<()> {
        self.transactions.push(I2cTransaction::Read {
            slave: slave_addr,
            addr,
            len: buf.len(),
        });
        let mem = self
            .devices
            .get(&slave_addr)
            .ok_or_else(|| EmberError::Hardware(format!("I2C nack from {slave_addr:#04x}")))?;
        for (i, b) in buf.iter_mut().enumerate() {
            // Slave memory addresses wrap at 256, like a real EEPROM.
            *b = mem[(addr as usize + i) % 256];
        }
        Ok(())
    }

    fn write(&mut self, slave_addr: u8, addr: u8, data: &[u8]) -> Result<()> {
        self.transactions.push(I2cTransaction::Write {
            slave: slave_addr,
            addr,
            len: data.len(),
        });
        let mem = self
            .devices
            .get_mut(&slave_addr)
            .ok_or_else(|| EmberError::Hardware(format!("I2C nack from {slave_addr:#04x}")))?;
        for (i, &b) in data.iter().enumerate() {
            mem[(addr as usize + i) % 256] = b;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SDRAM controller
// ---------------------------------------------------------------------------

/// SDRAM controller state machine: init outcome is configurable so tests
/// can exercise the "init failed" path.
pub struct SimSdram {
    init_ok: bool,
    pub initialized: bool,
    pub software_controlled: bool,
    pub active_row: Option<u32>,
}

impl SimSdram {
    pub fn new() -> Self {
        Self {
            init_ok: true,
            initialized: false,
            software_controlled: false,
            active_row: None,
        }
    }

    /// Make the next `init` report a training failure.
    pub fn failing() -> Self {
        Self {
            init_ok: false,
            ..Self::new()
        }
    }
}

impl Default for SimSdram {
    fn default() -> Self {
        Self::new()
    }
}

impl SdramControl for SimSdram {
    fn init(&mut self) -> bool {
        self.initialized = self.init_ok;
        self.init_ok
    }

    fn software_control(&mut self) {
        self.software_controlled = true;
    }

    fn hardware_control(&mut self) {
        self.software_controlled = false;
        self.active_row = None;
    }

    fn precharge_all(&mut self) {
        self.active_row = None;
    }

    fn activate_row(&mut self, row: u32) {
        self.active_row = Some(row);
    }
}

// ---------------------------------------------------------------------------
// SPI flash
// ---------------------------------------------------------------------------

/// Flash backed by a byte vector. Reads past the end are faults.
pub struct SimFlash {
    data: Vec<u8>,
}

impl SimFlash {
    pub fn new(size: u32) -> Self {
        // Erased flash reads all-ones.
        Self {
            data: vec![0xff; size as usize],
        }
    }

    /// Program `contents` starting at `offset`.
    pub fn program(&mut self, offset: u32, contents: &[u8]) {
        let start = offset as usize;
        let end = (start + contents.len()).min(self.data.len());
        self.data[start..end].copy_from_slice(&contents[..end - start]);
    }
}

impl SpiFlash for SimFlash {
    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        let start = offset as usize;
        let end = start + buf.len();
        if end > self.data.len() {
            return Err(EmberError::Hardware(format!(
                "flash read past end at {offset:#010x}"
            )));
        }
        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Block storage
// ---------------------------------------------------------------------------

/// Block device backed by a byte vector; reads fail until `init` runs.
pub struct SimCard {
    data: Vec<u8>,
    pub initialized: bool,
}

impl SimCard {
    pub fn new(blocks: u32) -> Self {
        Self {
            data: vec![0; blocks as usize * BLOCK_SIZE],
            initialized: false,
        }
    }

    /// Write `contents` starting at block `lba`.
    pub fn program(&mut self, lba: u32, contents: &[u8]) {
        let start = lba as usize * BLOCK_SIZE;
        let end = (start + contents.len()).min(self.data.len());
        self.data[start..end].copy_from_slice(&contents[..end - start]);
    }
}

impl BlockDevice for SimCard {
    fn init(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn read_block(&mut self, lba: u32, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
        if !self.initialized {
            return Err(EmberError::Hardware("card not initialized".into()));
        }
        let start = lba as usize * BLOCK_SIZE;
        if start + BLOCK_SIZE > self.data.len() {
            return Err(EmberError::Hardware(format!("block {lba} out of range")));
        }
        buf.copy_from_slice(&self.data[start..start + BLOCK_SIZE]);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Boot-image transports
// ---------------------------------------------------------------------------

/// Serial download: hands out a preloaded image, or fails like a silent
/// host would.
#[derive(Default)]
pub struct SimSerial {
    image: Option<Vec<u8>>,
    /// Number of handshake attempts observed.
    pub attempts: u32,
}

impl SimSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(image: Vec<u8>) -> Self {
        Self {
            image: Some(image),
            attempts: 0,
        }
    }
}

impl SerialLoader for SimSerial {
    fn receive(&mut self) -> Result<Vec<u8>> {
        self.attempts += 1;
        self.image
            .clone()
            .ok_or_else(|| EmberError::Hardware("serial: no host response".into()))
    }
}

/// Network download: a name-to-image map standing in for a boot server.
#[derive(Default)]
pub struct SimNet {
    files: BTreeMap<String, Vec<u8>>,
}

impl SimNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, image: Vec<u8>) -> Self {
        self.files.insert(name.to_string(), image);
        self
    }
}

impl NetLoader for SimNet {
    fn fetch(&mut self, filename: &str) -> Result<Vec<u8>> {
        self.files
            .get(filename)
            .cloned()
            .ok_or_else(|| EmberError::Hardware(format!("net: no answer for {filename}")))
    }
}

// ---------------------------------------------------------------------------
// Simulation harness
// ---------------------------------------------------------------------------

/// Trace/finish flags of the simulation harness.
#[derive(Default)]
pub struct SimCtl {
    trace: bool,
    pub finished: bool,
}

impl SimCtl {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimControl for SimCtl {
    fn trace_enabled(&self) -> bool {
        self.trace
    }

    fn set_trace(&mut self, enable: bool) {
        self.trace = enable;
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

// ---------------------------------------------------------------------------
// Assembled board
// ---------------------------------------------------------------------------

/// A complete simulated board. Optional peripherals are present exactly
/// when the corresponding capability is configured, so the wiring mirrors
/// what the registry and boot list will be built from.
pub struct SimSoc {
    pub bus: SimBus,
    pub sys: SimSys,
    pub cache: SimCache,
    pub i2c: Option<SimI2c>,
    pub sdram: Option<SimSdram>,
    pub flash: Option<SimFlash>,
    pub card: Option<SimCard>,
    pub serial: Option<SimSerial>,
    pub net: Option<SimNet>,
    pub sim: Option<SimCtl>,
}

impl SimSoc {
    /// Assemble a board from a configuration.
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        let caps = &cfg.caps;
        Self {
            bus: SimBus::new(cfg.memory.main_ram_base, cfg.memory.main_ram_size),
            sys: SimSys::new(&cfg.ident, cfg.clock_hz),
            cache: SimCache::default(),
            i2c: caps.i2c.then(SimI2c::new),
            sdram: caps.sdram.then(SimSdram::new),
            flash: caps.spiflash.then(|| SimFlash::new(0x0100_0000)),
            card: caps.sdcard.then(|| SimCard::new(2048)),
            serial: caps.serial_boot.then(SimSerial::new),
            net: caps.ethernet.then(SimNet::new),
            sim: caps.sim.then(SimCtl::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_round_trip_at_base() {
        let mut bus = SimBus::new(0x4000_0000, 0x1000);
        bus.write_u32(0x4000_0000, 0x1234_5678).unwrap();
        assert_eq!(bus.read_u32(0x4000_0000).unwrap(), 0x1234_5678);
    }

    #[test]
    fn bus_fault_below_base() {
        let bus = SimBus::new(0x4000_0000, 0x1000);
        let err = bus.read_u32(0x3fff_fffc).unwrap_err();
        assert!(format!("{err}").contains("bus fault"));
    }

    #[test]
    fn bus_fault_past_end() {
        let bus = SimBus::new(0x4000_0000, 0x1000);
        assert!(bus.read_u32(0x4000_1000).is_err());
        // Last word of the window is still valid.
        assert!(bus.read_u32(0x4000_0ffc).is_ok());
    }

    #[test]
    fn bus_byte_access_spans_words() {
        let mut bus = SimBus::new(0, 64);
        bus.write_bytes(2, &[1, 2, 3, 4, 5, 6]).unwrap();
        let mut buf = [0u8; 6];
        bus.read_bytes(2, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn bus_words_are_little_endian() {
        let mut bus = SimBus::new(0, 16);
        bus.write_u32(0, 0xaabb_ccdd).unwrap();
        let mut buf = [0u8; 4];
        bus.read_bytes(0, &mut buf).unwrap();
        assert_eq!(buf, [0xdd, 0xcc, 0xbb, 0xaa]);
    }

    #[test]
    fn sys_uptime_advances() {
        let mut sys = SimSys::new("test", 50_000_000);
        let a = sys.uptime_cycles();
        let b = sys.uptime_cycles();
        assert!(b > a);
    }

    #[test]
    fn sys_reset_is_counted() {
        let mut sys = SimSys::new("test", 1_000_000);
        sys.reset();
        sys.reset();
        assert_eq!(sys.reset_count, 2);
    }

    #[test]
    fn cache_flushes_are_counted() {
        let mut cache = SimCache::default();
        cache.flush_dcache();
        cache.flush_dcache();
        cache.flush_l2();
        assert_eq!(cache.dcache_flushes, 2);
        assert_eq!(cache.l2_flushes, 1);
    }

    #[test]
    fn i2c_probe_present_and_absent() {
        let mut i2c = SimI2c::new().with_device(0x50, b"spd");
        assert!(i2c.probe(0x50));
        assert!(!i2c.probe(0x51));
        assert_eq!(i2c.transactions.len(), 2);
    }

    #[test]
    fn i2c_read_write_round_trip() {
        let mut i2c = SimI2c::new().with_device(0x42, &[]);
        i2c.write(0x42, 0x10, &[0xaa, 0xbb]).unwrap();
        let mut buf = [0u8; 2];
        i2c.read(0x42, 0x10, &mut buf, true).unwrap();
        assert_eq!(buf, [0xaa, 0xbb]);
    }

    #[test]
    fn i2c_read_wraps_at_256() {
        let mut mem = vec![0u8; 256];
        mem[0] = 0x99;
        mem[255] = 0x77;
        let mut i2c = SimI2c::new().with_device(0x42, &mem);
        let mut buf = [0u8; 2];
        i2c.read(0x42, 0xff, &mut buf, true).unwrap();
        assert_eq!(buf, [0x77, 0x99]);
    }

    #[test]
    fn i2c_nack_from_missing_slave() {
        let mut i2c = SimI2c::new();
        let mut buf = [0u8; 1];
        let err = i2c.read(0x20, 0, &mut buf, true).unwrap_err();
        assert!(format!("{err}").contains("nack"));
    }

    #[test]
    fn i2c_transaction_log_records_order() {
        let mut i2c = SimI2c::new().with_device(0x42, &[]);
        i2c.reset();
        i2c.write(0x42, 0, &[1]).unwrap();
        assert_eq!(i2c.transactions[0], I2cTransaction::Reset);
        assert_eq!(
            i2c.transactions[1],
            I2cTransaction::Write {
                slave: 0x42,
                addr: 0,
                len: 1
            }
        );
    }

    #[test]
    fn sdram_init_ok_and_failing() {
        let mut ok = SimSdram::new();
        assert!(ok.init());
        assert!(ok.initialized);

        let mut bad = SimSdram::failing();
        assert!(!bad.init());
        assert!(!bad.initialized);
    }

    #[test]
    fn sdram_row_state() {
        let mut sdram = SimSdram::new();
        sdram.software_control();
        sdram.activate_row(42);
        assert_eq!(sdram.active_row, Some(42));
        sdram.precharge_all();
        assert_eq!(sdram.active_row, None);
        sdram.hardware_control();
        assert!(!sdram.software_controlled);
    }

    #[test]
    fn flash_erased_reads_ones() {
        let mut flash = SimFlash::new(256);
        let mut buf = [0u8; 4];
        flash.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xff; 4]);
    }

    #[test]
    fn flash_program_then_read() {
        let mut flash = SimFlash::new(256);
        flash.program(16, &[1, 2, 3]);
        let mut buf = [0u8; 3];
        flash.read(16, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn flash_read_past_end_is_an_error() {
        let mut flash = SimFlash::new(16);
        let mut buf = [0u8; 4];
        assert!(flash.read(14, &mut buf).is_err());
    }

    #[test]
    fn card_requires_init() {
        let mut card = SimCard::new(4);
        let mut buf = [0u8; BLOCK_SIZE];
        assert!(card.read_block(0, &mut buf).is_err());
        card.init().unwrap();
        assert!(card.read_block(0, &mut buf).is_ok());
    }

    #[test]
    fn card_program_then_read() {
        let mut card = SimCard::new(4);
        card.program(1, b"hello");
        card.init().unwrap();
        let mut buf = [0u8; BLOCK_SIZE];
        card.read_block(1, &mut buf).unwrap();
        assert_eq!(&buf[..5], b"hello");
    }

    #[test]
    fn serial_without_host_fails_and_counts() {
        let mut serial = SimSerial::new();
        assert!(serial.receive().is_err());
        assert!(serial.receive().is_err());
        assert_eq!(serial.attempts, 2);
    }

    #[test]
    fn serial_with_image_delivers_repeatedly() {
        let mut serial = SimSerial::with_image(vec![1, 2, 3]);
        assert_eq!(serial.receive().unwrap(), vec![1, 2, 3]);
        assert_eq!(serial.receive().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn net_fetch_hit_and_miss() {
        let mut net = SimNet::new().with_file("boot.bin", vec![9]);
        assert_eq!(net.fetch("boot.bin").unwrap(), vec![9]);
        assert!(net.fetch("other.bin").is_err());
    }

    #[test]
    fn sim_ctl_trace_toggle_and_finish() {
        let mut ctl = SimCtl::new();
        assert!(!ctl.trace_enabled());
        ctl.set_trace(true);
        assert!(ctl.trace_enabled());
        ctl.finish();
        assert!(ctl.finished);
    }

    #[test]
    fn soc_from_default_config() {
        let soc = SimSoc::from_config(&MonitorConfig::default());
        assert!(soc.i2c.is_some());
        assert!(soc.sdram.is_some());
        assert!(soc.flash.is_some());
        assert!(soc.serial.is_some());
        assert!(soc.card.is_none());
        assert!(soc.net.is_none());
        assert!(soc.sim.is_none());
    }

    #[test]
    fn soc_respects_disabled_capabilities() {
        let mut cfg = MonitorConfig::default();
        cfg.caps.i2c = false;
        cfg.caps.spiflash = false;
        let soc = SimSoc::from_config(&cfg);
        assert!(soc.i2c.is_none());
        assert!(soc.flash.is_none());
    }
}
