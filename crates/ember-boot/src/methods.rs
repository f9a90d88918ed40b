//! The boot methods, in chain order: serial, flash, rom, sdcard, net.
//!
//! Medium-backed methods (flash, rom, sdcard) expect a headered image
//! (magic, length, CRC32) and verify it before anything is copied.
//! Transport-backed methods (serial, net) receive payloads already framed
//! and checked by their protocol, so they load what the trait hands over.

use ember_soc::BLOCK_SIZE;
use ember_types::config::{Capabilities, MemoryMap};
use ember_types::crc::crc32;
use ember_types::error::{EmberError, Result};

use crate::sequencer::{BootAttempt, BootEnv, BootMethod, LoadedImage};

/// Image header magic ("EMBR").
pub const IMAGE_MAGIC: u32 = 0x454d_4252;

/// Header layout: magic, payload length, payload CRC32, all little-endian.
pub const HEADER_LEN: usize = 12;

/// Largest payload any medium may claim; a corrupted header must not drive
/// a giant allocation.
const MAX_IMAGE_LEN: usize = 0x0100_0000;

/// Prepend the boot header to a payload.
pub fn wrap_image(payload: &[u8]) -> Vec<u8> {
    let mut image = Vec::with_capacity(HEADER_LEN + payload.len());
    image.extend_from_slice(&IMAGE_MAGIC.to_le_bytes());
    image.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    image.extend_from_slice(&crc32(payload).to_le_bytes());
    image.extend_from_slice(payload);
    image
}

fn word(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Parse a header, returning (payload length, expected CRC32).
fn parse_header(header: &[u8; HEADER_LEN]) -> Result<(usize, u32)> {
    if word(&header[0..4]) != IMAGE_MAGIC {
        return Err(EmberError::Hardware("no boot image".into()));
    }
    let length = word(&header[4..8]) as usize;
    if length > MAX_IMAGE_LEN {
        return Err(EmberError::Hardware("boot image length out of range".into()));
    }
    Ok((length, word(&header[8..12])))
}

fn check_crc(payload: &[u8], expected: u32) -> Result<()> {
    if crc32(payload) != expected {
        return Err(EmberError::Hardware("boot image CRC mismatch".into()));
    }
    Ok(())
}

/// Copy a verified payload to the load address.
fn load_payload(env: &mut BootEnv<'_>, payload: &[u8]) -> Result<LoadedImage> {
    env.bus.write_bytes(env.load_addr, payload)?;
    Ok(LoadedImage {
        entry: env.load_addr,
        size: payload.len(),
    })
}

// ---------------------------------------------------------------------------
// Serial
// ---------------------------------------------------------------------------

/// One serial download handshake.
pub struct SerialBoot;

impl BootAttempt for SerialBoot {
    fn attempt(&mut self, env: &mut BootEnv<'_>) -> Result<LoadedImage> {
        let Some(serial) = env.serial.as_mut() else {
            return Err(EmberError::Hardware("serial loader not available".into()));
        };
        let payload = serial.receive()?;
        load_payload(env, &payload)
    }
}

// ---------------------------------------------------------------------------
// Flash
// ---------------------------------------------------------------------------

/// Headered image at a fixed flash offset.
pub struct FlashBoot {
    pub offset: u32,
}

impl BootAttempt for FlashBoot {
    fn attempt(&mut self, env: &mut BootEnv<'_>) -> Result<LoadedImage> {
        let Some(flash) = env.flash.as_mut() else {
            return Err(EmberError::Hardware("flash not available".into()));
        };
        let mut header = [0u8; HEADER_LEN];
        flash.read(self.offset, &mut header)?;
        let (length, expected) = parse_header(&header)?;

        let available = flash
            .size()
            .saturating_sub(self.offset)
            .saturating_sub(HEADER_LEN as u32) as usize;
        if length > available {
            return Err(EmberError::Hardware("boot image length out of range".into()));
        }
        let mut payload = vec![0u8; length];
        flash.read(self.offset + HEADER_LEN as u32, &mut payload)?;
        check_crc(&payload, expected)?;
        load_payload(env, &payload)
    }
}

// ---------------------------------------------------------------------------
// ROM
// ---------------------------------------------------------------------------

/// Headered image baked into a ROM window; executes in place, no copy.
pub struct RomBoot {
    pub base: u32,
}

impl BootAttempt for RomBoot {
    fn attempt(&mut self, env: &mut BootEnv<'_>) -> Result<LoadedImage> {
        let mut header = [0u8; HEADER_LEN];
        env.bus.read_bytes(self.base, &mut header)?;
        let (length, expected) = parse_header(&header)?;

        let mut payload = vec![0u8; length];
        env.bus
            .read_bytes(self.base + HEADER_LEN as u32, &mut payload)?;
        check_crc(&payload, expected)?;
        Ok(LoadedImage {
            entry: self.base + HEADER_LEN as u32,
            size: length,
        })
    }
}

// ---------------------------------------------------------------------------
// SD card
// ---------------------------------------------------------------------------

/// Headered image starting at block 0.
pub struct SdCardBoot;

impl BootAttempt for SdCardBoot {
    fn attempt(&mut self, env: &mut BootEnv<'_>) -> Result<LoadedImage> {
        let Some(card) = env.card.as_mut() else {
            return Err(EmberError::Hardware("card not available".into()));
        };
        card.init()?;

        let mut block = [0u8; BLOCK_SIZE];
        card.read_block(0, &mut block)?;
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&block[..HEADER_LEN]);
        let (length, expected) = parse_header(&header)?;

        let total = HEADER_LEN + length;
        let mut image = Vec::with_capacity(total.next_multiple_of(BLOCK_SIZE));
        image.extend_from_slice(&block);
        let mut lba = 1;
        while image.len() < total {
            card.read_block(lba, &mut block)?;
            image.extend_from_slice(&block);
            lba += 1;
        }
        let payload = &image[HEADER_LEN..total];
        check_crc(payload, expected)?;
        load_payload(env, payload)
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Image fetched from the boot server.
pub struct NetBoot {
    pub filename: &'static str,
}

impl Default for NetBoot {
    fn default() -> Self {
        Self {
            filename: "boot.bin",
        }
    }
}

impl BootAttempt for NetBoot {
    fn attempt(&mut self, env: &mut BootEnv<'_>) -> Result<LoadedImage> {
        let Some(net) = env.net.as_mut() else {
            return Err(EmberError::Hardware("network not available".into()));
        };
        let payload = net.fetch(self.filename)?;
        load_payload(env, &payload)
    }
}

// ---------------------------------------------------------------------------
// Chain construction
// ---------------------------------------------------------------------------

/// Build the fallback chain from the capability set. Order encodes
/// priority and is fixed here: serial, flash, rom, sdcard, net.
pub fn build_boot_methods(caps: &Capabilities, map: &MemoryMap) -> Vec<BootMethod> {
    let mut methods = Vec::new();
    if caps.serial_boot {
        methods.push(BootMethod::new("serial", Box::new(SerialBoot)));
    }
    if caps.spiflash {
        methods.push(BootMethod::new(
            "flash",
            Box::new(FlashBoot {
                offset: map.flash_boot_offset,
            }),
        ));
    }
    if caps.rom_boot {
        methods.push(BootMethod::new("rom", Box::new(RomBoot { base: map.rom_base })));
    }
    if caps.sdcard {
        methods.push(BootMethod::new("sdcard", Box::new(SdCardBoot)));
    }
    if caps.ethernet {
        methods.push(BootMethod::new("net", Box::new(NetBoot::default())));
    }
    methods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::{BootOutcome, BootSequencer};
    use ember_soc::sim::{SimBus, SimCard, SimFlash, SimNet, SimSerial};
    use ember_soc::MemoryBus;

    const RAM_BASE: u32 = 0x4000_0000;

    fn ram() -> SimBus {
        SimBus::new(RAM_BASE, 0x1_0000)
    }

    fn bare_env(bus: &mut SimBus) -> BootEnv<'_> {
        BootEnv {
            bus,
            load_addr: RAM_BASE,
            serial: None,
            flash: None,
            card: None,
            net: None,
        }
    }

    #[test]
    fn wrap_image_layout() {
        let image = wrap_image(b"xyz");
        assert_eq!(image.len(), HEADER_LEN + 3);
        assert_eq!(&image[0..4], &IMAGE_MAGIC.to_le_bytes());
        assert_eq!(&image[4..8], &3u32.to_le_bytes());
        assert_eq!(&image[12..], b"xyz");
    }

    #[test]
    fn serial_boot_loads_payload_into_ram() {
        let mut bus = ram();
        let mut serial = SimSerial::with_image(b"serial payload".to_vec());
        let mut env = bare_env(&mut bus);
        env.serial = Some(&mut serial);
        let image = SerialBoot.attempt(&mut env).unwrap();
        assert_eq!(image.entry, RAM_BASE);
        assert_eq!(image.size, 14);
        let mut buf = [0u8; 14];
        bus.read_bytes(RAM_BASE, &mut buf).unwrap();
        assert_eq!(&buf, b"serial payload");
    }

    #[test]
    fn serial_boot_fails_without_host() {
        let mut bus = ram();
        let mut serial = SimSerial::new();
        let mut env = bare_env(&mut bus);
        env.serial = Some(&mut serial);
        assert!(SerialBoot.attempt(&mut env).is_err());
    }

    #[test]
    fn flash_boot_verifies_and_loads() {
        let mut bus = ram();
        let mut flash = SimFlash::new(0x10_0000);
        flash.program(0x8000, &wrap_image(b"flash program"));
        let mut env = bare_env(&mut bus);
        env.flash = Some(&mut flash);
        let image = FlashBoot { offset: 0x8000 }.attempt(&mut env).unwrap();
        assert_eq!(image.size, 13);
        let mut buf = [0u8; 13];
        bus.read_bytes(RAM_BASE, &mut buf).unwrap();
        assert_eq!(&buf, b"flash program");
    }

    #[test]
    fn flash_boot_fails_on_erased_flash() {
        let mut bus = ram();
        let mut flash = SimFlash::new(0x10_0000);
        let mut env = bare_env(&mut bus);
        env.flash = Some(&mut flash);
        let err = FlashBoot { offset: 0x8000 }.attempt(&mut env).unwrap_err();
        assert!(format!("{err}").contains("no boot image"));
    }

    #[test]
    fn flash_boot_fails_on_corrupt_payload() {
        let mut bus = ram();
        let mut flash = SimFlash::new(0x10_0000);
        let mut image = wrap_image(b"flash program");
        let last = image.len() - 1;
        image[last] ^= 0xff;
        flash.program(0x8000, &image);
        let mut env = bare_env(&mut bus);
        env.flash = Some(&mut flash);
        let err = FlashBoot { offset: 0x8000 }.attempt(&mut env).unwrap_err();
        assert!(format!("{err}").contains("CRC mismatch"));
    }

    #[test]
    fn flash_boot_rejects_insane_length() {
        let mut bus = ram();
        let mut flash = SimFlash::new(0x1000);
        let mut image = wrap_image(b"x");
        image[4..8].copy_from_slice(&0xffff_0000u32.to_le_bytes());
        flash.program(0, &image);
        let mut env = bare_env(&mut bus);
        env.flash = Some(&mut flash);
        let err = FlashBoot { offset: 0 }.attempt(&mut env).unwrap_err();
        assert!(format!("{err}").contains("length out of range"));
    }

    #[test]
    fn rom_boot_executes_in_place() {
        // Map a window that covers both the ROM image and the RAM area.
        let mut bus = SimBus::new(0, 0x1000);
        bus.write_bytes(0x100, &wrap_image(b"rom resident")).unwrap();
        let mut env = BootEnv {
            bus: &mut bus,
            load_addr: 0x800,
            serial: None,
            flash: None,
            card: None,
            net: None,
        };
        let image = RomBoot { base: 0x100 }.attempt(&mut env).unwrap();
        assert_eq!(image.entry, 0x100 + HEADER_LEN as u32);
        assert_eq!(image.size, 12);
    }

    #[test]
    fn rom_boot_fails_on_unmapped_window() {
        let mut bus = ram();
        let mut env = bare_env(&mut bus);
        assert!(RomBoot { base: 0x100 }.attempt(&mut env).is_err());
    }

    #[test]
    fn sdcard_boot_reads_multi_block_image() {
        let mut bus = ram();
        let mut card = SimCard::new(16);
        // Payload spans three blocks.
        let payload: Vec<u8> = (0..1200u32).map(|i| i as u8).collect();
        card.program(0, &wrap_image(&payload));
        let mut env = bare_env(&mut bus);
        env.card = Some(&mut card);
        let image = SdCardBoot.attempt(&mut env).unwrap();
        assert_eq!(image.size, 1200);
        let mut buf = vec![0u8; 1200];
        bus.read_bytes(RAM_BASE, &mut buf).unwrap();
        assert_eq!(buf, payload);
    }

    #[test]
    fn sdcard_boot_fails_on_blank_card() {
        let mut bus = ram();
        let mut card = SimCard::new(16);
        let mut env = bare_env(&mut bus);
        env.card = Some(&mut card);
        assert!(SdCardBoot.attempt(&mut env).is_err());
    }

    #[test]
    fn net_boot_fetches_default_filename() {
        let mut bus = ram();
        let mut net = SimNet::new().with_file("boot.bin", b"netimg".to_vec());
        let mut env = bare_env(&mut bus);
        env.net = Some(&mut net);
        let image = NetBoot::default().attempt(&mut env).unwrap();
        assert_eq!(image.size, 6);
    }

    #[test]
    fn chain_order_is_fixed() {
        let caps = Capabilities {
            serial_boot: true,
            spiflash: true,
            rom_boot: true,
            sdcard: true,
            ethernet: true,
            ..Capabilities::default()
        };
        let methods = build_boot_methods(&caps, &MemoryMap::default());
        let labels: Vec<&str> = methods.iter().map(|m| m.label).collect();
        assert_eq!(labels, ["serial", "flash", "rom", "sdcard", "net"]);
    }

    #[test]
    fn chain_skips_absent_capabilities() {
        let caps = Capabilities::default();
        let methods = build_boot_methods(&caps, &MemoryMap::default());
        let labels: Vec<&str> = methods.iter().map(|m| m.label).collect();
        assert_eq!(labels, ["serial", "flash"]);
    }

    #[test]
    fn chain_falls_back_from_silent_serial_to_flash() {
        let mut bus = ram();
        let mut serial = SimSerial::new();
        let mut flash = SimFlash::new(0x10_0000);
        flash.program(
            MemoryMap::default().flash_boot_offset,
            &wrap_image(b"fallback"),
        );
        let mut env = bare_env(&mut bus);
        env.serial = Some(&mut serial);
        env.flash = Some(&mut flash);

        let methods = build_boot_methods(&Capabilities::default(), &MemoryMap::default());
        let seq = BootSequencer::new(methods);
        match seq.run(&mut env) {
            BootOutcome::Succeeded { label, image } => {
                assert_eq!(label, "flash");
                assert_eq!(image.size, 8);
            },
            BootOutcome::Exhausted => panic!("expected flash fallback"),
        }
    }
}
