//! Capability and board-layout configuration.
//!
//! Which commands and boot methods exist is decided once, at registry and
//! boot-list construction time, from a `MonitorConfig` loaded from TOML
//! (or built from defaults). Each capability flag independently gates one
//! command module or boot method; an absent peripheral simply contributes
//! nothing.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Which optional hardware blocks the target carries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// I2C master block (i2c* commands, SPD EEPROM reads).
    pub i2c: bool,
    /// SDRAM controller (sdr* commands, init step at startup).
    pub sdram: bool,
    /// L2 cache present (enables `flush_l2_cache`).
    pub l2_cache: bool,
    /// Memory-mapped SPI flash (flash boot method).
    pub spiflash: bool,
    /// SD/MMC card controller (storage commands, sdcard boot method).
    pub sdcard: bool,
    /// Ethernet MAC (network boot method).
    pub ethernet: bool,
    /// Simulation harness hooks (`trace` / `finish` commands).
    pub sim: bool,
    /// Serial image download at boot (first boot method).
    pub serial_boot: bool,
    /// Boot image baked into ROM.
    pub rom_boot: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            i2c: true,
            sdram: true,
            l2_cache: false,
            spiflash: true,
            sdcard: false,
            ethernet: false,
            sim: false,
            serial_boot: true,
            rom_boot: false,
        }
    }
}

/// Address-space layout of the target.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MemoryMap {
    /// Base address of main RAM (boot images load here).
    pub main_ram_base: u32,
    /// Size of main RAM in bytes.
    pub main_ram_size: u32,
    /// Base address of the boot ROM window.
    pub rom_base: u32,
    /// Offset of the boot image within SPI flash.
    pub flash_boot_offset: u32,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self {
            main_ram_base: 0x4000_0000,
            main_ram_size: 0x0040_0000,
            rom_base: 0x0001_0000,
            flash_boot_offset: 0x0008_0000,
        }
    }
}

/// Top-level monitor configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Identifier string reported by `ident` ("-" when empty).
    pub ident: String,
    /// Human-readable CPU name for the startup banner.
    pub cpu_name: String,
    /// System clock frequency in Hz.
    pub clock_hz: u32,
    pub caps: Capabilities,
    pub memory: MemoryMap,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            ident: String::new(),
            cpu_name: "vexriscv".to_string(),
            clock_hz: 100_000_000,
            caps: Capabilities::default(),
            memory: MemoryMap::default(),
        }
    }
}

impl MonitorConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
