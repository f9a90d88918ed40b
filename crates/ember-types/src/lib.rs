//! Foundation types for the Ember monitor.
//!
//! This crate contains the pieces shared by every other Ember crate: the
//! error taxonomy, the capability/board configuration consulted when the
//! command table and boot-method list are built, and the CRC32 routine used
//! by both the console and the boot-image check.

pub mod config;
pub mod crc;
pub mod error;
