//! Peripheral service traits and simulated SoC.
//!
//! Every hardware block the monitor touches is a trait here; the console and
//! boot crates only see these boundaries. `sim` provides an in-memory
//! implementation of each trait, used by the demo binary and by tests.

pub mod services;
pub mod sim;

pub use services::{
    BlockDevice, CacheControl, I2cBus, MemoryBus, NetLoader, SdramControl, SerialLoader,
    SimControl, SpiFlash, SysControl, BLOCK_SIZE,
};
pub use sim::{I2cTransaction, SimSoc};
