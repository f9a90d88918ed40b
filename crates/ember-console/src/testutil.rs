//! Shared helpers for the command-module tests.

use ember_soc::sim::SimSoc;
use ember_soc::{BlockDevice, I2cBus, SdramControl, SimControl};
use ember_types::config::MonitorConfig;

use crate::registry::Env;

/// A board with every capability enabled, so each command module can be
/// exercised against the same fixture.
pub fn make_soc() -> SimSoc {
    let mut cfg = MonitorConfig::default();
    cfg.ident = "Ember test SoC 2026".to_string();
    cfg.clock_hz = 50_000_000;
    cfg.caps.sdcard = true;
    cfg.caps.ethernet = true;
    cfg.caps.sim = true;
    cfg.caps.l2_cache = true;
    SimSoc::from_config(&cfg)
}

/// Borrow the board's peripherals into a handler environment.
pub fn make_env<'a>(out: &'a mut String, soc: &'a mut SimSoc) -> Env<'a> {
    Env {
        out,
        bus: &mut soc.bus,
        sys: &mut soc.sys,
        cache: &mut soc.cache,
        i2c: soc.i2c.as_mut().map(|x| x as &mut dyn I2cBus),
        sdram: soc.sdram.as_mut().map(|x| x as &mut dyn SdramControl),
        card: soc.card.as_mut().map(|x| x as &mut dyn BlockDevice),
        sim: soc.sim.as_mut().map(|x| x as &mut dyn SimControl),
    }
}
