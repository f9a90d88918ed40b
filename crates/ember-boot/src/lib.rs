//! Boot-medium fallback sequencing.
//!
//! At startup the monitor builds an ordered list of boot methods from the
//! capability configuration and runs them in sequence: the first success
//! wins, exhaustion falls through to the interactive console.

pub mod methods;
pub mod sequencer;

pub use methods::{build_boot_methods, wrap_image, FlashBoot, NetBoot, RomBoot, SdCardBoot, SerialBoot};
pub use sequencer::{BootAttempt, BootEnv, BootMethod, BootOutcome, BootSequencer, LoadedImage, SequencerState};
