//! The fallback sequencer: try each boot method in order until one
//! succeeds, or run out and hand control back to the caller.

use ember_soc::{BlockDevice, MemoryBus, NetLoader, SerialLoader, SpiFlash};
use ember_types::error::Result;

/// A program image ready for control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    /// Address execution would start at.
    pub entry: u32,
    /// Payload size in bytes.
    pub size: usize,
}

/// Peripheral access handed to each boot attempt.
pub struct BootEnv<'a> {
    pub bus: &'a mut dyn MemoryBus,
    /// Where downloaded images are copied before control transfer.
    pub load_addr: u32,
    pub serial: Option<&'a mut dyn SerialLoader>,
    pub flash: Option<&'a mut dyn SpiFlash>,
    pub card: Option<&'a mut dyn BlockDevice>,
    pub net: Option<&'a mut dyn NetLoader>,
}

/// One candidate boot source.
///
/// Attempts must be self-contained: a failed attempt leaves no state behind
/// that could corrupt the next method's preconditions.
pub trait BootAttempt {
    fn attempt(&mut self, env: &mut BootEnv<'_>) -> Result<LoadedImage>;
}

/// A labelled entry in the fallback chain. Priority is the position in the
/// list, fixed when the list is built.
pub struct BootMethod {
    pub label: &'static str,
    attempt: Box<dyn BootAttempt>,
}

impl BootMethod {
    pub fn new(label: &'static str, attempt: Box<dyn BootAttempt>) -> Self {
        Self { label, attempt }
    }
}

/// Observable sequencer state. `Trying(i)` means method `i` is the next to
/// attempt; a sequencer over a non-empty chain starts in `Trying(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Trying(usize),
    Succeeded(usize),
    Exhausted,
}

/// Terminal result of a sequencer pass.
#[derive(Debug)]
pub enum BootOutcome {
    Succeeded {
        label: &'static str,
        image: LoadedImage,
    },
    Exhausted,
}

/// Runs the fallback chain: first success wins, failures advance, running
/// out is reported once and is not fatal.
pub struct BootSequencer {
    methods: Vec<BootMethod>,
    state: SequencerState,
}

impl BootSequencer {
    /// An empty chain has nothing to try and constructs already exhausted.
    pub fn new(methods: Vec<BootMethod>) -> Self {
        let state = if methods.is_empty() {
            SequencerState::Exhausted
        } else {
            SequencerState::Trying(0)
        };
        Self { methods, state }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Run the attempt at the current index, advancing the state machine.
    /// Returns the image when that attempt succeeds; in a terminal state
    /// this is a no-op returning `None`.
    pub fn step(&mut self, env: &mut BootEnv<'_>) -> Option<LoadedImage> {
        let i = match self.state {
            SequencerState::Trying(i) => i,
            SequencerState::Succeeded(_) | SequencerState::Exhausted => return None,
        };
        let method = &mut self.methods[i];
        match method.attempt.attempt(env) {
            Ok(image) => {
                log::info!("booting from {} ({} bytes)", method.label, image.size);
                self.state = SequencerState::Succeeded(i);
                Some(image)
            },
            Err(e) => {
                log::debug!("{} boot failed: {e}", method.label);
                self.state = if i + 1 < self.methods.len() {
                    SequencerState::Trying(i + 1)
                } else {
                    SequencerState::Exhausted
                };
                None
            },
        }
    }

    /// Run to a terminal state. Consuming `self` makes the single-pass
    /// contract explicit: a sequencer cannot be re-run.
    pub fn run(mut self, env: &mut BootEnv<'_>) -> BootOutcome {
        loop {
            if let Some(image) = self.step(env) {
                let label = match self.state {
                    SequencerState::Succeeded(i) => self.methods[i].label,
                    _ => "",
                };
                return BootOutcome::Succeeded { label, image };
            }
            if self.state == SequencerState::Exhausted {
                return BootOutcome::Exhausted;
            }
        }
    }
}
