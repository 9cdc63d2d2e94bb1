//! Audio chip interfaces.
//!
//! Systems treat their sound hardware as a black box: the CPU side writes
//! bytes to chip ports, and the host pulls samples at its own cadence,
//! independently of video timing.
//!
//! ## Components
//!
//! - **SoundChip trait**: port writes, reset and sample generation
//! - **NullSoundChip**: silent chip for hosts without audio output
//! - **TimingMode**: NTSC/PAL clock rates for Z80-based consoles

pub mod sound_chip;
pub mod timing;

pub use sound_chip::{NullSoundChip, SoundChip};
pub use timing::TimingMode;
