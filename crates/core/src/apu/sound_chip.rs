//! Sound chip trait for pluggable audio implementations.
//!
//! A console wires one or more chips (a PSG, optionally an FM unit) to its
//! I/O ports. The emulation thread only ever calls [`SoundChip::write`];
//! the audio side calls [`SoundChip::sample`] at the output sample rate.

use crate::types::AudioSample;

/// A write-only audio chip driven through I/O ports.
pub trait SoundChip {
    /// Write a byte to one of the chip's ports
    fn write(&mut self, port: u8, value: u8);

    /// Reset the chip to power-on state
    fn reset(&mut self);

    /// Produce the next output sample
    fn sample(&mut self) -> AudioSample;

    /// Generate multiple samples efficiently
    fn generate_samples(&mut self, count: usize) -> Vec<AudioSample> {
        (0..count).map(|_| self.sample()).collect()
    }
}

/// Chip that accepts every write and outputs silence.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSoundChip;

impl SoundChip for NullSoundChip {
    fn write(&mut self, _port: u8, _value: u8) {}

    fn reset(&mut self) {}

    fn sample(&mut self) -> AudioSample {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ramp {
        level: i16,
        writes: Vec<(u8, u8)>,
    }

    impl SoundChip for Ramp {
        fn write(&mut self, port: u8, value: u8) {
            self.writes.push((port, value));
        }

        fn reset(&mut self) {
            self.level = 0;
            self.writes.clear();
        }

        fn sample(&mut self) -> AudioSample {
            self.level += 1;
            self.level
        }
    }

    #[test]
    fn test_null_chip_is_silent() {
        let mut chip = NullSoundChip;
        chip.write(0x7F, 0x9F);
        assert_eq!(chip.generate_samples(16), vec![0; 16]);
    }

    #[test]
    fn test_generate_samples_pulls_in_order() {
        let mut chip = Ramp {
            level: 0,
            writes: vec![],
        };
        chip.write(0x7F, 0x80);
        assert_eq!(chip.generate_samples(3), vec![1, 2, 3]);
        assert_eq!(chip.writes, vec![(0x7F, 0x80)]);

        chip.reset();
        assert_eq!(chip.sample(), 1);
        assert!(chip.writes.is_empty());
    }
}
