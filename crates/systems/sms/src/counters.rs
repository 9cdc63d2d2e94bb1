//! V/H beam counters
//!
//! The counters the CPU reads through ports 0x7E/0x7F are not linear: on an
//! NTSC machine the vertical counter jumps from 0xDA back to 0xD5 and the
//! horizontal counter from 0xE9 back to 0x93, so both are served from fixed
//! tables.

use emu_core::apu::TimingMode;

pub const LINES_PER_FRAME: usize = 262;
pub const H_COUNTER_STEPS: usize = 343;

pub static V_COUNTER: [u8; LINES_PER_FRAME] = build_v_counter();
pub static H_COUNTER: [u8; H_COUNTER_STEPS] = build_h_counter();

const fn build_v_counter() -> [u8; LINES_PER_FRAME] {
    let mut table = [0u8; LINES_PER_FRAME];
    let mut line = 0;
    while line < LINES_PER_FRAME {
        table[line] = (if line <= 0xDA { line } else { line - 6 }) as u8;
        line += 1;
    }
    table
}

const fn build_h_counter() -> [u8; H_COUNTER_STEPS] {
    let mut table = [0u8; H_COUNTER_STEPS];
    let mut step = 0;
    while step < H_COUNTER_STEPS {
        table[step] = (if step <= 0xE9 { step } else { step - 0x57 }) as u8;
        step += 1;
    }
    table
}

/// Value of the V counter while `scanline` is being drawn
pub fn v_counter(scanline: u16) -> u8 {
    V_COUNTER[scanline as usize % LINES_PER_FRAME]
}

/// Value of the H counter `cycle_in_line` CPU cycles into a scanline
pub fn h_counter(cycle_in_line: u32) -> u8 {
    let cycles_per_line = TimingMode::Ntsc.cycles_per_line();
    // Pixel clock runs at 3/2 the CPU clock; the counter ticks every two pixels
    let pixel = (cycle_in_line % cycles_per_line) * 3 / 2;
    H_COUNTER[(pixel >> 1) as usize % H_COUNTER_STEPS]
}
