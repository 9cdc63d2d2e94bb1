//! Sega 8-bit machine bus
//!
//! `SmsBus` aggregates everything the CPU can reach: the memory mapper, the
//! VDP, the sound chips and the controller latches. It implements
//! [`MemoryZ80`] so the CPU core calls straight into it.
//!
//! I/O Ports (Master System / Game Gear / SG-1000):
//! - 0x00: Game Gear start button
//! - 0x3E: Memory control
//! - 0x7E/0x7F: V/H counter (read), PSG (write)
//! - 0xBE: VDP data port
//! - 0xBF: VDP control/status port
//! - 0xDC/0xDD (0xC0/0xC1): Controller ports
//! - 0xF0-0xF2: FM unit
//!
//! ColecoVision decodes only the top three port bits: 0xA0-0xBF reach the
//! VDP and 0xE0-0xFF the PSG and joystick.

use crate::config::{Machine, SmsConfig};
use crate::counters;
use crate::mapper::Mapper;
use crate::vdp::Vdp;
use emu_core::apu::{NullSoundChip, SoundChip};
use emu_core::cpu_z80::MemoryZ80;
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::AudioSample;

/// Memory control bit that disconnects the controller ports
const IO_DISABLE: u8 = 0x04;

pub struct SmsBus {
    machine: Machine,
    pub(crate) mapper: Mapper,
    pub(crate) vdp: Vdp,

    psg: Box<dyn SoundChip>,
    fm: Option<Box<dyn SoundChip>>,
    fm_unit: bool,
    fm_detect: u8,

    // Controller state, active low
    controller_1: u8,
    controller_2: u8,
    start_pressed: bool,

    memory_control: u8,

    // Beam position for the counter ports
    scanline: u16,
    line_start_cycle: u32,
    burst_cycles: u32,
}

impl SmsBus {
    pub fn new(config: &SmsConfig, rom: Vec<u8>) -> Self {
        let machine = config.machine;
        Self {
            machine,
            mapper: Mapper::new(machine, rom),
            vdp: Vdp::new(machine.video_mode(), machine == Machine::GameGear),
            psg: Box::new(NullSoundChip),
            fm: None,
            fm_unit: config.fm_unit,
            fm_detect: 0,
            controller_1: 0xFF,
            controller_2: 0xFF,
            start_pressed: false,
            memory_control: 0,
            scanline: 0,
            line_start_cycle: 0,
            burst_cycles: 0,
        }
    }

    /// Return every component to power-on state; controller latches are kept
    pub fn reset(&mut self) {
        self.mapper.reset();
        self.vdp.reset();
        self.psg.reset();
        if let Some(fm) = self.fm.as_mut() {
            fm.reset();
        }
        self.fm_detect = 0;
        self.memory_control = 0;
        self.scanline = 0;
        self.line_start_cycle = 0;
        self.burst_cycles = 0;
    }

    pub fn machine(&self) -> Machine {
        self.machine
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn mapper_mut(&mut self) -> &mut Mapper {
        &mut self.mapper
    }

    pub fn vdp(&self) -> &Vdp {
        &self.vdp
    }

    pub fn vdp_mut(&mut self) -> &mut Vdp {
        &mut self.vdp
    }

    pub fn set_psg(&mut self, psg: Box<dyn SoundChip>) {
        self.psg = psg;
    }

    pub fn set_fm(&mut self, fm: Box<dyn SoundChip>) {
        self.fm = Some(fm);
    }

    /// Mix one output sample from the PSG and, when attached, the FM unit
    pub fn sample(&mut self) -> AudioSample {
        let psg = self.psg.sample();
        match self.fm.as_mut() {
            Some(fm) => psg.saturating_add(fm.sample()),
            None => psg,
        }
    }

    /// Set controller 1 state (active low)
    pub fn set_controller_1(&mut self, state: u8) {
        self.controller_1 = state;
    }

    /// Set controller 2 state (active low)
    pub fn set_controller_2(&mut self, state: u8) {
        self.controller_2 = state;
    }

    /// Game Gear start button
    pub fn set_start_button(&mut self, pressed: bool) {
        self.start_pressed = pressed;
    }

    pub fn memory_control(&self) -> u8 {
        self.memory_control
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    /// Position the beam for the next execution burst.
    ///
    /// `start_cycle` is how far into the line the CPU already is when the
    /// burst begins (non-zero after an instruction overran the last line).
    pub fn begin_line(&mut self, scanline: u16, start_cycle: u32) {
        self.scanline = scanline;
        self.line_start_cycle = start_cycle;
        self.burst_cycles = 0;
    }

    pub fn v_counter(&self) -> u8 {
        counters::v_counter(self.scanline)
    }

    pub fn h_counter(&self) -> u8 {
        counters::h_counter(self.line_start_cycle + self.burst_cycles)
    }

    fn controller_port(&self, state: u8) -> u8 {
        if self.memory_control & IO_DISABLE != 0 {
            0xFF
        } else {
            state
        }
    }

    fn sega_io_read(&mut self, port: u8) -> u8 {
        match port {
            0x00 if self.machine == Machine::GameGear => {
                if self.start_pressed {
                    0x7F
                } else {
                    0xFF
                }
            }
            0x7E => self.v_counter(),
            0x7F => self.h_counter(),
            0xBE => self.vdp.read_data(),
            0xBF => self.vdp.read_status(),
            0xC0 | 0xDC => self.controller_port(self.controller_1),
            0xC1 | 0xDD => self.controller_port(self.controller_2),
            0xF2 => {
                if self.fm_unit {
                    self.fm_detect
                } else {
                    0xFF
                }
            }
            _ => {
                log(LogCategory::Io, LogLevel::Debug, || {
                    format!("IO: read from unmapped port {:02X}", port)
                });
                0xFF
            }
        }
    }

    fn sega_io_write(&mut self, port: u8, val: u8) {
        match port {
            0x3E => {
                self.memory_control = val;
                if val & !IO_DISABLE != 0 {
                    log(LogCategory::Stubs, LogLevel::Debug, || {
                        format!("IO: memory control {:02X} (only I/O disable is emulated)", val)
                    });
                }
            }
            0x7E | 0x7F => self.psg.write(port, val),
            0xBE | 0xBF => self.vdp.write_port(port & 1 != 0, val),
            0xF0 | 0xF1 => {
                if let Some(fm) = self.fm.as_mut() {
                    fm.write(port, val);
                }
            }
            0xF2 => self.fm_detect = val & 3,
            _ => {
                log(LogCategory::Io, LogLevel::Debug, || {
                    format!("IO: write {:02X} to unmapped port {:02X}", val, port)
                });
            }
        }
    }

    fn coleco_io_read(&mut self, port: u8) -> u8 {
        match port & 0xE0 {
            0xA0 => self.vdp.read_port(port & 1 == 0),
            0xE0 => {
                if port & 0x02 != 0 {
                    0xFF
                } else {
                    self.controller_1
                }
            }
            _ => {
                log(LogCategory::Io, LogLevel::Debug, || {
                    format!("IO: read from unmapped port {:02X}", port)
                });
                0xFF
            }
        }
    }

    fn coleco_io_write(&mut self, port: u8, val: u8) {
        match port & 0xE0 {
            0xA0 => self.vdp.write_port(port & 1 != 0, val),
            0xE0 => self.psg.write(port, val),
            _ => {
                log(LogCategory::Io, LogLevel::Debug, || {
                    format!("IO: write {:02X} to unmapped port {:02X}", val, port)
                });
            }
        }
    }
}

impl MemoryZ80 for SmsBus {
    fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.mapper.write(addr, val);
    }

    fn io_read(&mut self, port: u8) -> u8 {
        match self.machine {
            Machine::ColecoVision => self.coleco_io_read(port),
            _ => self.sega_io_read(port),
        }
    }

    fn io_write(&mut self, port: u8, val: u8) {
        match self.machine {
            Machine::ColecoVision => self.coleco_io_write(port, val),
            _ => self.sega_io_write(port, val),
        }
    }

    fn sync(&mut self, cycles_into_burst: u32) {
        self.burst_cycles = cycles_into_burst;
    }
}
