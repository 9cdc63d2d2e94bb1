//! Sega Master System Video Display Processor (VDP)
//!
//! The VDP is based on the Texas Instruments TMS9918A and handles all video output.
//!
//! # Features
//! - 256×192 pixel resolution
//! - 64 color palette (32 simultaneous), 4096 colors on the Game Gear
//! - Tilemap-based background rendering (mode 4) plus the legacy TMS9918A mode
//! - 64 sprites with priority against the background
//! - Scrolling support with the top-row and right-column locks
//! - Line and frame interrupts
//!
//! This module owns the port protocol and VRAM/CRAM state. Scanline
//! compositing lives in `vdp_renderer`.

use bitflags::bitflags;
use emu_core::logging::{log, LogCategory, LogLevel};
use serde::Serialize;

pub const VRAM_SIZE: usize = 0x4000;
pub const CRAM_SIZE: usize = 64;
pub const PALETTE_SIZE: usize = 64;
pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 192;
pub const REGISTER_COUNT: usize = 11;

const VRAM_WRAP: u16 = (VRAM_SIZE - 1) as u16;

/// Register contents at power-on
const POWER_ON_REGISTERS: [u8; REGISTER_COUNT] = [
    0x04, 0x20, 0xF1, 0xFF, 0x03, 0x81, 0xFB, 0x00, 0x00, 0x00, 0xFF,
];

/// Table locations at power-on; the registers only take over once one is written
const POWER_ON_NAMETABLE: u16 = 0x3800;
const POWER_ON_SPRITE_TABLE: u16 = 0x3C00;

/// Fixed TMS9918A colours used by the legacy mode
pub const TMS_PALETTE: [u32; 16] = [
    0xFF000000, 0xFF000000, 0xFF21C942, 0xFF5EDC78, 0xFF5455ED, 0xFF7D75FC, 0xFFD3524D,
    0xFF43EBF6, 0xFFFD5554, 0xFFFF7978, 0xFFD3C153, 0xFFE5CE80, 0xFF21B03C, 0xFFC95BBA,
    0xFFCCCCCC, 0xFFFFFFFF,
];

bitflags! {
    /// VDP status register (read through the control port)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        const VSYNC_PENDING = 0x80;
        const SPRITE_OVERFLOW = 0x40;
        const SPRITE_COLLISION = 0x20;
    }
}

/// Register 0 bits (mode 4)
pub mod mode1 {
    pub const SHIFT_SPRITES_LEFT: u8 = 0x08;
    pub const LINE_INTERRUPT: u8 = 0x10;
    pub const HIDE_LEFT_COLUMN: u8 = 0x20;
    pub const HSCROLL_LOCK: u8 = 0x40;
    pub const VSCROLL_LOCK: u8 = 0x80;
}

/// Register 1 bits
pub mod mode2 {
    pub const LARGE_SPRITES: u8 = 0x02;
    pub const FRAME_INTERRUPT: u8 = 0x20;
}

/// Which scanline renderer the VDP runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum VideoMode {
    /// TMS9918A Graphics II, as used by the SG-1000 and ColecoVision
    Legacy,
    /// SMS/GG 4bpp tile mode
    #[default]
    SmsMode4,
}

/// Two-write control port sequencing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ControlLatch {
    #[default]
    ExpectFirstByte,
    ExpectSecondByte,
}

/// Operation selected by the top two bits of the control word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Code {
    VramRead = 0,
    VramWrite = 1,
    RegisterWrite = 2,
    CramWrite = 3,
}

impl Code {
    fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Code::VramRead,
            1 => Code::VramWrite,
            2 => Code::RegisterWrite,
            _ => Code::CramWrite,
        }
    }
}

/// VDP state
pub struct Vdp {
    pub(crate) vram: Vec<u8>,
    cram: [u8; CRAM_SIZE],
    pub(crate) registers: [u8; REGISTER_COUNT],
    pub(crate) status: Status,

    latch: ControlLatch,
    control_word: u16,
    code: Code,
    address: u16,
    read_buffer: u8,

    pub(crate) nametable_base: u16,
    pub(crate) sprite_table_base: u16,

    pub(crate) mode: VideoMode,
    game_gear: bool,
    color_latch: u8,

    // Vertical scroll only takes effect between frames
    pub(crate) frame_vscroll: u8,

    palette: [u32; PALETTE_SIZE],
}

impl Vdp {
    pub fn new(mode: VideoMode, game_gear: bool) -> Self {
        let mut vdp = Self {
            vram: vec![0; VRAM_SIZE],
            cram: [0; CRAM_SIZE],
            registers: POWER_ON_REGISTERS,
            status: Status::empty(),
            latch: ControlLatch::ExpectFirstByte,
            control_word: 0,
            code: Code::VramRead,
            address: 0,
            read_buffer: 0,
            nametable_base: 0,
            sprite_table_base: 0,
            mode,
            game_gear,
            color_latch: 0,
            frame_vscroll: 0,
            palette: [0xFF000000; PALETTE_SIZE],
        };
        vdp.reset();
        vdp
    }

    /// Return to power-on state; VRAM and CRAM are cleared
    pub fn reset(&mut self) {
        self.vram.fill(0);
        self.cram.fill(0);
        self.registers = POWER_ON_REGISTERS;
        self.status = Status::empty();
        self.latch = ControlLatch::ExpectFirstByte;
        self.control_word = 0;
        self.code = Code::VramRead;
        self.address = 0;
        self.read_buffer = 0;
        self.color_latch = 0;
        self.nametable_base = POWER_ON_NAMETABLE;
        self.sprite_table_base = POWER_ON_SPRITE_TABLE;
        self.frame_vscroll = 0;

        self.palette = [0xFF000000; PALETTE_SIZE];
        if self.mode == VideoMode::Legacy {
            self.palette[..TMS_PALETTE.len()].copy_from_slice(&TMS_PALETTE);
        }
    }

    /// Write one of the two VDP ports
    pub fn write_port(&mut self, is_control: bool, value: u8) {
        if is_control {
            self.write_control(value);
        } else {
            self.write_data(value);
        }
    }

    /// Read one of the two VDP ports
    pub fn read_port(&mut self, is_data: bool) -> u8 {
        if is_data {
            self.read_data()
        } else {
            self.read_status()
        }
    }

    /// Write to the control port
    pub fn write_control(&mut self, value: u8) {
        match self.latch {
            ControlLatch::ExpectFirstByte => {
                self.control_word = value as u16;
                self.latch = ControlLatch::ExpectSecondByte;
            }
            ControlLatch::ExpectSecondByte => {
                self.control_word |= (value as u16) << 8;
                self.latch = ControlLatch::ExpectFirstByte;

                self.code = Code::from_bits((self.control_word >> 14) as u8);
                self.address = self.control_word & VRAM_WRAP;

                match self.code {
                    Code::VramRead => self.read_buffer = self.fetch_and_advance(),
                    Code::RegisterWrite => self.write_register(value & 0x0F, self.control_word as u8),
                    _ => {}
                }
            }
        }
    }

    /// Write to the data port
    pub fn write_data(&mut self, value: u8) {
        self.latch = ControlLatch::ExpectFirstByte;
        self.read_buffer = value;

        if self.code == Code::CramWrite {
            self.write_cram(value);
        } else {
            self.vram[self.address as usize] = value;
        }

        self.advance();
    }

    /// Read from the data port; the byte returned lags the address by one access
    pub fn read_data(&mut self) -> u8 {
        self.latch = ControlLatch::ExpectFirstByte;
        let value = self.read_buffer;
        self.read_buffer = self.fetch_and_advance();
        value
    }

    /// Read the status register, clearing the pending flags
    pub fn read_status(&mut self) -> u8 {
        let status = self.status.bits();
        self.latch = ControlLatch::ExpectFirstByte;
        self.status.remove(Status::VSYNC_PENDING | Status::SPRITE_OVERFLOW | Status::SPRITE_COLLISION);
        status
    }

    fn write_register(&mut self, reg: u8, value: u8) {
        let Some(slot) = self.registers.get_mut(reg as usize) else {
            log(LogCategory::Vdp, LogLevel::Debug, || {
                format!("VDP: write to nonexistent register R{} = {:02X}", reg, value)
            });
            return;
        };
        *slot = value;

        // Any register write re-derives both table pointers
        self.nametable_base = nametable_base(self.registers[2]);
        self.sprite_table_base = sprite_table_base(self.registers[5]);

        log(LogCategory::Vdp, LogLevel::Debug, || {
            format!("VDP: R{} = {:02X}", reg, value)
        });
    }

    fn write_cram(&mut self, value: u8) {
        if self.game_gear {
            let index = (self.address as usize) & (CRAM_SIZE - 1);
            self.cram[index] = value;
            // Colours are 12 bits wide; the even byte is held until its odd partner arrives
            if index & 1 == 0 {
                self.color_latch = value;
            } else {
                let color = self.color_latch as u16 | (value as u16) << 8;
                self.palette[index >> 1] = decode_gg_color(color);
            }
        } else {
            let index = (self.address as usize) & 0x1F;
            self.cram[index] = value;
            self.palette[index] = decode_sms_color(value);
        }
    }

    fn fetch_and_advance(&mut self) -> u8 {
        let value = self.vram[self.address as usize];
        self.advance();
        value
    }

    fn advance(&mut self) {
        self.address = (self.address + 1) & VRAM_WRAP;
    }

    /// Capture once-per-frame state ahead of line 0
    pub fn begin_frame(&mut self) {
        self.frame_vscroll = self.registers[9];
    }

    pub fn set_vsync_pending(&mut self) {
        self.status.insert(Status::VSYNC_PENDING);
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn register(&self, reg: usize) -> u8 {
        self.registers.get(reg).copied().unwrap_or(0)
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn latch(&self) -> ControlLatch {
        self.latch
    }

    pub fn mode(&self) -> VideoMode {
        self.mode
    }

    pub fn nametable_base(&self) -> u16 {
        self.nametable_base
    }

    pub fn sprite_table_base(&self) -> u16 {
        self.sprite_table_base
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    pub fn cram(&self) -> &[u8] {
        &self.cram
    }

    /// Host palette (ARGB8888), updated as CRAM is written
    pub fn palette(&self) -> &[u32; PALETTE_SIZE] {
        &self.palette
    }

    pub fn line_interrupts_enabled(&self) -> bool {
        self.registers[0] & mode1::LINE_INTERRUPT != 0
    }

    pub fn frame_interrupts_enabled(&self) -> bool {
        self.registers[1] & mode2::FRAME_INTERRUPT != 0
    }
}

fn nametable_base(r2: u8) -> u16 {
    ((r2 as u16) << 10) & 0x3800
}

fn sprite_table_base(r5: u8) -> u16 {
    ((r5 as u16) << 7) & 0x3F00
}

/// Decode 6-bit SMS color (--BBGGRR) to 32-bit ARGB
pub fn decode_sms_color(color: u8) -> u32 {
    let r = (color & 0x03) as u32;
    let g = ((color >> 2) & 0x03) as u32;
    let b = ((color >> 4) & 0x03) as u32;

    // Scale 2-bit to 8-bit (0-3 -> 0-255)
    0xFF000000 | (r * 85) << 16 | (g * 85) << 8 | b * 85
}

/// Decode 12-bit Game Gear color (----BBBBGGGGRRRR) to 32-bit ARGB
pub fn decode_gg_color(color: u16) -> u32 {
    let r = (color & 0x0F) as u32;
    let g = ((color >> 4) & 0x0F) as u32;
    let b = ((color >> 8) & 0x0F) as u32;

    0xFF000000 | (r * 17) << 16 | (g * 17) << 8 | b * 17
}
