//! Scanline compositing for both VDP modes
//!
//! Each visible line is rendered into one row of palette indices. Mode 4
//! indices select CRAM entries (0-15 background bank, 16-31 sprite bank);
//! legacy indices select the fixed 16-colour TMS palette.

use crate::vdp::{mode1, mode2, Status, Vdp, VideoMode, SCREEN_HEIGHT, SCREEN_WIDTH};

const VRAM_MASK: usize = 0x3FFF;

/// Raw Y value that ends the sprite list
const SPRITE_TERMINATOR: u8 = 0xD0;

const MODE4_SPRITES: usize = 64;
const MODE4_SPRITES_PER_LINE: usize = 8;
const LEGACY_SPRITES: usize = 32;
const LEGACY_SPRITES_PER_LINE: usize = 4;

// Nametable word attributes
const TILE_HFLIP: u16 = 1 << 9;
const TILE_VFLIP: u16 = 1 << 10;
const TILE_PALETTE: u16 = 1 << 11;
const TILE_PRIORITY: u16 = 1 << 12;

/// Columns that may hold a sprite pixel, with room for the edge overrun
type LineMask = [bool; SCREEN_WIDTH + 8];

impl Vdp {
    /// Composite one scanline into `row` (one palette index per pixel).
    ///
    /// Lines past the active display are left untouched.
    pub fn render_scanline(&mut self, line: u16, row: &mut [u8]) {
        let line = line as usize;
        if line >= SCREEN_HEIGHT || row.len() < SCREEN_WIDTH {
            return;
        }

        match self.mode {
            VideoMode::SmsMode4 => self.render_mode4_line(line, row),
            VideoMode::Legacy => self.render_legacy_line(line, row),
        }
    }

    fn vram_at(&self, addr: usize) -> u8 {
        self.vram[addr & VRAM_MASK]
    }

    fn planes_at(&self, addr: usize) -> [u8; 4] {
        [
            self.vram_at(addr),
            self.vram_at(addr + 1),
            self.vram_at(addr + 2),
            self.vram_at(addr + 3),
        ]
    }

    fn sprite_height(&self) -> i32 {
        if self.registers[1] & mode2::LARGE_SPRITES != 0 {
            16
        } else {
            8
        }
    }

    fn render_mode4_line(&mut self, line: usize, row: &mut [u8]) {
        let mut priority: LineMask = [false; SCREEN_WIDTH + 8];

        self.render_mode4_background(line, row, &mut priority);
        self.render_mode4_sprites(line, row, &priority);

        if self.registers[0] & mode1::HIDE_LEFT_COLUMN != 0 {
            row[..8].fill(16 + (self.registers[7] & 0x0F));
        }
    }

    fn render_mode4_background(&self, line: usize, row: &mut [u8], priority: &mut LineMask) {
        let r0 = self.registers[0];
        let hscroll = if r0 & mode1::HSCROLL_LOCK != 0 && line < 16 {
            0
        } else {
            self.registers[8]
        };
        let tile_shift = (hscroll >> 3) as usize;
        let fine = (hscroll & 7) as usize;

        for column in 0..32 {
            let vscroll = if r0 & mode1::VSCROLL_LOCK != 0 && column >= 24 {
                0
            } else {
                self.frame_vscroll
            };
            let offset = (vscroll as usize + line) % 224;
            let screen_row = offset / 8;
            let tile_row = offset & 7;

            let entry = self.nametable_base as usize
                + screen_row * 64
                + ((column + 32 - tile_shift) & 31) * 2;
            let info = u16::from_le_bytes([self.vram_at(entry), self.vram_at(entry + 1)]);

            let pattern_row = if info & TILE_VFLIP != 0 {
                tile_row ^ 7
            } else {
                tile_row
            };
            let planes = self.planes_at((info & 0x1FF) as usize * 32 + pattern_row * 4);
            let palette = if info & TILE_PALETTE != 0 { 16 } else { 0 };
            let has_priority = info & TILE_PRIORITY != 0;

            for i in 0..8 {
                let bit = if info & TILE_HFLIP != 0 { i } else { 7 - i };
                let color = planar_pixel(&planes, bit);
                let x = (column * 8 + fine + i) % SCREEN_WIDTH;
                row[x] = palette + color;
                priority[x] = has_priority && color != 0;
            }
        }
    }

    fn render_mode4_sprites(&mut self, line: usize, row: &mut [u8], priority: &LineMask) {
        let height = self.sprite_height();
        let shift = if self.registers[0] & mode1::SHIFT_SPRITES_LEFT != 0 {
            8
        } else {
            0
        };
        let bank = if self.registers[6] & 0x04 != 0 { 256 } else { 0 };
        let table = self.sprite_table_base as usize;
        let line = line as i32;

        let mut drawn: LineMask = [false; SCREEN_WIDTH + 8];
        let mut on_line = 0;

        for index in 0..MODE4_SPRITES {
            let raw_y = self.vram_at(table + index);
            if raw_y == SPRITE_TERMINATOR {
                break;
            }
            let top = sprite_top(raw_y);
            if line < top || line >= top + height {
                continue;
            }

            on_line += 1;
            if on_line > MODE4_SPRITES_PER_LINE {
                self.status.insert(Status::SPRITE_OVERFLOW);
            }

            let x = self.vram_at(table + 128 + index * 2) as i32 - shift;
            let mut tile = self.vram_at(table + 129 + index * 2) as usize;
            if height == 16 {
                tile &= !1;
            }
            let planes = self.planes_at((bank + tile) * 32 + (line - top) as usize * 4);

            for i in 0..8 {
                let color = planar_pixel(&planes, 7 - i);
                if color == 0 {
                    continue;
                }
                if let Some(px) = self.claim_sprite_pixel(x + i as i32, &mut drawn) {
                    if !priority[px] {
                        row[px] = 16 + color;
                    }
                }
            }
        }
    }

    fn render_legacy_line(&mut self, line: usize, row: &mut [u8]) {
        let r = self.registers;
        let nametable = ((r[2] & 0x0F) as usize) << 10;
        let pattern_table = ((r[4] & 0x04) as usize) << 11;
        let color_table = ((r[3] & 0x80) as usize) << 6;
        let region = ((r[4] & 0x03) as usize) << 8;
        let backdrop = r[7] & 0x0F;

        let name_row = (line / 8) * 32;
        let tile_row = line & 7;

        for column in 0..32 {
            let name = self.vram_at(nametable + name_row + column) as usize;
            let tile = (name | (region & 0x300 & (name_row + column))) * 8 + tile_row;
            let pattern = self.vram_at(pattern_table + tile);
            let colors = self.vram_at(color_table + tile);

            for i in 0..8 {
                let color = if pattern >> (7 - i) & 1 != 0 {
                    colors >> 4
                } else {
                    colors & 0x0F
                };
                row[column * 8 + i] = if color == 0 { backdrop } else { color };
            }
        }

        self.render_legacy_sprites(line as i32, row);
    }

    fn render_legacy_sprites(&mut self, line: i32, row: &mut [u8]) {
        let height = self.sprite_height();
        let table = ((self.registers[5] & 0x7F) as usize) << 7;
        let patterns = ((self.registers[6] & 0x07) as usize) << 11;

        let mut drawn: LineMask = [false; SCREEN_WIDTH + 8];
        let mut on_line = 0;

        for index in 0..LEGACY_SPRITES {
            let entry = table + index * 4;
            let raw_y = self.vram_at(entry);
            if raw_y == SPRITE_TERMINATOR {
                break;
            }
            let top = sprite_top(raw_y);
            if line < top || line >= top + height {
                continue;
            }

            on_line += 1;
            if on_line > LEGACY_SPRITES_PER_LINE {
                self.status.insert(Status::SPRITE_OVERFLOW);
            }

            let attr = self.vram_at(entry + 3);
            let color = attr & 0x0F;
            if color == 0 {
                continue;
            }
            // Early clock bit moves the sprite 32 pixels left
            let x = self.vram_at(entry + 1) as i32 - if attr & 0x80 != 0 { 32 } else { 0 };
            let name = self.vram_at(entry + 2) as usize;
            let sprite_row = (line - top) as usize;

            let mut columns = [0u8; 2];
            if height == 16 {
                let addr = patterns + (name & 0xFC) * 8 + sprite_row;
                columns = [self.vram_at(addr), self.vram_at(addr + 16)];
            } else {
                columns[0] = self.vram_at(patterns + name * 8 + sprite_row);
            }
            let width = if height == 16 { 16 } else { 8 };

            for i in 0..width {
                let pattern = columns[i / 8];
                if pattern >> (7 - i % 8) & 1 == 0 {
                    continue;
                }
                if let Some(px) = self.claim_sprite_pixel(x + i as i32, &mut drawn) {
                    row[px] = color;
                }
            }
        }
    }

    /// Reserve an on-screen column for an opaque sprite pixel.
    ///
    /// Returns `None` when the column is off screen or an earlier (higher
    /// priority) sprite already owns it; the latter raises the collision flag.
    fn claim_sprite_pixel(&mut self, x: i32, drawn: &mut LineMask) -> Option<usize> {
        if !(0..SCREEN_WIDTH as i32).contains(&x) {
            return None;
        }
        let px = x as usize;
        if drawn[px] {
            self.status.insert(Status::SPRITE_COLLISION);
            return None;
        }
        drawn[px] = true;
        Some(px)
    }
}

/// First line of a sprite; Y values near the bottom wrap to partially visible at the top
fn sprite_top(raw_y: u8) -> i32 {
    let top = raw_y as i32 + 1;
    if top > SCREEN_HEIGHT as i32 {
        top - 256
    } else {
        top
    }
}

fn planar_pixel(planes: &[u8; 4], bit: usize) -> u8 {
    (planes[0] >> bit & 1)
        | (planes[1] >> bit & 1) << 1
        | (planes[2] >> bit & 1) << 2
        | (planes[3] >> bit & 1) << 3
}
