//! Cartridge/system memory mapper
//!
//! Memory map (Master System / Game Gear):
//! - 0x0000-0x03FF: first 1KB of ROM, never paged
//! - 0x0400-0x3FFF: slot 1 (ROM page from 0xFFFD)
//! - 0x4000-0x7FFF: slot 2 (ROM page from 0xFFFE)
//! - 0x8000-0xBFFF: slot 3 (ROM page from 0xFFFF, or cartridge RAM via 0xFFFC)
//! - 0xC000-0xFFFF: 8KB system RAM, mirrored; 0xFFFC-0xFFFF also drive paging
//!
//! SG-1000 maps the ROM flat over 0x0000-0xBFFF with 2KB of RAM replicated
//! above it, and 8KB of cartridge RAM at 0x2000-0x3FFF. ColecoVision puts the BIOS at 0x0000, 1KB of RAM at 0x6000 and
//! the cartridge at 0x8000.
//!
//! Slots hold byte offsets into the ROM (or a cartridge RAM bank), never
//! pointers; every access masks the CPU address into the 16KB window and
//! wraps the result to the ROM size, so no guest value can index out of
//! bounds.

use crate::config::Machine;
use emu_core::logging::{log, LogCategory, LogLevel};
use serde::Serialize;

pub const PAGE_SIZE: usize = 0x4000;
pub const MAX_ROM_SIZE: usize = 1024 * 1024;

const BOOT_REGION_END: u16 = 0x0400;
const SEGA_RAM_SIZE: usize = 0x2000;
const SG1000_RAM_SIZE: usize = 0x0800;
// SG-1000 cartridge RAM window; backed by the cartridge RAM buffer
const SG1000_EXTRA_RAM_START: u16 = 0x2000;
const SG1000_EXTRA_RAM_END: u16 = 0x3FFF;
const COLECO_RAM_SIZE: usize = 0x0400;
const COLECO_BIOS_SIZE: usize = 0x2000;

/// What slot 3 (0x8000-0xBFFF) currently decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Slot3 {
    Rom,
    /// Cartridge RAM bank 0 or 1
    Ram(u8),
}

pub struct Mapper {
    machine: Machine,
    rom: Vec<u8>,
    bios: Vec<u8>,
    ram: Vec<u8>,
    cart_ram: Vec<u8>,

    // ROM byte offsets for slots 1..3
    slot_base: [usize; 3],
    slot3: Slot3,
    ram_select: Option<u8>,
    page_mask: u8,
}

impl Mapper {
    pub fn new(machine: Machine, rom: Vec<u8>) -> Self {
        let ram_size = match machine {
            Machine::MasterSystem | Machine::GameGear => SEGA_RAM_SIZE,
            Machine::Sg1000 => SG1000_RAM_SIZE,
            Machine::ColecoVision => COLECO_RAM_SIZE,
        };

        let mut mapper = Self {
            machine,
            page_mask: page_mask_for(rom.len()),
            rom,
            bios: Vec::new(),
            ram: vec![0; ram_size],
            cart_ram: vec![0; 2 * PAGE_SIZE],
            slot_base: [0, 0, 0],
            slot3: Slot3::Rom,
            ram_select: None,
        };
        mapper.reset();
        mapper
    }

    /// Return to power-on paging with all RAM cleared
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.cart_ram.fill(0);
        self.slot_base = [0, PAGE_SIZE, 2 * PAGE_SIZE];
        self.slot3 = Slot3::Rom;
        self.ram_select = None;
    }

    pub fn set_bios(&mut self, bios: Vec<u8>) {
        self.bios = bios;
    }

    pub fn has_bios(&self) -> bool {
        !self.bios.is_empty()
    }

    pub fn bios(&self) -> Option<&[u8]> {
        (!self.bios.is_empty()).then_some(self.bios.as_slice())
    }

    pub fn rom_len(&self) -> usize {
        self.rom.len()
    }

    pub fn page_mask(&self) -> u8 {
        self.page_mask
    }

    /// ROM page currently selected for slots 1, 2 and 3
    pub fn slot_pages(&self) -> [usize; 3] {
        self.slot_base.map(|base| base / PAGE_SIZE)
    }

    pub fn slot3(&self) -> Slot3 {
        self.slot3
    }

    pub fn read(&self, addr: u16) -> u8 {
        if self.machine.uses_paging() {
            return self.read_sega(addr);
        }

        match self.machine {
            Machine::ColecoVision => match addr {
                0x0000..=0x1FFF => self.bios.get(addr as usize).copied().unwrap_or(0xFF),
                0x6000..=0x7FFF => self.ram[addr as usize % COLECO_RAM_SIZE],
                0x8000..=0xFFFF => self.rom_byte((addr & 0x7FFF) as usize),
                _ => 0,
            },
            _ => match addr {
                SG1000_EXTRA_RAM_START..=SG1000_EXTRA_RAM_END => self.cart_ram[addr as usize],
                0x0000..=0x1FFF | 0x4000..=0xBFFF => self.rom_byte(addr as usize),
                _ => self.ram[addr as usize % SG1000_RAM_SIZE],
            },
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        if self.machine.uses_paging() {
            self.write_sega(addr, val);
            return;
        }

        match self.machine {
            Machine::ColecoVision => {
                if (0x6000..0x8000).contains(&addr) {
                    self.ram[addr as usize % COLECO_RAM_SIZE] = val;
                }
            }
            _ => match addr {
                SG1000_EXTRA_RAM_START..=SG1000_EXTRA_RAM_END => self.cart_ram[addr as usize] = val,
                0xC000..=0xFFFF => self.ram[addr as usize % SG1000_RAM_SIZE] = val,
                _ => {}
            },
        }
    }

    fn read_sega(&self, addr: u16) -> u8 {
        let offset = (addr as usize) & (PAGE_SIZE - 1);
        match addr {
            0x0000..BOOT_REGION_END => self.rom_byte(addr as usize),
            BOOT_REGION_END..=0x3FFF => self.rom_byte(self.slot_base[0] + offset),
            0x4000..=0x7FFF => self.rom_byte(self.slot_base[1] + offset),
            0x8000..=0xBFFF => match self.slot3 {
                Slot3::Rom => self.rom_byte(self.slot_base[2] + offset),
                Slot3::Ram(bank) => self.cart_ram[bank as usize * PAGE_SIZE + offset],
            },
            0xC000..=0xFFFF => self.ram[addr as usize % SEGA_RAM_SIZE],
        }
    }

    fn write_sega(&mut self, addr: u16, val: u8) {
        match addr {
            0x8000..=0xBFFF => {
                // ROM is read-only; only a RAM-mapped slot 3 takes the write
                if let Slot3::Ram(bank) = self.slot3 {
                    let offset = (addr as usize) & (PAGE_SIZE - 1);
                    self.cart_ram[bank as usize * PAGE_SIZE + offset] = val;
                }
            }
            0xC000..=0xFFFF => {
                self.ram[addr as usize % SEGA_RAM_SIZE] = val;
                if addr >= 0xFFFC {
                    self.write_paging_register(addr, val);
                }
            }
            _ => {}
        }
    }

    fn write_paging_register(&mut self, addr: u16, val: u8) {
        let page_base = (val & self.page_mask) as usize * PAGE_SIZE;
        match addr {
            0xFFFC => {
                self.ram_select = (val & 0x08 != 0).then_some((val >> 2) & 1);
                self.slot3 = match self.ram_select {
                    Some(bank) => Slot3::Ram(bank),
                    None => Slot3::Rom,
                };
            }
            0xFFFD => self.slot_base[0] = page_base,
            0xFFFE => self.slot_base[1] = page_base,
            _ => {
                // The ROM page is remembered even while cartridge RAM is mapped
                self.slot_base[2] = page_base;
                self.slot3 = match self.ram_select {
                    Some(bank) => Slot3::Ram(bank),
                    None => Slot3::Rom,
                };
            }
        }

        log(LogCategory::Memory, LogLevel::Trace, || {
            format!(
                "Mapper: {:04X} <- {:02X}, pages {:?}, slot 3 {:?}",
                addr,
                val,
                self.slot_pages(),
                self.slot3
            )
        });
    }

    fn rom_byte(&self, index: usize) -> u8 {
        if self.rom.is_empty() {
            return 0xFF;
        }
        self.rom[index % self.rom.len()]
    }
}

/// Bank numbers are masked to 5 bits for images up to 512KB, 7 bits above
pub fn page_mask_for(rom_len: usize) -> u8 {
    if rom_len > 512 * 1024 {
        0x7F
    } else {
        0x1F
    }
}

/// Size the BIOS region expects on machines that have one
pub fn bios_size(machine: Machine) -> Option<usize> {
    match machine {
        Machine::ColecoVision => Some(COLECO_BIOS_SIZE),
        _ => None,
    }
}
