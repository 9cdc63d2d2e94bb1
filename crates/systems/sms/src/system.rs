//! Sega 8-bit main system implementation

use crate::bus::SmsBus;
use crate::config::{Machine, SmsConfig};
use crate::frame::{FrameEngine, FrameReport};
use crate::mapper::{self, MAX_ROM_SIZE};
use crate::vdp::{PALETTE_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
use emu_core::apu::SoundChip;
use emu_core::cpu_z80::CpuZ80;
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::{AudioSample, Frame, IndexedFrame};
use emu_core::{MountPointInfo, System};
use serde_json::Value;
use thiserror::Error;

/// SMS emulator errors
#[derive(Debug, Error)]
pub enum SmsError {
    #[error("Invalid mount point")]
    InvalidMountPoint,
    #[error("ROM image is empty")]
    EmptyRom,
    #[error("ROM image is too large ({size} bytes, at most 1MB is addressable)")]
    RomTooLarge { size: usize },
    #[error("This machine needs a BIOS image mounted first")]
    MissingBios,
    #[error("No cartridge mounted")]
    NoCartridge,
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Sega Master System / Game Gear / SG-1000 / ColecoVision emulator
///
/// The Z80 is supplied by the host; this type drives it a scanline at a
/// time and owns everything it talks to.
pub struct SmsSystem<C: CpuZ80> {
    cpu: C,
    bus: SmsBus,
    engine: FrameEngine,
    frame: IndexedFrame,
    config: SmsConfig,
    cartridge_loaded: bool,
    last_report: FrameReport,
}

impl<C: CpuZ80> SmsSystem<C> {
    /// Create a new system with no cartridge
    pub fn new(cpu: C, config: SmsConfig) -> Self {
        let bus = SmsBus::new(&config, vec![0; 0x8000]);
        let mut system = Self {
            cpu,
            bus,
            engine: FrameEngine::new(config.machine.frame_interrupt()),
            frame: IndexedFrame::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32),
            config,
            cartridge_loaded: false,
            last_report: FrameReport::default(),
        };
        system.reset();
        system
    }

    pub fn machine(&self) -> Machine {
        self.config.machine
    }

    pub fn config(&self) -> &SmsConfig {
        &self.config
    }

    /// Load a ROM image and reset
    pub fn load_rom(&mut self, rom_data: Vec<u8>) -> Result<(), SmsError> {
        validate_rom(&rom_data)?;
        let size = rom_data.len();
        self.bus.mapper = rebuild_mapper(&self.bus, rom_data);
        self.cartridge_loaded = true;
        self.reset();

        log(LogCategory::Memory, LogLevel::Info, || {
            format!(
                "{}: loaded {} KB cartridge, page mask {:02X}",
                self.config.machine.name(),
                size / 1024,
                self.bus.mapper.page_mask()
            )
        });
        Ok(())
    }

    /// Load the ColecoVision BIOS
    pub fn load_bios(&mut self, bios: Vec<u8>) -> Result<(), SmsError> {
        let Some(expected) = mapper::bios_size(self.config.machine) else {
            return Err(SmsError::InvalidMountPoint);
        };
        if bios.is_empty() {
            return Err(SmsError::EmptyRom);
        }
        if bios.len() > expected {
            return Err(SmsError::RomTooLarge { size: bios.len() });
        }
        self.bus.mapper.set_bios(bios);
        self.reset();
        Ok(())
    }

    /// Attach the PSG implementation
    pub fn attach_psg(&mut self, psg: Box<dyn SoundChip>) {
        self.bus.set_psg(psg);
    }

    /// Attach an FM (YM2413) implementation on ports 0xF0/0xF1
    pub fn attach_fm(&mut self, fm: Box<dyn SoundChip>) {
        self.bus.set_fm(fm);
    }

    /// Next mixed audio sample
    pub fn audio_sample(&mut self) -> AudioSample {
        self.bus.sample()
    }

    /// Set controller 1 state
    pub fn set_controller_1(&mut self, state: u8) {
        self.bus.set_controller_1(state);
    }

    /// Set controller 2 state
    pub fn set_controller_2(&mut self, state: u8) {
        self.bus.set_controller_2(state);
    }

    pub fn set_start_button(&mut self, pressed: bool) {
        self.bus.set_start_button(pressed);
    }

    /// Run one frame into the indexed framebuffer
    pub fn render_frame(&mut self) -> Result<FrameReport, SmsError> {
        if !self.cartridge_loaded {
            return Err(SmsError::NoCartridge);
        }
        if mapper::bios_size(self.config.machine).is_some() && !self.bus.mapper.has_bios() {
            return Err(SmsError::MissingBios);
        }

        self.last_report = self
            .engine
            .run_frame(&mut self.cpu, &mut self.bus, &mut self.frame);
        Ok(self.last_report)
    }

    /// Last completed frame, one palette index per pixel
    pub fn indexed_frame(&self) -> &IndexedFrame {
        &self.frame
    }

    /// Live host palette (ARGB8888)
    pub fn palette(&self) -> &[u32; PALETTE_SIZE] {
        self.bus.vdp.palette()
    }

    pub fn last_report(&self) -> FrameReport {
        self.last_report
    }

    pub fn bus(&self) -> &SmsBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut SmsBus {
        &mut self.bus
    }

    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }
}

fn validate_rom(rom: &[u8]) -> Result<(), SmsError> {
    if rom.is_empty() {
        return Err(SmsError::EmptyRom);
    }
    if rom.len() > MAX_ROM_SIZE {
        return Err(SmsError::RomTooLarge { size: rom.len() });
    }
    Ok(())
}

/// New mapper for `rom` that keeps any mounted BIOS
fn rebuild_mapper(bus: &SmsBus, rom: Vec<u8>) -> mapper::Mapper {
    let mut fresh = mapper::Mapper::new(bus.machine(), rom);
    if let Some(bios) = bus.mapper.bios() {
        fresh.set_bios(bios.to_vec());
    }
    fresh
}

impl<C: CpuZ80> System for SmsSystem<C> {
    type Error = SmsError;

    fn reset(&mut self) {
        self.cpu.reset();
        self.bus.reset();
        self.engine.reset();
        self.frame.pixels.fill(0);
        self.last_report = FrameReport::default();
    }

    fn step_frame(&mut self) -> Result<Frame, Self::Error> {
        self.render_frame()?;
        Ok(self.frame.to_argb(self.bus.vdp.palette()))
    }

    fn save_state(&self) -> Value {
        let vdp = &self.bus.vdp;
        let mapper = &self.bus.mapper;
        serde_json::json!({
            "machine": self.config.machine,
            "vdp": {
                "registers": vdp.registers,
                "status": vdp.status().bits(),
                "address": vdp.address(),
                "latch": vdp.latch(),
                "mode": vdp.mode(),
            },
            "mapper": {
                "slot_pages": mapper.slot_pages(),
                "slot3": mapper.slot3(),
                "page_mask": mapper.page_mask(),
            },
            "memory_control": self.bus.memory_control(),
            "cycle_balance": self.engine.balance(),
            "last_frame": self.last_report,
        })
    }

    fn load_state(&mut self, _state: &Value) -> Result<(), serde_json::Error> {
        Err(serde::de::Error::custom(
            "save states are not supported; save_state() is a debug snapshot",
        ))
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        let extensions: &[&str] = match self.config.machine {
            Machine::MasterSystem => &["sms"],
            Machine::GameGear => &["gg"],
            Machine::Sg1000 => &["sg", "sc"],
            Machine::ColecoVision => &["col"],
        };

        let mut points = vec![MountPointInfo {
            id: "cartridge".to_string(),
            name: "Cartridge".to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            required: true,
        }];
        if mapper::bios_size(self.config.machine).is_some() {
            points.push(MountPointInfo {
                id: "bios".to_string(),
                name: "BIOS ROM".to_string(),
                extensions: vec!["rom".to_string(), "bin".to_string()],
                required: true,
            });
        }
        points
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        match mount_point_id {
            "cartridge" => self.load_rom(data.to_vec()),
            "bios" => self.load_bios(data.to_vec()),
            _ => Err(SmsError::InvalidMountPoint),
        }
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        match mount_point_id {
            "cartridge" => {
                self.bus.mapper = rebuild_mapper(&self.bus, vec![0; 0x8000]);
                self.cartridge_loaded = false;
                self.reset();
                Ok(())
            }
            "bios" if mapper::bios_size(self.config.machine).is_some() => {
                self.bus.mapper.set_bios(Vec::new());
                self.reset();
                Ok(())
            }
            _ => Err(SmsError::InvalidMountPoint),
        }
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        match mount_point_id {
            "cartridge" => self.cartridge_loaded,
            "bios" => self.bus.mapper.has_bios(),
            _ => false,
        }
    }
}
