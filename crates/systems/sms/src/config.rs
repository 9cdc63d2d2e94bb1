//! Machine variant selection and system configuration

use crate::system::SmsError;
use crate::vdp::VideoMode;
use emu_core::cpu_z80::Interrupt;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The console being emulated.
///
/// The variant decides the palette depth, whether the Sega paging registers
/// exist, which renderer the VDP uses, and how the controller ports are laid
/// out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Machine {
    #[default]
    MasterSystem,
    GameGear,
    Sg1000,
    ColecoVision,
}

impl Machine {
    /// Guess the machine from a ROM file extension.
    ///
    /// Unknown or missing extensions fall back to the Master System.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("gg") => Machine::GameGear,
            Some("sg") | Some("sc") => Machine::Sg1000,
            Some("col") => Machine::ColecoVision,
            _ => Machine::MasterSystem,
        }
    }

    pub fn video_mode(self) -> VideoMode {
        match self {
            Machine::MasterSystem | Machine::GameGear => VideoMode::SmsMode4,
            Machine::Sg1000 | Machine::ColecoVision => VideoMode::Legacy,
        }
    }

    /// Interrupt line the VDP frame interrupt is wired to
    pub fn frame_interrupt(self) -> Interrupt {
        match self {
            Machine::ColecoVision => Interrupt::Nmi,
            _ => Interrupt::Irq,
        }
    }

    /// Whether writes to 0xFFFC-0xFFFF drive the slot mapper
    pub fn uses_paging(self) -> bool {
        matches!(self, Machine::MasterSystem | Machine::GameGear)
    }

    pub fn name(self) -> &'static str {
        match self {
            Machine::MasterSystem => "Sega Master System",
            Machine::GameGear => "Sega Game Gear",
            Machine::Sg1000 => "Sega SG-1000",
            Machine::ColecoVision => "ColecoVision",
        }
    }
}

/// Host-selected configuration, usually loaded from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub machine: Machine,
    /// Answer on the FM detection port (0xF2) as a Japanese SMS would
    pub fm_unit: bool,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            machine: Machine::MasterSystem,
            fm_unit: false,
        }
    }
}

impl SmsConfig {
    pub fn for_machine(machine: Machine) -> Self {
        Self {
            machine,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SmsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, SmsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
