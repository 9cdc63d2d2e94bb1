//! Sega 8-bit console emulator implementation
//!
//! This crate implements the video, memory and timing hardware of the Sega
//! Master System and Game Gear, plus the SG-1000 and ColecoVision that share
//! the same video chip family.
//!
//! # Architecture
//!
//! - **CPU**: Zilog Z80A @ 3.58 MHz, supplied by the host through [`emu_core::cpu_z80::CpuZ80`]
//! - **VDP**: Sega 315-5124 (SMS 1) / 315-5246 (SMS 2), TMS9918A on the SG-1000
//! - **PSG/FM**: supplied by the host through [`emu_core::apu::SoundChip`]
//! - **RAM**: 8 KB main RAM (2 KB SG-1000, 1 KB ColecoVision)
//! - **VRAM**: 16 KB video RAM
//!
//! A frame is 262 NTSC lines of 228 CPU cycles; the first 192 are rendered
//! into a palette-indexed framebuffer as the CPU runs.

mod bus;
pub mod config;
pub mod counters;
mod frame;
pub mod mapper;
mod system;
pub mod vdp;
mod vdp_renderer;

pub use bus::SmsBus;
pub use config::{Machine, SmsConfig};
pub use frame::{FrameEngine, FrameReport, CYCLES_PER_LINE};
pub use system::{SmsError, SmsSystem};
pub use vdp::{Status, Vdp, VideoMode};
