//! Frame/timing engine
//!
//! One call to [`FrameEngine::run_frame`] produces one video frame. Rendering
//! and CPU execution are interleaved a scanline at a time so that register
//! writes made mid-frame (split scrolling, palette changes) land on the
//! right line.
//!
//! Each line credits [`CYCLES_PER_LINE`] to a running balance and grants the
//! CPU whatever is positive. Instructions that straddle a line boundary
//! overdraw the balance and the next line is granted correspondingly less,
//! so the CPU never drifts from the beam over a frame.

use crate::bus::SmsBus;
use crate::counters::LINES_PER_FRAME;
use crate::vdp::{Status, VideoMode, SCREEN_HEIGHT};
use emu_core::apu::TimingMode;
use emu_core::cpu_z80::{CpuZ80, Interrupt};
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::types::IndexedFrame;
use serde::Serialize;

/// Z80 cycles per NTSC scanline
pub const CYCLES_PER_LINE: u32 = TimingMode::Ntsc.cycles_per_line();

/// What happened while a frame was produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameReport {
    /// Sum of the per-line cycle grants handed to the CPU
    pub cycles_granted: u64,
    /// Cycles the CPU reported executing
    pub cycles_consumed: u64,
    pub line_interrupts: u32,
    pub frame_interrupt: bool,
}

pub struct FrameEngine {
    frame_interrupt: Interrupt,
    balance: i64,
}

impl FrameEngine {
    pub fn new(frame_interrupt: Interrupt) -> Self {
        Self {
            frame_interrupt,
            balance: 0,
        }
    }

    pub fn reset(&mut self) {
        self.balance = 0;
    }

    /// Cycles owed to (positive) or overdrawn by (negative) the CPU
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Run 262 lines: 192 rendered, the rest vertical blank
    pub fn run_frame<C>(&mut self, cpu: &mut C, bus: &mut SmsBus, frame: &mut IndexedFrame) -> FrameReport
    where
        C: CpuZ80 + ?Sized,
    {
        let mut report = FrameReport::default();
        let line_interrupts = bus.vdp.mode() == VideoMode::SmsMode4;
        let visible = SCREEN_HEIGHT as u16;

        bus.vdp.begin_frame();
        let mut next_interrupt_line = bus.vdp.register(10) as u16;

        for line in 0..LINES_PER_FRAME as u16 {
            if line < visible {
                bus.vdp.render_scanline(line, frame.row_mut(line as usize));

                if line_interrupts && line == next_interrupt_line && bus.vdp.line_interrupts_enabled() {
                    cpu.raise_interrupt(Interrupt::Irq);
                    report.line_interrupts += 1;
                    next_interrupt_line = line + bus.vdp.register(10) as u16;
                    log(LogCategory::Interrupts, LogLevel::Trace, || {
                        format!("Line interrupt on line {}", line)
                    });
                }
            } else {
                if line == visible {
                    bus.vdp.set_vsync_pending();
                }
                if !report.frame_interrupt
                    && bus.vdp.status().contains(Status::VSYNC_PENDING)
                    && bus.vdp.frame_interrupts_enabled()
                {
                    cpu.raise_interrupt(self.frame_interrupt);
                    report.frame_interrupt = true;
                    log(LogCategory::Interrupts, LogLevel::Trace, || {
                        format!("Frame interrupt ({:?}) on line {}", self.frame_interrupt, line)
                    });
                }
            }

            let (granted, consumed) = self.run_line(cpu, bus, line);
            report.cycles_granted += granted as u64;
            report.cycles_consumed += consumed as u64;
        }

        report
    }

    /// Execute one line's worth of cycles, returning (granted, consumed)
    fn run_line<C>(&mut self, cpu: &mut C, bus: &mut SmsBus, line: u16) -> (u32, u32)
    where
        C: CpuZ80 + ?Sized,
    {
        self.balance += CYCLES_PER_LINE as i64;
        let grant = u32::try_from(self.balance.max(0)).unwrap_or(u32::MAX);

        bus.begin_line(line, CYCLES_PER_LINE.saturating_sub(grant));
        let used = cpu.execute(bus, grant);
        self.balance -= used as i64;

        if used < grant {
            log(LogCategory::Cpu, LogLevel::Debug, || {
                format!("CPU stopped {} cycles short on line {}", grant - used, line)
            });
        }

        (grant, used)
    }
}
