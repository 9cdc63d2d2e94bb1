//! Console region timing configuration.

/// Console region timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    /// NTSC (North America, Japan) - 3.579545 MHz Z80 clock, 262 lines
    #[default]
    Ntsc,
    /// PAL (Europe, Australia) - 3.546893 MHz Z80 clock, 313 lines
    Pal,
}

impl TimingMode {
    /// Get the CPU clock frequency in Hz for this timing mode
    pub const fn cpu_clock_hz(&self) -> u32 {
        match self {
            TimingMode::Ntsc => 3_579_545,
            TimingMode::Pal => 3_546_893,
        }
    }

    /// Get the frame rate in Hz for this timing mode
    pub const fn frame_rate_hz(&self) -> u32 {
        match self {
            TimingMode::Ntsc => 60,
            TimingMode::Pal => 50,
        }
    }

    /// Total scanlines per frame, visible and blanking
    pub const fn lines_per_frame(&self) -> u32 {
        match self {
            TimingMode::Ntsc => 262,
            TimingMode::Pal => 313,
        }
    }

    /// CPU cycles per scanline, rounded to the nearest whole cycle
    pub const fn cycles_per_line(&self) -> u32 {
        let per_second = self.frame_rate_hz() * self.lines_per_frame();
        (self.cpu_clock_hz() + per_second / 2) / per_second
    }
}
