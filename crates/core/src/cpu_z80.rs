//! Zilog Z80 CPU interfaces
//!
//! Systems built around a Z80 do not own an instruction interpreter here.
//! Instead they consume any core implementing [`CpuZ80`] and hand it a
//! [`MemoryZ80`] bus for the duration of each execution burst. The bus
//! receives every memory and port access in program order, which is what
//! lets per-scanline video work interleave with CPU execution.

/// Memory interface trait for the Z80 CPU
pub trait MemoryZ80 {
    /// Read a byte from memory
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to memory
    fn write(&mut self, addr: u16, val: u8);

    /// Read from I/O port
    fn io_read(&mut self, port: u8) -> u8 {
        let _ = port;
        0xFF
    }

    /// Write to I/O port
    fn io_write(&mut self, port: u8, val: u8) {
        let _ = (port, val);
    }

    /// Report how many cycles the CPU has executed in the current burst.
    ///
    /// CPU cores call this before port accesses. Buses that expose
    /// beam-position counters use it to locate the access within the line;
    /// buses without such counters can ignore it.
    fn sync(&mut self, cycles_into_burst: u32) {
        let _ = cycles_into_burst;
    }
}

/// Interrupt request kinds accepted by the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    /// Maskable interrupt (/INT)
    Irq,
    /// Non-maskable interrupt (/NMI)
    Nmi,
}

/// Black-box Z80 core.
pub trait CpuZ80 {
    /// Reset to power-on state
    fn reset(&mut self);

    /// Run instructions until at least `max_cycles` have elapsed, returning
    /// the number actually consumed. The result may exceed the request when
    /// the last instruction straddles the limit; a request of zero must not
    /// execute anything.
    fn execute(&mut self, bus: &mut dyn MemoryZ80, max_cycles: u32) -> u32;

    /// Assert an interrupt line
    fn raise_interrupt(&mut self, kind: Interrupt);
}

impl<C: CpuZ80 + ?Sized> CpuZ80 for Box<C> {
    fn reset(&mut self) {
        (**self).reset();
    }

    fn execute(&mut self, bus: &mut dyn MemoryZ80, max_cycles: u32) -> u32 {
        (**self).execute(bus, max_cycles)
    }

    fn raise_interrupt(&mut self, kind: Interrupt) {
        (**self).raise_interrupt(kind);
    }
}
