//! Shared helpers for the integration tests
//!
//! `ScriptedCpu` stands in for a Z80: it replays a queue of bus operations,
//! charging a fixed number of cycles per operation, and records every cycle
//! grant, interrupt and port read.

#![allow(dead_code)]

use emu_core::cpu_z80::{CpuZ80, Interrupt, MemoryZ80};
use emu_sms::{Machine, SmsConfig, SmsSystem};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Write(u16, u8),
    Out(u8, u8),
    In(u8),
}

pub struct ScriptedCpu {
    pub ops: VecDeque<Op>,
    pub op_cycles: u32,
    pub grants: Vec<u32>,
    pub interrupts: Vec<(usize, Interrupt)>,
    pub reads: Vec<u8>,
}

impl ScriptedCpu {
    pub fn new(op_cycles: u32) -> Self {
        Self {
            ops: VecDeque::new(),
            op_cycles,
            grants: Vec::new(),
            interrupts: Vec::new(),
            reads: Vec::new(),
        }
    }
}

impl CpuZ80 for ScriptedCpu {
    fn reset(&mut self) {
        self.grants.clear();
        self.interrupts.clear();
        self.reads.clear();
    }

    fn execute(&mut self, bus: &mut dyn MemoryZ80, max_cycles: u32) -> u32 {
        self.grants.push(max_cycles);
        let mut used = 0;
        while used < max_cycles {
            match self.ops.pop_front() {
                Some(op) => {
                    bus.sync(used);
                    match op {
                        Op::Write(addr, val) => bus.write(addr, val),
                        Op::Out(port, val) => bus.io_write(port, val),
                        Op::In(port) => {
                            let v = bus.io_read(port);
                            self.reads.push(v);
                        }
                    }
                    used += self.op_cycles;
                }
                // Idle loop once the script runs dry
                None => used += 4,
            }
        }
        used
    }

    fn raise_interrupt(&mut self, kind: Interrupt) {
        self.interrupts.push((self.grants.len(), kind));
    }
}

/// Port sequence that loads the VDP address register
pub fn set_vdp_address(code: u8, addr: u16) -> [Op; 2] {
    [
        Op::Out(0xBF, addr as u8),
        Op::Out(0xBF, (code << 6) | ((addr >> 8) as u8 & 0x3F)),
    ]
}

pub fn set_vdp_register(reg: u8, value: u8) -> [Op; 2] {
    [Op::Out(0xBF, value), Op::Out(0xBF, 0x80 | reg)]
}

/// Port sequence that writes `data` to VRAM starting at `addr`
pub fn vram_upload(addr: u16, data: &[u8]) -> Vec<Op> {
    let mut ops = set_vdp_address(1, addr).to_vec();
    ops.extend(data.iter().map(|&b| Op::Out(0xBE, b)));
    ops
}

/// 4bpp tile rows filled with a single colour
pub fn solid_tile(color: u8) -> Vec<u8> {
    let row: Vec<u8> = (0..4)
        .map(|plane| if color >> plane & 1 != 0 { 0xFF } else { 0x00 })
        .collect();
    row.repeat(8)
}

pub fn system_with_rom(machine: Machine, rom: Vec<u8>, op_cycles: u32) -> SmsSystem<ScriptedCpu> {
    let mut system = SmsSystem::new(ScriptedCpu::new(op_cycles), SmsConfig::for_machine(machine));
    system.load_rom(rom).expect("ROM loads");
    system
}

pub fn master_system(op_cycles: u32) -> SmsSystem<ScriptedCpu> {
    system_with_rom(Machine::MasterSystem, vec![0; 0x8000], op_cycles)
}

/// Queue operations for the CPU to run from the next frame on
pub fn script(system: &mut SmsSystem<ScriptedCpu>, ops: impl IntoIterator<Item = Op>) {
    system.cpu_mut().ops.extend(ops);
}
