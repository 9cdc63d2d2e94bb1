//! End-to-end behaviour driven through the CPU bus, the way a game would

mod common;

use common::*;
use emu_core::cpu_z80::{Interrupt, MemoryZ80};
use emu_core::System;
use emu_sms::{Machine, Status, CYCLES_PER_LINE};

#[test]
fn test_tile_zero_solid_color_on_line_zero() {
    let mut system = master_system(12);
    script(&mut system, vram_upload(0x0000, &solid_tile(5)));

    system.render_frame().unwrap();
    system.render_frame().unwrap();

    let row = system.indexed_frame().row(0);
    assert_eq!(&row[..8], &[5; 8]);
}

#[test]
fn test_hscroll_lock_keeps_status_bar_still() {
    let mut system = master_system(12);
    let mut ops = vram_upload(0x0020, &solid_tile(7));
    // Tile 1 at nametable rows 0 and 2, column 0
    ops.extend(vram_upload(0x3800, &[0x01, 0x00]));
    ops.extend(vram_upload(0x3800 + 2 * 64, &[0x01, 0x00]));
    // Register writes re-derive the nametable from R2, so point it at 0x3800
    ops.extend(set_vdp_register(2, 0xFF));
    ops.extend(set_vdp_register(8, 3));
    ops.extend(set_vdp_register(0, 0x04 | 0x40));
    script(&mut system, ops);

    system.render_frame().unwrap();
    system.render_frame().unwrap();

    let frame = system.indexed_frame();
    assert_eq!(&frame.row(0)[..8], &[7; 8]);
    assert_eq!(&frame.row(16)[..3], &[0; 3]);
    assert_eq!(&frame.row(16)[3..11], &[7; 8]);
}

#[test]
fn test_sprite_drawn_from_sprite_palette() {
    let mut system = master_system(12);
    let mut pattern = vec![0u8; 32];
    pattern[0] = 0x80;

    let mut ops = vram_upload(0x0020, &pattern);
    ops.extend(set_vdp_register(5, 0xFF));
    ops.extend(set_vdp_register(2, 0xFF));
    // Y is stored one line early
    ops.extend(vram_upload(0x3F00, &[9, 0xD0]));
    ops.extend(vram_upload(0x3F80, &[20, 1]));
    script(&mut system, ops);

    system.render_frame().unwrap();
    system.render_frame().unwrap();

    let frame = system.indexed_frame();
    assert_eq!(frame.row(10)[20], 16 + 1);
    assert_eq!(frame.row(10)[21], 0);
    assert_eq!(frame.row(9)[20], 0);
}

#[test]
fn test_sprite_terminator_hides_later_sprites() {
    let mut system = master_system(4);
    let mut ops = vram_upload(0x0020, &solid_tile(4));
    ops.extend(set_vdp_register(5, 0xFF));
    ops.extend(set_vdp_register(2, 0xFF));

    let mut ys = vec![9u8; 64];
    ys[5] = 0xD0;
    ops.extend(vram_upload(0x3F00, &ys));
    let xs: Vec<u8> = (0..64u8).flat_map(|i| [i.wrapping_mul(4), 1]).collect();
    ops.extend(vram_upload(0x3F80, &xs));
    script(&mut system, ops);

    system.render_frame().unwrap();
    system.render_frame().unwrap();

    let frame = system.indexed_frame();
    for line in 0..192 {
        assert!(frame.row(line)[24..].iter().all(|&p| p < 16), "line {}", line);
    }
    assert_eq!(frame.row(10)[16], 20);
}

#[test]
fn test_frame_always_grants_262_lines() {
    let mut system = master_system(4);
    // Line interrupts every 20 lines plus the frame interrupt
    let mut ops = set_vdp_register(10, 20).to_vec();
    ops.extend(set_vdp_register(0, 0x14));
    ops.extend(set_vdp_register(1, 0x20));
    script(&mut system, ops);

    for _ in 0..3 {
        let report = system.render_frame().unwrap();
        assert_eq!(report.cycles_granted, 262 * CYCLES_PER_LINE as u64);
    }
    assert_eq!(system.cpu().grants.len(), 3 * 262);

    // Third frame saw the registers from the start
    let last_frame: Vec<_> = system
        .cpu()
        .interrupts
        .iter()
        .filter(|&&(line, _)| line >= 2 * 262)
        .map(|&(line, kind)| (line - 2 * 262, kind))
        .collect();
    assert_eq!(
        last_frame,
        vec![
            (20, Interrupt::Irq),
            (40, Interrupt::Irq),
            (60, Interrupt::Irq),
            (80, Interrupt::Irq),
            (100, Interrupt::Irq),
            (120, Interrupt::Irq),
            (140, Interrupt::Irq),
            (160, Interrupt::Irq),
            (180, Interrupt::Irq),
            (192, Interrupt::Irq),
        ]
    );
}

#[test]
fn test_vram_read_ahead_through_ports() {
    let mut system = master_system(12);
    let mut ops = vram_upload(0x1000, &[0xA1, 0xB2, 0xC3]);
    ops.extend(set_vdp_address(0, 0x1000));
    ops.extend([Op::In(0xBE), Op::In(0xBE), Op::In(0xBE)]);
    script(&mut system, ops);

    system.render_frame().unwrap();

    assert_eq!(system.cpu().reads, vec![0xA1, 0xB2, 0xC3]);
}

#[test]
fn test_status_read_clears_vsync() {
    let mut system = master_system(12);
    system.render_frame().unwrap();
    assert!(system.bus().vdp().status().contains(Status::VSYNC_PENDING));

    script(&mut system, [Op::In(0xBF), Op::In(0xBF)]);
    system.render_frame().unwrap();

    let reads = &system.cpu().reads;
    assert_eq!(reads[0] & 0x80, 0x80);
    assert_eq!(reads[1] & 0x80, 0x00);
}

#[test]
fn test_vram_address_wraps_after_full_sweep() {
    let mut system = master_system(1);
    let mut ops = set_vdp_address(1, 0x2345).to_vec();
    ops.extend(std::iter::repeat(Op::Out(0xBE, 0x5A)).take(0x4000));
    script(&mut system, ops);

    system.render_frame().unwrap();

    assert_eq!(system.bus().vdp().address(), 0x2345);
    assert!(system.bus().vdp().vram().iter().all(|&b| b == 0x5A));
}

#[test]
fn test_paging_follows_guest_writes() {
    // 256KB image, each byte tagged with its page
    let rom: Vec<u8> = (0..16 * 0x4000).map(|i| (i / 0x4000) as u8).collect();
    let mut system = system_with_rom(Machine::MasterSystem, rom.clone(), 12);
    script(
        &mut system,
        [Op::Write(0xFFFD, 5), Op::Write(0xFFFE, 0x2B), Op::Write(0xFFFF, 15)],
    );

    system.render_frame().unwrap();

    let bus = system.bus();
    assert_eq!(bus.read(0x0000), 0);
    for k in (0x0400..0x4000).step_by(0x3FF) {
        assert_eq!(bus.read(k as u16), rom[5 * 0x4000 + k]);
    }
    // 0x2B & 0x1F = 11
    for k in (0..0x4000).step_by(0x3FF) {
        assert_eq!(bus.read(0x4000 + k as u16), rom[11 * 0x4000 + k]);
        assert_eq!(bus.read(0x8000 + k as u16), rom[15 * 0x4000 + k]);
    }
    // Paging registers alias the top of RAM
    assert_eq!(bus.read(0xDFFD), 5);
}

#[test]
fn test_ram_round_trip_and_rom_protection() {
    let rom = vec![0xEE; 0x8000];
    let mut system = system_with_rom(Machine::MasterSystem, rom, 12);
    script(
        &mut system,
        [
            Op::Write(0xC123, 0x42),
            Op::Write(0x0123, 0x42),
            Op::Write(0x4123, 0x42),
            Op::Write(0x8123, 0x42),
        ],
    );

    system.render_frame().unwrap();

    let bus = system.bus();
    assert_eq!(bus.read(0xC123), 0x42);
    assert_eq!(bus.read(0xE123), 0x42);
    assert_eq!(bus.read(0x0123), 0xEE);
    assert_eq!(bus.read(0x4123), 0xEE);
    assert_eq!(bus.read(0x8123), 0xEE);
}

#[test]
fn test_cartridge_ram_through_control_register() {
    let mut system = master_system(12);
    script(
        &mut system,
        [Op::Write(0xFFFC, 0x08), Op::Write(0x8000, 0x99), Op::Write(0xFFFC, 0x00)],
    );
    system.render_frame().unwrap();
    assert_eq!(system.bus().read(0x8000), 0x00);

    script(&mut system, [Op::Write(0xFFFC, 0x08)]);
    system.render_frame().unwrap();
    assert_eq!(system.bus().read(0x8000), 0x99);
}

#[test]
fn test_mid_frame_palette_write_reaches_host() {
    let mut system = master_system(12);
    let mut ops = set_vdp_address(3, 0x0000).to_vec();
    ops.push(Op::Out(0xBE, 0x0C));
    script(&mut system, ops);

    let frame = system.step_frame().unwrap();

    // The host palette is applied once the frame completes
    assert_eq!(system.palette()[0], 0xFF00FF00);
    assert_eq!(frame.pixels[0], 0xFF00FF00);
}

#[test]
fn test_game_gear_palette_and_start_button() {
    let mut system = system_with_rom(Machine::GameGear, vec![0; 0x8000], 12);
    system.set_start_button(true);
    let mut ops = set_vdp_address(3, 0x0002).to_vec();
    ops.extend([Op::Out(0xBE, 0x0F), Op::Out(0xBE, 0x0F), Op::In(0x00)]);
    script(&mut system, ops);

    system.render_frame().unwrap();

    assert_eq!(system.palette()[1], 0xFFFF00FF);
    assert_eq!(system.cpu().reads, vec![0x7F]);
}

#[test]
fn test_sg1000_renders_legacy_mode() {
    let mut system = system_with_rom(Machine::Sg1000, vec![0; 0xC000], 12);
    // Backdrop colour 4 shows through an empty screen
    script(&mut system, set_vdp_register(7, 0x04));

    system.render_frame().unwrap();
    system.render_frame().unwrap();

    assert!(system.indexed_frame().pixels.iter().all(|&p| p == 4));
    let frame = system.step_frame().unwrap();
    assert_eq!(frame.pixels[0], 0xFF5455ED);
}

#[test]
fn test_h_counter_tracks_position_in_line() {
    let mut system = master_system(12);
    script(&mut system, [Op::In(0x7F), Op::In(0x7F), Op::In(0x7E)]);

    system.render_frame().unwrap();

    // Ops at 0 and 12 cycles into line 0: (0*3/2)>>1 and (12*3/2)>>1
    assert_eq!(system.cpu().reads, vec![0, 9, 0]);
}
