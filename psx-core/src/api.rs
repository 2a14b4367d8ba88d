//! PS1 public interface and main loop

use crate::bus::Bus;
use crate::cpu::R3000;
use crate::dma::DmaController;
use crate::gpu::Gpu;
use crate::interrupts::InterruptRegisters;
use crate::memory::Memory;
use crate::timers::Timers;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Uv {
    pub u: u8,
    pub v: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UvClut {
    pub u: u8,
    pub v: u8,
    pub clut: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UvTexpage {
    pub u: u8,
    pub v: u8,
    pub texpage: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadedVertex {
    pub color: Color,
    pub position: Point,
}

/// Consumes the primitives decoded by the GP0 command-phase state machine. A host implements
/// this to rasterize (software or hardware-accelerated); `render()` is the VSync pacing point
/// and `load_vram()` lets a hardware backend resynchronize its own VRAM texture after an image
/// transfer.
pub trait Renderer {
    fn monochrome_opaque_quad(&mut self, color: Color, vertices: [Point; 4]);

    #[allow(clippy::too_many_arguments)]
    fn textured_blend_quad(
        &mut self,
        color: Color,
        v0_pos: Point,
        v0_uv: UvClut,
        v1_pos: Point,
        v1_uv: UvTexpage,
        v2_pos: Point,
        v2_uv: Uv,
        v3_pos: Point,
        v3_uv: Uv,
    );

    fn gouraud_triangle(&mut self, v0: ShadedVertex, v1: ShadedVertex, v2: ShadedVertex);

    fn gouraud_quad(
        &mut self,
        v0: ShadedVertex,
        v1: ShadedVertex,
        v2: ShadedVertex,
        v3: ShadedVertex,
    );

    fn load_vram(&mut self, x: u16, y: u16, w: u16, h: u16, pixels: &[u16]);

    fn render(&mut self);
}

#[derive(Debug, Error)]
pub enum Ps1Error {
    #[error("Incorrect BIOS ROM size; expected 512KB, was {bios_len}")]
    IncorrectBiosSize { bios_len: usize },
    #[error("EXE format is invalid")]
    InvalidExeFormat,
}

pub type Ps1Result<T> = Result<T, Ps1Error>;

#[derive(Debug)]
pub struct Ps1Emulator<R> {
    cpu: R3000,
    gpu: Gpu<R>,
    memory: Memory,
    dma_controller: DmaController,
    interrupt_registers: InterruptRegisters,
    timers: Timers,
    tty_enabled: bool,
    tty_buffer: String,
}

#[derive(Debug)]
pub struct Ps1EmulatorBuilder<R> {
    bios_rom: Vec<u8>,
    renderer: R,
    tty_enabled: bool,
}

impl<R: Renderer> Ps1EmulatorBuilder<R> {
    #[must_use]
    pub fn new(bios_rom: Vec<u8>, renderer: R) -> Self {
        Self { bios_rom, renderer, tty_enabled: false }
    }

    #[must_use]
    pub fn tty_enabled(mut self, tty_enabled: bool) -> Self {
        self.tty_enabled = tty_enabled;
        self
    }

    /// # Errors
    ///
    /// Will return an error if the BIOS ROM is invalid.
    pub fn build(self) -> Ps1Result<Ps1Emulator<R>> {
        Ps1Emulator::new(self.bios_rom, self.renderer, self.tty_enabled)
    }
}

impl<R: Renderer> Ps1Emulator<R> {
    #[must_use]
    pub fn builder(bios_rom: Vec<u8>, renderer: R) -> Ps1EmulatorBuilder<R> {
        Ps1EmulatorBuilder::new(bios_rom, renderer)
    }

    /// # Errors
    ///
    /// Will return an error if the BIOS ROM is invalid.
    pub fn new(bios_rom: Vec<u8>, renderer: R, tty_enabled: bool) -> Ps1Result<Self> {
        let memory = Memory::new(bios_rom)?;

        Ok(Self {
            cpu: R3000::new(),
            gpu: Gpu::new(renderer),
            memory,
            dma_controller: DmaController::new(),
            interrupt_registers: InterruptRegisters::new(),
            timers: Timers::new(),
            tty_enabled,
            tty_buffer: String::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn cpu_pc(&self) -> u32 {
        self.cpu.pc()
    }

    #[must_use]
    pub fn vram(&self) -> &[u8] {
        self.gpu.vram()
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        self.gpu.renderer()
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        self.gpu.renderer_mut()
    }

    /// # Errors
    ///
    /// Will return an error if the EXE does not appear to be a PS1 executable based on the
    /// header.
    #[allow(clippy::missing_panics_doc)]
    pub fn sideload_exe(&mut self, exe: &[u8]) -> Ps1Result<()> {
        if exe.len() < 0x800 || &exe[..0x008] != "PS-X EXE".as_bytes() {
            return Err(Ps1Error::InvalidExeFormat);
        }

        let pc = u32::from_le_bytes(exe[0x010..0x014].try_into().unwrap());
        let initial_gp = u32::from_le_bytes(exe[0x014..0x018].try_into().unwrap());
        let ram_dest_addr = u32::from_le_bytes(exe[0x018..0x01C].try_into().unwrap());
        let exe_size = u32::from_le_bytes(exe[0x01C..0x020].try_into().unwrap());
        let initial_sp = u32::from_le_bytes(exe[0x030..0x034].try_into().unwrap());
        let initial_sp_offset = u32::from_le_bytes(exe[0x034..0x038].try_into().unwrap());

        self.cpu.set_pc(pc);
        self.cpu.set_gpr(28, initial_gp);

        if initial_sp != 0 {
            self.cpu.set_gpr(29, initial_sp);
            self.cpu.set_gpr(30, initial_sp);
        }

        if initial_sp_offset != 0 {
            for r in [29, 30] {
                let r_value = self.cpu.get_gpr(r);
                self.cpu.set_gpr(r, r_value.wrapping_add(initial_sp_offset));
            }
        }

        let exe_data = &exe[0x800..0x800 + exe_size as usize];
        self.memory.copy_to_main_ram(exe_data, ram_dest_addr & 0x1FFFFFFF);

        Ok(())
    }

    /// Runs `steps` CPU instructions, ticks the three timer channels once, and flushes the
    /// renderer, matching the host loop contract: `for step in 0..N: cpu.step(&bus)`, `for ch in
    /// 0..3: timers[ch].tick()`, `renderer.render()`. Polling host input is the caller's
    /// responsibility.
    pub fn tick(&mut self, steps: u32) {
        for _ in 0..steps {
            self.cpu.execute_instruction(&mut Bus {
                gpu: &mut self.gpu,
                memory: &mut self.memory,
                dma_controller: &mut self.dma_controller,
                interrupt_registers: &mut self.interrupt_registers,
                timers: &mut self.timers,
            });

            if self.tty_enabled {
                self.check_for_putchar_call();
            }
        }

        for channel in 0..3 {
            self.timers.tick(channel, &mut self.interrupt_registers);
        }

        self.gpu.render();
    }

    fn check_for_putchar_call(&mut self) {
        // BIOS function calls work by jumping to $A0 (A functions), $B0 (B functions), or
        // $C0 (C functions) with the function number specified in R9.
        //
        // A($3C) and B($3D) are both the putchar() function, which prints the ASCII character
        // in R4 to the TTY.
        let pc = self.cpu.pc() & 0x1FFFFFFF;
        let r9 = self.cpu.get_gpr(9);
        if (pc == 0xA0 && r9 == 0x3C) || (pc == 0xB0 && r9 == 0x3D) {
            let r4 = self.cpu.get_gpr(4);
            let c = r4 as u8 as char;
            if c == '\n' {
                log::info!("TTY: {}", self.tty_buffer);
                self.tty_buffer.clear();
            } else {
                self.tty_buffer.push(c);
            }
        }
    }
}
