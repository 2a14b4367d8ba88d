//! PS1 GPU (Graphics Processing Unit)

mod gp0;
mod gp1;
mod registers;

use crate::api::Renderer;
use crate::gpu::gp0::Gp0State;
use crate::gpu::registers::Registers;

const VRAM_LEN: usize = 1024 * 1024;

pub type Vram = [u8; VRAM_LEN];

#[derive(Debug, Clone)]
pub struct Gpu<R> {
    vram: Box<Vram>,
    registers: Registers,
    gp0: Gp0State,
    gpu_read_buffer: u32,
    renderer: R,
}

impl<R: Renderer> Gpu<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            vram: vec![0; VRAM_LEN].into_boxed_slice().try_into().unwrap(),
            registers: Registers::new(),
            gp0: Gp0State::new(),
            gpu_read_buffer: 0,
            renderer,
        }
    }

    pub fn read_port(&mut self) -> u32 {
        self.gpu_read_buffer
    }

    pub fn read_status_register(&self) -> u32 {
        let status = self.registers.read_status(
            self.gp0.ready_to_receive_command(),
            false,
            self.gp0.ready_to_receive_command(),
        );
        log::trace!("GPU status register read: {status:08X}");
        status
    }

    pub fn write_gp0_command(&mut self, value: u32) {
        gp0::write(&mut self.gp0, &mut self.vram, value, &mut self.renderer);
    }

    pub fn write_gp1_command(&mut self, value: u32) {
        self.handle_gp1_write(value);
    }

    pub fn vram(&self) -> &[u8] {
        self.vram.as_ref()
    }

    pub fn load_vram(&mut self, x: u16, y: u16, w: u16, h: u16, pixels: &[u16]) {
        self.renderer.load_vram(x, y, w, h, pixels);
    }

    pub fn render(&mut self) {
        self.renderer.render();
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
