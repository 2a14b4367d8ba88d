//! GP0 command processing
//!
//! The GP0 port consumes a stream of 32-bit words. The top byte of the first word of a command
//! selects the command; remaining words are buffered as arguments until the declared argument
//! count is reached, at which point the buffered words are decoded into a primitive and handed
//! to the renderer. `0xA0` instead transitions into an image-transfer phase that copies raw
//! pixel words into VRAM.

use crate::api::{Color, Point, Renderer, ShadedVertex, Uv, UvClut, UvTexpage};
use crate::gpu::Vram;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitCommand,
    AwaitArgs { command: u32, remaining: u32 },
    AwaitImageData { x: u32, y: u32, w: u32, h: u32, remaining: u32 },
}

#[derive(Debug, Clone)]
pub struct Gp0State {
    phase: Phase,
    buffer: Vec<u32>,
}

impl Default for Gp0State {
    fn default() -> Self {
        Self::new()
    }
}

impl Gp0State {
    pub fn new() -> Self {
        Self { phase: Phase::AwaitCommand, buffer: Vec::with_capacity(16) }
    }

    pub fn ready_to_receive_command(&self) -> bool {
        matches!(self.phase, Phase::AwaitCommand)
    }
}

fn parse_color(command: u32) -> Color {
    Color { r: (command >> 16) as u8, g: (command >> 8) as u8, b: command as u8 }
}

fn parse_point(word: u32) -> Point {
    Point { x: word as i16, y: (word >> 16) as i16 }
}

fn parse_uv_clut(word: u32) -> UvClut {
    UvClut { u: word as u8, v: (word >> 8) as u8, clut: (word >> 16) as u16 }
}

fn parse_uv_texpage(word: u32) -> UvTexpage {
    UvTexpage { u: word as u8, v: (word >> 8) as u8, texpage: (word >> 16) as u16 }
}

fn parse_uv(word: u32) -> Uv {
    Uv { u: word as u8, v: (word >> 8) as u8 }
}

/// Number of argument words (beyond the initial command word) for commands that complete
/// immediately once their arguments are buffered.
fn arg_count(command_byte: u8) -> Option<u32> {
    match command_byte {
        0x00 => Some(0),             // NOP
        0x01 => Some(0),             // Clear cache
        0x28 => Some(4),             // Monochrome opaque quad
        0x2C => Some(8),             // Textured blended quad
        0x30 => Some(5),             // Gouraud triangle
        0x38 => Some(7),             // Gouraud quad
        0xC0 => Some(2),             // VRAM -> CPU (out of scope; arguments consumed and discarded)
        0xE1..=0xE6 => Some(0),      // Drawing environment settings
        _ => None,
    }
}

fn dispatch_complete_command<R: Renderer>(command: u32, args: &[u32], renderer: &mut R) {
    let command_byte = (command >> 24) as u8;
    match command_byte {
        0x00 | 0x01 | 0xE1..=0xE6 => {
            // No renderer-visible effect; environment settings beyond display config are
            // out of scope for this implementation.
        }
        0x28 => {
            let color = parse_color(command);
            let vertices = [
                parse_point(args[0]),
                parse_point(args[1]),
                parse_point(args[2]),
                parse_point(args[3]),
            ];
            renderer.monochrome_opaque_quad(color, vertices);
        }
        0x2C => {
            let color = parse_color(command);
            renderer.textured_blend_quad(
                color,
                parse_point(args[0]),
                parse_uv_clut(args[1]),
                parse_point(args[2]),
                parse_uv_texpage(args[3]),
                parse_point(args[4]),
                parse_uv(args[5]),
                parse_point(args[6]),
                parse_uv(args[7]),
            );
        }
        0x30 => {
            let v0 = ShadedVertex { color: parse_color(command), position: parse_point(args[0]) };
            let v1 = ShadedVertex { color: parse_color(args[1]), position: parse_point(args[2]) };
            let v2 = ShadedVertex { color: parse_color(args[3]), position: parse_point(args[4]) };
            renderer.gouraud_triangle(v0, v1, v2);
        }
        0x38 => {
            let v0 = ShadedVertex { color: parse_color(command), position: parse_point(args[0]) };
            let v1 = ShadedVertex { color: parse_color(args[1]), position: parse_point(args[2]) };
            let v2 = ShadedVertex { color: parse_color(args[3]), position: parse_point(args[4]) };
            let v3 = ShadedVertex { color: parse_color(args[5]), position: parse_point(args[6]) };
            renderer.gouraud_quad(v0, v1, v2, v3);
        }
        0xC0 => {
            log::debug!("VRAM-to-CPU GP0 transfer requested; read-back is not implemented");
        }
        _ => unreachable!("dispatch_complete_command called for an unclassified command byte"),
    }
}

pub fn write<R: Renderer>(state: &mut Gp0State, vram: &mut Vram, word: u32, renderer: &mut R) {
    match state.phase {
        Phase::AwaitCommand => {
            let command_byte = (word >> 24) as u8;
            if command_byte == 0xA0 {
                state.phase = Phase::AwaitArgs { command: word, remaining: 2 };
                state.buffer.clear();
                return;
            }

            match arg_count(command_byte) {
                Some(0) => dispatch_complete_command(word, &[], renderer),
                Some(n) => {
                    state.phase = Phase::AwaitArgs { command: word, remaining: n };
                    state.buffer.clear();
                }
                None => {
                    log::warn!("Unrecognized GP0 command {word:08X}, treating as NOP");
                }
            }
        }
        Phase::AwaitArgs { command, remaining } => {
            state.buffer.push(word);

            if remaining > 1 {
                state.phase = Phase::AwaitArgs { command, remaining: remaining - 1 };
                return;
            }

            let command_byte = (command >> 24) as u8;
            if command_byte == 0xA0 {
                let x = state.buffer[0] & 0xFFFF;
                let y = (state.buffer[0] >> 16) & 0xFFFF;
                let w = state.buffer[1] & 0xFFFF;
                let h = (state.buffer[1] >> 16) & 0xFFFF;
                let pixel_words = (w * h).div_ceil(2);

                if pixel_words == 0 {
                    state.phase = Phase::AwaitCommand;
                } else {
                    state.phase = Phase::AwaitImageData { x, y, w, h, remaining: pixel_words };
                }
            } else {
                dispatch_complete_command(command, &state.buffer, renderer);
                state.phase = Phase::AwaitCommand;
            }
        }
        Phase::AwaitImageData { x, y, w, h, remaining } => {
            let pixel_index = (w * h) - remaining * 2;
            write_image_pixel(vram, x, y, w, pixel_index, word as u16);
            if w * h > pixel_index + 1 {
                write_image_pixel(vram, x, y, w, pixel_index + 1, (word >> 16) as u16);
            }

            if remaining > 1 {
                state.phase = Phase::AwaitImageData { x, y, w, h, remaining: remaining - 1 };
            } else {
                state.phase = Phase::AwaitCommand;
            }
        }
    }
}

fn write_image_pixel(vram: &mut Vram, x: u32, y: u32, w: u32, pixel_index: u32, pixel: u16) {
    let px = (x + pixel_index % w) & 0x3FF;
    let py = (y + pixel_index / w) & 0x1FF;
    let offset = 2 * (py * 1024 + px);
    let bytes = pixel.to_le_bytes();
    vram[offset as usize] = bytes[0];
    vram[offset as usize + 1] = bytes[1];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct RecordingRenderer {
        quads: Vec<(Color, [Point; 4])>,
    }

    impl Renderer for RecordingRenderer {
        fn monochrome_opaque_quad(&mut self, color: Color, vertices: [Point; 4]) {
            self.quads.push((color, vertices));
        }

        fn textured_blend_quad(
            &mut self,
            _color: Color,
            _v0_pos: Point,
            _v0_uv: UvClut,
            _v1_pos: Point,
            _v1_uv: UvTexpage,
            _v2_pos: Point,
            _v2_uv: Uv,
            _v3_pos: Point,
            _v3_uv: Uv,
        ) {
        }

        fn gouraud_triangle(&mut self, _v0: ShadedVertex, _v1: ShadedVertex, _v2: ShadedVertex) {}

        fn gouraud_quad(
            &mut self,
            _v0: ShadedVertex,
            _v1: ShadedVertex,
            _v2: ShadedVertex,
            _v3: ShadedVertex,
        ) {
        }

        fn load_vram(&mut self, _x: u16, _y: u16, _w: u16, _h: u16, _pixels: &[u16]) {}

        fn render(&mut self) {}
    }

    // GP0($28RRGGBB) followed by four vertex words decodes into exactly one monochrome quad
    // once the fifth word arrives, with vertices in the order they were sent.
    #[test]
    fn monochrome_quad_dispatches_after_fifth_word() {
        let mut state = Gp0State::new();
        let mut vram: Box<Vram> = vec![0; 1024 * 1024].into_boxed_slice().try_into().unwrap();
        let mut renderer = RecordingRenderer::default();

        write(&mut state, &mut vram, 0x2810_2030, &mut renderer);
        assert!(renderer.quads.is_empty());

        write(&mut state, &mut vram, 0x0000_0000, &mut renderer);
        write(&mut state, &mut vram, 0x0010_0010, &mut renderer);
        write(&mut state, &mut vram, 0x0010_0000, &mut renderer);
        assert!(renderer.quads.is_empty());

        write(&mut state, &mut vram, 0x0000_0010, &mut renderer);

        assert_eq!(renderer.quads.len(), 1);
        let (color, vertices) = renderer.quads[0];
        assert_eq!(color, Color { r: 0x10, g: 0x20, b: 0x30 });
        assert_eq!(vertices[0], Point { x: 0, y: 0 });
        assert_eq!(vertices[3], Point { x: 0x10, y: 0 });
        assert!(state.ready_to_receive_command());
    }

    #[test]
    fn cpu_to_vram_transfer_writes_pixels() {
        let mut state = Gp0State::new();
        let mut vram: Box<Vram> = vec![0; 1024 * 1024].into_boxed_slice().try_into().unwrap();
        let mut renderer = RecordingRenderer::default();

        write(&mut state, &mut vram, 0xA000_0000, &mut renderer); // command
        write(&mut state, &mut vram, 0x0000_0000, &mut renderer); // x=0, y=0
        write(&mut state, &mut vram, (2u32 << 16) | 1, &mut renderer); // w=1, h=2
        write(&mut state, &mut vram, 0xBEEF_CAFE, &mut renderer);

        assert!(state.ready_to_receive_command());
        assert_eq!(u16::from_le_bytes([vram[0], vram[1]]), 0xCAFE);
        let row_offset = 2 * 1024;
        assert_eq!(u16::from_le_bytes([vram[row_offset], vram[row_offset + 1]]), 0xBEEF);
    }
}
