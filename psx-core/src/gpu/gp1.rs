//! GP1 command processing
//!
//! GP1 commands configure the display: reset, DMA direction, display area origin, and display
//! mode. Unlike GP0 they take effect immediately and never enter a multi-word argument phase.

use crate::api::Renderer;
use crate::gpu::gp0::Gp0State;
use crate::gpu::registers::{
    ColorDepthBits, DmaDirection, HorizontalResolution, VerticalResolution, VideoMode,
    DEFAULT_X_DISPLAY_RANGE, DEFAULT_Y_DISPLAY_RANGE,
};
use crate::gpu::Gpu;
use crate::num::U32Ext;

const RESET_06_VALUE: u32 = DEFAULT_X_DISPLAY_RANGE.0 | (DEFAULT_X_DISPLAY_RANGE.1 << 12);
const RESET_07_VALUE: u32 = DEFAULT_Y_DISPLAY_RANGE.0 | (DEFAULT_Y_DISPLAY_RANGE.1 << 10);

impl<R: Renderer> Gpu<R> {
    pub(super) fn handle_gp1_write(&mut self, value: u32) {
        log::trace!("GP1 command write: {value:08X}");

        // Highest 8 bits of word determine command
        match value >> 24 {
            0x00 => self.reset(),
            0x01 => self.reset_command_buffer(),
            0x03 => self.set_display_enabled(value),
            0x04 => self.set_dma_direction(value),
            0x05 => self.set_display_area_start(value),
            0x06 => self.set_horizontal_display_range(value),
            0x07 => self.set_vertical_display_range(value),
            0x08 => self.set_display_mode(value),
            _ => log::warn!("Unimplemented GP1 command {value:08X}, ignoring"),
        }
    }

    // GP1($00): resets display configuration to power-on defaults. Does not clear VRAM.
    fn reset(&mut self) {
        log::trace!("GP1($00): Reset");

        self.reset_command_buffer();
        self.set_display_enabled(1);
        self.set_dma_direction(0);
        self.set_display_area_start(0);
        self.set_horizontal_display_range(RESET_06_VALUE);
        self.set_vertical_display_range(RESET_07_VALUE);
        self.set_display_mode(0);
    }

    // GP1($01)
    fn reset_command_buffer(&mut self) {
        self.gp0 = Gp0State::new();

        log::trace!("GP1($01): Reset command buffer");
    }

    // GP1($03)
    fn set_display_enabled(&mut self, value: u32) {
        // 0=on, 1=off
        self.registers.display_enabled = !value.bit(0);

        log::debug!("GP1($03): Display enabled - {}", self.registers.display_enabled);
    }

    // GP1($04)
    fn set_dma_direction(&mut self, value: u32) {
        self.registers.dma_direction = DmaDirection::from_bits(value);

        log::trace!("GP1($04): DMA direction - {:?}", self.registers.dma_direction);
    }

    // GP1($05)
    fn set_display_area_start(&mut self, value: u32) {
        self.registers.display_area_x = value & 0x3FF;
        self.registers.display_area_y = (value >> 10) & 0x1FF;

        log::debug!("GP1($05): Display area start");
        log::debug!("  X={}, Y={}", self.registers.display_area_x, self.registers.display_area_y);
    }

    // GP1($06)
    fn set_horizontal_display_range(&mut self, value: u32) {
        let x1 = value & 0xFFF;
        let x2 = (value >> 12) & 0xFFF;
        self.registers.x_display_range = (x1, x2);

        log::debug!("GP1($06): Horizontal display range");
    }

    // GP1($07)
    fn set_vertical_display_range(&mut self, value: u32) {
        let y1 = value & 0x3FF;
        let y2 = (value >> 10) & 0x3FF;
        self.registers.y_display_range = (y1, y2);

        log::debug!("GP1($07): Vertical display range");
    }

    // GP1($08)
    fn set_display_mode(&mut self, value: u32) {
        self.registers.h_resolution = HorizontalResolution::from_bits(value);
        self.registers.v_resolution = VerticalResolution::from_bit(value.bit(2));
        self.registers.video_mode = VideoMode::from_bit(value.bit(3));
        self.registers.display_area_color_depth = ColorDepthBits::from_bit(value.bit(4));
        self.registers.interlaced = value.bit(5);
        self.registers.force_h_368px = value.bit(6);

        log::debug!("GP1($08): Display mode");
        log::debug!("  Horizontal resolution: {}", self.registers.h_resolution);
        log::debug!("  Vertical resolution: {:?}", self.registers.v_resolution);
        log::debug!("  Video mode: {:?}", self.registers.video_mode);
    }
}
