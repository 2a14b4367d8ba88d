//! GPUSTAT and display-configuration state, set by GP1 commands

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DmaDirection {
    #[default]
    Off = 0,
    Fifo = 1,
    CpuToGpu = 2,
    GpuToCpu = 3,
}

impl DmaDirection {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Off,
            1 => Self::Fifo,
            2 => Self::CpuToGpu,
            3 => Self::GpuToCpu,
            _ => unreachable!("value & 3 is always <= 3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalResolution {
    #[default]
    TwoFiftySix = 0,
    ThreeTwenty = 1,
    FiveTwelve = 2,
    SixForty = 3,
}

impl Display for HorizontalResolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TwoFiftySix => write!(f, "256px"),
            Self::ThreeTwenty => write!(f, "320px"),
            Self::FiveTwelve => write!(f, "512px"),
            Self::SixForty => write!(f, "640px"),
        }
    }
}

impl HorizontalResolution {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::TwoFiftySix,
            1 => Self::ThreeTwenty,
            2 => Self::FiveTwelve,
            3 => Self::SixForty,
            _ => unreachable!("value & 3 is always <= 3"),
        }
    }

    pub fn to_pixels(self) -> u32 {
        match self {
            Self::TwoFiftySix => 256,
            Self::ThreeTwenty => 320,
            Self::FiveTwelve => 512,
            Self::SixForty => 640,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalResolution {
    #[default]
    Single = 0,
    Double = 1,
}

impl VerticalResolution {
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::Double } else { Self::Single }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoMode {
    #[default]
    Ntsc = 0,
    Pal = 1,
}

impl VideoMode {
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::Pal } else { Self::Ntsc }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepthBits {
    #[default]
    Fifteen = 0,
    TwentyFour = 1,
}

impl ColorDepthBits {
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::TwentyFour } else { Self::Fifteen }
    }
}

pub const DEFAULT_X_DISPLAY_RANGE: (u32, u32) = (0x200, 0x200 + 256 * 10);
pub const DEFAULT_Y_DISPLAY_RANGE: (u32, u32) = (0x010, 0x010 + 240);

#[derive(Debug, Clone)]
pub struct Registers {
    pub display_enabled: bool,
    pub dma_direction: DmaDirection,
    pub display_area_x: u32,
    pub display_area_y: u32,
    pub x_display_range: (u32, u32),
    pub y_display_range: (u32, u32),
    pub h_resolution: HorizontalResolution,
    pub v_resolution: VerticalResolution,
    pub video_mode: VideoMode,
    pub display_area_color_depth: ColorDepthBits,
    pub interlaced: bool,
    pub force_h_368px: bool,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        Self {
            display_enabled: false,
            dma_direction: DmaDirection::default(),
            display_area_x: 0,
            display_area_y: 0,
            x_display_range: DEFAULT_X_DISPLAY_RANGE,
            y_display_range: DEFAULT_Y_DISPLAY_RANGE,
            h_resolution: HorizontalResolution::default(),
            v_resolution: VerticalResolution::default(),
            video_mode: VideoMode::default(),
            display_area_color_depth: ColorDepthBits::default(),
            interlaced: false,
            force_h_368px: false,
        }
    }

    pub fn dot_clock_divider(&self) -> u8 {
        match self.h_resolution {
            HorizontalResolution::TwoFiftySix => 10,
            HorizontalResolution::ThreeTwenty => 8,
            HorizontalResolution::FiveTwelve => 5,
            HorizontalResolution::SixForty => 4,
        }
    }

    /// Composes the GPUSTAT word. `ready_to_receive_command` and `ready_to_send_vram` reflect
    /// the GP0 command-phase state machine; `ready_for_dma_block` is always true in this
    /// implementation since DMA transfers run to completion synchronously.
    pub fn read_status(
        &self,
        ready_to_receive_command: bool,
        ready_to_send_vram: bool,
        ready_for_dma_block: bool,
    ) -> u32 {
        let dma_request: u32 = match self.dma_direction {
            DmaDirection::Off => 0,
            DmaDirection::Fifo => 1,
            DmaDirection::CpuToGpu => ready_for_dma_block.into(),
            DmaDirection::GpuToCpu => ready_to_send_vram.into(),
        };

        (u32::from(self.force_h_368px) << 16)
            | ((self.h_resolution as u32) << 17)
            | ((self.v_resolution as u32) << 19)
            | ((self.video_mode as u32) << 20)
            | ((self.display_area_color_depth as u32) << 21)
            | (u32::from(self.interlaced) << 22)
            | (u32::from(!self.display_enabled) << 23)
            | (dma_request << 25)
            | (u32::from(ready_to_receive_command) << 26)
            | (u32::from(ready_to_send_vram) << 27)
            | (u32::from(ready_for_dma_block) << 28)
            | ((self.dma_direction as u32) << 29)
    }
}
