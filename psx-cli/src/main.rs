//! Headless process entry point: loads a BIOS image, optionally sideloads a PS-X EXE, and drives
//! the emulator core in a tight host loop with no windowing or audio output.

use anyhow::Context;
use clap::Parser;
use psx_core::api::{Color, Point, Ps1Emulator, Renderer, ShadedVertex, Uv, UvClut, UvTexpage};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
struct Args {
    /// Path to a 512KB PS1 BIOS ROM image
    #[arg(short, long, default_value = "bios/bios.bin")]
    bios: PathBuf,

    /// Optional PS-X EXE to sideload after boot
    #[arg(short, long)]
    exe: Option<PathBuf>,

    /// Number of CPU steps to execute per host tick
    #[arg(long, default_value_t = 10_000)]
    steps_per_tick: u32,

    /// Number of host ticks to run before exiting
    #[arg(long, default_value_t = 60)]
    ticks: u32,

    /// Enable TTY putchar() tracing through the BIOS debug output hook
    #[arg(long)]
    tty: bool,
}

/// Discards decoded primitives; logs a one-line summary per flush. A windowing frontend would
/// implement `Renderer` to rasterize instead.
#[derive(Debug, Default)]
struct NullRenderer {
    quads: u64,
    triangles: u64,
    frames: u64,
}

impl Renderer for NullRenderer {
    fn monochrome_opaque_quad(&mut self, _color: Color, _vertices: [Point; 4]) {
        self.quads += 1;
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
        self.quads += 1;
    }

    fn gouraud_triangle(&mut self, _v0: ShadedVertex, _v1: ShadedVertex, _v2: ShadedVertex) {
        self.triangles += 1;
    }

    fn gouraud_quad(
        &mut self,
        _v0: ShadedVertex,
        _v1: ShadedVertex,
        _v2: ShadedVertex,
        _v3: ShadedVertex,
    ) {
        self.triangles += 2;
    }

    fn load_vram(&mut self, x: u16, y: u16, w: u16, h: u16, _pixels: &[u16]) {
        log::trace!("VRAM load at ({x}, {y}), {w}x{h}");
    }

    fn render(&mut self) {
        self.frames += 1;
        log::debug!(
            "Frame {}: {} quads, {} triangles decoded since last render",
            self.frames,
            self.quads,
            self.triangles
        );
        self.quads = 0;
        self.triangles = 0;
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let bios_rom = fs::read(&args.bios)
        .with_context(|| format!("failed to read BIOS image at {}", args.bios.display()))?;

    let mut emulator = Ps1Emulator::builder(bios_rom, NullRenderer::default())
        .tty_enabled(args.tty)
        .build()
        .context("failed to initialize emulator core")?;

    if let Some(exe_path) = &args.exe {
        let exe = fs::read(exe_path)
            .with_context(|| format!("failed to read EXE at {}", exe_path.display()))?;
        emulator.sideload_exe(&exe).context("failed to sideload EXE")?;
    }

    log::info!("Booting at PC={:08X}", emulator.cpu_pc());

    for tick in 0..args.ticks {
        emulator.tick(args.steps_per_tick);
        log::trace!("Completed tick {tick}, PC={:08X}", emulator.cpu_pc());
    }

    Ok(())
}
