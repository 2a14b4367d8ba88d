//! LSI CW33300, the PS1 CPU
//!
//! Uses the MIPS I instruction set and is binary-compatible with the R3000

mod cp0;
mod instructions;

use crate::api::Renderer;
use crate::bus::Bus;
use crate::cpu::cp0::ExceptionCode;
use cp0::SystemControlCoprocessor;
use std::mem;

const RESET_VECTOR: u32 = 0xBFC0_0000;
const EXCEPTION_VECTOR: u32 = 0x8000_0080;
const BOOT_EXCEPTION_VECTOR: u32 = 0xBFC0_0180;

#[derive(Debug, Clone)]
struct Registers {
    gpr: [u32; 32],
    pc: u32,
    hi: u32,
    lo: u32,
    delayed_branch: Option<u32>,
    delayed_load: (u32, u32),
    delayed_load_next: (u32, u32),
}

impl Registers {
    fn new() -> Self {
        Self {
            gpr: [0; 32],
            pc: RESET_VECTOR,
            hi: 0,
            lo: 0,
            delayed_branch: None,
            delayed_load: (0, 0),
            delayed_load_next: (0, 0),
        }
    }

    fn read_gpr_lwl_lwr(&self, register: u32) -> u32 {
        // LWL and LWR are not affected by load delays; they can read in-flight values from load
        // instructions
        let (delayed_register, delayed_value) = self.delayed_load;
        if delayed_register == register { delayed_value } else { self.gpr[register as usize] }
    }

    fn write_gpr(&mut self, register: u32, value: u32) {
        if register == 0 {
            return;
        }

        self.gpr[register as usize] = value;

        // A non-load register write should discard any in-progress delayed load to that
        // register. Not doing this causes the BIOS to boot incorrectly
        if self.delayed_load.0 == register {
            self.delayed_load = (0, 0);
        }
    }

    fn write_gpr_delayed(&mut self, register: u32, value: u32) {
        if register == 0 {
            return;
        }

        // Undocumented: If two consecutive load instructions write to the same register, the
        // first delayed load is canceled
        if self.delayed_load.0 == register {
            self.delayed_load = (0, 0);
        }
        self.delayed_load_next = (register, value);
    }

    fn process_delayed_loads(&mut self) {
        // No need for an if check here; if register is 0 then value will be 0
        let (register, value) = self.delayed_load;
        self.gpr[register as usize] = value;

        debug_assert!(!(register == 0 && value != 0));

        self.delayed_load = mem::take(&mut self.delayed_load_next);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exception {
    Interrupt,
    AddressErrorLoad(u32),
    AddressErrorStore(u32),
    Syscall,
    Breakpoint,
    ReservedInstruction,
    CoprocessorUnusable(u32),
    ArithmeticOverflow,
}

impl Exception {
    fn to_code(self) -> ExceptionCode {
        match self {
            Self::Interrupt => ExceptionCode::Interrupt,
            Self::AddressErrorLoad(_) => ExceptionCode::AddressErrorLoad,
            Self::AddressErrorStore(_) => ExceptionCode::AddressErrorStore,
            Self::Syscall => ExceptionCode::Syscall,
            Self::Breakpoint => ExceptionCode::Breakpoint,
            Self::ReservedInstruction => ExceptionCode::ReservedInstruction,
            Self::CoprocessorUnusable(_) => ExceptionCode::CoprocessorUnusable,
            Self::ArithmeticOverflow => ExceptionCode::ArithmeticOverflow,
        }
    }

    fn bad_vaddr(self) -> Option<u32> {
        match self {
            Self::AddressErrorLoad(addr) | Self::AddressErrorStore(addr) => Some(addr),
            _ => None,
        }
    }

    fn coprocessor_number(self) -> Option<u32> {
        match self {
            Self::CoprocessorUnusable(cop) => Some(cop),
            _ => None,
        }
    }
}

type CpuResult<T> = Result<T, Exception>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpSize {
    Byte,
    HalfWord,
    Word,
}

#[derive(Debug, Clone)]
pub struct R3000 {
    registers: Registers,
    cp0: SystemControlCoprocessor,
}

impl Default for R3000 {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_bus_write {
    ($name:ident, $write_fn:ident) => {
        fn $name<R: Renderer>(&mut self, bus: &mut Bus<'_, R>, address: u32, value: u32) {
            if self.cp0.status.isolate_cache {
                // If cache is isolated, send writes directly to scratchpad RAM
                // The BIOS isolates cache on startup to zero out scratchpad
                bus.$write_fn(0x1F800000 | (address & 0x3FF), value);
                return;
            }

            if address == 0xFFFE0130 {
                // Cache control register. There is no instruction/data cache model in this
                // implementation, so the write is accepted and discarded.
                log::trace!("Cache control write (ignored): {value:08X}");
                return;
            }

            let Some(physical) = translate_address(address) else {
                log::warn!("Write to unmapped address {address:08X}, ignoring");
                return;
            };
            bus.$write_fn(physical, value);
        }
    };
}

impl R3000 {
    pub fn new() -> Self {
        Self { registers: Registers::new(), cp0: SystemControlCoprocessor::new() }
    }

    pub fn pc(&self) -> u32 {
        self.registers.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.registers.pc = pc;
        self.registers.delayed_branch = None;
    }

    pub fn get_gpr(&self, register: u32) -> u32 {
        self.registers.gpr[register as usize]
    }

    pub fn set_gpr(&mut self, register: u32, value: u32) {
        self.registers.write_gpr(register, value);
    }

    /// Executes one instruction, following the fetch/interrupt-poll/execute/delayed-load
    /// ordering described for the interpreter loop: interrupts are sampled before the opcode at
    /// the current PC is dispatched, and pending delayed loads always commit at the end of the
    /// step regardless of whether an exception was raised.
    pub fn execute_instruction<R: Renderer>(&mut self, bus: &mut Bus<'_, R>) {
        let pc = self.registers.pc;

        if pc & 3 != 0 {
            // Address error on opcode fetch
            self.handle_exception(
                Exception::AddressErrorLoad(pc),
                pc,
                self.registers.delayed_branch.is_some(),
            );
            self.registers.process_delayed_loads();
            return;
        }

        self.cp0.cause.set_hardware_interrupt_flag(bus.hardware_interrupt_pending());
        if self.cp0.interrupt_pending() {
            self.handle_exception(
                Exception::Interrupt,
                pc,
                self.registers.delayed_branch.is_some(),
            );
            self.registers.process_delayed_loads();
            return;
        }

        let opcode = self.bus_read_u32(bus, pc);
        let (in_delay_slot, next_pc) = match self.registers.delayed_branch.take() {
            Some(address) => (true, address),
            None => (false, pc.wrapping_add(4)),
        };
        self.registers.pc = next_pc;

        if let Err(exception) = self.execute_opcode(opcode, pc, bus) {
            self.handle_exception(exception, pc, in_delay_slot);
        }

        self.registers.process_delayed_loads();
    }

    fn bus_read_u8<R: Renderer>(&self, bus: &mut Bus<'_, R>, address: u32) -> u32 {
        match translate_address(address) {
            Some(physical) => bus.read_u8(physical),
            None => {
                log::warn!("Read from unmapped address {address:08X}, returning 0");
                0
            }
        }
    }

    fn bus_read_u16<R: Renderer>(&self, bus: &mut Bus<'_, R>, address: u32) -> u32 {
        match translate_address(address) {
            Some(physical) => bus.read_u16(physical),
            None => {
                log::warn!("Read from unmapped address {address:08X}, returning 0");
                0
            }
        }
    }

    fn bus_read_u32<R: Renderer>(&self, bus: &mut Bus<'_, R>, address: u32) -> u32 {
        match translate_address(address) {
            Some(physical) => bus.read_u32(physical),
            None => {
                log::warn!("Read from unmapped address {address:08X}, returning 0");
                0
            }
        }
    }

    impl_bus_write!(bus_write_u8, write_u8);
    impl_bus_write!(bus_write_u16, write_u16);
    impl_bus_write!(bus_write_u32, write_u32);

    fn handle_exception(&mut self, exception: Exception, pc: u32, in_delay_slot: bool) {
        if let Some(cop) = exception.coprocessor_number() {
            self.cp0.cause.coprocessor_number = cop as u8;
        }
        self.cp0.handle_exception(exception, pc, in_delay_slot);

        self.registers.pc = if self.cp0.status.boot_exception_vectors {
            BOOT_EXCEPTION_VECTOR
        } else {
            EXCEPTION_VECTOR
        };
        self.registers.delayed_branch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Color, Point, ShadedVertex, Uv, UvClut, UvTexpage};
    use crate::dma::DmaController;
    use crate::gpu::Gpu;
    use crate::interrupts::InterruptRegisters;
    use crate::memory::Memory;
    use crate::timers::Timers;

    #[derive(Debug, Default)]
    struct NullRenderer;

    impl Renderer for NullRenderer {
        fn monochrome_opaque_quad(&mut self, _color: Color, _vertices: [Point; 4]) {}

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

    struct TestSystem {
        cpu: R3000,
        gpu: Gpu<NullRenderer>,
        memory: Memory,
        dma_controller: DmaController,
        interrupt_registers: InterruptRegisters,
        timers: Timers,
    }

    impl TestSystem {
        fn new() -> Self {
            Self {
                cpu: R3000::new(),
                gpu: Gpu::new(NullRenderer),
                memory: Memory::new(vec![0; 512 * 1024]).unwrap(),
                dma_controller: DmaController::new(),
                interrupt_registers: InterruptRegisters::new(),
                timers: Timers::new(),
            }
        }

        fn load_program(&mut self, base: u32, words: &[u32]) {
            for (i, word) in words.iter().enumerate() {
                let bytes = word.to_le_bytes();
                for (j, byte) in bytes.iter().enumerate() {
                    self.memory.write_main_ram_u8(base + (4 * i + j) as u32, *byte);
                }
            }
        }

        fn step(&mut self) {
            self.cpu.execute_instruction(&mut Bus {
                gpu: &mut self.gpu,
                memory: &mut self.memory,
                dma_controller: &mut self.dma_controller,
                interrupt_registers: &mut self.interrupt_registers,
                timers: &mut self.timers,
            });
        }
    }

    // ADDIU $1, $0, 0x1000; ADDIU $2, $0, 0x55; SW $2, 0($1); LW $3, 0($1)
    #[test]
    fn addiu_sw_lw_round_trips_through_ram() {
        let mut sys = TestSystem::new();
        sys.cpu.set_pc(0);
        sys.load_program(
            0,
            &[0x2401_1000, 0x2402_0055, 0xAC22_0000, 0x8C23_0000],
        );

        for _ in 0..4 {
            sys.step();
        }

        assert_eq!(sys.cpu.get_gpr(3), 0x55);
    }

    // ADDIU $2, $0, 1; BEQ $0, $0, 1; ADDIU $2, $0, 2; ADDIU $2, $0, 3
    // The branch delay slot (the second ADDIU) still executes before the branch lands on the
    // fourth instruction.
    #[test]
    fn branch_delay_slot_executes_before_branch_target() {
        let mut sys = TestSystem::new();
        sys.cpu.set_pc(0);
        sys.load_program(
            0,
            &[0x2402_0001, 0x1000_0001, 0x2402_0002, 0x2402_0003],
        );

        for _ in 0..4 {
            sys.step();
        }

        assert_eq!(sys.cpu.get_gpr(2), 3);
    }

    // ADDIU $2, $0, 99; LW $2, 0($29); ADDIU $2, $0, 5
    // The ALU write in the delay slot of the load wins over the pending delayed load.
    #[test]
    fn alu_write_cancels_pending_delayed_load() {
        let mut sys = TestSystem::new();
        sys.cpu.set_pc(0);
        sys.cpu.set_gpr(29, 0x1000);
        sys.memory.write_main_ram_u32(0x1000, 0xDEAD_BEEF);
        sys.load_program(
            0,
            &[0x2402_0063, 0x8FA2_0000, 0x2402_0005],
        );

        for _ in 0..3 {
            sys.step();
        }

        assert_eq!(sys.cpu.get_gpr(2), 5);
    }

    #[test]
    fn syscall_vectors_to_exception_handler() {
        let mut sys = TestSystem::new();
        sys.cpu.set_pc(0x8000_0100);
        sys.cpu.cp0.status.boot_exception_vectors = false;
        sys.load_program(0x0000_0100, &[0x0000_000C]);

        sys.step();

        assert_eq!(sys.cpu.pc(), 0x8000_0080);
        assert_eq!(sys.cpu.cp0.epc, 0x8000_0100);
        assert_eq!(sys.cpu.cp0.cause.exception_code, cp0::ExceptionCode::Syscall);
        assert!(!sys.cpu.cp0.cause.branch_delay);
    }

    // P1: register 0 is always zero after a step, even when driven by an arbitrary stream of
    // decoded opcodes (most of which will be reserved-instruction exceptions, which is fine —
    // the property under test is register 0's invariant, not successful execution).
    #[test]
    fn register_zero_is_always_zero_under_random_opcodes() {
        use rand::Rng;

        let mut sys = TestSystem::new();
        sys.cpu.set_pc(0x8000_0000);
        sys.cpu.cp0.status.boot_exception_vectors = false;

        let mut rng = rand::thread_rng();
        let program: Vec<u32> = (0..256).map(|_| rng.gen::<u32>()).collect();
        sys.load_program(0, &program);

        for _ in 0..1000 {
            sys.step();
            assert_eq!(sys.cpu.get_gpr(0), 0);
        }
    }

    #[test]
    fn unaligned_word_load_raises_address_error() {
        let mut sys = TestSystem::new();
        sys.cpu.set_pc(0x8000_0000);
        sys.cpu.cp0.status.boot_exception_vectors = false;
        sys.cpu.set_gpr(1, 0x0000_0001);
        // LW $2, 0($1) - address 1 is not 4-byte aligned
        sys.load_program(0x0000_0000, &[0x8C22_0000]);

        sys.step();

        assert_eq!(sys.cpu.pc(), 0x8000_0080);
        assert_eq!(sys.cpu.cp0.bad_vaddr, 1);
        assert_eq!(sys.cpu.cp0.cause.exception_code, cp0::ExceptionCode::AddressErrorLoad);
    }
}

/// Maps a 32-bit virtual address to its physical address according to the standard R3000
/// segmentation: the top 3 bits of the virtual address select a mask that is ANDed against the
/// full address. KUSEG and KSEG2 pass the address through unchanged; KSEG0 clears bit 29 (cached
/// mirror of physical memory) and KSEG1 clears bits 29-31 (uncached mirror).
fn translate_address(address: u32) -> Option<u32> {
    let mask = match address >> 29 {
        0x0..=0x3 => 0xFFFF_FFFF, // KUSEG: 0x00000000-0x7FFFFFFF
        0x4 => 0x7FFF_FFFF,       // KSEG0: 0x80000000-0x9FFFFFFF
        0x5 => 0x1FFF_FFFF,       // KSEG1: 0xA0000000-0xBFFFFFFF
        0x6..=0x7 => 0xFFFF_FFFF, // KSEG2: 0xC0000000-0xFFFFFFFF
        _ => unreachable!(),
    };

    let physical = address & mask;
    if physical >= 0x2000_0000 {
        // No device is mapped above the end of KSEG1's physical aliasing range once masked,
        // except for KSEG2 addresses which pass through unmasked and are handled by the bus's
        // own unmapped-address fallback.
        if address >> 29 == 0x6 || address >> 29 == 0x7 {
            return Some(physical);
        }
        return None;
    }

    Some(physical)
}
