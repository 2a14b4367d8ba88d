//! PS1 memory map

use crate::api::Renderer;
use crate::cpu::OpSize;
use crate::dma::DmaController;
use crate::gpu::Gpu;
use crate::interrupts::InterruptRegisters;
use crate::memory::Memory;
use crate::timers::Timers;

pub struct Bus<'a, R> {
    pub gpu: &'a mut Gpu<R>,
    pub memory: &'a mut Memory,
    pub dma_controller: &'a mut DmaController,
    pub interrupt_registers: &'a mut InterruptRegisters,
    pub timers: &'a mut Timers,
}

macro_rules! memory_map {
    ($address:expr, [
        main_ram => $main_ram:expr,
        expansion_1 => $expansion_1:expr,
        scratchpad => $scratchpad:expr,
        io_registers => $io_registers:expr,
        $(expansion_2 => $expansion_2:expr,)?
        $(bios => $bios:expr,)?
        _ => $default:expr $(,)?
    ]) => {
        match $address {
            0x00000000..=0x007FFFFF => $main_ram,
            0x1F000000..=0x1F7FFFFF => $expansion_1,
            0x1F800000..=0x1F800FFF => $scratchpad,
            0x1F801000..=0x1F801FFF => $io_registers,
            $(0x1F802000..=0x1F803FFF => $expansion_2,)?
            $(0x1FC00000..=0x1FFFFFFF => $bios,)?
            _ => $default
        }
    }
}

impl<'a, R: Renderer> Bus<'a, R> {
    pub fn read_u8(&mut self, address: u32) -> u32 {
        memory_map!(address, [
            main_ram => self.memory.read_main_ram_u8(address).into(),
            expansion_1 => {
                log::trace!("Unhandled 8-bit expansion 1 read {address:08X}");
                0xFF
            },
            scratchpad => self.memory.read_scratchpad_u8(address).into(),
            io_registers => self.read_io_register(address, OpSize::Byte),
            bios => self.memory.read_bios_u8(address).into(),
            _ => {
                log::warn!("Unmapped 8-bit read {address:08X}");
                0xFF
            }
        ])
    }

    pub fn read_u16(&mut self, address: u32) -> u32 {
        memory_map!(address, [
            main_ram => self.memory.read_main_ram_u16(address).into(),
            expansion_1 => {
                log::trace!("Unhandled 16-bit expansion 1 read {address:08X}");
                0xFFFF
            },
            scratchpad => self.memory.read_scratchpad_u16(address).into(),
            io_registers => self.read_io_register(address, OpSize::HalfWord),
            bios => self.memory.read_bios_u16(address).into(),
            _ => {
                log::warn!("Unmapped 16-bit read {address:08X}");
                0xFFFF
            }
        ])
    }

    pub fn read_u32(&mut self, address: u32) -> u32 {
        memory_map!(address, [
            main_ram => self.memory.read_main_ram_u32(address),
            expansion_1 => {
                log::trace!("Unhandled 32-bit expansion 1 read {address:08X}");
                0xFFFF_FFFF
            },
            scratchpad => self.memory.read_scratchpad_u32(address),
            io_registers => self.read_io_register(address, OpSize::Word),
            bios => self.memory.read_bios_u32(address),
            _ => {
                log::warn!("Unmapped 32-bit read {address:08X}");
                0xFFFF_FFFF
            }
        ])
    }

    pub fn write_u8(&mut self, address: u32, value: u32) {
        memory_map!(address, [
            main_ram => self.memory.write_main_ram_u8(address, value as u8),
            expansion_1 => unmapped_register_write("Expansion Device 1", address, value, OpSize::Byte),
            scratchpad => self.memory.write_scratchpad_u8(address, value as u8),
            io_registers => self.write_io_register(address, value, OpSize::Byte),
            expansion_2 => unmapped_register_write("Expansion Device 2", address, value, OpSize::Byte),
            _ => unmapped_register_write("bus", address, value, OpSize::Byte)
        ]);
    }

    pub fn write_u16(&mut self, address: u32, value: u32) {
        memory_map!(address, [
            main_ram => self.memory.write_main_ram_u16(address, value as u16),
            expansion_1 => unmapped_register_write("Expansion Device 1", address, value, OpSize::HalfWord),
            scratchpad => self.memory.write_scratchpad_u16(address, value as u16),
            io_registers => self.write_io_register(address, value, OpSize::HalfWord),
            expansion_2 => unmapped_register_write("Expansion Device 2", address, value, OpSize::HalfWord),
            _ => unmapped_register_write("bus", address, value, OpSize::HalfWord)
        ]);
    }

    pub fn write_u32(&mut self, address: u32, value: u32) {
        memory_map!(address, [
            main_ram => self.memory.write_main_ram_u32(address, value),
            expansion_1 => unmapped_register_write("Expansion Device 1", address, value, OpSize::Word),
            scratchpad => self.memory.write_scratchpad_u32(address, value),
            io_registers => self.write_io_register(address, value, OpSize::Word),
            expansion_2 => unmapped_register_write("Expansion Device 2", address, value, OpSize::Word),
            _ => unmapped_register_write("bus", address, value, OpSize::Word)
        ]);
    }

    pub fn hardware_interrupt_pending(&self) -> bool {
        self.interrupt_registers.interrupt_pending()
    }

    #[allow(clippy::match_same_arms)]
    fn read_io_register(&mut self, address: u32, size: OpSize) -> u32 {
        log::trace!("I/O register read: {address:08X} {size:?}");

        match address & 0xFFFF {
            // Memory control / delay registers have no effect on emulated behavior
            0x1000..=0x1023 => 0,
            0x1070 => self.interrupt_registers.read_interrupt_status(),
            0x1074 => self.interrupt_registers.read_interrupt_mask(),
            0x10F0 => self.dma_controller.read_control(),
            0x1080..=0x10EF => match (address >> 2) & 3 {
                0 => self.dma_controller.read_channel_address(address),
                1 => self.dma_controller.read_channel_length(address),
                2 => self.dma_controller.read_channel_control(address),
                _ => {
                    log::warn!("Unmapped DMA register read {address:08X} {size:?}");
                    0
                }
            },
            0x10F4 => self.dma_controller.read_interrupt(),
            0x1100..=0x113F => self.timers.read_register(address),
            0x1810 => self.gpu.read_port(),
            0x1814 => self.gpu.read_status_register(),
            _ => {
                log::warn!("Unmapped I/O register read {address:08X} {size:?}");
                0
            }
        }
    }

    fn write_io_register(&mut self, address: u32, value: u32, size: OpSize) {
        log::trace!("I/O register write: {address:08X} {value:08X} {size:?}");

        match address & 0xFFFF {
            // Memory control / delay registers are accepted and ignored
            0x1000..=0x1023 => {}
            0x1070 => self.interrupt_registers.write_interrupt_status(value),
            0x1074 => self.interrupt_registers.write_interrupt_mask(value),
            0x1080..=0x10EF => match (address >> 2) & 3 {
                0 => self.dma_controller.write_channel_address(address, value),
                1 => self.dma_controller.write_channel_length(address, value),
                2 => self.dma_controller.write_channel_control(
                    address,
                    value,
                    self.gpu,
                    self.memory,
                    self.interrupt_registers,
                ),
                3 => log::warn!("Invalid DMA register write: {address:08X} {value:08X} {size:?}"),
                _ => unreachable!("value & 3 is always <= 3"),
            },
            0x10F0 => self.dma_controller.write_control(value),
            0x10F4 => self.dma_controller.write_interrupt(value, self.interrupt_registers),
            0x1100..=0x112F => self.timers.write_register(address, value),
            0x1810 => self.gpu.write_gp0_command(value),
            0x1814 => self.gpu.write_gp1_command(value),
            _ => log::warn!("Unmapped I/O register write {address:08X} {value:08X} {size:?}"),
        }
    }
}

fn unmapped_register_write(name: &str, address: u32, value: u32, size: OpSize) {
    log::trace!("Unmapped/ignored {name} write: {address:08X} {value:08X} {size:?}");
}
