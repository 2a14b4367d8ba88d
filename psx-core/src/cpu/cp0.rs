//! COP0 (system control coprocessor): Status, Cause, EPC, BadVaddr and the other
//! registers that participate in exception entry/exit.

use crate::cpu::Exception;
use crate::num::U32Ext;

#[derive(Debug, Clone)]
pub struct StatusRegister {
    pub boot_exception_vectors: bool,
    pub isolate_cache: bool,
    pub interrupt_mask: u8,
    pub kernel_mode: bool,
    pub interrupts_enabled: bool,
    pub kernel_mode_previous: bool,
    pub interrupts_enabled_previous: bool,
    pub kernel_mode_old: bool,
    pub interrupts_enabled_old: bool,
}

impl StatusRegister {
    fn new() -> Self {
        Self {
            boot_exception_vectors: true,
            isolate_cache: false,
            interrupt_mask: 0,
            kernel_mode: true,
            interrupts_enabled: false,
            kernel_mode_previous: true,
            interrupts_enabled_previous: false,
            kernel_mode_old: true,
            interrupts_enabled_old: false,
        }
    }

    fn read(&self) -> u32 {
        (u32::from(self.boot_exception_vectors) << 22)
            | (u32::from(self.isolate_cache) << 16)
            | (u32::from(self.interrupt_mask) << 8)
            | (u32::from(self.kernel_mode_old) << 5)
            | (u32::from(self.interrupts_enabled_old) << 4)
            | (u32::from(self.kernel_mode_previous) << 3)
            | (u32::from(self.interrupts_enabled_previous) << 2)
            | (u32::from(self.kernel_mode) << 1)
            | u32::from(self.interrupts_enabled)
    }

    fn write(&mut self, value: u32) {
        self.boot_exception_vectors = value.bit(22);
        self.isolate_cache = value.bit(16);
        self.interrupt_mask = (value >> 8) as u8;
        self.kernel_mode_old = value.bit(5);
        self.interrupts_enabled_old = value.bit(4);
        self.kernel_mode_previous = value.bit(3);
        self.interrupts_enabled_previous = value.bit(2);
        self.kernel_mode = value.bit(1);
        self.interrupts_enabled = value.bit(0);

        log::trace!("CP0 SR write ({value:08X}): {self:#?}");
    }

    fn push_exception_stack(&mut self) {
        self.kernel_mode_old = self.kernel_mode_previous;
        self.interrupts_enabled_old = self.interrupts_enabled_previous;

        self.kernel_mode_previous = self.kernel_mode;
        self.interrupts_enabled_previous = self.interrupts_enabled;

        self.kernel_mode = true;
        self.interrupts_enabled = false;
    }

    fn pop_exception_stack(&mut self) {
        self.kernel_mode = self.kernel_mode_previous;
        self.interrupts_enabled = self.interrupts_enabled_previous;

        self.kernel_mode_previous = self.kernel_mode_old;
        self.interrupts_enabled_previous = self.interrupts_enabled_old;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceptionCode {
    #[default]
    Interrupt = 0,
    AddressErrorLoad = 4,
    AddressErrorStore = 5,
    BusErrorInstruction = 6,
    BusErrorData = 7,
    Syscall = 8,
    Breakpoint = 9,
    ReservedInstruction = 10,
    CoprocessorUnusable = 11,
    ArithmeticOverflow = 12,
}

impl ExceptionCode {
    fn from_bits(bits: u32) -> Self {
        match bits {
            0x00 => Self::Interrupt,
            0x04 => Self::AddressErrorLoad,
            0x05 => Self::AddressErrorStore,
            0x06 => Self::BusErrorInstruction,
            0x07 => Self::BusErrorData,
            0x08 => Self::Syscall,
            0x09 => Self::Breakpoint,
            0x0A => Self::ReservedInstruction,
            0x0B => Self::CoprocessorUnusable,
            0x0C => Self::ArithmeticOverflow,
            _ => {
                log::warn!("Unimplemented exception code: {bits:02X}");
                Self::Interrupt
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CauseRegister {
    pub branch_delay: bool,
    pub coprocessor_number: u8,
    pub interrupts_pending: u8,
    pub exception_code: ExceptionCode,
}

impl CauseRegister {
    fn new() -> Self {
        Self {
            branch_delay: false,
            coprocessor_number: 0,
            interrupts_pending: 0,
            exception_code: ExceptionCode::default(),
        }
    }

    fn read(&self) -> u32 {
        (u32::from(self.branch_delay) << 31)
            | (u32::from(self.coprocessor_number) << 28)
            | (u32::from(self.interrupts_pending) << 8)
            | ((self.exception_code as u32) << 2)
    }

    // MTC0 to Cause only affects the two software-settable interrupt-pending bits;
    // the rest of the register is read-only from software's perspective.
    fn write_software_interrupts(&mut self, value: u32) {
        self.interrupts_pending = (self.interrupts_pending & !0x03) | ((value >> 8) as u8 & 0x03);
    }

    pub fn set_hardware_interrupt_flag(&mut self, pending: bool) {
        self.interrupts_pending =
            (self.interrupts_pending & !0x04) | (u8::from(pending) << 2);
    }
}

#[derive(Debug, Clone)]
pub struct SystemControlCoprocessor {
    pub status: StatusRegister,
    pub cause: CauseRegister,
    pub epc: u32,
    pub bad_vaddr: u32,
}

const PROCESSOR_ID: u32 = 0x0000_0002;

impl SystemControlCoprocessor {
    pub fn new() -> Self {
        Self {
            status: StatusRegister::new(),
            cause: CauseRegister::new(),
            epc: 0,
            bad_vaddr: 0,
        }
    }

    pub fn interrupt_pending(&self) -> bool {
        self.status.interrupts_enabled
            && self.cause.interrupts_pending & self.status.interrupt_mask != 0
    }

    pub fn read_register(&self, register: u32) -> u32 {
        match register {
            3 | 5 | 6 | 7 | 9 | 11 => {
                log::trace!("CP0 read of debug register {register} (no defined semantics)");
                0
            }
            8 => self.bad_vaddr,
            12 => self.status.read(),
            13 => self.cause.read(),
            14 => self.epc,
            15 => PROCESSOR_ID,
            _ => {
                log::warn!("Read from undefined CP0 register {register}");
                0
            }
        }
    }

    pub fn write_register(&mut self, register: u32, value: u32) {
        match register {
            3 => log::trace!("CP0 BPC (breakpoint on execute) write {value:08X}"),
            5 => log::trace!("CP0 BDA (breakpoint on data access) write {value:08X}"),
            6 => log::trace!("CP0 JUMPDEST write {value:08X}"),
            7 => log::trace!("CP0 DCIC (breakpoint control) write {value:08X}"),
            9 => log::trace!("CP0 BDAM (data access breakpoint mask) write {value:08X}"),
            11 => log::trace!("CP0 BPCM (execute breakpoint mask) write {value:08X}"),
            12 => self.status.write(value),
            13 => self.cause.write_software_interrupts(value),
            _ => log::warn!("Write to undefined CP0 register {register}: {value:08X}"),
        }
    }

    pub fn execute_operation(&mut self, operation: u32) -> bool {
        match operation & 0x3F {
            0x10 => {
                // RFE: Restore from exception. Pops the mode/interrupt-enable stack; does not jump.
                self.status.pop_exception_stack();
                true
            }
            _ => {
                log::warn!("Unimplemented CP0 operation {operation:06X}");
                false
            }
        }
    }

    pub fn handle_exception(&mut self, exception: Exception, pc: u32, in_delay_slot: bool) {
        self.status.push_exception_stack();

        self.cause.branch_delay = in_delay_slot;
        self.cause.exception_code = exception.to_code();

        if let Some(bad_vaddr) = exception.bad_vaddr() {
            self.bad_vaddr = bad_vaddr;
        }

        self.epc = if in_delay_slot { pc.wrapping_sub(4) } else { pc };
    }
}
