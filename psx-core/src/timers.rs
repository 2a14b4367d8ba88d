//! Timer/counter registers (Timer 0, Timer 1, Timer 2)
//!
//! Each channel is driven externally by a `tick(channel)` call from the host loop rather than
//! being clocked in lockstep with CPU cycles; this is a simplification from real hardware, where
//! each channel's clock source can be the system clock, dot clock, or horizontal retrace.

use crate::interrupts::{InterruptRegisters, InterruptType};
use crate::num::U32Ext;

#[derive(Debug, Clone)]
struct Timer {
    counter: u16,
    target: u16,
    irq_at_target: bool,
    irq_at_max: bool,
    reset_at_target: bool,
    reached_target: bool,
    reached_max: bool,
}

impl Timer {
    fn new() -> Self {
        Self {
            counter: 0,
            target: 0,
            irq_at_target: false,
            irq_at_max: false,
            reset_at_target: false,
            reached_target: false,
            reached_max: false,
        }
    }

    fn write_mode(&mut self, value: u32) {
        self.reset_at_target = value.bit(3);
        self.irq_at_target = value.bit(4);
        self.irq_at_max = value.bit(5);

        // Writing the mode register resets the counter and clears any latched flags
        self.counter = 0;
        self.reached_target = false;
        self.reached_max = false;
    }

    fn read_mode(&mut self) -> u32 {
        let value = (u32::from(self.reset_at_target) << 3)
            | (u32::from(self.irq_at_target) << 4)
            | (u32::from(self.irq_at_max) << 5)
            | (u32::from(self.reached_target) << 11)
            | (u32::from(self.reached_max) << 12);

        // Reached-target/reached-max are latches; reading the mode register clears them
        self.reached_target = false;
        self.reached_max = false;

        value
    }

    /// Advances the counter by one tick, returning whether an IRQ should be requested.
    fn tick(&mut self) -> bool {
        self.counter = self.counter.wrapping_add(1);

        let mut irq = false;

        if self.counter == self.target {
            self.reached_target = true;
            irq |= self.irq_at_target;

            if self.reset_at_target {
                self.counter = 0;
            }
        }

        if self.counter == 0xFFFF {
            self.reached_max = true;
            irq |= self.irq_at_max;
        }

        irq
    }
}

const INTERRUPT_TYPES: [InterruptType; 3] =
    [InterruptType::Timer0, InterruptType::Timer1, InterruptType::Timer2];

#[derive(Debug, Clone)]
pub struct Timers {
    channels: [Timer; 3],
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

impl Timers {
    pub fn new() -> Self {
        Self { channels: [Timer::new(), Timer::new(), Timer::new()] }
    }

    /// Advances the given channel (0-2) by one tick and raises its interrupt flag if the
    /// channel's IRQ condition was met.
    pub fn tick(&mut self, channel: usize, interrupt_registers: &mut InterruptRegisters) {
        if self.channels[channel].tick() {
            interrupt_registers.set_interrupt_flag(INTERRUPT_TYPES[channel]);
        }
    }

    pub fn read_register(&mut self, address: u32) -> u32 {
        let channel = ((address >> 4) & 3) as usize;
        if channel > 2 {
            log::warn!("Unhandled timer register read: {address:08X}");
            return 0;
        }

        match address & 0xF {
            0x0 => self.channels[channel].counter.into(),
            0x4 => self.channels[channel].read_mode(),
            0x8 => self.channels[channel].target.into(),
            _ => {
                log::warn!("Unmapped timer register read: {address:08X}");
                0
            }
        }
    }

    pub fn write_register(&mut self, address: u32, value: u32) {
        let channel = ((address >> 4) & 3) as usize;
        if channel > 2 {
            log::warn!("Unhandled timer register write: {address:08X} {value:08X}");
            return;
        }

        match address & 0xF {
            0x0 => {
                self.channels[channel].counter = value as u16;
                log::trace!("Timer {channel} counter write: {:04X}", self.channels[channel].counter);
            }
            0x4 => {
                self.channels[channel].write_mode(value);
                log::trace!("Timer {channel} mode write: {value:08X}");
            }
            0x8 => {
                self.channels[channel].target = value as u16;
                log::trace!("Timer {channel} target write: {:04X}", self.channels[channel].target);
            }
            _ => log::warn!("Unmapped timer register write: {address:08X} {value:08X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_irq_on_target_and_reset() {
        let mut timers = Timers::new();
        let mut interrupt_registers = InterruptRegisters::new();

        timers.write_register(0x1120, 0); // timer 2 counter
        timers.write_register(0x1128, 5); // target
        timers.write_register(0x1124, 0b0001_1000); // reset_at_target + irq_at_target

        for _ in 0..4 {
            timers.tick(2, &mut interrupt_registers);
        }
        assert!(!interrupt_registers.interrupt_pending());

        interrupt_registers.write_interrupt_mask(0xFFFF);
        timers.tick(2, &mut interrupt_registers);

        assert!(interrupt_registers.interrupt_pending());
        assert_eq!(timers.read_register(0x1120), 0);
    }

    #[test]
    fn timer_irq_on_wrap() {
        let mut timers = Timers::new();
        let mut interrupt_registers = InterruptRegisters::new();
        interrupt_registers.write_interrupt_mask(0xFFFF);

        timers.write_register(0x1100, 0xFFFE); // timer 0 counter
        timers.write_register(0x1104, 0b0010_0000); // irq_at_max

        timers.tick(0, &mut interrupt_registers);
        assert!(!interrupt_registers.interrupt_pending());

        timers.tick(0, &mut interrupt_registers);
        assert!(interrupt_registers.interrupt_pending());
        assert_eq!(timers.read_register(0x1100), 0xFFFF);
    }
}
