//! Hardware abstraction for the device instructions.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::trace;

/// What PINMODE, the read/write pin instructions, and the timing
/// instructions talk to.
pub trait Hal {
    /// Milliseconds since boot. Wraps like the board counter.
    fn millis(&self) -> u32;

    fn pin_mode(&mut self, pin: u8, mode: u8);

    fn digital_read(&mut self, pin: u8) -> u8;

    fn digital_write(&mut self, pin: u8, value: u8);

    fn analog_read(&mut self, pin: u8) -> i16;

    fn analog_write(&mut self, pin: u8, value: i16);
}

impl<T: Hal + ?Sized> Hal for &mut T {
    fn millis(&self) -> u32 {
        (**self).millis()
    }

    fn pin_mode(&mut self, pin: u8, mode: u8) {
        (**self).pin_mode(pin, mode)
    }

    fn digital_read(&mut self, pin: u8) -> u8 {
        (**self).digital_read(pin)
    }

    fn digital_write(&mut self, pin: u8, value: u8) {
        (**self).digital_write(pin, value)
    }

    fn analog_read(&mut self, pin: u8) -> i16 {
        (**self).analog_read(pin)
    }

    fn analog_write(&mut self, pin: u8, value: i16) {
        (**self).analog_write(pin, value)
    }
}

/// Recorded state of one simulated pin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pin {
    pub mode: u8,
    pub digital: u8,
    pub analog: i16,
}

#[derive(Debug, Clone, Copy)]
enum Clock {
    Wall(Instant),
    Manual(u32),
}

/// An in-memory board.
///
/// Outputs are recorded per pin and inputs can be set from the outside.
/// The clock is either the host's monotonic clock or a manual counter
/// that only moves when [`advance`](Self::advance) is called.
#[derive(Debug, Clone)]
pub struct SimulatedHal {
    clock: Clock,
    pins: BTreeMap<u8, Pin>,
}

impl SimulatedHal {
    /// A board whose clock follows the host.
    pub fn new() -> Self {
        Self {
            clock: Clock::Wall(Instant::now()),
            pins: BTreeMap::new(),
        }
    }

    /// A board whose clock starts at 0 and only moves on `advance`.
    pub fn with_manual_clock() -> Self {
        Self {
            clock: Clock::Manual(0),
            pins: BTreeMap::new(),
        }
    }

    /// Move a manual clock forward. No effect on a wall clock.
    pub fn advance(&mut self, ms: u32) {
        if let Clock::Manual(now) = &mut self.clock {
            *now = now.wrapping_add(ms);
        }
    }

    /// Current state of `pin`.
    pub fn pin(&self, pin: u8) -> Pin {
        self.pins.get(&pin).copied().unwrap_or_default()
    }

    /// Drive a digital input.
    pub fn set_digital_input(&mut self, pin: u8, value: u8) {
        self.pins.entry(pin).or_default().digital = value;
    }

    /// Drive an analog input.
    pub fn set_analog_input(&mut self, pin: u8, value: i16) {
        self.pins.entry(pin).or_default().analog = value;
    }
}

impl Default for SimulatedHal {
    fn default() -> Self {
        Self::new()
    }
}

impl Hal for SimulatedHal {
    fn millis(&self) -> u32 {
        match self.clock {
            Clock::Wall(boot) => boot.elapsed().as_millis() as u32,
            Clock::Manual(now) => now,
        }
    }

    fn pin_mode(&mut self, pin: u8, mode: u8) {
        trace!(pin, mode, "pinMode");
        self.pins.entry(pin).or_default().mode = mode;
    }

    fn digital_read(&mut self, pin: u8) -> u8 {
        self.pin(pin).digital
    }

    fn digital_write(&mut self, pin: u8, value: u8) {
        trace!(pin, value, "digitalWrite");
        self.pins.entry(pin).or_default().digital = value;
    }

    fn analog_read(&mut self, pin: u8) -> i16 {
        self.pin(pin).analog
    }

    fn analog_write(&mut self, pin: u8, value: i16) {
        trace!(pin, value, "analogWrite");
        self.pins.entry(pin).or_default().analog = value;
    }
}
