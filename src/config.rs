//! Readout configuration.
//!
//! The peripheral set is decided once at power-up, from four mode switches
//! plus whatever the firmware hard-wires, and then frozen in a
//! [`ReadoutConfig`] handed to the [`Scheduler`](crate::scheduler::Scheduler).
//! Nothing in the tick loop reads the switches again.
//!
//! | Switch | Closed (low)               | Open (high, pulled up)       |
//! |--------|----------------------------|------------------------------|
//! | SW0    | console off                | console on                   |
//! | SW1    | no hardware flow control   | RTS/CTS flow control         |
//! | SW2    | SSI encoder on channel A   | absolute bus encoder on A    |
//! | SW3    | numeric display off        | numeric display on           |
//!
//! SW1 belongs to the UART setup, which happens outside this crate, so it is
//! sampled but not kept. The enable flags gate the sinks: every [`Sink`]
//! handed to the scheduler is [configured](crate::sink::Sink::configure) once with the
//! frozen value and stays silent when its flag is off.
//!
//! [`Sink`]: crate::sink::Sink

use crate::as5600::As5600;
use crate::consts::{CLOCKED_SELECT_FRAME_BITS, ZERO_SETTLE_MS};
use crate::encoder::Resolution;
use crate::normalize::GearRatio;
use embedded_hal::digital::InputPin;

/// Immutable description of what the readout drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ReadoutConfig {
    /// Push a line per tick to the console.
    pub console: bool,
    /// Drive the serial character display over the bus.
    pub char_display: bool,
    /// Drive the 8-digit numeric display.
    pub numeric_display: bool,
    /// Replace channel A with the absolute encoder on the bus.
    pub aux_encoder: bool,
    /// Clock pulses per SSI frame.
    pub frame_bits: u8,
    /// Resolution of the SSI channels.
    pub resolution: Resolution,
    /// Optional post-scale of channel B for a geared second axis.
    pub coupling: Option<GearRatio>,
    /// Time an operator zero request must be held before it is accepted (ms).
    pub zero_settle_ms: u32,
}

impl Default for ReadoutConfig {
    fn default() -> Self {
        Self {
            console: true,
            char_display: false,
            numeric_display: true,
            aux_encoder: false,
            frame_bits: CLOCKED_SELECT_FRAME_BITS,
            resolution: Resolution::Bits10,
            coupling: None,
            zero_settle_ms: ZERO_SETTLE_MS,
        }
    }
}

impl ReadoutConfig {
    /// Applies the switch states `[sw0, sw1, sw2, sw3]` (high = `true`) on
    /// top of the defaults. `sw1` is ignored.
    pub fn from_switches(switches: [bool; 4]) -> Self {
        let [sw0, _, sw2, sw3] = switches;
        Self::default()
            .with_console(sw0)
            .with_aux_encoder(sw2)
            .with_numeric_display(sw3)
    }

    /// Samples the four switch pins once and builds the configuration.
    ///
    /// A pin that cannot be read counts as high, the pulled-up default.
    pub fn from_switch_pins<P: InputPin>(pins: &mut [P; 4]) -> Self {
        let mut switches = [true; 4];
        for (state, pin) in switches.iter_mut().zip(pins.iter_mut()) {
            *state = pin.is_high().unwrap_or(true);
        }
        Self::from_switches(switches)
    }

    /// Enables or disables the console.
    pub const fn with_console(mut self, on: bool) -> Self {
        self.console = on;
        self
    }

    /// Enables or disables the character display.
    pub const fn with_char_display(mut self, on: bool) -> Self {
        self.char_display = on;
        self
    }

    /// Enables or disables the numeric display.
    pub const fn with_numeric_display(mut self, on: bool) -> Self {
        self.numeric_display = on;
        self
    }

    /// Enables or disables the absolute encoder on channel A.
    pub const fn with_aux_encoder(mut self, on: bool) -> Self {
        self.aux_encoder = on;
        self
    }

    /// Sets the SSI frame length and resolution.
    pub const fn with_encoder(mut self, frame_bits: u8, resolution: Resolution) -> Self {
        self.frame_bits = frame_bits;
        self.resolution = resolution;
        self
    }

    /// Post-scales channel B by `ratio`.
    pub const fn with_coupling(mut self, ratio: GearRatio) -> Self {
        self.coupling = Some(ratio);
        self
    }

    /// Sets the zero-request settle time.
    pub const fn with_zero_settle_ms(mut self, ms: u32) -> Self {
        self.zero_settle_ms = ms;
        self
    }

    /// Resolution of channel A: the absolute encoder's when it is enabled,
    /// the SSI resolution otherwise.
    pub const fn channel_a(&self) -> Resolution {
        if self.aux_encoder {
            As5600::RESOLUTION
        } else {
            self.resolution
        }
    }

    /// Resolution of channel B.
    pub const fn channel_b(&self) -> Resolution {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn test_defaults() {
        let config = ReadoutConfig::default();
        assert!(config.console);
        assert!(config.numeric_display);
        assert!(!config.char_display);
        assert_eq!(config.frame_bits, 10);
        assert_eq!(config.channel_a(), Resolution::Bits10);
    }

    #[test]
    fn test_switch_mapping() {
        let config = ReadoutConfig::from_switches([false, true, true, false]);
        assert!(!config.console);
        assert!(config.aux_encoder);
        assert!(!config.numeric_display);
        assert_eq!(config.channel_a(), Resolution::Bits12);
        assert_eq!(config.channel_b(), Resolution::Bits10);
    }

    #[test]
    fn test_switch_pins_sampled_once() {
        let mut pins = [
            PinMock::new(&[PinTransaction::get(PinState::High)]),
            PinMock::new(&[PinTransaction::get(PinState::Low)]),
            PinMock::new(&[PinTransaction::get(PinState::Low)]),
            PinMock::new(&[PinTransaction::get(PinState::High)]),
        ];
        let config = ReadoutConfig::from_switch_pins(&mut pins);
        assert!(config.console);
        assert!(!config.aux_encoder);
        assert!(config.numeric_display);
        for pin in pins.iter_mut() {
            pin.done();
        }
    }

    #[test]
    fn test_encoder_keeps_aux_channel_at_twelve_bits() {
        let config = ReadoutConfig::default()
            .with_aux_encoder(true)
            .with_encoder(16, Resolution::Bits16)
            .with_coupling(GearRatio::INVERTED);
        assert_eq!(config.channel_a(), Resolution::Bits12);
        assert_eq!(config.channel_b(), Resolution::Bits16);
        assert_eq!(config.frame_bits, 16);
        assert_eq!(config.coupling, Some(GearRatio::INVERTED));
    }

    #[test]
    fn test_disabling_aux_encoder_restores_ssi_resolution() {
        let config = ReadoutConfig::default()
            .with_aux_encoder(true)
            .with_aux_encoder(false);
        assert_eq!(config.channel_a(), Resolution::Bits10);
        assert_eq!(config.frame_bits, 10);

        let config = ReadoutConfig::default()
            .with_encoder(12, Resolution::Bits12)
            .with_aux_encoder(true)
            .with_encoder(10, Resolution::Bits10)
            .with_aux_encoder(false);
        assert_eq!(config.channel_a(), Resolution::Bits10);
        assert_eq!(config.channel_b(), Resolution::Bits10);
    }
}
