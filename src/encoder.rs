//! Bit-banged readers for synchronous-serial (SSI) position encoders.
//!
//! Two encoders share the control lines and each drives its own data line,
//! so one frame yields a reading for both channels at once.
//!
//! ## Protocols
//!
//! | Reader                  | Lines                     | Frame                                  |
//! |-------------------------|---------------------------|----------------------------------------|
//! | [`ClockedSelectReader`] | select, clock, 2 x data   | `nbits` pulses, sampled on rising edge |
//! | [`PulseCaptureReader`]  | clock, 2 x data           | 16 pulses, sampled on falling edge     |
//!
//! Bits arrive MSB first. Neither protocol has an acknowledge, so a read
//! cannot fail: a floating or shorted line just produces a wrong number.
//! The edge delays from [`crate::consts`] are part of the protocol.

use crate::consts::{ENCODER_EDGE_DELAY_US, ENCODER_IDLE_TIMEOUT_US, PULSE_CAPTURE_FRAME_BITS};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Bit width of one encoder channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Resolution {
    /// 1024 counts per turn.
    #[default]
    Bits10,
    /// 4096 counts per turn.
    Bits12,
    /// 65536 counts per turn.
    Bits16,
}

impl Resolution {
    /// Number of significant bits.
    pub const fn bits(self) -> u8 {
        match self {
            Resolution::Bits10 => 10,
            Resolution::Bits12 => 12,
            Resolution::Bits16 => 16,
        }
    }

    /// Mask of the legal raw range, e.g. `0x03ff` for 10 bits.
    pub const fn mask(self) -> u16 {
        match self {
            Resolution::Bits10 => 0x03ff,
            Resolution::Bits12 => 0x0fff,
            Resolution::Bits16 => 0xffff,
        }
    }

    /// Clamps a raw value into the legal range by dropping the high bits.
    pub const fn apply(self, raw: u16) -> u16 {
        raw & self.mask()
    }
}

/// One reading of both channels. Overwritten every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RawSample {
    /// Channel A.
    pub a: u16,
    /// Channel B.
    pub b: u16,
}

impl RawSample {
    /// Masks each channel to its resolution.
    pub const fn masked(self, a: Resolution, b: Resolution) -> Self {
        Self {
            a: a.apply(self.a),
            b: b.apply(self.b),
        }
    }
}

/// Something that can clock a frame out of the encoder pair.
pub trait EncoderRead {
    /// Reads one frame of `nbits` bits from both channels.
    ///
    /// Implementations with a fixed frame length ignore `nbits`; callers
    /// mask the result to the real resolution.
    fn read(&mut self, nbits: u8) -> RawSample;
}

fn sample<P: InputPin>(pin: &mut P) -> u16 {
    u16::from(pin.is_high().unwrap_or(false))
}

/// Reader for encoders with a select line (AEAT-6010 style).
///
/// Select low starts the frame; each clock low→high pulse shifts the next
/// bit out, sampled after the rising edge. Select high ends the frame.
/// Both control lines idle high.
#[derive(Debug)]
pub struct ClockedSelectReader<CS, CLK, DA, DB, D> {
    cs: CS,
    clk: CLK,
    data_a: DA,
    data_b: DB,
    delay: D,
}

impl<CS, CLK, DA, DB, D> ClockedSelectReader<CS, CLK, DA, DB, D>
where
    CS: OutputPin,
    CLK: OutputPin,
    DA: InputPin,
    DB: InputPin,
    D: DelayNs,
{
    /// Takes the lines and drives select and clock to their idle (high) level.
    pub fn new(cs: CS, clk: CLK, data_a: DA, data_b: DB, delay: D) -> Self {
        let mut reader = Self {
            cs,
            clk,
            data_a,
            data_b,
            delay,
        };
        let _ = reader.cs.set_high();
        let _ = reader.clk.set_high();
        reader
    }

    /// Releases the lines and the delay.
    pub fn free(self) -> (CS, CLK, DA, DB, D) {
        (self.cs, self.clk, self.data_a, self.data_b, self.delay)
    }
}

impl<CS, CLK, DA, DB, D> EncoderRead for ClockedSelectReader<CS, CLK, DA, DB, D>
where
    CS: OutputPin,
    CLK: OutputPin,
    DA: InputPin,
    DB: InputPin,
    D: DelayNs,
{
    fn read(&mut self, nbits: u8) -> RawSample {
        let mut a: u16 = 0;
        let mut b: u16 = 0;
        let _ = self.cs.set_low();
        self.delay.delay_us(ENCODER_EDGE_DELAY_US);
        for _ in 0..nbits.min(16) {
            a <<= 1;
            b <<= 1;
            let _ = self.clk.set_low();
            self.delay.delay_us(ENCODER_EDGE_DELAY_US);
            let _ = self.clk.set_high();
            self.delay.delay_us(ENCODER_EDGE_DELAY_US);
            a |= sample(&mut self.data_a);
            b |= sample(&mut self.data_b);
        }
        self.delay.delay_us(ENCODER_EDGE_DELAY_US);
        let _ = self.cs.set_high();
        RawSample { a, b }
    }
}

/// Reader for clock-only SSI encoders (Lika AS36 style).
///
/// Pulling the clock low latches the position inside the encoder. Each
/// following high pulse presents the next bit, which is sampled as the clock
/// falls. The frame is always 16 bits. Afterwards the clock is held high
/// for [`ENCODER_IDLE_TIMEOUT_US`] so the encoder drops back to idle before
/// the next latch.
#[derive(Debug)]
pub struct PulseCaptureReader<CLK, DA, DB, D> {
    clk: CLK,
    data_a: DA,
    data_b: DB,
    delay: D,
}

impl<CLK, DA, DB, D> PulseCaptureReader<CLK, DA, DB, D>
where
    CLK: OutputPin,
    DA: InputPin,
    DB: InputPin,
    D: DelayNs,
{
    /// Takes the lines and drives the clock to its idle (high) level.
    pub fn new(clk: CLK, data_a: DA, data_b: DB, delay: D) -> Self {
        let mut reader = Self {
            clk,
            data_a,
            data_b,
            delay,
        };
        let _ = reader.clk.set_high();
        reader
    }

    /// Releases the lines and the delay.
    pub fn free(self) -> (CLK, DA, DB, D) {
        (self.clk, self.data_a, self.data_b, self.delay)
    }
}

impl<CLK, DA, DB, D> EncoderRead for PulseCaptureReader<CLK, DA, DB, D>
where
    CLK: OutputPin,
    DA: InputPin,
    DB: InputPin,
    D: DelayNs,
{
    fn read(&mut self, _nbits: u8) -> RawSample {
        let mut a: u16 = 0;
        let mut b: u16 = 0;
        // Falling edge stores the position.
        let _ = self.clk.set_low();
        self.delay.delay_us(ENCODER_EDGE_DELAY_US);
        for _ in 0..PULSE_CAPTURE_FRAME_BITS {
            a <<= 1;
            b <<= 1;
            let _ = self.clk.set_high();
            self.delay.delay_us(ENCODER_EDGE_DELAY_US);
            let _ = self.clk.set_low();
            a |= sample(&mut self.data_a);
            b |= sample(&mut self.data_b);
            self.delay.delay_us(ENCODER_EDGE_DELAY_US);
        }
        self.delay.delay_us(ENCODER_EDGE_DELAY_US);
        let _ = self.clk.set_high();
        self.delay.delay_us(ENCODER_IDLE_TIMEOUT_US);
        RawSample { a, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    fn bits_msb_first(value: u16, nbits: u8) -> Vec<PinTransaction> {
        (0..nbits)
            .rev()
            .map(|i| {
                PinTransaction::get(if value & (1 << i) != 0 {
                    PinState::High
                } else {
                    PinState::Low
                })
            })
            .collect()
    }

    #[test]
    fn test_resolution_masks() {
        assert_eq!(Resolution::Bits10.apply(0xffff), 0x03ff);
        assert_eq!(Resolution::Bits12.apply(0xffff), 4095);
        assert_eq!(Resolution::Bits16.apply(0xffff), 0xffff);
        assert_eq!(Resolution::Bits12.bits(), 12);
    }

    #[test]
    fn test_clocked_select_frame() {
        let nbits = 10;
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut clk_states = vec![PinTransaction::set(PinState::High)];
        for _ in 0..nbits {
            clk_states.push(PinTransaction::set(PinState::Low));
            clk_states.push(PinTransaction::set(PinState::High));
        }
        let clk = PinMock::new(&clk_states);
        let data_a = PinMock::new(&bits_msb_first(0x2a5, nbits));
        let data_b = PinMock::new(&bits_msb_first(0x013, nbits));

        let mut reader = ClockedSelectReader::new(cs, clk, data_a, data_b, NoopDelay::new());
        let sample = reader.read(nbits);
        assert_eq!(sample, RawSample { a: 0x2a5, b: 0x013 });

        let (mut cs, mut clk, mut data_a, mut data_b, _) = reader.free();
        cs.done();
        clk.done();
        data_a.done();
        data_b.done();
    }

    #[test]
    fn test_clocked_select_twelve_bit_frame() {
        let nbits = 12;
        let cs = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut clk_states = vec![PinTransaction::set(PinState::High)];
        for _ in 0..nbits {
            clk_states.push(PinTransaction::set(PinState::Low));
            clk_states.push(PinTransaction::set(PinState::High));
        }
        let clk = PinMock::new(&clk_states);
        let data_a = PinMock::new(&bits_msb_first(0xfff, nbits));
        let data_b = PinMock::new(&bits_msb_first(0x800, nbits));

        let mut reader = ClockedSelectReader::new(cs, clk, data_a, data_b, NoopDelay::new());
        assert_eq!(reader.read(nbits), RawSample { a: 0xfff, b: 0x800 });

        let (mut cs, mut clk, mut data_a, mut data_b, _) = reader.free();
        cs.done();
        clk.done();
        data_a.done();
        data_b.done();
    }

    #[test]
    fn test_pulse_capture_reads_sixteen_bits_regardless_of_width() {
        let mut clk_states = vec![
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ];
        for _ in 0..16 {
            clk_states.push(PinTransaction::set(PinState::High));
            clk_states.push(PinTransaction::set(PinState::Low));
        }
        clk_states.push(PinTransaction::set(PinState::High));
        let clk = PinMock::new(&clk_states);
        let data_a = PinMock::new(&bits_msb_first(0xc123, 16));
        let data_b = PinMock::new(&bits_msb_first(0x0456, 16));

        let mut reader = PulseCaptureReader::new(clk, data_a, data_b, NoopDelay::new());
        let sample = reader.read(12);
        assert_eq!(sample, RawSample { a: 0xc123, b: 0x0456 });
        assert_eq!(
            sample.masked(Resolution::Bits12, Resolution::Bits12),
            RawSample { a: 0x123, b: 0x456 }
        );

        let (mut clk, mut data_a, mut data_b, _) = reader.free();
        clk.done();
        data_a.done();
        data_b.done();
    }
}
