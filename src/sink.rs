//! Output collaborators.
//!
//! The scheduler hands every tick's values to a [`Sink`] and never looks
//! back: sinks have no way to influence scheduling. Three sinks are provided,
//! matching the outputs of the readout board:
//!
//! - [`ConsoleSink`]: one text line per tick on any `core::fmt::Write`
//! - [`CharDisplaySink`]: serial character display on the two-wire bus
//! - [`NumericDisplaySink`]: MAX7219-driven 8-digit 7-segment display on SPI
//!
//! Sinks compose: `Option<S>` is a sink that may be switched off, and tuples
//! of sinks push to each member in order. The scheduler passes its
//! [`ReadoutConfig`] to [`Sink::configure`] once; each board sink then stays
//! silent unless its enable flag is set.

use crate::bus::Bus;
use crate::config::ReadoutConfig;
use crate::consts::{
    LCD_ADDRESS, LCD_CHAR_DELAY_MS, LCD_CLEAR, LCD_CLEAR_DELAY_MS, LCD_CLEAR_EVERY,
    LCD_COMMAND_PREFIX, LCD_CURSOR_DELAY_MS, LCD_LINE_LEN, LCD_REDRAW_EVERY, LED_REDRAW_EVERY,
    LCD_SET_CURSOR,
};
use crate::encoder::RawSample;
use core::fmt::Write;
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;
use heapless::String;

/// Normalized angles of both channels, in hundredths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Angles {
    /// Channel A.
    pub a: i32,
    /// Channel B.
    pub b: i32,
}

impl Angles {
    /// Both angles truncated to whole degrees.
    pub fn degrees(self) -> (i16, i16) {
        ((self.a / 100) as i16, (self.b / 100) as i16)
    }
}

/// Values produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Frame {
    /// Masked raw readings.
    pub raw: RawSample,
    /// Normalized angles.
    pub angles: Angles,
}

/// Which values a display shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DisplayMode {
    /// Raw counts.
    #[default]
    Raw,
    /// Signed whole degrees.
    Degrees,
}

/// Receiver of per-tick values.
///
/// `B` is the bus type, passed in so sinks living on the shared bus can use
/// it without owning it.
pub trait Sink<B: Bus + ?Sized> {
    /// Called once with the frozen configuration, before [`init`](Self::init).
    fn configure(&mut self, _config: &ReadoutConfig) {}

    /// Called once before the first tick.
    fn init(&mut self, _bus: &mut B) {}

    /// Called once per tick with that tick's values.
    fn push(&mut self, frame: &Frame, bus: &mut B);
}

impl<B: Bus + ?Sized> Sink<B> for () {
    fn push(&mut self, _frame: &Frame, _bus: &mut B) {}
}

impl<B: Bus + ?Sized, S: Sink<B>> Sink<B> for Option<S> {
    fn configure(&mut self, config: &ReadoutConfig) {
        if let Some(sink) = self {
            sink.configure(config);
        }
    }

    fn init(&mut self, bus: &mut B) {
        if let Some(sink) = self {
            sink.init(bus);
        }
    }

    fn push(&mut self, frame: &Frame, bus: &mut B) {
        if let Some(sink) = self {
            sink.push(frame, bus);
        }
    }
}

impl<B: Bus + ?Sized, S0: Sink<B>, S1: Sink<B>> Sink<B> for (S0, S1) {
    fn configure(&mut self, config: &ReadoutConfig) {
        self.0.configure(config);
        self.1.configure(config);
    }

    fn init(&mut self, bus: &mut B) {
        self.0.init(bus);
        self.1.init(bus);
    }

    fn push(&mut self, frame: &Frame, bus: &mut B) {
        self.0.push(frame, bus);
        self.1.push(frame, bus);
    }
}

impl<B: Bus + ?Sized, S0: Sink<B>, S1: Sink<B>, S2: Sink<B>> Sink<B> for (S0, S1, S2) {
    fn configure(&mut self, config: &ReadoutConfig) {
        self.0.configure(config);
        self.1.configure(config);
        self.2.configure(config);
    }

    fn init(&mut self, bus: &mut B) {
        self.0.init(bus);
        self.1.init(bus);
        self.2.init(bus);
    }

    fn push(&mut self, frame: &Frame, bus: &mut B) {
        self.0.push(frame, bus);
        self.1.push(frame, bus);
        self.2.push(frame, bus);
    }
}

/// Text console: `raw_a raw_b angle_a angle_b` per tick.
///
/// If the last bus transaction of the tick failed, its code is appended as
/// `  i2c err=N`; put this sink after the bus-driven sinks to see their
/// errors on the same line.
#[derive(Debug)]
pub struct ConsoleSink<W> {
    writer: W,
    enabled: bool,
}

impl<W: Write> ConsoleSink<W> {
    /// Wraps a text writer, typically a UART.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            enabled: true,
        }
    }

    /// Releases the writer.
    pub fn free(self) -> W {
        self.writer
    }
}

impl<B: Bus + ?Sized, W: Write> Sink<B> for ConsoleSink<W> {
    fn configure(&mut self, config: &ReadoutConfig) {
        self.enabled = config.console;
    }

    fn init(&mut self, _bus: &mut B) {
        if self.enabled {
            let _ = self.writer.write_str("\r\nEncoder readout.");
        }
    }

    fn push(&mut self, frame: &Frame, bus: &mut B) {
        if !self.enabled {
            return;
        }
        let _ = write!(
            self.writer,
            "\r\n{:4} {:4} {:6} {:6}",
            frame.raw.a, frame.raw.b, frame.angles.a, frame.angles.b
        );
        if let Some(err) = bus.last_error() {
            let _ = write!(self.writer, "  i2c err={}", err.code());
        }
    }
}

/// Serial character display on the two-wire bus.
///
/// Redrawn every fifth tick and cleared every 121st, since a glitch on the
/// bus can leave stray characters behind. Characters are sent one per
/// transaction with a pause after each so the display can keep up.
#[derive(Debug)]
pub struct CharDisplaySink<D> {
    delay: D,
    address: u8,
    mode: DisplayMode,
    clear_countdown: u8,
    redraw_countdown: u8,
    enabled: bool,
}

impl<D: DelayNs> CharDisplaySink<D> {
    /// Display at the default address.
    pub fn new(delay: D, mode: DisplayMode) -> Self {
        Self::with_address(delay, mode, LCD_ADDRESS)
    }

    /// Display at a custom 7-bit address.
    pub fn with_address(delay: D, mode: DisplayMode, address: u8) -> Self {
        Self {
            delay,
            address,
            mode,
            clear_countdown: 0,
            redraw_countdown: 0,
            enabled: true,
        }
    }

    fn clear<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let _ = bus.write(self.address, &[LCD_COMMAND_PREFIX, LCD_CLEAR]);
        self.delay.delay_ms(LCD_CLEAR_DELAY_MS);
    }

    fn draw<B: Bus + ?Sized>(&mut self, frame: &Frame, bus: &mut B) {
        let _ = bus.write(self.address, &[LCD_COMMAND_PREFIX, LCD_SET_CURSOR, 0x00]);
        self.delay.delay_ms(LCD_CURSOR_DELAY_MS);
        let line = format_line(frame, self.mode);
        for &byte in line.as_bytes() {
            let _ = bus.write(self.address, &[byte]);
            self.delay.delay_ms(LCD_CHAR_DELAY_MS);
        }
    }
}

fn format_line(frame: &Frame, mode: DisplayMode) -> String<LCD_LINE_LEN> {
    let mut line = String::new();
    let _ = match mode {
        DisplayMode::Raw => write!(line, "A:{:4} B:{:4}    ", frame.raw.a, frame.raw.b),
        DisplayMode::Degrees => {
            let (a, b) = frame.angles.degrees();
            write!(line, "A:{:4} B:{:4}    ", a, b)
        }
    };
    line
}

impl<B: Bus + ?Sized, D: DelayNs> Sink<B> for CharDisplaySink<D> {
    fn configure(&mut self, config: &ReadoutConfig) {
        self.enabled = config.char_display;
    }

    fn push(&mut self, frame: &Frame, bus: &mut B) {
        if !self.enabled {
            return;
        }
        if self.clear_countdown == 0 {
            self.clear(bus);
            self.clear_countdown = LCD_CLEAR_EVERY;
        } else {
            self.clear_countdown -= 1;
        }
        if self.redraw_countdown == 0 {
            self.draw(frame, bus);
            self.redraw_countdown = LCD_REDRAW_EVERY;
        } else {
            self.redraw_countdown -= 1;
        }
    }
}

/// Code-B value that lights the minus segment.
pub const CODE_B_MINUS: u8 = 0x0a;
/// Code-B value that blanks a digit.
pub const CODE_B_BLANK: u8 = 0x0f;

/// Digits `aaaabbbb` for two unsigned values, rightmost digit first.
///
/// Values above 9999 show their low four digits.
pub fn unsigned_digits(a: u16, b: u16) -> [u8; 8] {
    let mut digits = [0u8; 8];
    let (mut a, mut b) = (a, b);
    for i in 0..4 {
        digits[i] = (b % 10) as u8;
        b /= 10;
        digits[i + 4] = (a % 10) as u8;
        a /= 10;
    }
    digits
}

/// Digits `SaaaSbbb` for two signed three-digit values, rightmost digit
/// first; `S` is a minus sign or blank.
pub fn signed_digits(a: i16, b: i16) -> [u8; 8] {
    let mut digits = [0u8; 8];
    digits[3] = if b < 0 { CODE_B_MINUS } else { CODE_B_BLANK };
    digits[7] = if a < 0 { CODE_B_MINUS } else { CODE_B_BLANK };
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    for i in 0..3 {
        digits[i] = (b % 10) as u8;
        b /= 10;
        digits[i + 4] = (a % 10) as u8;
        a /= 10;
    }
    digits
}

/// Eight-digit 7-segment display behind a MAX7219 on SPI.
///
/// Digits are numbered 1 to 8 from the right and use the chip's Code-B
/// decoder. Redrawn every third tick.
#[derive(Debug)]
pub struct NumericDisplaySink<SPI> {
    spi: SPI,
    mode: DisplayMode,
    countdown: u8,
    enabled: bool,
}

impl<SPI: SpiDevice> NumericDisplaySink<SPI> {
    const REG_DECODE_MODE: u8 = 0x09;
    const REG_INTENSITY: u8 = 0x0a;
    const REG_SCAN_LIMIT: u8 = 0x0b;
    const REG_SHUTDOWN: u8 = 0x0c;
    const REG_DISPLAY_TEST: u8 = 0x0f;

    /// Wraps the display's SPI device.
    pub fn new(spi: SPI, mode: DisplayMode) -> Self {
        Self {
            spi,
            mode,
            countdown: 0,
            enabled: true,
        }
    }

    /// Releases the SPI device.
    pub fn free(self) -> SPI {
        self.spi
    }

    fn write_register(&mut self, register: u8, value: u8) {
        let _ = self.spi.write(&[register, value]);
    }

    fn show(&mut self, digits: [u8; 8]) {
        for (i, digit) in (1u8..).zip(digits) {
            self.write_register(i, digit);
        }
    }
}

impl<B: Bus + ?Sized, SPI: SpiDevice> Sink<B> for NumericDisplaySink<SPI> {
    fn configure(&mut self, config: &ReadoutConfig) {
        self.enabled = config.numeric_display;
    }

    /// Wakes the chip, enables Code-B on all eight digits and shows
    /// `76543210` as a lamp test.
    fn init(&mut self, _bus: &mut B) {
        if !self.enabled {
            return;
        }
        self.write_register(Self::REG_SHUTDOWN, 0x01);
        self.write_register(Self::REG_DISPLAY_TEST, 0x00);
        self.write_register(Self::REG_INTENSITY, 0x01);
        self.write_register(Self::REG_SCAN_LIMIT, 0x07);
        self.write_register(Self::REG_DECODE_MODE, 0xff);
        self.show([0, 1, 2, 3, 4, 5, 6, 7]);
    }

    fn push(&mut self, frame: &Frame, _bus: &mut B) {
        if !self.enabled {
            return;
        }
        if self.countdown > 0 {
            self.countdown -= 1;
            return;
        }
        let digits = match self.mode {
            DisplayMode::Raw => unsigned_digits(frame.raw.a, frame.raw.b),
            DisplayMode::Degrees => {
                let (a, b) = frame.angles.degrees();
                signed_digits(a, b)
            }
        };
        self.show(digits);
        self.countdown = LED_REDRAW_EVERY;
    }
}
