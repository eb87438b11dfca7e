//! Constants used across the readout core.
//!
//! This module collects the protocol timings, bus addresses and cadences
//! that the encoder readers, the bus master and the scheduler share.
//!
//! ## Key Concepts
//!
//! - **Edge delays**: microsecond pauses between clock edges on the encoder
//!   lines. These are part of the encoder contract; shortening them silently
//!   corrupts the frame instead of producing an error.
//! - **Retry budgets**: every wait on a bus status bit is a bounded poll,
//!   never a wall-clock timeout.
//! - **Cadences**: outputs are refreshed every N ticks, not every tick.

/// Number of status checks made by each bus phase before it gives up.
pub const BUS_RETRY_BUDGET: u8 = 255;

/// Pause between status checks while waiting on start, address, ack,
/// transmit and stop events (µs).
pub const BUS_POLL_INTERVAL_US: u32 = 2;

/// Pause between status checks while waiting for a received byte (µs).
///
/// 255 checks at 20 µs give a slave 5.1 ms to produce each byte.
pub const BUS_READ_POLL_INTERVAL_US: u32 = 20;

/// Half-period of the encoder clock and select setup time (µs).
pub const ENCODER_EDGE_DELAY_US: u32 = 1;

/// Time the pulse-capture encoder needs with the clock held high before
/// it returns to idle and will latch a fresh position (µs).
pub const ENCODER_IDLE_TIMEOUT_US: u32 = 16;

/// Fixed frame length of the pulse-capture encoder protocol.
pub const PULSE_CAPTURE_FRAME_BITS: u8 = 16;

/// Default frame length of the clocked-select encoder protocol.
pub const CLOCKED_SELECT_FRAME_BITS: u8 = 10;

/// Bus address of the auxiliary absolute encoder.
pub const AS5600_ADDRESS: u8 = 0x36;

/// Register pointer of the auxiliary encoder's raw angle (high byte first).
pub const AS5600_RAW_ANGLE_REGISTER: u8 = 0x0c;

/// Bus address of the serial character display.
pub const LCD_ADDRESS: u8 = 0x51;

/// Command prefix understood by the serial character display.
pub const LCD_COMMAND_PREFIX: u8 = 0xfe;

/// Display command: set cursor position (followed by the DDRAM address).
pub const LCD_SET_CURSOR: u8 = 0x45;

/// Display command: clear screen.
pub const LCD_CLEAR: u8 = 0x51;

/// Pause after a cursor command (ms).
pub const LCD_CURSOR_DELAY_MS: u32 = 3;

/// Pause after each character written to the display (ms).
pub const LCD_CHAR_DELAY_MS: u32 = 2;

/// Pause after a clear command (ms).
pub const LCD_CLEAR_DELAY_MS: u32 = 10;

/// Character display text buffer length.
pub const LCD_LINE_LEN: usize = 20;

/// Ticks skipped between character display clears.
pub const LCD_CLEAR_EVERY: u8 = 120;

/// Ticks skipped between character display redraws.
pub const LCD_REDRAW_EVERY: u8 = 4;

/// Ticks skipped between numeric display redraws.
pub const LED_REDRAW_EVERY: u8 = 2;

/// Default settle time before an operator zero request is trusted (ms).
pub const ZERO_SETTLE_MS: u32 = 50;

/// One full turn in hundredths of a degree.
pub const FULL_TURN: i32 = 36_000;

/// Half a turn in hundredths of a degree; the inclusive upper bound of
/// a normalized angle.
pub const HALF_TURN: i32 = 18_000;
