//! # encoder-readout
//!
//! A portable, no_std readout core for one or two SSI rotary encoders, built on
//! `embedded-hal` 1.0 traits.
//!
//! Once per tick the readout clocks a frame out of the encoders, turns the raw
//! counts into signed angles in hundredths of a degree relative to a stored
//! zero, and pushes the result to whatever outputs are attached: a serial
//! console, a character display on a two-wire bus, an 8-digit numeric
//! display on SPI.
//!
//! ## Building blocks
//!
//! - [`encoder`]: bit-banged SSI frame readers (clocked-select and pulse-capture)
//! - [`bus`]: a polled, bounded-wait two-wire bus master over a [`hal::BusPeripheral`]
//! - [`normalize`]: fixed-point raw-to-angle conversion with wrap into ±180°
//! - [`reference`]: zero references and their persisted four-byte layout
//! - [`sink`]: console, character display and numeric display outputs
//! - [`timer`]: tick sources (timer interrupt flag or blocking delay)
//! - [`scheduler`]: the fixed-period loop that ties it together
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` |
//! | `delay-loop`          | [`timer::DelayTick`]: ticks from `embedded_hal::delay::DelayNs` |
//! | `timer-isr` (default) | [`timer::TickFlag`]: ticks raised from a timer interrupt via `critical_section` |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use encoder_readout::config::ReadoutConfig;
//! use encoder_readout::scheduler::{Peripherals, Scheduler};
//! use encoder_readout::sink::ConsoleSink;
//!
//! let config = ReadoutConfig::from_switch_pins(&mut switches);
//! let hw = Peripherals { encoder, bus, tick: &TICK, watchdog, indicator, zero_button, delay, store };
//! let sinks = config.console.then(|| ConsoleSink::new(uart));
//! Scheduler::new(config, hw, sinks).run();
//! ```
//!
//! With `timer-isr`, the timer interrupt only has to call
//! [`TickFlag::raise()`](timer::TickFlag::raise) on a `static` flag.
//!
//! ## Integration Notes
//!
//! - The default tick is 15 counts × postscale 8 of a 2.064 ms counter, about 247.68 ms
//! - Every blocking wait is either bounded (bus) or feeds the watchdog (tick, settle)
//! - Only one bus master should own the two-wire port
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;

pub mod as5600;
pub mod bus;
pub mod config;
pub mod consts;
pub mod encoder;
pub mod error;
pub mod hal;
pub mod normalize;
pub mod poll;
pub mod reference;
pub mod scheduler;
pub mod sink;
pub mod timer;

#[cfg(test)]
mod sim;
