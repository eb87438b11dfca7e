//! Fixed-period readout loop.
//!
//! The [`Scheduler`] owns every peripheral the readout touches and runs one
//! iteration per tick:
//!
//! 1. acquire a [`RawSample`] (SSI frame, optionally channel A from the bus encoder)
//! 2. capture a new zero reference if the operator asks for one
//! 3. normalize both channels
//! 4. push the [`Frame`] to the sinks
//! 5. raise the indicator, wait for the next tick, lower the indicator
//!
//! The indicator is high only while the loop idles, so its duty cycle on a
//! scope is the slack left in the period. If the work overruns the period
//! the next tick is simply late; nothing detects it.
//!
//! The watchdog is fed from every wait the loop makes: the tick wait and the
//! zero-request settle delay. Bus waits are bounded by their retry budget.

use crate::as5600::As5600;
use crate::bus::Bus;
use crate::config::ReadoutConfig;
use crate::encoder::{EncoderRead, RawSample};
use crate::hal::{ReferenceStore, Watchdog};
use crate::normalize::normalize;
use crate::reference::ReferenceOffsets;
use crate::sink::{Angles, Frame, Sink};
use crate::timer::{TickSource, wait_tick};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Hardware handed to the [`Scheduler`].
///
/// ## Type Parameters
///
/// - `E`: SSI encoder reader
/// - `B`: two-wire bus
/// - `T`: tick source
/// - `W`: watchdog
/// - `L`: slack indicator output
/// - `Z`: operator zero button (active low)
/// - `D`: delay for the zero-request settle time
/// - `S`: reference storage
#[derive(Debug)]
pub struct Peripherals<E, B, T, W, L, Z, D, S> {
    /// SSI encoder reader.
    pub encoder: E,
    /// Two-wire bus.
    pub bus: B,
    /// Tick source.
    pub tick: T,
    /// Watchdog.
    pub watchdog: W,
    /// Slack indicator.
    pub indicator: L,
    /// Zero button, pulled up, low while pressed.
    pub zero_button: Z,
    /// Settle delay.
    pub delay: D,
    /// Reference storage.
    pub store: S,
}

/// The readout's main loop. See the [module documentation](self).
#[derive(Debug)]
pub struct Scheduler<E, B, T, W, L, Z, D, S, K> {
    config: ReadoutConfig,
    hw: Peripherals<E, B, T, W, L, Z, D, S>,
    sinks: K,
    aux: As5600,
    references: ReferenceOffsets,
    last_aux: u16,
    zero_armed: bool,
    ticks: u32,
}

impl<E, B, T, W, L, Z, D, S, K> Scheduler<E, B, T, W, L, Z, D, S, K>
where
    E: EncoderRead,
    B: Bus,
    T: TickSource,
    W: Watchdog,
    L: OutputPin,
    Z: InputPin,
    D: DelayNs,
    S: ReferenceStore,
    K: Sink<B>,
{
    /// Builds the loop and hands `config` to the sinks, which drop out
    /// when their enable flag is off. Nothing touches the hardware until
    /// [`start()`](Self::start).
    pub fn new(
        config: ReadoutConfig,
        hw: Peripherals<E, B, T, W, L, Z, D, S>,
        mut sinks: K,
    ) -> Self {
        sinks.configure(&config);
        Self {
            config,
            hw,
            sinks,
            aux: As5600::default(),
            references: ReferenceOffsets::default(),
            last_aux: 0,
            zero_armed: true,
            ticks: 0,
        }
    }

    /// Uses a bus encoder at a non-default address for channel A.
    pub fn with_aux_encoder(mut self, aux: As5600) -> Self {
        self.aux = aux;
        self
    }

    /// The configuration fixed at construction.
    pub fn config(&self) -> &ReadoutConfig {
        &self.config
    }

    /// Current zero references.
    pub fn references(&self) -> ReferenceOffsets {
        self.references
    }

    /// Completed iterations (wrapping).
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Releases the hardware and the sinks.
    pub fn free(self) -> (Peripherals<E, B, T, W, L, Z, D, S>, K) {
        (self.hw, self.sinks)
    }

    /// Loads the zero references, initializes the sinks and waits for the
    /// first tick so the first iteration starts on a period boundary.
    ///
    /// Unreadable storage falls back to zero references.
    pub fn start(&mut self) {
        self.references = match ReferenceOffsets::load(
            &mut self.hw.store,
            self.config.channel_a(),
            self.config.channel_b(),
        ) {
            Ok(references) => references,
            Err(_) => {
                warn!("reference storage unreadable, using zero");
                ReferenceOffsets::default()
            }
        };
        debug!(
            "references a={} b={}",
            self.references.a,
            self.references.b
        );
        self.sinks.init(&mut self.hw.bus);
        wait_tick(&mut self.hw.tick, &mut self.hw.watchdog);
    }

    /// Runs one iteration and returns the values it pushed.
    pub fn run_once(&mut self) -> Frame {
        let raw = self.acquire();
        self.update_reference(raw);
        let frame = Frame {
            raw,
            angles: self.angles(raw),
        };
        self.sinks.push(&frame, &mut self.hw.bus);

        let _ = self.hw.indicator.set_high();
        wait_tick(&mut self.hw.tick, &mut self.hw.watchdog);
        let _ = self.hw.indicator.set_low();
        self.ticks = self.ticks.wrapping_add(1);
        trace!("tick {}", self.ticks);
        frame
    }

    /// [`start()`](Self::start), then [`run_once()`](Self::run_once) forever.
    pub fn run(&mut self) -> ! {
        self.start();
        loop {
            let _ = self.run_once();
        }
    }

    fn acquire(&mut self) -> RawSample {
        let mut raw = self.hw.encoder.read(self.config.frame_bits);
        if self.config.aux_encoder {
            // A failed read leaves the previous value in place.
            match self.aux.read_raw_angle(&mut self.hw.bus) {
                Ok(angle) => self.last_aux = angle,
                Err(err) => warn!("aux encoder: {}", err),
            }
            raw.a = self.last_aux;
        }
        raw.masked(self.config.channel_a(), self.config.channel_b())
    }

    // One capture per press: the button must be released before it arms again.
    fn update_reference(&mut self, raw: RawSample) {
        if !self.zero_requested() {
            self.zero_armed = true;
            return;
        }
        if !self.zero_armed {
            return;
        }
        self.settle();
        if !self.zero_requested() {
            return;
        }
        self.zero_armed = false;
        self.references = ReferenceOffsets::capture(raw);
        info!("zero captured a={} b={}", raw.a, raw.b);
        if self.references.persist(&mut self.hw.store).is_err() {
            warn!("zero reference not persisted");
        }
    }

    fn zero_requested(&mut self) -> bool {
        self.hw.zero_button.is_low().unwrap_or(false)
    }

    fn settle(&mut self) {
        for _ in 0..self.config.zero_settle_ms {
            self.hw.delay.delay_ms(1);
            self.hw.watchdog.feed();
        }
    }

    fn angles(&self, raw: RawSample) -> Angles {
        let a = normalize(raw.a, self.references.a, self.config.channel_a().scale());
        let mut b = normalize(raw.b, self.references.b, self.config.channel_b().scale());
        if let Some(ratio) = self.config.coupling {
            b = ratio.apply(b);
        }
        Angles { a, b }
    }
}
