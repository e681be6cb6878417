//! Chip-select multiplexer and the scoped select guard

use super::device::{DecoderSelectPins, SelectPattern, VirtualDeviceId};
use crate::error::Result;
use crate::gpio::DecoderGpio;

/// Something that can assert and release one chip select
///
/// Every bus transaction must be bracketed by exactly one `select()` and
/// one `deselect()`. Prefer [`SelectGuard::assert`], which makes the
/// release unconditional.
pub trait ChipSelect {
    /// Assert the currently active chip select
    fn select(&mut self) -> Result<()>;

    /// Release every chip select
    fn deselect(&mut self) -> Result<()>;
}

impl<C: ChipSelect + ?Sized> ChipSelect for &mut C {
    fn select(&mut self) -> Result<()> {
        (**self).select()
    }

    fn deselect(&mut self) -> Result<()> {
        (**self).deselect()
    }
}

/// Virtual chip-select multiplexer in front of a 74HC139 2-to-4 decoder
///
/// The decoder's enable input G is wired to the host's native CS0, so the
/// decoder output only goes low while the SPI controller is inside a
/// transfer. Before the transfer the two select lines must carry the
/// pattern of the wanted device; after it both lines are driven low again
/// so that all outputs sit inactive once CS0 rises.
///
/// A fresh multiplexer uses the default pins (GPIO24/GPIO25) and device A
/// until [`configure`](Self::configure) and
/// [`set_active_device`](Self::set_active_device) are called. The first
/// `select()` or `deselect()` on an unconfigured multiplexer makes the
/// default pins outputs.
pub struct ChipSelectMux<G> {
    gpio: G,
    pins: DecoderSelectPins,
    device: VirtualDeviceId,
    configured: bool,
}

impl<G: DecoderGpio> ChipSelectMux<G> {
    /// Create an unconfigured multiplexer on top of a GPIO driver
    pub fn new(gpio: G) -> Self {
        Self {
            gpio,
            pins: DecoderSelectPins::default(),
            device: VirtualDeviceId::default(),
            configured: false,
        }
    }

    /// Create a multiplexer, configure its pins and pick the active device
    pub fn with_config(gpio: G, pins: DecoderSelectPins, device: VirtualDeviceId) -> Result<Self> {
        let mut mux = Self::new(gpio);
        mux.configure(pins)?;
        mux.set_active_device(device);
        Ok(mux)
    }

    /// Assign the decoder select lines and make them outputs
    ///
    /// Must not be called while a transaction is in flight; taking
    /// `&mut self` keeps that from happening through a shared handle.
    pub fn configure(&mut self, pins: DecoderSelectPins) -> Result<()> {
        self.gpio.set_output(pins.a)?;
        self.gpio.set_output(pins.b)?;
        self.pins = pins;
        self.configured = true;
        log::debug!(
            "mux: Decoder select lines A=GPIO{}, B=GPIO{}",
            pins.a,
            pins.b
        );
        Ok(())
    }

    /// Record which decoder output the next `select()` asserts
    pub fn set_active_device(&mut self, device: VirtualDeviceId) {
        self.device = device;
    }

    /// Device asserted by `select()`
    pub fn active_device(&self) -> VirtualDeviceId {
        self.device
    }

    /// Current decoder select line assignment
    pub fn pins(&self) -> DecoderSelectPins {
        self.pins
    }

    /// Whether [`configure`](Self::configure) has run
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Borrow the GPIO driver
    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    /// Select the active device until the returned guard is dropped
    pub fn select_guard(&mut self) -> Result<SelectGuard<'_, Self>> {
        SelectGuard::assert(self)
    }

    /// Release the GPIO driver
    pub fn release(self) -> G {
        self.gpio
    }

    /// Make the current lines outputs if `configure` never ran
    fn ensure_configured(&mut self) -> Result<()> {
        if self.configured {
            return Ok(());
        }
        log::warn!(
            "mux: Lines not configured, using GPIO{}/GPIO{}",
            self.pins.a,
            self.pins.b
        );
        self.configure(self.pins)
    }

    fn drive(&mut self, pattern: SelectPattern) -> Result<()> {
        log::trace!(
            "mux: A(GPIO{})={:?} B(GPIO{})={:?}",
            self.pins.a,
            pattern.a,
            self.pins.b,
            pattern.b
        );
        self.gpio.write(self.pins.a, pattern.a)?;
        self.gpio.write(self.pins.b, pattern.b)
    }

    /// Drive both lines low, attempting B even when A fails
    fn release_lines(&mut self) -> Result<()> {
        let released = SelectPattern::RELEASED;
        log::trace!("mux: Releasing GPIO{}/GPIO{}", self.pins.a, self.pins.b);
        let a = self.gpio.write(self.pins.a, released.a);
        let b = self.gpio.write(self.pins.b, released.b);
        a.and(b)
    }
}

impl<G: DecoderGpio> ChipSelect for ChipSelectMux<G> {
    fn select(&mut self) -> Result<()> {
        self.ensure_configured()?;
        self.drive(self.device.pattern())
    }

    fn deselect(&mut self) -> Result<()> {
        let configured = self.ensure_configured();
        let released = self.release_lines();
        configured.and(released)
    }
}

/// Scoped chip-select assertion
///
/// Dropping the guard releases the chip select, so the decoder never
/// latches a selection when a transfer in between fails. Use
/// [`finish`](Self::finish) to observe the release result.
#[must_use = "the chip select is released as soon as the guard is dropped"]
pub struct SelectGuard<'a, C: ChipSelect + ?Sized> {
    cs: &'a mut C,
    released: bool,
}

impl<'a, C: ChipSelect + ?Sized> SelectGuard<'a, C> {
    /// Assert `cs` and return a guard that releases it
    ///
    /// If asserting fails part way, the lines are released before the
    /// error is returned.
    pub fn assert(cs: &'a mut C) -> Result<Self> {
        if let Err(e) = cs.select() {
            if let Err(release_err) = cs.deselect() {
                log::error!("mux: Release after failed select also failed: {}", release_err);
            }
            return Err(e);
        }
        Ok(Self {
            cs,
            released: false,
        })
    }

    /// Release the chip select and report the outcome
    pub fn finish(mut self) -> Result<()> {
        self.released = true;
        self.cs.deselect()
    }
}

impl<C: ChipSelect + ?Sized> Drop for SelectGuard<'_, C> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.cs.deselect() {
            log::error!("mux: Failed to release chip select: {}", e);
        }
    }
}
