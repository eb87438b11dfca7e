//! Zero references and their persisted form.
//!
//! The stored layout is four bytes: channel A low/high at offsets 0/1,
//! channel B low/high at offsets 2/3. Erased non-volatile memory reads back as
//! all ones, so values are masked to the channel resolution as soon as they
//! are loaded; an out-of-range reference is never visible to the rest of the
//! crate.

use crate::encoder::{RawSample, Resolution};
use crate::hal::ReferenceStore;

/// Raw readings that count as zero angle, one per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ReferenceOffsets {
    /// Channel A reference.
    pub a: u16,
    /// Channel B reference.
    pub b: u16,
}

impl ReferenceOffsets {
    /// Decodes the persisted layout, masking each channel to its resolution.
    pub fn from_bytes(bytes: [u8; 4], a: Resolution, b: Resolution) -> Self {
        Self {
            a: a.apply(u16::from_le_bytes([bytes[0], bytes[1]])),
            b: b.apply(u16::from_le_bytes([bytes[2], bytes[3]])),
        }
    }

    /// Encodes into the persisted layout.
    pub fn to_bytes(self) -> [u8; 4] {
        let [a_lo, a_hi] = self.a.to_le_bytes();
        let [b_lo, b_hi] = self.b.to_le_bytes();
        [a_lo, a_hi, b_lo, b_hi]
    }

    /// Takes the current reading as the new zero.
    pub fn capture(sample: RawSample) -> Self {
        Self {
            a: sample.a,
            b: sample.b,
        }
    }

    /// Loads the references from `store`.
    ///
    /// # Errors
    /// Passes the storage error through; the caller decides on a fallback.
    pub fn load<S: ReferenceStore>(
        store: &mut S,
        a: Resolution,
        b: Resolution,
    ) -> Result<Self, S::Error> {
        let bytes = store.load()?;
        Ok(Self::from_bytes(bytes, a, b))
    }

    /// Writes the references to `store`.
    pub fn persist<S: ReferenceStore>(self, store: &mut S) -> Result<(), S::Error> {
        store.store(&self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemStore;

    #[test]
    fn test_erased_storage_masks_to_full_scale() {
        let mut store = MemStore::erased();
        let refs = ReferenceOffsets::load(&mut store, Resolution::Bits12, Resolution::Bits12)
            .unwrap();
        assert_eq!(refs, ReferenceOffsets { a: 0x0fff, b: 4095 });

        let refs = ReferenceOffsets::load(&mut store, Resolution::Bits10, Resolution::Bits16)
            .unwrap();
        assert_eq!(refs, ReferenceOffsets { a: 0x03ff, b: 0xffff });
    }

    #[test]
    fn test_byte_layout_is_low_then_high() {
        let refs = ReferenceOffsets { a: 0x0123, b: 0x0abc };
        assert_eq!(refs.to_bytes(), [0x23, 0x01, 0xbc, 0x0a]);
        assert_eq!(
            ReferenceOffsets::from_bytes([0x23, 0x01, 0xbc, 0x0a], Resolution::Bits12, Resolution::Bits12),
            refs
        );
    }

    #[test]
    fn test_persist_then_load() {
        let mut store = MemStore::erased();
        let refs = ReferenceOffsets::capture(RawSample { a: 700, b: 12 });
        refs.persist(&mut store).unwrap();
        assert_eq!(store.writes, 1);
        assert_eq!(
            ReferenceOffsets::load(&mut store, Resolution::Bits10, Resolution::Bits10),
            Ok(refs)
        );
    }

    #[test]
    fn test_store_failure_is_reported() {
        let mut store = MemStore::erased();
        store.fail = true;
        assert_eq!(
            ReferenceOffsets::load(&mut store, Resolution::Bits10, Resolution::Bits10),
            Err(())
        );
    }
}
