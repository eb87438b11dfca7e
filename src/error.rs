//! Bus error taxonomy.
//!
//! The bus master is the only component with an error channel. Encoder
//! frames have no acknowledgement, so a bad line yields bad bits rather
//! than an error.

use thiserror::Error;

/// Failure of a single bus transaction.
///
/// Each variant maps onto the numeric code reported on the console:
/// `1` timeout, `2` write collision, `3` arbitration loss. "No error" is `0`,
/// which is represented as `Option::<BusError>::None`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum BusError {
    /// A phase exhausted its retry budget waiting on a status bit.
    #[error("bus timeout")]
    Timeout,
    /// A stale write-collision flag was found before the transaction began.
    #[error("bus write collision")]
    WriteCollision,
    /// Another master won arbitration during a previous operation.
    #[error("bus arbitration lost")]
    ArbitrationLost,
}

impl BusError {
    /// Numeric error code as reported on the console.
    pub const fn code(self) -> u8 {
        match self {
            BusError::Timeout => 1,
            BusError::WriteCollision => 2,
            BusError::ArbitrationLost => 3,
        }
    }

    /// Inverse of [`code()`](BusError::code). `0` and unknown codes map to `None`.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(BusError::Timeout),
            2 => Some(BusError::WriteCollision),
            3 => Some(BusError::ArbitrationLost),
            _ => None,
        }
    }
}

/// Numeric code of an optional error, `0` meaning none.
pub fn error_code(error: Option<BusError>) -> u8 {
    error.map_or(0, BusError::code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_console_numbering() {
        assert_eq!(error_code(None), 0);
        assert_eq!(error_code(Some(BusError::Timeout)), 1);
        assert_eq!(error_code(Some(BusError::WriteCollision)), 2);
        assert_eq!(error_code(Some(BusError::ArbitrationLost)), 3);
    }

    #[test]
    fn test_unknown_code_is_none() {
        assert_eq!(BusError::from_code(0), None);
        assert_eq!(BusError::from_code(9), None);
        assert_eq!(BusError::from_code(3), Some(BusError::ArbitrationLost));
    }
}
