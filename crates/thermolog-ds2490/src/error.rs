//! Error types for the DS2490 bridge

use thermolog_core::Error as CoreError;
use thiserror::Error;

/// DS2490 specific errors
#[derive(Debug, Error)]
pub enum Ds2490Error {
    /// No bridge at the requested index
    #[error("DS2490 device {index} not found (VID:04fa PID:2490)")]
    DeviceNotFound {
        /// Index among the connected bridges
        index: usize,
    },

    /// Failed to open the USB device
    #[error("Failed to open DS2490: {0}")]
    OpenFailed(String),

    /// Failed to select the configuration, interface or alternate setting
    #[error("Failed to claim DS2490 interface: {0}")]
    ClaimFailed(String),

    /// A USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// A USB transfer or the idle wait timed out
    #[error("Timeout waiting for the DS2490")]
    Timeout,

    /// The status packet was malformed
    #[error("Invalid status packet from DS2490: {0}")]
    InvalidResponse(String),

    /// The bus is shorted
    #[error("1-Wire bus short detected")]
    BusShort,

    /// The interface has been released
    #[error("DS2490 not open")]
    NotOpen,

    /// Invalid bridge option
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for DS2490 operations
pub type Result<T> = std::result::Result<T, Ds2490Error>;

impl From<Ds2490Error> for CoreError {
    fn from(e: Ds2490Error) -> Self {
        match e {
            Ds2490Error::NotOpen => CoreError::BusNotOpen,
            Ds2490Error::DeviceNotFound { .. } => CoreError::BridgeNotFound,
            Ds2490Error::Timeout => CoreError::Timeout,
            _ => CoreError::TransferFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_mapping() {
        assert_eq!(CoreError::from(Ds2490Error::NotOpen), CoreError::BusNotOpen);
        assert_eq!(CoreError::from(Ds2490Error::Timeout), CoreError::Timeout);
        assert_eq!(
            CoreError::from(Ds2490Error::DeviceNotFound { index: 1 }),
            CoreError::BridgeNotFound
        );
        assert_eq!(
            CoreError::from(Ds2490Error::TransferFailed("stall".into())),
            CoreError::TransferFailed
        );
        assert_eq!(CoreError::from(Ds2490Error::BusShort), CoreError::TransferFailed);
    }
}
