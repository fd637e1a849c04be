//! Error types for the VLP-2410 hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the controller.
#[derive(Error, Debug)]
pub enum Error {
    /// Serial port does not exist.
    #[error("Serial port not found: {0}")]
    PortNotFound(String),

    /// Serial port could not be opened or configured.
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Port settings the serial backend cannot express.
    #[error("Unsupported port settings: {0}")]
    UnsupportedSettings(String),

    /// A frame was sent while no port is open.
    #[error("Serial port is not open")]
    NotOpen,

    /// Serial write or flush failed. The frame is not considered delivered.
    #[error("Serial I/O error: {0}")]
    SerialIo(#[from] std::io::Error),

    /// Intensity outside the 3-digit payload range.
    #[error("Invalid intensity (must be 0-255): {0}")]
    InvalidIntensity(i32),

    /// Unknown parity name.
    #[error("Invalid parity: {0}")]
    InvalidParity(String),

    /// Unknown stop bits name.
    #[error("Invalid stop bits: {0}")]
    InvalidStopBits(String),
}

impl Error {
    /// Returns true if this error was raised while opening the port.
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            Error::PortNotFound(_) | Error::Serial(_) | Error::UnsupportedSettings(_)
        )
    }
}
