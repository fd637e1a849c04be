//! VLP-2410 Hardware Library
//!
//! Drives VLP-2410 LED lighting controllers over a serial link using the
//! vendor's fixed-length ASCII command protocol.

pub mod controller;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use controller::Controller;
pub use error::{Error, Result};
pub use protocol::{checksum, checksum_hex, Command, ControlStrings, Frame};
pub use session::{Session, SETTLE_DELAY};
pub use transport::{Connector, Parity, PortSettings, SerialConnector, StopBits};

/// Default controller baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 38400;

/// Default data bits per character.
pub const DEFAULT_DATA_BITS: u8 = 8;
