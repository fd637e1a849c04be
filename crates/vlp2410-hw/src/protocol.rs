//! VLP-2410 command protocol definitions and encoding.
//!
//! Frame structure (all fields ASCII):
//! - Header: start marker (default `@`)
//! - Channel: `00`
//! - Instruction: `L1`/`L0` (on/off) or `F` + 3-digit intensity
//! - ID: `00`
//! - Checksum: 8-bit sum of every preceding byte, as two uppercase hex digits
//! - Delimiter: end marker (default CRLF)
//!
//! On/off frames carry pre-computed checksums that are only valid for the
//! default `@` header. The device firmware expects them verbatim.

use crate::{Error, Result};
use std::fmt;

/// Channel field. The controller only exposes channel 00.
pub const CHANNEL: &[u8] = b"00";

/// ID specification field.
pub const ID: &[u8] = b"00";

/// Instruction, ID and checksum for the on command.
pub const ON_BODY: &[u8] = b"L1007D";

/// Instruction, ID and checksum for the off command.
pub const OFF_BODY: &[u8] = b"L0007C";

/// Intensity instruction token.
pub const INTENSITY_TOKEN: u8 = b'F';

/// Default header marker.
pub const DEFAULT_START: &str = "@";

/// Default delimiter.
pub const DEFAULT_END: &str = "\r\n";

/// Calculates the 8-bit wrapping sum of all bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &x| acc.wrapping_add(x))
}

/// Renders the checksum of `bytes` as two uppercase hex digits.
pub fn checksum_hex(bytes: &[u8]) -> String {
    format!("{:02X}", checksum(bytes))
}

/// Controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Light unit on.
    On,
    /// Light unit off.
    Off,
    /// Set light intensity (0-255).
    Intensity(u8),
}

impl Command {
    /// Builds an intensity command, rejecting values outside 0-255.
    pub fn intensity(value: i32) -> Result<Self> {
        u8::try_from(value)
            .map(Command::Intensity)
            .map_err(|_| Error::InvalidIntensity(value))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::On => write!(f, "on"),
            Command::Off => write!(f, "off"),
            Command::Intensity(level) => write!(f, "intensity {}", level),
        }
    }
}

/// One encoded protocol frame, ready to be written to the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Returns the raw frame bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the frame, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Escaped form, e.g. `@00L1007D\r\n`.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

/// Header and delimiter strings wrapped around every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlStrings {
    /// Header marker.
    pub start: String,
    /// Frame delimiter.
    pub end: String,
}

impl Default for ControlStrings {
    fn default() -> Self {
        Self {
            start: DEFAULT_START.to_string(),
            end: DEFAULT_END.to_string(),
        }
    }
}

impl ControlStrings {
    /// Creates control strings with a custom header and delimiter.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Encodes a command into a complete frame.
    pub fn encode(&self, command: Command) -> Frame {
        let mut bytes = Vec::with_capacity(self.start.len() + 11 + self.end.len());
        bytes.extend_from_slice(self.start.as_bytes());
        bytes.extend_from_slice(CHANNEL);

        match command {
            Command::On => bytes.extend_from_slice(ON_BODY),
            Command::Off => bytes.extend_from_slice(OFF_BODY),
            Command::Intensity(level) => {
                bytes.push(INTENSITY_TOKEN);
                bytes.extend_from_slice(format!("{:03}", level).as_bytes());
                bytes.extend_from_slice(ID);
                let sum = checksum_hex(&bytes);
                bytes.extend_from_slice(sum.as_bytes());
            }
        }

        bytes.extend_from_slice(self.end.as_bytes());
        Frame(bytes)
    }
}
