//! Serial transport configuration and port opening.

use crate::{Error, Result, DEFAULT_BAUD_RATE, DEFAULT_DATA_BITS};
use std::str::FromStr;
use tokio::io::AsyncWrite;
use tokio_serial::{DataBits, SerialPortBuilderExt, SerialStream};
use tracing::debug;

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    /// Parity bit always 1.
    Mark,
    /// Parity bit always 0.
    Space,
}

impl FromStr for Parity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Parity::None),
            "odd" => Ok(Parity::Odd),
            "even" => Ok(Parity::Even),
            "mark" => Ok(Parity::Mark),
            "space" => Ok(Parity::Space),
            _ => Err(Error::InvalidParity(s.to_string())),
        }
    }
}

impl std::fmt::Display for Parity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parity::None => write!(f, "none"),
            Parity::Odd => write!(f, "odd"),
            Parity::Even => write!(f, "even"),
            Parity::Mark => write!(f, "mark"),
            Parity::Space => write!(f, "space"),
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

impl FromStr for StopBits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "one" | "1" => Ok(StopBits::One),
            "one-point-five" | "one_point_five" | "1.5" => Ok(StopBits::OnePointFive),
            "two" | "2" => Ok(StopBits::Two),
            _ => Err(Error::InvalidStopBits(s.to_string())),
        }
    }
}

impl std::fmt::Display for StopBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopBits::One => write!(f, "one"),
            StopBits::OnePointFive => write!(f, "one-point-five"),
            StopBits::Two => write!(f, "two"),
        }
    }
}

/// Serial line settings for one controller connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl PortSettings {
    /// Creates settings for `port_name` with the controller defaults (38400 8N1).
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DEFAULT_DATA_BITS,
            parity: Parity::default(),
            stop_bits: StopBits::default(),
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn data_bits(mut self, data_bits: u8) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub fn parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }
}

/// Opens transports for a [`Session`](crate::Session).
///
/// The returned port is owned by the session. Dropping it closes the
/// underlying device.
pub trait Connector {
    type Port: AsyncWrite + Unpin + Send;

    fn open(&self, settings: &PortSettings) -> Result<Self::Port>;
}

/// Connector for real serial devices.
///
/// Opening registers the port with the tokio reactor, so it must be called
/// from within a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl SerialConnector {
    fn data_bits(bits: u8) -> Result<DataBits> {
        match bits {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            _ => Err(Error::UnsupportedSettings(format!("{} data bits", bits))),
        }
    }

    fn parity(parity: Parity) -> Result<tokio_serial::Parity> {
        match parity {
            Parity::None => Ok(tokio_serial::Parity::None),
            Parity::Odd => Ok(tokio_serial::Parity::Odd),
            Parity::Even => Ok(tokio_serial::Parity::Even),
            Parity::Mark | Parity::Space => {
                Err(Error::UnsupportedSettings(format!("{} parity", parity)))
            }
        }
    }

    fn stop_bits(stop_bits: StopBits) -> Result<tokio_serial::StopBits> {
        match stop_bits {
            StopBits::One => Ok(tokio_serial::StopBits::One),
            StopBits::Two => Ok(tokio_serial::StopBits::Two),
            StopBits::OnePointFive => Err(Error::UnsupportedSettings(format!(
                "{} stop bits",
                stop_bits
            ))),
        }
    }
}

impl Connector for SerialConnector {
    type Port = SerialStream;

    fn open(&self, settings: &PortSettings) -> Result<SerialStream> {
        let data_bits = Self::data_bits(settings.data_bits)?;
        let parity = Self::parity(settings.parity)?;
        let stop_bits = Self::stop_bits(settings.stop_bits)?;

        debug!(
            "Opening {} at {} baud ({} data bits, {} parity, {} stop bits)",
            settings.port_name,
            settings.baud_rate,
            settings.data_bits,
            settings.parity,
            settings.stop_bits
        );

        tokio_serial::new(&settings.port_name, settings.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .open_native_async()
            .map_err(|e| {
                let missing = match &e.kind {
                    tokio_serial::ErrorKind::NoDevice => true,
                    tokio_serial::ErrorKind::Io(kind) => {
                        *kind == std::io::ErrorKind::NotFound
                            || *kind == std::io::ErrorKind::PermissionDenied
                    }
                    _ => false,
                };
                // Permission errors on a path that exists stay as serial errors
                if missing && !std::path::Path::new(&settings.port_name).exists() {
                    return Error::PortNotFound(settings.port_name.clone());
                }
                Error::Serial(e)
            })
    }
}
