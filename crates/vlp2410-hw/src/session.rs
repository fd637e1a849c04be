//! Serial session lifecycle and raw frame transmission.

use crate::transport::{Connector, PortSettings, SerialConnector};
use crate::{Error, Result};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Minimum pause after each write. The controller firmware drops or garbles
/// frames that arrive sooner.
pub const SETTLE_DELAY: Duration = Duration::from_millis(10);

/// One connection to a controller.
///
/// Holds at most one open port. The port is never handed out, so every write
/// goes through [`Session::send`] and observes the settling delay. Sending
/// takes `&mut self`; share a session between tasks only behind a mutex.
pub struct Session<C: Connector = SerialConnector> {
    connector: C,
    port: Option<C::Port>,
    settings: Option<PortSettings>,
    settle_delay: Duration,
}

impl Session<SerialConnector> {
    /// Creates a closed session backed by real serial ports.
    pub fn new() -> Self {
        Self::with_connector(SerialConnector)
    }
}

impl Default for Session<SerialConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> Session<C> {
    /// Creates a closed session that opens ports through `connector`.
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            port: None,
            settings: None,
            settle_delay: SETTLE_DELAY,
        }
    }

    /// Sets the pause after each write. Values below [`SETTLE_DELAY`] are raised to it.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay.max(SETTLE_DELAY);
        self
    }

    /// Opens a port, closing the current one first if needed.
    pub fn open(&mut self, settings: PortSettings) -> Result<()> {
        if self.is_open() {
            debug!("Session already open, closing before re-open");
            self.close();
        }

        let port = self.connector.open(&settings)?;
        info!(
            "Serial port {} opened at {} baud",
            settings.port_name, settings.baud_rate
        );

        self.port = Some(port);
        self.settings = Some(settings);
        Ok(())
    }

    /// Closes and releases the port. Does nothing if already closed.
    pub fn close(&mut self) {
        if let Some(port) = self.port.take() {
            drop(port);
            if let Some(settings) = self.settings.take() {
                info!("Serial port {} closed", settings.port_name);
            }
        }
    }

    /// Writes raw bytes, then waits for the settling delay.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotOpen)?;

        debug!("Sending frame: {:02X?}", bytes);

        port.write_all(bytes).await?;
        port.flush().await?;

        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }

    /// Returns true if a port is open.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Returns the settings of the open port.
    pub fn settings(&self) -> Option<&PortSettings> {
        self.settings.as_ref()
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{Event, RecordingConnector};
    use std::time::Instant;

    fn session() -> (Session<RecordingConnector>, RecordingConnector) {
        let connector = RecordingConnector::new();
        (Session::with_connector(connector.clone()), connector)
    }

    #[tokio::test]
    async fn test_send_before_open() {
        let (mut session, connector) = session();
        assert!(!session.is_open());
        assert!(matches!(session.send(b"@").await, Err(Error::NotOpen)));
        assert!(connector.events().is_empty());
    }

    #[tokio::test]
    async fn test_open_send_close() {
        let (mut session, connector) = session();
        session.open(PortSettings::new("TEST")).unwrap();
        assert!(session.is_open());
        assert_eq!(session.settings().unwrap().port_name, "TEST");

        session.send(b"@00L1007D\r\n").await.unwrap();
        session.close();
        assert!(!session.is_open());
        assert!(session.settings().is_none());

        assert_eq!(
            connector.events(),
            vec![
                Event::Open("TEST".into()),
                Event::Frame(b"@00L1007D\r\n".to_vec()),
                Event::Close("TEST".into()),
            ]
        );
        assert!(matches!(session.send(b"@").await, Err(Error::NotOpen)));
    }

    #[test]
    fn test_reopen_closes_first() {
        let (mut session, connector) = session();
        session.open(PortSettings::new("A")).unwrap();
        session.open(PortSettings::new("B")).unwrap();
        assert_eq!(session.settings().unwrap().port_name, "B");
        assert_eq!(
            connector.events(),
            vec![
                Event::Open("A".into()),
                Event::Close("A".into()),
                Event::Open("B".into()),
            ]
        );
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut session, connector) = session();
        session.close();
        session.open(PortSettings::new("TEST")).unwrap();
        session.close();
        session.close();
        assert_eq!(
            connector.events(),
            vec![Event::Open("TEST".into()), Event::Close("TEST".into())]
        );
    }

    #[test]
    fn test_drop_releases_port() {
        let (mut session, connector) = session();
        session.open(PortSettings::new("TEST")).unwrap();
        drop(session);
        assert_eq!(connector.events().last(), Some(&Event::Close("TEST".into())));
    }

    #[test]
    fn test_open_failure() {
        let (mut session, connector) = session();
        connector.fail_open(true);
        let err = session.open(PortSettings::new("TEST")).unwrap_err();
        assert!(err.is_open_error());
        assert!(!session.is_open());
    }

    #[tokio::test]
    async fn test_write_failure() {
        let (mut session, connector) = session();
        session.open(PortSettings::new("TEST")).unwrap();
        connector.fail_write(true);
        assert!(matches!(
            session.send(b"@00L0007C\r\n").await,
            Err(Error::SerialIo(_))
        ));
        assert!(connector.frames().is_empty());
    }

    #[tokio::test]
    async fn test_settle_delay() {
        let (mut session, _connector) = session();
        session.open(PortSettings::new("TEST")).unwrap();

        let start = Instant::now();
        session.send(b"@00L1007D\r\n").await.unwrap();
        session.send(b"@00L0007C\r\n").await.unwrap();
        assert!(start.elapsed() >= SETTLE_DELAY * 2);
    }

    #[test]
    fn test_settle_delay_floor() {
        let connector = RecordingConnector::new();
        let short = Session::with_connector(connector.clone())
            .with_settle_delay(Duration::from_millis(1));
        assert_eq!(short.settle_delay(), SETTLE_DELAY);

        let long = Session::with_connector(connector).with_settle_delay(Duration::from_millis(50));
        assert_eq!(long.settle_delay(), Duration::from_millis(50));
    }
}
