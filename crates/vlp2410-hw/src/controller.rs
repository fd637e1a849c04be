//! High-level VLP-2410 light unit control.

use crate::protocol::{Command, ControlStrings, Frame};
use crate::session::Session;
use crate::transport::{Connector, PortSettings, SerialConnector};
use crate::Result;
use tracing::{debug, info};

/// VLP-2410 light unit controller.
///
/// Owns one [`Session`] and the control strings used to frame commands.
/// Commands are sent at most once; failures are returned to the caller.
pub struct Controller<C: Connector = SerialConnector> {
    session: Session<C>,
    control: ControlStrings,
}

impl Controller<SerialConnector> {
    /// Creates a controller for real serial ports.
    pub fn new() -> Self {
        Self::with_session(Session::new())
    }
}

impl Default for Controller<SerialConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> Controller<C> {
    /// Creates a controller around an existing (usually closed) session.
    pub fn with_session(session: Session<C>) -> Self {
        Self {
            session,
            control: ControlStrings::default(),
        }
    }

    /// Opens the serial port, closing any port that is already open.
    pub fn open(&mut self, settings: PortSettings) -> Result<()> {
        self.session.open(settings)
    }

    /// Closes the serial port.
    pub fn close(&mut self) {
        self.session.close();
    }

    /// Returns true if the serial port is open.
    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Returns the underlying session.
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    pub fn control_strings(&self) -> &ControlStrings {
        &self.control
    }

    pub fn control_strings_mut(&mut self) -> &mut ControlStrings {
        &mut self.control
    }

    pub fn set_control_strings(&mut self, control: ControlStrings) {
        self.control = control;
    }

    /// Encodes a command with the current control strings.
    pub fn frame(&self, command: Command) -> Frame {
        self.control.encode(command)
    }

    /// Sends a single command frame.
    pub async fn send(&mut self, command: Command) -> Result<()> {
        let frame = self.frame(command);
        debug!("Sending {} command: {}", command, frame);
        self.session.send(frame.as_bytes()).await
    }

    /// Turns on the light unit.
    pub async fn turn_on(&mut self) -> Result<()> {
        self.send(Command::On).await?;
        info!("Light unit turned on");
        Ok(())
    }

    /// Turns off the light unit.
    pub async fn turn_off(&mut self) -> Result<()> {
        self.send(Command::Off).await?;
        info!("Light unit turned off");
        Ok(())
    }

    /// Sets the light intensity (0-255).
    ///
    /// Always follows up with an on command, so the unit ends up lit at the
    /// new intensity whatever its previous state.
    pub async fn set_intensity(&mut self, intensity: i32) -> Result<()> {
        let command = Command::intensity(intensity)?;
        self.send(command).await?;
        self.send(Command::On).await?;
        info!("Light unit set to intensity {}", intensity);
        Ok(())
    }
}
