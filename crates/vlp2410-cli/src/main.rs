//! VLP-2410 Control Tool
//!
//! CLI for driving a VLP-2410 LED lighting controller over a serial port.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vlp2410_hw::{Command, ControlStrings, Controller, Frame, Session};

use config::Config;

#[derive(Parser)]
#[command(name = "vlp2410ctl")]
#[command(about = "Control tool for VLP-2410 LED lighting controllers")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port, overrides the configuration file
    #[arg(short, long)]
    port: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an encoded frame without opening the port
    Frame {
        #[command(subcommand)]
        action: FrameCommands,
    },
    #[command(flatten)]
    Device(DeviceCommands),
}

/// Commands that talk to the controller.
#[derive(Subcommand)]
enum DeviceCommands {
    /// Turn the light unit on
    On,
    /// Turn the light unit off
    Off,
    /// Set the light intensity (also turns the unit on)
    Intensity {
        /// Intensity (0-255)
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
    /// Step through a range of intensities, then turn off
    Sweep {
        /// First intensity
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        from: i32,

        /// Last intensity
        #[arg(long, default_value = "254", allow_negative_numbers = true)]
        to: i32,

        /// Wait after opening the port, in milliseconds
        #[arg(long, default_value = "3000")]
        warmup_ms: u64,

        /// Leave the unit on after the sweep
        #[arg(long)]
        keep_on: bool,
    },
}

#[derive(Subcommand)]
enum FrameCommands {
    /// On frame
    On,
    /// Off frame
    Off,
    /// Intensity frame
    Intensity {
        /// Intensity (0-255)
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(port) = cli.port {
        config.port.device = port;
    }

    match cli.command {
        Commands::Frame { action } => {
            let frame = encode_frame(&action, &config.control_strings())?;
            println!("{}", frame);
            Ok(())
        }
        Commands::Device(command) => {
            let mut controller = open_controller(&config)?;
            let result = handle_device(command, &mut controller).await;
            controller.close();
            result
        }
    }
}

async fn handle_device(command: DeviceCommands, controller: &mut Controller) -> Result<()> {
    match command {
        DeviceCommands::On => {
            controller.turn_on().await?;
            println!("Light unit turned on");
        }
        DeviceCommands::Off => {
            controller.turn_off().await?;
            println!("Light unit turned off");
        }
        DeviceCommands::Intensity { value } => {
            controller.set_intensity(value).await?;
            println!("Intensity set to: {}", value);
        }
        DeviceCommands::Sweep {
            from,
            to,
            warmup_ms,
            keep_on,
        } => handle_sweep(controller, from, to, warmup_ms, keep_on).await?,
    }

    Ok(())
}

fn open_controller(config: &Config) -> Result<Controller> {
    let session = Session::new().with_settle_delay(config.settle_delay());
    let mut controller = Controller::with_session(session);
    controller.set_control_strings(config.control_strings());

    let settings = config.port_settings()?;
    let device = settings.port_name.clone();
    controller
        .open(settings)
        .with_context(|| format!("Failed to open serial port {}", device))?;

    Ok(controller)
}

fn encode_frame(action: &FrameCommands, control: &ControlStrings) -> Result<Frame> {
    let command = match action {
        FrameCommands::On => Command::On,
        FrameCommands::Off => Command::Off,
        FrameCommands::Intensity { value } => Command::intensity(*value)?,
    };
    Ok(control.encode(command))
}

async fn handle_sweep(
    controller: &mut Controller,
    from: i32,
    to: i32,
    warmup_ms: u64,
    keep_on: bool,
) -> Result<()> {
    // Reject bad bounds before anything is sent
    Command::intensity(from)?;
    Command::intensity(to)?;

    debug!("Waiting {}ms for the controller to settle", warmup_ms);
    tokio::time::sleep(Duration::from_millis(warmup_ms)).await;

    let levels: Vec<i32> = if from <= to {
        (from..=to).collect()
    } else {
        (to..=from).rev().collect()
    };

    for level in levels {
        controller
            .set_intensity(level)
            .await
            .with_context(|| format!("Sweep stopped at intensity {}", level))?;
    }
    println!("Swept intensity from {} to {}", from, to);

    if !keep_on {
        controller.turn_off().await?;
        println!("Light unit turned off");
    }

    Ok(())
}
