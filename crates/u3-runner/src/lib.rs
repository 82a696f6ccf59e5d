//! Application workflows for `u3ctl`.
//!
//! Each workflow is a short fixed sequence of transactions against one
//! shared device state:
//!
//! - [`App::flash`] reads identity and flash configuration (ConfigU3)
//! - [`App::get_config`] reads the volatile line configuration
//! - [`App::configure`] writes analog/digital and direction settings from form fields
//! - [`App::measure`] reads digital levels and every analog line
//! - [`App::update_digital`] writes digital output levels from form fields

pub mod config;
mod output;

use thiserror::Error;
use tracing::{debug, info};
use u3_device::{Connector, SharedDevice};
use u3_protocol::{
    ain_channel_selector, pull_analog_digital_settings, pull_digital_output_settings, pull_direction_settings,
    Bank, CommandId, DeviceState, DirectionMode, FormValues, ProtocolError, BANK_SELECT_ALL,
};

pub use config::{AppConfig, ConfigError, TransportConfig, TransportKind};
pub use output::render_text;

/// ConfigIO write mask selecting the FIO and EIO analog bytes.
pub const CONFIGURE_WRITE_MASK: u8 = u3_protocol::config_io::MASK_FIO_ANALOG | u3_protocol::config_io::MASK_EIO_ANALOG;

/// Errors surfaced by the runner.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid form field '{0}': expected key=value")]
    Field(String),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result type for runner operations.
pub type AppResult<T> = Result<T, AppError>;

/// Parse `key=value` pairs into form values.
pub fn parse_fields<I, S>(fields: I) -> AppResult<FormValues>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|field| {
            let field = field.as_ref();
            match field.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.trim().to_string())),
                _ => Err(AppError::Field(field.to_string())),
            }
        })
        .collect()
}

/// The device plus the workflows run against it.
pub struct App<C> {
    device: SharedDevice<C>,
}

impl App<Box<dyn Connector>> {
    /// Build an app for the connector `config` selects.
    pub fn from_config(config: &AppConfig) -> Self {
        let connector = config.connector();
        info!("Using {} transport", connector.describe());
        Self::new(connector)
    }
}

impl<C: Connector> App<C> {
    /// Create an app over `connector` with a fresh state.
    pub fn new(connector: C) -> Self {
        Self {
            device: SharedDevice::new(connector),
        }
    }

    /// A copy of the current device state.
    pub fn state(&self) -> DeviceState {
        self.device.snapshot()
    }

    /// Run a single command.
    pub fn exec(&self, command: CommandId, param: u8) -> Result<(), ProtocolError> {
        self.device.execute(command, param)
    }

    /// Read identity and configuration from flash. The flash is never written.
    pub fn flash(&self) -> Result<(), ProtocolError> {
        self.device.execute(CommandId::ConfigU3, 0)
    }

    /// Read the volatile analog/digital and direction configuration.
    pub fn get_config(&self) -> Result<(), ProtocolError> {
        self.device.with(|device, state| {
            device.execute(state, CommandId::ConfigIo, 0)?;
            device.execute(state, CommandId::PortDirRead, 0)
        })
    }

    /// Apply analog/digital and direction fields, then write both to the device.
    pub fn configure(&self, form: &FormValues) -> Result<(), ProtocolError> {
        self.device.with(|device, state| {
            pull_analog_digital_settings(state, form);
            pull_direction_settings(state, form);
            device.execute(state, CommandId::ConfigIo, CONFIGURE_WRITE_MASK)?;
            device.execute(state, CommandId::PortDirWrite, BANK_SELECT_ALL)
        })
    }

    /// Read digital levels, then one long-settling AIN per analog line.
    pub fn measure(&self) -> Result<(), ProtocolError> {
        self.device.with(|device, state| {
            device.execute(state, CommandId::PortStateRead, 0)?;

            let channels: Vec<u8> = analog_channels(state).collect();
            debug!("Measuring {} analog channels", channels.len());
            for channel in channels {
                device.execute(state, CommandId::AnalogInput, ain_channel_selector(channel, true))?;
            }
            Ok(())
        })
    }

    /// Apply digital output fields, then write the levels to the device.
    pub fn update_digital(&self, form: &FormValues) -> Result<(), ProtocolError> {
        self.device.with(|device, state| {
            pull_digital_output_settings(state, form);
            device.execute(state, CommandId::PortStateWrite, BANK_SELECT_ALL)
        })
    }
}

/// AIN channels of every analog line: FIO0-7 are 0-7, EIO0-7 are 8-15.
fn analog_channels(state: &DeviceState) -> impl Iterator<Item = u8> + '_ {
    [(Bank::Fio, 0u8), (Bank::Eio, 8u8)].into_iter().flat_map(move |(bank, base)| {
        state
            .pins(bank)
            .iter()
            .enumerate()
            .filter(|(_, pin)| pin.direction_mode == DirectionMode::Analog)
            .map(move |(i, _)| base + i as u8)
    })
}
