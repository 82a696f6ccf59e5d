//! LabJack U3 device access.
//!
//! This crate runs protocol transactions from [`u3_protocol`] over a
//! transport:
//!
//! - [`Device`] - one-transaction-at-a-time orchestrator
//! - [`SharedDevice`] - a device and its state behind a mutex
//! - [`Connector`] / [`Transport`] - the byte-level seam
//! - [`SimulatedU3`] - in-process device emulator
//! - [`TcpConnector`] - raw packets relayed by a USB-to-TCP bridge
//! - [`MockConnector`] - scripted replies for tests
//!
//! # Example
//!
//! ```rust
//! use u3_device::{Device, SimulatedU3};
//! use u3_protocol::{CommandId, DeviceState};
//!
//! let mut device = Device::new(SimulatedU3::default());
//! let mut state = DeviceState::new();
//! device.execute(&mut state, CommandId::ConfigU3, 0)?;
//! assert_eq!(state.device_name, "U3-HV");
//! # Ok::<(), u3_protocol::ProtocolError>(())
//! ```

mod device;
pub mod mock;
mod shared;
pub mod sim;
pub mod tcp;
mod transport;

pub use device::Device;
pub use mock::MockConnector;
pub use shared::SharedDevice;
pub use sim::{InjectedError, SimulatedU3, SimulatorConfig, Version};
pub use tcp::TcpConnector;
pub use transport::{Connector, Transport, TransportError};
