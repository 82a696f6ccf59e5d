//! LabJack U3 Command Protocol
//!
//! This crate provides the packet-level protocol for U3 I/O devices: the
//! command catalog, request builders, response validation and the decoders
//! that project responses into a [`DeviceState`].
//!
//! # Protocol Overview
//!
//! Every packet, in both directions, shares one layout:
//!
//! - **Byte 0**: checksum8 over bytes 1-5
//! - **Bytes 1-3**: command header (`0xF8`, length/command bytes)
//! - **Bytes 4-5**: checksum16 over bytes 6.., little-endian
//! - **Bytes 6..**: payload; in responses byte 6 is the device error code
//!
//! Commands come in three families: ConfigU3 (flash configuration and
//! identity), ConfigIO (analog/digital line configuration) and Feedback
//! (one IOType per packet: port direction/state reads and writes, AIN).
//!
//! # Example
//!
//! ```rust
//! use u3_protocol::{build_request, validate_response, decode_response, CommandId, DeviceState};
//!
//! let mut state = DeviceState::new();
//! let desc = CommandId::ConfigU3.descriptor();
//! let request = build_request(desc, 0, &state);
//! assert_eq!(request.len(), desc.send_len);
//!
//! // ... write `request`, read `desc.recv_len` bytes into `response` ...
//! # let mut response = vec![0u8; desc.recv_len];
//! # response[1..4].copy_from_slice(&desc.response_header);
//! # u3_protocol::seal(&mut response);
//! validate_response(desc, &response)?;
//! decode_response(desc, &request, &response, &mut state);
//! # Ok::<(), u3_protocol::ProtocolError>(())
//! ```

mod builder;
mod checksum;
mod commands;
mod constants;
mod error;
mod form;
mod responses;
mod types;
mod validate;

pub use builder::*;
pub use checksum::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use form::*;
pub use responses::*;
pub use types::*;
pub use validate::*;
