//! Protocol error types.

use thiserror::Error;

/// Errors that can end a transaction with the device.
///
/// Every variant is local to one transaction; none is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The transport could not open the device.
    #[error("device not found; connect a U3 and try again")]
    DeviceNotFound,

    /// The transport accepted a different number of bytes than requested.
    #[error("write failed: wrote {written} of {expected} bytes")]
    TransportWriteError {
        /// Bytes in the request.
        expected: usize,
        /// Bytes the transport reported as written.
        written: usize,
    },

    /// The transport returned a different number of bytes than the command's
    /// response length.
    #[error("read failed: read {read} of {expected} bytes")]
    TransportReadError {
        /// Bytes in the expected response.
        expected: usize,
        /// Bytes the transport returned.
        read: usize,
    },

    /// The transport did not complete within its timeout.
    #[error("transport timed out")]
    TransportTimeout,

    /// Any other transport failure.
    #[error("transport I/O error: {0}")]
    TransportIo(String),

    /// The device reported a bad checksum on the request.
    #[error("device detected a bad checksum in the request")]
    ChecksumRejected,

    /// The response header does not echo the request.
    #[error("unexpected response header: expected {expected:02X?}, got {received:02X?}")]
    UnexpectedResponse {
        /// Header bytes the command family expects back.
        expected: Vec<u8>,
        /// Header bytes that were received.
        received: Vec<u8>,
    },

    /// The response checksums do not match its contents.
    #[error(
        "response had invalid checksum: checksum8 {computed_checksum8} != {received_checksum8}, \
         checksum16 {computed_checksum16} != {received_checksum16}"
    )]
    CorruptResponse {
        /// Checksum8 recomputed over the response.
        computed_checksum8: u8,
        /// Checksum8 carried by the response.
        received_checksum8: u8,
        /// Checksum16 recomputed over the response (low 16 bits).
        computed_checksum16: u16,
        /// Checksum16 carried by the response.
        received_checksum16: u16,
    },

    /// The device executed the command and returned a non-zero error code.
    #[error("command returned with errorcode = {0}")]
    DeviceError(u8),
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
