//! Byte-level transport to a U3.
//!
//! A [`Connector`] opens one [`Transport`] per transaction. The transaction
//! writes exactly one request, reads exactly one response and closes the
//! transport again; nothing is kept open between transactions.

use thiserror::Error;
use u3_protocol::ProtocolError;

/// Errors raised by transports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No device answered the open.
    #[error("device not found")]
    NotFound,

    /// A read or write did not complete before the transport's timeout.
    #[error("timed out")]
    Timeout,

    /// Any other I/O failure.
    #[error("{0}")]
    Io(String),
}

impl From<TransportError> for ProtocolError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NotFound => ProtocolError::DeviceNotFound,
            TransportError::Timeout => ProtocolError::TransportTimeout,
            TransportError::Io(msg) => ProtocolError::TransportIo(msg),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => TransportError::Timeout,
            _ => TransportError::Io(err.to_string()),
        }
    }
}

/// An open handle to the device.
pub trait Transport: Send {
    /// Write `data`, returning the number of bytes the device accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read up to `buf.len()` bytes, returning how many arrived.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Release the handle. Called exactly once per opened transport.
    fn close(&mut self);
}

/// Opens transports to one device.
pub trait Connector: Send {
    /// Short name used in logs and metric labels.
    fn describe(&self) -> String;

    /// Open a fresh handle.
    fn open(&mut self) -> Result<Box<dyn Transport>, TransportError>;
}

impl<C: Connector + ?Sized> Connector for Box<C> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn open(&mut self) -> Result<Box<dyn Transport>, TransportError> {
        (**self).open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_map_to_protocol_errors() {
        assert_eq!(ProtocolError::from(TransportError::NotFound), ProtocolError::DeviceNotFound);
        assert_eq!(ProtocolError::from(TransportError::Timeout), ProtocolError::TransportTimeout);
        assert_eq!(
            ProtocolError::from(TransportError::Io("broken pipe".into())),
            ProtocolError::TransportIo("broken pipe".into())
        );
    }

    #[test]
    fn test_io_timeouts_become_timeout() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert_eq!(TransportError::from(err), TransportError::Timeout);

        let err = std::io::Error::new(std::io::ErrorKind::WouldBlock, "again");
        assert_eq!(TransportError::from(err), TransportError::Timeout);

        let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(TransportError::from(err), TransportError::Io(_)));
    }
}
