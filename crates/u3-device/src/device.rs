//! Transaction orchestration.
//!
//! [`Device::execute`] runs one command end to end:
//! build, open, write, read, close, validate and decode. The transport is
//! held by a guard that closes it on every exit path.

use std::time::Instant;

use tracing::{debug, warn};
use u3_metrics::{metric_defs, MetricLabels};
use u3_protocol::{
    build_request, decode_response, validate_response, CommandDescriptor, CommandId, DeviceState, ProtocolError,
    ProtocolResult, STATUS_NO_ERROR,
};

use crate::transport::{Connector, Transport};

/// An open transport that is closed when dropped.
struct OpenTransport {
    inner: Box<dyn Transport>,
}

impl OpenTransport {
    fn open<C: Connector + ?Sized>(connector: &mut C) -> ProtocolResult<Self> {
        let inner = connector.open()?;
        Ok(Self { inner })
    }
}

impl std::ops::Deref for OpenTransport {
    type Target = dyn Transport;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::ops::DerefMut for OpenTransport {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.inner.as_mut()
    }
}

impl Drop for OpenTransport {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Runs transactions against the device behind a [`Connector`].
pub struct Device<C> {
    connector: C,
}

impl<C: Connector> Device<C> {
    /// Create a device that opens transports through `connector`.
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Run one transaction.
    ///
    /// `param` is passed to the request builder (write mask, bank selector or
    /// AIN channel selector depending on the command). On success the
    /// decoded fields are written into `state`; on failure nothing but
    /// `state.status` changes. Either way `state.status` describes the outcome.
    pub fn execute(&mut self, state: &mut DeviceState, command: CommandId, param: u8) -> ProtocolResult<()> {
        let desc = command.descriptor();
        let labels = MetricLabels::new(self.connector.describe(), desc.name);
        metrics::counter!(metric_defs::TRANSACTION_STARTED.name, &labels.to_labels()).increment(1);
        let started = Instant::now();

        let result = self.transact(desc, param, state, &labels);

        metrics::histogram!(metric_defs::TRANSACTION_LATENCY.name, &labels.to_labels())
            .record(started.elapsed().as_micros() as f64);

        match &result {
            Ok(()) => {
                state.status = STATUS_NO_ERROR.to_string();
                metrics::counter!(metric_defs::TRANSACTION_SUCCEEDED.name, &labels.to_labels()).increment(1);
                debug!("{}: {} param {:#04x} ok", labels.device, desc.name, param);
            }
            Err(err) => {
                state.status = err.to_string();
                let failed = labels.with(&[("error", error_label(err).to_string())]);
                metrics::counter!(metric_defs::TRANSACTION_FAILED.name, &failed).increment(1);
                warn!("{}: {} param {:#04x} failed: {}", labels.device, desc.name, param, err);
            }
        }
        result
    }

    fn transact(
        &mut self,
        desc: &CommandDescriptor,
        param: u8,
        state: &mut DeviceState,
        labels: &MetricLabels,
    ) -> ProtocolResult<()> {
        let request = build_request(desc, param, state);
        let mut response = vec![0u8; desc.recv_len];

        {
            let mut transport = OpenTransport::open(&mut self.connector)?;

            let written = transport.write(&request)?;
            metrics::counter!(metric_defs::TRANSPORT_TX_BYTES.name, &labels.to_labels()).increment(written as u64);
            if written != desc.send_len {
                return Err(ProtocolError::TransportWriteError {
                    expected: desc.send_len,
                    written,
                });
            }

            let read = transport.read(&mut response)?;
            metrics::counter!(metric_defs::TRANSPORT_RX_BYTES.name, &labels.to_labels()).increment(read as u64);
            if read != desc.recv_len {
                return Err(ProtocolError::TransportReadError {
                    expected: desc.recv_len,
                    read,
                });
            }
        }

        validate_response(desc, &response)?;
        decode_response(desc, &request, &response, state);
        Ok(())
    }
}

/// Stable label value for an error kind.
fn error_label(err: &ProtocolError) -> &'static str {
    match err {
        ProtocolError::DeviceNotFound => "device_not_found",
        ProtocolError::TransportWriteError { .. } => "write",
        ProtocolError::TransportReadError { .. } => "read",
        ProtocolError::TransportTimeout => "timeout",
        ProtocolError::TransportIo(_) => "io",
        ProtocolError::ChecksumRejected => "checksum_rejected",
        ProtocolError::UnexpectedResponse { .. } => "unexpected_response",
        ProtocolError::CorruptResponse { .. } => "corrupt_response",
        ProtocolError::DeviceError(_) => "device_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConnector;
    use u3_protocol::{seal, CommandFamily, OFFSET_ERROR_CODE};

    fn reply(command: CommandId, request: &[u8]) -> Vec<u8> {
        let desc = command.descriptor();
        let mut response = vec![0u8; desc.recv_len];
        response[1..4].copy_from_slice(&desc.response_header);
        if let CommandFamily::Feedback(_) = desc.family {
            response[u3_protocol::feedback::RESPONSE_ECHO] = request[u3_protocol::feedback::ECHO];
        }
        seal(&mut response);
        response
    }

    #[test]
    fn test_success_sets_no_error_status() {
        let mock = MockConnector::new();
        let request = build_request(CommandId::PortStateRead.descriptor(), 0, &DeviceState::new());
        mock.expect(&request, &reply(CommandId::PortStateRead, &request));

        let mut device = Device::new(mock.clone());
        let mut state = DeviceState::new();
        state.status = "stale".into();

        device.execute(&mut state, CommandId::PortStateRead, 0).unwrap();
        assert_eq!(state.status, STATUS_NO_ERROR);
        assert_eq!(mock.sent_data(), vec![request]);
        assert_eq!(mock.closes(), 1);
    }

    #[test]
    fn test_device_not_found_opens_nothing() {
        let mock = MockConnector::new();
        mock.set_present(false);

        let mut device = Device::new(mock.clone());
        let mut state = DeviceState::new();
        let err = device.execute(&mut state, CommandId::ConfigU3, 0).unwrap_err();

        assert_eq!(err, ProtocolError::DeviceNotFound);
        assert_eq!(state.status, err.to_string());
        assert_eq!(mock.opens(), 0);
        assert_eq!(mock.closes(), 0);
    }

    #[test]
    fn test_short_write_closes_transport() {
        let mock = MockConnector::new();
        mock.expect_short_write(3);

        let mut device = Device::new(mock.clone());
        let err = device.execute(&mut DeviceState::new(), CommandId::ConfigIo, 0).unwrap_err();

        assert_eq!(err, ProtocolError::TransportWriteError { expected: 12, written: 3 });
        assert_eq!(mock.closes(), 1);
    }

    #[test]
    fn test_short_read_is_read_error() {
        let mock = MockConnector::new();
        mock.expect_any(&[0u8; 5]);

        let mut device = Device::new(mock.clone());
        let err = device.execute(&mut DeviceState::new(), CommandId::ConfigU3, 0).unwrap_err();

        assert_eq!(err, ProtocolError::TransportReadError { expected: 38, read: 5 });
        assert_eq!(mock.closes(), 1);
    }

    #[test]
    fn test_timeout_surfaces_as_transport_timeout() {
        let mock = MockConnector::new();
        mock.expect_timeout();

        let mut device = Device::new(mock.clone());
        let err = device.execute(&mut DeviceState::new(), CommandId::PortDirRead, 0).unwrap_err();

        assert_eq!(err, ProtocolError::TransportTimeout);
        assert_eq!(mock.closes(), 1);
    }

    #[test]
    fn test_device_error_sets_status_only() {
        let mock = MockConnector::new();
        let request = build_request(CommandId::ConfigU3.descriptor(), 0, &DeviceState::new());
        let mut response = reply(CommandId::ConfigU3, &request);
        response[u3_protocol::config_u3::SERIAL_NUMBER] = 0x42;
        response[OFFSET_ERROR_CODE] = 5;
        seal(&mut response);
        mock.expect(&request, &response);

        let mut device = Device::new(mock.clone());
        let mut state = DeviceState::new();
        let err = device.execute(&mut state, CommandId::ConfigU3, 0).unwrap_err();

        assert_eq!(err, ProtocolError::DeviceError(5));
        assert_eq!(state.status, err.to_string());
        assert_eq!(state.serial_number, 0);
        assert_eq!(mock.closes(), 1);
    }
}
