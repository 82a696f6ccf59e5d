//! TCP transport.
//!
//! Reaches a U3 through a USB-to-TCP bridge that relays raw packets in both
//! directions. One connection is made per transaction; read and write
//! timeouts are set on the socket so a silent bridge surfaces as
//! [`TransportError::Timeout`].

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, warn};

use crate::transport::{Connector, Transport, TransportError};

/// Default socket timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Opens TCP connections to one bridge address.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    timeout: Duration,
}

impl TcpConnector {
    /// Connector for `addr` (`host:port`) with the default timeout.
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_timeout(addr, DEFAULT_TIMEOUT)
    }

    /// Connector for `addr` with `timeout` applied to connect, read and write.
    pub fn with_timeout(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    fn connect(&self) -> Result<TcpStream, TransportError> {
        let addrs = self.addr.to_socket_addrs().map_err(|e| {
            warn!(addr = %self.addr, error = %e, "Could not resolve bridge address");
            TransportError::NotFound
        })?;

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                // A zero timeout is rejected before any connection is tried.
                Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {
                    return Err(TransportError::Io(e.to_string()));
                }
                Err(e) => debug!(addr = %addr, error = %e, "Connect attempt failed"),
            }
        }
        Err(TransportError::NotFound)
    }
}

impl Connector for TcpConnector {
    fn describe(&self) -> String {
        format!("tcp:{}", self.addr)
    }

    fn open(&mut self) -> Result<Box<dyn Transport>, TransportError> {
        let stream = self.connect()?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!(addr = %self.addr, error = %e, "Failed to set TCP_NODELAY");
        }
        Ok(Box::new(TcpTransport { stream }))
    }
}

/// One open bridge connection.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl Transport for TcpTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let mut written = 0;
        while written < data.len() {
            match self.stream.write(&data[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.stream.flush()?;
        Ok(written)
    }

    /// Fill `buf`, stopping early if the bridge closes the connection.
    /// A timeout after part of the response arrived returns the short count.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    let err = TransportError::from(e);
                    if filled > 0 && err == TransportError::Timeout {
                        break;
                    }
                    return Err(err);
                }
            }
        }
        Ok(filled)
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_relays_request_and_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let bridge = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 4];
            socket.read_exact(&mut request).unwrap();
            socket.write_all(&[request[3], request[2], request[1], request[0]]).unwrap();
        });

        let mut connector = TcpConnector::new(addr.to_string());
        let mut transport = connector.open().unwrap();
        assert_eq!(transport.write(&[1, 2, 3, 4]).unwrap(), 4);
        let mut buf = [0u8; 4];
        assert_eq!(transport.read(&mut buf).unwrap(), 4);
        assert_eq!(buf, [4, 3, 2, 1]);
        transport.close();
        bridge.join().unwrap();
    }

    #[test]
    fn test_silent_bridge_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let bridge = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(300));
            drop(socket);
        });

        let mut connector = TcpConnector::with_timeout(addr.to_string(), Duration::from_millis(50));
        let mut transport = connector.open().unwrap();
        let mut buf = [0u8; 12];
        assert_eq!(transport.read(&mut buf), Err(TransportError::Timeout));
        transport.close();
        bridge.join().unwrap();
    }

    #[test]
    fn test_nothing_listening_is_not_found() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut connector = TcpConnector::with_timeout(addr.to_string(), Duration::from_millis(200));
        assert_eq!(connector.open().err(), Some(TransportError::NotFound));
        assert_eq!(connector.describe(), format!("tcp:{}", addr));
    }

    #[test]
    fn test_zero_timeout_is_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut connector = TcpConnector::with_timeout(addr.to_string(), Duration::ZERO);
        assert!(matches!(connector.open().err(), Some(TransportError::Io(_))));
    }
}
