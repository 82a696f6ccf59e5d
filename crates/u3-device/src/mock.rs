//! Scripted transport for tests.
//!
//! [`MockConnector`] replays pre-loaded replies in order. Every clone shares
//! the same script and log, so a test can keep one clone for inspection
//! after handing another to a [`Device`](crate::Device).
//!
//! # Example
//!
//! ```
//! use u3_device::MockConnector;
//!
//! let mock = MockConnector::new();
//! mock.expect(&[0x0B, 0xF8, 0x0A, 0x08], &[0x00; 38]);
//! assert_eq!(mock.remaining_expectations(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::transport::{Connector, Transport, TransportError};

/// What the device does with one request.
#[derive(Debug, Clone)]
enum Reply {
    /// Accept the request and answer with these bytes.
    Bytes(Vec<u8>),
    /// Accept only this many request bytes.
    ShortWrite(usize),
    /// Accept the request, then never answer.
    Timeout,
}

#[derive(Debug, Clone)]
struct Expectation {
    /// Exact request bytes, or `None` to accept anything.
    request: Option<Vec<u8>>,
    reply: Reply,
}

#[derive(Debug)]
struct Script {
    expectations: VecDeque<Expectation>,
    sent_log: Vec<Vec<u8>>,
    present: bool,
    opens: usize,
    closes: usize,
}

/// A [`Connector`] driven by a queue of expected requests and replies.
#[derive(Debug, Clone)]
pub struct MockConnector {
    script: Arc<Mutex<Script>>,
}

impl MockConnector {
    /// Create a connector for a present device with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                expectations: VecDeque::new(),
                sent_log: Vec::new(),
                present: true,
                opens: 0,
                closes: 0,
            })),
        }
    }

    fn push(&self, request: Option<&[u8]>, reply: Reply) {
        self.script.lock().expectations.push_back(Expectation {
            request: request.map(<[u8]>::to_vec),
            reply,
        });
    }

    /// Answer `request` with `response`.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.push(Some(request), Reply::Bytes(response.to_vec()));
    }

    /// Answer the next request, whatever it is, with `response`.
    pub fn expect_any(&self, response: &[u8]) {
        self.push(None, Reply::Bytes(response.to_vec()));
    }

    /// Accept only `written` bytes of the next request.
    pub fn expect_short_write(&self, written: usize) {
        self.push(None, Reply::ShortWrite(written));
    }

    /// Accept the next request and time out on the read.
    pub fn expect_timeout(&self) {
        self.push(None, Reply::Timeout);
    }

    /// Whether `open` finds a device.
    pub fn set_present(&self, present: bool) {
        self.script.lock().present = present;
    }

    /// Every request written so far.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.script.lock().sent_log.clone()
    }

    /// Expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.script.lock().expectations.len()
    }

    /// Transports opened so far.
    pub fn opens(&self) -> usize {
        self.script.lock().opens
    }

    /// Transports closed so far.
    pub fn closes(&self) -> usize {
        self.script.lock().closes
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for MockConnector {
    fn describe(&self) -> String {
        "mock".to_string()
    }

    fn open(&mut self) -> Result<Box<dyn Transport>, TransportError> {
        let mut script = self.script.lock();
        if !script.present {
            return Err(TransportError::NotFound);
        }
        script.opens += 1;
        Ok(Box::new(MockTransport {
            script: Arc::clone(&self.script),
            pending: None,
        }))
    }
}

/// Transport handed out by [`MockConnector`].
#[derive(Debug)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
    pending: Option<Reply>,
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let mut script = self.script.lock();
        script.sent_log.push(data.to_vec());

        let expectation = script
            .expectations
            .pop_front()
            .ok_or_else(|| TransportError::Io("no more expectations in mock transport".into()))?;

        if let Some(request) = &expectation.request {
            if data != request.as_slice() {
                return Err(TransportError::Io(format!(
                    "unexpected send data: expected {:02X?}, got {:02X?}",
                    request, data
                )));
            }
        }

        let written = match expectation.reply {
            Reply::ShortWrite(n) => n.min(data.len()),
            _ => data.len(),
        };
        self.pending = Some(expectation.reply);
        Ok(written)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.pending.take() {
            Some(Reply::Bytes(response)) => {
                let n = response.len().min(buf.len());
                buf[..n].copy_from_slice(&response[..n]);
                Ok(n)
            }
            Some(Reply::Timeout) => Err(TransportError::Timeout),
            Some(Reply::ShortWrite(_)) | None => Err(TransportError::Io("read without a pending reply".into())),
        }
    }

    fn close(&mut self) {
        self.script.lock().closes += 1;
    }
}
