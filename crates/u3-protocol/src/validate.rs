//! Response validation.

use crate::checksum::{checksum16, checksum8};
use crate::commands::CommandDescriptor;
use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Check a response of exactly `desc.recv_len` bytes.
///
/// Checks run in a fixed order and stop at the first failure: device
/// checksum rejection, header echo, checksums, then the device error code.
pub fn validate_response(desc: &CommandDescriptor, buf: &[u8]) -> ProtocolResult<()> {
    debug_assert_eq!(buf.len(), desc.recv_len);

    if buf[OFFSET_CHECKSUM8] == BAD_CHECKSUM_SENTINEL && buf[OFFSET_HEADER] == BAD_CHECKSUM_SENTINEL {
        return Err(ProtocolError::ChecksumRejected);
    }

    let expected = desc.checked_response_header();
    let received = &buf[OFFSET_HEADER..OFFSET_HEADER + expected.len()];
    if received != expected {
        return Err(ProtocolError::UnexpectedResponse {
            expected: expected.to_vec(),
            received: received.to_vec(),
        });
    }

    let computed16 = (checksum16(buf, desc.recv_len) & 0xFFFF) as u16;
    let received16 = u16::from_le_bytes([buf[OFFSET_CHECKSUM16_LO], buf[OFFSET_CHECKSUM16_HI]]);
    let computed8 = checksum8(buf);
    let received8 = buf[OFFSET_CHECKSUM8];
    if computed8 != received8 || computed16 != received16 {
        return Err(ProtocolError::CorruptResponse {
            computed_checksum8: computed8,
            received_checksum8: received8,
            computed_checksum16: computed16,
            received_checksum16: received16,
        });
    }

    match buf[OFFSET_ERROR_CODE] {
        0 => Ok(()),
        code => Err(ProtocolError::DeviceError(code)),
    }
}
