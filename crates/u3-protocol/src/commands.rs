//! Command catalog.
//!
//! Each [`CommandId`] resolves to a static [`CommandDescriptor`] giving the
//! exact request/response lengths, the header bytes and the
//! [`CommandFamily`] that selects the builder, validator and decoder.

use crate::constants::*;

/// Commands understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// Read the full flash-resident configuration and identity.
    ConfigU3,
    /// Read or write the volatile analog/digital configuration.
    ConfigIo,
    /// Read the direction of every digital line.
    PortDirRead,
    /// Write the direction of digital lines.
    PortDirWrite,
    /// Read the level of every digital line.
    PortStateRead,
    /// Write the output level of digital lines.
    PortStateWrite,
    /// Take one analog reading.
    AnalogInput,
}

impl CommandId {
    /// Every command, in catalog order.
    pub const ALL: [CommandId; 7] = [
        CommandId::ConfigU3,
        CommandId::ConfigIo,
        CommandId::PortDirRead,
        CommandId::PortDirWrite,
        CommandId::PortStateRead,
        CommandId::PortStateWrite,
        CommandId::AnalogInput,
    ];

    /// The static descriptor for this command.
    pub fn descriptor(self) -> &'static CommandDescriptor {
        &CATALOG[self as usize]
    }

    /// Short kebab-case name.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CommandId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandId::ALL
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| format!("unknown command '{}'", s))
    }
}

/// The single IOType carried by a feedback command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedbackOp {
    /// IOType 30.
    PortDirRead,
    /// IOType 29.
    PortDirWrite,
    /// IOType 26.
    PortStateRead,
    /// IOType 27.
    PortStateWrite,
    /// IOType 1.
    AnalogInput,
}

impl FeedbackOp {
    /// IOType byte written at offset 7.
    pub const fn io_type(&self) -> u8 {
        match self {
            FeedbackOp::PortDirRead => feedback::IOTYPE_PORT_DIR_READ,
            FeedbackOp::PortDirWrite => feedback::IOTYPE_PORT_DIR_WRITE,
            FeedbackOp::PortStateRead => feedback::IOTYPE_PORT_STATE_READ,
            FeedbackOp::PortStateWrite => feedback::IOTYPE_PORT_STATE_WRITE,
            FeedbackOp::AnalogInput => feedback::IOTYPE_AIN,
        }
    }
}

/// Commands sharing a request/response shape and validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandFamily {
    /// Extended command 0x08: full configuration.
    ConfigU3,
    /// Extended command 0x0B: analog/digital configuration.
    ConfigIo,
    /// Feedback command carrying one IOType.
    Feedback(FeedbackOp),
}

impl CommandFamily {
    /// Whether the validator checks only the first header byte.
    pub const fn echoes_first_header_byte_only(&self) -> bool {
        matches!(self, CommandFamily::Feedback(_))
    }
}

/// Static shape of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// The command this descriptor belongs to.
    pub id: CommandId,
    /// Short kebab-case name.
    pub name: &'static str,
    /// Exact request length.
    pub send_len: usize,
    /// Exact response length.
    pub recv_len: usize,
    /// Request header bytes 1-3.
    pub header: [u8; HEADER_LEN],
    /// Header bytes 1-3 the device sends back.
    pub response_header: [u8; HEADER_LEN],
    /// Family selecting builder, validator and decoder.
    pub family: CommandFamily,
}

impl CommandDescriptor {
    /// Header bytes the validator compares.
    pub fn checked_response_header(&self) -> &[u8] {
        if self.family.echoes_first_header_byte_only() {
            &self.response_header[..1]
        } else {
            &self.response_header
        }
    }
}

/// Feedback header for a packet of `len` bytes: the second byte counts the
/// 16-bit words following the checksum16.
const fn feedback_header(len: usize) -> [u8; HEADER_LEN] {
    [EXTENDED_COMMAND, ((len - OFFSET_PAYLOAD) / 2) as u8, FEEDBACK_HEADER_TAIL]
}

const fn feedback_command(
    id: CommandId,
    name: &'static str,
    send_len: usize,
    recv_len: usize,
    op: FeedbackOp,
) -> CommandDescriptor {
    CommandDescriptor {
        id,
        name,
        send_len,
        recv_len,
        header: feedback_header(send_len),
        response_header: feedback_header(recv_len),
        family: CommandFamily::Feedback(op),
    }
}

/// Port read: echo + IOType; response carries three bank bytes.
const PORT_READ_COMMAND_LENGTH: usize = 8;
const PORT_READ_RESPONSE_LENGTH: usize = 12;
/// Port write: echo + IOType + three masks + three values; no response data.
const PORT_WRITE_COMMAND_LENGTH: usize = 14;
const PORT_WRITE_RESPONSE_LENGTH: usize = 10;
/// AIN: echo + IOType + two channel bytes; response carries a 16-bit reading.
const AIN_COMMAND_LENGTH: usize = 10;
const AIN_RESPONSE_LENGTH: usize = 12;

/// The command catalog, indexed by `CommandId as usize`.
pub static CATALOG: [CommandDescriptor; 7] = [
    CommandDescriptor {
        id: CommandId::ConfigU3,
        name: "config-u3",
        send_len: CONFIGU3_COMMAND_LENGTH,
        recv_len: CONFIGU3_RESPONSE_LENGTH,
        header: CONFIGU3_HEADER,
        response_header: CONFIGU3_RESPONSE_HEADER,
        family: CommandFamily::ConfigU3,
    },
    CommandDescriptor {
        id: CommandId::ConfigIo,
        name: "config-io",
        send_len: CONFIGIO_COMMAND_LENGTH,
        recv_len: CONFIGIO_RESPONSE_LENGTH,
        header: CONFIGIO_HEADER,
        response_header: CONFIGIO_HEADER,
        family: CommandFamily::ConfigIo,
    },
    feedback_command(
        CommandId::PortDirRead,
        "port-dir-read",
        PORT_READ_COMMAND_LENGTH,
        PORT_READ_RESPONSE_LENGTH,
        FeedbackOp::PortDirRead,
    ),
    feedback_command(
        CommandId::PortDirWrite,
        "port-dir-write",
        PORT_WRITE_COMMAND_LENGTH,
        PORT_WRITE_RESPONSE_LENGTH,
        FeedbackOp::PortDirWrite,
    ),
    feedback_command(
        CommandId::PortStateRead,
        "port-state-read",
        PORT_READ_COMMAND_LENGTH,
        PORT_READ_RESPONSE_LENGTH,
        FeedbackOp::PortStateRead,
    ),
    feedback_command(
        CommandId::PortStateWrite,
        "port-state-write",
        PORT_WRITE_COMMAND_LENGTH,
        PORT_WRITE_RESPONSE_LENGTH,
        FeedbackOp::PortStateWrite,
    ),
    feedback_command(
        CommandId::AnalogInput,
        "ain",
        AIN_COMMAND_LENGTH,
        AIN_RESPONSE_LENGTH,
        FeedbackOp::AnalogInput,
    ),
];

/// Find the descriptor whose request header and IOType match a raw request.
///
/// Used by device emulators to dispatch incoming packets.
pub fn lookup_request(packet: &[u8]) -> Option<&'static CommandDescriptor> {
    if packet.len() < OFFSET_PAYLOAD {
        return None;
    }
    let header = &packet[OFFSET_HEADER..OFFSET_HEADER + HEADER_LEN];

    CATALOG.iter().find(|desc| {
        if desc.send_len != packet.len() || desc.header != header {
            return false;
        }
        match desc.family {
            CommandFamily::Feedback(op) => packet.get(feedback::IO_TYPE) == Some(&op.io_type()),
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_ids() {
        for id in CommandId::ALL {
            assert_eq!(id.descriptor().id, id);
        }
    }

    #[test]
    fn test_feedback_headers_count_words() {
        let desc = CommandId::PortDirWrite.descriptor();
        assert_eq!(desc.header, [0xF8, 0x04, 0x00]);
        assert_eq!(desc.response_header, [0xF8, 0x02, 0x00]);

        let desc = CommandId::AnalogInput.descriptor();
        assert_eq!(desc.header, [0xF8, 0x02, 0x00]);
        assert_eq!(desc.response_header, [0xF8, 0x03, 0x00]);
    }

    #[test]
    fn test_lengths_are_even_and_cover_header() {
        for desc in CATALOG.iter() {
            assert!(desc.send_len > OFFSET_PAYLOAD, "{}", desc.name);
            assert!(desc.recv_len > OFFSET_ERROR_CODE, "{}", desc.name);
            assert_eq!(desc.send_len % 2, 0, "{}", desc.name);
            assert_eq!(desc.recv_len % 2, 0, "{}", desc.name);
        }
    }

    #[test]
    fn test_checked_header_by_family() {
        assert_eq!(CommandId::ConfigU3.descriptor().checked_response_header(), &[0xF8, 0x10, 0x08]);
        assert_eq!(CommandId::PortStateRead.descriptor().checked_response_header(), &[0xF8]);
    }

    #[test]
    fn test_parse_names() {
        for id in CommandId::ALL {
            assert_eq!(id.name().parse::<CommandId>(), Ok(id));
        }
        assert!("config".parse::<CommandId>().is_err());
    }

    #[test]
    fn test_lookup_request_distinguishes_io_types() {
        let mut packet = [0u8; 8];
        packet[1..4].copy_from_slice(&[0xF8, 0x01, 0x00]);
        packet[feedback::IO_TYPE] = feedback::IOTYPE_PORT_STATE_READ;
        assert_eq!(lookup_request(&packet).map(|d| d.id), Some(CommandId::PortStateRead));

        packet[feedback::IO_TYPE] = feedback::IOTYPE_PORT_DIR_READ;
        assert_eq!(lookup_request(&packet).map(|d| d.id), Some(CommandId::PortDirRead));

        packet[feedback::IO_TYPE] = 99;
        assert!(lookup_request(&packet).is_none());
    }
}
