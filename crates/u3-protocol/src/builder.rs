//! Request builders.
//!
//! [`build_request`] produces the exact bytes for one command: header from
//! the catalog, family-specific payload, then both checksums. Write-family
//! payloads are packed from the [`DeviceState`] the caller has prepared.

use bytes::BufMut;

use crate::checksum::seal;
use crate::commands::{CommandDescriptor, CommandFamily, FeedbackOp};
use crate::constants::*;
use crate::types::{Bank, DeviceState, DirectionMode, IoMode, Pin};

/// Build a sealed request.
///
/// `param` is the write mask for ConfigIO, the bank selector
/// (`BANK_SELECT_*`) for port writes and the positive channel selector for
/// AIN. ConfigU3 and the port reads ignore it.
pub fn build_request(desc: &CommandDescriptor, param: u8, state: &DeviceState) -> Vec<u8> {
    let mut buf = vec![0u8; desc.send_len];
    buf[OFFSET_HEADER..OFFSET_HEADER + HEADER_LEN].copy_from_slice(&desc.header);

    match desc.family {
        // The write mask stays zero so the flash is only ever read.
        CommandFamily::ConfigU3 => {}
        CommandFamily::ConfigIo => build_config_io(&mut buf, param, state),
        CommandFamily::Feedback(op) => {
            buf[feedback::ECHO] = 0;
            buf[feedback::IO_TYPE] = op.io_type();
            let args = &mut buf[feedback::ARGS..];
            match op {
                FeedbackOp::PortDirRead | FeedbackOp::PortStateRead => {}
                FeedbackOp::PortDirWrite => {
                    build_port_write(args, param, state, |pin| pin.io_mode == IoMode::Output)
                }
                FeedbackOp::PortStateWrite => {
                    build_port_write(args, param, state, |pin| pin.digital_write != 0)
                }
                FeedbackOp::AnalogInput => {
                    let mut args = args;
                    args.put_u8(param);
                    args.put_u8(feedback::AIN_SINGLE_ENDED);
                }
            }
        }
    }

    seal(&mut buf);
    log::trace!("{} request: {:02X?}", desc.name, buf);
    buf
}

/// Positive channel selector for an AIN request.
pub fn ain_channel_selector(channel: u8, long_settling: bool) -> u8 {
    let mut selector = channel & feedback::AIN_CHANNEL_MASK;
    if long_settling {
        selector |= feedback::AIN_LONG_SETTLING;
    }
    selector
}

fn build_config_io(buf: &mut [u8], write_mask: u8, state: &DeviceState) {
    let is_analog = |pin: &Pin| pin.direction_mode == DirectionMode::Analog;

    buf[config_io::WRITE_MASK] = write_mask;
    if write_mask & config_io::MASK_FIO_ANALOG != 0 {
        buf[config_io::FIO_ANALOG] = state.pack_bits(Bank::Fio, 0xFF, is_analog);
    }
    if write_mask & config_io::MASK_EIO_ANALOG != 0 {
        buf[config_io::EIO_ANALOG] = state.pack_bits(Bank::Eio, 0xFF, is_analog);
    }
}

/// Port write arguments: three line masks then three values, FIO/EIO/CIO.
fn build_port_write(mut args: &mut [u8], bank_select: u8, state: &DeviceState, bit: impl Fn(&Pin) -> bool) {
    let masks = Bank::ALL.map(|bank| {
        if bank_select & bank.select_bit() != 0 {
            bank.digital_mask()
        } else {
            0
        }
    });
    let values = Bank::ALL.map(|bank| state.pack_bits(bank, masks[bank.index()], &bit));

    args.put_slice(&masks);
    args.put_slice(&values);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{checksum16, checksum8};
    use crate::commands::CommandId;

    fn assert_sealed(buf: &[u8]) {
        let csum16 = checksum16(buf, buf.len());
        assert_eq!(buf[OFFSET_CHECKSUM16_LO], (csum16 & 0xFF) as u8);
        assert_eq!(buf[OFFSET_CHECKSUM16_HI], ((csum16 >> 8) & 0xFF) as u8);
        assert_eq!(buf[OFFSET_CHECKSUM8], checksum8(buf));
    }

    #[test]
    fn test_every_command_builds_exact_sealed_buffer() {
        let state = DeviceState::new();
        for id in CommandId::ALL {
            let desc = id.descriptor();
            let buf = build_request(desc, 0xFF, &state);
            assert_eq!(buf.len(), desc.send_len, "{}", id);
            assert_eq!(&buf[1..4], &desc.header, "{}", id);
            assert_sealed(&buf);
        }
    }

    #[test]
    fn test_config_u3_ignores_write_mask() {
        let buf = build_request(CommandId::ConfigU3.descriptor(), 0xFF, &DeviceState::new());
        assert!(buf[OFFSET_PAYLOAD..].iter().all(|&b| b == 0));
        assert_eq!(buf[..6], [11, 0xF8, 0x0A, 0x08, 0x00, 0x00]);
    }

    #[test]
    fn test_config_io_packs_analog_bits_under_mask() {
        let mut state = DeviceState::new();
        state.fio[0].direction_mode = DirectionMode::Analog;
        state.fio[3].direction_mode = DirectionMode::Analog;
        state.eio[7].direction_mode = DirectionMode::Analog;

        let desc = CommandId::ConfigIo.descriptor();
        let buf = build_request(desc, config_io::MASK_FIO_ANALOG | config_io::MASK_EIO_ANALOG, &state);
        assert_eq!(buf[config_io::WRITE_MASK], 0x0C);
        assert_eq!(buf[config_io::FIO_ANALOG], 0x09);
        assert_eq!(buf[config_io::EIO_ANALOG], 0x80);

        let read = build_request(desc, 0, &state);
        assert_eq!(read[config_io::FIO_ANALOG], 0);
        assert_eq!(read[config_io::EIO_ANALOG], 0);
    }

    #[test]
    fn test_port_dir_write_never_sets_missing_lines() {
        let mut state = DeviceState::new();
        for bank in Bank::ALL {
            for pin in state.pins_mut(bank) {
                pin.io_mode = IoMode::Output;
            }
        }

        let buf = build_request(CommandId::PortDirWrite.descriptor(), BANK_SELECT_ALL, &state);
        assert_eq!(buf[feedback::IO_TYPE], feedback::IOTYPE_PORT_DIR_WRITE);
        assert_eq!(&buf[8..11], &[0xF0, 0xFF, 0x0F]);
        assert_eq!(&buf[11..14], &[0xF0, 0xFF, 0x0F]);
    }

    #[test]
    fn test_port_state_write_limited_to_selected_banks() {
        let mut state = DeviceState::new();
        state.fio[5].digital_write = 1;
        state.eio[2].digital_write = 1;
        state.cio[1].digital_write = 1;

        let buf = build_request(CommandId::PortStateWrite.descriptor(), BANK_SELECT_EIO, &state);
        assert_eq!(&buf[8..11], &[0x00, 0xFF, 0x00]);
        assert_eq!(&buf[11..14], &[0x00, 0x04, 0x00]);

        let buf = build_request(CommandId::PortStateWrite.descriptor(), BANK_SELECT_ALL, &state);
        assert_eq!(&buf[11..14], &[0x20, 0x04, 0x02]);
    }

    #[test]
    fn test_ain_embeds_channel_and_settling() {
        let selector = ain_channel_selector(9, true);
        assert_eq!(selector, 0x49);

        let buf = build_request(CommandId::AnalogInput.descriptor(), selector, &DeviceState::new());
        assert_eq!(buf[feedback::IO_TYPE], feedback::IOTYPE_AIN);
        assert_eq!(buf[feedback::AIN_POSITIVE_CHANNEL], 0x49);
        assert_eq!(buf[feedback::AIN_NEGATIVE_CHANNEL], 31);
    }

    #[test]
    fn test_builder_is_deterministic() {
        let state = DeviceState::new();
        let desc = CommandId::PortStateWrite.descriptor();
        assert_eq!(build_request(desc, 0x07, &state), build_request(desc, 0x07, &state));
    }
}
