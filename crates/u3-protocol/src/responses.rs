//! Response decoders.
//!
//! Decoders only ever see responses that passed [`validate_response`], so
//! they index fixed offsets directly and never fail.
//!
//! [`validate_response`]: crate::validate_response

use bytes::Buf;

use crate::commands::{CommandDescriptor, CommandFamily, FeedbackOp};
use crate::constants::*;
use crate::types::{device_name, Bank, DeviceState, DirectionMode, IoMode};

/// Project a validated response into `state`.
///
/// `request` is the packet that produced the response; AIN reads its channel
/// selector back from it.
pub fn decode_response(desc: &CommandDescriptor, request: &[u8], response: &[u8], state: &mut DeviceState) {
    log::trace!("{} response: {:02X?}", desc.name, response);

    match desc.family {
        CommandFamily::ConfigU3 => decode_config_u3(response, state),
        CommandFamily::ConfigIo => {
            decode_analog_bits(response[config_io::FIO_ANALOG], response[config_io::EIO_ANALOG], state)
        }
        CommandFamily::Feedback(op) => {
            let data = &response[feedback::DATA..];
            match op {
                FeedbackOp::PortDirRead => decode_directions([data[0], data[1], data[2]], state),
                FeedbackOp::PortStateRead => decode_levels([data[0], data[1], data[2]], state),
                FeedbackOp::AnalogInput => {
                    let selector = request[feedback::AIN_POSITIVE_CHANNEL];
                    let raw = (&data[..2]).get_u16_le();
                    decode_analog_value(selector, raw, state);
                }
                // Writes are acknowledged without data.
                FeedbackOp::PortDirWrite | FeedbackOp::PortStateWrite => {}
            }
        }
    }
}

/// Format a `major.minor` version from its two bytes.
fn version(minor: u8, major: u8) -> String {
    format!("{}.{:02}", major, minor)
}

fn decode_config_u3(buf: &[u8], state: &mut DeviceState) {
    use config_u3::*;

    state.firmware_version = version(buf[FIRMWARE_VERSION], buf[FIRMWARE_VERSION + 1]);
    state.bootloader_version = version(buf[BOOTLOADER_VERSION], buf[BOOTLOADER_VERSION + 1]);
    state.hardware_version = version(buf[HARDWARE_VERSION], buf[HARDWARE_VERSION + 1]);
    state.serial_number = (&buf[SERIAL_NUMBER..SERIAL_NUMBER + 4]).get_u32_le();
    state.product_id = (&buf[PRODUCT_ID..PRODUCT_ID + 2]).get_u16_le();
    state.local_id = buf[LOCAL_ID];
    state.device_name = device_name(buf[VERSION_INFO]).to_string();

    decode_analog_bits(buf[FIO_ANALOG], buf[EIO_ANALOG], state);
    decode_directions([buf[FIO_DIRECTION], buf[EIO_DIRECTION], buf[CIO_DIRECTION]], state);
}

/// Bit set means analog. CIO has no analog inputs.
fn decode_analog_bits(fio: u8, eio: u8, state: &mut DeviceState) {
    let mode = |pin: &mut crate::types::Pin, set: bool| {
        pin.direction_mode = if set {
            DirectionMode::Analog
        } else {
            DirectionMode::Digital
        };
    };
    state.unpack_bits(Bank::Fio, 0xFF, fio, mode);
    state.unpack_bits(Bank::Eio, 0xFF, eio, mode);
    for pin in state.cio.iter_mut() {
        pin.direction_mode = DirectionMode::Digital;
    }
}

/// Bit set means output. Only lines with digital I/O are touched.
fn decode_directions(bits: [u8; 3], state: &mut DeviceState) {
    for bank in Bank::ALL {
        state.unpack_bits(bank, bank.digital_mask(), bits[bank.index()], |pin, set| {
            pin.io_mode = if set { IoMode::Output } else { IoMode::Input };
        });
    }
}

fn decode_levels(bits: [u8; 3], state: &mut DeviceState) {
    for bank in Bank::ALL {
        state.unpack_bits(bank, bank.digital_mask(), bits[bank.index()], |pin, set| {
            pin.digital_read = u8::from(set);
        });
    }
}

fn decode_analog_value(selector: u8, raw: u16, state: &mut DeviceState) {
    let channel = selector & feedback::AIN_CHANNEL_MASK;
    let pin = match channel {
        0..=7 => &mut state.fio[channel as usize],
        8..=15 => &mut state.eio[channel as usize - 8],
        _ => {
            log::debug!("AIN channel {} has no pin; reading {} dropped", channel, raw);
            return;
        }
    };
    pin.analog_raw = raw;
    pin.analog_voltage = ain_voltage(channel, raw);
}

/// Convert a raw single-ended AIN reading to volts.
///
/// FIO0-3 sit behind the high-voltage front-end; every other channel uses
/// the low-voltage one.
pub fn ain_voltage(channel: u8, raw: u16) -> f64 {
    let (slope, offset) = if channel < HIGH_VOLTAGE_CHANNELS {
        (HV_SLOPE, HV_OFFSET)
    } else {
        (LV_SLOPE, LV_OFFSET)
    };
    (f64::from(raw) * slope + offset) * 2.0
}
