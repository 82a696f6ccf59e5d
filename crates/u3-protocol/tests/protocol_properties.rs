//! Cross-module properties of the U3 protocol: every command in the catalog
//! builds, echoes, validates and decodes consistently.

use u3_protocol::*;

/// What a healthy device sends back for `request`: the family's response
/// header, zero error code and the echo byte for feedback packets.
fn echo(desc: &CommandDescriptor, request: &[u8]) -> Vec<u8> {
    let mut response = vec![0u8; desc.recv_len];
    response[1..4].copy_from_slice(&desc.response_header);
    if let CommandFamily::Feedback(_) = desc.family {
        response[feedback::RESPONSE_ECHO] = request[feedback::ECHO];
    }
    seal(&mut response);
    response
}

#[test]
fn test_builder_output_is_consistent_with_checksums() {
    let state = DeviceState::new();
    for id in CommandId::ALL {
        let desc = id.descriptor();
        for param in [0x00, 0x07, 0x0C, 0x4A, 0xFF] {
            let request = build_request(desc, param, &state);
            assert_eq!(request.len(), desc.send_len);

            let csum16 = checksum16(&request, desc.send_len);
            assert_eq!(request[4], (csum16 & 0xFF) as u8, "{} param {:#x}", id, param);
            assert_eq!(request[5], ((csum16 / 256) & 0xFF) as u8, "{} param {:#x}", id, param);
            assert_eq!(request[0], checksum8(&request), "{} param {:#x}", id, param);
        }
    }
}

#[test]
fn test_validator_accepts_echoed_requests() {
    let state = DeviceState::new();
    for id in CommandId::ALL {
        let desc = id.descriptor();
        let request = build_request(desc, 0, &state);
        let response = echo(desc, &request);
        assert_eq!(validate_response(desc, &response), Ok(()), "{}", id);
    }
}

#[test]
fn test_lookup_finds_every_built_request() {
    let state = DeviceState::new();
    for id in CommandId::ALL {
        let request = build_request(id.descriptor(), BANK_SELECT_ALL, &state);
        assert_eq!(lookup_request(&request).map(|d| d.id), Some(id));
    }
}

#[test]
fn test_device_error_stops_before_decode() {
    let desc = CommandId::ConfigU3.descriptor();
    let request = build_request(desc, 0, &DeviceState::new());
    let mut response = echo(desc, &request);
    response[config_u3::VERSION_INFO] = VERSION_INFO_U3_HV;
    response[OFFSET_ERROR_CODE] = 5;
    seal(&mut response);

    let mut state = DeviceState::new();
    let result = validate_response(desc, &response);
    if result.is_ok() {
        decode_response(desc, &request, &response, &mut state);
    }

    assert_eq!(result, Err(ProtocolError::DeviceError(5)));
    assert_eq!(state, DeviceState::new());
}

#[test]
fn test_written_directions_read_back_the_same() {
    let mut written = DeviceState::new();
    written.fio[4].io_mode = IoMode::Output;
    written.eio[0].io_mode = IoMode::Output;
    written.cio[3].io_mode = IoMode::Output;

    let request = build_request(CommandId::PortDirWrite.descriptor(), BANK_SELECT_ALL, &written);
    let values = &request[feedback::PORT_WRITE_VALUE..feedback::PORT_WRITE_VALUE + 3];

    // A device applying the write reports the same bits on the next read.
    let desc = CommandId::PortDirRead.descriptor();
    let mut response = echo(desc, &build_request(desc, 0, &written));
    response[feedback::DATA..feedback::DATA + 3].copy_from_slice(values);
    seal(&mut response);
    assert_eq!(validate_response(desc, &response), Ok(()));

    let mut read = DeviceState::new();
    decode_response(desc, &[], &response, &mut read);
    for bank in Bank::ALL {
        let modes: Vec<_> = read.pins(bank).iter().map(|p| p.io_mode).collect();
        let expected: Vec<_> = written.pins(bank).iter().map(|p| p.io_mode).collect();
        assert_eq!(modes, expected, "{}", bank);
    }
}
