//! In-process U3 emulator.
//!
//! [`SimulatedU3`] answers every catalog command with a sealed response and
//! keeps the volatile configuration (analog lines, directions, output
//! latches) across transactions the way the hardware does. Requests with a
//! bad checksum are answered with the `0xB8 0xB8` sentinel.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;
use u3_protocol::{
    checksum16, checksum8, config_io, config_u3, feedback, lookup_request, seal, Bank, CommandFamily, CommandId,
    FeedbackOp, BAD_CHECKSUM_SENTINEL, OFFSET_CHECKSUM16_HI, OFFSET_CHECKSUM16_LO, OFFSET_CHECKSUM8, OFFSET_ERROR_CODE,
    OFFSET_HEADER, OFFSET_PAYLOAD, U3_PRODUCT_ID, VERSION_INFO_U3_HV,
};

use crate::transport::{Connector, Transport, TransportError};

/// A `major.minor` version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

impl Version {
    /// Create a version.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

/// Make every response to `command` (or every command) carry `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectedError {
    /// Device error code to report.
    pub code: u8,
    /// Command name to fail; `None` fails every command.
    #[serde(default)]
    pub command: Option<String>,
}

impl InjectedError {
    fn applies_to(&self, command: CommandId) -> bool {
        self.command.as_deref().map_or(true, |name| name == command.name())
    }
}

/// Identity and inputs of a simulated device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Version info byte (selects the reported device name).
    pub version_info: u8,
    /// Serial number.
    pub serial_number: u32,
    /// Local id.
    pub local_id: u8,
    /// Firmware version.
    pub firmware_version: Version,
    /// Bootloader version.
    pub bootloader_version: Version,
    /// Hardware version.
    pub hardware_version: Version,
    /// Raw AIN readings by channel.
    pub analog_readings: BTreeMap<u8, u16>,
    /// Raw reading for channels not listed in `analog_readings`.
    pub default_reading: u16,
    /// Levels seen on input lines, one byte per bank (FIO, EIO, CIO).
    pub digital_inputs: [u8; 3],
    /// Error code injection.
    pub inject_error: Option<InjectedError>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            version_info: VERSION_INFO_U3_HV,
            serial_number: 320_012_345,
            local_id: 1,
            firmware_version: Version::new(1, 46),
            bootloader_version: Version::new(0, 27),
            hardware_version: Version::new(1, 30),
            analog_readings: BTreeMap::new(),
            default_reading: 0x8000,
            digital_inputs: [0; 3],
            inject_error: None,
        }
    }
}

/// Volatile device configuration.
#[derive(Debug, Clone, Default)]
struct Registers {
    fio_analog: u8,
    eio_analog: u8,
    directions: [u8; 3],
    latches: [u8; 3],
}

#[derive(Debug)]
struct SimState {
    config: SimulatorConfig,
    registers: Registers,
    present: bool,
    requests: usize,
}

impl SimState {
    fn respond(&mut self, request: &[u8]) -> Vec<u8> {
        self.requests += 1;

        let Some(desc) = lookup_request(request) else {
            trace!("unrecognized request {:02X?}", request);
            return vec![BAD_CHECKSUM_SENTINEL; 2];
        };

        let mut response = vec![0u8; desc.recv_len];
        if !checksums_match(request) {
            response[OFFSET_CHECKSUM8] = BAD_CHECKSUM_SENTINEL;
            response[OFFSET_HEADER] = BAD_CHECKSUM_SENTINEL;
            return response;
        }
        response[OFFSET_HEADER..OFFSET_HEADER + desc.response_header.len()].copy_from_slice(&desc.response_header);

        let injected = self
            .config
            .inject_error
            .as_ref()
            .filter(|e| e.applies_to(desc.id))
            .map(|e| e.code);

        match injected {
            Some(code) => response[OFFSET_ERROR_CODE] = code,
            None => match desc.family {
                CommandFamily::ConfigU3 => self.config_u3(&mut response),
                CommandFamily::ConfigIo => self.config_io(request, &mut response),
                CommandFamily::Feedback(op) => self.feedback(op, request, &mut response),
            },
        }
        if let CommandFamily::Feedback(_) = desc.family {
            response[feedback::RESPONSE_ECHO] = request[feedback::ECHO];
        }

        seal(&mut response);
        trace!("{} -> {:02X?}", desc.name, response);
        response
    }

    fn config_u3(&self, buf: &mut [u8]) {
        use config_u3::*;

        let config = &self.config;
        for (offset, version) in [
            (FIRMWARE_VERSION, config.firmware_version),
            (BOOTLOADER_VERSION, config.bootloader_version),
            (HARDWARE_VERSION, config.hardware_version),
        ] {
            buf[offset] = version.minor;
            buf[offset + 1] = version.major;
        }
        buf[SERIAL_NUMBER..SERIAL_NUMBER + 4].copy_from_slice(&config.serial_number.to_le_bytes());
        buf[PRODUCT_ID..PRODUCT_ID + 2].copy_from_slice(&U3_PRODUCT_ID.to_le_bytes());
        buf[LOCAL_ID] = config.local_id;
        buf[FIO_ANALOG] = self.registers.fio_analog;
        buf[FIO_DIRECTION] = self.registers.directions[0];
        buf[FIO_STATE] = self.registers.latches[0];
        buf[EIO_ANALOG] = self.registers.eio_analog;
        buf[EIO_DIRECTION] = self.registers.directions[1];
        buf[EIO_STATE] = self.registers.latches[1];
        buf[CIO_DIRECTION] = self.registers.directions[2];
        buf[CIO_STATE] = self.registers.latches[2];
        buf[VERSION_INFO] = config.version_info;
    }

    fn config_io(&mut self, request: &[u8], buf: &mut [u8]) {
        let mask = request[config_io::WRITE_MASK];
        if mask & config_io::MASK_FIO_ANALOG != 0 {
            self.registers.fio_analog = request[config_io::FIO_ANALOG];
        }
        if mask & config_io::MASK_EIO_ANALOG != 0 {
            self.registers.eio_analog = request[config_io::EIO_ANALOG];
        }
        buf[config_io::FIO_ANALOG] = self.registers.fio_analog;
        buf[config_io::EIO_ANALOG] = self.registers.eio_analog;
    }

    fn feedback(&mut self, op: FeedbackOp, request: &[u8], buf: &mut [u8]) {
        let data = &mut buf[feedback::DATA..];
        match op {
            FeedbackOp::PortDirRead => data[..3].copy_from_slice(&self.registers.directions),
            FeedbackOp::PortStateRead => {
                for bank in Bank::ALL {
                    let i = bank.index();
                    let outputs = self.registers.directions[i];
                    data[i] = (self.registers.latches[i] & outputs) | (self.config.digital_inputs[i] & !outputs);
                }
            }
            FeedbackOp::PortDirWrite => apply_port_write(&mut self.registers.directions, request),
            FeedbackOp::PortStateWrite => apply_port_write(&mut self.registers.latches, request),
            FeedbackOp::AnalogInput => {
                let channel = request[feedback::AIN_POSITIVE_CHANNEL] & feedback::AIN_CHANNEL_MASK;
                let raw = self
                    .config
                    .analog_readings
                    .get(&channel)
                    .copied()
                    .unwrap_or(self.config.default_reading);
                data[..2].copy_from_slice(&raw.to_le_bytes());
            }
        }
    }
}

fn checksums_match(request: &[u8]) -> bool {
    if request.len() <= OFFSET_PAYLOAD {
        return false;
    }
    let csum16 = checksum16(request, request.len());
    request[OFFSET_CHECKSUM8] == checksum8(request)
        && request[OFFSET_CHECKSUM16_LO] == (csum16 & 0xFF) as u8
        && request[OFFSET_CHECKSUM16_HI] == ((csum16 >> 8) & 0xFF) as u8
}

fn apply_port_write(registers: &mut [u8; 3], request: &[u8]) {
    for (i, register) in registers.iter_mut().enumerate() {
        let mask = request[feedback::PORT_WRITE_MASK + i];
        let value = request[feedback::PORT_WRITE_VALUE + i];
        *register = (*register & !mask) | (value & mask);
    }
}

/// A simulated U3. Clones share the same device.
#[derive(Debug, Clone)]
pub struct SimulatedU3 {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedU3 {
    /// Create a device with `config`, all lines digital inputs.
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                config,
                registers: Registers::default(),
                present: true,
                requests: 0,
            })),
        }
    }

    /// Plug or unplug the device.
    pub fn set_present(&self, present: bool) {
        self.state.lock().present = present;
    }

    /// Change the error injection.
    pub fn inject_error(&self, inject: Option<InjectedError>) {
        self.state.lock().config.inject_error = inject;
    }

    /// Set the raw reading for one AIN channel.
    pub fn set_analog_reading(&self, channel: u8, raw: u16) {
        self.state.lock().config.analog_readings.insert(channel, raw);
    }

    /// Set the levels seen on input lines of one bank.
    pub fn set_digital_inputs(&self, bank: Bank, levels: u8) {
        self.state.lock().config.digital_inputs[bank.index()] = levels;
    }

    /// Requests answered so far.
    pub fn requests(&self) -> usize {
        self.state.lock().requests
    }

    /// Direction register of one bank (bit set means output).
    pub fn directions(&self, bank: Bank) -> u8 {
        self.state.lock().registers.directions[bank.index()]
    }

    /// Output latch of one bank.
    pub fn latches(&self, bank: Bank) -> u8 {
        self.state.lock().registers.latches[bank.index()]
    }

    /// Analog configuration of FIO and EIO (bit set means analog).
    pub fn analog_config(&self) -> (u8, u8) {
        let state = self.state.lock();
        (state.registers.fio_analog, state.registers.eio_analog)
    }
}

impl Default for SimulatedU3 {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl Connector for SimulatedU3 {
    fn describe(&self) -> String {
        "sim".to_string()
    }

    fn open(&mut self) -> Result<Box<dyn Transport>, TransportError> {
        if !self.state.lock().present {
            return Err(TransportError::NotFound);
        }
        Ok(Box::new(SimTransport {
            state: Arc::clone(&self.state),
            pending: Vec::new(),
        }))
    }
}

struct SimTransport {
    state: Arc<Mutex<SimState>>,
    pending: Vec<u8>,
}

impl Transport for SimTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.pending = self.state.lock().respond(data);
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.pending.is_empty() {
            return Err(TransportError::Timeout);
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn close(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use u3_protocol::{build_request, validate_response, DeviceState, ProtocolError};

    fn roundtrip(sim: &mut SimulatedU3, command: CommandId, param: u8, state: &DeviceState) -> Vec<u8> {
        let desc = command.descriptor();
        let mut transport = sim.open().unwrap();
        transport.write(&build_request(desc, param, state)).unwrap();
        let mut buf = vec![0u8; desc.recv_len];
        assert_eq!(transport.read(&mut buf).unwrap(), desc.recv_len);
        transport.close();
        buf
    }

    #[test]
    fn test_answers_every_command_with_valid_response() {
        let mut sim = SimulatedU3::default();
        let state = DeviceState::new();
        for id in CommandId::ALL {
            let response = roundtrip(&mut sim, id, 0, &state);
            assert_eq!(validate_response(id.descriptor(), &response), Ok(()), "{}", id);
        }
        assert_eq!(sim.requests(), CommandId::ALL.len());
    }

    #[test]
    fn test_bad_checksum_gets_sentinel() {
        let mut sim = SimulatedU3::default();
        let desc = CommandId::ConfigIo.descriptor();
        let mut request = build_request(desc, 0, &DeviceState::new());
        request[OFFSET_CHECKSUM8] ^= 0x01;

        let mut transport = sim.open().unwrap();
        transport.write(&request).unwrap();
        let mut buf = vec![0u8; desc.recv_len];
        transport.read(&mut buf).unwrap();

        assert_eq!(validate_response(desc, &buf), Err(ProtocolError::ChecksumRejected));
    }

    #[test]
    fn test_injected_error_targets_one_command() {
        let mut sim = SimulatedU3::default();
        sim.inject_error(Some(InjectedError {
            code: 40,
            command: Some("ain".to_string()),
        }));
        let state = DeviceState::new();

        let ain = roundtrip(&mut sim, CommandId::AnalogInput, 0, &state);
        assert_eq!(validate_response(CommandId::AnalogInput.descriptor(), &ain), Err(ProtocolError::DeviceError(40)));

        let dir = roundtrip(&mut sim, CommandId::PortDirRead, 0, &state);
        assert_eq!(validate_response(CommandId::PortDirRead.descriptor(), &dir), Ok(()));
    }

    #[test]
    fn test_port_writes_only_touch_masked_lines() {
        let mut sim = SimulatedU3::default();
        let mut state = DeviceState::new();
        for pin in state.fio.iter_mut().chain(state.eio.iter_mut()) {
            pin.io_mode = u3_protocol::IoMode::Output;
        }

        roundtrip(&mut sim, CommandId::PortDirWrite, u3_protocol::BANK_SELECT_FIO, &state);
        assert_eq!(sim.directions(Bank::Fio), 0xF0);
        assert_eq!(sim.directions(Bank::Eio), 0x00);
    }

    #[test]
    fn test_config_from_yaml_uses_defaults() {
        let config: SimulatorConfig = serde_yaml::from_str("serial_number: 7\nanalog_readings:\n  4: 1000\n").unwrap();
        assert_eq!(config.serial_number, 7);
        assert_eq!(config.analog_readings.get(&4), Some(&1000));
        assert_eq!(config.version_info, VERSION_INFO_U3_HV);
        assert_eq!(config.inject_error, None);
    }
}
