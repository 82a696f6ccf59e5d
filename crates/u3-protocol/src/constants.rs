//! Protocol constants
//!
//! Byte offsets, header values and IOType codes used by the U3 command set.
//! Offsets are grouped per command family so that the builder for a command
//! and the decoder for its response read from the same table.

// ============================================================================
// Packet Framing (shared by every command)
// ============================================================================

/// Offset of the 8-bit checksum.
pub const OFFSET_CHECKSUM8: usize = 0;
/// Offset of the first command header byte.
pub const OFFSET_HEADER: usize = 1;
/// Number of command header bytes.
pub const HEADER_LEN: usize = 3;
/// Offset of the checksum16 low byte.
pub const OFFSET_CHECKSUM16_LO: usize = 4;
/// Offset of the checksum16 high byte.
pub const OFFSET_CHECKSUM16_HI: usize = 5;
/// First payload byte (start of the checksum16 range).
pub const OFFSET_PAYLOAD: usize = 6;
/// Device error code in every response.
pub const OFFSET_ERROR_CODE: usize = 6;

/// Value echoed in bytes 0 and 1 when the device rejects a request checksum.
pub const BAD_CHECKSUM_SENTINEL: u8 = 0xB8;

/// First header byte of every extended and feedback command.
pub const EXTENDED_COMMAND: u8 = 0xF8;

// ============================================================================
// ConfigU3 (full configuration, flash resident)
// ============================================================================

/// ConfigU3 request length.
pub const CONFIGU3_COMMAND_LENGTH: usize = 26;
/// ConfigU3 response length.
pub const CONFIGU3_RESPONSE_LENGTH: usize = 38;
/// ConfigU3 request header.
pub const CONFIGU3_HEADER: [u8; HEADER_LEN] = [EXTENDED_COMMAND, 0x0A, 0x08];
/// ConfigU3 response header.
pub const CONFIGU3_RESPONSE_HEADER: [u8; HEADER_LEN] = [EXTENDED_COMMAND, 0x10, 0x08];

pub mod config_u3 {
    //! ConfigU3 response offsets.

    /// Firmware version, minor then major.
    pub const FIRMWARE_VERSION: usize = 9;
    /// Bootloader version, minor then major.
    pub const BOOTLOADER_VERSION: usize = 11;
    /// Hardware version, minor then major.
    pub const HARDWARE_VERSION: usize = 13;
    /// Serial number, 4 bytes little-endian.
    pub const SERIAL_NUMBER: usize = 15;
    /// Product id, 2 bytes little-endian.
    pub const PRODUCT_ID: usize = 19;
    /// Local id.
    pub const LOCAL_ID: usize = 21;
    /// Timer/counter pin mask.
    pub const TIMER_COUNTER_MASK: usize = 22;
    /// FIO analog enable bits.
    pub const FIO_ANALOG: usize = 23;
    /// FIO direction bits.
    pub const FIO_DIRECTION: usize = 24;
    /// FIO state bits.
    pub const FIO_STATE: usize = 25;
    /// EIO analog enable bits.
    pub const EIO_ANALOG: usize = 26;
    /// EIO direction bits.
    pub const EIO_DIRECTION: usize = 27;
    /// EIO state bits.
    pub const EIO_STATE: usize = 28;
    /// CIO direction bits.
    pub const CIO_DIRECTION: usize = 29;
    /// CIO state bits.
    pub const CIO_STATE: usize = 30;
    /// DAC1 enable.
    pub const DAC1_ENABLE: usize = 31;
    /// Compatibility options.
    pub const COMPATIBILITY_OPTIONS: usize = 36;
    /// Version info byte selecting the hardware variant.
    pub const VERSION_INFO: usize = 37;
}

// ============================================================================
// ConfigIO (volatile analog/digital configuration)
// ============================================================================

/// ConfigIO request length.
pub const CONFIGIO_COMMAND_LENGTH: usize = 12;
/// ConfigIO response length.
pub const CONFIGIO_RESPONSE_LENGTH: usize = 12;
/// ConfigIO request and response header.
pub const CONFIGIO_HEADER: [u8; HEADER_LEN] = [EXTENDED_COMMAND, 0x03, 0x0B];

pub mod config_io {
    //! ConfigIO offsets. Request and response share the layout past byte 6.

    /// Write mask (request only; byte 6 of the response is the error code).
    pub const WRITE_MASK: usize = 6;
    /// Timer/counter configuration.
    pub const TIMER_COUNTER_CONFIG: usize = 8;
    /// DAC1 enable.
    pub const DAC1_ENABLE: usize = 9;
    /// FIO analog enable bits.
    pub const FIO_ANALOG: usize = 10;
    /// EIO analog enable bits.
    pub const EIO_ANALOG: usize = 11;

    /// Write mask bit: timer/counter configuration.
    pub const MASK_TIMER_COUNTER: u8 = 0x01;
    /// Write mask bit: DAC1 enable.
    pub const MASK_DAC1_ENABLE: u8 = 0x02;
    /// Write mask bit: FIO analog.
    pub const MASK_FIO_ANALOG: u8 = 0x04;
    /// Write mask bit: EIO analog.
    pub const MASK_EIO_ANALOG: u8 = 0x08;
}

// ============================================================================
// Feedback (IOType sub-commands)
// ============================================================================

/// Third header byte of every feedback packet.
pub const FEEDBACK_HEADER_TAIL: u8 = 0x00;

pub mod feedback {
    //! Feedback packet offsets.

    /// Echo byte in the request.
    pub const ECHO: usize = 6;
    /// IOType of the single sub-command carried by a request.
    pub const IO_TYPE: usize = 7;
    /// First IOType argument byte in the request.
    pub const ARGS: usize = 8;
    /// Error frame index in the response.
    pub const ERROR_FRAME: usize = 7;
    /// Echo byte in the response.
    pub const RESPONSE_ECHO: usize = 8;
    /// First data byte in the response.
    pub const DATA: usize = 9;

    /// IOType: AIN (single analog reading).
    pub const IOTYPE_AIN: u8 = 1;
    /// IOType: PortStateRead.
    pub const IOTYPE_PORT_STATE_READ: u8 = 26;
    /// IOType: PortStateWrite.
    pub const IOTYPE_PORT_STATE_WRITE: u8 = 27;
    /// IOType: PortDirWrite.
    pub const IOTYPE_PORT_DIR_WRITE: u8 = 29;
    /// IOType: PortDirRead.
    pub const IOTYPE_PORT_DIR_READ: u8 = 30;

    /// Port write argument offsets: per-bank write masks then per-bank values.
    pub const PORT_WRITE_MASK: usize = ARGS;
    /// First per-bank value byte of a port write.
    pub const PORT_WRITE_VALUE: usize = ARGS + 3;

    /// AIN positive channel selector.
    pub const AIN_POSITIVE_CHANNEL: usize = ARGS;
    /// AIN negative channel selector.
    pub const AIN_NEGATIVE_CHANNEL: usize = ARGS + 1;
    /// Negative channel value selecting a single-ended reading.
    pub const AIN_SINGLE_ENDED: u8 = 31;
    /// Channel number bits of the positive channel selector.
    pub const AIN_CHANNEL_MASK: u8 = 0x1F;
    /// Long-settling flag of the positive channel selector.
    pub const AIN_LONG_SETTLING: u8 = 0x40;
    /// Quick-sample flag of the positive channel selector.
    pub const AIN_QUICK_SAMPLE: u8 = 0x80;
}

/// Port-write parameter bit enabling bank A (FIO).
pub const BANK_SELECT_FIO: u8 = 0x01;
/// Port-write parameter bit enabling bank B (EIO).
pub const BANK_SELECT_EIO: u8 = 0x02;
/// Port-write parameter bit enabling bank C (CIO).
pub const BANK_SELECT_CIO: u8 = 0x04;
/// Port-write parameter enabling every bank.
pub const BANK_SELECT_ALL: u8 = BANK_SELECT_FIO | BANK_SELECT_EIO | BANK_SELECT_CIO;

// ============================================================================
// Pin Banks
// ============================================================================

/// Lines in bank A (FIO).
pub const FIO_LINES: usize = 8;
/// Lines in bank B (EIO).
pub const EIO_LINES: usize = 8;
/// Lines in bank C (CIO).
pub const CIO_LINES: usize = 4;

/// FIO lines with digital I/O. FIO0-3 are analog-only high-voltage inputs.
pub const FIO_DIGITAL_MASK: u8 = 0xF0;
/// EIO lines with digital I/O.
pub const EIO_DIGITAL_MASK: u8 = 0xFF;
/// CIO lines that exist on the connector.
pub const CIO_DIGITAL_MASK: u8 = 0x0F;

// ============================================================================
// Analog Conversion
// ============================================================================

/// Number of high-voltage channels at the start of bank A.
pub const HIGH_VOLTAGE_CHANNELS: u8 = 4;
/// Slope of the high-voltage front-end, volts per count (before the x2 gain).
pub const HV_SLOPE: f64 = 10.3 / 65535.0;
/// Offset of the high-voltage front-end, volts.
pub const HV_OFFSET: f64 = -5.0;
/// Slope of the low-voltage front-end, volts per count.
pub const LV_SLOPE: f64 = 2.44 / 65535.0;
/// Offset of the low-voltage front-end, volts.
pub const LV_OFFSET: f64 = -0.527;

// ============================================================================
// Device Names
// ============================================================================

/// Version info byte of a U3A.
pub const VERSION_INFO_U3A: u8 = 0;
/// Version info byte of a U3B.
pub const VERSION_INFO_U3B: u8 = 1;
/// Version info byte of a U3-LV.
pub const VERSION_INFO_U3_LV: u8 = 2;
/// Version info byte of a U3-HV.
pub const VERSION_INFO_U3_HV: u8 = 18;

/// Product id reported by every U3.
pub const U3_PRODUCT_ID: u16 = 3;

/// Status message after a successful transaction.
pub const STATUS_NO_ERROR: &str = "no error";
