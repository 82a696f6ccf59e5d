//! Device state model.
//!
//! [`DeviceState`] is what decoders write into: three fixed banks of
//! [`Pin`]s and the identity fields reported by ConfigU3.

use crate::constants::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether a line is configured for analog input or digital I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DirectionMode {
    /// Analog input.
    Analog,
    /// Digital I/O.
    #[default]
    Digital,
}

impl std::fmt::Display for DirectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectionMode::Analog => write!(f, "Analog"),
            DirectionMode::Digital => write!(f, "Digital"),
        }
    }
}

/// Direction of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IoMode {
    /// Digital input.
    #[default]
    Input,
    /// Digital output.
    Output,
}

impl std::fmt::Display for IoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoMode::Input => write!(f, "Input"),
            IoMode::Output => write!(f, "Output"),
        }
    }
}

/// One physical I/O line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pin {
    /// Analog or digital.
    pub direction_mode: DirectionMode,
    /// Input or output (digital lines only).
    pub io_mode: IoMode,
    /// Last raw AIN reading.
    pub analog_raw: u16,
    /// Last AIN reading converted to volts.
    pub analog_voltage: f64,
    /// Last level read from the line (0 or 1).
    pub digital_read: u8,
    /// Level to drive when the line is an output (0 or 1).
    pub digital_write: u8,
}

/// One of the three physical pin banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Bank {
    /// FIO0-7 (bank A).
    Fio,
    /// EIO0-7 (bank B).
    Eio,
    /// CIO0-3 (bank C).
    Cio,
}

impl Bank {
    /// All banks in wire order.
    pub const ALL: [Bank; 3] = [Bank::Fio, Bank::Eio, Bank::Cio];

    /// Number of lines in the bank.
    pub const fn lines(&self) -> usize {
        match self {
            Bank::Fio => FIO_LINES,
            Bank::Eio => EIO_LINES,
            Bank::Cio => CIO_LINES,
        }
    }

    /// Lines of the bank with digital I/O, one bit per line.
    pub const fn digital_mask(&self) -> u8 {
        match self {
            Bank::Fio => FIO_DIGITAL_MASK,
            Bank::Eio => EIO_DIGITAL_MASK,
            Bank::Cio => CIO_DIGITAL_MASK,
        }
    }

    /// Bit of the port-write parameter that enables this bank.
    pub const fn select_bit(&self) -> u8 {
        match self {
            Bank::Fio => BANK_SELECT_FIO,
            Bank::Eio => BANK_SELECT_EIO,
            Bank::Cio => BANK_SELECT_CIO,
        }
    }

    /// Position of the bank in per-bank byte triples (FIO, EIO, CIO).
    pub const fn index(&self) -> usize {
        match self {
            Bank::Fio => 0,
            Bank::Eio => 1,
            Bank::Cio => 2,
        }
    }

    /// Lowercase prefix used by form field names ("fio", "eio", "cio").
    pub const fn prefix(&self) -> &'static str {
        match self {
            Bank::Fio => "fio",
            Bank::Eio => "eio",
            Bank::Cio => "cio",
        }
    }
}

impl std::fmt::Display for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bank::Fio => write!(f, "FIO"),
            Bank::Eio => write!(f, "EIO"),
            Bank::Cio => write!(f, "CIO"),
        }
    }
}

/// Map the ConfigU3 version info byte to a device name.
pub fn device_name(version_info: u8) -> &'static str {
    match version_info {
        VERSION_INFO_U3A => "U3A",
        VERSION_INFO_U3B => "U3B",
        VERSION_INFO_U3_LV => "U3-LV",
        VERSION_INFO_U3_HV => "U3-HV",
        _ => "Not recognized",
    }
}

/// Everything known about the attached device.
///
/// Bank sizes are part of the type; pins are never added or removed.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceState {
    /// Bank A.
    pub fio: [Pin; FIO_LINES],
    /// Bank B.
    pub eio: [Pin; EIO_LINES],
    /// Bank C.
    pub cio: [Pin; CIO_LINES],
    /// Firmware version as `major.minor`.
    pub firmware_version: String,
    /// Bootloader version as `major.minor`.
    pub bootloader_version: String,
    /// Hardware version as `major.minor`.
    pub hardware_version: String,
    /// Serial number.
    pub serial_number: u32,
    /// Product id.
    pub product_id: u16,
    /// Local id.
    pub local_id: u8,
    /// Device name derived from the version info byte.
    pub device_name: String,
    /// Outcome of the last transaction.
    pub status: String,
}

impl DeviceState {
    /// Create a state with every pin at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins of one bank.
    pub fn pins(&self, bank: Bank) -> &[Pin] {
        match bank {
            Bank::Fio => &self.fio,
            Bank::Eio => &self.eio,
            Bank::Cio => &self.cio,
        }
    }

    /// Mutable pins of one bank.
    pub fn pins_mut(&mut self, bank: Bank) -> &mut [Pin] {
        match bank {
            Bank::Fio => &mut self.fio,
            Bank::Eio => &mut self.eio,
            Bank::Cio => &mut self.cio,
        }
    }

    /// Pack one bit per line of `bank`, restricted to `mask`.
    pub fn pack_bits(&self, bank: Bank, mask: u8, bit: impl Fn(&Pin) -> bool) -> u8 {
        self.pins(bank)
            .iter()
            .enumerate()
            .filter(|&(i, pin)| mask & (1 << i) != 0 && bit(pin))
            .fold(0u8, |acc, (i, _)| acc | (1 << i))
    }

    /// Apply one bit per line of `bank`, restricted to `mask`.
    pub fn unpack_bits(&mut self, bank: Bank, mask: u8, bits: u8, mut apply: impl FnMut(&mut Pin, bool)) {
        for (i, pin) in self.pins_mut(bank).iter_mut().enumerate() {
            if mask & (1 << i) != 0 {
                apply(pin, bits & (1 << i) != 0);
            }
        }
    }
}
