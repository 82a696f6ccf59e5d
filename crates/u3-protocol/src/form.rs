//! Form field intake.
//!
//! Settings pages post one field per line, named `<bank><kind><line>`
//! (`fioAD0`, `eioIO3`, `cioDO1`, ...). A value of `"2"` selects the second
//! option (Analog, Output, high); any other value selects the first. Lines
//! whose field is absent keep their current setting.

use std::collections::HashMap;

use crate::types::{Bank, DeviceState, DirectionMode, IoMode};

/// Form values keyed by field name.
pub type FormValues = HashMap<String, String>;

const SECOND_OPTION: &str = "2";

fn field(values: &FormValues, bank: Bank, kind: &str, line: usize) -> Option<bool> {
    values
        .get(&format!("{}{}{}", bank.prefix(), kind, line))
        .map(|v| v.trim() == SECOND_OPTION)
}

/// Apply `fioAD*` / `eioAD*` fields. CIO lines are always digital.
pub fn pull_analog_digital_settings(state: &mut DeviceState, values: &FormValues) {
    for pin in state.cio.iter_mut() {
        pin.direction_mode = DirectionMode::Digital;
    }
    for bank in [Bank::Fio, Bank::Eio] {
        for line in 0..bank.lines() {
            if let Some(analog) = field(values, bank, "AD", line) {
                state.pins_mut(bank)[line].direction_mode = if analog {
                    DirectionMode::Analog
                } else {
                    DirectionMode::Digital
                };
            }
        }
    }
}

/// Apply `fioIO*` / `eioIO*` / `cioIO*` fields.
pub fn pull_direction_settings(state: &mut DeviceState, values: &FormValues) {
    for bank in Bank::ALL {
        for line in 0..bank.lines() {
            if let Some(output) = field(values, bank, "IO", line) {
                state.pins_mut(bank)[line].io_mode = if output { IoMode::Output } else { IoMode::Input };
            }
        }
    }
}

/// Apply `fioDO*` / `eioDO*` / `cioDO*` fields to the output levels.
pub fn pull_digital_output_settings(state: &mut DeviceState, values: &FormValues) {
    for bank in Bank::ALL {
        for line in 0..bank.lines() {
            if let Some(high) = field(values, bank, "DO", line) {
                state.pins_mut(bank)[line].digital_write = u8::from(high);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormValues {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_analog_digital_fields() {
        let mut state = DeviceState::new();
        state.eio[1].direction_mode = DirectionMode::Analog;
        state.cio[0].direction_mode = DirectionMode::Analog;

        pull_analog_digital_settings(&mut state, &form(&[("fioAD0", "2"), ("fioAD4", "1"), ("eioAD7", "2")]));

        assert_eq!(state.fio[0].direction_mode, DirectionMode::Analog);
        assert_eq!(state.fio[4].direction_mode, DirectionMode::Digital);
        assert_eq!(state.eio[7].direction_mode, DirectionMode::Analog);
        // Absent field keeps its value.
        assert_eq!(state.eio[1].direction_mode, DirectionMode::Analog);
        assert_eq!(state.cio[0].direction_mode, DirectionMode::Digital);
    }

    #[test]
    fn test_direction_fields() {
        let mut state = DeviceState::new();
        pull_direction_settings(&mut state, &form(&[("fioIO5", "2"), ("cioIO3", "2"), ("eioIO0", "1")]));

        assert_eq!(state.fio[5].io_mode, IoMode::Output);
        assert_eq!(state.cio[3].io_mode, IoMode::Output);
        assert_eq!(state.eio[0].io_mode, IoMode::Input);
    }

    #[test]
    fn test_digital_output_fields() {
        let mut state = DeviceState::new();
        state.eio[2].digital_write = 1;
        pull_digital_output_settings(&mut state, &form(&[("fioDO6", "2"), ("eioDO2", "1"), ("cioDO9", "2")]));

        assert_eq!(state.fio[6].digital_write, 1);
        assert_eq!(state.eio[2].digital_write, 0);
    }
}
