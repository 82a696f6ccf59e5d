//! Plain-text rendering of the device state.

use std::fmt::Write;

use u3_protocol::{Bank, DeviceState, DirectionMode, IoMode};

/// Render identity, status and one row per line.
pub fn render_text(state: &DeviceState) -> String {
    let mut out = String::new();
    let dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    let _ = writeln!(out, "device:     {}", dash(&state.device_name));
    let _ = writeln!(out, "serial:     {}", state.serial_number);
    let _ = writeln!(
        out,
        "versions:   firmware {} bootloader {} hardware {}",
        dash(&state.firmware_version),
        dash(&state.bootloader_version),
        dash(&state.hardware_version)
    );
    let _ = writeln!(out, "status:     {}", dash(&state.status));
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<6} {:<8} {:<7} {:>6} {:>9} {:>4} {:>5}", "line", "mode", "dir", "raw", "volts", "in", "out");

    for bank in Bank::ALL {
        for (i, pin) in state.pins(bank).iter().enumerate() {
            let line = format!("{}{}", bank, i);
            match pin.direction_mode {
                DirectionMode::Analog => {
                    let _ = writeln!(
                        out,
                        "{:<6} {:<8} {:<7} {:>6} {:>9.4} {:>4} {:>5}",
                        line, pin.direction_mode.to_string(), "-", pin.analog_raw, pin.analog_voltage, "-", "-"
                    );
                }
                DirectionMode::Digital => {
                    let out_level = match pin.io_mode {
                        IoMode::Output => pin.digital_write.to_string(),
                        IoMode::Input => "-".to_string(),
                    };
                    let _ = writeln!(
                        out,
                        "{:<6} {:<8} {:<7} {:>6} {:>9} {:>4} {:>5}",
                        line, pin.direction_mode.to_string(), pin.io_mode.to_string(), "-", "-", pin.digital_read, out_level
                    );
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_every_line() {
        let mut state = DeviceState::new();
        state.device_name = "U3-HV".into();
        state.fio[0].direction_mode = DirectionMode::Analog;
        state.fio[0].analog_voltage = 1.25;
        state.cio[3].io_mode = IoMode::Output;
        state.cio[3].digital_write = 1;

        let text = render_text(&state);
        assert!(text.contains("device:     U3-HV"));
        assert!(text.contains("status:     -"));
        assert_eq!(text.lines().filter(|l| l.starts_with("FIO") || l.starts_with("EIO") || l.starts_with("CIO")).count(), 20);

        let fio0 = text.lines().find(|l| l.starts_with("FIO0")).unwrap();
        assert!(fio0.contains("Analog") && fio0.contains("1.2500"));
        let cio3 = text.lines().find(|l| l.starts_with("CIO3")).unwrap();
        assert!(cio3.contains("Output") && cio3.trim_end().ends_with('1'));
    }
}
