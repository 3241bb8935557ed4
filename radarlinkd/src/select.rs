//! Interactive device selection

use anyhow::{bail, Context, Result};
use radarlink_core::DeviceDescriptor;
use std::io::{BufRead, Write};
use tracing::info;

/// Ask the user to pick one of `devices` by index.
///
/// Invalid answers re-prompt; end of input is an error.
pub fn prompt_for_device<R, W>(
    devices: &[DeviceDescriptor],
    input: &mut R,
    output: &mut W,
) -> Result<DeviceDescriptor>
where
    R: BufRead,
    W: Write,
{
    if devices.is_empty() {
        bail!("No devices available");
    }

    writeln!(
        output,
        "Select a port from the list below (usually the USB one):"
    )?;
    for (index, device) in devices.iter().enumerate() {
        writeln!(output, "[{}] {} ({})", index, device.name, device.kind)?;
    }

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut answer = String::new();
        let read = input
            .read_line(&mut answer)
            .context("Failed to read selection")?;
        if read == 0 {
            bail!("No device selected");
        }

        match answer.trim().parse::<usize>() {
            Ok(index) if index < devices.len() => {
                let device = devices[index].clone();
                info!("Selected port: {}", device.name);
                return Ok(device);
            }
            _ => {
                writeln!(
                    output,
                    "Invalid selection {:?}, enter a number from 0 to {}",
                    answer.trim(),
                    devices.len() - 1
                )?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radarlink_core::DeviceKind;
    use std::io::Cursor;

    fn devices() -> Vec<DeviceDescriptor> {
        vec![
            DeviceDescriptor::synthetic(),
            DeviceDescriptor {
                name: "/dev/ttyUSB0".to_string(),
                kind: DeviceKind::Unknown,
            },
        ]
    }

    #[test]
    fn test_select_by_index() {
        let mut input = Cursor::new(b"1\n".to_vec());
        let mut output = Vec::new();

        let device = prompt_for_device(&devices(), &mut input, &mut output).unwrap();
        assert_eq!(device.name, "/dev/ttyUSB0");

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("[0] test (synthetic)"));
        assert!(printed.contains("[1] /dev/ttyUSB0 (unknown)"));
    }

    #[test]
    fn test_reprompts_on_invalid_answer() {
        let mut input = Cursor::new(b"abc\n7\n0\n".to_vec());
        let mut output = Vec::new();

        let device = prompt_for_device(&devices(), &mut input, &mut output).unwrap();
        assert!(device.is_synthetic());

        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("Invalid selection").count(), 2);
    }

    #[test]
    fn test_end_of_input() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();

        assert!(prompt_for_device(&devices(), &mut input, &mut output).is_err());
    }

    #[test]
    fn test_no_devices() {
        let mut input = Cursor::new(b"0\n".to_vec());
        let mut output = Vec::new();

        assert!(prompt_for_device(&[], &mut input, &mut output).is_err());
    }
}
