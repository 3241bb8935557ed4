//! Output formatting for the device listing

use colored::*;
use radarlink_core::{DeviceDescriptor, DeviceKind};
use tabled::{settings::Style, Table, Tabled};

/// Format devices as a table
pub fn format_devices(devices: &[DeviceDescriptor]) -> String {
    #[derive(Tabled)]
    struct DeviceRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Device")]
        name: String,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Manufacturer")]
        manufacturer: String,
    }

    if devices.is_empty() {
        return "No serial devices found".yellow().to_string();
    }

    let rows = devices.iter().enumerate().map(|(index, device)| {
        let manufacturer = match &device.kind {
            DeviceKind::Usb {
                manufacturer: Some(m),
                ..
            } => m.clone(),
            _ => "-".to_string(),
        };

        DeviceRow {
            index,
            name: device.name.clone(),
            kind: device.kind.to_string(),
            manufacturer,
        }
    });

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("{}\n{}", "Devices:".bold(), table)
}
