//! Device factory
//!
//! Resolves a device identifier into a concrete [`Device`]: the synthetic
//! device for the reserved name, a serial line transport for anything else.

use crate::synthetic::SyntheticDevice;
use crate::transport::{LineSource, LineTransport};
use radarlink_core::{
    is_synthetic, DeviceDescriptor, DeviceKind, RadarLinkError, Result, SerialSettings,
    DEFAULT_BAUD_RATE,
};
use tokio_serial::{SerialPortInfo, SerialPortType};
use tracing::{debug, error, info};

/// A device handed out by the factory
pub enum Device {
    Serial(LineTransport),
    Synthetic(SyntheticDevice),
}

impl Device {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Device::Synthetic(_))
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Serial(t) => f.debug_tuple("Serial").field(&t.identifier()).finish(),
            Device::Synthetic(s) => f.debug_tuple("Synthetic").field(s).finish(),
        }
    }
}

impl LineSource for Device {
    fn is_readable(&self) -> bool {
        match self {
            Device::Serial(t) => t.is_readable(),
            Device::Synthetic(s) => s.is_readable(),
        }
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        match self {
            Device::Serial(t) => t.read_line(),
            Device::Synthetic(s) => s.read_line(),
        }
    }

    fn identifier(&self) -> &str {
        match self {
            Device::Serial(t) => t.identifier(),
            Device::Synthetic(s) => s.identifier(),
        }
    }

    /// Release the device. A no-op for the synthetic device.
    fn close(&mut self) {
        if let Device::Serial(transport) = self {
            transport.close();
        }
    }
}

/// List devices known to the host, optionally with the synthetic device first
pub fn enumerate_devices(include_synthetic: bool) -> Result<Vec<DeviceDescriptor>> {
    let ports = tokio_serial::available_ports().map_err(|e| {
        error!("Failed to enumerate serial ports: {}", e);
        RadarLinkError::Enumeration(e.to_string())
    })?;

    debug!("Found {} serial port(s)", ports.len());

    Ok(device_list(
        ports.into_iter().map(descriptor_from_port),
        include_synthetic,
    ))
}

fn device_list<I>(ports: I, include_synthetic: bool) -> Vec<DeviceDescriptor>
where
    I: IntoIterator<Item = DeviceDescriptor>,
{
    let mut devices = Vec::new();
    if include_synthetic {
        devices.push(DeviceDescriptor::synthetic());
    }
    devices.extend(ports);
    devices
}

fn descriptor_from_port(port: SerialPortInfo) -> DeviceDescriptor {
    let kind = match port.port_type {
        SerialPortType::UsbPort(info) => DeviceKind::Usb {
            vid: info.vid,
            pid: info.pid,
            manufacturer: info.manufacturer,
            product: info.product,
            serial_number: info.serial_number,
        },
        SerialPortType::PciPort => DeviceKind::Pci,
        SerialPortType::BluetoothPort => DeviceKind::Bluetooth,
        SerialPortType::Unknown => DeviceKind::Unknown,
    };

    DeviceDescriptor {
        name: port.port_name,
        kind,
    }
}

/// Open a device at the given baud rate
///
/// The synthetic name never touches the OS. Anything else is opened as a
/// serial port with 8N1 framing, no flow control and zero-timeout reads.
pub fn open(identifier: &str, baud_rate: u32) -> Result<Device> {
    open_with(identifier, SerialSettings::with_baud_rate(baud_rate))
}

/// Open a device at the default 9600 baud
pub fn open_default(identifier: &str) -> Result<Device> {
    open(identifier, DEFAULT_BAUD_RATE)
}

/// Open a device with explicit settings
pub fn open_with(identifier: &str, settings: SerialSettings) -> Result<Device> {
    if is_synthetic(identifier) {
        info!("Synthetic device connected");
        return Ok(Device::Synthetic(SyntheticDevice::new()));
    }

    debug!("Opening serial port {} at {}", identifier, settings);

    let port = tokio_serial::new(identifier, settings.baud_rate)
        .timeout(settings.read_timeout)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open()
        .map_err(|e| {
            error!("Failed to open serial port {}: {}", identifier, e);
            RadarLinkError::DeviceOpen {
                device: identifier.to_string(),
                reason: e.to_string(),
            }
        })?;

    info!("Serial port {} connected ({})", identifier, settings);
    Ok(Device::Serial(LineTransport::new(identifier, port)))
}
