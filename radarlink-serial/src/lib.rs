//! radarlink-serial
//!
//! Serial side of the relay: the line transport over a serial port, the
//! synthetic stand-in device, the factory choosing between them, and the
//! polling record reader.
//!
//! Public API:
//! - `factory::open` / `factory::enumerate_devices`: resolve and list devices
//! - `transport::LineSource`: capability set shared by every device
//! - `reader::RecordReader`: turns lines into sensor records

pub mod factory;
pub mod reader;
pub mod synthetic;
pub mod transport;

pub use factory::{enumerate_devices, open, open_default, open_with, Device};
pub use reader::{RecordReader, DEFAULT_POLL_INTERVAL};
pub use synthetic::{random_line, random_reading, LineGenerator, SyntheticDevice};
pub use transport::{ByteStream, LineSource, LineTransport, MAX_LINE_LEN};
