pub mod serialport;

use tracing::info;

use crate::constants::DEFAULT_BAUD_RATE;
use crate::error::{LinkError, LinkResult};

pub type ComPort = String;
pub type BaudRate = u32;

/// Byte-level access to one open serial device
pub trait SerialDevice: Send {
    /// Write the whole payload to the device
    fn send(&mut self, payload: &[u8]) -> LinkResult<()>;

    /// Push buffered output onto the wire
    fn flush(&mut self) -> LinkResult<()>;

    /// Number of received bytes waiting to be read
    fn bytes_available(&mut self) -> LinkResult<usize>;

    /// Read up to `max` bytes
    fn receive(&mut self, max: usize) -> LinkResult<Vec<u8>>;

    /// Drop stale input and output
    fn clear_buffers(&mut self) -> LinkResult<()>;
}

/// Opens serial devices by port name. The link keeps one of these around so
/// it can reopen the same port after a write fault.
pub trait DeviceOpener: Send {
    fn open(&self, port: &str, baud: BaudRate) -> LinkResult<Box<dyn SerialDevice>>;
}

/// Port settings as given by the user; missing values get filled in by
/// [`ComPortParams::resolve`].
#[derive(Debug, Clone, Default)]
pub struct ComPortParams {
    pub port: Option<ComPort>,
    pub baud: Option<BaudRate>,
}

impl ComPortParams {
    /// Fill in defaults. Without an explicit port the first port the system
    /// reports is used.
    pub fn resolve(self) -> LinkResult<(ComPort, BaudRate)> {
        let baud = self.baud.unwrap_or(DEFAULT_BAUD_RATE);
        let port = match self.port {
            Some(port) => port,
            None => {
                let port = self::serialport::available_ports()?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        LinkError::Configuration(
                            "No serial ports found. Try specifying a serial port?".to_string(),
                        )
                    })?;
                info!("No port given, using {}", port);
                port
            }
        };

        Ok((port, baud))
    }
}
