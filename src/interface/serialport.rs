use tracing::{debug, trace};

use super::{BaudRate, ComPort, DeviceOpener, SerialDevice};
use crate::constants::SERIAL_TIMEOUT_MS;

use crate::error::{LinkError, LinkResult};
use std::io::{Read, Write};

/// Serial port device backed by the `serialport` crate
pub struct SerialPortDevice {
    serial_port: Box<dyn serialport::SerialPort>,
}

impl SerialPortDevice {
    pub fn new(port: &str, baud: BaudRate) -> LinkResult<SerialPortDevice> {
        let serial_port = serialport::new(port, baud)
            .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
            .open()
            .map_err(|e| LinkError::Transport(format!("Failed to open {}: {}", port, e)))?;

        debug!("Opened {} at {} baud", port, baud);
        Ok(SerialPortDevice { serial_port })
    }
}

impl SerialDevice for SerialPortDevice {
    fn send(&mut self, payload: &[u8]) -> LinkResult<()> {
        self.serial_port
            .write_all(payload)
            .map_err(|e| LinkError::Transport(format!("Write failed: {:?}", e)))?;
        trace!("Wrote bytes {:?}", payload);
        Ok(())
    }

    fn flush(&mut self) -> LinkResult<()> {
        self.serial_port
            .flush()
            .map_err(|e| LinkError::Transport(format!("Flush failed: {:?}", e)))
    }

    fn bytes_available(&mut self) -> LinkResult<usize> {
        let waiting = self
            .serial_port
            .bytes_to_read()
            .map_err(|e| LinkError::Transport(format!("{:?}", e)))?;
        Ok(waiting as usize)
    }

    fn receive(&mut self, max: usize) -> LinkResult<Vec<u8>> {
        let mut buffer = vec![0; max];

        let size = self
            .serial_port
            .read(&mut buffer)
            // Timeout error is fine, just continue
            .or_else(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    Ok(0)
                } else {
                    Err(e)
                }
            })
            .map_err(|e| LinkError::Transport(format!("Read failed: {:?}", e)))?;

        buffer.truncate(size);
        trace!("Received bytes {:?}", buffer);
        Ok(buffer)
    }

    fn clear_buffers(&mut self) -> LinkResult<()> {
        self.serial_port
            .clear(serialport::ClearBuffer::All)
            .map_err(|e| {
                LinkError::Transport(format!("Failed to clear send/receive buffers, {}", e))
            })
    }
}

/// Opens real serial ports
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPortOpener;

impl DeviceOpener for SerialPortOpener {
    fn open(&self, port: &str, baud: BaudRate) -> LinkResult<Box<dyn SerialDevice>> {
        Ok(Box::new(SerialPortDevice::new(port, baud)?))
    }
}

/// Names of the serial ports currently present on the system
pub fn available_ports() -> LinkResult<Vec<ComPort>> {
    let ports = serialport::available_ports().map_err(|e| {
        LinkError::Configuration(format!("Could not get available ports. Err {:?}", e))
    })?;

    Ok(ports.into_iter().map(|port| port.port_name).collect())
}
