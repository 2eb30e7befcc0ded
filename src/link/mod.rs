mod reception;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub use reception::{LineFramer, LineHandler};
use reception::{ReceptionTask, SharedDevice};

use crate::constants::{RECEIVE_IDLE_SLEEP_MS, RECEIVER_JOIN_TIMEOUT_MS, RECONNECT_COOLDOWN_MS};
use crate::error::{LinkError, LinkResult};
use crate::interface::{BaudRate, ComPort, DeviceOpener};
use crate::models::DeviceModel;

/// Timing knobs for a [`SerialLink`]
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Sleep between polls when no bytes are waiting
    pub receive_idle_sleep: Duration,

    /// How long close waits for the reception thread
    pub join_timeout: Duration,

    /// Pause between closing and reopening after a write fault
    pub reconnect_cooldown: Duration,

    /// Replaces the per-model settle delay when set
    pub settle_override: Option<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            receive_idle_sleep: Duration::from_millis(RECEIVE_IDLE_SLEEP_MS),
            join_timeout: Duration::from_millis(RECEIVER_JOIN_TIMEOUT_MS),
            reconnect_cooldown: Duration::from_millis(RECONNECT_COOLDOWN_MS),
            settle_override: None,
        }
    }
}

struct Connection {
    port: ComPort,
    baud: BaudRate,
    device: SharedDevice,
    reception: ReceptionTask,
}

/// One serial connection to a test device.
///
/// Owns at most one open port and the thread that reads from it. Writes and
/// reads share a single lock on the port; the settle delay after a write is
/// spent outside that lock so reception keeps draining.
pub struct SerialLink {
    opener: Box<dyn DeviceOpener>,
    on_line: LineHandler,
    config: LinkConfig,
    connection: Option<Connection>,
}

impl SerialLink {
    pub fn new<O, F>(opener: O, on_line: F) -> Self
    where
        O: DeviceOpener + 'static,
        F: Fn(String) + Send + Sync + 'static,
    {
        SerialLink {
            opener: Box::new(opener),
            on_line: Arc::new(on_line),
            config: LinkConfig::default(),
            connection: None,
        }
    }

    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Port of the open connection
    pub fn port(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.port.as_str())
    }

    pub fn baud_rate(&self) -> Option<BaudRate> {
        self.connection.as_ref().map(|c| c.baud)
    }

    /// Open `port` and start receiving. Fails if a port is already open.
    pub fn open(&mut self, port: &str, baud: BaudRate) -> LinkResult<()> {
        if self.is_open() {
            return Err(LinkError::AlreadyOpen);
        }

        let mut device = self.opener.open(port, baud)?;
        device.clear_buffers()?;

        let device: SharedDevice = Arc::new(Mutex::new(Some(device)));
        let reception = ReceptionTask::spawn(
            Arc::clone(&device),
            Arc::clone(&self.on_line),
            self.config.receive_idle_sleep,
        )?;

        self.connection = Some(Connection {
            port: port.to_owned(),
            baud,
            device,
            reception,
        });

        info!("Connected to {} at {} baud", port, baud);
        Ok(())
    }

    /// Stop receiving and release the port. Does nothing when closed.
    pub fn close(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        connection.reception.stop(self.config.join_timeout);

        // Dropping the device closes the port
        let device = match connection.device.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(device);

        info!("Disconnected from {}", connection.port);
    }

    /// Send `text` formatted for `model`, then wait out the model's settle
    /// delay.
    ///
    /// A write fault closes the port and reopens it once. The command is not
    /// resent: the write fault is returned if the reopen worked, and
    /// [`LinkError::ReconnectFailed`] if it did not.
    pub fn send(&mut self, text: &str, model: DeviceModel) -> LinkResult<()> {
        let connection = self.connection.as_ref().ok_or(LinkError::NotOpen)?;
        let payload = model.encode(text);

        if let Err(fault) = write_payload(&connection.device, &payload) {
            return Err(self.recover(fault));
        }
        debug!("Sent {:?} ({})", text, model);

        let settle = self
            .config
            .settle_override
            .unwrap_or_else(|| model.settle_delay());
        thread::sleep(settle);

        Ok(())
    }

    fn recover(&mut self, fault: LinkError) -> LinkError {
        let Some((port, baud)) = self.connection.as_ref().map(|c| (c.port.clone(), c.baud)) else {
            return fault;
        };

        warn!("Write to {} failed ({}), reopening port", port, fault);
        self.close();
        thread::sleep(self.config.reconnect_cooldown);

        match self.open(&port, baud) {
            Ok(()) => {
                info!("Reopened {}, command was not resent", port);
                fault
            }
            Err(e) => {
                error!("Could not reopen {}: {}", port, e);
                LinkError::ReconnectFailed {
                    port,
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_payload(device: &SharedDevice, payload: &[u8]) -> LinkResult<()> {
    let mut slot = device
        .lock()
        .map_err(|_| LinkError::Transport("Failed to lock device (sender)".to_string()))?;
    let device = slot.as_mut().ok_or(LinkError::NotOpen)?;

    device.send(payload)?;
    device.flush()
}
