#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sqatool::LinkConfig;
use sqatool::error::{LinkError, LinkResult};
use sqatool::interface::{BaudRate, DeviceOpener, SerialDevice};

#[derive(Default)]
pub struct DeviceState {
    pub incoming: VecDeque<u8>,
    pub written: Vec<u8>,
    pub failing_writes: usize,
    pub failing_reads: bool,
    pub clears: usize,
}

/// In-memory serial device. Clones share the same state, so a test keeps one
/// handle while the link owns another.
#[derive(Clone, Default)]
pub struct FakeDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes the device "sends" to the host
    pub fn feed(&self, bytes: &[u8]) {
        self.state.lock().unwrap().incoming.extend(bytes);
    }

    pub fn written(&self) -> Vec<u8> {
        self.state.lock().unwrap().written.clone()
    }

    pub fn fail_next_writes(&self, count: usize) {
        self.state.lock().unwrap().failing_writes = count;
    }

    pub fn fail_reads(&self) {
        self.state.lock().unwrap().failing_reads = true;
    }

    pub fn clears(&self) -> usize {
        self.state.lock().unwrap().clears
    }
}

impl SerialDevice for FakeDevice {
    fn send(&mut self, payload: &[u8]) -> LinkResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(LinkError::Transport("simulated write fault".to_string()));
        }
        state.written.extend_from_slice(payload);
        Ok(())
    }

    fn flush(&mut self) -> LinkResult<()> {
        Ok(())
    }

    fn bytes_available(&mut self) -> LinkResult<usize> {
        let state = self.state.lock().unwrap();
        if state.failing_reads {
            return Err(LinkError::Transport("simulated read fault".to_string()));
        }
        Ok(state.incoming.len())
    }

    fn receive(&mut self, max: usize) -> LinkResult<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        let count = max.min(state.incoming.len());
        Ok(state.incoming.drain(..count).collect())
    }

    fn clear_buffers(&mut self) -> LinkResult<()> {
        let mut state = self.state.lock().unwrap();
        state.incoming.clear();
        state.clears += 1;
        Ok(())
    }
}

/// Hands out clones of one fake device and records every open
#[derive(Clone, Default)]
pub struct FakeOpener {
    pub device: FakeDevice,
    opens: Arc<Mutex<Vec<(String, BaudRate)>>>,
    refuse: Arc<Mutex<bool>>,
}

impl FakeOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opens(&self) -> Vec<(String, BaudRate)> {
        self.opens.lock().unwrap().clone()
    }

    pub fn refuse_opens(&self) {
        *self.refuse.lock().unwrap() = true;
    }
}

impl DeviceOpener for FakeOpener {
    fn open(&self, port: &str, baud: BaudRate) -> LinkResult<Box<dyn SerialDevice>> {
        if *self.refuse.lock().unwrap() {
            return Err(LinkError::Transport(format!("{} not found", port)));
        }
        self.opens.lock().unwrap().push((port.to_string(), baud));
        Ok(Box::new(self.device.clone()))
    }
}

/// Fast timings so tests do not sit through real settle delays
pub fn quick_config() -> LinkConfig {
    LinkConfig {
        receive_idle_sleep: Duration::from_millis(2),
        join_timeout: Duration::from_millis(500),
        reconnect_cooldown: Duration::from_millis(10),
        settle_override: Some(Duration::ZERO),
    }
}
