use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::constants::MAX_READ_SIZE;
use crate::error::{LinkError, LinkResult};
use crate::interface::SerialDevice;

/// Device slot shared by the sender and the reception thread. Emptied on close.
pub(crate) type SharedDevice = Arc<Mutex<Option<Box<dyn SerialDevice>>>>;

/// Called with every complete line the device sends
pub type LineHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Splits a byte stream into LF-terminated lines
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return every line completed by them, trimmed.
    /// Whatever follows the last line feed stays pending.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let Some(last_break) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_break + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete[..last_break]
            .split(|b| *b == b'\n')
            .map(|line| String::from_utf8_lossy(line).trim().to_string())
            .collect()
    }

    /// Bytes of the unfinished trailing line
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

/// Background thread draining one open device
pub(crate) struct ReceptionTask {
    stop: Arc<AtomicBool>,
    finished: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

impl ReceptionTask {
    pub(crate) fn spawn(
        device: SharedDevice,
        on_line: LineHandler,
        idle_sleep: Duration,
    ) -> LinkResult<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        // Dropped when the thread exits, however it exits
        let (finished_tx, finished) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("serial-rx".to_string())
            .spawn(move || {
                let _finished = finished_tx;
                receive_lines(&device, &thread_stop, on_line.as_ref(), idle_sleep);
            })
            .map_err(|e| {
                LinkError::Transport(format!("Failed to start reception thread: {}", e))
            })?;

        Ok(ReceptionTask {
            stop,
            finished,
            handle,
        })
    }

    /// Ask the thread to stop and wait up to `timeout` for it. A thread that
    /// does not stop in time is left to finish on its own.
    pub(crate) fn stop(self, timeout: Duration) {
        self.stop.store(true, Ordering::SeqCst);

        match self.finished.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!("Reception thread did not stop within {:?}, detaching", timeout);
            }
            _ => {
                if self.handle.join().is_err() {
                    warn!("Reception thread panicked");
                }
            }
        }
    }
}

fn receive_lines(
    device: &SharedDevice,
    stop: &AtomicBool,
    on_line: &(dyn Fn(String) + Send + Sync),
    idle_sleep: Duration,
) {
    let mut framer = LineFramer::new();

    while !stop.load(Ordering::SeqCst) {
        match read_available(device) {
            Ok(Some(bytes)) => {
                for line in framer.push(&bytes) {
                    on_line(line);
                }
            }
            Ok(None) => thread::sleep(idle_sleep),
            Err(e) => {
                warn!("Reception stopped: {}", e);
                break;
            }
        }
    }

    debug!("Reception thread terminated.");
}

/// Read whatever is waiting. The device lock is held only for the read.
fn read_available(device: &SharedDevice) -> LinkResult<Option<Vec<u8>>> {
    let mut slot = device.lock().map_err(|_| {
        LinkError::Transport("Failed to lock device (reception thread)".to_string())
    })?;
    let device = slot.as_mut().ok_or(LinkError::NotOpen)?;

    let waiting = device.bytes_available()?;
    if waiting == 0 {
        return Ok(None);
    }

    let bytes = device.receive(waiting.min(MAX_READ_SIZE))?;
    Ok((!bytes.is_empty()).then_some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines_are_split_and_tail_retained() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"OK\nREADY\nPART");
        assert_eq!(lines, vec!["OK", "READY"]);
        assert_eq!(framer.pending(), b"PART");
    }

    #[test]
    fn fragment_completes_on_later_push() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"TEMP=2").is_empty());
        assert!(framer.push(b"31").is_empty());
        assert_eq!(framer.push(b"\r\nV"), vec!["TEMP=231"]);
        assert_eq!(framer.pending(), b"V");
    }

    #[test]
    fn lines_are_trimmed_and_blank_lines_kept() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"  heat on \r\n\r\n");
        assert_eq!(lines, vec!["heat on".to_string(), String::new()]);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut framer = LineFramer::new();
        let lines = framer.push(&[0x66, 0xff, 0x0a]);
        assert_eq!(lines, vec!["f\u{fffd}"]);
    }
}
