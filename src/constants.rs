pub(crate) const DEFAULT_BAUD_RATE: u32 = 115200;

pub(crate) const SERIAL_TIMEOUT_MS: u64 = 100;
pub(crate) const RECEIVE_IDLE_SLEEP_MS: u64 = 30;
pub(crate) const MAX_READ_SIZE: usize = 1024;

pub(crate) const RECEIVER_JOIN_TIMEOUT_MS: u64 = 1000;
pub(crate) const RECONNECT_COOLDOWN_MS: u64 = 1000;

pub(crate) const FAST_MODEL_SETTLE_MS: u64 = 300;
pub(crate) const SLOW_MODEL_SETTLE_MS: u64 = 600;
