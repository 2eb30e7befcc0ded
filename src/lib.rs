pub use error::{LinkError, LinkResult};
pub use link::{LinkConfig, SerialLink};
pub use models::{CommandKey, DeviceModel, resolve};

pub(crate) mod constants;
pub mod error;
pub mod game;
pub mod interface;
pub mod link;
pub mod models;
