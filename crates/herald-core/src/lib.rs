//! herald-core: shared types, hello wire format, and configuration.
//! All other Herald crates depend on this one.

pub mod address;
pub mod config;
pub mod error;
pub mod message;
pub mod settings;
pub mod wire;

pub use address::{Address, WILDCARD};
pub use error::TransportError;
pub use message::{Message, MessageBuilder};
pub use settings::Settings;
