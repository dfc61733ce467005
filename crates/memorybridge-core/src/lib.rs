pub mod config;
pub mod era;
pub mod error;
pub mod types;

pub use config::MemoryBridgeConfig;
pub use era::era_from_date;
pub use error::{MemoryBridgeError, Result};
pub use types::*;
