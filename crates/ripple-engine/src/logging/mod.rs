//! Logging utilities.
//!
//! Centralizes logger initialization. Engine code logs through the `log`
//! facade only; the `env_logger` backend is installed by the binary.

mod init;

pub use init::{init_logging, LoggingConfig};
