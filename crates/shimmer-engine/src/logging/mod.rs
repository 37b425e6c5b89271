//! Logging utilities.
//!
//! This module centralizes logger initialization. Library code only talks to the
//! `log` facade; the backend is picked per target (`env_logger` natively, the
//! browser console on wasm).

mod init;

pub use init::{init_logging, LoggingConfig};
