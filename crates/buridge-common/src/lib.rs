//! Buridge Common Library
//!
//! Shared utilities for the buridge loader workspace:
//!
//! - **Logging**: tracing initialization for CLI and Lambda entry points
//! - **Checksums**: MD5 verification of downloaded catalog files

pub mod checksum;
pub mod logging;

pub use checksum::{compute_file_md5, verify_file_md5, ChecksumError};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
