//! # lovm Common
//!
//! Shared utilities for the lovm components.
//!
//! ## Logging
//!
//! Diagnostics go to stderr so they never mix with command output such as
//! an IP address printed for scripts:
//!
//! ```rust,ignore
//! use lovm_common::{init_logging, LogFormat};
//!
//! init_logging("warn", LogFormat::Pretty).unwrap();
//! tracing::info!("hidden unless RUST_LOG or --log-level allow it");
//! ```

pub mod logging;

pub use logging::{init_logging, LogFormat};
