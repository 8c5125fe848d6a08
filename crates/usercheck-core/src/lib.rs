//! Usercheck Core Library
//!
//! Configuration, error taxonomy, and response envelopes shared by the
//! directory provider and the HTTP surface.

pub mod config;
pub mod error;
pub mod pem;
pub mod types;
pub mod utils;

pub use config::UserCheckConfig;
pub use error::{Error, Result};

/// Usercheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Route prefix shared by every endpoint
pub const API_PREFIX: &str = "/api/v1";

/// Response header echoing the correlation id
pub const CORRELATION_HEADER: &str = "x-correlation-id";
