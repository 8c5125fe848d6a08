//! Shared data types

mod envelope;
mod status;

pub use envelope::*;
pub use status::*;
