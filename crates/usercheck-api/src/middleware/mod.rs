//! Request middleware

mod correlation;

pub use correlation::{correlation_id, CorrelationId};
