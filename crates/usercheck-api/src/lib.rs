//! HTTP API for Usercheck

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod tls;

pub use server::{create_router, AppState, DirectoryHandle, UserCheckServer};
pub use tls::TlsAcceptor;
