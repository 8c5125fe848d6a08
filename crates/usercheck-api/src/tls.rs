//! HTTPS listener support
//!
//! The certificate chain and private key are read from PEM files named by
//! `API_CERT_CRT_FILE` / `API_CERT_KEY_FILE`. HTTP/2 and HTTP/1.1 are
//! offered through ALPN.

use std::sync::Arc;
use tokio_rustls::rustls;
use tracing::info;
use usercheck_core::config::TlsConfig;
use usercheck_core::{pem, Error, Result};

/// TLS Acceptor wrapper for async TLS connections
pub struct TlsAcceptor {
    acceptor: tokio_rustls::TlsAcceptor,
}

impl TlsAcceptor {
    /// Create a new TLS acceptor from configuration
    pub fn from_config(config: &TlsConfig) -> Result<Self> {
        config.validate()?;

        let certs = pem::load_certs(&config.cert_file)?;
        info!("Loaded {} certificate(s)", certs.len());

        let key = pem::load_private_key(&config.key_file)?;
        info!("Loaded private key");

        let mut server_config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| Error::Configuration(format!("TLS config error: {}", e)))?;

        server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

        Ok(Self {
            acceptor: tokio_rustls::TlsAcceptor::from(Arc::new(server_config)),
        })
    }

    /// Get the inner TLS acceptor
    pub fn inner(&self) -> &tokio_rustls::TlsAcceptor {
        &self.acceptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_missing_files_rejected() {
        let config = TlsConfig {
            enabled: true,
            cert_file: PathBuf::from("/nonexistent/server.crt"),
            key_file: PathBuf::from("/nonexistent/private.key"),
        };
        let result = TlsAcceptor::from_config(&config);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_cert_file_without_certificates() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        writeln!(cert, "not a certificate").unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();

        let config = TlsConfig {
            enabled: true,
            cert_file: cert.path().to_path_buf(),
            key_file: key.path().to_path_buf(),
        };
        let result = TlsAcceptor::from_config(&config);
        assert!(matches!(result, Err(Error::Configuration(ref m)) if m.contains("No certificates")));
    }
}
