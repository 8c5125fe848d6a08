//! CA bundle loading for directory TLS

use rustls::RootCertStore;
use std::path::Path;
use tracing::{debug, warn};
use usercheck_core::pem;

/// DER certificates trusted when talking to the directory
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    certificates: Vec<Vec<u8>>,
}

impl TrustStore {
    /// Read every PEM certificate in `path`.
    ///
    /// An unreadable or malformed bundle yields an empty store rather than
    /// an error; the connection attempt decides whether that is fatal.
    pub fn load(path: &Path) -> Self {
        match pem::load_certs(path) {
            Ok(certs) => {
                debug!("Loaded {} CA certificate(s) from {:?}", certs.len(), path);
                Self {
                    certificates: certs.iter().map(|der| der.as_ref().to_vec()).collect(),
                }
            }
            Err(e) => {
                warn!("CA bundle unusable, trusting no certificates: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Root store for the TLS client. Certificates rustls cannot parse are
    /// skipped.
    pub fn root_store(&self) -> RootCertStore {
        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(&self.certificates);
        if ignored > 0 {
            warn!("Ignored {} unparsable CA certificate(s), kept {}", ignored, added);
        }
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Not a real certificate; the PEM layer does not look inside.
    const FAKE_PEM: &str = "-----BEGIN CERTIFICATE-----\nAAECAwQFBgcICQ==\n-----END CERTIFICATE-----\n";

    #[test]
    fn test_missing_bundle_is_empty() {
        let store = TrustStore::load(Path::new("/nonexistent/cert.crt"));
        assert!(store.is_empty());
        assert_eq!(store.root_store().roots.len(), 0);
    }

    #[test]
    fn test_bundle_without_certificates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "just some text").unwrap();

        let store = TrustStore::load(file.path());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reads_every_pem_block() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}{}", FAKE_PEM, FAKE_PEM).unwrap();

        let store = TrustStore::load(file.path());
        assert_eq!(store.certificates.len(), 2);
        // garbage DER is dropped when building the root store
        assert_eq!(store.root_store().roots.len(), 0);
    }
}
