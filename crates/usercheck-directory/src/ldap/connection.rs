//! Directory connections
//!
//! [`DirectoryConnector`] opens sessions and [`DirectorySession`] runs the
//! three protocol operations the provider needs. The real implementation is
//! backed by `ldap3` over rustls; tests swap in mocks.

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, SearchEntry};
use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, PrivateKey, ServerName};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::timeout;
use tracing::{debug, warn};
use usercheck_core::config::DirectoryConfig;
use usercheck_core::{pem, Error, Result};

use super::trust::TrustStore;
use super::types::{DirectoryEntry, SearchCriteria};

/// An open connection to the directory, owned by one operation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySession: Send {
    async fn simple_bind(&mut self, user: &str, password: &str) -> Result<()>;
    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<DirectoryEntry>>;
    async fn unbind(&mut self) -> Result<()>;
}

/// Opens a fresh session per call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DirectorySession>>;
}

// ============================================================================
// ldap3 connector
// ============================================================================

/// Connector backed by `ldap3`
pub struct LdapConnector {
    server_url: String,
    tls: Arc<ClientConfig>,
    start_tls: bool,
    connect_timeout: Duration,
    operation_timeout: Duration,
}

impl LdapConnector {
    /// Build the TLS client configuration once; every dial reuses it.
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let trust = TrustStore::load(&config.ca_cert_file);
        let tls = build_tls_config(config, &trust)?;

        Ok(Self {
            server_url: config.server_url.clone(),
            tls: Arc::new(tls),
            start_tls: config.tls.start_tls,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            operation_timeout: Duration::from_secs(config.operation_timeout_secs),
        })
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    async fn connect(&self) -> Result<Box<dyn DirectorySession>> {
        debug!("Connecting to directory server: {}", self.server_url);

        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.connect_timeout)
            .set_starttls(self.start_tls)
            .set_config(self.tls.clone());

        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.server_url)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        ldap3::drive!(conn);

        Ok(Box::new(LdapSession {
            inner: ldap,
            operation_timeout: self.operation_timeout,
        }))
    }
}

struct LdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn simple_bind(&mut self, user: &str, password: &str) -> Result<()> {
        timeout(self.operation_timeout, self.inner.simple_bind(user, password))
            .await
            .map_err(|_| Error::Bind("bind timed out".to_string()))?
            .and_then(|result| result.success())
            .map_err(|e| Error::Bind(e.to_string()))?;
        Ok(())
    }

    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<DirectoryEntry>> {
        let result = timeout(
            self.operation_timeout,
            self.inner.search(
                &criteria.base_dn,
                criteria.scope,
                &criteria.filter,
                criteria.attributes.clone(),
            ),
        )
        .await
        .map_err(|_| Error::Search("search timed out".to_string()))?
        .map_err(|e| Error::Search(e.to_string()))?;

        let (entries, _) = result.success().map_err(|e| Error::Search(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(DirectoryEntry::from)
            .collect())
    }

    async fn unbind(&mut self) -> Result<()> {
        timeout(self.operation_timeout, self.inner.unbind())
            .await
            .map_err(|_| Error::Internal("unbind timed out".to_string()))?
            .map_err(|e| Error::Internal(e.to_string()))
    }
}

// ============================================================================
// TLS
// ============================================================================

fn build_tls_config(config: &DirectoryConfig, trust: &TrustStore) -> Result<ClientConfig> {
    let builder = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(trust.root_store());

    let mut tls = match (&config.tls.client_cert_file, &config.tls.client_key_file) {
        (Some(cert), Some(key)) => {
            let chain = load_client_certs(cert)?;
            let key = load_client_key(key)?;
            debug!("Presenting client certificate from {:?}", cert);
            builder
                .with_client_auth_cert(chain, key)
                .map_err(|e| Error::Configuration(format!("Invalid client identity: {}", e)))?
        }
        _ => builder.with_no_client_auth(),
    };

    if !config.tls.verify_server_cert {
        tls.dangerous()
            .set_certificate_verifier(Arc::new(AcceptAnyServerCert));
    } else if trust.is_empty() {
        warn!("Server certificate verification enabled with an empty trust store");
    }

    Ok(tls)
}

fn load_client_certs(path: &Path) -> Result<Vec<Certificate>> {
    Ok(pem::load_certs(path)?
        .iter()
        .map(|der| Certificate(der.as_ref().to_vec()))
        .collect())
}

fn load_client_key(path: &Path) -> Result<PrivateKey> {
    let key = pem::load_private_key(path)?;
    Ok(PrivateKey(key.secret_der().to_vec()))
}

/// Accepts whatever certificate the directory presents
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn config() -> DirectoryConfig {
        DirectoryConfig {
            bind_user: "svc".into(),
            bind_password: "pw".into(),
            ca_cert_file: PathBuf::from("/nonexistent/cert.crt"),
            ..Default::default()
        }
    }

    #[test]
    fn test_connector_tolerates_missing_ca_bundle() {
        let connector = LdapConnector::new(&config()).unwrap();
        assert_eq!(connector.server_url, "ldaps://server.com:636");
        assert_eq!(connector.connect_timeout, Duration::from_secs(10));
        assert!(!connector.start_tls);
    }

    #[test]
    fn test_connector_rejects_unreadable_client_identity() {
        let mut config = config();
        config.tls.client_cert_file = Some(PathBuf::from("/nonexistent/client.crt"));
        config.tls.client_key_file = Some(PathBuf::from("/nonexistent/client.key"));

        let result = LdapConnector::new(&config);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_client_key_file_without_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "no key material here").unwrap();

        let result = load_client_key(file.path());
        assert!(matches!(result, Err(Error::Configuration(ref m)) if m.contains("No private key")));
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_server_fails() {
        let mut config = config();
        config.server_url = "ldap://127.0.0.1:1".into();
        config.connect_timeout_secs = 2;

        let connector = LdapConnector::new(&config).unwrap();
        let result = connector.connect().await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}
