//! Configuration for Usercheck
//!
//! Settings come from defaults, an optional TOML file, and environment
//! variables. The variable names match the ones the service has always
//! been deployed with (`LDAP_ADDR`, `NPA_USER`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserCheckConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tls: TlsConfig,

    #[serde(default)]
    pub directory: DirectoryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Development mode: verbose logs and error details in responses
    #[serde(default)]
    pub development: bool,
}

impl UserCheckConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config {:?}: {}", path, e))
        })?;

        toml::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay process environment variables onto this configuration.
    pub fn apply_env(&mut self) {
        self.apply_lookup(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values count as unset.
    pub fn apply_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        // Server
        if let Some(addr) = var("USERCHECK_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(port) = var("USERCHECK_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Some(timeout) = var("SHUTDOWN_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.server.shutdown_timeout_secs = t;
            }
        }
        if let Some(level) = var("USERCHECK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dev) = var("USERCHECK_DEVELOPMENT") {
            self.development = parse_flag(&dev);
        }

        // HTTPS listener material
        if let Some(cert) = var("API_CERT_CRT_FILE") {
            self.tls.cert_file = PathBuf::from(cert);
        }
        if let Some(key) = var("API_CERT_KEY_FILE") {
            self.tls.key_file = PathBuf::from(key);
        }

        // Directory
        let dir = &mut self.directory;
        if let Some(url) = var("LDAP_ADDR") {
            dir.server_url = url;
        }
        if let Some(user) = var("NPA_USER") {
            dir.bind_user = user;
        }
        if let Some(password) = var("NPA_PASSWORD") {
            dir.bind_password = password;
        }
        if let Some(group) = var("USER_GROUP") {
            dir.group_name = group;
        }
        if let Some(cert) = var("LDAP_CERT_FILE") {
            dir.ca_cert_file = PathBuf::from(cert);
        }
        if let Some(base) = var("SEARCH_PEOPLE") {
            dir.people_base_dn = base;
        }
        if let Some(suffix) = var("LDAP_DOMAIN_SUFFIX") {
            dir.domain_suffix = suffix;
        }
        if let Some(base) = var("LDAP_GROUP_BASE_DN") {
            dir.group_base_dn = Some(base);
        }
        if let Some(verify) = var("LDAP_VERIFY_SERVER_CERT") {
            dir.tls.verify_server_cert = parse_flag(&verify);
        }
        if let Some(cert) = var("LDAP_CLIENT_CERT_FILE") {
            dir.tls.client_cert_file = Some(PathBuf::from(cert));
        }
        if let Some(key) = var("LDAP_CLIENT_KEY_FILE") {
            dir.tls.client_key_file = Some(PathBuf::from(key));
        }
        if let Some(start_tls) = var("LDAP_START_TLS") {
            dir.tls.start_tls = parse_flag(&start_tls);
        }
        if let Some(policy) = var("LDAP_BIND_FAILURE") {
            match policy.parse() {
                Ok(p) => dir.bind_failure = p,
                Err(e) => tracing::warn!("Ignoring LDAP_BIND_FAILURE: {}", e),
            }
        }
        if let Some(secs) = var("LDAP_CONNECT_TIMEOUT") {
            if let Ok(s) = secs.parse() {
                dir.connect_timeout_secs = s;
            }
        }
        if let Some(secs) = var("LDAP_OPERATION_TIMEOUT") {
            if let Ok(s) = secs.parse() {
                dir.operation_timeout_secs = s;
            }
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Time allowed for in-flight requests to drain once shutdown begins
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 60,
        }
    }
}

/// HTTPS listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_api_cert_file")]
    pub cert_file: PathBuf,

    #[serde(default = "default_api_key_file")]
    pub key_file: PathBuf,
}

fn default_api_cert_file() -> PathBuf {
    PathBuf::from("server.crt")
}

fn default_api_key_file() -> PathBuf {
    PathBuf::from("private.key")
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_file: default_api_cert_file(),
            key_file: default_api_key_file(),
        }
    }
}

impl TlsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled {
            if !self.cert_file.exists() {
                return Err(Error::Configuration(format!(
                    "Certificate file not found: {:?}",
                    self.cert_file
                )));
            }
            if !self.key_file.exists() {
                return Err(Error::Configuration(format!(
                    "Key file not found: {:?}",
                    self.key_file
                )));
            }
        }
        Ok(())
    }
}

/// What to do when the service account cannot bind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindFailurePolicy {
    /// Log and carry on searching with the unbound connection
    #[default]
    Tolerate,
    /// Fail the operation
    Abort,
}

impl FromStr for BindFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tolerate" => Ok(Self::Tolerate),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown bind failure policy '{}'", other)),
        }
    }
}

/// TLS posture towards the directory server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryTlsConfig {
    /// Verify the server certificate against the CA bundle
    #[serde(default)]
    pub verify_server_cert: bool,

    /// Client identity presented during the handshake
    #[serde(default)]
    pub client_cert_file: Option<PathBuf>,

    #[serde(default)]
    pub client_key_file: Option<PathBuf>,

    /// Upgrade a plain ldap:// connection with StartTLS
    #[serde(default)]
    pub start_tls: bool,
}

/// Directory connection and query settings
#[derive(Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// CA bundle used as the trust pool
    #[serde(default = "default_ca_cert_file")]
    pub ca_cert_file: PathBuf,

    /// Service account DN or principal
    #[serde(default)]
    pub bind_user: String,

    #[serde(default)]
    pub bind_password: String,

    /// Search base for user lookups
    #[serde(default = "default_people_base_dn")]
    pub people_base_dn: String,

    /// Short name of the security group users must belong to
    #[serde(default = "default_group_name")]
    pub group_name: String,

    /// Domain components appended to group DNs
    #[serde(default = "default_domain_suffix")]
    pub domain_suffix: String,

    /// Search base for group lookups, `CN=Groups,<domain_suffix>` when unset
    #[serde(default)]
    pub group_base_dn: Option<String>,

    #[serde(default)]
    pub tls: DirectoryTlsConfig,

    #[serde(default)]
    pub bind_failure: BindFailurePolicy,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,
}

fn default_server_url() -> String {
    "ldaps://server.com:636".to_string()
}

fn default_ca_cert_file() -> PathBuf {
    PathBuf::from("cert.crt")
}

fn default_people_base_dn() -> String {
    "OU=eCore Office,OU=People Accounts,DC=domain,DC=com".to_string()
}

fn default_group_name() -> String {
    "group.users".to_string()
}

fn default_domain_suffix() -> String {
    "DC=domain,DC=com".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_operation_timeout() -> u64 {
    30
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            ca_cert_file: default_ca_cert_file(),
            bind_user: String::new(),
            bind_password: String::new(),
            people_base_dn: default_people_base_dn(),
            group_name: default_group_name(),
            domain_suffix: default_domain_suffix(),
            group_base_dn: None,
            tls: DirectoryTlsConfig::default(),
            bind_failure: BindFailurePolicy::default(),
            connect_timeout_secs: default_connect_timeout(),
            operation_timeout_secs: default_operation_timeout(),
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("server_url", &self.server_url)
            .field("ca_cert_file", &self.ca_cert_file)
            .field("bind_user", &self.bind_user)
            .field("bind_password", &"[REDACTED]")
            .field("people_base_dn", &self.people_base_dn)
            .field("group_name", &self.group_name)
            .field("domain_suffix", &self.domain_suffix)
            .field("group_base_dn", &self.group_base_dn)
            .field("tls", &self.tls)
            .field("bind_failure", &self.bind_failure)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .finish()
    }
}

impl DirectoryConfig {
    /// Reject the first required setting that is empty.
    pub fn validate(&self) -> Result<()> {
        let required = [
            (self.server_url.as_str(), "ldap address is not set"),
            (self.bind_user.as_str(), "ldap user is not set"),
            (self.bind_password.as_str(), "ldap password is not set"),
            (self.people_base_dn.as_str(), "ldap people search base is not set"),
            (self.group_name.as_str(), "ldap user group is not set"),
            (self.domain_suffix.as_str(), "ldap domain suffix is not set"),
        ];
        for (value, message) in required {
            if value.trim().is_empty() {
                return Err(Error::Configuration(message.to_string()));
            }
        }
        if self.ca_cert_file.as_os_str().is_empty() {
            return Err(Error::Configuration("ldap certificate file is not set".into()));
        }

        if !self.server_url.starts_with("ldap://") && !self.server_url.starts_with("ldaps://") {
            return Err(Error::Configuration(format!(
                "ldap address must start with ldap:// or ldaps://, got '{}'",
                self.server_url
            )));
        }

        match (&self.tls.client_cert_file, &self.tls.client_key_file) {
            (Some(_), None) | (None, Some(_)) => Err(Error::Configuration(
                "ldap client certificate and key must be configured together".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Fully-qualified DN of the security group users must belong to.
    pub fn security_group_dn(&self) -> String {
        format!(
            "CN={},CN=Security,CN=Groups,{}",
            self.group_name, self.domain_suffix
        )
    }

    pub fn group_search_base(&self) -> String {
        match &self.group_base_dn {
            Some(base) if !base.is_empty() => base.clone(),
            _ => format!("CN=Groups,{}", self.domain_suffix),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}
