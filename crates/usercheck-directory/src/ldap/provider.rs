//! Directory Verification Provider

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use usercheck_core::config::{BindFailurePolicy, DirectoryConfig};
use usercheck_core::types::DirectoryStatus;
use usercheck_core::{Error, Result};

use super::connection::{DirectoryConnector, DirectorySession, LdapConnector};
use super::membership;
use super::query::{group_criteria, user_criteria};
use super::types::{DirectoryEntry, SearchCriteria, UserCheck};

/// Runs membership checks, member counts and reachability probes
pub struct DirectoryProvider {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn DirectoryConnector>,
}

impl DirectoryProvider {
    /// Validate the configuration and prepare the real LDAP connector.
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        config.validate()?;
        let connector = LdapConnector::new(&config)?;
        Self::with_connector(config, Box::new(connector))
    }

    /// Use a custom connector, e.g. a fake directory.
    pub fn with_connector(
        config: DirectoryConfig,
        connector: Box<dyn DirectoryConnector>,
    ) -> Result<Self> {
        config.validate()?;

        if !config.tls.verify_server_cert {
            warn!(
                "Directory server certificate verification is disabled for {}",
                config.server_url
            );
        }
        info!(
            "Directory provider ready: server={}, group={}",
            config.server_url,
            config.security_group_dn()
        );

        Ok(Self {
            config: Arc::new(config),
            connector,
        })
    }

    /// Search for a user account by login name.
    pub async fn find_user(&self, identifier: &str) -> Result<Vec<DirectoryEntry>> {
        if identifier.is_empty() {
            return Err(Error::InvalidArgument("user identifier is empty".into()));
        }
        let criteria = user_criteria(&self.config, identifier);
        self.run_search(&criteria).await
    }

    /// Search for the configured group.
    pub async fn find_group(&self) -> Result<Vec<DirectoryEntry>> {
        let criteria = group_criteria(&self.config);
        self.run_search(&criteria).await
    }

    /// Does the user exist, and is it a member of the configured group?
    ///
    /// Only the first returned entry is evaluated.
    pub async fn check_user(&self, identifier: &str) -> Result<UserCheck> {
        let entries = self.find_user(identifier).await?;

        let Some(entry) = entries.first() else {
            info!("User {} not found", identifier);
            return Ok(UserCheck::not_found());
        };
        if entries.len() > 1 {
            warn!(
                "{} entries matched user {}, evaluating {}",
                entries.len(),
                identifier,
                entry.dn
            );
        }

        debug!("{}: {}", entry.dn, entry.first("mail").unwrap_or("<no mail>"));

        let group_dn = self.config.security_group_dn();
        let member = membership::is_member(entry.values("memberOf"), &group_dn);
        if member {
            info!("User {} is in group {}", identifier, self.config.group_name);
        } else {
            info!("User {} is not in group {}", identifier, self.config.group_name);
        }

        Ok(UserCheck {
            found: true,
            member,
        })
    }

    /// Number of member references held by the configured group.
    pub async fn count_members(&self) -> Result<usize> {
        let entries = self.find_group().await?;
        let count = membership::count_members(&entries);
        info!("Group {} has {} member(s)", self.config.group_name, count);
        Ok(count)
    }

    /// Reachability check: connect and close, no bind or search.
    pub async fn probe(&self) -> DirectoryStatus {
        match self.connector.connect().await {
            Ok(mut session) => {
                release(session.as_mut()).await;
                DirectoryStatus::Up
            }
            Err(e) => {
                warn!("Directory server {} is down: {}", self.config.server_url, e);
                DirectoryStatus::Down
            }
        }
    }

    async fn run_search(&self, criteria: &SearchCriteria) -> Result<Vec<DirectoryEntry>> {
        let mut session = self.connector.connect().await.map_err(|e| {
            error!("Failed to connect to {}: {}", self.config.server_url, e);
            e
        })?;

        if let Err(e) = session
            .simple_bind(&self.config.bind_user, &self.config.bind_password)
            .await
        {
            match self.config.bind_failure {
                BindFailurePolicy::Tolerate => {
                    debug!("Bind as {} failed, continuing: {}", self.config.bind_user, e);
                }
                BindFailurePolicy::Abort => {
                    error!("Bind as {} failed: {}", self.config.bind_user, e);
                    release(session.as_mut()).await;
                    return Err(e);
                }
            }
        }

        debug!(
            "Searching {} with filter: {}",
            criteria.base_dn, criteria.filter
        );
        let result = session.search(criteria).await;
        release(session.as_mut()).await;

        match result {
            Ok(entries) => {
                debug!("Search returned {} entries", entries.len());
                Ok(entries)
            }
            Err(e) => {
                error!("Search under {} failed: {}", criteria.base_dn, e);
                Err(e)
            }
        }
    }
}

async fn release(session: &mut dyn DirectorySession) {
    if let Err(e) = session.unbind().await {
        debug!("Failed to release directory session: {}", e);
    }
}
