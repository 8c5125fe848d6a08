//! LDAP/Active Directory access
//!
//! Every operation dials its own connection, binds with the service
//! account, runs a single search and releases the connection before
//! returning. Nothing is pooled or cached.

mod connection;
mod membership;
mod provider;
mod query;
mod trust;
mod types;

pub use connection::{DirectoryConnector, DirectorySession, LdapConnector};
pub use membership::{count_members, is_member, MEMBER_MARKER};
pub use provider::DirectoryProvider;
pub use query::{group_criteria, user_criteria, GROUP_ATTRIBUTES, USER_ATTRIBUTES};
pub use trust::TrustStore;
pub use types::*;
