//! Directory verification for Usercheck
//!
//! Answers three questions against an LDAP/Active Directory server: does a
//! user belong to the configured security group, how many members does that
//! group have, and is the server reachable at all.

pub mod ldap;

pub use ldap::{
    DirectoryConnector, DirectoryEntry, DirectoryProvider, DirectorySession, LdapConnector,
    SearchCriteria, TrustStore, UserCheck,
};
pub use usercheck_core::types::DirectoryStatus;
