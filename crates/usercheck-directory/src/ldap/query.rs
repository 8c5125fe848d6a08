//! Search criteria for the two supported lookups

use ldap3::{ldap_escape, Scope};
use usercheck_core::config::DirectoryConfig;

use super::types::SearchCriteria;

/// Attributes requested for a user lookup
pub const USER_ATTRIBUTES: [&str; 4] = ["mail", "sn", "givenName", "memberOf"];

/// Attributes requested for a group lookup
pub const GROUP_ATTRIBUTES: [&str; 1] = ["member"];

/// Look up a user account by its login name under the people base.
pub fn user_criteria(config: &DirectoryConfig, identifier: &str) -> SearchCriteria {
    SearchCriteria {
        base_dn: config.people_base_dn.clone(),
        scope: Scope::Subtree,
        filter: format!(
            "(&(objectClass=user)(sAMAccountName={}))",
            ldap_escape(identifier)
        ),
        attributes: USER_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
    }
}

/// Look up the configured group under the group base.
pub fn group_criteria(config: &DirectoryConfig) -> SearchCriteria {
    SearchCriteria {
        base_dn: config.group_search_base(),
        scope: Scope::Subtree,
        filter: format!(
            "(&(objectCategory=group)(cn={}))",
            ldap_escape(config.group_name.as_str())
        ),
        attributes: GROUP_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_criteria() {
        let config = DirectoryConfig::default();
        let criteria = user_criteria(&config, "jdoe");

        assert_eq!(
            criteria.base_dn,
            "OU=eCore Office,OU=People Accounts,DC=domain,DC=com"
        );
        assert_eq!(criteria.scope, Scope::Subtree);
        assert_eq!(criteria.filter, "(&(objectClass=user)(sAMAccountName=jdoe))");
        assert_eq!(criteria.attributes, ["mail", "sn", "givenName", "memberOf"]);
    }

    #[test]
    fn test_user_criteria_escapes_filter_metacharacters() {
        let config = DirectoryConfig::default();
        let criteria = user_criteria(&config, "*)(objectClass=*");

        assert_eq!(
            criteria.filter,
            "(&(objectClass=user)(sAMAccountName=\\2a\\29\\28objectClass=\\2a))"
        );
    }

    #[test]
    fn test_group_criteria() {
        let config = DirectoryConfig {
            group_name: "vpn.users".into(),
            ..Default::default()
        };
        let criteria = group_criteria(&config);

        assert_eq!(criteria.base_dn, "CN=Groups,DC=domain,DC=com");
        assert_eq!(criteria.filter, "(&(objectCategory=group)(cn=vpn.users))");
        assert_eq!(criteria.attributes, ["member"]);
    }
}
