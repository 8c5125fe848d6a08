use serde::{Deserialize, Serialize};

/// Reachability of the directory server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryStatus {
    Up,
    Down,
}

/// Payload of the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(rename = "LdapStatus")]
    pub ldap_status: DirectoryStatus,
    #[serde(rename = "ProcessPid")]
    pub process_pid: u32,
}

impl StatusReport {
    pub fn current(ldap_status: DirectoryStatus) -> Self {
        Self {
            ldap_status,
            process_pid: std::process::id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_report_keys() {
        let report = StatusReport {
            ldap_status: DirectoryStatus::Down,
            process_pid: 4242,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["LdapStatus"], "down");
        assert_eq!(value["ProcessPid"], 4242);
    }
}
