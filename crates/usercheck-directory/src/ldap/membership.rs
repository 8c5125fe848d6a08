//! Interpreting search results

use super::types::DirectoryEntry;

/// Marker that opens every member reference in a group's `member` values
pub const MEMBER_MARKER: &str = "CN=";

/// True iff `group_dn` appears verbatim among the user's `memberOf` values.
///
/// No DN normalization: case and spacing must match exactly.
pub fn is_member<S: AsRef<str>>(member_of: &[S], group_dn: &str) -> bool {
    member_of.iter().any(|dn| dn.as_ref() == group_dn)
}

/// Count member references across the `member` values of every entry.
///
/// This counts occurrences of [`MEMBER_MARKER`], so a member DN containing
/// several `CN=` components counts more than once.
pub fn count_members(entries: &[DirectoryEntry]) -> usize {
    entries
        .iter()
        .flat_map(|entry| entry.values("member"))
        .map(|value| value.matches(MEMBER_MARKER).count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP_DN: &str = "CN=group.users,CN=Security,CN=Groups,DC=domain,DC=com";

    #[test]
    fn test_is_member_exact_match() {
        let values = vec![
            "CN=other,CN=Security,CN=Groups,DC=domain,DC=com".to_string(),
            GROUP_DN.to_string(),
        ];
        assert!(is_member(&values, GROUP_DN));
    }

    #[test]
    fn test_is_member_is_case_sensitive() {
        let values = ["cn=group.users,cn=Security,cn=Groups,dc=domain,dc=com"];
        assert!(!is_member(&values, GROUP_DN));
        let empty: [&str; 0] = [];
        assert!(!is_member(&empty, GROUP_DN));
    }

    #[test]
    fn test_count_members_sums_markers() {
        let members: Vec<String> = (0..497)
            .map(|i| format!("CN=user{},OU=People,DC=domain,DC=com", i))
            .collect();
        let entry = DirectoryEntry::new(GROUP_DN).with_values("member", members.clone());
        assert_eq!(count_members(&[entry]), 497);

        let mut reversed = members;
        reversed.reverse();
        let entry = DirectoryEntry::new(GROUP_DN).with_values("member", reversed);
        assert_eq!(count_members(&[entry]), 497);
    }

    #[test]
    fn test_count_members_counts_every_marker() {
        let entry = DirectoryEntry::new(GROUP_DN).with_values(
            "member",
            ["CN=Doe\\, John,CN=Users,DC=domain,DC=com", "CN=svc,OU=Apps,DC=domain,DC=com"],
        );
        assert_eq!(count_members(&[entry]), 3);
    }

    #[test]
    fn test_count_members_across_entries() {
        let a = DirectoryEntry::new("CN=a").with_values("member", ["CN=x", "CN=y"]);
        let b = DirectoryEntry::new("CN=b").with_values("Member", ["CN=z"]);
        let empty = DirectoryEntry::new("CN=c");
        assert_eq!(count_members(&[a, b, empty]), 3);
        assert_eq!(count_members(&[]), 0);
    }
}
