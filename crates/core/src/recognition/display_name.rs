//! Display names for identity ids.
//!
//! Identity ids are opaque to matching. Callers happen to compose them as
//! `<name>_<qualifier>` or `<role prefix><name>_<subject>`, and the summary
//! shows a friendlier name derived from that convention. The convention is
//! owned by the caller, so it lives behind [`DisplayNameStrategy`].

use crate::shared::constants::PROFESSOR_PREFIX;

pub trait DisplayNameStrategy: Send + Sync {
    fn display_name(&self, identity_id: &str) -> String;
}

/// Shows the id unchanged.
pub struct IdentityNaming;

impl DisplayNameStrategy for IdentityNaming {
    fn display_name(&self, identity_id: &str) -> String {
        identity_id.to_string()
    }
}

/// Strips a role prefix if present, otherwise keeps the token before the
/// first separator.
///
/// `prof_ada_math` → `ada_math`, `grace_1042` → `grace`, `linus` → `linus`.
pub struct RolePrefixNaming {
    role_prefix: String,
    separator: char,
}

impl RolePrefixNaming {
    pub fn new(role_prefix: impl Into<String>, separator: char) -> Self {
        Self {
            role_prefix: role_prefix.into(),
            separator,
        }
    }

    /// Builds an id following the same convention this strategy reads.
    pub fn compose(&self, name: &str, qualifier: Option<&str>, with_role: bool) -> String {
        let mut id = String::new();
        if with_role {
            id.push_str(&self.role_prefix);
        }
        id.push_str(name);
        if let Some(q) = qualifier.filter(|q| !q.is_empty()) {
            id.push(self.separator);
            id.push_str(q);
        }
        id
    }
}

impl Default for RolePrefixNaming {
    fn default() -> Self {
        Self::new(PROFESSOR_PREFIX, '_')
    }
}

impl DisplayNameStrategy for RolePrefixNaming {
    fn display_name(&self, identity_id: &str) -> String {
        if !self.role_prefix.is_empty() {
            if let Some(rest) = identity_id.strip_prefix(self.role_prefix.as_str()) {
                return rest.to_string();
            }
        }
        identity_id
            .split(self.separator)
            .next()
            .unwrap_or(identity_id)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("prof_ada_math", "ada_math")]
    #[case("prof_ada", "ada")]
    #[case("grace_1042", "grace")]
    #[case("linus", "linus")]
    #[case("_leading", "")]
    #[case("professor_x", "professor")]
    fn test_role_prefix_naming(#[case] id: &str, #[case] expected: &str) {
        assert_eq!(RolePrefixNaming::default().display_name(id), expected);
    }

    #[test]
    fn test_custom_prefix_and_separator() {
        let naming = RolePrefixNaming::new("staff-", '-');
        assert_eq!(naming.display_name("staff-kim-ops"), "kim-ops");
        assert_eq!(naming.display_name("lee-7"), "lee");
    }

    #[test]
    fn test_identity_naming_passes_through() {
        assert_eq!(IdentityNaming.display_name("prof_ada_math"), "prof_ada_math");
    }

    #[rstest]
    #[case("grace", Some("1042"), false, "grace_1042")]
    #[case("grace", None, false, "grace")]
    #[case("grace", Some(""), false, "grace")]
    #[case("ada", Some("math"), true, "prof_ada_math")]
    #[case("ada", None, true, "prof_ada")]
    fn test_compose(
        #[case] name: &str,
        #[case] qualifier: Option<&str>,
        #[case] with_role: bool,
        #[case] expected: &str,
    ) {
        assert_eq!(
            RolePrefixNaming::default().compose(name, qualifier, with_role),
            expected
        );
    }

    #[test]
    fn test_compose_round_trips_through_display_name() {
        let naming = RolePrefixNaming::default();
        let id = naming.compose("grace", Some("1042"), false);
        assert_eq!(naming.display_name(&id), "grace");
    }
}
