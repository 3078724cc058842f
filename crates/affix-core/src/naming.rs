//! Affinity-domain naming convention.
//!
//! Groups, stores and pools carry their domain as a name prefix:
//! `alpha-vms` belongs to `alpha`, so does `alpha_ds01`. Every place in the
//! engine that needs a domain goes through [`DomainConvention`], so an
//! alternate convention only has to replace the one implementation here.

use serde::{Deserialize, Serialize};

/// Default delimiter between domain and suffix in group names.
pub const DEFAULT_GROUP_DELIMITER: char = '-';

/// Default delimiter between domain and suffix in store and pool names.
pub const DEFAULT_STORAGE_DELIMITER: char = '_';

/// Substring of `name` before the first `delimiter`, or all of `name`.
pub fn derive_domain(name: &str, delimiter: char) -> &str {
    match name.split_once(delimiter) {
        Some((domain, _)) => domain,
        None => name,
    }
}

/// Maps resource names to affinity domains.
pub trait DomainConvention: Send + Sync {
    /// Domain of an affinity group name.
    fn group_domain<'a>(&self, name: &'a str) -> &'a str;

    /// Domain of a store or pool name.
    fn storage_domain<'a>(&self, name: &'a str) -> &'a str;

    /// Swap the domain prefix of a storage name, keeping the suffix.
    ///
    /// Returns `None` when `name` is not in `from_domain`.
    fn rewrite_storage(&self, name: &str, from_domain: &str, to_domain: &str) -> Option<String>;
}

/// Prefix-before-delimiter convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterConvention {
    pub group_delimiter: char,
    pub storage_delimiter: char,
}

impl DelimiterConvention {
    pub fn new(group_delimiter: char, storage_delimiter: char) -> Self {
        Self {
            group_delimiter,
            storage_delimiter,
        }
    }
}

impl Default for DelimiterConvention {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_DELIMITER, DEFAULT_STORAGE_DELIMITER)
    }
}

impl DomainConvention for DelimiterConvention {
    fn group_domain<'a>(&self, name: &'a str) -> &'a str {
        derive_domain(name, self.group_delimiter)
    }

    fn storage_domain<'a>(&self, name: &'a str) -> &'a str {
        derive_domain(name, self.storage_delimiter)
    }

    fn rewrite_storage(&self, name: &str, from_domain: &str, to_domain: &str) -> Option<String> {
        if self.storage_domain(name) != from_domain {
            return None;
        }
        let suffix = &name[from_domain.len()..];
        Some(format!("{to_domain}{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_is_prefix_before_first_delimiter() {
        assert_eq!(derive_domain("alpha-vms", '-'), "alpha");
        assert_eq!(derive_domain("alpha-vms-extra", '-'), "alpha");
        assert_eq!(derive_domain("beta_ds01", '_'), "beta");
    }

    #[test]
    fn missing_delimiter_yields_whole_name() {
        assert_eq!(derive_domain("shared", '-'), "shared");
        assert_eq!(derive_domain("alpha-ds01", '_'), "alpha-ds01");
    }

    #[test]
    fn leading_delimiter_yields_empty_domain() {
        assert_eq!(derive_domain("-orphan", '-'), "");
    }

    #[test]
    fn convention_uses_separate_delimiters() {
        let conv = DelimiterConvention::default();
        assert_eq!(conv.group_domain("alpha-vms"), "alpha");
        assert_eq!(conv.storage_domain("alpha_ds01"), "alpha");
        // Group delimiter does not split storage names.
        assert_eq!(conv.storage_domain("alpha-ds01"), "alpha-ds01");
    }

    #[test]
    fn rewrite_preserves_suffix_verbatim() {
        let conv = DelimiterConvention::default();
        assert_eq!(
            conv.rewrite_storage("beta_ds01_ssd", "beta", "alpha").as_deref(),
            Some("alpha_ds01_ssd")
        );
        assert_eq!(
            conv.rewrite_storage("beta", "beta", "alpha").as_deref(),
            Some("alpha")
        );
    }

    #[test]
    fn rewrite_rejects_foreign_prefix() {
        let conv = DelimiterConvention::default();
        assert!(conv.rewrite_storage("gamma_ds01", "beta", "alpha").is_none());
        // "betamax_ds" has domain "betamax", not "beta".
        assert!(conv.rewrite_storage("betamax_ds", "beta", "alpha").is_none());
    }

    #[test]
    fn custom_delimiters() {
        let conv = DelimiterConvention::new('.', ':');
        assert_eq!(conv.group_domain("east.hosts"), "east");
        assert_eq!(conv.storage_domain("east:lun7"), "east");
    }
}
