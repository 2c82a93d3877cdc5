//! Version tokens and the ordering used to pick the latest version of a prompt.
//!
//! A token is *numeric* when every dot-separated component (after an optional
//! leading `v`) parses as an unsigned integer; numeric tokens compare
//! component-wise. Anything else compares lexicographically. A numeric token
//! always ranks above a non-numeric one, which keeps the order total.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("version is empty")]
    Empty,
    #[error("version contains invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("version has an empty component")]
    EmptyComponent,
    #[error("unquoted decimal cannot be read back exactly, quote the version")]
    UnquotedDecimal,
}

#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    numeric: Option<Vec<u64>>,
}

impl Version {
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(VersionError::Empty);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')))
        {
            return Err(VersionError::InvalidCharacter(c));
        }
        if raw.split('.').any(str::is_empty) {
            return Err(VersionError::EmptyComponent);
        }

        let digits = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw);
        let numeric = digits
            .split('.')
            .map(|part| {
                if part.bytes().all(|b| b.is_ascii_digit()) {
                    part.parse::<u64>().ok()
                } else {
                    None
                }
            })
            .collect::<Option<Vec<_>>>();

        Ok(Self {
            raw: raw.to_string(),
            numeric,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric.is_some()
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.numeric, &other.numeric) {
            (Some(a), Some(b)) => a.cmp(b).then_with(|| self.raw.cmp(&other.raw)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.raw.cmp(&other.raw),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn numeric_components_compare_as_numbers() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("2.0") > v("1.99.99"));
        assert!(v("10") > v("9"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn leading_v_is_numeric() {
        assert!(v("v0.2.0").is_numeric());
        assert!(v("v0.10.0") > v("v0.9.1"));
        assert!(v("v2") > v("1.5"));
    }

    #[test]
    fn non_numeric_compare_lexicographically() {
        assert!(!v("1.0-beta").is_numeric());
        assert!(v("beta") > v("alpha"));
        assert!(v("rc2") > v("rc10"));
    }

    #[test]
    fn numeric_ranks_above_non_numeric() {
        assert!(v("1") > v("1a"));
        assert!(v("0.1") > v("zzz"));
    }

    #[test]
    fn order_is_transitive_across_kinds() {
        // Pure string comparison would give 9 < 10 < 1a < 9.
        let mut versions = vec![v("1a"), v("10"), v("9")];
        versions.sort();
        let sorted: Vec<_> = versions.iter().map(Version::as_str).collect();
        assert_eq!(sorted, vec!["1a", "9", "10"]);
    }

    #[test]
    fn numeric_ties_fall_back_to_raw_text() {
        assert_ne!(v("1.0"), v("1.00"));
        assert_ne!(v("1.0").cmp(&v("1.00")), Ordering::Equal);
        assert_eq!(v("1.0").cmp(&v("1.0")), Ordering::Equal);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(Version::parse(""), Err(VersionError::Empty));
        assert_eq!(Version::parse("   "), Err(VersionError::Empty));
        assert_eq!(Version::parse("1..2"), Err(VersionError::EmptyComponent));
        assert_eq!(Version::parse(".1"), Err(VersionError::EmptyComponent));
        assert_eq!(Version::parse("1/2"), Err(VersionError::InvalidCharacter('/')));
        assert_eq!(Version::parse("1 2"), Err(VersionError::InvalidCharacter(' ')));
    }

    #[test]
    fn oversized_component_is_lexicographic() {
        assert!(!v("99999999999999999999999.1").is_numeric());
    }
}
