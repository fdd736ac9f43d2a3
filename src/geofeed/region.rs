//! ISO 3166-2 region code reconciliation
//!
//! Geofeeds are expected to carry fully-qualified subdivision codes such
//! as `US-NY`, while the authoritative database returns the bare
//! subdivision (`NY`). In lax mode a bare code is accepted on the
//! correction side as well.

use crate::error::{GeofeedError, GeofeedResult};
use serde::{Deserialize, Serialize};

/// Separator between the country and subdivision parts of a region code
pub const REGION_SEPARATOR: char = '-';

/// How strictly region codes in a geofeed are checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionMode {
    /// Region codes must carry their country prefix (`US-NY`)
    #[default]
    Strict,
    /// Bare subdivision codes (`NY`) are accepted too
    Lax,
}

impl std::fmt::Display for RegionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionMode::Strict => write!(f, "strict"),
            RegionMode::Lax => write!(f, "lax"),
        }
    }
}

/// Normalizes region codes on both sides of a comparison
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionNormalizer {
    mode: RegionMode,
}

impl RegionNormalizer {
    pub fn new(mode: RegionMode) -> Self {
        Self { mode }
    }

    /// Pick the mode from a lax toggle
    pub fn from_lax(lax: bool) -> Self {
        if lax {
            Self::new(RegionMode::Lax)
        } else {
            Self::new(RegionMode::Strict)
        }
    }

    pub fn mode(&self) -> RegionMode {
        self.mode
    }

    /// Validate the region code proposed by a geofeed row.
    ///
    /// Empty codes are always accepted. A prefixed code must name the
    /// row's own country; a bare code is only accepted in lax mode.
    /// A prefix naming a different country is rejected in both modes.
    pub fn check_suggested(&self, line: usize, country: &str, region: &str) -> GeofeedResult<()> {
        if region.is_empty() {
            return Ok(());
        }

        let invalid = |reason: &str| GeofeedError::InvalidRegion {
            line,
            region: region.to_string(),
            country: country.to_string(),
            reason: reason.to_string(),
        };

        match region.split_once(REGION_SEPARATOR) {
            Some((prefix, subdivision)) => {
                if subdivision.is_empty() {
                    return Err(invalid("empty subdivision code"));
                }
                if !country.is_empty() && !prefix.eq_ignore_ascii_case(country) {
                    return Err(invalid("country prefix does not match the country code"));
                }
                Ok(())
            }
            None => match self.mode {
                RegionMode::Lax => Ok(()),
                RegionMode::Strict => Err(invalid(
                    "missing country prefix (use lax mode to accept bare region codes)",
                )),
            },
        }
    }

    /// Render the authoritative subdivision in the convention the
    /// correction uses, so the two can be compared directly.
    pub fn current_region(&self, suggested: &str, country: &str, subdivision: &str) -> String {
        if suggested.contains(REGION_SEPARATOR) {
            qualify(country, subdivision)
        } else {
            subdivision.to_string()
        }
    }
}

/// Build a fully-qualified `CC-SUB` code.
///
/// Codes that are already qualified are returned upper-cased and
/// otherwise unchanged, so `qualify(cc, &qualify(cc, sub)) == qualify(cc, sub)`.
/// An empty subdivision stays empty.
pub fn qualify(country: &str, region: &str) -> String {
    if region.is_empty() {
        String::new()
    } else if region.contains(REGION_SEPARATOR) {
        region.to_uppercase()
    } else {
        format!("{}{}{}", country, REGION_SEPARATOR, region).to_uppercase()
    }
}

/// Case-insensitive comparison used for every geo field
pub fn same_code(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_is_idempotent() {
        let pairs = [("US", "NY"), ("us", "ca"), ("GB", "ENG"), ("FR", "IDF")];
        for (country, region) in pairs {
            let once = qualify(country, region);
            assert_eq!(qualify(country, &once), once);
        }
        assert_eq!(qualify("US", "US-NY"), "US-NY");
        assert_eq!(qualify("us", "ny"), "US-NY");
        assert_eq!(qualify("US", ""), "");
    }

    #[test]
    fn test_same_code_ignores_case() {
        assert!(same_code("us", "US"));
        assert!(same_code("ny", "NY"));
        assert!(same_code("São Paulo", "SÃO PAULO"));
        assert!(!same_code("US-NY", "US-CA"));
    }

    #[test]
    fn test_strict_rejects_bare_region() {
        let normalizer = RegionNormalizer::new(RegionMode::Strict);
        let err = normalizer.check_suggested(7, "US", "CA").unwrap_err();
        match err {
            GeofeedError::InvalidRegion { line, region, .. } => {
                assert_eq!(line, 7);
                assert_eq!(region, "CA");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(normalizer.check_suggested(7, "US", "US-CA").is_ok());
        assert!(normalizer.check_suggested(7, "US", "us-ca").is_ok());
        assert!(normalizer.check_suggested(7, "US", "").is_ok());
    }

    #[test]
    fn test_lax_accepts_bare_region() {
        let normalizer = RegionNormalizer::from_lax(true);
        assert_eq!(normalizer.mode(), RegionMode::Lax);
        assert!(normalizer.check_suggested(1, "US", "CA").is_ok());
        assert!(normalizer.check_suggested(1, "US", "US-CA").is_ok());
    }

    #[test]
    fn test_prefix_must_match_country() {
        for mode in [RegionMode::Strict, RegionMode::Lax] {
            let normalizer = RegionNormalizer::new(mode);
            assert!(normalizer.check_suggested(2, "US", "CA-ON").is_err());
            assert!(normalizer.check_suggested(2, "US", "US-").is_err());
        }
    }

    #[test]
    fn test_current_region_follows_suggested_convention() {
        let normalizer = RegionNormalizer::from_lax(true);
        assert_eq!(normalizer.current_region("US-CA", "US", "NY"), "US-NY");
        assert_eq!(normalizer.current_region("CA", "US", "NY"), "NY");
        assert_eq!(normalizer.current_region("US-CA", "US", ""), "");
    }
}
