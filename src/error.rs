//! Error types for geofeed verification
//!
//! Every per-record failure is fatal for the run: a single bad row is
//! reported with its line number and the verification stops without
//! producing a partial report.

use thiserror::Error;

/// Convenience alias used across the library
pub type GeofeedResult<T> = std::result::Result<T, GeofeedError>;

/// Errors raised while verifying a geofeed
#[derive(Debug, Error)]
pub enum GeofeedError {
    /// Wrong field count or otherwise unparsable row
    #[error("malformed record on line {line}: {reason}: '{content}'")]
    MalformedRecord {
        line: usize,
        content: String,
        reason: String,
    },

    /// Network field is neither an address nor a CIDR block
    #[error("invalid network on line {line}: '{network}'")]
    InvalidNetwork { line: usize, network: String },

    /// Region code does not follow the configured ISO 3166-2 convention
    #[error("invalid region code on line {line}: '{region}' (country '{country}'): {reason}")]
    InvalidRegion {
        line: usize,
        region: String,
        country: String,
        reason: String,
    },

    /// The authoritative database has no entry for the network
    #[error("no database entry for network {network}")]
    LookupMiss { network: String },

    /// The database rejected the query or could not decode the record
    #[error("lookup failed for network {network}: {reason}")]
    LookupFailed { network: String, reason: String },

    /// Required inputs are missing or unreadable
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeofeedError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a lookup failure for a network
    pub fn lookup_failed(network: impl ToString, reason: impl ToString) -> Self {
        Self::LookupFailed {
            network: network.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Line number of the offending geofeed row, if the error is tied to one
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedRecord { line, .. }
            | Self::InvalidNetwork { line, .. }
            | Self::InvalidRegion { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_display() {
        let err = GeofeedError::MalformedRecord {
            line: 3,
            content: "1.1.1.1,US,US-CA,Los Angeles".to_string(),
            reason: "expected 5 fields, found 4".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 3"));
        assert!(msg.contains("expected 5 fields, found 4"));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_line_for_non_record_errors() {
        assert_eq!(GeofeedError::configuration("-gf is required").line(), None);
        let miss = GeofeedError::LookupMiss {
            network: "192.0.2.0/24".to_string(),
        };
        assert_eq!(miss.line(), None);
        assert_eq!(
            miss.to_string(),
            "no database entry for network 192.0.2.0/24"
        );
    }
}
