//! Geofeed file parsing
//!
//! This module turns the rows of an RFC 8805 style geofeed into
//! [`CorrectionRecord`]s. Rows have the shape
//!
//! ```text
//! network,country,region,city,postal[,asn]
//! ```
//!
//! Lines starting with `#` are comments and blank lines are ignored.
//! A row with the wrong number of fields, or a network that cannot be
//! parsed, is an error; the reader never skips bad rows.
//!
//! # Example
//!
//! ```rust,ignore
//! use geofeed_verifier::geofeed::{GeofeedFormat, GeofeedReader};
//!
//! let data = "# comment\n192.0.2.0/24,US,US-CA,Los Angeles,90001\n";
//! for record in GeofeedReader::new(data.as_bytes(), GeofeedFormat::Standard) {
//!     let record = record?;
//!     println!("{} -> {}", record.network, record.region_code);
//! }
//! ```

pub mod network;
pub mod region;

use crate::error::{GeofeedError, GeofeedResult};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, ErrorKind, Lines};

/// Marks a whole-line comment
pub const COMMENT_MARKER: char = '#';

/// UTF-8 byte-order mark some editors put at the start of a file
const BYTE_ORDER_MARK: char = '\u{feff}';

// =============================================================================
// Types
// =============================================================================

/// Column layout of a geofeed file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeofeedFormat {
    /// `network,country,region,city,postal`
    #[default]
    Standard,
    /// `network,country,region,city,postal,asn`
    WithAsn,
}

impl GeofeedFormat {
    /// Number of fields every row must have
    pub fn field_count(&self) -> usize {
        match self {
            GeofeedFormat::Standard => 5,
            GeofeedFormat::WithAsn => 6,
        }
    }
}

/// A single proposed correction from a geofeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRecord {
    /// 1-based line in the source file
    pub line: usize,
    /// Network the correction applies to, single hosts expanded to /32 or /128
    pub network: IpNet,
    /// ISO 3166-1 alpha-2 country code
    pub country_code: String,
    /// ISO 3166-2 region code, possibly without the country prefix
    pub region_code: String,
    pub city_name: String,
    /// Carried through but never compared
    pub postal_code: String,
    /// Autonomous system number from the optional sixth column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
}

// =============================================================================
// Reader
// =============================================================================

/// Lazy reader producing one [`CorrectionRecord`] per geofeed row
pub struct GeofeedReader<R: BufRead> {
    lines: Lines<R>,
    line: usize,
    format: GeofeedFormat,
}

impl<R: BufRead> GeofeedReader<R> {
    /// Create a reader over any buffered character stream
    pub fn new(reader: R, format: GeofeedFormat) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            format,
        }
    }

    fn parse_line(&self, content: &str) -> GeofeedResult<CorrectionRecord> {
        let line = self.line;
        let malformed = |reason: String| GeofeedError::MalformedRecord {
            line,
            content: content.to_string(),
            reason,
        };

        let row = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::Fields)
            .from_reader(content.as_bytes())
            .into_records()
            .next()
            .ok_or_else(|| malformed("empty row".to_string()))?
            .map_err(|e| malformed(e.to_string()))?;

        let expected = self.format.field_count();
        if row.len() != expected {
            return Err(malformed(format!(
                "expected {} fields, found {}",
                expected,
                row.len()
            )));
        }

        let field = |idx: usize| row.get(idx).unwrap_or_default().to_string();

        let raw_network = field(0);
        let network =
            network::normalize_network(&raw_network).map_err(|_| GeofeedError::InvalidNetwork {
                line,
                network: raw_network.clone(),
            })?;

        let asn = match self.format {
            GeofeedFormat::Standard => None,
            GeofeedFormat::WithAsn => parse_asn(&field(5)).map_err(malformed)?,
        };

        Ok(CorrectionRecord {
            line,
            network,
            country_code: field(1),
            region_code: field(2),
            city_name: field(3),
            postal_code: field(4),
            asn,
        })
    }
}

impl<R: BufRead> Iterator for GeofeedReader<R> {
    type Item = GeofeedResult<CorrectionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let content = match self.lines.next()? {
                Ok(content) => content,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    self.line += 1;
                    return Some(Err(GeofeedError::MalformedRecord {
                        line: self.line,
                        content: String::new(),
                        reason: e.to_string(),
                    }));
                }
                Err(e) => return Some(Err(GeofeedError::Io(e))),
            };
            self.line += 1;

            let content = if self.line == 1 {
                content.trim_start_matches(BYTE_ORDER_MARK).to_string()
            } else {
                content
            };

            let trimmed = content.trim_start();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
                continue;
            }

            return Some(self.parse_line(&content));
        }
    }
}

/// Parse the ASN column, accepting an optional `AS` prefix
fn parse_asn(raw: &str) -> Result<Option<u32>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    let digits = raw
        .strip_prefix("AS")
        .or_else(|| raw.strip_prefix("as"))
        .unwrap_or(raw);
    digits
        .parse::<u32>()
        .map(Some)
        .map_err(|_| format!("invalid ASN '{}'", raw))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(data: &str, format: GeofeedFormat) -> Vec<GeofeedResult<CorrectionRecord>> {
        GeofeedReader::new(data.as_bytes(), format).collect()
    }

    #[test]
    fn test_parse_standard_rows() {
        let data = "\
# geofeed for example.net
192.0.2.0/24,US,US-CA,Los Angeles,90001

2001:db8::/32,GB,GB-ENG,London,
";
        let records: Vec<_> = read_all(data, GeofeedFormat::Standard)
            .into_iter()
            .collect::<GeofeedResult<_>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].network.to_string(), "192.0.2.0/24");
        assert_eq!(records[0].country_code, "US");
        assert_eq!(records[0].region_code, "US-CA");
        assert_eq!(records[0].city_name, "Los Angeles");
        assert_eq!(records[0].postal_code, "90001");
        assert_eq!(records[0].asn, None);

        assert_eq!(records[1].line, 4);
        assert_eq!(records[1].postal_code, "");
    }

    #[test]
    fn test_leading_whitespace_trimmed() {
        let data = "198.51.100.1, US,  US-NY, New York City, 10001\r\n";
        let record = read_all(data, GeofeedFormat::Standard)
            .pop()
            .unwrap()
            .unwrap();
        assert_eq!(record.network.to_string(), "198.51.100.1/32");
        assert_eq!(record.country_code, "US");
        assert_eq!(record.region_code, "US-NY");
        assert_eq!(record.city_name, "New York City");
        assert_eq!(record.postal_code, "10001");
    }

    #[test]
    fn test_quoted_city_with_comma() {
        let data = "192.0.2.0/24,US,US-DC,\"Washington, D.C.\",20001\n";
        let record = read_all(data, GeofeedFormat::Standard)
            .pop()
            .unwrap()
            .unwrap();
        assert_eq!(record.city_name, "Washington, D.C.");
    }

    #[test]
    fn test_wrong_field_count_names_line() {
        let data = "192.0.2.0/24,US,US-CA,Los Angeles,90001\n192.0.2.128/25,US,US-CA,Los Angeles\n";
        let results = read_all(data, GeofeedFormat::Standard);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(GeofeedError::MalformedRecord {
                line,
                content,
                reason,
            }) => {
                assert_eq!(*line, 2);
                assert_eq!(content, "192.0.2.128/25,US,US-CA,Los Angeles");
                assert!(reason.contains("expected 5 fields, found 4"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_asn_column() {
        let data = "192.0.2.0/24,US,US-CA,Los Angeles,90001,64496\n192.0.2.1,US,US-CA,Los Angeles,90001,AS64497\n192.0.2.2,US,US-CA,Los Angeles,90001,\n";
        let records: Vec<_> = read_all(data, GeofeedFormat::WithAsn)
            .into_iter()
            .collect::<GeofeedResult<_>>()
            .unwrap();
        assert_eq!(records[0].asn, Some(64496));
        assert_eq!(records[1].asn, Some(64497));
        assert_eq!(records[2].asn, None);

        // five columns are not enough once the ASN column is expected
        let data = "192.0.2.0/24,US,US-CA,Los Angeles,90001\n";
        assert!(matches!(
            read_all(data, GeofeedFormat::WithAsn).pop(),
            Some(Err(GeofeedError::MalformedRecord { line: 1, .. }))
        ));
    }

    #[test]
    fn test_invalid_asn() {
        let data = "192.0.2.0/24,US,US-CA,Los Angeles,90001,notanasn\n";
        let result = read_all(data, GeofeedFormat::WithAsn).pop().unwrap();
        assert!(matches!(
            result,
            Err(GeofeedError::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_network() {
        let data = "# header\n999.0.2.0/24,US,US-CA,Los Angeles,90001\n";
        match read_all(data, GeofeedFormat::Standard).pop().unwrap() {
            Err(GeofeedError::InvalidNetwork { line, network }) => {
                assert_eq!(line, 2);
                assert_eq!(network, "999.0.2.0/24");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_byte_order_mark_before_comment() {
        let data = "\u{feff}# network,country,region,city,postal\n192.0.2.0/24,US,US-CA,Los Angeles,90001\n";
        let records: Vec<_> = read_all(data, GeofeedFormat::Standard)
            .into_iter()
            .collect::<GeofeedResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, 2);

        let data = "\u{feff}192.0.2.0/24,US,US-CA,Los Angeles,90001\n";
        let record = read_all(data, GeofeedFormat::Standard)
            .pop()
            .unwrap()
            .unwrap();
        assert_eq!(record.network.to_string(), "192.0.2.0/24");
    }

    #[test]
    fn test_invalid_utf8_names_line() {
        let data: &[u8] = b"192.0.2.0/24,US,US-CA,Los Angeles,90001\n192.0.2.0/24,US,US-CA,Los \xff Angeles,90001\n";
        let results: Vec<_> = GeofeedReader::new(data, GeofeedFormat::Standard).collect();
        assert!(results[0].is_ok());
        match &results[1] {
            Err(GeofeedError::MalformedRecord { line, .. }) => assert_eq!(*line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_only_comments_and_blanks() {
        let data = "# nothing here\n\n   \n#192.0.2.0/24,US,US-CA,Los Angeles,90001\n";
        assert!(read_all(data, GeofeedFormat::Standard).is_empty());
    }

    #[test]
    fn test_parse_asn() {
        assert_eq!(parse_asn(""), Ok(None));
        assert_eq!(parse_asn("13335"), Ok(Some(13335)));
        assert_eq!(parse_asn("AS13335"), Ok(Some(13335)));
        assert_eq!(parse_asn("as13335"), Ok(Some(13335)));
        assert!(parse_asn("-1").is_err());
        assert!(parse_asn("4294967296").is_err());
    }
}
