//! Geofeed verification lens
//!
//! This module checks every correction of a geofeed against an
//! authoritative geolocation database and reports the ones that disagree
//! with the current mapping. Each row goes through the same stages, in
//! file order:
//!
//! 1. parse and normalize the network ([`crate::geofeed`])
//! 2. validate the region code ([`RegionNormalizer`])
//! 3. look up the authoritative record ([`GeoLookup`])
//! 4. compare country, region and city ([`diff()`])
//! 5. count the result ([`AggregationCollector`])
//!
//! Any failure aborts the whole run; no partial report is produced.
//!
//! # Example
//!
//! ```rust,ignore
//! use geofeed_verifier::lens::verify::{VerifyLens, VerifyOptions};
//! use geofeed_verifier::lens::utils::OutputFormat;
//! use geofeed_verifier::lookup::mmdb::MmdbCityLookup;
//!
//! let city = MmdbCityLookup::open("/usr/local/share/GeoIP/GeoIP2-City.mmdb")?;
//! let lens = VerifyLens::new(&city, None, VerifyOptions::default().with_lax(true));
//!
//! let report = lens.verify_path("geofeed.csv")?;
//! println!("{}", lens.format_report(&report, OutputFormat::Text));
//! ```

pub mod aggregate;
pub mod diff;

pub use aggregate::{AggregateCounts, AggregationCollector, AsnCount};
pub use diff::{diff, DiffField, DiffOutcome, GeoFields};

use crate::error::{GeofeedError, GeofeedResult};
use crate::geofeed::region::RegionNormalizer;
use crate::geofeed::{CorrectionRecord, GeofeedFormat, GeofeedReader};
use crate::lens::utils::OutputFormat;
use crate::lookup::{AsnLookup, GeoLookup, LookupResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// =============================================================================
// Types
// =============================================================================

/// Outcome of verifying a whole geofeed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyReport {
    pub counts: AggregateCounts,
    /// Discrepancies per ASN, most affected first
    pub asn_counts: Vec<AsnCount>,
    /// Discrepant records in file order
    pub differences: Vec<DiffOutcome>,
}

impl VerifyReport {
    /// The closing summary line of the text report
    pub fn summary(&self) -> String {
        format!(
            "Out of {} potential corrections, {} may be different than our current mappings",
            self.counts.total, self.counts.differences
        )
    }
}

// =============================================================================
// Args
// =============================================================================

/// Options controlling how a geofeed is read and compared
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Accept region codes without the country prefix
    #[serde(default)]
    pub lax: bool,
    /// Column layout of the geofeed
    #[serde(default)]
    pub format: GeofeedFormat,
}

impl VerifyOptions {
    /// Set lax region mode
    pub fn with_lax(mut self, lax: bool) -> Self {
        self.lax = lax;
        self
    }

    /// Set the geofeed column layout
    pub fn with_format(mut self, format: GeofeedFormat) -> Self {
        self.format = format;
        self
    }
}

/// Command-line arguments for the verify operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
pub struct VerifyArgs {
    /// Path to local geofeed file to verify
    #[cfg_attr(feature = "cli", clap(long = "gf", value_name = "PATH"))]
    pub geofeed: PathBuf,

    /// Path to MMDB file to compare geofeed file against
    #[cfg_attr(feature = "cli", clap(long, value_name = "PATH"))]
    pub db: Option<String>,

    /// Path to ISP or ASN MMDB file (optional)
    #[cfg_attr(feature = "cli", clap(long, value_name = "PATH"))]
    pub isp: Option<String>,

    /// Enable lax mode: geofeed's region code may be provided without country code prefix
    #[cfg_attr(feature = "cli", clap(long))]
    #[serde(default)]
    pub lax: bool,

    /// Geofeed rows carry a sixth column with the origin ASN
    #[cfg_attr(feature = "cli", clap(long))]
    #[serde(default)]
    pub asn_column: bool,

    /// Output format
    #[cfg_attr(feature = "cli", clap(short, long, default_value = "text"))]
    #[serde(default)]
    pub format: OutputFormat,
}

impl VerifyArgs {
    /// Create args for a geofeed path
    pub fn new(geofeed: impl Into<PathBuf>) -> Self {
        Self {
            geofeed: geofeed.into(),
            ..Default::default()
        }
    }

    /// Options for [`VerifyLens`] derived from these args
    pub fn options(&self) -> VerifyOptions {
        let format = if self.asn_column {
            GeofeedFormat::WithAsn
        } else {
            GeofeedFormat::Standard
        };
        VerifyOptions::default()
            .with_lax(self.lax)
            .with_format(format)
    }
}

// =============================================================================
// Lens
// =============================================================================

/// Geofeed verification lens
///
/// Holds borrowed lookup capabilities; the caller owns the databases and
/// decides how long they live.
pub struct VerifyLens<'a> {
    geo: &'a dyn GeoLookup,
    asn: Option<&'a dyn AsnLookup>,
    regions: RegionNormalizer,
    options: VerifyOptions,
}

impl<'a> VerifyLens<'a> {
    /// Create a new verification lens
    pub fn new(
        geo: &'a dyn GeoLookup,
        asn: Option<&'a dyn AsnLookup>,
        options: VerifyOptions,
    ) -> Self {
        Self {
            geo,
            asn,
            regions: RegionNormalizer::from_lax(options.lax),
            options,
        }
    }

    /// Verify a geofeed file on disk
    pub fn verify_path(&self, path: impl AsRef<Path>) -> GeofeedResult<VerifyReport> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GeofeedError::configuration(format!(
                "unable to open geofeed {}: {}",
                path.display(),
                e
            ))
        })?;
        info!("verifying geofeed {}", path.display());
        self.verify_reader(BufReader::new(file))
    }

    /// Verify a geofeed from any buffered reader
    pub fn verify_reader<R: BufRead>(&self, reader: R) -> GeofeedResult<VerifyReport> {
        let mut collector = AggregationCollector::new();
        let mut differences = Vec::new();

        for record in GeofeedReader::new(reader, self.options.format) {
            let record = record?;
            if let Some(outcome) = self.verify_record(&record, &mut collector)? {
                differences.push(outcome);
            }
        }

        let (counts, asn_counts) = collector.finalize();
        info!(
            "verified {} corrections, {} differ from the database ({} region mode)",
            counts.total,
            counts.differences,
            self.regions.mode()
        );

        Ok(VerifyReport {
            counts,
            asn_counts,
            differences,
        })
    }

    /// Run one record through normalize, lookup, diff and aggregate.
    ///
    /// Returns the outcome only when it differs from the database.
    fn verify_record(
        &self,
        record: &CorrectionRecord,
        collector: &mut AggregationCollector,
    ) -> GeofeedResult<Option<DiffOutcome>> {
        self.regions
            .check_suggested(record.line, &record.country_code, &record.region_code)?;

        let current = self.geo.lookup(&record.network)?;
        let outcome = diff(record, &current, &self.regions);

        if !outcome.has_difference() {
            debug!("line {}: {} matches", record.line, record.network);
            collector.observe(None, &outcome);
            return Ok(None);
        }

        let asn = self.resolve_asn(record, &current)?;
        debug!(
            "line {}: {} differs in {:?} (asn {:?})",
            record.line, record.network, outcome.fields, asn
        );
        collector.observe(asn, &outcome);

        Ok(Some(outcome))
    }

    /// ASN for a discrepant record: the geofeed column wins, then the
    /// enrichment source, then whatever the primary database returned.
    fn resolve_asn(
        &self,
        record: &CorrectionRecord,
        current: &LookupResult,
    ) -> GeofeedResult<Option<u32>> {
        if record.asn.is_some() {
            return Ok(record.asn);
        }
        if let Some(asn_lookup) = self.asn {
            if let Some(asn) = asn_lookup.lookup_asn(&record.network)? {
                return Ok(Some(asn));
            }
        }
        Ok(current.asn)
    }

    /// Format a report for display
    pub fn format_report(&self, report: &VerifyReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string(report).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let mut sections: Vec<String> = report
                    .differences
                    .iter()
                    .filter_map(DiffOutcome::render)
                    .collect();
                sections.push(report.summary());
                if !report.asn_counts.is_empty() {
                    let asn_lines: Vec<String> =
                        report.asn_counts.iter().map(|c| c.to_string()).collect();
                    sections.push(asn_lines.join("\n"));
                }
                sections.join("\n\n")
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
