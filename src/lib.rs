#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! geofeed-verifier - check geofeed corrections against a MaxMind DB
//!
//! Geofeeds (RFC 8805) list proposed geolocation corrections for IP
//! networks. This crate reads such a file, looks every network up in an
//! authoritative geolocation database and reports which corrections
//! disagree with the current mapping. It can be used as both a
//! command-line application and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `mmdb` | MaxMind DB backed lookups | `maxminddb` |
//! | `cli` | CLI binary | All above + `clap`, `tracing-subscriber` |
//!
//! ```toml
//! # Verification engine only, bring your own lookup
//! geofeed-verifier = { version = "0.1", default-features = false }
//!
//! # Engine plus MMDB adapters
//! geofeed-verifier = { version = "0.1", default-features = false, features = ["mmdb"] }
//! ```
//!
//! # Architecture
//!
//! - **[`geofeed`]**: row parsing, network and region normalization
//! - **[`lookup`]**: the lookup capabilities and their MMDB adapters
//! - **[`lens`]**: the verification pipeline, diffing and aggregation
//! - **[`config`]**: configuration management
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use geofeed_verifier::lens::verify::{VerifyLens, VerifyOptions};
//! use geofeed_verifier::lens::utils::OutputFormat;
//! use geofeed_verifier::lookup::mmdb::{MmdbAsnLookup, MmdbCityLookup};
//!
//! let city = MmdbCityLookup::open("/usr/local/share/GeoIP/GeoIP2-City.mmdb")?;
//! let isp = MmdbAsnLookup::open("/usr/local/share/GeoIP/GeoIP2-ISP.mmdb")?;
//!
//! let lens = VerifyLens::new(&city, Some(&isp), VerifyOptions::default());
//! let report = lens.verify_path("geofeed.csv")?;
//!
//! println!("{}", lens.format_report(&report, OutputFormat::Text));
//! ```

pub mod config;
pub mod error;
pub mod geofeed;
pub mod lens;
pub mod lookup;

pub use config::VerifierConfig;
pub use error::{GeofeedError, GeofeedResult};
pub use geofeed::{CorrectionRecord, GeofeedFormat, GeofeedReader};
pub use lens::utils::OutputFormat;
pub use lens::verify::{VerifyArgs, VerifyLens, VerifyOptions, VerifyReport};
pub use lookup::{AsnLookup, GeoLookup, LookupResult};
