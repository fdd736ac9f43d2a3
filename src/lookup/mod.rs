//! Authoritative geolocation lookups
//!
//! The verification pipeline never talks to a database directly. It is
//! handed a [`GeoLookup`] for the city data and, optionally, an
//! [`AsnLookup`] for autonomous-system enrichment. The MMDB-backed
//! implementations live in [`mmdb`] (feature `mmdb`); tests substitute
//! in-memory doubles.

#[cfg(feature = "mmdb")]
pub mod mmdb;

use crate::error::GeofeedResult;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// What the authoritative database currently says about a network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    /// ISO 3166-1 alpha-2 country code
    pub country_code: String,
    /// Bare subdivision code, e.g. `NY` (never country-prefixed)
    pub region_code: String,
    /// English city name, empty when the database has none
    pub city_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
}

impl LookupResult {
    pub fn new(
        country_code: impl Into<String>,
        region_code: impl Into<String>,
        city_name: impl Into<String>,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            region_code: region_code.into(),
            city_name: city_name.into(),
            asn: None,
        }
    }

    /// Attach an autonomous system number
    pub fn with_asn(mut self, asn: u32) -> Self {
        self.asn = Some(asn);
        self
    }
}

/// Primary geolocation source
pub trait GeoLookup {
    /// Look up the authoritative record for a network.
    ///
    /// Returns [`GeofeedError::LookupMiss`](crate::GeofeedError::LookupMiss)
    /// when the database has no entry, and
    /// [`GeofeedError::LookupFailed`](crate::GeofeedError::LookupFailed)
    /// when the query itself could not be answered.
    fn lookup(&self, network: &IpNet) -> GeofeedResult<LookupResult>;
}

/// Optional autonomous-system source, independent of the primary database
pub trait AsnLookup {
    /// ASN for a network, `None` when the source has no data for it
    fn lookup_asn(&self, network: &IpNet) -> GeofeedResult<Option<u32>>;
}
