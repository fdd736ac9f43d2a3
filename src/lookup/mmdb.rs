//! MaxMind DB backed lookups
//!
//! [`MmdbCityLookup`] reads a GeoIP2/GeoLite2 City (or Enterprise)
//! database; [`MmdbAsnLookup`] reads an ISP or ASN database. Each reader
//! owns its file contents and is dropped with the lookup.

use super::{AsnLookup, GeoLookup, LookupResult};
use crate::error::{GeofeedError, GeofeedResult};
use ipnet::IpNet;
use maxminddb::{geoip2, Reader};
use std::path::Path;
use tracing::{debug, warn};

/// Summary of a loaded database, for logging and reports
#[derive(Debug, Clone)]
pub struct MmdbInfo {
    pub path: String,
    pub database_type: String,
    pub build_epoch: u64,
}

impl std::fmt::Display for MmdbInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, build {})",
            self.path, self.database_type, self.build_epoch
        )
    }
}

fn open_reader(path: &Path) -> GeofeedResult<(Reader<Vec<u8>>, MmdbInfo)> {
    let reader = Reader::open_readfile(path).map_err(|e| {
        GeofeedError::configuration(format!(
            "unable to open MMDB file {}: {}",
            path.display(),
            e
        ))
    })?;

    let info = MmdbInfo {
        path: path.display().to_string(),
        database_type: reader.metadata.database_type.clone(),
        build_epoch: reader.metadata.build_epoch,
    };
    debug!("opened MMDB file {}", info.path);

    Ok((reader, info))
}

// =============================================================================
// City lookup
// =============================================================================

/// Primary lookup over a City database
pub struct MmdbCityLookup {
    reader: Reader<Vec<u8>>,
    info: MmdbInfo,
}

impl MmdbCityLookup {
    /// Open a City database from disk
    pub fn open(path: impl AsRef<Path>) -> GeofeedResult<Self> {
        let (reader, info) = open_reader(path.as_ref())?;
        if !info.database_type.contains("City") && !info.database_type.contains("Enterprise") {
            warn!(
                "database type '{}' may not carry city and subdivision data",
                info.database_type
            );
        }
        Ok(Self { reader, info })
    }

    pub fn info(&self) -> &MmdbInfo {
        &self.info
    }
}

impl GeoLookup for MmdbCityLookup {
    fn lookup(&self, network: &IpNet) -> GeofeedResult<LookupResult> {
        let ip = network.network();

        let found = self
            .reader
            .lookup(ip)
            .map_err(|e| GeofeedError::lookup_failed(network, e))?;
        if !found.has_data() {
            return Err(GeofeedError::LookupMiss {
                network: network.to_string(),
            });
        }

        let city: geoip2::City = found
            .decode()
            .map_err(|e| GeofeedError::lookup_failed(network, e))?
            .ok_or_else(|| GeofeedError::LookupMiss {
                network: network.to_string(),
            })?;

        let result = LookupResult {
            country_code: city.country.iso_code.unwrap_or_default().to_string(),
            region_code: city
                .subdivisions
                .first()
                .and_then(|s| s.iso_code)
                .unwrap_or_default()
                .to_string(),
            city_name: city.city.names.english.unwrap_or_default().to_string(),
            asn: None,
        };
        debug!("{} -> {:?}", network, result);

        Ok(result)
    }
}

// =============================================================================
// ASN lookup
// =============================================================================

/// ASN enrichment over an ISP or ASN database
pub struct MmdbAsnLookup {
    reader: Reader<Vec<u8>>,
    info: MmdbInfo,
}

impl MmdbAsnLookup {
    /// Open an ISP or ASN database from disk
    pub fn open(path: impl AsRef<Path>) -> GeofeedResult<Self> {
        let (reader, info) = open_reader(path.as_ref())?;
        Ok(Self { reader, info })
    }

    pub fn info(&self) -> &MmdbInfo {
        &self.info
    }
}

impl AsnLookup for MmdbAsnLookup {
    fn lookup_asn(&self, network: &IpNet) -> GeofeedResult<Option<u32>> {
        let found = self
            .reader
            .lookup(network.network())
            .map_err(|e| GeofeedError::lookup_failed(network, e))?;
        if !found.has_data() {
            debug!("no ASN data for {}", network);
            return Ok(None);
        }

        let asn = found
            .decode::<geoip2::Asn>()
            .map_err(|e| GeofeedError::lookup_failed(network, e))?
            .and_then(|record| record.autonomous_system_number);

        Ok(asn)
    }
}
