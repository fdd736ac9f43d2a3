//! Field-by-field comparison of a correction against the database

use crate::geofeed::region::{same_code, RegionNormalizer};
use crate::geofeed::CorrectionRecord;
use crate::lookup::LookupResult;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// A geo field that takes part in the comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffField {
    Country,
    Region,
    City,
}

impl std::fmt::Display for DiffField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffField::Country => write!(f, "country"),
            DiffField::Region => write!(f, "region"),
            DiffField::City => write!(f, "city"),
        }
    }
}

/// Country, region and city as seen from one side of the comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoFields {
    pub country: String,
    pub region: String,
    pub city: String,
}

impl GeoFields {
    fn get(&self, field: DiffField) -> &str {
        match field {
            DiffField::Country => &self.country,
            DiffField::Region => &self.region,
            DiffField::City => &self.city,
        }
    }
}

/// Result of comparing one correction with its lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOutcome {
    pub network: IpNet,
    pub line: usize,
    /// Database values, region rendered in the correction's convention
    pub current: GeoFields,
    /// Values proposed by the geofeed
    pub suggested: GeoFields,
    /// Fields whose values differ
    pub fields: Vec<DiffField>,
}

impl DiffOutcome {
    pub fn has_difference(&self) -> bool {
        !self.fields.is_empty()
    }

    /// `(current, suggested)` for a field
    pub fn values(&self, field: DiffField) -> (&str, &str) {
        (self.current.get(field), self.suggested.get(field))
    }

    /// Human-readable block for a discrepant record, `None` when nothing differs
    pub fn render(&self) -> Option<String> {
        if !self.has_difference() {
            return None;
        }

        let mut lines = vec![format!("Found a potential improvement: '{}'", self.network)];
        for field in [DiffField::Country, DiffField::Region, DiffField::City] {
            let (current, suggested) = self.values(field);
            lines.push(format!("current {}: '{}'", field, current));
            lines.push(format!("suggested {}: '{}'", field, suggested));
            lines.push(String::new());
        }
        lines.pop();

        Some(lines.join("\n"))
    }
}

/// Compare a correction against the authoritative lookup.
///
/// Country, region and city are compared case-insensitively. A missing
/// English city name in the database compares as the empty string.
pub fn diff(
    record: &CorrectionRecord,
    lookup: &LookupResult,
    regions: &RegionNormalizer,
) -> DiffOutcome {
    let current = GeoFields {
        country: lookup.country_code.clone(),
        region: regions.current_region(
            &record.region_code,
            &lookup.country_code,
            &lookup.region_code,
        ),
        city: lookup.city_name.clone(),
    };
    let suggested = GeoFields {
        country: record.country_code.clone(),
        region: record.region_code.clone(),
        city: record.city_name.clone(),
    };

    let fields = [DiffField::Country, DiffField::Region, DiffField::City]
        .into_iter()
        .filter(|field| !same_code(current.get(*field), suggested.get(*field)))
        .collect();

    DiffOutcome {
        network: record.network,
        line: record.line,
        current,
        suggested,
        fields,
    }
}
