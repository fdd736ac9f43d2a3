//! Run-wide counters for a verification pass

use super::diff::DiffOutcome;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Totals for a verification run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateCounts {
    /// Records that went through the pipeline
    pub total: u64,
    /// Records with at least one differing field
    pub differences: u64,
}

/// Number of discrepancies attributed to one autonomous system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnCount {
    pub asn: u32,
    pub count: u64,
}

impl std::fmt::Display for AsnCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ASN: {}, count: {}", self.asn, self.count)
    }
}

/// Accumulates counts as records flow through the pipeline
#[derive(Debug, Default)]
pub struct AggregationCollector {
    counts: AggregateCounts,
    asn_counts: HashMap<u32, u64>,
}

impl AggregationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed correction.
    ///
    /// ASN buckets only ever see discrepant records, so an ASN whose
    /// corrections all match the database never shows up.
    pub fn observe(&mut self, asn: Option<u32>, outcome: &DiffOutcome) {
        self.counts.total += 1;
        if !outcome.has_difference() {
            return;
        }

        self.counts.differences += 1;
        if let Some(asn) = asn {
            *self.asn_counts.entry(asn).or_insert(0) += 1;
        }
    }

    /// Final counts plus ASN buckets sorted by count descending, ASN ascending on ties
    pub fn finalize(self) -> (AggregateCounts, Vec<AsnCount>) {
        let mut asn_counts: Vec<AsnCount> = self
            .asn_counts
            .into_iter()
            .map(|(asn, count)| AsnCount { asn, count })
            .collect();
        asn_counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.asn.cmp(&b.asn)));

        (self.counts, asn_counts)
    }
}

#[cfg(test)]
mod tests {
    use super::super::diff::{DiffField, GeoFields};
    use super::*;

    fn outcome(differs: bool) -> DiffOutcome {
        DiffOutcome {
            network: "192.0.2.0/24".parse().unwrap(),
            line: 1,
            current: GeoFields::default(),
            suggested: GeoFields::default(),
            fields: if differs {
                vec![DiffField::City]
            } else {
                vec![]
            },
        }
    }

    #[test]
    fn test_counts() {
        let mut collector = AggregationCollector::new();
        collector.observe(None, &outcome(false));
        collector.observe(None, &outcome(true));
        collector.observe(Some(64496), &outcome(true));
        collector.observe(Some(64496), &outcome(false));

        let (counts, asns) = collector.finalize();
        assert_eq!(
            counts,
            AggregateCounts {
                total: 4,
                differences: 2
            }
        );
        assert_eq!(asns, vec![AsnCount { asn: 64496, count: 1 }]);
    }

    #[test]
    fn test_matching_asn_not_listed() {
        let mut collector = AggregationCollector::new();
        collector.observe(Some(64500), &outcome(false));
        let (_, asns) = collector.finalize();
        assert!(asns.is_empty());
    }

    #[test]
    fn test_asn_sorted_by_count() {
        let mut collector = AggregationCollector::new();
        for (asn, n) in [(64496, 1), (64497, 3), (64498, 2), (64499, 3)] {
            for _ in 0..n {
                collector.observe(Some(asn), &outcome(true));
            }
        }
        collector.observe(None, &outcome(true));

        let (counts, asns) = collector.finalize();
        let order: Vec<u32> = asns.iter().map(|c| c.asn).collect();
        assert_eq!(order, vec![64497, 64499, 64498, 64496]);

        let attributed: u64 = asns.iter().map(|c| c.count).sum();
        assert!(attributed <= counts.differences);
        assert_eq!(counts.differences, 10);
        assert_eq!(asns[0].to_string(), "ASN: 64497, count: 3");
    }
}
