//! # Index Module
//!
//! Partitions hashed images into groups of the same content.
//!
//! ## Grouping
//! - **Exact** - a map from digest to group. Equal digests join, anything
//!   else starts a new group. O(1) per record.
//! - **Similar** - one representative hash per group (its first member).
//!   A record joins the group whose representative is closest, provided the
//!   distance is within the threshold; ties go to the earliest group.
//!   O(groups) per record.
//!
//! The index is a single-writer structure (`&mut self`). The pipeline hashes
//! in parallel and then feeds records here from one thread in scan order, so
//! group membership is race-free and identical from run to run.

mod group;

pub use group::{Group, GroupId, ImageRecord};

use crate::core::hasher::{DedupMode, ExactDigest, PerceptualHash, Signature, SignatureKind};
use crate::error::IndexError;
use std::collections::HashMap;
use tracing::trace;

enum Lookup {
    Exact(HashMap<ExactDigest, GroupId>),
    Similar {
        threshold: u32,
        /// Indexed by `GroupId`
        representatives: Vec<PerceptualHash>,
    },
}

/// Arena of groups plus a signature lookup structure
pub struct DedupIndex {
    groups: Vec<Group>,
    lookup: Lookup,
    records: usize,
}

impl DedupIndex {
    /// Create an empty index for one mode
    pub fn new(mode: DedupMode) -> Self {
        let lookup = match mode {
            DedupMode::Exact => Lookup::Exact(HashMap::new()),
            DedupMode::Similar { threshold } => Lookup::Similar {
                threshold,
                representatives: Vec::new(),
            },
        };

        Self {
            groups: Vec::new(),
            lookup,
            records: 0,
        }
    }

    fn expected_kind(&self) -> SignatureKind {
        match self.lookup {
            Lookup::Exact(_) => SignatureKind::Exact,
            Lookup::Similar { .. } => SignatureKind::Perceptual,
        }
    }

    /// Add a record to its group, creating the group if none matches.
    ///
    /// Returns the id of the group the record ended up in.
    pub fn insert(&mut self, record: ImageRecord) -> Result<GroupId, IndexError> {
        let next_id = GroupId(self.groups.len());
        let expected = self.expected_kind();

        let existing = match (&mut self.lookup, &record.signature) {
            (Lookup::Exact(by_digest), Signature::Exact(digest)) => {
                let id = *by_digest.entry(*digest).or_insert(next_id);
                (id != next_id).then_some(id)
            }
            (
                Lookup::Similar {
                    threshold,
                    representatives,
                },
                Signature::Perceptual(hash),
            ) => {
                let limit = *threshold;
                let closest = nearest(representatives, hash).filter(|&(_, d)| d <= limit);
                if closest.is_none() {
                    representatives.push(hash.clone());
                }
                closest.map(|(id, _)| id)
            }
            (_, signature) => {
                return Err(IndexError::ModeMismatch {
                    path: record.path.clone(),
                    expected: expected.name(),
                    found: signature.kind().name(),
                })
            }
        };

        self.records += 1;

        match existing {
            Some(id) => {
                trace!(path = %record.path.display(), group = %id, "joined group");
                self.groups[id.0].members.push(record);
                Ok(id)
            }
            None => {
                trace!(path = %record.path.display(), group = %next_id, "new group");
                self.groups.push(Group::new(next_id, record));
                Ok(next_id)
            }
        }
    }

    /// Look up a group by id
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    /// All groups in creation order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records inserted
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Consume the index, yielding the final partition
    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }
}

/// Closest representative; the earliest group wins ties
fn nearest(representatives: &[PerceptualHash], hash: &PerceptualHash) -> Option<(GroupId, u32)> {
    let mut best: Option<(GroupId, u32)> = None;
    for (i, candidate) in representatives.iter().enumerate() {
        let distance = candidate.distance(hash);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((GroupId(i), distance));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn record(path: &str, signature: Signature) -> ImageRecord {
        ImageRecord {
            path: PathBuf::from(path),
            size: 1,
            source_index: 0,
            source_dir: PathBuf::from("/"),
            signature,
        }
    }

    fn exact(path: &str, digest: u128) -> ImageRecord {
        record(path, Signature::Exact(ExactDigest(digest)))
    }

    fn similar(path: &str, bits: u64) -> ImageRecord {
        record(
            path,
            Signature::Perceptual(PerceptualHash::new(bits.to_be_bytes().to_vec())),
        )
    }

    #[test]
    fn exact_mode_groups_equal_digests() {
        let mut index = DedupIndex::new(DedupMode::Exact);
        let a = index.insert(exact("/a.png", 1)).unwrap();
        let b = index.insert(exact("/b.png", 2)).unwrap();
        let c = index.insert(exact("/c.png", 1)).unwrap();

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(index.len(), 2);
        assert_eq!(index.group(a).unwrap().len(), 2);
    }

    #[test]
    fn exact_mode_never_merges_near_digests() {
        let mut index = DedupIndex::new(DedupMode::Exact);
        index.insert(exact("/a.png", 0b1000)).unwrap();
        index.insert(exact("/b.png", 0b1001)).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn similar_mode_joins_within_threshold() {
        let mut index = DedupIndex::new(DedupMode::Similar { threshold: 2 });
        let a = index.insert(similar("/a.png", 0)).unwrap();
        let b = index.insert(similar("/b.png", 0b11)).unwrap();
        let c = index.insert(similar("/c.png", 0b111)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn similar_mode_compares_against_representative_only() {
        // b joins a (distance 2); c is 2 from b but 4 from a
        let mut index = DedupIndex::new(DedupMode::Similar { threshold: 2 });
        index.insert(similar("/a.png", 0)).unwrap();
        index.insert(similar("/b.png", 0b11)).unwrap();
        index.insert(similar("/c.png", 0b1111)).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.groups()[0].representative().path, PathBuf::from("/a.png"));
    }

    #[test]
    fn similar_mode_prefers_smallest_distance() {
        let mut index = DedupIndex::new(DedupMode::Similar { threshold: 3 });
        let far = index.insert(similar("/a.png", 0)).unwrap();
        let near = index.insert(similar("/b.png", 0b1111)).unwrap();
        // 3 bits from a, 1 bit from b
        let id = index.insert(similar("/c.png", 0b0111)).unwrap();

        assert_ne!(far, near);
        assert_eq!(id, near);
    }

    #[test]
    fn similar_mode_ties_go_to_earliest_group() {
        let mut index = DedupIndex::new(DedupMode::Similar { threshold: 2 });
        let first = index.insert(similar("/a.png", 0b0000)).unwrap();
        let second = index.insert(similar("/b.png", 0b1111)).unwrap();
        // distance 2 to both
        let id = index.insert(similar("/c.png", 0b0011)).unwrap();

        assert_ne!(first, second);
        assert_eq!(id, first);
    }

    #[test]
    fn zero_threshold_requires_identical_hash() {
        let mut index = DedupIndex::new(DedupMode::Similar { threshold: 0 });
        index.insert(similar("/a.png", 1)).unwrap();
        index.insert(similar("/b.png", 1)).unwrap();
        index.insert(similar("/c.png", 3)).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn mismatched_signature_is_rejected() {
        let mut index = DedupIndex::new(DedupMode::Exact);
        let error = index.insert(similar("/a.png", 0)).unwrap_err();

        assert!(matches!(error, IndexError::ModeMismatch { .. }));
        assert!(index.is_empty());
        assert_eq!(index.record_count(), 0);
    }

    #[test]
    fn groups_partition_all_records() {
        let mut index = DedupIndex::new(DedupMode::Similar { threshold: 4 });
        let inputs: Vec<u64> = (0..40u64).map(|i| i.wrapping_mul(0x9E37_79B9_7F4A_7C15)).collect();
        for (i, bits) in inputs.iter().enumerate() {
            index.insert(similar(&format!("/{}.png", i), *bits)).unwrap();
        }

        assert_eq!(index.record_count(), inputs.len());
        let groups = index.into_groups();
        let mut seen = HashSet::new();
        for group in &groups {
            assert!(!group.is_empty());
            for member in &group.members {
                assert!(seen.insert(member.path.clone()), "record in two groups");
            }
        }
        assert_eq!(seen.len(), inputs.len());
    }
}
