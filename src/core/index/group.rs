//! Records and groups.

use crate::core::hasher::Signature;
use crate::core::scanner::ImageFile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Position of a group in the index arena, in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A hashed image. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Position of the source directory in argument order
    pub source_index: usize,
    /// The input directory the file was found under
    pub source_dir: PathBuf,
    /// Content fingerprint
    pub signature: Signature,
}

impl ImageRecord {
    pub fn new(file: ImageFile, signature: Signature) -> Self {
        Self {
            path: file.path,
            size: file.size,
            source_index: file.source_index,
            source_dir: file.source_dir,
            signature,
        }
    }

    /// Whether the file sits directly in `dir`. Files in subdirectories of
    /// `dir` are not inside it.
    pub fn is_inside(&self, dir: &Path) -> bool {
        self.path.parent() == Some(dir)
    }
}

/// Files believed to depict the same image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Members in arrival order; the first one is the representative
    pub members: Vec<ImageRecord>,
}

impl Group {
    pub(crate) fn new(id: GroupId, first: ImageRecord) -> Self {
        Self {
            id,
            members: vec![first],
        }
    }

    /// The member whose signature stands for the group
    pub fn representative(&self) -> &ImageRecord {
        &self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// False for any group built by the index, which creates a group with
    /// its first member
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of files that will be removed
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::ExactDigest;

    fn record(path: &str) -> ImageRecord {
        let path = PathBuf::from(path);
        ImageRecord {
            source_dir: path.parent().unwrap().to_path_buf(),
            path,
            size: 1,
            source_index: 0,
            signature: Signature::Exact(ExactDigest(7)),
        }
    }

    #[test]
    fn inside_means_direct_child() {
        let output = Path::new("/photos/main");
        assert!(record("/photos/main/a.png").is_inside(output));
        assert!(!record("/photos/main/inbox/b.png").is_inside(output));
        assert!(!record("/photos/other/c.png").is_inside(output));
    }

    #[test]
    fn new_group_starts_with_its_representative() {
        let group = Group::new(GroupId(3), record("/photos/a.png"));
        assert!(!group.is_empty());
        assert_eq!(group.len(), 1);
        assert_eq!(group.duplicate_count(), 0);
        assert_eq!(group.representative().path, PathBuf::from("/photos/a.png"));
    }
}
