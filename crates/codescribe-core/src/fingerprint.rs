//! Chunk hashing and binary hash-tree fingerprints.
//!
//! Every chunk is hashed independently with SHA-256 (hex encoded). The
//! ordered leaf hashes are folded bottom-up into a binary tree: adjacent
//! pairs are combined by hashing the concatenation of their hex strings,
//! and an unpaired trailing node is paired with itself.
//!
//! ```text
//!            root
//!          /      \
//!     H(h1+h2)   H(h3+h3)
//!      /   \       |
//!     h1   h2     h3
//! ```
//!
//! Special cases:
//! - no leaves → the root is [`EMPTY_ROOT`], a sentinel that is never valid
//!   hex and so can never collide with a computed digest;
//! - one leaf → the root is that leaf, without a combination step.
//!
//! Leaf order is significant: permuting the same leaves yields a different
//! root.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Root of a fingerprint over zero chunks.
pub const EMPTY_ROOT: &str = "empty";

/// Root plus ordered leaf hashes for one chunk sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub root: String,
    pub hashes: Vec<String>,
}

impl Fingerprint {
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Hex-encoded SHA-256 of `text`.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash every chunk and build the tree root over them.
pub fn fingerprint<S: AsRef<str>>(chunks: &[S]) -> Fingerprint {
    let hashes: Vec<String> = chunks.iter().map(|c| hash_text(c.as_ref())).collect();
    let root = tree_root(&hashes);
    Fingerprint { root, hashes }
}

/// Fold an ordered list of leaf hashes into a single root.
pub fn tree_root<S: AsRef<str>>(leaves: &[S]) -> String {
    match leaves {
        [] => EMPTY_ROOT.to_string(),
        [only] => only.as_ref().to_string(),
        _ => {
            let mut level: Vec<String> = leaves.iter().map(|h| h.as_ref().to_string()).collect();
            while level.len() > 1 {
                level = level
                    .chunks(2)
                    .map(|pair| {
                        let left = &pair[0];
                        let right = pair.get(1).unwrap_or(left);
                        combine(left, right)
                    })
                    .collect();
            }
            level.pop().unwrap_or_else(|| EMPTY_ROOT.to_string())
        }
    }
}

/// Parent digest of two sibling nodes.
pub fn combine(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence_uses_sentinel() {
        let fp = fingerprint::<&str>(&[]);
        assert!(fp.hashes.is_empty());
        assert!(fp.is_empty());
        assert_eq!(fp.root, EMPTY_ROOT);
        assert!(fp.root.len() != 64 || !fp.root.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_single_chunk_root_is_its_hash() {
        let fp = fingerprint(&["print('hi')"]);
        assert_eq!(fp.hashes, vec![hash_text("print('hi')")]);
        assert_eq!(fp.root, hash_text("print('hi')"));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_text("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_two_leaves() {
        let fp = fingerprint(&["a", "b"]);
        let (h1, h2) = (hash_text("a"), hash_text("b"));
        assert_eq!(fp.root, hash_text(&format!("{}{}", h1, h2)));
    }

    #[test]
    fn test_odd_level_duplicates_last_node() {
        let fp = fingerprint(&["one", "two", "three"]);
        let (h1, h2, h3) = (hash_text("one"), hash_text("two"), hash_text("three"));
        let left = hash_text(&format!("{}{}", h1, h2));
        let right = hash_text(&format!("{}{}", h3, h3));
        assert_eq!(fp.root, hash_text(&format!("{}{}", left, right)));
    }

    #[test]
    fn test_five_leaves() {
        let leaves: Vec<String> = (0..5).map(|i| hash_text(&i.to_string())).collect();
        let l1 = [
            combine(&leaves[0], &leaves[1]),
            combine(&leaves[2], &leaves[3]),
            combine(&leaves[4], &leaves[4]),
        ];
        let l2 = [combine(&l1[0], &l1[1]), combine(&l1[2], &l1[2])];
        assert_eq!(tree_root(&leaves), combine(&l2[0], &l2[1]));
    }

    #[test]
    fn test_same_text_same_hash_regardless_of_position() {
        let fp = fingerprint(&["dup", "other", "dup"]);
        assert_eq!(fp.hashes[0], fp.hashes[2]);
    }

    #[test]
    fn test_order_sensitive() {
        let a = fingerprint(&["first", "second"]);
        let b = fingerprint(&["second", "first"]);
        assert_ne!(a.root, b.root);
    }

    #[test]
    fn test_deterministic() {
        let chunks = vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()];
        assert_eq!(fingerprint(&chunks), fingerprint(&chunks));
    }
}
