// crates/autonomy-kernel-core/src/core/merkle.rs
// ============================================================================
// Module: Merkle Evidence Builder
// Description: Domain-separated Merkle trees, inclusion proofs, and disclosure views.
// Purpose: Give evidence bundles tamper-evident, selectively disclosable integrity.
// Dependencies: serde, serde_json, sha2, crate::core::hashing
// ============================================================================

//! ## Overview
//! A [`MerkleBuilder`] collects ordered leaves, each a path label plus the
//! hash of canonical content, and folds them into an immutable
//! [`MerkleTree`]. Hashing is domain separated:
//!
//! - leaf: `SHA-256(0x00 || canonical bytes)`
//! - node: `SHA-256(0x01 || left || right)`
//!
//! so a leaf can never be passed off as an internal node or the reverse.
//! An unpaired trailing node is promoted to the next level unchanged.
//!
//! Proofs are self-contained: [`verify_proof`] needs only the claimed leaf
//! hash, the sibling list, and the claimed root. [`MerkleTree::derive_view`]
//! packages proofs (and optionally plaintext) for a subset of paths so an
//! approver can check revealed facts without seeing the rest of the bundle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hex_decode;
use crate::core::hashing::hex_encode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Merkle profile identifier.
pub const MERKLE_PROFILE_ID: &str = "merkle-v1";
/// Prefix byte for leaf hashes.
pub const LEAF_DOMAIN_SEPARATOR: u8 = 0x00;
/// Prefix byte for internal node hashes.
pub const NODE_DOMAIN_SEPARATOR: u8 = 0x01;

/// Raw SHA-256 node hash.
type NodeHash = [u8; 32];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Merkle construction and verification errors.
#[derive(Debug, Error)]
pub enum MerkleError {
    /// A tree needs at least one leaf.
    #[error("merkle: cannot build tree with no leaves")]
    Empty,
    /// Leaf content could not be canonicalized.
    #[error("merkle: failed to serialize leaf at {path}: {message}")]
    Canonicalization {
        /// Leaf path.
        path: String,
        /// Underlying error.
        message: String,
    },
    /// Leaf index is outside the tree.
    #[error("merkle: leaf index {index} out of range [0, {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Leaf count.
        len: usize,
    },
    /// A requested path is not in the tree.
    #[error("merkle: path {0} not found in tree")]
    PathNotFound(String),
    /// A hash in a proof is not a 32-byte hex value.
    #[error("merkle: invalid {field} hash: {message}")]
    InvalidHash {
        /// Which hash was malformed.
        field: &'static str,
        /// Decoder message.
        message: String,
    },
    /// Disclosed data could not be fetched.
    #[error("merkle: failed to get data for {path}: {message}")]
    DataUnavailable {
        /// Leaf path.
        path: String,
        /// Provider message.
        message: String,
    },
    /// A view proof does not bind to the view root.
    #[error("merkle: proof root mismatch for path {0}")]
    RootMismatch(String),
    /// A view proof does not verify.
    #[error("merkle: invalid proof for path {0}")]
    InvalidProof(String),
    /// An included path has no proof.
    #[error("merkle: no proof for included path {0}")]
    MissingProof(String),
    /// Disclosed data does not hash to the proven leaf.
    #[error("merkle: disclosed data for {0} does not match its leaf hash")]
    DataMismatch(String),
}

// ============================================================================
// SECTION: Hash Primitives
// ============================================================================

/// Computes `SHA-256(0x00 || data)`.
#[must_use]
pub fn leaf_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_DOMAIN_SEPARATOR]);
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes `SHA-256(0x01 || left || right)`.
#[must_use]
pub fn node_hash(left: &[u8], right: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_DOMAIN_SEPARATOR]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Decodes a hex string into a node hash.
fn decode_node_hash(field: &'static str, value: &str) -> Result<NodeHash, MerkleError> {
    let bytes = hex_decode(value).map_err(|err| MerkleError::InvalidHash {
        field,
        message: err.to_string(),
    })?;
    NodeHash::try_from(bytes.as_slice()).map_err(|_| MerkleError::InvalidHash {
        field,
        message: format!("expected 32 bytes, got {}", bytes.len()),
    })
}

// ============================================================================
// SECTION: Leaves
// ============================================================================

/// One leaf of a Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleLeaf {
    /// Position in insertion order.
    pub index: usize,
    /// Path label (JSON pointer style, for example `/receipts/0`).
    pub path: String,
    /// Hex-encoded leaf hash.
    pub hash: String,
    /// Whether the leaf content is sealed (not disclosable in plaintext).
    pub sealed: bool,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Accumulates leaves in order and builds a [`MerkleTree`].
#[derive(Debug, Default)]
pub struct MerkleBuilder {
    /// Leaves added so far.
    leaves: Vec<MerkleLeaf>,
    /// Raw hashes parallel to `leaves`.
    hashes: Vec<NodeHash>,
}

impl MerkleBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            leaves: Vec::new(),
            hashes: Vec::new(),
        }
    }

    /// Adds a leaf from a serializable value, hashing its canonical JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`MerkleError::Canonicalization`] when the value cannot be serialized.
    pub fn add_leaf<T: Serialize + ?Sized>(
        &mut self,
        path: impl Into<String>,
        value: &T,
        sealed: bool,
    ) -> Result<(), MerkleError> {
        let path = path.into();
        let canonical = canonical_json_bytes(value).map_err(|err| MerkleError::Canonicalization {
            path: path.clone(),
            message: err.to_string(),
        })?;
        self.push(path, leaf_hash(&canonical), sealed);
        Ok(())
    }

    /// Adds a leaf from raw bytes.
    pub fn add_leaf_bytes(&mut self, path: impl Into<String>, data: &[u8], sealed: bool) {
        self.push(path.into(), leaf_hash(data), sealed);
    }

    /// Returns the number of leaves added.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns true when no leaves have been added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Folds the leaves into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`MerkleError::Empty`] when no leaves were added.
    pub fn build(self) -> Result<MerkleTree, MerkleError> {
        let Some(first) = self.hashes.first().copied() else {
            return Err(MerkleError::Empty);
        };
        let mut root = first;
        let mut level = self.hashes;
        let mut levels = Vec::new();
        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut pairs = level.chunks_exact(2);
            for pair in &mut pairs {
                next.push(node_hash(&pair[0], &pair[1]));
            }
            if let [odd] = pairs.remainder() {
                next.push(*odd);
            }
            levels.push(level);
            level = next;
        }
        if let Some(top) = level.first() {
            root = *top;
        }
        levels.push(level);
        Ok(MerkleTree {
            leaves: self.leaves,
            levels,
            root,
        })
    }

    /// Appends a leaf record.
    fn push(&mut self, path: String, hash: NodeHash, sealed: bool) {
        self.leaves.push(MerkleLeaf {
            index: self.leaves.len(),
            path,
            hash: hex_encode(&hash),
            sealed,
        });
        self.hashes.push(hash);
    }
}

// ============================================================================
// SECTION: Tree
// ============================================================================

/// Immutable Merkle tree with every level retained for proof generation.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Leaves in insertion order.
    leaves: Vec<MerkleLeaf>,
    /// Level 0 is the leaf level; the last level holds only the root.
    levels: Vec<Vec<NodeHash>>,
    /// Root hash.
    root: NodeHash,
}

impl MerkleTree {
    /// Returns the raw root hash.
    #[must_use]
    pub const fn root(&self) -> &[u8; 32] {
        &self.root
    }

    /// Returns the hex-encoded root hash.
    #[must_use]
    pub fn root_hex(&self) -> String {
        hex_encode(&self.root)
    }

    /// Returns the leaves in insertion order.
    #[must_use]
    pub fn leaves(&self) -> &[MerkleLeaf] {
        &self.leaves
    }

    /// Returns one leaf.
    #[must_use]
    pub fn leaf(&self, index: usize) -> Option<&MerkleLeaf> {
        self.leaves.get(index)
    }

    /// Returns the number of levels including the leaf and root levels.
    #[must_use]
    pub const fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Generates an inclusion proof for the leaf at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`MerkleError::IndexOutOfRange`] for an unknown index.
    pub fn generate_proof(&self, index: usize) -> Result<MerkleProof, MerkleError> {
        let Some(leaf) = self.leaves.get(index) else {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: self.leaves.len(),
            });
        };
        let mut siblings = Vec::new();
        let mut position = index;
        for level in self.levels.iter().take(self.levels.len().saturating_sub(1)) {
            let (sibling_index, side) = if position.is_multiple_of(2) {
                (position + 1, SiblingPosition::Right)
            } else {
                (position - 1, SiblingPosition::Left)
            };
            if let Some(sibling) = level.get(sibling_index) {
                siblings.push(MerkleSibling {
                    hash: hex_encode(sibling),
                    position: side,
                });
            }
            position /= 2;
        }
        Ok(MerkleProof {
            leaf_index: index,
            leaf_path: leaf.path.clone(),
            leaf_hash: leaf.hash.clone(),
            siblings,
            root: self.root_hex(),
        })
    }

    /// Derives a minimal-disclosure view holding proofs for `paths` only.
    ///
    /// # Errors
    ///
    /// Returns [`MerkleError::PathNotFound`] when a path is not in the tree.
    pub fn derive_view(
        &self,
        view_id: impl Into<String>,
        pack_id: impl Into<String>,
        paths: &[String],
    ) -> Result<EvidenceView, MerkleError> {
        self.derive_view_with_data(view_id, pack_id, paths, |_| Ok(None))
    }

    /// Derives a view and attaches plaintext returned by `get_data`.
    ///
    /// `get_data` returning `Ok(None)` omits plaintext for that path while
    /// keeping its proof. Sealed leaves never carry plaintext and `get_data`
    /// is not consulted for them.
    ///
    /// # Errors
    ///
    /// Returns [`MerkleError::PathNotFound`] for unknown paths and
    /// [`MerkleError::DataUnavailable`] when `get_data` fails.
    pub fn derive_view_with_data<F>(
        &self,
        view_id: impl Into<String>,
        pack_id: impl Into<String>,
        paths: &[String],
        mut get_data: F,
    ) -> Result<EvidenceView, MerkleError>
    where
        F: FnMut(&str) -> Result<Option<Value>, String>,
    {
        let index_by_path: BTreeMap<&str, usize> =
            self.leaves.iter().map(|leaf| (leaf.path.as_str(), leaf.index)).collect();
        let mut proofs = Vec::with_capacity(paths.len());
        let mut data = BTreeMap::new();
        for path in paths {
            let Some(index) = index_by_path.get(path.as_str()).copied() else {
                return Err(MerkleError::PathNotFound(path.clone()));
            };
            proofs.push(self.generate_proof(index)?);
            if self.leaves.get(index).is_some_and(|leaf| leaf.sealed) {
                continue;
            }
            let value = get_data(path).map_err(|message| MerkleError::DataUnavailable {
                path: path.clone(),
                message,
            })?;
            if let Some(value) = value {
                data.insert(path.clone(), value);
            }
        }
        Ok(EvidenceView {
            view_id: view_id.into(),
            pack_id: pack_id.into(),
            root_hash: self.root_hex(),
            included_paths: paths.to_vec(),
            proofs,
            data,
        })
    }
}

// ============================================================================
// SECTION: Proofs
// ============================================================================

/// Side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingPosition {
    /// Sibling is the left operand.
    Left,
    /// Sibling is the right operand.
    Right,
}

/// One sibling on a proof path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleSibling {
    /// Hex-encoded sibling hash.
    pub hash: String,
    /// Sibling position.
    pub position: SiblingPosition,
}

/// Inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Leaf index.
    pub leaf_index: usize,
    /// Leaf path label.
    pub leaf_path: String,
    /// Hex-encoded leaf hash.
    pub leaf_hash: String,
    /// Siblings from the leaf level upward.
    pub siblings: Vec<MerkleSibling>,
    /// Hex-encoded claimed root.
    pub root: String,
}

/// Verifies a proof by folding its siblings and comparing with the claimed root.
///
/// Returns `Ok(false)` when the recomputed root differs.
///
/// # Errors
///
/// Returns [`MerkleError::InvalidHash`] when any hash is not 32-byte hex.
pub fn verify_proof(proof: &MerkleProof) -> Result<bool, MerkleError> {
    let mut current = decode_node_hash("leaf", &proof.leaf_hash)?;
    for sibling in &proof.siblings {
        let sibling_hash = decode_node_hash("sibling", &sibling.hash)?;
        current = match sibling.position {
            SiblingPosition::Left => node_hash(&sibling_hash, &current),
            SiblingPosition::Right => node_hash(&current, &sibling_hash),
        };
    }
    let expected = decode_node_hash("root", &proof.root)?;
    Ok(current == expected)
}

// ============================================================================
// SECTION: Evidence Views
// ============================================================================

/// Minimal-disclosure view over a Merkle-committed evidence pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceView {
    /// View identifier.
    pub view_id: String,
    /// Source pack identifier.
    pub pack_id: String,
    /// Hex-encoded root of the full pack.
    pub root_hash: String,
    /// Paths disclosed by this view.
    pub included_paths: Vec<String>,
    /// One proof per included path.
    pub proofs: Vec<MerkleProof>,
    /// Plaintext for disclosed paths, keyed by path.
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
}

/// Verifies an evidence view.
///
/// Every included path needs a proof carrying the view root that verifies,
/// and every disclosed value must hash (canonically) to its proven leaf.
///
/// # Errors
///
/// Returns the first [`MerkleError`] encountered.
pub fn verify_view(view: &EvidenceView) -> Result<(), MerkleError> {
    let proofs_by_path: BTreeMap<&str, &MerkleProof> =
        view.proofs.iter().map(|proof| (proof.leaf_path.as_str(), proof)).collect();
    for path in &view.included_paths {
        if !proofs_by_path.contains_key(path.as_str()) {
            return Err(MerkleError::MissingProof(path.clone()));
        }
    }
    for proof in &view.proofs {
        if proof.root != view.root_hash {
            return Err(MerkleError::RootMismatch(proof.leaf_path.clone()));
        }
        if !verify_proof(proof)? {
            return Err(MerkleError::InvalidProof(proof.leaf_path.clone()));
        }
    }
    for (path, value) in &view.data {
        let Some(proof) = proofs_by_path.get(path.as_str()) else {
            return Err(MerkleError::MissingProof(path.clone()));
        };
        let canonical = canonical_json_bytes(value).map_err(|err| MerkleError::Canonicalization {
            path: path.clone(),
            message: err.to_string(),
        })?;
        if hex_encode(&leaf_hash(&canonical)) != proof.leaf_hash {
            return Err(MerkleError::DataMismatch(path.clone()));
        }
    }
    Ok(())
}
