use tracing::debug;

use crate::address::Address;
use crate::common::{hash_sorted_pair, Hash32};
use crate::error::{Result, WhitelistError};
use crate::leaf::encode_leaves;

/// A binary Merkle tree over an ordered leaf set.
///
/// Every layer is kept, from the leaves (layer 0) up to the single root, so
/// proofs are read directly from stored nodes. Two rules fix the layout:
///
/// - siblings are hashed with [`hash_sorted_pair`], so proofs carry no
///   left/right flags;
/// - when a layer has an odd number of nodes the last one is promoted to the
///   next layer unchanged. It is never hashed with a copy of itself.
///
/// The tree is order-sensitive: reordering leaves changes the root. Callers
/// that want a set commitment must sort the leaves first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    layers: Vec<Vec<Hash32>>,
}

impl MerkleTree {
    /// Builds the tree bottom-up from `leaves`.
    ///
    /// # Errors
    /// Returns `EmptyLeafSet` if `leaves` is empty.
    pub fn build(leaves: Vec<Hash32>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(WhitelistError::EmptyLeafSet);
        }

        let mut layers: Vec<Vec<Hash32>> = vec![leaves];
        while layers[layers.len() - 1].len() > 1 {
            let next_level = next_layer(&layers[layers.len() - 1]);
            layers.push(next_level);
        }

        debug!(
            leaves = layers[0].len(),
            depth = layers.len() - 1,
            "built merkle tree"
        );
        Ok(Self { layers })
    }

    pub fn from_addresses(addresses: &[Address]) -> Result<Self> {
        Self::build(encode_leaves(addresses))
    }

    pub fn root(&self) -> Hash32 {
        // build() guarantees a final layer holding exactly one node
        self.layers[self.layers.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of layers above the leaves; 0 for a single-leaf tree.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn leaves(&self) -> &[Hash32] {
        &self.layers[0]
    }

    pub fn layers(&self) -> &[Vec<Hash32>] {
        &self.layers
    }

    /// Index of the first occurrence of `leaf`.
    pub fn position(&self, leaf: &Hash32) -> Option<usize> {
        self.layers[0].iter().position(|candidate| candidate == leaf)
    }

    /// Generates the proof for the leaf at `leaf_index`.
    ///
    /// At each layer the sibling of the current node is recorded. A node with
    /// no sibling was promoted, so that layer adds nothing to the proof.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `leaf_index >= leaf_count()`.
    pub fn proof(&self, leaf_index: usize) -> Result<Vec<Hash32>> {
        if leaf_index >= self.leaf_count() {
            return Err(WhitelistError::IndexOutOfRange {
                index: leaf_index,
                leaf_count: self.leaf_count(),
            });
        }

        Ok(self.collect_proof(leaf_index))
    }

    /// Proofs for every leaf, in leaf order.
    pub fn proofs(&self) -> Vec<Vec<Hash32>> {
        (0..self.leaf_count())
            .map(|index| self.collect_proof(index))
            .collect()
    }

    fn collect_proof(&self, leaf_index: usize) -> Vec<Hash32> {
        let mut proof = Vec::with_capacity(self.depth());
        let mut current_index = leaf_index;

        for level in &self.layers[..self.layers.len() - 1] {
            let sibling_index = if current_index.is_multiple_of(2) {
                current_index + 1
            } else {
                current_index - 1
            };

            if let Some(sibling) = level.get(sibling_index) {
                proof.push(*sibling);
            }

            current_index /= 2;
        }

        proof
    }
}

fn next_layer(level: &[Hash32]) -> Vec<Hash32> {
    level
        .chunks(2)
        .map(|chunk| match chunk {
            [left, right] => hash_sorted_pair(left, right),
            [single] => *single,
            _ => unreachable!("chunks(2) yields one or two nodes"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::leaf_from_str;
    use crate::verify::verify_proof;

    const WHITELIST: [&str; 8] = [
        "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4",
        "0xAb8483F64d9C6d1EcF9b849Ae677dD3315835cb2",
        "0x4B20993Bc481177ec7E8f571ceCaE8A9e22C02db",
        "0x78731D3Ca6b7E34aC0F824c42a7cC18A495cabaB",
        "0x617F2E2fD72FD9D5503197092aC168c91465E7f2",
        "0x17F6AD8Ef982297579C203069C1DbfFE4348c372",
        "0x5c6B0f7Bf3E7ce046039Bd8FABdfD3f9F5021678",
        "0x03C6FcED478cBbC9a4FAB34eF9f40767739D1Ff7",
    ];

    fn whitelist_leaves(count: usize) -> Vec<Hash32> {
        WHITELIST[..count]
            .iter()
            .map(|addr| leaf_from_str(addr).unwrap())
            .collect()
    }

    #[test]
    fn test_build_empty_fails() {
        let result = MerkleTree::build(vec![]);
        assert!(matches!(result, Err(WhitelistError::EmptyLeafSet)));
    }

    #[test]
    fn test_single_leaf_tree() {
        let leaf = [9u8; 32];
        let tree = MerkleTree::build(vec![leaf]).unwrap();
        assert_eq!(tree.root(), leaf);
        assert_eq!(tree.depth(), 0);
        assert!(tree.proof(0).unwrap().is_empty());
        assert!(verify_proof(&leaf, &[], &tree.root()));
    }

    #[test]
    fn test_two_leaf_tree() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let tree = MerkleTree::build(vec![a, b]).unwrap();
        assert_eq!(tree.root(), hash_sorted_pair(&a, &b));
        assert_eq!(tree.proof(0).unwrap(), vec![b]);
        assert_eq!(tree.proof(1).unwrap(), vec![a]);
    }

    #[test]
    fn test_odd_layer_promotes_last_node() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];
        let tree = MerkleTree::build(vec![a, b, c]).unwrap();

        let ab = hash_sorted_pair(&a, &b);
        assert_eq!(tree.layers()[1], vec![ab, c]);
        assert_eq!(tree.root(), hash_sorted_pair(&ab, &c));
        assert_eq!(
            hex::encode(tree.root()),
            "1d614fa3c8de62938b0948972494f9a3858575db69ce1d34c77926f30732c981"
        );
        // duplication would have produced H(ab, H(c, c))
        assert_ne!(
            tree.root(),
            hash_sorted_pair(&ab, &hash_sorted_pair(&c, &c))
        );

        assert_eq!(tree.proof(2).unwrap(), vec![ab]);
        assert_eq!(tree.proof(0).unwrap(), vec![b, c]);
    }

    #[test]
    fn test_layer_sizes_follow_ceil_half() {
        let tree = MerkleTree::build(whitelist_leaves(5)).unwrap();
        let sizes: Vec<usize> = tree.layers().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 3, 2, 1]);
        assert_eq!(tree.depth(), 3);
        // the fifth leaf is promoted twice and paired only at the top
        assert_eq!(tree.proof(4).unwrap().len(), 1);
    }

    #[test]
    fn test_golden_roots() {
        let cases = [
            (3, "74f4666169faccda89a45d47ab1997a62f24c3cd534a01539db8f0e40d3eb8b1"),
            (5, "53c4e5e25bcbb26b82784b9793d8a74a02719aabab34c2d0358b26231e2f4bbe"),
            (8, "70b8e8088ae556faa07c4b4c972240935971ff7249949faf0cc1648dff84055b"),
        ];
        for (count, expected) in cases {
            let tree = MerkleTree::build(whitelist_leaves(count)).unwrap();
            assert_eq!(hex::encode(tree.root()), expected, "{} leaves", count);
        }
    }

    #[test]
    fn test_all_proofs_verify() {
        for count in 1..=WHITELIST.len() {
            let tree = MerkleTree::build(whitelist_leaves(count)).unwrap();
            for (i, proof) in tree.proofs().iter().enumerate() {
                assert!(
                    verify_proof(&tree.leaves()[i], proof, &tree.root()),
                    "leaf {} of {}",
                    i,
                    count
                );
            }
        }
    }

    #[test]
    fn test_proof_out_of_bounds() {
        let tree = MerkleTree::build(whitelist_leaves(2)).unwrap();
        let result = tree.proof(2);
        assert!(matches!(
            result,
            Err(WhitelistError::IndexOutOfRange {
                index: 2,
                leaf_count: 2
            })
        ));
    }

    #[test]
    fn test_duplicate_leaves_remain_provable() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let tree = MerkleTree::build(vec![a, b, a]).unwrap();
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.position(&a), Some(0));
        let first = tree.proof(0).unwrap();
        let second = tree.proof(2).unwrap();
        assert_ne!(first, second);
        assert!(verify_proof(&a, &first, &tree.root()));
        assert!(verify_proof(&a, &second, &tree.root()));
    }

    #[test]
    fn test_from_addresses_matches_leaf_build() {
        let addresses: Vec<Address> = WHITELIST[..4]
            .iter()
            .map(|addr| Address::parse(addr).unwrap())
            .collect();
        let from_addresses = MerkleTree::from_addresses(&addresses).unwrap();
        let from_leaves = MerkleTree::build(whitelist_leaves(4)).unwrap();
        assert_eq!(from_addresses, from_leaves);
    }

    #[test]
    fn test_tree_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MerkleTree>();
    }
}
