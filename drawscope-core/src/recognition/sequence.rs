//! Prefix-tolerant index from token sequences to content ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Node {
    children: BTreeMap<u32, usize>,
    /// Ids whose sequence ends at this node, sorted.
    ids: Vec<u32>,
}

/// Trie over token sequences, stored as an arena of nodes.
///
/// A query matches every stored sequence where the shorter of the two is a
/// token-for-token prefix of the longer. Queried regions may be cropped or
/// partially occluded, so neither side has to be complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceTree {
    nodes: Vec<Node>,
}

impl Default for SequenceTree {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }
}

impl SequenceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sequence: &[u32], id: u32) {
        let mut node = 0;
        for &token in sequence {
            node = match self.nodes[node].children.get(&token) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert(token, child);
                    child
                }
            };
        }
        let ids = &mut self.nodes[node].ids;
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
    }

    /// Sorted, deduplicated ids of every prefix-compatible stored sequence.
    ///
    /// An empty result is a miss.
    pub fn find(&self, sequence: &[u32]) -> Vec<u32> {
        let mut out = Vec::new();
        let mut node = 0;
        let mut exhausted = true;

        for &token in sequence {
            match self.nodes[node].children.get(&token) {
                Some(&child) => {
                    node = child;
                    out.extend_from_slice(&self.nodes[node].ids);
                }
                None => {
                    exhausted = false;
                    break;
                }
            }
        }

        if exhausted && node != 0 {
            let mut stack: Vec<usize> = self.nodes[node].children.values().copied().collect();
            while let Some(n) = stack.pop() {
                out.extend_from_slice(&self.nodes[n].ids);
                stack.extend(self.nodes[n].children.values().copied());
            }
        }

        out.sort_unstable();
        out.dedup();
        out
    }

    /// Number of stored (sequence, id) end points.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(|n| n.ids.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: AsRef<[u32]>> FromIterator<(S, u32)> for SequenceTree {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut tree = SequenceTree::new();
        for (sequence, id) in iter {
            tree.insert(sequence.as_ref(), id);
        }
        tree
    }
}
