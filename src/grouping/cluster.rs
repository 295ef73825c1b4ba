//! Partitioning of the overlap graph into clusters.
//!
//! Nodes with fewer than `min_neighbors` neighbors are noise: they carry no
//! label and do not connect other nodes. The remaining nodes are grouped by
//! transitive closure of the adjacency relation. [`flood_fill`] and
//! [`union_find`] yield the same membership; label numbering may differ.

use super::adjacency::Adjacency;
use rayon::prelude::*;
use std::sync::atomic::Ordering;

/// Cluster label per node, `None` for noise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clustering {
    labels: Vec<Option<u32>>,
    cluster_count: usize,
}

impl Clustering {
    /// Wraps labels numbered `0..cluster_count`.
    pub fn from_labels(labels: Vec<Option<u32>>) -> Self {
        let cluster_count = labels
            .iter()
            .flatten()
            .map(|&l| l as usize + 1)
            .max()
            .unwrap_or(0);
        Self {
            labels,
            cluster_count,
        }
    }

    #[inline]
    pub fn labels(&self) -> &[Option<u32>] {
        &self.labels
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }

    /// Member indices per cluster, each sorted ascending.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.cluster_count];
        for (node, label) in self.labels.iter().enumerate() {
            if let Some(l) = label {
                groups[*l as usize].push(node);
            }
        }
        groups
    }
}

#[inline]
fn eligible(adj: &Adjacency<'_>, node: usize, min_neighbors: u32) -> bool {
    adj.neighbor_count(node) >= min_neighbors as usize
}

/// Concurrent mark-and-expand. Every seed grows its cluster one frontier at
/// a time; a node joins the first frontier that flips its mark.
pub fn flood_fill(adj: &Adjacency<'_>, min_neighbors: u32) -> Clustering {
    let n = adj.len();
    let marks = adj.marks();
    marks
        .par_iter()
        .for_each(|m| m.store(false, Ordering::Relaxed));
    let mut labels = vec![None; n];
    let mut next_label = 0u32;

    for seed in 0..n {
        if !eligible(adj, seed, min_neighbors) || marks[seed].swap(true, Ordering::AcqRel) {
            continue;
        }
        let mut frontier = vec![seed];
        while !frontier.is_empty() {
            for &node in &frontier {
                labels[node] = Some(next_label);
            }
            frontier = frontier
                .par_iter()
                .flat_map_iter(|&node| {
                    adj.neighbors(node).filter(|&j| {
                        eligible(adj, j, min_neighbors) && !marks[j].swap(true, Ordering::AcqRel)
                    })
                })
                .collect();
        }
        next_label += 1;
    }

    Clustering {
        labels,
        cluster_count: next_label as usize,
    }
}

/// Sequential weighted union-find with path compression.
pub fn union_find(adj: &Adjacency<'_>, min_neighbors: u32) -> Clustering {
    let n = adj.len();
    let mut sets = DisjointSets::new(n);
    for a in 0..n {
        if !eligible(adj, a, min_neighbors) {
            continue;
        }
        for b in adj.neighbors(a) {
            if b > a && eligible(adj, b, min_neighbors) {
                sets.union(a, b);
            }
        }
    }

    let mut root_labels: Vec<Option<u32>> = vec![None; n];
    let mut labels = vec![None; n];
    let mut next_label = 0u32;
    for node in 0..n {
        if !eligible(adj, node, min_neighbors) {
            continue;
        }
        let root = sets.find(node);
        let label = *root_labels[root].get_or_insert_with(|| {
            next_label += 1;
            next_label - 1
        });
        labels[node] = Some(label);
    }

    Clustering {
        labels,
        cluster_count: next_label as usize,
    }
}

struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
    }
}
