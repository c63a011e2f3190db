//! Hardware connectivity graphs and Steiner trees.
//!
//! A [`ConnectivityGraph`] describes which physical qubits may share a CNOT.
//! Every query takes and returns *qubit* indices, which are also the row
//! indices of the parity matrices being synthesized. The separate vertex
//! labelling only matters when a device numbers its qubits differently from
//! the order in which rows should be eliminated (see [`ConnectivityGraph::grid`]).
//!
//! # Example
//!
//! ```
//! use cxroute_synth::ConnectivityGraph;
//!
//! let line = ConnectivityGraph::line(4);
//! assert_eq!(line.distance(0, 3), Some(3));
//! assert_eq!(line.shortest_path(3, 1), Some(vec![3, 2, 1]));
//!
//! let tree = line.steiner_tree(0, &[0, 2], &[0, 1, 2, 3]).unwrap();
//! assert_eq!(tree.preorder().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
//! ```

use std::collections::VecDeque;

use cxroute_ir::{CnotCircuit, check_permutation, invert_permutation};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{Bfs, DfsPostOrder, NodeFiltered};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SynthError, SynthResult};

/// Serialized form of a [`ConnectivityGraph`].
///
/// Edges are given between *vertices*. `qubit_to_vertex[q]` names the vertex
/// that qubit `q` sits on; when omitted the labelling is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    /// Human-readable name.
    pub name: String,
    /// Number of physical qubits.
    pub num_qubits: usize,
    /// Coupled vertex pairs (undirected).
    pub edges: Vec<(usize, usize)>,
    /// Qubit to vertex labelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qubit_to_vertex: Option<Vec<usize>>,
}

/// Undirected qubit connectivity graph with cached shortest paths.
///
/// Immutable after construction and safe to share between worker threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ArchitectureSpec", into = "ArchitectureSpec")]
pub struct ConnectivityGraph {
    name: String,
    /// Vertex-indexed graph arena.
    graph: UnGraph<(), ()>,
    qubit_to_vertex: Vec<usize>,
    vertex_to_qubit: Vec<usize>,
    /// Sorted neighbour lists, qubit-indexed.
    adjacency: Vec<Vec<usize>>,
    /// All-pairs hop distances, `u32::MAX` when unreachable.
    dist: Vec<Vec<u32>>,
    /// `pred[s][t]` is the qubit before `t` on a shortest path from `s`.
    pred: Vec<Vec<u32>>,
    reduce_order: Vec<usize>,
}

const NONE: u32 = u32::MAX;

impl ConnectivityGraph {
    /// A path `0 - 1 - ... - n-1`.
    pub fn line(n: usize) -> Self {
        let edges: Vec<_> = (1..n).map(|q| (q - 1, q)).collect();
        Self::assemble(format!("line_{n}"), n, &edges, (0..n).collect())
    }

    /// A cycle `0 - 1 - ... - n-1 - 0`. Falls back to a line below 3 qubits.
    pub fn ring(n: usize) -> Self {
        let mut edges: Vec<_> = (1..n).map(|q| (q - 1, q)).collect();
        if n >= 3 {
            edges.push((0, n - 1));
        }
        Self::assemble(format!("ring_{n}"), n, &edges, (0..n).collect())
    }

    /// A `rows x cols` grid with snake qubit labelling.
    ///
    /// Vertices are numbered row-major. Qubits run left to right on even grid
    /// rows and right to left on odd ones, so consecutive qubits are always
    /// adjacent and every suffix of the qubit order stays connected.
    pub fn grid(rows: usize, cols: usize) -> Self {
        let n = rows * cols;
        let mut edges = Vec::with_capacity(2 * n);
        for r in 0..rows {
            for c in 0..cols {
                let v = r * cols + c;
                if c + 1 < cols {
                    edges.push((v, v + 1));
                }
                if r + 1 < rows {
                    edges.push((v, v + cols));
                }
            }
        }
        let qubit_to_vertex = (0..n)
            .map(|q| {
                let (r, k) = (q / cols, q % cols);
                let c = if r % 2 == 0 { k } else { cols - 1 - k };
                r * cols + c
            })
            .collect();
        Self::assemble(format!("grid_{rows}x{cols}"), n, &edges, qubit_to_vertex)
    }

    /// Every pair of qubits coupled.
    pub fn fully_connected(n: usize) -> Self {
        let edges: Vec<_> = (0..n)
            .flat_map(|a| (a + 1..n).map(move |b| (a, b)))
            .collect();
        Self::assemble(format!("fully_connected_{n}"), n, &edges, (0..n).collect())
    }

    /// An arbitrary coupling graph with qubit `q` on vertex `q`.
    pub fn from_edges(num_qubits: usize, edges: &[(usize, usize)]) -> SynthResult<Self> {
        Self::with_labelling("custom", num_qubits, edges, (0..num_qubits).collect())
    }

    /// An arbitrary coupling graph with an explicit qubit to vertex labelling.
    ///
    /// # Errors
    ///
    /// Fails if an edge is out of range or a self-loop, if the labelling is
    /// not a permutation, or if the graph is disconnected.
    pub fn with_labelling(
        name: impl Into<String>,
        num_qubits: usize,
        edges: &[(usize, usize)],
        qubit_to_vertex: Vec<usize>,
    ) -> SynthResult<Self> {
        let name = name.into();
        check_permutation(&qubit_to_vertex, num_qubits)?;
        for &(a, b) in edges {
            if a >= num_qubits || b >= num_qubits {
                return Err(SynthError::InvalidConfiguration(format!(
                    "edge ({a}, {b}) out of range for {num_qubits} qubits"
                )));
            }
            if a == b {
                return Err(SynthError::InvalidConfiguration(format!(
                    "self-loop on vertex {a}"
                )));
            }
        }
        let arch = Self::assemble(name, num_qubits, edges, qubit_to_vertex);
        if !arch.is_connected() {
            return Err(SynthError::DisconnectedArchitecture(arch.name));
        }
        Ok(arch)
    }

    /// Parse a JSON coupling list (see [`ArchitectureSpec`]).
    pub fn from_coupling_list(json: &str) -> SynthResult<Self> {
        let spec: ArchitectureSpec = serde_json::from_str(json)?;
        Self::try_from(spec)
    }

    fn assemble(
        name: String,
        num_qubits: usize,
        edges: &[(usize, usize)],
        qubit_to_vertex: Vec<usize>,
    ) -> Self {
        let mut normalized: Vec<_> = edges.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect();
        normalized.sort_unstable();
        normalized.dedup();

        let mut graph = UnGraph::with_capacity(num_qubits, normalized.len());
        for _ in 0..num_qubits {
            graph.add_node(());
        }
        let vertex_to_qubit = invert_permutation(&qubit_to_vertex);
        let mut adjacency = vec![Vec::new(); num_qubits];
        for &(a, b) in &normalized {
            graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
            let (qa, qb) = (vertex_to_qubit[a], vertex_to_qubit[b]);
            adjacency[qa].push(qb);
            adjacency[qb].push(qa);
        }
        for list in &mut adjacency {
            list.sort_unstable();
        }

        let mut arch = Self {
            name,
            graph,
            qubit_to_vertex,
            vertex_to_qubit,
            adjacency,
            dist: Vec::new(),
            pred: Vec::new(),
            reduce_order: Vec::new(),
        };
        arch.precompute_distances();
        arch.reduce_order = arch.compute_reduce_order();
        debug!(
            name = %arch.name,
            qubits = num_qubits,
            edges = normalized.len(),
            "Built connectivity graph"
        );
        arch
    }

    /// BFS from every qubit, filling the distance and predecessor tables.
    fn precompute_distances(&mut self) {
        let n = self.num_qubits();
        self.dist = vec![vec![NONE; n]; n];
        self.pred = vec![vec![NONE; n]; n];

        for src in 0..n {
            self.dist[src][src] = 0;
            let mut queue = VecDeque::from([src]);
            while let Some(current) = queue.pop_front() {
                for &neighbor in &self.adjacency[current] {
                    if self.dist[src][neighbor] == NONE {
                        self.dist[src][neighbor] = self.dist[src][current] + 1;
                        self.pred[src][neighbor] = current as u32;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
    }

    /// DFS post-order from qubit 0.
    ///
    /// A vertex finishes only after all of its DFS descendants, so every
    /// suffix of the order is closed under "DFS parent" and hence connected.
    fn compute_reduce_order(&self) -> Vec<usize> {
        let Some(&start) = self.qubit_to_vertex.first() else {
            return Vec::new();
        };
        let mut order = Vec::with_capacity(self.num_qubits());
        let mut dfs = DfsPostOrder::new(&self.graph, NodeIndex::new(start));
        while let Some(node) = dfs.next(&self.graph) {
            order.push(self.vertex_to_qubit[node.index()]);
        }
        order
    }

    /// Name of the architecture.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of physical qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.adjacency.len()
    }

    /// Vertex that qubit `qubit` sits on.
    pub fn qubit_to_vertex(&self, qubit: usize) -> usize {
        self.qubit_to_vertex[qubit]
    }

    /// Qubit sitting on `vertex`.
    pub fn vertex_to_qubit(&self, vertex: usize) -> usize {
        self.vertex_to_qubit[vertex]
    }

    /// Neighbours of `qubit` in ascending order.
    pub fn neighbors(&self, qubit: usize) -> &[usize] {
        &self.adjacency[qubit]
    }

    /// Whether `a` and `b` are coupled.
    #[inline]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|list| list.binary_search(&b).is_ok())
    }

    /// Coupled qubit pairs `(a, b)` with `a < b`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(a, list)| list.iter().filter(move |&&b| a < b).map(move |&b| (a, b)))
            .collect()
    }

    /// Whether every qubit can reach every other.
    pub fn is_connected(&self) -> bool {
        self.num_qubits() <= 1 || connected_components(&self.graph) == 1
    }

    /// The graph with every coupling reversed. Couplings are undirected, so
    /// this is a copy.
    pub fn transpose(&self) -> Self {
        self.clone()
    }

    /// Hop distance between two qubits, `None` if unreachable.
    pub fn distance(&self, a: usize, b: usize) -> Option<usize> {
        match self.dist[a][b] {
            NONE => None,
            d => Some(d as usize),
        }
    }

    /// A shortest path from `from` to `to`, both endpoints included.
    pub fn shortest_path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        self.distance(from, to)?;
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            current = self.pred[from][current] as usize;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// A shortest path from `from` to `to` that only visits `usable` qubits.
    pub fn shortest_path_within(
        &self,
        from: usize,
        to: usize,
        usable: &[usize],
    ) -> Option<Vec<usize>> {
        let allowed = self.mask(usable.iter().copied());
        if !allowed[from] || !allowed[to] {
            return None;
        }
        let mut parent = vec![usize::MAX; self.num_qubits()];
        parent[from] = from;
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if current == to {
                break;
            }
            for &neighbor in &self.adjacency[current] {
                if allowed[neighbor] && parent[neighbor] == usize::MAX {
                    parent[neighbor] = current;
                    queue.push_back(neighbor);
                }
            }
        }
        if parent[to] == usize::MAX {
            return None;
        }
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            current = parent[current];
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Fixed elimination order in which every suffix is connected.
    pub fn reduce_order(&self) -> &[usize] {
        &self.reduce_order
    }

    /// Qubits of `subset` whose removal keeps the rest of `subset` connected,
    /// in ascending order.
    pub fn non_cutting_vertices(&self, subset: &[usize]) -> Vec<usize> {
        let members: FxHashSet<NodeIndex> = subset
            .iter()
            .map(|&q| NodeIndex::new(self.qubit_to_vertex[q]))
            .collect();

        let mut result: Vec<usize> = subset
            .iter()
            .copied()
            .filter(|&q| {
                let removed = NodeIndex::new(self.qubit_to_vertex[q]);
                let rest = members.len() - 1;
                let Some(&start) = members.iter().find(|&&n| n != removed) else {
                    return true;
                };
                let view = NodeFiltered::from_fn(&self.graph, |n: NodeIndex| {
                    n != removed && members.contains(&n)
                });
                let mut bfs = Bfs::new(&view, start);
                let mut reached = 0;
                while bfs.next(&view).is_some() {
                    reached += 1;
                }
                reached == rest
            })
            .collect();
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Whether every gate of `circuit` acts on a coupled pair.
    pub fn supports(&self, circuit: &CnotCircuit) -> bool {
        circuit.qubits() == self.num_qubits()
            && circuit.gates().all(|g| self.has_edge(g.control, g.target))
    }

    /// Steiner tree connecting `root` to `terminals` inside `usable`.
    pub fn steiner_tree(
        &self,
        root: usize,
        terminals: &[usize],
        usable: &[usize],
    ) -> SynthResult<SteinerTree> {
        self.rec_steiner_tree(root, terminals, usable, &[])
    }

    /// Steiner tree connecting `root` to `terminals` inside `usable ∪ rec_nodes`.
    ///
    /// Terminals are attached one at a time, always the one nearest to the
    /// current tree, along a BFS shortest path. Ties go to the lowest qubit.
    ///
    /// # Errors
    ///
    /// [`SynthError::Structural`] if the root or a terminal lies outside the
    /// permitted set, or a terminal cannot be reached inside it.
    pub fn rec_steiner_tree(
        &self,
        root: usize,
        terminals: &[usize],
        usable: &[usize],
        rec_nodes: &[usize],
    ) -> SynthResult<SteinerTree> {
        let n = self.num_qubits();
        if let Some(&q) = usable.iter().chain(rec_nodes).find(|&&q| q >= n) {
            return Err(SynthError::Structural(format!(
                "qubit {q} out of range for architecture '{}'",
                self.name
            )));
        }
        let allowed = self.mask(usable.iter().chain(rec_nodes).copied());
        if root >= n || !allowed[root] {
            return Err(SynthError::Structural(format!(
                "Steiner root {root} is outside the usable qubits"
            )));
        }
        if let Some(&t) = terminals.iter().find(|&&t| t >= n || !allowed[t]) {
            return Err(SynthError::Structural(format!(
                "Steiner terminal {t} is outside the usable qubits"
            )));
        }

        let mut in_tree = vec![false; n];
        in_tree[root] = true;
        let mut pending = vec![false; n];
        let mut remaining = 0;
        for &t in terminals {
            if !in_tree[t] && !pending[t] {
                pending[t] = true;
                remaining += 1;
            }
        }

        let mut edges = Vec::new();
        while remaining > 0 {
            // Multi-source BFS from the whole tree to the nearest pending terminal.
            let mut parent = vec![usize::MAX; n];
            let mut queue: VecDeque<usize> = (0..n).filter(|&q| in_tree[q]).collect();
            let mut visited = in_tree.clone();
            let mut found = None;
            while let Some(current) = queue.pop_front() {
                if pending[current] {
                    found = Some(current);
                    break;
                }
                for &neighbor in &self.adjacency[current] {
                    if allowed[neighbor] && !visited[neighbor] {
                        visited[neighbor] = true;
                        parent[neighbor] = current;
                        queue.push_back(neighbor);
                    }
                }
            }
            let Some(terminal) = found else {
                let stranded: Vec<_> = (0..n).filter(|&q| pending[q]).collect();
                return Err(SynthError::Structural(format!(
                    "Steiner terminals {stranded:?} unreachable from root {root}"
                )));
            };

            let mut path = Vec::new();
            let mut current = terminal;
            while !in_tree[current] {
                path.push((parent[current], current));
                current = parent[current];
            }
            for &(p, c) in path.iter().rev() {
                in_tree[c] = true;
                edges.push((p, c));
                if pending[c] {
                    pending[c] = false;
                    remaining -= 1;
                }
            }
        }

        Ok(SteinerTree { root, edges })
    }

    fn mask(&self, qubits: impl IntoIterator<Item = usize>) -> Vec<bool> {
        let mut mask = vec![false; self.num_qubits()];
        for q in qubits {
            if let Some(slot) = mask.get_mut(q) {
                *slot = true;
            }
        }
        mask
    }
}

impl PartialEq for ConnectivityGraph {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.qubit_to_vertex == other.qubit_to_vertex
            && self.adjacency == other.adjacency
    }
}

impl Eq for ConnectivityGraph {}

impl TryFrom<ArchitectureSpec> for ConnectivityGraph {
    type Error = SynthError;

    fn try_from(spec: ArchitectureSpec) -> SynthResult<Self> {
        let labelling = spec
            .qubit_to_vertex
            .unwrap_or_else(|| (0..spec.num_qubits).collect());
        Self::with_labelling(spec.name, spec.num_qubits, &spec.edges, labelling)
    }
}

impl From<ConnectivityGraph> for ArchitectureSpec {
    fn from(arch: ConnectivityGraph) -> Self {
        let edges = arch
            .graph
            .edge_indices()
            .filter_map(|e| arch.graph.edge_endpoints(e))
            .map(|(a, b)| (a.index(), b.index()))
            .collect();
        let identity = arch.qubit_to_vertex.iter().enumerate().all(|(q, &v)| q == v);
        Self {
            name: arch.name,
            num_qubits: arch.adjacency.len(),
            edges,
            qubit_to_vertex: (!identity).then_some(arch.qubit_to_vertex),
        }
    }
}

/// Which way a Steiner tree reduction moves a column's ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteinerDirection {
    /// Clear every tree node except the root (below-diagonal elimination).
    Lower,
    /// Add the root row to every terminal, leaving Steiner points unchanged
    /// (above-diagonal elimination).
    Upper,
}

/// A rooted tree returned by [`ConnectivityGraph::steiner_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteinerTree {
    root: usize,
    /// `(parent, child)` pairs, parents before children.
    edges: Vec<(usize, usize)>,
}

impl SteinerTree {
    /// The root qubit.
    pub fn root(&self) -> usize {
        self.root
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether the tree is the bare root.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges with every parent listed before its children.
    pub fn preorder(&self) -> impl DoubleEndedIterator<Item = (usize, usize)> + '_ {
        self.edges.iter().copied()
    }

    /// Edges with every child listed before its parent.
    pub fn postorder(&self) -> impl DoubleEndedIterator<Item = (usize, usize)> + '_ {
        self.edges.iter().rev().copied()
    }

    /// Root followed by every child, in pre-order.
    pub fn nodes(&self) -> Vec<usize> {
        std::iter::once(self.root)
            .chain(self.edges.iter().map(|&(_, c)| c))
            .collect()
    }

    /// Whether `qubit` is in the tree.
    pub fn contains(&self, qubit: usize) -> bool {
        qubit == self.root || self.edges.iter().any(|&(_, c)| c == qubit)
    }

    /// The subtree spanned by the root and every node satisfying `keep`.
    pub fn prune(&self, keep: impl Fn(usize) -> bool) -> Self {
        let mut marked = FxHashSet::default();
        for (parent, child) in self.postorder() {
            if keep(child) || marked.contains(&child) {
                marked.insert(child);
                marked.insert(parent);
            }
        }
        Self {
            root: self.root,
            edges: self
                .edges
                .iter()
                .copied()
                .filter(|(_, c)| marked.contains(c))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_distances() {
        let line = ConnectivityGraph::line(5);
        assert_eq!(line.num_qubits(), 5);
        assert_eq!(line.distance(0, 4), Some(4));
        assert_eq!(line.distance(2, 2), Some(0));
        assert!(line.has_edge(1, 2));
        assert!(line.has_edge(2, 1));
        assert!(!line.has_edge(0, 2));
        assert_eq!(line.shortest_path(4, 1), Some(vec![4, 3, 2, 1]));
    }

    #[test]
    fn test_ring_wraps() {
        let ring = ConnectivityGraph::ring(6);
        assert!(ring.has_edge(0, 5));
        assert_eq!(ring.distance(0, 4), Some(2));
        assert_eq!(ring.edges().len(), 6);
    }

    #[test]
    fn test_grid_snake_labelling() {
        let grid = ConnectivityGraph::grid(3, 3);
        // Consecutive qubits are adjacent.
        for q in 1..9 {
            assert!(grid.has_edge(q - 1, q), "{} - {}", q - 1, q);
        }
        // Qubit 3 sits under qubit 2 after the snake turn.
        assert_eq!(grid.qubit_to_vertex(3), 5);
        assert_eq!(grid.vertex_to_qubit(5), 3);
        assert!(grid.has_edge(0, 5));
        assert_eq!(grid.edges().len(), 12);
    }

    #[test]
    fn test_fully_connected() {
        let full = ConnectivityGraph::fully_connected(5);
        assert_eq!(full.edges().len(), 10);
        assert!((0..5).all(|a| (0..5).all(|b| a == b || full.distance(a, b) == Some(1))));
    }

    #[test]
    fn test_disconnected_rejected() {
        let result = ConnectivityGraph::from_edges(4, &[(0, 1), (2, 3)]);
        assert!(matches!(result, Err(SynthError::DisconnectedArchitecture(_))));
    }

    #[test]
    fn test_invalid_edges_rejected() {
        assert!(ConnectivityGraph::from_edges(3, &[(0, 3)]).is_err());
        assert!(ConnectivityGraph::from_edges(3, &[(1, 1), (0, 1), (1, 2)]).is_err());
        assert!(
            ConnectivityGraph::with_labelling("bad", 3, &[(0, 1), (1, 2)], vec![0, 0, 1]).is_err()
        );
    }

    #[test]
    fn test_reduce_order_suffixes_connected() {
        for arch in [
            ConnectivityGraph::line(6),
            ConnectivityGraph::ring(7),
            ConnectivityGraph::grid(3, 4),
            ConnectivityGraph::from_edges(6, &[(0, 1), (0, 2), (0, 3), (3, 4), (3, 5)]).unwrap(),
        ] {
            let order = arch.reduce_order();
            assert_eq!(order.len(), arch.num_qubits());
            let mut sorted = order.to_vec();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..arch.num_qubits()).collect::<Vec<_>>());
            for i in 0..order.len() {
                let suffix = &order[i..];
                // Removing the first element of a connected suffix keeps it connected.
                assert!(arch.non_cutting_vertices(suffix).contains(&suffix[0]));
            }
        }
    }

    #[test]
    fn test_non_cutting_vertices() {
        let line = ConnectivityGraph::line(5);
        assert_eq!(line.non_cutting_vertices(&[0, 1, 2, 3, 4]), vec![0, 4]);
        assert_eq!(line.non_cutting_vertices(&[1, 2, 3]), vec![1, 3]);
        assert_eq!(line.non_cutting_vertices(&[2]), vec![2]);

        let ring = ConnectivityGraph::ring(5);
        assert_eq!(ring.non_cutting_vertices(&[0, 1, 2, 3, 4]), vec![0, 1, 2, 3, 4]);

        let star = ConnectivityGraph::from_edges(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        assert_eq!(star.non_cutting_vertices(&[0, 1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_steiner_tree_line() {
        let line = ConnectivityGraph::line(5);
        let tree = line.steiner_tree(1, &[0, 4], &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(tree.root(), 1);
        assert_eq!(
            tree.preorder().collect::<Vec<_>>(),
            vec![(1, 0), (1, 2), (2, 3), (3, 4)]
        );
        assert_eq!(
            tree.postorder().collect::<Vec<_>>(),
            vec![(3, 4), (2, 3), (1, 2), (1, 0)]
        );
        assert_eq!(tree.nodes(), vec![1, 0, 2, 3, 4]);
    }

    #[test]
    fn test_steiner_tree_respects_usable() {
        let ring = ConnectivityGraph::ring(6);
        // Going around the short way through 5 is forbidden.
        let tree = ring.steiner_tree(0, &[4], &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(tree.len(), 4);
        assert!(!tree.contains(5));

        let err = ring.steiner_tree(0, &[4], &[0, 1, 4]).unwrap_err();
        assert!(matches!(err, SynthError::Structural(_)));

        let rec = ring.rec_steiner_tree(0, &[4], &[0, 1, 4], &[5]).unwrap();
        assert_eq!(rec.preorder().collect::<Vec<_>>(), vec![(0, 5), (5, 4)]);
    }

    #[test]
    fn test_steiner_tree_rejects_outside_terminal() {
        let line = ConnectivityGraph::line(4);
        assert!(line.steiner_tree(1, &[0], &[1, 2, 3]).is_err());
        assert!(line.steiner_tree(0, &[1], &[1, 2]).is_err());
    }

    #[test]
    fn test_steiner_tree_leaves_are_terminals() {
        let grid = ConnectivityGraph::grid(3, 3);
        let all: Vec<_> = (0..9).collect();
        let terminals = [8, 2, 6];
        let tree = grid.steiner_tree(0, &terminals, &all).unwrap();
        let parents: FxHashSet<_> = tree.preorder().map(|(p, _)| p).collect();
        for (_, child) in tree.preorder() {
            if !parents.contains(&child) {
                assert!(terminals.contains(&child));
            }
        }
        for t in terminals {
            assert!(tree.contains(t));
        }
    }

    #[test]
    fn test_prune() {
        let line = ConnectivityGraph::line(5);
        let tree = line.steiner_tree(0, &[4], &[0, 1, 2, 3, 4]).unwrap();
        let pruned = tree.prune(|q| q == 2);
        assert_eq!(pruned.preorder().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
        assert!(tree.prune(|_| false).is_empty());
    }

    #[test]
    fn test_shortest_path_within() {
        let ring = ConnectivityGraph::ring(6);
        assert_eq!(ring.shortest_path(0, 4), Some(vec![0, 5, 4]));
        assert_eq!(
            ring.shortest_path_within(0, 4, &[0, 1, 2, 3, 4]),
            Some(vec![0, 1, 2, 3, 4])
        );
        assert_eq!(ring.shortest_path_within(0, 4, &[0, 1, 4]), None);
    }

    #[test]
    fn test_supports() {
        let line = ConnectivityGraph::line(3);
        let mut circuit = CnotCircuit::new(3);
        circuit.add_cnot(0, 1).unwrap().add_cnot(2, 1).unwrap();
        assert!(line.supports(&circuit));
        circuit.add_cnot(0, 2).unwrap();
        assert!(!line.supports(&circuit));
    }

    #[test]
    fn test_serde_roundtrip() {
        let grid = ConnectivityGraph::grid(2, 3);
        let json = serde_json::to_string(&grid).unwrap();
        let back: ConnectivityGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
        assert_eq!(back.reduce_order(), grid.reduce_order());
    }

    #[test]
    fn test_from_coupling_list() {
        let json = r#"{"name": "tee", "num_qubits": 4, "edges": [[0, 1], [1, 2], [1, 3]]}"#;
        let arch = ConnectivityGraph::from_coupling_list(json).unwrap();
        assert_eq!(arch.name(), "tee");
        assert_eq!(arch.neighbors(1), &[0, 2, 3]);

        let broken = r#"{"name": "split", "num_qubits": 4, "edges": [[0, 1]]}"#;
        assert!(ConnectivityGraph::from_coupling_list(broken).is_err());
    }
}
