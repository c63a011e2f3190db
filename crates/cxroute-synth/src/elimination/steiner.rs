//! Steiner-Gauss: Gaussian elimination restricted to architecture edges.
//!
//! Each column is cleared by building a Steiner tree over the rows that hold
//! a 1 and walking it twice. Every row addition is between tree neighbours,
//! so every recorded CNOT is hardware-adjacent.
//!
//! Two variants exist. The iterative one eliminates pivots in row-index
//! order and needs every suffix `p..n` of the qubit labelling to be
//! connected. The recursive one eliminates in the architecture's
//! [`reduce_order`](ConnectivityGraph::reduce_order), which has that
//! property by construction, and admits extra routing qubits during back
//! substitution. It only applies to full-rank square matrices; anything
//! else is reduced iteratively.
//!
//! Upper elimination fans the root row out to the terminals and leaves
//! every other tree node, recursion nodes included, net unchanged. The
//! qubits borrowed for routing therefore need no repair pass afterwards.

use cxroute_ir::{CnotCircuit, GF2Matrix};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::Recorder;
use crate::architecture::{ConnectivityGraph, SteinerDirection, SteinerTree};
use crate::eliminator::{Eliminator, resolve_architecture};
use crate::error::{SynthError, SynthResult};
use crate::trace::{TraceEvent, Tracer};

/// Pivot ordering used by [`SteinerGauss`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteinerVariant {
    /// Pivots in row-index order.
    Iterative,
    /// Pivots in the architecture's reduce order (full-rank square
    /// matrices; others fall back to [`Iterative`](Self::Iterative)).
    #[default]
    Recursive,
}

/// Gaussian elimination whose row operations follow Steiner trees.
#[derive(Debug, Clone)]
pub struct SteinerGauss {
    full_reduce: bool,
    variant: SteinerVariant,
    tracer: Tracer,
}

impl SteinerGauss {
    /// Create an eliminator using the recursive variant.
    pub fn new(full_reduce: bool) -> Self {
        Self {
            full_reduce,
            variant: SteinerVariant::default(),
            tracer: Tracer::disabled(),
        }
    }

    /// Select the pivot ordering.
    #[must_use]
    pub fn with_variant(mut self, variant: SteinerVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Forward row operations and pivot events to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// The configured variant.
    pub fn variant(&self) -> SteinerVariant {
        self.variant
    }
}

impl Default for SteinerGauss {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Eliminator for SteinerGauss {
    fn name(&self) -> &str {
        match self.variant {
            SteinerVariant::Iterative => "steiner_gauss",
            SteinerVariant::Recursive => "rec_steiner_gauss",
        }
    }

    fn reduce(
        &self,
        matrix: &mut GF2Matrix,
        architecture: Option<&ConnectivityGraph>,
        circuit: Option<&mut CnotCircuit>,
    ) -> SynthResult<usize> {
        let arch = resolve_architecture(architecture, matrix.rows())?;
        let mut rec = Recorder::new(matrix, circuit, &self.tracer);

        let rank = match self.variant {
            SteinerVariant::Recursive if is_full_rank_square(rec.matrix()) => {
                rec_steiner_gauss(&mut rec, &arch, self.full_reduce, &self.tracer)?
            }
            SteinerVariant::Recursive => {
                debug!(
                    rows = rec.matrix().rows(),
                    cols = rec.matrix().cols(),
                    "Matrix is not full-rank square; using iterative Steiner-Gauss"
                );
                steiner_gauss(&mut rec, &arch, self.full_reduce, &self.tracer)?
            }
            SteinerVariant::Iterative => {
                steiner_gauss(&mut rec, &arch, self.full_reduce, &self.tracer)?
            }
        };

        debug!(
            rank,
            cnots = rec.operations(),
            architecture = arch.name(),
            "Steiner-Gauss finished"
        );
        Ok(rank)
    }
}

fn is_full_rank_square(matrix: &GF2Matrix) -> bool {
    matrix.is_square() && matrix.rank() == matrix.rows()
}

/// Clear `column` along `tree` in the given direction.
///
/// `Lower` leaves a single 1 at the root and 0 on every other tree node.
/// `Upper` adds the root row to every tree node holding a 1 in `column`
/// and leaves the other tree nodes unchanged.
pub(crate) fn reduce_along(
    rec: &mut Recorder<'_>,
    tree: &SteinerTree,
    column: usize,
    direction: SteinerDirection,
) -> SynthResult<()> {
    match direction {
        SteinerDirection::Lower => eliminate_lower(rec, tree, column),
        SteinerDirection::Upper => eliminate_upper(rec, tree, column),
    }
}

fn eliminate_lower(rec: &mut Recorder<'_>, tree: &SteinerTree, column: usize) -> SynthResult<()> {
    // Steiner points holding 0 pick up a 1 from below.
    for (parent, child) in tree.postorder() {
        if !rec.get(parent, column) {
            rec.row_add(parent, child)?;
        }
    }
    // Then each node is cancelled by its parent.
    for (parent, child) in tree.postorder() {
        rec.row_add(child, parent)?;
    }

    if !rec.get(tree.root(), column) {
        return Err(SynthError::Structural(format!(
            "root {} holds 0 in column {column} after lower elimination",
            tree.root()
        )));
    }
    if let Some((_, child)) = tree.preorder().find(|&(_, c)| rec.get(c, column)) {
        return Err(SynthError::Structural(format!(
            "row {child} still holds a 1 in column {column} after lower elimination"
        )));
    }
    Ok(())
}

fn eliminate_upper(rec: &mut Recorder<'_>, tree: &SteinerTree, column: usize) -> SynthResult<()> {
    let root = tree.root();
    if !rec.get(root, column) {
        return Err(SynthError::Structural(format!(
            "root {root} holds 0 in column {column} before upper elimination"
        )));
    }

    let mut current = tree.prune(|q| rec.get(q, column));
    while !current.is_empty() {
        fan_out(rec, &current)?;
        // Nodes flipped from 0 to 1 need the root row once more.
        let next = current.prune(|q| q != root && rec.get(q, column));
        if next.len() >= current.len() {
            return Err(SynthError::Structural(format!(
                "upper elimination of column {column} did not converge"
            )));
        }
        current = next;
    }
    Ok(())
}

/// Add the root row to every non-root node of `tree`.
fn fan_out(rec: &mut Recorder<'_>, tree: &SteinerTree) -> SynthResult<()> {
    let root = tree.root();
    for (parent, child) in tree.postorder() {
        if parent != root {
            rec.row_add(child, parent)?;
        }
    }
    for (parent, child) in tree.preorder() {
        rec.row_add(child, parent)?;
    }
    Ok(())
}

/// Tree for back substitution inside `prefix`, admitting shortest-path
/// detours for terminals the prefix cannot reach.
fn back_substitution_tree(
    arch: &ConnectivityGraph,
    root: usize,
    terminals: &[usize],
    prefix: &[usize],
) -> SynthResult<SteinerTree> {
    let mut rec_nodes = Vec::new();
    for &t in terminals {
        if arch.shortest_path_within(root, t, prefix).is_none() {
            let path = arch.shortest_path(root, t).ok_or_else(|| {
                SynthError::Structural(format!("qubit {t} unreachable from {root}"))
            })?;
            rec_nodes.extend(path);
        }
    }
    if !rec_nodes.is_empty() {
        trace!(root, ?rec_nodes, "Admitting recursion nodes");
    }
    arch.rec_steiner_tree(root, terminals, prefix, &rec_nodes)
}

/// Pivots in row-index order.
fn steiner_gauss(
    rec: &mut Recorder<'_>,
    arch: &ConnectivityGraph,
    full_reduce: bool,
    tracer: &Tracer,
) -> SynthResult<usize> {
    let (rows, cols) = (rec.matrix().rows(), rec.matrix().cols());
    let mut pivot_cols = Vec::new();
    let mut pivot = 0;

    for column in 0..cols {
        if pivot >= rows {
            break;
        }
        let usable: Vec<usize> = (pivot..rows).collect();
        let terminals: Vec<usize> = usable
            .iter()
            .copied()
            .filter(|&r| r == pivot || rec.get(r, column))
            .collect();
        if terminals.len() == 1 && !rec.get(pivot, column) {
            continue;
        }
        let tree = arch.steiner_tree(pivot, &terminals, &usable)?;
        reduce_along(rec, &tree, column, SteinerDirection::Lower)?;
        tracer.emit(|| TraceEvent::PivotReduced { column, pivot });
        pivot_cols.push(column);
        pivot += 1;
    }

    if full_reduce {
        for (p, &column) in pivot_cols.iter().enumerate().rev() {
            let terminals: Vec<usize> = (0..=p).filter(|&r| r == p || rec.get(r, column)).collect();
            if terminals.len() == 1 {
                continue;
            }
            let prefix: Vec<usize> = (0..=p).collect();
            let tree = back_substitution_tree(arch, p, &terminals, &prefix)?;
            reduce_along(rec, &tree, column, SteinerDirection::Upper)?;
        }
    }
    Ok(pivot)
}

/// Pivots in the architecture's reduce order; requires a full-rank square
/// matrix.
///
/// Column `order[i]` is pivoted on row `order[i]`. The rows `order[i..]`
/// restricted to columns `order[i..]` stay invertible, so a pivot always
/// exists; a column without one is a structural error.
fn rec_steiner_gauss(
    rec: &mut Recorder<'_>,
    arch: &ConnectivityGraph,
    full_reduce: bool,
    tracer: &Tracer,
) -> SynthResult<usize> {
    let order = arch.reduce_order();

    for (i, &pivot) in order.iter().enumerate() {
        let usable = &order[i..];
        let terminals: Vec<usize> = usable
            .iter()
            .copied()
            .filter(|&r| r == pivot || rec.get(r, pivot))
            .collect();
        if terminals.len() == 1 && !rec.get(pivot, pivot) {
            return Err(SynthError::Structural(format!(
                "no pivot for column {pivot} among rows {usable:?}"
            )));
        }
        let tree = arch.steiner_tree(pivot, &terminals, usable)?;
        reduce_along(rec, &tree, pivot, SteinerDirection::Lower)?;
        tracer.emit(|| TraceEvent::PivotReduced {
            column: pivot,
            pivot,
        });
    }

    if full_reduce {
        for (i, &pivot) in order.iter().enumerate().rev() {
            let prefix = &order[..=i];
            let terminals: Vec<usize> = prefix
                .iter()
                .copied()
                .filter(|&r| r == pivot || rec.get(r, pivot))
                .collect();
            if terminals.len() == 1 {
                continue;
            }
            let tree = back_substitution_tree(arch, pivot, &terminals, prefix)?;
            reduce_along(rec, &tree, pivot, SteinerDirection::Upper)?;
        }
    }
    Ok(order.len())
}
