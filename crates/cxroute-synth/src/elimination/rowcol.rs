//! RowCol and PermRowCol vertex elimination.
//!
//! Each round removes one qubit from the remaining set `R` (and one column
//! from `C`):
//!
//! 1. pick a row among the non-cutting vertices of `R`, so the rest stays
//!    connected;
//! 2. clear its column along a Steiner tree rooted at that row;
//! 3. clear the row on the remaining columns by folding in the XOR
//!    combination of other remaining rows that matches it.
//!
//! RowCol pairs each row with the column of the same index. PermRowCol
//! chooses them independently and reports the resulting output permutation.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use cxroute_ir::{CnotCircuit, GF2Matrix, IrError, Layout, invert_permutation};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::Recorder;
use super::steiner::reduce_along;
use crate::architecture::{ConnectivityGraph, SteinerDirection, SteinerTree};
use crate::eliminator::{Eliminator, resolve_architecture};
use crate::error::{SynthError, SynthResult};
use crate::trace::{TraceEvent, Tracer};

/// Chooses which row to eliminate next.
pub trait RowStrategy: Send + Sync + fmt::Debug {
    /// Pick one of `candidates` (non-cutting rows, ascending), given the
    /// remaining `columns`.
    fn choose_row(&self, matrix: &GF2Matrix, candidates: &[usize], columns: &[usize])
    -> Option<usize>;
}

/// Chooses which column to pair with the selected row.
pub trait ColumnStrategy: Send + Sync + fmt::Debug {
    /// Pick one of `columns` for `row`, given the remaining `rows`.
    fn choose_column(
        &self,
        matrix: &GF2Matrix,
        row: usize,
        rows: &[usize],
        columns: &[usize],
    ) -> Option<usize>;
}

/// The candidate with the fewest ones on the remaining columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestOnesRow;

impl RowStrategy for FewestOnesRow {
    fn choose_row(
        &self,
        matrix: &GF2Matrix,
        candidates: &[usize],
        columns: &[usize],
    ) -> Option<usize> {
        candidates
            .iter()
            .copied()
            .min_by_key(|&r| (weight(columns, |c| matrix.get(r, c)), r))
    }
}

/// The lowest-index candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestIndexRow;

impl RowStrategy for LowestIndexRow {
    fn choose_row(&self, _: &GF2Matrix, candidates: &[usize], _: &[usize]) -> Option<usize> {
        candidates.iter().copied().min()
    }
}

/// Among the columns where the row holds a 1, the one with the fewest ones
/// on the remaining rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestOnesColumn;

impl ColumnStrategy for FewestOnesColumn {
    fn choose_column(
        &self,
        matrix: &GF2Matrix,
        row: usize,
        rows: &[usize],
        columns: &[usize],
    ) -> Option<usize> {
        columns
            .iter()
            .copied()
            .filter(|&c| matrix.get(row, c))
            .min_by_key(|&c| (weight(rows, |r| matrix.get(r, c)), c))
    }
}

fn weight(indices: &[usize], bit: impl Fn(usize) -> bool) -> usize {
    indices.iter().filter(|&&i| bit(i)).count()
}

/// Settings for best-first branching over (row, column) choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestFirst {
    /// Children generated per expanded state.
    pub branch_width: usize,
    /// States expanded before the cheapest open one is finished greedily.
    pub max_expansions: usize,
}

impl Default for BestFirst {
    fn default() -> Self {
        Self {
            branch_width: 2,
            max_expansions: 64,
        }
    }
}

/// Remaining rows and columns, plus the pairs removed so far.
#[derive(Debug, Clone)]
struct Progress {
    rows: Vec<usize>,
    columns: Vec<usize>,
    /// `output[col] = row` for every removed pair.
    output: Vec<usize>,
}

impl Progress {
    fn new(n: usize) -> Self {
        Self {
            rows: (0..n).collect(),
            columns: (0..n).collect(),
            output: vec![usize::MAX; n],
        }
    }

    fn remove(&mut self, row: usize, column: usize) {
        self.rows.retain(|&r| r != row);
        self.columns.retain(|&c| c != column);
        self.output[column] = row;
    }
}

/// Vertex elimination with the row and column index tied together.
#[derive(Debug, Clone, Default)]
pub struct RowCol {
    tracer: Tracer,
}

impl RowCol {
    /// Create a RowCol eliminator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward row operations and vertex events to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }
}

impl Eliminator for RowCol {
    fn name(&self) -> &str {
        "row_col"
    }

    fn reduce(
        &self,
        matrix: &mut GF2Matrix,
        architecture: Option<&ConnectivityGraph>,
        circuit: Option<&mut CnotCircuit>,
    ) -> SynthResult<usize> {
        let n = check_full_rank(matrix)?;
        let arch = resolve_architecture(architecture, n)?;
        let mut rec = Recorder::new(matrix, circuit, &self.tracer);
        let mut progress = Progress::new(n);

        run_greedy(&mut rec, &arch, &mut progress, |m, p, candidates| {
            LowestIndexRow
                .choose_row(m, candidates, &p.columns)
                .map(|q| (q, q))
        })?;
        debug!(cnots = rec.operations(), "RowCol finished");
        Ok(n)
    }
}

/// Vertex elimination with independent row and column choice.
#[derive(Debug)]
pub struct PermRowCol {
    row_strategy: Box<dyn RowStrategy>,
    column_strategy: Box<dyn ColumnStrategy>,
    best_first: Option<BestFirst>,
    tracer: Tracer,
}

impl PermRowCol {
    /// Create a PermRowCol eliminator using fewest-ones strategies.
    pub fn new() -> Self {
        Self {
            row_strategy: Box::new(FewestOnesRow),
            column_strategy: Box::new(FewestOnesColumn),
            best_first: None,
            tracer: Tracer::disabled(),
        }
    }

    /// Replace the row strategy.
    #[must_use]
    pub fn with_row_strategy(mut self, strategy: impl RowStrategy + 'static) -> Self {
        self.row_strategy = Box::new(strategy);
        self
    }

    /// Replace the column strategy.
    #[must_use]
    pub fn with_column_strategy(mut self, strategy: impl ColumnStrategy + 'static) -> Self {
        self.column_strategy = Box::new(strategy);
        self
    }

    /// Branch over several (row, column) choices per step.
    #[must_use]
    pub fn with_best_first(mut self, settings: BestFirst) -> Self {
        self.best_first = Some(settings);
        self
    }

    /// Forward row operations and vertex events to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Reduce `matrix` to a permutation matrix and return `output` with
    /// `output[col] = row` for the single 1 in each column.
    pub fn eliminate(
        &self,
        matrix: &mut GF2Matrix,
        architecture: Option<&ConnectivityGraph>,
        circuit: Option<&mut CnotCircuit>,
    ) -> SynthResult<Vec<usize>> {
        let n = check_full_rank(matrix)?;
        let arch = resolve_architecture(architecture, n)?;

        match self.best_first {
            Some(settings) => {
                let (ops, output) = self.search(matrix, &arch, settings)?;
                // Replay the winning branch in elimination order.
                let mut rec = Recorder::new(matrix, circuit, &self.tracer);
                for gate in ops.gates().rev() {
                    rec.row_add(gate.target, gate.control)?;
                }
                for (column, &row) in output.iter().enumerate() {
                    self.tracer
                        .emit(|| TraceEvent::VertexEliminated { row, column });
                }
                debug!(cnots = rec.operations(), "Best-first PermRowCol finished");
                Ok(output)
            }
            None => {
                let mut rec = Recorder::new(matrix, circuit, &self.tracer);
                let mut progress = Progress::new(n);
                run_greedy(&mut rec, &arch, &mut progress, |m, p, candidates| {
                    self.choose_pair(m, p, candidates)
                })?;
                debug!(cnots = rec.operations(), "PermRowCol finished");
                Ok(progress.output)
            }
        }
    }

    fn choose_pair(
        &self,
        matrix: &GF2Matrix,
        progress: &Progress,
        candidates: &[usize],
    ) -> Option<(usize, usize)> {
        let row = self
            .row_strategy
            .choose_row(matrix, candidates, &progress.columns)?;
        let column =
            self.column_strategy
                .choose_column(matrix, row, &progress.rows, &progress.columns)?;
        Some((row, column))
    }

    /// Best-first search over partial eliminations, cheapest first.
    fn search(
        &self,
        matrix: &GF2Matrix,
        arch: &ConnectivityGraph,
        settings: BestFirst,
    ) -> SynthResult<(CnotCircuit, Vec<usize>)> {
        let n = matrix.rows();
        let quiet = Tracer::disabled();
        let mut states = vec![Some(Branch {
            matrix: matrix.clone(),
            ops: CnotCircuit::new(n),
            progress: Progress::new(n),
        })];
        // Cheapest first, then deepest, then oldest.
        let mut open = BinaryHeap::from([Reverse((0, Reverse(0), 0))]);
        let mut expansions = 0;

        while let Some(Reverse((cost, Reverse(depth), id))) = open.pop() {
            let Some(mut branch) = states.get_mut(id).and_then(Option::take) else {
                continue;
            };

            if branch.progress.rows.len() <= 1 || expansions >= settings.max_expansions {
                let mut rec = Recorder::new(&mut branch.matrix, Some(&mut branch.ops), &quiet);
                run_greedy(&mut rec, arch, &mut branch.progress, |m, p, candidates| {
                    self.choose_pair(m, p, candidates)
                })?;
                debug!(cost, depth, expansions, "Best-first search settled");
                return Ok((branch.ops, branch.progress.output));
            }

            expansions += 1;
            let candidates = arch.non_cutting_vertices(&branch.progress.rows);
            // The greedy choice always comes first, so a large enough budget
            // never does worse than plain PermRowCol.
            let mut pairs: Vec<(usize, usize)> = self
                .choose_pair(&branch.matrix, &branch.progress, &candidates)
                .into_iter()
                .collect();
            for pair in ranked_pairs(&branch.matrix, &branch.progress, &candidates) {
                if pairs.len() >= settings.branch_width.max(1) {
                    break;
                }
                if !pairs.contains(&pair) {
                    pairs.push(pair);
                }
            }
            for (row, column) in pairs {
                let mut child = branch.clone();
                let mut rec = Recorder::new(&mut child.matrix, Some(&mut child.ops), &quiet);
                eliminate_vertex(
                    &mut rec,
                    arch,
                    row,
                    column,
                    &child.progress.rows,
                    &child.progress.columns,
                )?;
                child.progress.remove(row, column);
                let cost = child.ops.len();
                trace!(row, column, cost, depth = depth + 1, "Queued branch");
                open.push(Reverse((cost, Reverse(depth + 1), states.len())));
                states.push(Some(child));
            }
        }
        Err(SynthError::Structural(
            "best-first search ran out of states".into(),
        ))
    }
}

impl Default for PermRowCol {
    fn default() -> Self {
        Self::new()
    }
}

impl Eliminator for PermRowCol {
    fn name(&self) -> &str {
        "perm_row_col"
    }

    fn reduce(
        &self,
        matrix: &mut GF2Matrix,
        architecture: Option<&ConnectivityGraph>,
        mut circuit: Option<&mut CnotCircuit>,
    ) -> SynthResult<usize> {
        let output = self.eliminate(matrix, architecture, circuit.as_deref_mut())?;
        if let Some(circuit) = circuit {
            circuit.set_layout(Layout {
                row_perm: (0..output.len()).collect(),
                col_perm: invert_permutation(&output),
            })?;
        }
        Ok(output.len())
    }
}

#[derive(Debug, Clone)]
struct Branch {
    matrix: GF2Matrix,
    ops: CnotCircuit,
    progress: Progress,
}

/// Eligible (row, column) pairs, cheapest combined row and column weight first.
fn ranked_pairs(
    matrix: &GF2Matrix,
    progress: &Progress,
    candidates: &[usize],
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for &row in candidates {
        let row_weight = weight(&progress.columns, |c| matrix.get(row, c));
        for &column in &progress.columns {
            if matrix.get(row, column) {
                let column_weight = weight(&progress.rows, |r| matrix.get(r, column));
                pairs.push((row_weight + column_weight, row, column));
            }
        }
    }
    pairs.sort_unstable();
    pairs
        .into_iter()
        .map(|(_, row, column)| (row, column))
        .collect()
}

/// Size of a square, full-rank matrix.
fn check_full_rank(matrix: &GF2Matrix) -> SynthResult<usize> {
    if !matrix.is_square() {
        return Err(IrError::DimensionMismatch {
            expected: "square matrix".into(),
            found: format!("{}x{}", matrix.rows(), matrix.cols()),
        }
        .into());
    }
    let size = matrix.rows();
    let rank = matrix.rank();
    if rank < size {
        return Err(SynthError::NotFullRank { rank, size });
    }
    Ok(size)
}

/// Eliminate vertices until one is left, choosing pairs with `choose`.
fn run_greedy(
    rec: &mut Recorder<'_>,
    arch: &ConnectivityGraph,
    progress: &mut Progress,
    mut choose: impl FnMut(&GF2Matrix, &Progress, &[usize]) -> Option<(usize, usize)>,
) -> SynthResult<()> {
    while progress.rows.len() > 1 {
        let candidates = arch.non_cutting_vertices(&progress.rows);
        let (row, column) = choose(rec.matrix(), progress, &candidates).ok_or_else(|| {
            SynthError::Structural(format!(
                "no eliminable vertex among rows {:?}",
                progress.rows
            ))
        })?;
        eliminate_vertex(rec, arch, row, column, &progress.rows, &progress.columns)?;
        progress.remove(row, column);
        rec.tracer()
            .emit(|| TraceEvent::VertexEliminated { row, column });
    }

    if let (&[row], &[column]) = (progress.rows.as_slice(), progress.columns.as_slice()) {
        if !rec.get(row, column) {
            return Err(SynthError::Structural(format!(
                "last entry ({row}, {column}) is 0"
            )));
        }
        progress.remove(row, column);
        rec.tracer()
            .emit(|| TraceEvent::VertexEliminated { row, column });
    }
    Ok(())
}

/// Turn `column` into the unit vector at `row` and clear `row` on the
/// other remaining columns.
fn eliminate_vertex(
    rec: &mut Recorder<'_>,
    arch: &ConnectivityGraph,
    row: usize,
    column: usize,
    rows: &[usize],
    columns: &[usize],
) -> SynthResult<()> {
    let mut terminals: Vec<usize> = rec.matrix().col_ones(column).collect();
    if let Some(&stray) = terminals.iter().find(|r| !rows.contains(r)) {
        return Err(SynthError::Structural(format!(
            "row {stray} outside the remaining set holds a 1 in column {column}"
        )));
    }
    if !terminals.contains(&row) {
        terminals.push(row);
    }
    if terminals.len() > 1 {
        let tree = arch.steiner_tree(row, &terminals, rows)?;
        reduce_along(rec, &tree, column, SteinerDirection::Lower)?;
    } else if !rec.get(row, column) {
        return Err(SynthError::Structural(format!("column {column} is zero")));
    }

    let rest_rows: Vec<usize> = rows.iter().copied().filter(|&r| r != row).collect();
    let rest_columns: Vec<usize> = columns.iter().copied().filter(|&c| c != column).collect();
    if rest_columns.iter().all(|&c| !rec.get(row, c)) {
        return Ok(());
    }

    // Solve x^T B = y^T for the rows whose sum equals `row` on `rest_columns`.
    let block = rec.matrix().submatrix(&rest_rows, &rest_columns);
    let inverse = block.inverse().ok_or_else(|| {
        SynthError::Structural(format!("block left after removing row {row} is singular"))
    })?;
    let target: Vec<usize> = (0..rest_columns.len())
        .filter(|&k| rec.get(row, rest_columns[k]))
        .collect();
    let selected: Vec<usize> = (0..rest_rows.len())
        .filter(|&j| target.iter().fold(false, |acc, &k| acc ^ inverse.get(k, j)))
        .map(|j| rest_rows[j])
        .collect();

    let mut terminals = selected.clone();
    terminals.push(row);
    let tree = arch.steiner_tree(row, &terminals, rows)?;
    fold_into_root(rec, &tree, &selected)?;

    if let Some(&c) = rest_columns.iter().find(|&&c| rec.get(row, c)) {
        return Err(SynthError::Structural(format!(
            "row {row} still holds a 1 in column {c} after row elimination"
        )));
    }
    Ok(())
}

/// Add the sum of the `selected` rows into the root.
fn fold_into_root(
    rec: &mut Recorder<'_>,
    tree: &SteinerTree,
    selected: &[usize],
) -> SynthResult<()> {
    for (parent, child) in tree.preorder() {
        if !selected.contains(&child) {
            rec.row_add(parent, child)?;
        }
    }
    for (parent, child) in tree.postorder() {
        rec.row_add(parent, child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_rowcol_round_trip() {
        for (seed, arch) in [
            ConnectivityGraph::line(5),
            ConnectivityGraph::ring(6),
            ConnectivityGraph::grid(2, 3),
            ConnectivityGraph::from_edges(5, &[(0, 1), (0, 2), (2, 3), (2, 4)]).unwrap(),
        ]
        .iter()
        .enumerate()
        {
            let mut rng = StdRng::seed_from_u64(seed as u64);
            let n = arch.num_qubits();
            let original = GF2Matrix::random_invertible(n, &mut rng);
            let mut matrix = original.clone();
            let mut circuit = CnotCircuit::new(n);
            let rank = RowCol::new()
                .reduce(&mut matrix, Some(arch), Some(&mut circuit))
                .unwrap();
            assert_eq!(rank, n);
            assert!(matrix.is_identity());
            assert_eq!(circuit.parity_map(), original);
            assert!(arch.supports(&circuit));
        }
    }

    #[test]
    fn test_permrowcol_output_permutation() {
        let arch = ConnectivityGraph::grid(3, 3);
        let mut rng = StdRng::seed_from_u64(5);
        let original = GF2Matrix::random_invertible(9, &mut rng);
        let mut matrix = original.clone();
        let mut circuit = CnotCircuit::new(9);

        let output = PermRowCol::new()
            .eliminate(&mut matrix, Some(&arch), Some(&mut circuit))
            .unwrap();

        for (column, &row) in output.iter().enumerate() {
            assert_eq!(matrix.col_ones(column).collect::<Vec<_>>(), vec![row]);
        }
        let realised = circuit.parity_map();
        let identity: Vec<usize> = (0..9).collect();
        assert_eq!(realised.permuted(&identity, &output).unwrap(), original);
        assert!(arch.supports(&circuit));
    }

    #[test]
    fn test_permrowcol_sets_layout() {
        let arch = ConnectivityGraph::line(4);
        let mut rng = StdRng::seed_from_u64(8);
        let original = GF2Matrix::random_invertible(4, &mut rng);
        let mut matrix = original.clone();
        let mut circuit = CnotCircuit::new(4);
        PermRowCol::new()
            .reduce(&mut matrix, Some(&arch), Some(&mut circuit))
            .unwrap();
        let layout = circuit.layout().unwrap().clone();
        assert_eq!(
            circuit.parity_map(),
            original.permuted(&layout.row_perm, &layout.col_perm).unwrap()
        );
    }

    #[test]
    fn test_singular_rejected() {
        let mut matrix =
            GF2Matrix::from_rows(&[[1u8, 1, 0], [1, 1, 0], [0, 0, 1]]).unwrap();
        let result = RowCol::new().reduce(&mut matrix, Some(&ConnectivityGraph::line(3)), None);
        assert!(matches!(
            result,
            Err(SynthError::NotFullRank { rank: 2, size: 3 })
        ));
        let mut wide = GF2Matrix::zeros(2, 3);
        assert!(PermRowCol::new().reduce(&mut wide, None, None).is_err());
    }

    #[test]
    fn test_fold_into_root() {
        let arch = ConnectivityGraph::line(4);
        let original = GF2Matrix::from_rows(&[
            [1u8, 0, 0, 1],
            [0, 1, 1, 0],
            [1, 1, 0, 0],
            [0, 0, 1, 1],
        ])
        .unwrap();
        let mut matrix = original.clone();
        let tracer = Tracer::disabled();
        let mut rec = Recorder::new(&mut matrix, None, &tracer);
        let tree = arch.steiner_tree(0, &[0, 3], &[0, 1, 2, 3]).unwrap();
        fold_into_root(&mut rec, &tree, &[3]).unwrap();

        let mut expected_root = GF2Matrix::zeros(1, 4);
        for c in 0..4 {
            expected_root.set(0, c, original.get(0, c) ^ original.get(3, c));
        }
        assert_eq!(matrix.submatrix(&[0], &[0, 1, 2, 3]), expected_root);
    }

    #[test]
    fn test_eliminate_vertex_structural_errors() {
        let arch = ConnectivityGraph::line(3);
        let tracer = Tracer::disabled();
        let rows = [[1u8, 0, 0], [0, 1, 0], [1, 0, 1]];

        // Row 2 is no longer remaining but still holds a 1 in column 0.
        let mut matrix = GF2Matrix::from_rows(&rows).unwrap();
        let mut rec = Recorder::new(&mut matrix, None, &tracer);
        let result = eliminate_vertex(&mut rec, &arch, 0, 0, &[0, 1], &[0, 1]);
        assert!(matches!(result, Err(SynthError::Structural(_))));
        assert_eq!(rec.operations(), 0);

        // Rows 0 and 2 are not adjacent once row 1 is gone.
        let mut matrix = GF2Matrix::from_rows(&rows).unwrap();
        let mut rec = Recorder::new(&mut matrix, None, &tracer);
        let result = eliminate_vertex(&mut rec, &arch, 0, 0, &[0, 2], &[0, 2]);
        assert!(matches!(result, Err(SynthError::Structural(_))));
        assert_eq!(rec.operations(), 0);
    }

    #[test]
    fn test_disconnected_architecture_never_reaches_rowcol() {
        assert!(matches!(
            ConnectivityGraph::from_edges(4, &[(0, 1), (2, 3)]),
            Err(SynthError::DisconnectedArchitecture(_))
        ));
        // A connected graph of the wrong size is rejected by the eliminator.
        let mut matrix = GF2Matrix::identity(4);
        let result = RowCol::new().reduce(&mut matrix, Some(&ConnectivityGraph::line(3)), None);
        assert!(matches!(
            result,
            Err(SynthError::ArchitectureMismatch {
                matrix: 4,
                architecture: 3
            })
        ));
    }

    #[test]
    fn test_best_first_round_trip() {
        let arch = ConnectivityGraph::grid(2, 4);
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..3 {
            let original = GF2Matrix::random_invertible(8, &mut rng);
            let mut matrix = original.clone();
            let mut circuit = CnotCircuit::new(8);
            let output = PermRowCol::new()
                .with_best_first(BestFirst {
                    branch_width: 3,
                    max_expansions: 200,
                })
                .eliminate(&mut matrix, Some(&arch), Some(&mut circuit))
                .unwrap();

            let identity: Vec<usize> = (0..8).collect();
            assert_eq!(
                circuit.parity_map().permuted(&identity, &output).unwrap(),
                original
            );
            assert!(arch.supports(&circuit));
            assert!(output.iter().all(|&r| r < 8));
        }
    }

    #[test]
    fn test_best_first_zero_budget_is_greedy() {
        let arch = ConnectivityGraph::line(6);
        let mut rng = StdRng::seed_from_u64(2);
        let original = GF2Matrix::random_invertible(6, &mut rng);

        let mut a = original.clone();
        let mut greedy = CnotCircuit::new(6);
        let greedy_out = PermRowCol::new()
            .eliminate(&mut a, Some(&arch), Some(&mut greedy))
            .unwrap();

        let mut b = original.clone();
        let mut budgeted = CnotCircuit::new(6);
        let budget_out = PermRowCol::new()
            .with_best_first(BestFirst {
                branch_width: 2,
                max_expansions: 0,
            })
            .eliminate(&mut b, Some(&arch), Some(&mut budgeted))
            .unwrap();

        assert_eq!(greedy_out, budget_out);
        assert_eq!(greedy.to_vec(), budgeted.to_vec());
        assert_eq!(a, b);
    }
}
