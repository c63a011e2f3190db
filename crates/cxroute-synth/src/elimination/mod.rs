//! Elimination algorithms.
//!
//! - [`GaussEliminator`]: unconstrained Gauss-Jordan
//! - [`SteinerGauss`]: row operations routed along Steiner trees
//! - [`RowCol`] / [`PermRowCol`]: vertex elimination on non-cutting qubits

mod gauss;
mod rowcol;
mod steiner;

pub use gauss::GaussEliminator;
pub use rowcol::{
    BestFirst, ColumnStrategy, FewestOnesColumn, FewestOnesRow, LowestIndexRow, PermRowCol,
    RowCol, RowStrategy,
};
pub use steiner::{SteinerGauss, SteinerVariant};

use cxroute_ir::{CnotCircuit, GF2Matrix};

use crate::error::SynthResult;
use crate::trace::{TraceEvent, Tracer};

/// Applies row operations to a working matrix and mirrors them onto an
/// optional circuit and tracer.
pub(crate) struct Recorder<'a> {
    matrix: &'a mut GF2Matrix,
    circuit: Option<&'a mut CnotCircuit>,
    tracer: &'a Tracer,
    operations: usize,
}

impl<'a> Recorder<'a> {
    pub(crate) fn new(
        matrix: &'a mut GF2Matrix,
        circuit: Option<&'a mut CnotCircuit>,
        tracer: &'a Tracer,
    ) -> Self {
        Self {
            matrix,
            circuit,
            tracer,
            operations: 0,
        }
    }

    #[inline]
    pub(crate) fn matrix(&self) -> &GF2Matrix {
        self.matrix
    }

    #[inline]
    pub(crate) fn get(&self, row: usize, col: usize) -> bool {
        self.matrix.get(row, col)
    }

    /// `row[target] ^= row[source]`, recorded before it is applied.
    pub(crate) fn row_add(&mut self, target: usize, source: usize) -> SynthResult<()> {
        if let Some(circuit) = self.circuit.as_deref_mut() {
            circuit.row_add(target, source)?;
        }
        self.matrix.row_add(target, source);
        self.operations += 1;
        self.tracer
            .emit(|| TraceEvent::RowOperation { target, source });
        Ok(())
    }

    pub(crate) fn operations(&self) -> usize {
        self.operations
    }

    pub(crate) fn tracer(&self) -> &Tracer {
        self.tracer
    }
}
