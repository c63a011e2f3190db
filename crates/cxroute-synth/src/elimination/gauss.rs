//! Unconstrained Gauss-Jordan elimination.

use cxroute_ir::{CnotCircuit, GF2Matrix, IrResult, RowOperations};
use tracing::debug;

use crate::architecture::ConnectivityGraph;
use crate::eliminator::Eliminator;
use crate::error::SynthResult;
use crate::trace::{TraceEvent, Tracer};

/// Gauss-Jordan elimination ignoring connectivity.
///
/// Emitted CNOTs may act on any pair of qubits. This is the reference mode
/// and the cheapest fitness oracle for placement search.
#[derive(Debug, Clone, Default)]
pub struct GaussEliminator {
    full_reduce: bool,
    tracer: Tracer,
}

impl GaussEliminator {
    /// Create a Gauss eliminator.
    pub fn new(full_reduce: bool) -> Self {
        Self {
            full_reduce,
            tracer: Tracer::disabled(),
        }
    }

    /// Forward row operations to `tracer`.
    #[must_use]
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }
}

/// Companion that records onto a circuit and reports to a tracer.
struct Traced<'a> {
    circuit: Option<&'a mut CnotCircuit>,
    tracer: &'a Tracer,
}

impl RowOperations for Traced<'_> {
    fn row_add(&mut self, target: usize, source: usize) -> IrResult<()> {
        if let Some(circuit) = self.circuit.as_deref_mut() {
            circuit.row_add(target, source)?;
        }
        self.tracer
            .emit(|| TraceEvent::RowOperation { target, source });
        Ok(())
    }
}

impl Eliminator for GaussEliminator {
    fn name(&self) -> &str {
        "gauss"
    }

    fn reduce(
        &self,
        matrix: &mut GF2Matrix,
        _architecture: Option<&ConnectivityGraph>,
        circuit: Option<&mut CnotCircuit>,
    ) -> SynthResult<usize> {
        let rank = if circuit.is_none() && !self.tracer.is_enabled() {
            matrix.gauss(self.full_reduce, None)?
        } else {
            let mut companion = Traced {
                circuit,
                tracer: &self.tracer,
            };
            matrix.gauss(self.full_reduce, Some(&mut companion))?
        };
        debug!(rank, full_reduce = self.full_reduce, "Gauss elimination finished");
        Ok(rank)
    }
}
