//! Optional observation of synthesis progress.
//!
//! Tests and tooling can install a [`TraceHook`] to watch every row
//! operation and search step. With no hook installed, events are never
//! constructed.

use std::fmt;
use std::sync::Arc;

/// A progress event emitted during synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// `row[target] ^= row[source]` was applied to the working matrix.
    RowOperation {
        /// Row that was modified.
        target: usize,
        /// Row that was added.
        source: usize,
    },
    /// A Steiner-Gauss step left `pivot` as the only 1 in `column`
    /// among the rows still being reduced.
    PivotReduced {
        /// Column that was cleared.
        column: usize,
        /// Row holding the pivot.
        pivot: usize,
    },
    /// RowCol removed a qubit from the remaining set.
    VertexEliminated {
        /// Row (qubit) removed.
        row: usize,
        /// Column paired with it.
        column: usize,
    },
    /// A genetic algorithm generation finished.
    GenerationCompleted {
        /// Zero-based generation index.
        generation: usize,
        /// Best fitness in the population after this generation.
        best_fitness: u64,
    },
    /// A particle swarm step finished.
    SwarmStepCompleted {
        /// Zero-based step index.
        step: usize,
        /// Best fitness known to the swarm after this step.
        best_fitness: u64,
    },
}

/// Receiver for [`TraceEvent`]s.
pub trait TraceHook: Send + Sync {
    /// Called once per event, in emission order.
    fn on_event(&self, event: &TraceEvent);
}

/// Handle that forwards events to an installed hook, if any.
#[derive(Clone, Default)]
pub struct Tracer(Option<Arc<dyn TraceHook>>);

impl Tracer {
    /// A tracer that forwards to `hook`.
    pub fn new(hook: Arc<dyn TraceHook>) -> Self {
        Self(Some(hook))
    }

    /// A tracer that drops everything.
    pub fn disabled() -> Self {
        Self(None)
    }

    /// Whether a hook is installed.
    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    /// Emit the event built by `event` if a hook is installed.
    #[inline]
    pub fn emit(&self, event: impl FnOnce() -> TraceEvent) {
        if let Some(hook) = &self.0 {
            hook.on_event(&event());
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tracer")
            .field(&if self.is_enabled() { "enabled" } else { "disabled" })
            .finish()
    }
}
