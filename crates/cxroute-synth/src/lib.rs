//! cxroute Architecture-Aware CNOT Synthesis
//!
//! This crate turns a GF(2) parity map into a CNOT circuit whose gates only
//! act on qubit pairs that are connected on the target device. Every
//! algorithm reduces the matrix with row operations and records each one as
//! a gate, so the result is correct by construction.
//!
//! # Overview
//!
//! Synthesis proceeds in three layers:
//! 1. **Architecture**: a [`ConnectivityGraph`] with cached distances,
//!    Steiner trees and non-cutting vertex queries
//! 2. **Elimination**: an [`Eliminator`] reduces the matrix along the graph
//! 3. **Placement search**: genetic and particle swarm optimizers pick the
//!    qubit relabelling that makes elimination cheapest
//!
//! # Architecture
//!
//! ```text
//! GF2Matrix ──► Synthesizer ◄── SynthesisConfig + ConnectivityGraph
//!                   │
//!                   ├── GaussEliminator      (unconstrained)
//!                   ├── SteinerGauss         (iterative / recursive)
//!                   ├── RowCol / PermRowCol  (vertex elimination)
//!                   └── GeneticEliminator / SwarmEliminator
//!                   │
//!                   ▼
//!             Synthesis { circuit, matrix, rank, output_perm }
//! ```
//!
//! # Example: Routing on a Line
//!
//! ```rust
//! use cxroute_ir::GF2Matrix;
//! use cxroute_synth::{ConnectivityGraph, EliminationMode, Synthesizer};
//!
//! // row 0 ^= row 3 on a line 0-1-2-3: no direct edge between 0 and 3.
//! let target = GF2Matrix::from_rows(&[[1u8, 0, 0, 1], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]])
//!     .unwrap();
//!
//! let line = ConnectivityGraph::line(4);
//! let synthesizer = Synthesizer::builder()
//!     .with_mode(EliminationMode::Steiner)
//!     .with_architecture(line.clone())
//!     .build()
//!     .unwrap();
//!
//! let result = synthesizer.synthesize(&target).unwrap();
//! assert_eq!(result.circuit.parity_map(), target);
//! assert!(line.supports(&result.circuit));
//! ```
//!
//! # Modes
//!
//! | Mode | Respects architecture | Layout attached |
//! |------|-----------------------|-----------------|
//! | `gauss` | no | no |
//! | `steiner` | yes | no |
//! | `row_col` | yes | no |
//! | `perm_row_col` | yes | columns |
//! | `genetic_steiner` / `pso_steiner` | yes | rows and columns |
//! | `genetic_gauss` / `pso_gauss` | no | rows and columns |
//!
//! # Observing Progress
//!
//! Install a [`TraceHook`] with
//! [`SynthesizerBuilder::with_trace_hook`] to receive a [`TraceEvent`] for
//! every row operation, pivot and search iteration. `tracing` spans and
//! events are emitted regardless.

pub mod architecture;
pub mod config;
pub mod elimination;
pub mod eliminator;
pub mod error;
pub mod search;
pub mod synthesizer;
pub mod trace;

pub use architecture::{ArchitectureSpec, ConnectivityGraph, SteinerDirection, SteinerTree};
pub use config::{GeneticConfig, SwarmConfig, SynthesisConfig};
pub use elimination::{
    BestFirst, GaussEliminator, PermRowCol, RowCol, SteinerGauss, SteinerVariant,
};
pub use eliminator::{EliminationMode, Eliminator};
pub use error::{SynthError, SynthResult};
pub use search::{
    FitnessMetric, GeneticAlgorithm, GeneticEliminator, ParticleSwarm, SequenceResult,
    SequenceStrategy, SequenceSynthesizer, SwarmEliminator,
};
pub use synthesizer::{Synthesis, Synthesizer, SynthesizerBuilder};
pub use trace::{TraceEvent, TraceHook, Tracer};
