//! The eliminator interface shared by every synthesis mode.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use cxroute_ir::{CnotCircuit, GF2Matrix};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::architecture::ConnectivityGraph;
use crate::error::{SynthError, SynthResult};

/// Reduces a parity matrix with row operations, optionally recording them.
///
/// Implementations mutate `matrix` in place and, when `circuit` is given,
/// record every row operation on it so that afterwards
/// `circuit.parity_map() · matrix` equals the matrix that was passed in
/// (up to any [`Layout`](cxroute_ir::Layout) the eliminator attaches).
pub trait Eliminator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Reduce `matrix` and return its rank.
    fn reduce(
        &self,
        matrix: &mut GF2Matrix,
        architecture: Option<&ConnectivityGraph>,
        circuit: Option<&mut CnotCircuit>,
    ) -> SynthResult<usize>;
}

/// Available synthesis modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationMode {
    /// Unconstrained Gauss-Jordan elimination.
    Gauss,
    /// Steiner-Gauss on the architecture.
    #[default]
    Steiner,
    /// Vertex elimination with row index equal to column index.
    RowCol,
    /// Vertex elimination with independent row and column choice.
    PermRowCol,
    /// Genetic qubit placement search around Steiner-Gauss.
    GeneticSteiner,
    /// Genetic qubit placement search around Gauss-Jordan.
    GeneticGauss,
    /// Particle swarm placement search around Steiner-Gauss.
    PsoSteiner,
    /// Particle swarm placement search around Gauss-Jordan.
    PsoGauss,
}

impl EliminationMode {
    /// Every mode, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Gauss,
        Self::Steiner,
        Self::RowCol,
        Self::PermRowCol,
        Self::GeneticSteiner,
        Self::GeneticGauss,
        Self::PsoSteiner,
        Self::PsoGauss,
    ];

    /// The snake_case name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gauss => "gauss",
            Self::Steiner => "steiner",
            Self::RowCol => "row_col",
            Self::PermRowCol => "perm_row_col",
            Self::GeneticSteiner => "genetic_steiner",
            Self::GeneticGauss => "genetic_gauss",
            Self::PsoSteiner => "pso_steiner",
            Self::PsoGauss => "pso_gauss",
        }
    }

    /// Whether emitted gates are restricted to architecture edges.
    pub fn respects_architecture(self) -> bool {
        !matches!(self, Self::Gauss | Self::GeneticGauss | Self::PsoGauss)
    }

    /// Whether the mode searches over qubit placements.
    pub fn is_search(self) -> bool {
        matches!(
            self,
            Self::GeneticSteiner | Self::GeneticGauss | Self::PsoSteiner | Self::PsoGauss
        )
    }
}

impl fmt::Display for EliminationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EliminationMode {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == key)
            .ok_or_else(|| SynthError::InvalidConfiguration(format!("unknown elimination mode '{s}'")))
    }
}

/// The architecture to route on, or a fully connected stand-in.
pub(crate) fn resolve_architecture(
    architecture: Option<&ConnectivityGraph>,
    qubits: usize,
) -> SynthResult<Cow<'_, ConnectivityGraph>> {
    let arch = match architecture {
        Some(arch) => Cow::Borrowed(arch),
        None => {
            warn!(qubits, "No architecture supplied; assuming full connectivity");
            Cow::Owned(ConnectivityGraph::fully_connected(qubits))
        }
    };
    if arch.num_qubits() != qubits {
        return Err(SynthError::ArchitectureMismatch {
            matrix: qubits,
            architecture: arch.num_qubits(),
        });
    }
    Ok(arch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_names_roundtrip() {
        for mode in EliminationMode::ALL {
            assert_eq!(mode.as_str().parse::<EliminationMode>().unwrap(), mode);
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
        }
        assert_eq!(
            "Perm-Row-Col".parse::<EliminationMode>().unwrap(),
            EliminationMode::PermRowCol
        );
        assert!("simulated_annealing".parse::<EliminationMode>().is_err());
    }

    #[test]
    fn test_mode_classification() {
        assert!(!EliminationMode::Gauss.respects_architecture());
        assert!(EliminationMode::PermRowCol.respects_architecture());
        assert!(EliminationMode::PsoSteiner.is_search());
        assert!(!EliminationMode::RowCol.is_search());
        assert_eq!(EliminationMode::default(), EliminationMode::Steiner);
    }

    #[test]
    fn test_resolve_architecture() {
        let line = ConnectivityGraph::line(3);
        assert!(resolve_architecture(Some(&line), 3).is_ok());
        assert!(matches!(
            resolve_architecture(Some(&line), 4),
            Err(SynthError::ArchitectureMismatch {
                matrix: 4,
                architecture: 3
            })
        ));
        let fallback = resolve_architecture(None, 5).unwrap();
        assert_eq!(fallback.edges().len(), 10);
    }
}
