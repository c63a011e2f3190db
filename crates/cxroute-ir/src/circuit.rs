//! CNOT circuits paired with their parity maps.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::matrix::{GF2Matrix, RowOperations, check_permutation};

/// A controlled-NOT gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cnot {
    /// Control qubit.
    pub control: usize,
    /// Target qubit.
    pub target: usize,
}

impl Cnot {
    /// Create a CNOT gate.
    pub const fn new(control: usize, target: usize) -> Self {
        Self { control, target }
    }

    /// Whether the gate acts on `qubit`.
    pub fn touches(&self, qubit: usize) -> bool {
        self.control == qubit || self.target == qubit
    }
}

impl fmt::Display for Cnot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cx q[{}], q[{}];", self.control, self.target)
    }
}

/// Qubit relabelling applied to a matrix before it was synthesized.
///
/// A circuit carrying a layout satisfies
/// `circuit.parity_map() == original.permuted(&row_perm, &col_perm)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Row (output wire) permutation.
    pub row_perm: Vec<usize>,
    /// Column (input wire) permutation.
    pub col_perm: Vec<usize>,
}

impl Layout {
    /// The identity layout on `n` qubits.
    pub fn trivial(n: usize) -> Self {
        Self {
            row_perm: (0..n).collect(),
            col_perm: (0..n).collect(),
        }
    }
}

/// An ordered list of CNOT gates on a fixed number of wires.
///
/// Gates are stored in circuit (time) order. Two recorders connect the
/// circuit to elimination algorithms:
///
/// - [`CnotCircuit::row_add`]: the eliminator performed `row[target] ^= row[source]`;
///   the gate `CNOT(source, target)` is *prepended*.
/// - [`CnotCircuit::col_add`]: the eliminator performed `col[target] ^= col[source]`;
///   the gate `CNOT(target, source)` is *appended*.
///
/// Hence reducing `M` to `R` with recorded row operations leaves
/// `parity_map() * R == M`, and with recorded column operations
/// `R * parity_map() == M`. In particular a full reduction to the identity
/// yields a circuit whose parity map is `M` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnotCircuit {
    qubits: usize,
    gates: VecDeque<Cnot>,
    layout: Option<Layout>,
}

impl CnotCircuit {
    /// Create an empty circuit.
    pub fn new(qubits: usize) -> Self {
        Self {
            qubits,
            gates: VecDeque::new(),
            layout: None,
        }
    }

    /// Create a circuit from gates in circuit order.
    pub fn from_gates(qubits: usize, gates: impl IntoIterator<Item = Cnot>) -> IrResult<Self> {
        let mut circuit = Self::new(qubits);
        for gate in gates {
            circuit.add_cnot(gate.control, gate.target)?;
        }
        Ok(circuit)
    }

    /// A random CNOT circuit with `n_cnots` gates on arbitrary qubit pairs.
    pub fn random<R: Rng>(qubits: usize, n_cnots: usize, rng: &mut R) -> Self {
        let mut circuit = Self::new(qubits);
        if qubits < 2 {
            return circuit;
        }
        for _ in 0..n_cnots {
            let control = rng.gen_range(0..qubits);
            let mut target = rng.gen_range(0..qubits - 1);
            if target >= control {
                target += 1;
            }
            circuit.gates.push_back(Cnot::new(control, target));
        }
        circuit
    }

    /// Number of wires.
    pub fn qubits(&self) -> usize {
        self.qubits
    }

    /// Gates in circuit order.
    pub fn gates(&self) -> impl ExactSizeIterator<Item = &Cnot> + DoubleEndedIterator {
        self.gates.iter()
    }

    /// Gates in circuit order, collected.
    pub fn to_vec(&self) -> Vec<Cnot> {
        self.gates.iter().copied().collect()
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the circuit has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    fn check_gate(&self, control: usize, target: usize) -> IrResult<()> {
        for qubit in [control, target] {
            if qubit >= self.qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    qubits: self.qubits,
                });
            }
        }
        if control == target {
            return Err(IrError::SelfLoop(control));
        }
        Ok(())
    }

    /// Append a CNOT at the end of the circuit.
    pub fn add_cnot(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.check_gate(control, target)?;
        self.gates.push_back(Cnot::new(control, target));
        Ok(self)
    }

    /// Append `gate` at the end of the circuit.
    pub fn push(&mut self, gate: Cnot) -> IrResult<()> {
        self.check_gate(gate.control, gate.target)?;
        self.gates.push_back(gate);
        Ok(())
    }

    /// Insert a CNOT at the start of the circuit.
    pub fn prepend_cnot(&mut self, control: usize, target: usize) -> IrResult<&mut Self> {
        self.check_gate(control, target)?;
        self.gates.push_front(Cnot::new(control, target));
        Ok(self)
    }

    /// Record the elimination step `row[target] ^= row[source]`.
    pub fn row_add(&mut self, target: usize, source: usize) -> IrResult<()> {
        self.check_gate(source, target)?;
        self.gates.push_front(Cnot::new(source, target));
        Ok(())
    }

    /// Record the elimination step `col[target] ^= col[source]`.
    pub fn col_add(&mut self, target: usize, source: usize) -> IrResult<()> {
        self.check_gate(target, source)?;
        self.gates.push_back(Cnot::new(target, source));
        Ok(())
    }

    /// Append all gates of `other`.
    pub fn extend(&mut self, other: &CnotCircuit) -> IrResult<()> {
        if other.qubits != self.qubits {
            return Err(IrError::DimensionMismatch {
                expected: format!("{} qubits", self.qubits),
                found: format!("{} qubits", other.qubits),
            });
        }
        self.gates.extend(other.gates.iter().copied());
        Ok(())
    }

    /// The same gates in reverse order.
    ///
    /// Every CNOT is its own inverse, so this is the inverse circuit.
    pub fn reversed(&self) -> Self {
        Self {
            qubits: self.qubits,
            gates: self.gates.iter().rev().copied().collect(),
            layout: None,
        }
    }

    /// Circuit implementing the transposed parity map.
    ///
    /// Gate order is reversed and every control/target pair is swapped. A
    /// layout, if present, has its row and column permutations exchanged.
    pub fn transposed(&self) -> Self {
        Self {
            qubits: self.qubits,
            gates: self
                .gates
                .iter()
                .rev()
                .map(|g| Cnot::new(g.target, g.control))
                .collect(),
            layout: self.layout.as_ref().map(|l| Layout {
                row_perm: l.col_perm.clone(),
                col_perm: l.row_perm.clone(),
            }),
        }
    }

    /// Number of CNOT gates.
    pub fn count_cnots(&self) -> usize {
        self.gates.len()
    }

    /// Number of CNOT layers.
    ///
    /// Gates are packed greedily in circuit order: a new layer starts whenever
    /// the next gate shares a qubit with the current layer.
    pub fn cnot_depth(&self) -> usize {
        if self.gates.is_empty() {
            return 0;
        }
        let mut depth = 1;
        let mut busy = vec![false; self.qubits];
        for gate in &self.gates {
            if busy[gate.control] || busy[gate.target] {
                depth += 1;
                busy.iter_mut().for_each(|b| *b = false);
            }
            busy[gate.control] = true;
            busy[gate.target] = true;
        }
        depth
    }

    /// Linear map implemented by the circuit, with rows indexed by wire.
    pub fn parity_map(&self) -> GF2Matrix {
        let mut matrix = GF2Matrix::identity(self.qubits);
        self.apply_to(&mut matrix);
        matrix
    }

    /// Apply the gates, in circuit order, as row operations on `matrix`.
    pub fn apply_to(&self, matrix: &mut GF2Matrix) {
        for gate in &self.gates {
            matrix.row_add(gate.target, gate.control);
        }
    }

    /// Qubit relabelling applied before synthesis, if any.
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Attach the qubit relabelling applied before synthesis.
    pub fn set_layout(&mut self, layout: Layout) -> IrResult<()> {
        check_permutation(&layout.row_perm, self.qubits)?;
        check_permutation(&layout.col_perm, self.qubits)?;
        self.layout = Some(layout);
        Ok(())
    }
}

impl RowOperations for CnotCircuit {
    fn row_add(&mut self, target: usize, source: usize) -> IrResult<()> {
        CnotCircuit::row_add(self, target, source)
    }
}

impl fmt::Display for CnotCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "qreg q[{}];", self.qubits)?;
        for gate in &self.gates {
            writeln!(f, "{gate}")?;
        }
        Ok(())
    }
}
