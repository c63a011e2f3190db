//! Dense matrices over GF(2).
//!
//! Rows are packed into 64-bit words so that a row addition costs
//! `cols / 64` XORs. All elimination routines in the workspace are built on
//! the two elementary operations [`GF2Matrix::row_add`] and
//! [`GF2Matrix::col_add`].

use std::convert::Infallible;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

const WORD_BITS: usize = 64;

/// Receiver for elementary row operations performed during elimination.
///
/// Implemented by [`GF2Matrix`] (the operation is mirrored onto another
/// matrix) and by [`crate::CnotCircuit`] (the operation is recorded as a
/// CNOT).
pub trait RowOperations {
    /// Record `row[target] ^= row[source]`.
    ///
    /// # Errors
    ///
    /// Fails if the receiver cannot represent the operation, for example
    /// an index beyond its size.
    fn row_add(&mut self, target: usize, source: usize) -> IrResult<()>;
}

/// A dense binary matrix.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct GF2Matrix {
    rows: usize,
    cols: usize,
    /// Words per row.
    stride: usize,
    /// Row-major packed bits. Bit `c` of row `r` lives in
    /// `words[r * stride + c / 64]` at position `c % 64`.
    words: Vec<u64>,
}

impl GF2Matrix {
    /// Create an all-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let stride = cols.div_ceil(WORD_BITS);
        Self {
            rows,
            cols,
            stride,
            words: vec![0; rows * stride],
        }
    }

    /// Create the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, true);
        }
        m
    }

    /// Build a matrix entry by entry.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut m = Self::zeros(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                if f(r, c) {
                    m.set(r, c, true);
                }
            }
        }
        m
    }

    /// Build a matrix from rows of 0/1 entries.
    ///
    /// All rows must have the same length and every entry must be 0 or 1.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> IrResult<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut m = Self::zeros(rows.len(), cols);
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(IrError::DimensionMismatch {
                    expected: format!("{cols} columns"),
                    found: format!("{} columns in row {r}", row.len()),
                });
            }
            for (c, &value) in row.iter().enumerate() {
                match value {
                    0 => {}
                    1 => m.set(r, c, true),
                    _ => return Err(IrError::InvalidEntry { row: r, col: c, value }),
                }
            }
        }
        Ok(m)
    }

    /// Uniformly random matrix.
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let mut m = Self::zeros(rows, cols);
        let tail = cols % WORD_BITS;
        for r in 0..rows {
            for w in 0..m.stride {
                let mut word: u64 = rng.r#gen();
                if w + 1 == m.stride && tail != 0 {
                    word &= (1u64 << tail) - 1;
                }
                m.words[r * m.stride + w] = word;
            }
        }
        m
    }

    /// Uniformly random invertible `n x n` matrix (rejection sampling).
    pub fn random_invertible<R: Rng>(n: usize, rng: &mut R) -> Self {
        loop {
            let m = Self::random(n, n, rng);
            if m.rank() == n {
                return m;
            }
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether the matrix is square.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Read entry `(row, col)`.
    ///
    /// # Panics
    /// Panics if the index is out of range.
    pub fn get(&self, row: usize, col: usize) -> bool {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of range for {}x{} matrix",
            self.rows,
            self.cols
        );
        (self.words[row * self.stride + col / WORD_BITS] >> (col % WORD_BITS)) & 1 == 1
    }

    /// Write entry `(row, col)`.
    ///
    /// # Panics
    /// Panics if the index is out of range.
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of range for {}x{} matrix",
            self.rows,
            self.cols
        );
        let word = &mut self.words[row * self.stride + col / WORD_BITS];
        let mask = 1u64 << (col % WORD_BITS);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    fn row_words(&self, row: usize) -> &[u64] {
        &self.words[row * self.stride..(row + 1) * self.stride]
    }

    /// Column indices of the set bits in `row`, ascending.
    pub fn row_ones(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.row_words(row)
            .iter()
            .enumerate()
            .flat_map(|(w, &word)| {
                let mut bits = word;
                std::iter::from_fn(move || {
                    if bits == 0 {
                        return None;
                    }
                    let bit = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    Some(w * WORD_BITS + bit)
                })
            })
    }

    /// Row indices of the set bits in `col`, ascending.
    pub fn col_ones(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows).filter(move |&r| self.get(r, col))
    }

    /// Number of set bits in `row`.
    pub fn row_weight(&self, row: usize) -> usize {
        self.row_words(row)
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum()
    }

    /// Number of set bits in `col`.
    pub fn col_weight(&self, col: usize) -> usize {
        self.col_ones(col).count()
    }

    /// Whether `row` is all zeros.
    pub fn row_is_zero(&self, row: usize) -> bool {
        self.row_words(row).iter().all(|&w| w == 0)
    }

    /// `row[target] ^= row[source]`.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn row_add(&mut self, target: usize, source: usize) {
        assert!(
            target < self.rows && source < self.rows,
            "row_add({target}, {source}) out of range for {} rows",
            self.rows
        );
        debug_assert_ne!(target, source, "row_add on a single row");
        let s = self.stride;
        if target < source {
            let (head, tail) = self.words.split_at_mut(source * s);
            for (a, b) in head[target * s..(target + 1) * s].iter_mut().zip(&tail[..s]) {
                *a ^= *b;
            }
        } else if target > source {
            let (head, tail) = self.words.split_at_mut(target * s);
            for (a, b) in tail[..s].iter_mut().zip(&head[source * s..(source + 1) * s]) {
                *a ^= *b;
            }
        }
    }

    /// `col[target] ^= col[source]`.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn col_add(&mut self, target: usize, source: usize) {
        assert!(
            target < self.cols && source < self.cols,
            "col_add({target}, {source}) out of range for {} columns",
            self.cols
        );
        debug_assert_ne!(target, source, "col_add on a single column");
        for r in 0..self.rows {
            if self.get(r, source) {
                let word = &mut self.words[r * self.stride + target / WORD_BITS];
                *word ^= 1u64 << (target % WORD_BITS);
            }
        }
    }

    /// Unconstrained Gaussian elimination.
    ///
    /// With `full_reduce = false` the matrix is brought into row-echelon
    /// (upper triangular) form; with `full_reduce = true` it is further
    /// back-substituted into reduced row-echelon form, which is the identity
    /// for a square full-rank matrix. Rows are never swapped: a pivot found
    /// below the pivot row is added into it, so every step is a single row
    /// addition that is mirrored onto `companion`.
    ///
    /// Returns the rank.
    ///
    /// # Errors
    ///
    /// Stops at the first operation `companion` rejects. Operations before
    /// it have been applied to both.
    pub fn gauss(
        &mut self,
        full_reduce: bool,
        mut companion: Option<&mut dyn RowOperations>,
    ) -> IrResult<usize> {
        self.eliminate(full_reduce, |target, source| match companion.as_deref_mut() {
            Some(c) => c.row_add(target, source),
            None => Ok(()),
        })
    }

    /// Gauss-Jordan elimination reporting each row addition to `record`
    /// before applying it.
    fn eliminate<E>(
        &mut self,
        full_reduce: bool,
        mut record: impl FnMut(usize, usize) -> Result<(), E>,
    ) -> Result<usize, E> {
        let mut pivot_cols = Vec::new();
        let mut pivot = 0;
        for c in 0..self.cols {
            if pivot >= self.rows {
                break;
            }
            let Some(found) = (pivot..self.rows).find(|&r| self.get(r, c)) else {
                continue;
            };
            if found != pivot {
                record(pivot, found)?;
                self.row_add(pivot, found);
            }
            for r in pivot + 1..self.rows {
                if self.get(r, c) {
                    record(r, pivot)?;
                    self.row_add(r, pivot);
                }
            }
            pivot_cols.push(c);
            pivot += 1;
        }

        if full_reduce {
            for (p, &c) in pivot_cols.iter().enumerate().rev() {
                for r in 0..p {
                    if self.get(r, c) {
                        record(r, p)?;
                        self.row_add(r, p);
                    }
                }
            }
        }
        Ok(pivot)
    }

    /// Rank of the matrix.
    pub fn rank(&self) -> usize {
        let Ok(rank) = self.clone().eliminate::<Infallible>(false, |_, _| Ok(()));
        rank
    }

    /// Inverse of a square matrix, or `None` when it is singular or not square.
    pub fn inverse(&self) -> Option<Self> {
        if !self.is_square() {
            return None;
        }
        let mut work = self.clone();
        let mut inv = Self::identity(self.rows);
        let Ok(rank) = work.eliminate::<Infallible>(true, |target, source| {
            inv.row_add(target, source);
            Ok(())
        });
        (rank == self.rows).then_some(inv)
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.cols, self.rows, |r, c| self.get(c, r))
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &Self) -> IrResult<Self> {
        if self.cols != other.rows {
            return Err(IrError::DimensionMismatch {
                expected: format!("{} rows", self.cols),
                found: format!("{} rows", other.rows),
            });
        }
        let mut out = Self::zeros(self.rows, other.cols);
        let s = out.stride;
        for i in 0..self.rows {
            for k in self.row_ones(i) {
                for (a, b) in out.words[i * s..(i + 1) * s]
                    .iter_mut()
                    .zip(other.row_words(k))
                {
                    *a ^= *b;
                }
            }
        }
        Ok(out)
    }

    /// Copy with rows and columns reordered: `out[r][c] = self[row_perm[r]][col_perm[c]]`.
    pub fn permuted(&self, row_perm: &[usize], col_perm: &[usize]) -> IrResult<Self> {
        check_permutation(row_perm, self.rows)?;
        check_permutation(col_perm, self.cols)?;
        Ok(Self::from_fn(self.rows, self.cols, |r, c| {
            self.get(row_perm[r], col_perm[c])
        }))
    }

    /// Copy restricted to the given rows and columns, in the given order.
    pub fn submatrix(&self, rows: &[usize], cols: &[usize]) -> Self {
        Self::from_fn(rows.len(), cols.len(), |r, c| self.get(rows[r], cols[c]))
    }

    /// Whether this is a square identity matrix.
    pub fn is_identity(&self) -> bool {
        self.is_square() && *self == Self::identity(self.rows)
    }

    /// Whether every entry below the diagonal is zero.
    pub fn is_upper_triangular(&self) -> bool {
        (0..self.rows).all(|r| self.row_ones(r).all(|c| c >= r))
    }

    /// Entries of `row` as 0/1 bytes.
    pub fn row_bits(&self, row: usize) -> Vec<u8> {
        (0..self.cols).map(|c| u8::from(self.get(row, c))).collect()
    }
}

/// Check that `perm` is a bijection on `0..n`.
pub fn check_permutation(perm: &[usize], n: usize) -> IrResult<()> {
    if perm.len() != n {
        return Err(IrError::InvalidPermutation(format!(
            "length {} does not match {n}",
            perm.len()
        )));
    }
    let mut seen = vec![false; n];
    for &p in perm {
        if p >= n || seen[p] {
            return Err(IrError::InvalidPermutation(format!(
                "{perm:?} is not a permutation of 0..{n}"
            )));
        }
        seen[p] = true;
    }
    Ok(())
}

/// Whether `perm` is a bijection on `0..perm.len()`.
pub fn is_permutation(perm: &[usize]) -> bool {
    check_permutation(perm, perm.len()).is_ok()
}

/// Inverse permutation: `inv[perm[i]] = i`.
pub fn invert_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    inv
}

impl RowOperations for GF2Matrix {
    fn row_add(&mut self, target: usize, source: usize) -> IrResult<()> {
        if target >= self.rows || source >= self.rows {
            return Err(IrError::DimensionMismatch {
                expected: format!("row indices below {}", self.rows),
                found: format!("row_add({target}, {source})"),
            });
        }
        GF2Matrix::row_add(self, target, source);
        Ok(())
    }
}

impl fmt::Display for GF2Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let line: Vec<&str> = (0..self.cols)
                .map(|c| if self.get(r, c) { "1" } else { "0" })
                .collect();
            writeln!(f, "[{}]", line.join(" "))?;
        }
        Ok(())
    }
}

impl fmt::Debug for GF2Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = self.clone().into();
        f.debug_struct("GF2Matrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("data", &rows)
            .finish()
    }
}

impl From<GF2Matrix> for Vec<String> {
    fn from(m: GF2Matrix) -> Self {
        (0..m.rows)
            .map(|r| {
                (0..m.cols)
                    .map(|c| if m.get(r, c) { '1' } else { '0' })
                    .collect()
            })
            .collect()
    }
}

impl TryFrom<Vec<String>> for GF2Matrix {
    type Error = IrError;

    fn try_from(rows: Vec<String>) -> IrResult<Self> {
        let bits: Vec<Vec<u8>> = rows
            .iter()
            .map(|row| {
                row.bytes()
                    .map(|b| b.wrapping_sub(b'0'))
                    .collect::<Vec<u8>>()
            })
            .collect();
        Self::from_rows(&bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn m(rows: &[&[u8]]) -> GF2Matrix {
        GF2Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_identity() {
        let id = GF2Matrix::identity(70);
        assert!(id.is_identity());
        assert_eq!(id.rank(), 70);
        assert_eq!(id.row_ones(65).collect::<Vec<_>>(), vec![65]);
    }

    #[test]
    fn test_row_add() {
        let mut a = m(&[&[1, 0, 1], &[0, 1, 1], &[0, 0, 1]]);
        a.row_add(0, 2);
        assert_eq!(a, m(&[&[1, 0, 0], &[0, 1, 1], &[0, 0, 1]]));
        a.row_add(2, 1);
        assert_eq!(a.row_bits(2), vec![0, 1, 0]);
    }

    #[test]
    fn test_col_add() {
        let mut a = m(&[&[1, 0], &[1, 1]]);
        a.col_add(1, 0);
        assert_eq!(a, m(&[&[1, 1], &[1, 0]]));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows: Vec<Vec<u8>> = vec![vec![1, 0], vec![1]];
        assert!(matches!(
            GF2Matrix::from_rows(&rows),
            Err(IrError::DimensionMismatch { .. })
        ));
        let rows: Vec<Vec<u8>> = vec![vec![2]];
        assert!(matches!(
            GF2Matrix::from_rows(&rows),
            Err(IrError::InvalidEntry { value: 2, .. })
        ));
    }

    #[test]
    fn test_gauss_upper_and_full() {
        let original = m(&[&[0, 1, 1], &[1, 1, 0], &[1, 0, 0]]);
        let mut upper = original.clone();
        assert_eq!(upper.gauss(false, None).unwrap(), 3);
        assert!(upper.is_upper_triangular());

        let mut full = original.clone();
        assert_eq!(full.gauss(true, None).unwrap(), 3);
        assert!(full.is_identity());
    }

    #[test]
    fn test_gauss_singular_rank() {
        let mut a = m(&[&[1, 1, 0], &[0, 1, 1], &[1, 0, 1]]);
        assert_eq!(a.gauss(true, None).unwrap(), 2);
        assert!(a.row_is_zero(2));
    }

    #[test]
    fn test_gauss_companion_tracks_operations() {
        let mut rng = StdRng::seed_from_u64(7);
        let original = GF2Matrix::random_invertible(9, &mut rng);
        let mut work = original.clone();
        let mut ops = GF2Matrix::identity(9);
        work.gauss(true, Some(&mut ops)).unwrap();
        // ops * original == reduced
        assert_eq!(ops.multiply(&original).unwrap(), work);
    }

    #[test]
    fn test_inverse() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in [1, 5, 64, 70] {
            let a = GF2Matrix::random_invertible(n, &mut rng);
            let inv = a.inverse().unwrap();
            assert!(a.multiply(&inv).unwrap().is_identity());
            assert!(inv.multiply(&a).unwrap().is_identity());
        }
    }

    #[test]
    fn test_inverse_singular_is_none() {
        let a = m(&[&[1, 1], &[1, 1]]);
        assert!(a.inverse().is_none());
        let rect = GF2Matrix::zeros(2, 3);
        assert!(rect.inverse().is_none());
    }

    #[test]
    fn test_transpose() {
        let a = m(&[&[1, 1, 0], &[0, 0, 1]]);
        let t = a.transpose();
        assert_eq!(t, m(&[&[1, 0], &[1, 0], &[0, 1]]));
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn test_permuted() {
        let a = m(&[&[1, 0, 0], &[1, 1, 0], &[0, 0, 1]]);
        let p = a.permuted(&[2, 0, 1], &[1, 2, 0]).unwrap();
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(p.get(r, c), a.get([2, 0, 1][r], [1, 2, 0][c]));
            }
        }
        assert!(a.permuted(&[0, 0, 1], &[0, 1, 2]).is_err());
    }

    #[test]
    fn test_permutation_helpers() {
        assert!(is_permutation(&[2, 0, 1]));
        assert!(!is_permutation(&[2, 2, 1]));
        assert!(!is_permutation(&[0, 3]));
        assert_eq!(invert_permutation(&[2, 0, 1]), vec![1, 2, 0]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let a = m(&[&[1, 0, 1], &[0, 1, 1]]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, r#"["101","011"]"#);
        let back: GF2Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert!(serde_json::from_str::<GF2Matrix>(r#"["12"]"#).is_err());
    }

    #[test]
    fn test_display() {
        let a = m(&[&[1, 0], &[0, 1]]);
        assert_eq!(a.to_string(), "[1 0]\n[0 1]\n");
    }
}
