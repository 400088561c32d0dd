//! Method-switching matrices.
//!
//! A [`SwitchingMatrix`] is square over the method registry order:
//! `get(src, dst)` is the annual probability that someone on method `src`
//! is on method `dst` a year later. Rows are stochastic. Edits leave the
//! off-diagonal cells as written and let the stay probability (the
//! diagonal) absorb the difference, via [`SwitchingMatrix::rebalance_row`].
//!
//! The matrix works in registry indices only; name resolution and error
//! context live on [`crate::config::ModelConfig`].

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Tolerance on row sums. Matrices are edited with exact arithmetic but
/// arrive from files with whatever precision the author typed.
pub const ROW_EPS: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchingMatrix {
    n: usize,
    /// Row-major cells, `n * n` of them.
    cells: Vec<f64>,
}

impl SwitchingMatrix {
    /// Matrix where everyone keeps their current method.
    pub fn identity(n: usize) -> Self {
        let mut cells = vec![0.0; n * n];
        for i in 0..n {
            cells[i * n + i] = 1.0;
        }
        SwitchingMatrix { n, cells }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut cells = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(ModelError::InvalidMatrix(format!(
                    "row {i} has {} entries, expected {n}",
                    row.len()
                )));
            }
            cells.extend_from_slice(row);
        }
        let matrix = SwitchingMatrix { n, cells };
        matrix.check(n)?;
        Ok(matrix)
    }

    /// Number of methods the matrix covers.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, src: usize, dst: usize) -> f64 {
        self.cells[src * self.n + dst]
    }

    pub fn row(&self, src: usize) -> &[f64] {
        &self.cells[src * self.n..(src + 1) * self.n]
    }

    pub fn row_sum(&self, src: usize) -> f64 {
        self.row(src).iter().sum()
    }

    /// Row scaled to sum to one. Input precision can leave sums slightly
    /// off; transition math always goes through this.
    pub fn normalized_row(&self, src: usize) -> Vec<f64> {
        let row = self.row(src);
        let sum = self.row_sum(src);
        if sum > 0.0 {
            row.iter().map(|p| p / sum).collect()
        } else {
            row.to_vec()
        }
    }

    pub(crate) fn set_raw(&mut self, src: usize, dst: usize, value: f64) {
        self.cells[src * self.n + dst] = value;
    }

    /// Recomputes the diagonal of `row` so the row sums to one again.
    /// Returns the new stay probability, or `None` when the off-diagonal
    /// mass already exceeds one.
    pub fn rebalance_row(&mut self, row: usize) -> Option<f64> {
        let off: f64 = self
            .row(row)
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != row)
            .map(|(_, p)| p)
            .sum();
        let mut diag = 1.0 - off;
        if diag < -ROW_EPS {
            return None;
        }
        if diag < 0.0 {
            diag = 0.0;
        }
        self.set_raw(row, row, diag);
        Some(diag)
    }

    /// Grows the matrix by one method cloned from `template`.
    ///
    /// The new row copies the template row (the template's stay probability
    /// becomes the new method's stay probability) and the new column copies
    /// the template column, so people start and resume the new method at the
    /// template's rates. No flow is created between template and clone.
    ///
    /// Every pre-existing row other than the template's gains column mass,
    /// so the caller must [`SwitchingMatrix::rebalance_row`] each row
    /// afterwards.
    pub fn add_method_like(&mut self, template: usize) -> usize {
        let old_n = self.n;
        let new = old_n;
        let n = old_n + 1;
        let mut cells = vec![0.0; n * n];
        for i in 0..old_n {
            for j in 0..old_n {
                cells[i * n + j] = self.get(i, j);
            }
        }
        for i in 0..old_n {
            if i != template {
                cells[i * n + new] = self.get(i, template);
            }
        }
        for j in 0..old_n {
            if j != template {
                cells[new * n + j] = self.get(template, j);
            }
        }
        cells[new * n + new] = self.get(template, template);
        self.n = n;
        self.cells = cells;
        new
    }

    /// Shape and probability checks against an expected method count.
    pub fn check(&self, expected: usize) -> Result<()> {
        if self.n != expected {
            return Err(ModelError::InvalidMatrix(format!(
                "covers {} methods, expected {expected}",
                self.n
            )));
        }
        if self.cells.len() != self.n * self.n {
            return Err(ModelError::InvalidMatrix(format!(
                "{} cells for a {n} x {n} matrix",
                self.cells.len(),
                n = self.n
            )));
        }
        for (i, cell) in self.cells.iter().enumerate() {
            if !cell.is_finite() || !(0.0..=1.0).contains(cell) {
                return Err(ModelError::InvalidMatrix(format!(
                    "cell ({}, {}) is {cell}, expected a probability",
                    i / self.n,
                    i % self.n
                )));
            }
        }
        for i in 0..self.n {
            let sum = self.row_sum(i);
            if (sum - 1.0).abs() > ROW_EPS {
                return Err(ModelError::InvalidMatrix(format!(
                    "row {i} sums to {sum}, expected 1"
                )));
            }
        }
        Ok(())
    }
}
