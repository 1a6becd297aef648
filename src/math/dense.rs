//! Small dynamically sized vectors and matrices for the constraint solver.
//!
//! Constraint Jacobians are 1×6 or 2×6 and the systems we solve are at most 2×2,
//! so these are deliberately simple heap-backed types rather than anything clever.

use std::ops::{Add, Index, IndexMut, Mul, Sub};

/// Below this magnitude a diagonal element is treated as zero by the Gauss-Seidel solver.
const DIAGONAL_EPSILON: f64 = 1e-12;

/// A vector of arbitrary length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VecN(Vec<f64>);

impl VecN {
    pub fn zeros(len: usize) -> Self {
        VecN(vec![0.0; len])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dot(&self, other: &VecN) -> f64 {
        debug_assert_eq!(self.len(), other.len(), "dot product of mismatched vectors");
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }

    /// True if no element is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for VecN {
    fn from(v: Vec<f64>) -> Self {
        VecN(v)
    }
}

impl Index<usize> for VecN {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}
impl IndexMut<usize> for VecN {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl Add<&VecN> for &VecN {
    type Output = VecN;
    fn add(self, other: &VecN) -> VecN {
        debug_assert_eq!(self.len(), other.len());
        VecN(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }
}
impl Sub<&VecN> for &VecN {
    type Output = VecN;
    fn sub(self, other: &VecN) -> VecN {
        debug_assert_eq!(self.len(), other.len());
        VecN(self.0.iter().zip(&other.0).map(|(a, b)| a - b).collect())
    }
}
impl Mul<f64> for &VecN {
    type Output = VecN;
    fn mul(self, s: f64) -> VecN {
        VecN(self.0.iter().map(|a| a * s).collect())
    }
}

/// A row-major matrix with `rows × cols` elements.
#[derive(Clone, Debug, PartialEq)]
pub struct MatMN {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl MatMN {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        MatMN {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create a square matrix with the given diagonal and zeros elsewhere.
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let n = diag.len();
        let mut m = Self::zeros(n, n);
        for (i, d) in diag.iter().enumerate() {
            m[(i, i)] = *d;
        }
        m
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn transpose(&self) -> MatMN {
        let mut t = MatMN::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                t[(c, r)] = self[(r, c)];
            }
        }
        t
    }

    pub fn mul_vec(&self, v: &VecN) -> VecN {
        debug_assert_eq!(self.cols, v.len(), "matrix-vector size mismatch");
        VecN(
            (0..self.rows)
                .map(|r| self.row(r).iter().zip(v.as_slice()).map(|(a, b)| a * b).sum())
                .collect(),
        )
    }

    pub fn mul_mat(&self, other: &MatMN) -> MatMN {
        debug_assert_eq!(self.cols, other.rows, "matrix-matrix size mismatch");
        let mut out = MatMN::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for c in 0..other.cols {
                out[(r, c)] = (0..self.cols).map(|k| self[(r, k)] * other[(k, c)]).sum();
            }
        }
        out
    }

    /// Approximately solve `self * x = b` for square `self` with Gauss-Seidel iteration.
    ///
    /// Runs one sweep per unknown. Unknowns whose diagonal element is zero are left at zero,
    /// and updates that would introduce a NaN or infinity are skipped.
    pub fn solve_gauss_seidel(&self, b: &VecN) -> VecN {
        debug_assert_eq!(self.rows, self.cols, "Gauss-Seidel needs a square matrix");
        debug_assert_eq!(self.rows, b.len());
        let n = b.len();
        let mut x = VecN::zeros(n);
        for _ in 0..n {
            for i in 0..n {
                let diag = self[(i, i)];
                if diag.abs() < DIAGONAL_EPSILON {
                    continue;
                }
                let row_dot_x: f64 = self.row(i).iter().zip(x.as_slice()).map(|(a, b)| a * b).sum();
                let dx = (b[i] - row_dot_x) / diag;
                if dx.is_finite() {
                    x[i] += dx;
                }
            }
        }
        x
    }
}

impl Index<(usize, usize)> for MatMN {
    type Output = f64;
    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        &self.data[r * self.cols + c]
    }
}
impl IndexMut<(usize, usize)> for MatMN {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        &mut self.data[r * self.cols + c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_and_products() {
        let mut m = MatMN::zeros(2, 3);
        m.row_mut(0).copy_from_slice(&[1.0, 2.0, 3.0]);
        m.row_mut(1).copy_from_slice(&[4.0, 5.0, 6.0]);

        let t = m.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t[(2, 1)], 6.0);

        let v = VecN::from(vec![1.0, 0.0, -1.0]);
        assert_eq!(m.mul_vec(&v), VecN::from(vec![-2.0, -2.0]));

        let mmt = m.mul_mat(&t);
        assert_eq!(mmt[(0, 0)], 14.0);
        assert_eq!(mmt[(0, 1)], 32.0);
        assert_eq!(mmt[(1, 1)], 77.0);
    }

    #[test]
    fn gauss_seidel_single_unknown_is_exact() {
        let a = MatMN::from_diagonal(&[4.0]);
        let x = a.solve_gauss_seidel(&VecN::from(vec![2.0]));
        assert_eq!(x[0], 0.5);
    }

    #[test]
    fn gauss_seidel_diagonally_dominant() {
        let mut a = MatMN::zeros(2, 2);
        a.row_mut(0).copy_from_slice(&[4.0, 1.0]);
        a.row_mut(1).copy_from_slice(&[1.0, 3.0]);
        // exact solution is (1/11, 7/11), two sweeps get close
        let x = a.solve_gauss_seidel(&VecN::from(vec![1.0, 2.0]));
        assert!((x[0] - 1.0 / 11.0).abs() < 0.02);
        assert!((x[1] - 7.0 / 11.0).abs() < 0.01);
    }

    #[test]
    fn gauss_seidel_zero_diagonal_stays_finite() {
        let a = MatMN::from_diagonal(&[2.0, 0.0]);
        let x = a.solve_gauss_seidel(&VecN::from(vec![1.0, 1.0]));
        assert!(x.is_finite());
        assert_eq!(x[0], 0.5);
        assert_eq!(x[1], 0.0);
    }

    #[test]
    fn vector_ops() {
        let a = VecN::from(vec![1.0, 2.0]);
        let b = VecN::from(vec![3.0, -1.0]);
        assert_eq!(a.dot(&b), 1.0);
        assert_eq!(&a + &b, VecN::from(vec![4.0, 1.0]));
        assert_eq!(&a - &b, VecN::from(vec![-2.0, 3.0]));
        assert_eq!(&a * 2.0, VecN::from(vec![2.0, 4.0]));
        assert!(!VecN::from(vec![f64::NAN]).is_finite());
    }
}
