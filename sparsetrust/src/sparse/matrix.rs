//! # Sparse Matrix Module.
//!
//! This module contains the row-compressed sparse matrix. The
//! column-compressed dual is the same type with major and minor swapped,
//! produced by [`Matrix::transpose`].

use crate::error::EigenError;
use crate::sparse::{merge_entries, normalize_entries, Entry, Vector};

/// A row-compressed sparse matrix: one ordered entry sequence per major
/// (row) index.
///
/// For local trust the matrix must be square; dimension mismatches are
/// always reported as explicit errors, never silently coerced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix {
	major_dim: usize,
	minor_dim: usize,
	rows: Vec<Vec<Entry>>,
}

impl Matrix {
	/// Creates an empty matrix of the given dimensions.
	pub fn new(major_dim: usize, minor_dim: usize) -> Self {
		Self {
			major_dim,
			minor_dim,
			rows: vec![Vec::new(); major_dim],
		}
	}

	/// Builds a matrix from `(major, minor, value)` triples.
	///
	/// Within each row, duplicate minor indices are merged by summation and
	/// exact zeros are dropped.
	pub fn from_triples<I>(major_dim: usize, minor_dim: usize, triples: I) -> Self
	where
		I: IntoIterator<Item = (usize, usize, f64)>,
	{
		let mut raw_rows: Vec<Vec<Entry>> = vec![Vec::new(); major_dim];
		for (major, minor, value) in triples {
			debug_assert!(major < major_dim && minor < minor_dim);
			raw_rows[major].push(Entry::new(minor, value));
		}
		let rows = raw_rows.into_iter().map(normalize_entries).collect();
		Self { major_dim, minor_dim, rows }
	}

	/// Returns `(major_dim, minor_dim)`.
	pub fn dims(&self) -> (usize, usize) {
		(self.major_dim, self.minor_dim)
	}

	/// Returns the major dimension (row count).
	pub fn major_dim(&self) -> usize {
		self.major_dim
	}

	/// Returns the minor dimension (column count).
	pub fn minor_dim(&self) -> usize {
		self.minor_dim
	}

	/// Returns the dimension of a square matrix, or a dimension-mismatch
	/// error for a rectangular one.
	pub fn square_dim(&self) -> Result<usize, EigenError> {
		if self.major_dim != self.minor_dim {
			return Err(EigenError::DimensionMismatch(format!(
				"matrix of {}x{} is not square",
				self.major_dim, self.minor_dim
			)));
		}
		Ok(self.major_dim)
	}

	/// Total number of stored (non-zero) entries.
	pub fn nnz(&self) -> usize {
		self.rows.iter().map(Vec::len).sum()
	}

	/// Resizes the matrix in place.
	///
	/// Shrinking drops rows with major index `>= major_dim` and entries
	/// with minor index `>= minor_dim`; growing never touches existing
	/// entries.
	pub fn set_dim(&mut self, major_dim: usize, minor_dim: usize) {
		self.rows.resize_with(major_dim, Vec::new);
		if minor_dim < self.minor_dim {
			for row in &mut self.rows {
				row.retain(|entry| entry.index < minor_dim);
			}
		}
		self.major_dim = major_dim;
		self.minor_dim = minor_dim;
	}

	/// Borrowing view of row `major`: read-only, lifetime-bound to the
	/// matrix.
	pub fn row(&self, major: usize) -> &[Entry] {
		&self.rows[major]
	}

	/// Owned clone of row `major` as a vector of dimension `minor_dim`.
	pub fn row_vector(&self, major: usize) -> Vector {
		Vector::from_entries(self.minor_dim, self.rows[major].clone())
	}

	/// Replaces row `major` with the given raw entries, normalizing them.
	pub fn set_row(&mut self, major: usize, entries: Vec<Entry>) {
		let entries = normalize_entries(entries);
		debug_assert!(entries.iter().all(|entry| entry.index < self.minor_dim));
		self.rows[major] = entries;
	}

	/// Mutable access to a row's entry storage for same-crate algorithms
	/// that uphold the ordering invariant themselves.
	pub(crate) fn row_mut(&mut self, major: usize) -> &mut Vec<Entry> {
		&mut self.rows[major]
	}

	/// Rebuilds the matrix with rows and columns swapped.
	///
	/// Counts nonzeros per target row first to pre-size the storage, then
	/// scatters entries, in `O(nnz + minor_dim)`. Scattering in major order
	/// leaves every target row sorted.
	pub fn transpose(&self) -> Matrix {
		let mut counts = vec![0usize; self.minor_dim];
		for row in &self.rows {
			for entry in row {
				counts[entry.index] += 1;
			}
		}

		let mut rows: Vec<Vec<Entry>> =
			counts.into_iter().map(Vec::with_capacity).collect();
		for (major, row) in self.rows.iter().enumerate() {
			for entry in row {
				rows[entry.index].push(Entry::new(major, entry.value));
			}
		}

		Matrix {
			major_dim: self.minor_dim,
			minor_dim: self.major_dim,
			rows,
		}
	}

	/// Destructive union with another matrix.
	///
	/// The result takes the elementwise maximum of both dimension pairs; on
	/// a cell collision the entry of `other` wins. `other` gives up its row
	/// storage and is reset to an empty zero-dimension matrix.
	pub fn merge(&mut self, other: &mut Matrix) {
		let incoming = std::mem::take(other);
		let major_dim = self.major_dim.max(incoming.major_dim);
		let minor_dim = self.minor_dim.max(incoming.minor_dim);
		self.rows.resize_with(major_dim, Vec::new);

		for (major, row) in incoming.rows.into_iter().enumerate() {
			if row.is_empty() {
				continue;
			}
			let own = std::mem::take(&mut self.rows[major]);
			self.rows[major] = merge_entries(own, row);
		}
		self.major_dim = major_dim;
		self.minor_dim = minor_dim;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn matrix(major: usize, minor: usize, triples: &[(usize, usize, f64)]) -> Matrix {
		Matrix::from_triples(major, minor, triples.iter().copied())
	}

	#[test]
	fn test_from_triples_normalizes_rows() {
		let m = matrix(2, 3, &[(0, 2, 1.0), (0, 0, 2.0), (0, 2, 0.5), (1, 1, 0.0)]);
		assert_eq!(m.row(0), &[Entry::new(0, 2.0), Entry::new(2, 1.5)]);
		assert!(m.row(1).is_empty());
		assert_eq!(m.nnz(), 2);
	}

	#[test]
	fn test_square_dim() {
		assert_eq!(matrix(3, 3, &[]).square_dim().unwrap(), 3);
		assert!(matches!(
			matrix(3, 4, &[]).square_dim(),
			Err(EigenError::DimensionMismatch(_))
		));
	}

	#[test]
	fn test_set_dim_shrink() {
		let mut m = matrix(3, 3, &[(0, 0, 1.0), (0, 2, 2.0), (2, 1, 3.0)]);
		m.set_dim(2, 2);
		assert_eq!(m.dims(), (2, 2));
		assert_eq!(m.row(0), &[Entry::new(0, 1.0)]);
		assert!(m.row(1).is_empty());
	}

	#[test]
	fn test_set_dim_grow_keeps_entries() {
		let mut m = matrix(2, 2, &[(1, 0, 4.0)]);
		m.set_dim(4, 5);
		assert_eq!(m.dims(), (4, 5));
		assert_eq!(m.row(1), &[Entry::new(0, 4.0)]);
		assert!(m.row(3).is_empty());
	}

	#[test]
	fn test_row_vector_is_owned_clone() {
		let mut m = matrix(2, 3, &[(0, 1, 5.0)]);
		let row = m.row_vector(0);
		m.set_row(0, vec![Entry::new(2, 7.0)]);
		assert_eq!(row.entries(), &[Entry::new(1, 5.0)]);
		assert_eq!(row.dim(), 3);
	}

	#[test]
	fn test_transpose() {
		let m = matrix(
			2,
			3,
			&[(0, 0, 1.0), (0, 2, 2.0), (1, 0, 3.0), (1, 1, 4.0)],
		);
		let t = m.transpose();
		assert_eq!(t.dims(), (3, 2));
		assert_eq!(t.row(0), &[Entry::new(0, 1.0), Entry::new(1, 3.0)]);
		assert_eq!(t.row(1), &[Entry::new(1, 4.0)]);
		assert_eq!(t.row(2), &[Entry::new(0, 2.0)]);
	}

	#[test]
	fn test_transpose_twice_is_identity() {
		let m = matrix(
			3,
			3,
			&[(0, 1, 1.0), (1, 2, 2.0), (2, 0, 3.0), (2, 2, 4.0)],
		);
		assert_eq!(m.transpose().transpose(), m);
	}

	#[test]
	fn test_merge_second_operand_wins_and_resets() {
		let mut a = matrix(2, 2, &[(0, 0, 1.0), (1, 1, 2.0)]);
		let mut b = matrix(3, 2, &[(1, 1, 9.0), (2, 0, 3.0)]);
		a.merge(&mut b);

		assert_eq!(a.dims(), (3, 2));
		assert_eq!(a.row(0), &[Entry::new(0, 1.0)]);
		assert_eq!(a.row(1), &[Entry::new(1, 9.0)]);
		assert_eq!(a.row(2), &[Entry::new(0, 3.0)]);
		assert_eq!(b.dims(), (0, 0));
	}
}
