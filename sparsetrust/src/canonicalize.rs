//! # Canonicalization Module.
//!
//! This module contains the scaling policies that bring trust entries to
//! unit sum: the strict policy for local-trust and discount rows, and the
//! graceful uniform fallback reserved for pre-trust vectors.

use crate::error::EigenError;
use crate::sparse::{sum_entries, Entry, Matrix, Vector};

/// Scales entries in place so they sum to exactly one.
///
/// Fails with [`EigenError::ZeroSum`] when the entries sum to zero; entries
/// whose scaled value underflows to exactly `0.0` are compacted out.
pub fn canonicalize(entries: &mut Vec<Entry>) -> Result<(), EigenError> {
	let sum = sum_entries(entries);
	if sum == 0.0 {
		return Err(EigenError::ZeroSum);
	}
	for entry in entries.iter_mut() {
		entry.value /= sum;
	}
	entries.retain(|entry| entry.value != 0.0);
	Ok(())
}

/// Canonicalizes a pre-trust or initial-trust vector, never failing.
///
/// A zero-sum vector means "no opinion": its contents are replaced with
/// the dense uniform distribution `1/dim` instead of being treated as an
/// error. This graceful fallback is deliberately restricted to trust
/// vectors; every other call site canonicalizes strictly.
pub fn canonicalize_trust_vector(vector: &mut Vector) {
	if canonicalize(vector.entries_mut()).is_ok() {
		return;
	}
	let dim = vector.dim();
	if dim == 0 {
		return;
	}
	let uniform = 1.0 / dim as f64;
	*vector.entries_mut() = (0..dim).map(|index| Entry::new(index, uniform)).collect();
}

/// Strictly canonicalizes every non-empty row of a matrix.
///
/// Empty rows are left untouched. Used to prepare a distrust matrix for
/// [`crate::distrust::discount_trust_vector`].
pub fn canonicalize_matrix_rows(matrix: &mut Matrix) -> Result<(), EigenError> {
	for major in 0..matrix.major_dim() {
		let row = matrix.row_mut(major);
		if row.is_empty() {
			continue;
		}
		canonicalize(row)?;
	}
	Ok(())
}

/// Row-canonicalizes a local trust matrix against a pre-trust vector.
///
/// Each row is canonicalized independently. A row that fails strict
/// canonicalization with a zero sum belongs to a dangling peer who trusts
/// no one; it is replaced wholesale by a copy of the pre-trust entries,
/// the standard dangling-node fix shared with PageRank-family algorithms.
/// The pre-trust vector is taken as given and is expected to be already
/// canonicalized.
pub fn canonicalize_local_trust(
	local_trust: &mut Matrix, pre_trust: &Vector,
) -> Result<(), EigenError> {
	let dim = local_trust.square_dim()?;
	if pre_trust.dim() != dim {
		return Err(EigenError::DimensionMismatch(format!(
			"pre-trust dimension {} does not match local trust dimension {}",
			pre_trust.dim(),
			dim
		)));
	}

	for major in 0..dim {
		let row = local_trust.row_mut(major);
		match canonicalize(row) {
			Ok(()) => {},
			Err(EigenError::ZeroSum) => {
				*row = pre_trust.entries().to_vec();
			},
			Err(err) => return Err(err),
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sparse::Matrix;
	use rand::rngs::StdRng;
	use rand::{Rng, SeedableRng};

	fn entries(pairs: &[(usize, f64)]) -> Vec<Entry> {
		pairs.iter().map(|&(i, v)| Entry::new(i, v)).collect()
	}

	#[test]
	fn test_canonicalize_scales_to_unit_sum() {
		let mut row = entries(&[(0, 1.0), (2, 3.0)]);
		canonicalize(&mut row).unwrap();
		assert_eq!(row, entries(&[(0, 0.25), (2, 0.75)]));

		let total: f64 = row.iter().map(|entry| entry.value).sum();
		assert!((total - 1.0).abs() < 1e-9);
	}

	#[test]
	fn test_canonicalize_random_entries_sum_to_one() {
		let mut rng = StdRng::seed_from_u64(11);
		for _ in 0..100 {
			let mut row = Vec::new();
			for index in 0..64 {
				if rng.gen_bool(0.5) {
					row.push(Entry::new(index, rng.gen_range(1e-6..1e6)));
				}
			}
			if row.is_empty() {
				continue;
			}
			canonicalize(&mut row).unwrap();
			let total: f64 = row.iter().map(|entry| entry.value).sum();
			assert!((total - 1.0).abs() < 1e-9);
		}
	}

	#[test]
	fn test_canonicalize_zero_sum_fails() {
		let mut empty: Vec<Entry> = Vec::new();
		assert!(matches!(canonicalize(&mut empty), Err(EigenError::ZeroSum)));

		let mut cancelling = entries(&[(0, 2.0), (1, -2.0)]);
		assert!(matches!(
			canonicalize(&mut cancelling),
			Err(EigenError::ZeroSum)
		));
	}

	#[test]
	fn test_canonicalize_trust_vector_uniform_fallback() {
		let mut v = Vector::new(4);
		canonicalize_trust_vector(&mut v);
		assert_eq!(v.nnz(), 4);
		for index in 0..4 {
			assert_eq!(v.get(index), 0.25);
		}
	}

	#[test]
	fn test_canonicalize_trust_vector_nonzero_input() {
		let mut v = Vector::from_entries(4, entries(&[(1, 1.0), (3, 3.0)]));
		canonicalize_trust_vector(&mut v);
		assert_eq!(v.get(1), 0.25);
		assert_eq!(v.get(3), 0.75);
		assert_eq!(v.nnz(), 2);
	}

	#[test]
	fn test_canonicalize_trust_vector_zero_dim() {
		let mut v = Vector::new(0);
		canonicalize_trust_vector(&mut v);
		assert_eq!(v.nnz(), 0);
	}

	#[test]
	fn test_canonicalize_local_trust_rows_sum_to_one_or_equal_pre_trust() {
		let mut c = Matrix::from_triples(
			3,
			3,
			[(0, 1, 2.0), (0, 2, 2.0), (2, 0, 5.0)],
		);
		let mut p = Vector::from_entries(3, entries(&[(0, 1.0), (1, 1.0)]));
		canonicalize_trust_vector(&mut p);

		canonicalize_local_trust(&mut c, &p).unwrap();

		assert_eq!(c.row(0), &entries(&[(1, 0.5), (2, 0.5)])[..]);
		// Row 1 is dangling and becomes the pre-trust row.
		assert_eq!(c.row(1), p.entries());
		assert_eq!(c.row(2), &entries(&[(0, 1.0)])[..]);
	}

	#[test]
	fn test_canonicalize_local_trust_both_zero_sum() {
		// Dangling row plus an all-zero pre-trust: the row ends up equal to
		// the (empty) pre-trust entries, with no error raised.
		let mut c = Matrix::from_triples(2, 2, [(0, 1, 1.0)]);
		let p = Vector::new(2);

		canonicalize_local_trust(&mut c, &p).unwrap();
		assert_eq!(c.row(0), &entries(&[(1, 1.0)])[..]);
		assert!(c.row(1).is_empty());
	}

	#[test]
	fn test_canonicalize_local_trust_rejects_non_square() {
		let mut c = Matrix::new(2, 3);
		let p = Vector::new(2);
		assert!(matches!(
			canonicalize_local_trust(&mut c, &p),
			Err(EigenError::DimensionMismatch(_))
		));
	}
}
