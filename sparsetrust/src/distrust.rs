//! # Distrust Module.
//!
//! This module contains the extraction of distrust from a signed
//! local-trust matrix, and the post-convergence discounting of global
//! trust scores.

use crate::error::EigenError;
use crate::sparse::{Entry, Matrix, Vector};

/// Splits a signed local-trust matrix into trust and distrust.
///
/// The matrix is mutated in place to keep only its strictly positive
/// entries; the returned matrix of identical dimensions holds the absolute
/// values of the strictly negative entries. Zero entries are dropped from
/// both. The split is a partition: re-merging `trust - distrust` entrywise
/// reconstructs the original matrix.
pub fn extract_distrust(local_trust: &mut Matrix) -> Result<Matrix, EigenError> {
	let dim = local_trust.square_dim()?;
	let mut distrust = Matrix::new(dim, dim);

	for major in 0..dim {
		let row = local_trust.row_mut(major);
		let signed = std::mem::take(row);
		let mut negatives = Vec::new();
		for entry in signed {
			if entry.value > 0.0 {
				row.push(entry);
			} else if entry.value < 0.0 {
				negatives.push(Entry::new(entry.index, -entry.value));
			}
		}
		// Both partitions inherit the source row's ordering.
		*distrust.row_mut(major) = negatives;
	}
	Ok(distrust)
}

/// Applies distrust discounting to a converged trust vector.
///
/// For every distrust entry `(i, j, w)`, where truster `i` distrusts
/// trustee `j` with canonical weight `w`, the trustee loses `w * t[i]`:
/// `t[i]` is the distruster's global trust *before any discount*. All
/// discounts read from a single snapshot of the input vector, so the
/// outcome is independent of application order, and a peer with zero
/// global trust contributes no discount at all. The distrust matrix is
/// expected to be row-canonicalized
/// (see [`crate::canonicalize::canonicalize_matrix_rows`]).
pub fn discount_trust_vector(
	trust: &mut Vector, distrust: &Matrix,
) -> Result<(), EigenError> {
	let dim = distrust.square_dim()?;
	if trust.dim() != dim {
		return Err(EigenError::DimensionMismatch(format!(
			"trust dimension {} does not match distrust dimension {}",
			trust.dim(),
			dim
		)));
	}

	// Iterating the snapshot's entries skips zero-trust distrusters.
	let snapshot = trust.clone();
	for truster in snapshot.entries() {
		for discount in distrust.row(truster.index) {
			let discounted = trust.get(discount.index) - discount.value * truster.value;
			trust.set(discount.index, discounted);
		}
	}
	Ok(())
}
