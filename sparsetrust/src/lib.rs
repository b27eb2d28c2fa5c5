//! # Sparse Trust
//!
//! A library for computing EigenTrust global trust scores over sparse
//! local-trust networks.
//!
//! ## Main characteristics:
//!
//! **Sparse** - local trust and scores are held as ordered sparse
//! structures; memory and arithmetic scale with the number of expressed
//! opinions, not with the square of the peer count.
//!
//! **Numerically careful** - every accumulation uses Kahan-Babushka-
//! Neumaier compensated summation, so rows with thousands of entries and
//! wide magnitude spreads do not lose trust mass to rounding.
//!
//! **Concurrent** - each solver iteration distributes its row dot products
//! over a fixed worker pool, with deterministic output ordering and prompt
//! cooperative cancellation.
//!
//! ## Implementation
//!
//! The solver follows the original [Eigen Trust paper](http://ilpubs.stanford.edu:8090/562/1/2002-56.pdf),
//! extended with distrust discounting and a ranking-stability (flat-tail)
//! termination criterion.

// Rustc
#![warn(trivial_casts)]
#![deny(
	absolute_paths_not_starting_with_crate, deprecated, future_incompatible, missing_docs,
	nonstandard_style, unreachable_code, unreachable_patterns
)]
#![forbid(unsafe_code)]
// Clippy
#![allow(clippy::tabs_in_doc_comments, clippy::needless_range_loop, clippy::new_without_default)]
#![deny(
	// Complexity
 	clippy::unnecessary_cast,
	clippy::needless_question_mark,
	clippy::clone_on_copy,
	// Pedantic
 	clippy::cast_lossless,
 	clippy::cast_possible_wrap,
	// Perf
	clippy::redundant_clone,
	// Restriction
 	clippy::panic,
	// Style
 	clippy::let_and_return,
 	clippy::needless_borrow
)]

pub mod cancel;
pub mod canonicalize;
pub mod compute;
pub mod distrust;
pub mod error;
pub mod multiply;
pub mod sparse;
pub mod storage;
pub mod store;

use cancel::CancelSignal;
use canonicalize::{canonicalize_local_trust, canonicalize_matrix_rows, canonicalize_trust_vector};
use compute::{compute, ComputeOptions, FlatTailStats};
use distrust::{discount_trust_vector, extract_distrust};
use error::EigenError;
use sparse::{Matrix, Vector};

/// Default damping factor: the weight of pre-trust in every iteration.
pub const DEFAULT_ALPHA: f64 = 0.5;
/// Default convergence threshold on the iteration delta norm.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Runs the full trust pipeline on an owned local-trust matrix and
/// pre-trust vector.
///
/// Distrust is split off the signed input, both inputs are canonicalized
/// (with the dangling-row fix applied against the pre-trust vector), the
/// solver converges the damped power iteration, and the distrust matrix
/// discounts the converged scores. Returns the discounted trust vector
/// and the solver statistics.
pub async fn compute_global_trust(
	cancel: &CancelSignal, mut local_trust: Matrix, mut pre_trust: Vector, alpha: f64,
	epsilon: f64, opts: ComputeOptions,
) -> Result<(Vector, FlatTailStats), EigenError> {
	let mut distrust = extract_distrust(&mut local_trust)?;
	canonicalize_trust_vector(&mut pre_trust);
	canonicalize_local_trust(&mut local_trust, &pre_trust)?;

	let (mut trust, stats) =
		compute(cancel, &local_trust, &pre_trust, alpha, epsilon, opts).await?;

	canonicalize_matrix_rows(&mut distrust)?;
	discount_trust_vector(&mut trust, &distrust)?;
	Ok((trust, stats))
}

#[cfg(test)]
mod lib_tests {
	use crate::cancel::cancel_pair;
	use crate::compute::ComputeOptions;
	use crate::sparse::{Matrix, Vector};
	use crate::{compute_global_trust, DEFAULT_ALPHA, DEFAULT_EPSILON};

	#[tokio::test]
	async fn test_pipeline_with_distrust() {
		// Three mutually-trusting peers; peer 0 additionally distrusts
		// peer 3, who nobody trusts.
		let local_trust = Matrix::from_triples(
			4,
			4,
			[
				(0, 1, 1.0),
				(0, 3, -1.0),
				(1, 2, 1.0),
				(2, 0, 1.0),
				(3, 0, 1.0),
			],
		);
		let pre_trust = Vector::new(4);
		let (_handle, signal) = cancel_pair();

		let (trust, stats) = compute_global_trust(
			&signal,
			local_trust,
			pre_trust,
			DEFAULT_ALPHA,
			DEFAULT_EPSILON,
			ComputeOptions::default(),
		)
		.await
		.unwrap();

		assert!(stats.iterations >= 1);
		// Peer 3 only receives distrust and ends up below zero.
		assert!(trust.get(3) < 0.0);
		for index in 0..3 {
			assert!(trust.get(index) > 0.0);
		}
	}

	#[tokio::test]
	async fn test_pipeline_without_distrust_preserves_mass() {
		let local_trust =
			Matrix::from_triples(3, 3, [(0, 1, 2.0), (1, 2, 2.0), (2, 0, 2.0)]);
		let pre_trust = Vector::new(3);
		let (_handle, signal) = cancel_pair();

		let (trust, _stats) = compute_global_trust(
			&signal,
			local_trust,
			pre_trust,
			0.1,
			1e-9,
			ComputeOptions::default(),
		)
		.await
		.unwrap();

		assert!((trust.sum() - 1.0).abs() < 1e-9);
	}
}
