//! # Compute Module.
//!
//! This module contains the iterative EigenTrust solver: a damped power
//! iteration over the transposed local-trust matrix, terminated by the
//! epsilon criterion and, optionally, ranking (flat-tail) stability.

use crate::cancel::CancelSignal;
use crate::error::EigenError;
use crate::multiply::multiply;
use crate::sparse::{Matrix, Vector};
use log::{debug, info};
use std::sync::Arc;

/// Configuration options recognized by [`compute`].
#[derive(Debug, Default)]
pub struct ComputeOptions {
	/// Starting trust vector; defaults to the pre-trust vector.
	pub initial_trust: Option<Vector>,
	/// Caller-supplied storage whose allocation is reused for the result.
	pub result_in: Option<Vector>,
	/// Required flat-tail length; `0` disables the ranking-stability
	/// criterion.
	pub flat_tail: usize,
	/// Restricts the ranking check to the top `num_leaders` peers; `0`
	/// ranks everyone.
	pub num_leaders: usize,
	/// Iteration budget; `0` means unbounded.
	pub max_iterations: usize,
	/// Iterations to run before termination is considered; `0` is treated
	/// as `1`.
	pub min_iterations: usize,
	/// How often, in iterations, the ranking check is evaluated; `0` is
	/// treated as `1`.
	pub check_freq: usize,
}

/// Statistics emitted by [`compute`] for observability.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlatTailStats {
	/// Total iterations run.
	pub iterations: usize,
	/// Iteration at which the terminal run of stable rankings began.
	pub start_iteration: usize,
	/// Flat-tail length that was required to terminate.
	pub threshold: usize,
	/// Delta norm of the final iteration.
	pub delta_norm: f64,
	/// Final ranking by descending score, ties broken by ascending index.
	pub ranking: Vec<usize>,
}

/// Computes the converged global trust vector.
///
/// Iterates `t_{k+1} = (1 - alpha) · Cᵗ · t_k + alpha · p` with the
/// concurrent multiplier until `‖t_{k+1} - t_k‖₂ <= epsilon` and, when a
/// flat tail is requested, the ranking has been stable for the required
/// run of evaluated iterations. The inputs are never mutated; `local_trust`
/// must be row-canonicalized and `pre_trust` canonicalized by the caller.
///
/// Fails fast on any input contract violation before the first iteration,
/// with [`EigenError::DidNotConverge`] when the iteration budget runs out,
/// and with [`EigenError::Cancelled`] when the cancellation signal fires.
pub async fn compute(
	cancel: &CancelSignal, local_trust: &Matrix, pre_trust: &Vector, alpha: f64, epsilon: f64,
	opts: ComputeOptions,
) -> Result<(Vector, FlatTailStats), EigenError> {
	let dim = local_trust.square_dim()?;
	if pre_trust.dim() != dim {
		return Err(EigenError::DimensionMismatch(format!(
			"pre-trust dimension {} does not match local trust dimension {}",
			pre_trust.dim(),
			dim
		)));
	}
	if !(0.0..=1.0).contains(&alpha) {
		return Err(EigenError::ParamOutOfRange(format!(
			"alpha {} outside [0, 1]",
			alpha
		)));
	}
	if !(epsilon > 0.0) {
		return Err(EigenError::ParamOutOfRange(format!(
			"epsilon {} must be positive",
			epsilon
		)));
	}
	let initial = opts.initial_trust.as_ref().unwrap_or(pre_trust);
	if initial.dim() != dim {
		return Err(EigenError::DimensionMismatch(format!(
			"initial trust dimension {} does not match local trust dimension {}",
			initial.dim(),
			dim
		)));
	}
	let min_iterations = opts.min_iterations.max(1);
	let check_freq = opts.check_freq.max(1);

	// The iteration multiplies by the transpose; C itself stays untouched.
	let transposed = Arc::new(local_trust.transpose());
	let mut damped_pre_trust = pre_trust.clone();
	damped_pre_trust.scale(alpha);

	let mut t = Arc::new(initial.clone());
	let mut iterations = 0usize;
	let mut delta_norm = f64::INFINITY;
	let mut flat_len = 0usize;
	let mut flat_start = 0usize;
	let mut last_ranking: Option<Vec<usize>> = None;

	loop {
		if cancel.is_cancelled() {
			return Err(EigenError::Cancelled);
		}
		if opts.max_iterations > 0 && iterations >= opts.max_iterations {
			info!(
				"no convergence after {} iterations, delta norm {:e}",
				iterations, delta_norm
			);
			return Err(EigenError::DidNotConverge { iterations });
		}

		let mut t_next =
			multiply(Arc::clone(&transposed), Arc::clone(&t), cancel.clone()).await?;
		t_next.scale(1.0 - alpha);
		let t_next = t_next.add(&damped_pre_trust)?;
		delta_norm = t_next.sub(&t)?.norm2();
		iterations += 1;
		debug!("iteration {}: delta norm {:e}", iterations, delta_norm);

		let mut ranking_stable = opts.flat_tail == 0;
		if opts.flat_tail > 0 {
			if iterations >= min_iterations && iterations % check_freq == 0 {
				let ranking = rank_by_score(&t_next, opts.num_leaders);
				match &last_ranking {
					Some(previous) if *previous == ranking => flat_len += 1,
					_ => {
						flat_len = 0;
						flat_start = iterations;
					},
				}
				last_ranking = Some(ranking);
			}
			ranking_stable = flat_len >= opts.flat_tail;
		}

		t = Arc::new(t_next);
		if delta_norm <= epsilon && ranking_stable && iterations >= min_iterations {
			break;
		}
	}
	info!(
		"converged after {} iterations, delta norm {:e}",
		iterations, delta_norm
	);

	let ranking = match last_ranking {
		Some(ranking) => ranking,
		None => rank_by_score(&t, opts.num_leaders),
	};
	let stats = FlatTailStats {
		iterations,
		start_iteration: flat_start,
		threshold: opts.flat_tail,
		delta_norm,
		ranking,
	};

	let converged = Arc::try_unwrap(t).unwrap_or_else(|shared| (*shared).clone());
	let result = match opts.result_in {
		Some(mut out) => {
			out.assign(converged);
			out
		},
		None => converged,
	};
	Ok((result, stats))
}

/// Ranks the vector's peers by descending score, ties broken by ascending
/// index, truncated to the top `num_leaders` when `num_leaders > 0`.
fn rank_by_score(t: &Vector, num_leaders: usize) -> Vec<usize> {
	let mut ranked: Vec<(usize, f64)> =
		t.entries().iter().map(|entry| (entry.index, entry.value)).collect();
	ranked.sort_unstable_by(|a, b| {
		b.1.partial_cmp(&a.1)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| a.0.cmp(&b.0))
	});
	let mut ranking: Vec<usize> = ranked.into_iter().map(|(index, _)| index).collect();
	if num_leaders > 0 && ranking.len() > num_leaders {
		ranking.truncate(num_leaders);
	}
	ranking
}
