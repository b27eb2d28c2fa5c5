//! # Concurrent Multiply Module.
//!
//! This module contains the worker-pool sparse matrix-vector multiplier
//! used by each solver iteration. The pool is created and torn down within
//! a single call; a producer enumerates row indices into a bounded job
//! queue, workers compute row dot products, and the calling task collects
//! and orders the results.

use crate::cancel::CancelSignal;
use crate::error::EigenError;
use crate::sparse::{dot_entries, Entry, Matrix, Vector};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Fixed size of the worker pool.
pub(crate) const NUM_WORKERS: usize = 32;
/// Bound of the job queue feeding the workers.
const JOB_QUEUE_DEPTH: usize = 64;

/// Computes `m · v` as a new sparse vector of dimension `m.major_dim()`.
///
/// Result entries are sorted by index before the vector is assembled, so
/// the output is deterministic regardless of worker scheduling order. On
/// cancellation the call reports [`EigenError::Cancelled`] and never
/// returns a partial vector.
pub async fn multiply(
	m: Arc<Matrix>, v: Arc<Vector>, cancel: CancelSignal,
) -> Result<Vector, EigenError> {
	let (major_dim, minor_dim) = m.dims();
	if minor_dim != v.dim() {
		return Err(EigenError::DimensionMismatch(format!(
			"matrix minor dimension {} does not match vector dimension {}",
			minor_dim,
			v.dim()
		)));
	}

	let (job_tx, job_rx) = mpsc::channel::<usize>(JOB_QUEUE_DEPTH);
	let (result_tx, mut result_rx) = mpsc::channel::<Entry>(JOB_QUEUE_DEPTH);
	let jobs = Arc::new(Mutex::new(job_rx));

	let producer_cancel = cancel.clone();
	tokio::spawn(async move {
		for major in 0..major_dim {
			tokio::select! {
				biased;
				_ = producer_cancel.clone().cancelled() => return,
				sent = job_tx.send(major) => {
					if sent.is_err() {
						return;
					}
				},
			}
		}
	});

	for _ in 0..NUM_WORKERS {
		let jobs = Arc::clone(&jobs);
		let result_tx = result_tx.clone();
		let m = Arc::clone(&m);
		let v = Arc::clone(&v);
		let worker_cancel = cancel.clone();
		tokio::spawn(async move {
			loop {
				let job = {
					let mut job_rx = jobs.lock().await;
					job_rx.recv().await
				};
				let Some(major) = job else { break };
				if worker_cancel.is_cancelled() {
					break;
				}

				let value = dot_entries(m.row(major), v.entries());
				if value == 0.0 {
					continue;
				}
				tokio::select! {
					biased;
					_ = worker_cancel.clone().cancelled() => break,
					sent = result_tx.send(Entry::new(major, value)) => {
						if sent.is_err() {
							break;
						}
					},
				}
			}
		});
	}
	// The collector's recv ends once every worker has dropped its sender.
	drop(result_tx);

	let mut entries: Vec<Entry> = Vec::new();
	loop {
		tokio::select! {
			biased;
			_ = cancel.clone().cancelled() => return Err(EigenError::Cancelled),
			received = result_rx.recv() => match received {
				Some(entry) => entries.push(entry),
				None => break,
			},
		}
	}
	if cancel.is_cancelled() {
		return Err(EigenError::Cancelled);
	}

	entries.sort_unstable_by_key(|entry| entry.index);
	Ok(Vector::from_entries(major_dim, entries))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cancel::cancel_pair;
	use rand::rngs::StdRng;
	use rand::{Rng, SeedableRng};

	fn random_matrix(rng: &mut StdRng, major: usize, minor: usize) -> Matrix {
		let mut triples = Vec::new();
		for i in 0..major {
			for j in 0..minor {
				if rng.gen_bool(0.3) {
					triples.push((i, j, rng.gen_range(-5.0..5.0)));
				}
			}
		}
		Matrix::from_triples(major, minor, triples)
	}

	fn random_vector(rng: &mut StdRng, dim: usize) -> Vector {
		let mut entries = Vec::new();
		for i in 0..dim {
			if rng.gen_bool(0.5) {
				entries.push(Entry::new(i, rng.gen_range(-5.0..5.0)));
			}
		}
		Vector::from_entries(dim, entries)
	}

	/// Sequential reference: row-by-row dot products.
	fn multiply_reference(m: &Matrix, v: &Vector) -> Vector {
		let entries = (0..m.major_dim())
			.map(|i| Entry::new(i, dot_entries(m.row(i), v.entries())))
			.filter(|entry| entry.value != 0.0)
			.collect();
		Vector::from_entries(m.major_dim(), entries)
	}

	#[tokio::test]
	async fn test_multiply_simple() {
		let m = Matrix::from_triples(
			2,
			2,
			[(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)],
		);
		let v = Vector::from_entries(2, vec![Entry::new(0, 1.0), Entry::new(1, 1.0)]);
		let (_handle, signal) = cancel_pair();

		let result = multiply(Arc::new(m), Arc::new(v), signal).await.unwrap();
		assert_eq!(result.get(0), 3.0);
		assert_eq!(result.get(1), 3.0);
	}

	#[tokio::test]
	async fn test_multiply_matches_sequential_reference() {
		let mut rng = StdRng::seed_from_u64(42);
		for _ in 0..10 {
			let m = random_matrix(&mut rng, 50, 50);
			let v = random_vector(&mut rng, 50);
			let expected = multiply_reference(&m, &v);

			let (_handle, signal) = cancel_pair();
			let result = multiply(Arc::new(m), Arc::new(v), signal).await.unwrap();
			assert_eq!(result, expected);
		}
	}

	#[tokio::test]
	async fn test_multiply_dimension_mismatch() {
		let m = Matrix::new(2, 3);
		let v = Vector::new(2);
		let (_handle, signal) = cancel_pair();
		let result = multiply(Arc::new(m), Arc::new(v), signal).await;
		assert!(matches!(result, Err(EigenError::DimensionMismatch(_))));
	}

	#[tokio::test]
	async fn test_multiply_cancelled_before_start() {
		let mut rng = StdRng::seed_from_u64(3);
		let m = random_matrix(&mut rng, 30, 30);
		let v = random_vector(&mut rng, 30);

		let (handle, signal) = cancel_pair();
		handle.cancel();

		let result = multiply(Arc::new(m), Arc::new(v), signal).await;
		assert!(matches!(result, Err(EigenError::Cancelled)));
	}
}
