//! # Trust Store Module.
//!
//! This module contains the named, locked, timestamped in-memory store for
//! trust objects shared between loaders and the solver. Each named object
//! carries its own lock; callers read-modify-write under one critical
//! section and never hold a lock across a solver run.

use crate::error::EigenError;
use crate::sparse::{Matrix, Vector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A stored trust object together with its update timestamp.
#[derive(Clone, Debug, Default)]
struct Stored<T> {
	value: T,
	updated_at: u64,
}

/// A named collection of lockable, timestamped trust objects.
///
/// Updates carry a caller-supplied, monotonically-compared timestamp; an
/// update older than the stored one is rejected with
/// [`EigenError::StaleUpdate`] instead of overwriting newer data. Merging
/// an update into the stored object uses the destructive
/// [`Matrix::merge`] / [`Vector::merge`] primitives.
#[derive(Debug, Default)]
pub struct TrustStore {
	matrices: Mutex<HashMap<String, Arc<Mutex<Stored<Matrix>>>>>,
	vectors: Mutex<HashMap<String, Arc<Mutex<Stored<Vector>>>>>,
}

impl TrustStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	fn entry<T: Default>(
		map: &Mutex<HashMap<String, Arc<Mutex<Stored<T>>>>>, name: &str,
	) -> Arc<Mutex<Stored<T>>> {
		let mut map = lock(map);
		Arc::clone(map.entry(name.to_string()).or_default())
	}

	/// Runs `f` on the named local-trust matrix under its lock, creating
	/// an empty matrix on first access. `f` receives the matrix and its
	/// current update timestamp.
	pub fn lock_and_run_matrix<R>(
		&self, name: &str, f: impl FnOnce(&mut Matrix, u64) -> R,
	) -> R {
		let slot = Self::entry(&self.matrices, name);
		let mut stored = lock(&slot);
		let updated_at = stored.updated_at;
		f(&mut stored.value, updated_at)
	}

	/// Runs `f` on the named trust vector under its lock, creating an
	/// empty vector on first access.
	pub fn lock_and_run_vector<R>(
		&self, name: &str, f: impl FnOnce(&mut Vector, u64) -> R,
	) -> R {
		let slot = Self::entry(&self.vectors, name);
		let mut stored = lock(&slot);
		let updated_at = stored.updated_at;
		f(&mut stored.value, updated_at)
	}

	/// Merges `update` into the named local-trust matrix.
	///
	/// The update is rejected when its timestamp is older than the stored
	/// one; on success `update` is reset by the merge and the stored
	/// timestamp advances.
	pub fn update_matrix(
		&self, name: &str, update: &mut Matrix, timestamp: u64,
	) -> Result<(), EigenError> {
		let slot = Self::entry(&self.matrices, name);
		let mut stored = lock(&slot);
		if timestamp < stored.updated_at {
			return Err(EigenError::StaleUpdate(format!(
				"update of {} at {} is older than stored {}",
				name, timestamp, stored.updated_at
			)));
		}
		stored.value.merge(update);
		stored.updated_at = timestamp;
		Ok(())
	}

	/// Merges `update` into the named trust vector, with the same
	/// staleness policy as [`TrustStore::update_matrix`].
	pub fn update_vector(
		&self, name: &str, update: &mut Vector, timestamp: u64,
	) -> Result<(), EigenError> {
		let slot = Self::entry(&self.vectors, name);
		let mut stored = lock(&slot);
		if timestamp < stored.updated_at {
			return Err(EigenError::StaleUpdate(format!(
				"update of {} at {} is older than stored {}",
				name, timestamp, stored.updated_at
			)));
		}
		stored.value.merge(update);
		stored.updated_at = timestamp;
		Ok(())
	}

	/// Returns a private copy of the named matrix and its timestamp, for
	/// running a computation without holding the store lock.
	pub fn snapshot_matrix(&self, name: &str) -> Option<(Matrix, u64)> {
		let slot = {
			let map = lock(&self.matrices);
			Arc::clone(map.get(name)?)
		};
		let stored = lock(&slot);
		Some((stored.value.clone(), stored.updated_at))
	}

	/// Returns a private copy of the named vector and its timestamp.
	pub fn snapshot_vector(&self, name: &str) -> Option<(Vector, u64)> {
		let slot = {
			let map = lock(&self.vectors);
			Arc::clone(map.get(name)?)
		};
		let stored = lock(&slot);
		Some((stored.value.clone(), stored.updated_at))
	}
}

/// Locks a mutex, recovering the guard from a poisoned lock; the stored
/// trust objects stay structurally valid across a panicked writer.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
