//! # Cancellation Module.
//!
//! This module contains the cooperative cancellation pair threaded through
//! the solver loop, the multiply producer, and the worker pool.

use tokio::sync::watch;

/// Creates a connected cancellation pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
	let (tx, rx) = watch::channel(false);
	(CancelHandle { tx }, CancelSignal { rx })
}

/// The caller-side handle that triggers cancellation.
pub struct CancelHandle {
	tx: watch::Sender<bool>,
}

impl CancelHandle {
	/// Signals every clone of the paired [`CancelSignal`].
	pub fn cancel(&self) {
		// Send only fails when every signal is gone, in which case there
		// is nobody left to notify.
		let _ = self.tx.send(true);
	}
}

/// The observer side of a cancellation pair.
///
/// Clones observe the same handle; each producer, worker, and iteration
/// loop holds its own clone.
#[derive(Clone, Debug)]
pub struct CancelSignal {
	rx: watch::Receiver<bool>,
}

impl CancelSignal {
	/// Returns whether cancellation has been requested.
	pub fn is_cancelled(&self) -> bool {
		*self.rx.borrow()
	}

	/// Resolves once cancellation is requested.
	///
	/// If the paired handle is dropped without cancelling, the future
	/// never resolves, which lets `select!` arms treat "no cancellation
	/// possible anymore" the same as "not cancelled".
	pub async fn cancelled(mut self) {
		if *self.rx.borrow() {
			return;
		}
		while self.rx.changed().await.is_ok() {
			if *self.rx.borrow() {
				return;
			}
		}
		std::future::pending::<()>().await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_cancel_is_observed_by_all_clones() {
		let (handle, signal) = cancel_pair();
		let clone = signal.clone();
		assert!(!signal.is_cancelled());
		assert!(!clone.is_cancelled());

		handle.cancel();
		assert!(signal.is_cancelled());
		assert!(clone.is_cancelled());

		// Resolves immediately once cancelled.
		signal.cancelled().await;
	}

	#[tokio::test]
	async fn test_dropped_handle_never_resolves() {
		let (handle, signal) = cancel_pair();
		drop(handle);
		assert!(!signal.is_cancelled());

		let pending = signal.cancelled();
		tokio::select! {
			_ = pending => unreachable!("cancelled future resolved without a cancel"),
			_ = tokio::task::yield_now() => {},
		}
	}
}
