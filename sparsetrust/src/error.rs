//! # Error Module.
//!
//! This module features the `EigenError` enum for error handling throughout the project.

use thiserror::Error;

/// The crate-wide error variants.
#[derive(Debug, Error)]
pub enum EigenError {
	/// Computation cancelled by the caller
	#[error("CancelledError: computation cancelled")]
	Cancelled,

	/// Iteration budget exhausted without reaching the termination criteria
	#[error("DidNotConvergeError: no convergence after {iterations} iterations")]
	DidNotConverge {
		/// Iterations completed when the budget ran out.
		iterations: usize,
	},

	/// Dimension mismatch between vectors and matrices
	#[error("DimensionMismatchError: {0}")]
	DimensionMismatch(String),

	/// File read/write error
	#[error("FileIOError: {0}")]
	FileIOError(String),

	/// Input/output error
	#[error("IOError: {0}")]
	IOError(std::io::Error),

	/// Parameter outside its valid range
	#[error("ParamOutOfRangeError: {0}")]
	ParamOutOfRange(String),

	/// Parsing error
	#[error("ParsingError: {0}")]
	ParsingError(String),

	/// Update carrying an older timestamp than the stored object
	#[error("StaleUpdateError: {0}")]
	StaleUpdate(String),

	/// Validation error
	#[error("ValidationError: {0}")]
	ValidationError(String),

	/// Trust entries summing to zero where a canonical form is required
	#[error("ZeroSumError: entries sum to zero")]
	ZeroSum,
}
