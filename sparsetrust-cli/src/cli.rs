//! # CLI Module.
//!
//! This module contains all CLI related data handling and conversions.

use crate::fs::{get_file_path, save_config, FileType};
use clap::{Args, Parser, Subcommand};
use log::info;
use serde::{Deserialize, Serialize};
use sparsetrust::{
	cancel::cancel_pair,
	compute::ComputeOptions,
	compute_global_trust,
	error::EigenError,
	storage::{load_trust_csv, scores_to_records, CSVFileStorage, ScoreRecord, Storage},
	DEFAULT_ALPHA, DEFAULT_EPSILON,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub mode: Mode,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Mode {
	/// Calculate the global trust scores from CSV trust data. Requires
	/// 'ComputeData'.
	Compute(ComputeData),
	/// Display the current configuration.
	Show,
	/// Update the configuration. Requires 'UpdateData'.
	Update(UpdateData),
}

/// Compute subcommand input.
#[derive(Args, Debug)]
pub struct ComputeData {
	/// Local trust CSV file path (`from,to,value` records).
	#[clap(long = "local-trust")]
	local_trust: Option<String>,
	/// Pre-trust CSV file path (`peer,value` records).
	#[clap(long = "pre-trust")]
	pre_trust: Option<String>,
	/// Damping factor (0-1); falls back to the configured value.
	#[clap(long = "alpha")]
	alpha: Option<String>,
	/// Convergence threshold; falls back to the configured value.
	#[clap(long = "epsilon")]
	epsilon: Option<String>,
	/// Required flat-tail length (0 disables the ranking check).
	#[clap(long = "flat-tail")]
	flat_tail: Option<String>,
	/// Iteration budget (0 means unbounded).
	#[clap(long = "max-iterations")]
	max_iterations: Option<String>,
}

/// Configuration update subcommand input.
#[derive(Args, Debug)]
pub struct UpdateData {
	/// Damping factor (0-1).
	#[clap(long = "alpha")]
	alpha: Option<String>,
	/// Convergence threshold.
	#[clap(long = "epsilon")]
	epsilon: Option<String>,
	/// Required flat-tail length.
	#[clap(long = "flat-tail")]
	flat_tail: Option<String>,
	/// Iteration budget.
	#[clap(long = "max-iterations")]
	max_iterations: Option<String>,
}

/// CLI configuration settings.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CliConfig {
	/// Damping factor.
	pub alpha: f64,
	/// Convergence threshold.
	pub epsilon: f64,
	/// Required flat-tail length.
	pub flat_tail: usize,
	/// Iteration budget.
	pub max_iterations: usize,
}

impl Default for CliConfig {
	fn default() -> Self {
		Self {
			alpha: DEFAULT_ALPHA,
			epsilon: DEFAULT_EPSILON,
			flat_tail: 0,
			max_iterations: 0,
		}
	}
}

/// Handle `compute` command.
pub async fn handle_compute(config: CliConfig, data: ComputeData) -> Result<(), EigenError> {
	let local_trust_path = data
		.local_trust
		.as_deref()
		.ok_or_else(|| EigenError::ValidationError("Missing local trust path.".to_string()))?;
	let pre_trust_path = data
		.pre_trust
		.as_deref()
		.ok_or_else(|| EigenError::ValidationError("Missing pre-trust path.".to_string()))?;

	let alpha = parse_or(data.alpha.as_deref(), config.alpha, "alpha")?;
	let epsilon = parse_or(data.epsilon.as_deref(), config.epsilon, "epsilon")?;
	let flat_tail = parse_or(data.flat_tail.as_deref(), config.flat_tail, "flat tail")?;
	let max_iterations = parse_or(
		data.max_iterations.as_deref(),
		config.max_iterations,
		"max iterations",
	)?;

	let (local_trust, pre_trust, peers) =
		load_trust_csv(local_trust_path.into(), pre_trust_path.into())?;
	info!(
		"Loaded {} peers, {} local trust entries",
		peers.len(),
		local_trust.nnz()
	);

	let (_handle, signal) = cancel_pair();
	let opts = ComputeOptions { flat_tail, max_iterations, ..Default::default() };
	let (trust, stats) =
		compute_global_trust(&signal, local_trust, pre_trust, alpha, epsilon, opts).await?;

	let records = scores_to_records(&trust, &stats.ranking, &peers);
	let filepath = get_file_path("scores", FileType::Csv)?;
	let mut storage = CSVFileStorage::<ScoreRecord>::new(filepath);
	storage.save(records)?;

	info!(
		"Scores for {} iterations saved at \"{}\".",
		stats.iterations,
		storage.filepath().display()
	);

	Ok(())
}

/// Handle `update` command.
pub fn handle_update(config: &mut CliConfig, data: UpdateData) -> Result<(), EigenError> {
	if let Some(alpha) = data.alpha.as_deref() {
		config.alpha = parse_value(alpha, "alpha")?;
	}
	if let Some(epsilon) = data.epsilon.as_deref() {
		config.epsilon = parse_value(epsilon, "epsilon")?;
	}
	if let Some(flat_tail) = data.flat_tail.as_deref() {
		config.flat_tail = parse_value(flat_tail, "flat tail")?;
	}
	if let Some(max_iterations) = data.max_iterations.as_deref() {
		config.max_iterations = parse_value(max_iterations, "max iterations")?;
	}

	save_config(config)?;
	info!("Configuration updated.");
	Ok(())
}

fn parse_value<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, EigenError> {
	value
		.parse::<T>()
		.map_err(|_| EigenError::ParsingError(format!("Failed to parse {}.", name)))
}

fn parse_or<T: std::str::FromStr>(
	value: Option<&str>, fallback: T, name: &str,
) -> Result<T, EigenError> {
	match value {
		Some(raw) => parse_value(raw, name),
		None => Ok(fallback),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_or_uses_fallback() {
		let parsed: f64 = parse_or(None, 0.5, "alpha").unwrap();
		assert_eq!(parsed, 0.5);

		let parsed: f64 = parse_or(Some("0.25"), 0.5, "alpha").unwrap();
		assert_eq!(parsed, 0.25);

		let failed: Result<f64, _> = parse_or(Some("not-a-number"), 0.5, "alpha");
		assert!(failed.is_err());
	}
}
