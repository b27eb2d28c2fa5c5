//! # Filesystem Actions Module.
//!
//! This module provides functionalities for filesystem actions.

use crate::cli::CliConfig;
use log::warn;
use sparsetrust::{
	error::EigenError,
	storage::{JSONFileStorage, Storage},
};
use std::{env::current_dir, path::PathBuf};

/// Library configuration file name.
pub const CONFIG_FILENAME: &str = "config";

/// Enum representing the possible file extensions.
pub enum FileType {
	/// CSV file.
	Csv,
	/// JSON file.
	Json,
}

impl FileType {
	/// Converts the enum variant into its corresponding file extension.
	fn as_str(&self) -> &'static str {
		match self {
			FileType::Csv => "csv",
			FileType::Json => "json",
		}
	}
}

/// Retrieves the path to the `assets` directory.
pub fn get_assets_path() -> Result<PathBuf, EigenError> {
	current_dir().map_err(EigenError::IOError).map(|current_dir| {
		// Workaround for the tests running in the crate directory.
		#[cfg(test)]
		{
			current_dir.join("assets")
		}

		#[cfg(not(test))]
		{
			current_dir.join("sparsetrust-cli/assets")
		}
	})
}

/// Helper function to get the path of a file in the `assets` directory.
pub fn get_file_path(file_name: &str, file_type: FileType) -> Result<PathBuf, EigenError> {
	let assets_path = get_assets_path()?;
	Ok(assets_path.join(format!("{}.{}", file_name, file_type.as_str())))
}

/// Loads the configuration file, falling back to the defaults when it is
/// missing.
pub fn load_config() -> Result<CliConfig, EigenError> {
	let filepath = get_file_path(CONFIG_FILENAME, FileType::Json)?;
	if !filepath.exists() {
		warn!("Configuration file not found. Using defaults.");
		return Ok(CliConfig::default());
	}
	JSONFileStorage::<CliConfig>::new(filepath).load()
}

/// Saves the configuration file.
pub fn save_config(config: &CliConfig) -> Result<(), EigenError> {
	let filepath = get_file_path(CONFIG_FILENAME, FileType::Json)?;
	JSONFileStorage::<CliConfig>::new(filepath).save(config.clone())
}
