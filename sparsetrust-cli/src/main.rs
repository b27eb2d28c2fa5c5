//! # Sparse Trust CLI
//!
//! This crate provides a CLI interface to use the `sparsetrust` library.

#![warn(trivial_casts)]
#![deny(
	absolute_paths_not_starting_with_crate, deprecated, future_incompatible, missing_docs,
	nonstandard_style, unreachable_code, unreachable_patterns
)]
#![forbid(unsafe_code)]
#![deny(
	// Complexity
 	clippy::unnecessary_cast,
	clippy::needless_question_mark,
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

mod cli;
mod fs;

use clap::Parser;
use cli::*;
use dotenv::dotenv;
use env_logger::{init_from_env, Env};
use fs::load_config;
use log::info;
use sparsetrust::error::EigenError;

#[tokio::main]
async fn main() -> Result<(), EigenError> {
	dotenv().ok();
	init_from_env(Env::default().filter_or("LOG_LEVEL", "info"));
	let mut config: CliConfig = load_config()?;

	match Cli::parse().mode {
		Mode::Compute(compute_data) => handle_compute(config, compute_data).await?,
		Mode::Show => info!("CLI config:\n{:#?}", config),
		Mode::Update(update_data) => handle_update(&mut config, update_data)?,
	};

	Ok(())
}
