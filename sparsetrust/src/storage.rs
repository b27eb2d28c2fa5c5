//! # Storage Module.
//!
//! This module contains generic file storage traits and implementations,
//! the CSV record types for trust data, and the conversions between record
//! files and sparse structures.

use crate::error::EigenError;
use crate::sparse::{Entry, Matrix, Vector};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{from_reader, to_string};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

/// The main trait to be implemented by different storage types.
pub trait Storage<T> {
	/// The error type.
	type Err;

	/// Loads data from storage.
	fn load(&self) -> Result<T, Self::Err>;
	/// Saves data to storage.
	fn save(&mut self, data: T) -> Result<(), Self::Err>;
}

/// The `CSVFileStorage` struct provides a mechanism for persisting
/// and retrieving structured data to and from CSV files.
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use sparsetrust::storage::{CSVFileStorage, LocalTrustRecord, Storage};
///
/// let filepath = PathBuf::from("/path/to/local-trust.csv");
/// let mut storage = CSVFileStorage::<LocalTrustRecord>::new(filepath);
///
/// let data = vec![LocalTrustRecord::new("alice".into(), "bob".into(), 0.8)];
///
/// // Save the records to the CSV file.
/// storage.save(data.clone()).unwrap();
///
/// // Load the records from the CSV file.
/// let loaded_data = storage.load().unwrap();
/// assert_eq!(data, loaded_data);
/// ```
pub struct CSVFileStorage<T> {
	filepath: PathBuf,
	phantom: PhantomData<T>,
}

impl<T> CSVFileStorage<T> {
	/// Creates a new CSVFileStorage.
	pub fn new(filepath: PathBuf) -> Self {
		Self { filepath, phantom: PhantomData }
	}

	/// Returns the path to the file.
	pub fn filepath(&self) -> &PathBuf {
		&self.filepath
	}
}

impl<T: Serialize + DeserializeOwned + Clone> Storage<Vec<T>> for CSVFileStorage<T> {
	type Err = EigenError;

	fn load(&self) -> Result<Vec<T>, EigenError> {
		let file = File::open(&self.filepath).map_err(EigenError::IOError)?;
		let mut reader = ReaderBuilder::new().from_reader(BufReader::new(file));

		reader
			.deserialize()
			.map(|result| result.map_err(|e| EigenError::FileIOError(e.to_string())))
			.collect()
	}

	fn save(&mut self, data: Vec<T>) -> Result<(), EigenError> {
		let mut writer = WriterBuilder::new()
			.from_path(&self.filepath)
			.map_err(|e| EigenError::FileIOError(e.to_string()))?;

		// Loop over content and write each item
		for record in &data {
			writer.serialize(record).map_err(|e| EigenError::FileIOError(e.to_string()))?;
		}

		// Flush buffer
		writer.flush().map_err(|e| EigenError::FileIOError(e.to_string()))?;

		Ok(())
	}
}

/// The `JSONFileStorage` struct provides a mechanism for persisting
/// and retrieving structured data to and from JSON files.
pub struct JSONFileStorage<T> {
	filepath: PathBuf,
	phantom: PhantomData<T>,
}

impl<T> JSONFileStorage<T> {
	/// Creates a new JSONFileStorage.
	pub fn new(filepath: PathBuf) -> Self {
		Self { filepath, phantom: PhantomData }
	}

	/// Returns the path to the file.
	pub fn filepath(&self) -> &PathBuf {
		&self.filepath
	}
}

impl<T: Serialize + DeserializeOwned + Clone> Storage<T> for JSONFileStorage<T> {
	type Err = EigenError;

	fn load(&self) -> Result<T, Self::Err> {
		let file = File::open(&self.filepath).map_err(EigenError::IOError)?;
		let reader = BufReader::new(file);
		from_reader(reader).map_err(|e| EigenError::ParsingError(e.to_string()))
	}

	fn save(&mut self, data: T) -> Result<(), Self::Err> {
		let json_str = to_string(&data).map_err(|e| EigenError::ParsingError(e.to_string()))?;

		let mut file = File::create(&self.filepath).map_err(EigenError::IOError)?;
		file.write_all(json_str.as_bytes()).map_err(EigenError::IOError)
	}
}

/// Local trust CSV record: one trust opinion from one peer about another.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LocalTrustRecord {
	/// Name of the peer holding the opinion.
	from: String,
	/// Name of the peer being rated.
	to: String,
	/// Signed trust value; negative values express distrust.
	value: f64,
}

impl LocalTrustRecord {
	/// Creates a new local trust record.
	pub fn new(from: String, to: String, value: f64) -> Self {
		Self { from, to, value }
	}
}

/// Pre-trust CSV record: an a-priori trusted peer and its weight.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PreTrustRecord {
	/// Peer name.
	peer: String,
	/// Pre-trust weight.
	value: f64,
}

impl PreTrustRecord {
	/// Creates a new pre-trust record.
	pub fn new(peer: String, value: f64) -> Self {
		Self { peer, value }
	}
}

/// Score record written after a computation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreRecord {
	/// Peer name.
	peer: String,
	/// Global trust score.
	score: f64,
	/// Position in the final ranking, starting at 1.
	rank: usize,
}

impl ScoreRecord {
	/// Creates a new score record.
	pub fn new(peer: String, score: f64, rank: usize) -> Self {
		Self { peer, score, rank }
	}

	/// Returns the peer name.
	pub fn peer(&self) -> &str {
		&self.peer
	}

	/// Returns the score.
	pub fn score(&self) -> f64 {
		self.score
	}

	/// Returns the rank.
	pub fn rank(&self) -> usize {
		self.rank
	}
}

/// Bidirectional peer-name to index mapping built while loading records.
#[derive(Clone, Debug, Default)]
pub struct PeerMap {
	names: Vec<String>,
	indices: HashMap<String, usize>,
}

impl PeerMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the index for `name`, assigning the next free index on
	/// first sight.
	pub fn index_of(&mut self, name: &str) -> usize {
		if let Some(&index) = self.indices.get(name) {
			return index;
		}
		let index = self.names.len();
		self.names.push(name.to_string());
		self.indices.insert(name.to_string(), index);
		index
	}

	/// Returns the index for `name` without assigning one.
	pub fn get(&self, name: &str) -> Option<usize> {
		self.indices.get(name).copied()
	}

	/// Returns the name at `index`.
	pub fn name(&self, index: usize) -> Option<&str> {
		self.names.get(index).map(String::as_str)
	}

	/// Number of mapped peers.
	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Whether no peer has been mapped yet.
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}
}

/// Builds the local trust matrix and pre-trust vector from parsed records.
///
/// Peer indices are assigned in record order, local trust first; the
/// dimension is inferred from the number of distinct peer names across
/// both record sets.
pub fn trust_from_records(
	local_trust: &[LocalTrustRecord], pre_trust: &[PreTrustRecord],
) -> (Matrix, Vector, PeerMap) {
	let mut peers = PeerMap::new();
	let triples: Vec<(usize, usize, f64)> = local_trust
		.iter()
		.map(|record| {
			(
				peers.index_of(&record.from),
				peers.index_of(&record.to),
				record.value,
			)
		})
		.collect();
	let pre_entries: Vec<Entry> = pre_trust
		.iter()
		.map(|record| Entry::new(peers.index_of(&record.peer), record.value))
		.collect();

	let dim = peers.len();
	let matrix = Matrix::from_triples(dim, dim, triples);
	let vector = Vector::from_entries(dim, pre_entries);
	(matrix, vector, peers)
}

/// Loads local trust and pre-trust CSV files into sparse structures.
pub fn load_trust_csv(
	local_trust_path: PathBuf, pre_trust_path: PathBuf,
) -> Result<(Matrix, Vector, PeerMap), EigenError> {
	let local_trust = CSVFileStorage::<LocalTrustRecord>::new(local_trust_path).load()?;
	let pre_trust = CSVFileStorage::<PreTrustRecord>::new(pre_trust_path).load()?;
	Ok(trust_from_records(&local_trust, &pre_trust))
}

/// Converts a computed trust vector into score records ordered by the
/// final ranking.
pub fn scores_to_records(
	trust: &Vector, ranking: &[usize], peers: &PeerMap,
) -> Vec<ScoreRecord> {
	ranking
		.iter()
		.enumerate()
		.filter_map(|(position, &index)| {
			peers
				.name(index)
				.map(|name| ScoreRecord::new(name.to_string(), trust.get(index), position + 1))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use crate::storage::*;
	use std::{env::current_dir, fs};

	#[test]
	fn test_csv_file_storage() {
		// Create the CSV file
		let filepath = current_dir().unwrap().join("local-trust-test.csv");
		let mut csv_storage = CSVFileStorage::<LocalTrustRecord>::new(filepath.clone());

		let content = vec![
			LocalTrustRecord::new("alice".to_string(), "bob".to_string(), 0.5),
			LocalTrustRecord::new("bob".to_string(), "carol".to_string(), -0.25),
		];

		assert!(csv_storage.save(content.clone()).is_ok());

		// Read the CSV file
		let result = csv_storage.load();

		// Assert
		assert!(result.is_ok());
		let records: Vec<LocalTrustRecord> = result.unwrap();
		assert_eq!(records.len(), 2);
		assert_eq!(records, content);

		// Clean up
		fs::remove_file(filepath).unwrap();
	}

	#[test]
	fn test_trust_from_records_infers_dimension() {
		let local_trust = vec![
			LocalTrustRecord::new("alice".to_string(), "bob".to_string(), 1.0),
			LocalTrustRecord::new("bob".to_string(), "carol".to_string(), 2.0),
			LocalTrustRecord::new("alice".to_string(), "bob".to_string(), 1.0),
		];
		let pre_trust = vec![PreTrustRecord::new("dave".to_string(), 1.0)];

		let (matrix, vector, peers) = trust_from_records(&local_trust, &pre_trust);

		assert_eq!(peers.len(), 4);
		assert_eq!(matrix.dims(), (4, 4));
		assert_eq!(vector.dim(), 4);

		let alice = peers.get("alice").unwrap();
		let bob = peers.get("bob").unwrap();
		let dave = peers.get("dave").unwrap();
		// Repeated records merge by summation.
		assert_eq!(matrix.row_vector(alice).get(bob), 2.0);
		assert_eq!(vector.get(dave), 1.0);
	}

	#[test]
	fn test_scores_to_records_follows_ranking() {
		let local_trust = vec![
			LocalTrustRecord::new("alice".to_string(), "bob".to_string(), 1.0),
			LocalTrustRecord::new("bob".to_string(), "alice".to_string(), 1.0),
		];
		let (_, _, peers) = trust_from_records(&local_trust, &[]);
		let trust = Vector::from_entries(
			2,
			vec![
				crate::sparse::Entry::new(0, 0.25),
				crate::sparse::Entry::new(1, 0.75),
			],
		);

		let records = scores_to_records(&trust, &[1, 0], &peers);
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].peer(), "bob");
		assert_eq!(records[0].rank(), 1);
		assert_eq!(records[1].peer(), "alice");
		assert_eq!(records[1].score(), 0.25);
	}
}
