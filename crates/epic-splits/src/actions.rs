use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SplitError};

#[derive(Debug, Deserialize)]
struct ActionClassRow {
	class_key: String,
	action_id: u32,
}

pub fn class_key(verb_class: u32, noun_class: u32) -> String {
	format!("{}_{}", verb_class, noun_class)
}

/// Maps `"{verb}_{noun}"` class keys to composite action ids.
#[derive(Debug, Clone, Default)]
pub struct ActionIdResolver {
	ids: HashMap<String, u32>,
}

impl ActionIdResolver {
	pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		let reader = csv::ReaderBuilder::new()
			.trim(csv::Trim::All)
			.from_path(path)?;

		Self::from_csv(reader)
	}

	pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
		let reader = csv::ReaderBuilder::new()
			.trim(csv::Trim::All)
			.from_reader(rdr);

		Self::from_csv(reader)
	}

	fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
		let mut ids = HashMap::new();

		for row in reader.deserialize() {
			let row: ActionClassRow = row?;
			if ids.insert(row.class_key.clone(), row.action_id).is_some() {
				return Err(SplitError::DuplicateActionKey(row.class_key));
			}
		}

		log::debug!("Loaded {} action classes", ids.len());

		Ok(Self { ids })
	}

	pub fn resolve(&self, verb_class: u32, noun_class: u32) -> Result<u32> {
		let key = class_key(verb_class, noun_class);

		self.ids
			.get(&key)
			.copied()
			.ok_or(SplitError::Lookup(key))
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}
}
