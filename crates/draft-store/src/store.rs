use std::{fmt, path::Path, str::FromStr, sync::Arc};

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;
use tracing::{debug, trace};

use crate::{DraftKey, DraftRecord, Error, Result};

const MEDIA_TABLE: TableDefinition<'_, &str, &[u8]> = TableDefinition::new("media_drafts");
const DOCUMENT_TABLE: TableDefinition<'_, &str, &[u8]> = TableDefinition::new("document_drafts");

/// Read side of the draft store, as seen by the overlay.
///
/// One call is one point-in-time snapshot. Implementations must not block the caller's
/// executor while reading.
#[async_trait]
pub trait DraftStore: Send + Sync {
	async fn get(&self, key: &DraftKey) -> Result<Option<DraftRecord>>;
}

#[async_trait]
impl<T: DraftStore + ?Sized> DraftStore for Arc<T> {
	async fn get(&self, key: &DraftKey) -> Result<Option<DraftRecord>> {
		(**self).get(key).await
	}
}

/// Drafts are partitioned by what they edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
	Media,
	Documents,
}

impl Namespace {
	const fn table(self) -> TableDefinition<'static, &'static str, &'static [u8]> {
		match self {
			Self::Media => MEDIA_TABLE,
			Self::Documents => DOCUMENT_TABLE,
		}
	}
}

impl fmt::Display for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Media => "media",
			Self::Documents => "documents",
		})
	}
}

impl FromStr for Namespace {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"media" => Ok(Self::Media),
			"documents" => Ok(Self::Documents),
			other => Err(format!("unknown draft namespace '{other}'")),
		}
	}
}

/// The on-disk draft database. Cheap to clone.
///
/// The file is locked by the process that opens it. Every writer in that process shares
/// this handle, writers elsewhere go through the process that holds it.
#[derive(Clone)]
pub struct DraftDatabase {
	db: Arc<Database>,
}

impl DraftDatabase {
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let db = Database::create(path).map_err(|source| Error::Open {
			path: path.into(),
			source,
		})?;

		// Both tables exist from the start so readers never hit `TableDoesNotExist`
		let txn = db.begin_write()?;
		{
			txn.open_table(MEDIA_TABLE)?;
			txn.open_table(DOCUMENT_TABLE)?;
		}
		txn.commit()?;

		debug!(path = %path.display(), "Opened draft database");

		Ok(Self { db: Arc::new(db) })
	}

	#[must_use]
	pub fn namespace(&self, namespace: Namespace) -> Drafts {
		Drafts {
			db: Arc::clone(&self.db),
			namespace,
		}
	}

	#[must_use]
	pub fn media(&self) -> Drafts {
		self.namespace(Namespace::Media)
	}

	#[must_use]
	pub fn documents(&self) -> Drafts {
		self.namespace(Namespace::Documents)
	}
}

/// Drafts of a single namespace.
#[derive(Clone)]
pub struct Drafts {
	db: Arc<Database>,
	namespace: Namespace,
}

impl Drafts {
	#[must_use]
	pub const fn namespace_kind(&self) -> Namespace {
		self.namespace
	}

	/// Insert or replace the record stored under `record.key`.
	pub async fn put(&self, record: DraftRecord) -> Result<()> {
		let db = Arc::clone(&self.db);
		let table = self.namespace.table();

		spawn_blocking(move || -> Result<()> {
			let bytes = serde_json::to_vec(&record)?;
			let txn = db.begin_write()?;
			{
				let mut table = txn.open_table(table)?;
				table.insert(record.key.as_str(), bytes.as_slice())?;
			}
			txn.commit()?;

			trace!(key = %record.key, status = %record.status, "Stored draft");

			Ok(())
		})
		.await?
	}

	/// Remove a record, returning whether one existed.
	pub async fn remove(&self, key: &DraftKey) -> Result<bool> {
		let db = Arc::clone(&self.db);
		let table = self.namespace.table();
		let key = key.clone();

		spawn_blocking(move || -> Result<bool> {
			let txn = db.begin_write()?;
			let existed = {
				let mut table = txn.open_table(table)?;
				let removed = table.remove(key.as_str())?;
				removed.is_some()
			};
			txn.commit()?;

			Ok(existed)
		})
		.await?
	}

	/// Every record of this namespace, ordered by key.
	pub async fn list(&self) -> Result<Vec<DraftRecord>> {
		let db = Arc::clone(&self.db);
		let table = self.namespace.table();

		spawn_blocking(move || -> Result<Vec<DraftRecord>> {
			let txn = db.begin_read()?;
			let table = txn.open_table(table)?;

			let records = table
				.iter()?
				.map(|entry| {
					let (key, value) = entry?;
					decode(key.value(), value.value())
				})
				.collect::<Result<Vec<_>>>()?;

			Ok(records)
		})
		.await?
	}

	/// Drop every record of this namespace, returning how many were removed.
	pub async fn clear(&self) -> Result<usize> {
		let db = Arc::clone(&self.db);
		let table = self.namespace.table();

		spawn_blocking(move || -> Result<usize> {
			let txn = db.begin_write()?;
			let removed = {
				let mut table = txn.open_table(table)?;
				let keys = table
					.iter()?
					.map(|entry| entry.map(|(key, _)| key.value().to_string()))
					.collect::<std::result::Result<Vec<_>, _>>()?;

				for key in &keys {
					table.remove(key.as_str())?;
				}

				keys.len()
			};
			txn.commit()?;

			Ok(removed)
		})
		.await?
	}
}

#[async_trait]
impl DraftStore for Drafts {
	async fn get(&self, key: &DraftKey) -> Result<Option<DraftRecord>> {
		let db = Arc::clone(&self.db);
		let table = self.namespace.table();
		let key = key.clone();

		spawn_blocking(move || -> Result<Option<DraftRecord>> {
			let txn = db.begin_read()?;
			let table = txn.open_table(table)?;

			let record = table
				.get(key.as_str())?
				.map(|value| decode(key.as_str(), value.value()))
				.transpose()?;

			Ok(record)
		})
		.await?
	}
}

fn decode(key: &str, bytes: &[u8]) -> Result<DraftRecord> {
	serde_json::from_slice(bytes).map_err(|source| Error::Corrupted {
		key: key.to_string(),
		source,
	})
}
