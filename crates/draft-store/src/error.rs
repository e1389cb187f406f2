use std::path::Path;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("failed to open draft database at '{}': {source}", .path.display())]
	Open {
		path: Box<Path>,
		#[source]
		source: redb::DatabaseError,
	},
	#[error("error starting a draft store transaction: {0}")]
	Transaction(#[from] redb::TransactionError),
	#[error("error opening draft table: {0}")]
	Table(#[from] redb::TableError),
	#[error("error reading or writing draft storage: {0}")]
	Storage(#[from] redb::StorageError),
	#[error("error committing draft store transaction: {0}")]
	Commit(#[from] redb::CommitError),
	#[error("corrupted draft record under key '{key}': {source}")]
	Corrupted {
		key: String,
		#[source]
		source: serde_json::Error,
	},
	#[error("failed to serialize draft record: {0}")]
	Serialize(#[from] serde_json::Error),
	#[error("draft store task was cancelled or panicked: {0}")]
	Join(#[from] tokio::task::JoinError),
}
