use dp_draft_store::{DraftDatabase, DraftKey, DraftRecord, DraftStatus, DraftStore, Namespace};

use std::sync::Arc;

use tempfile::tempdir;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn put_then_get() {
	let dir = tempdir().unwrap();
	let db = DraftDatabase::open(dir.path().join("drafts.redb")).unwrap();
	let media = db.media();

	let key = DraftKey::new("images:logo.png");
	assert_eq!(media.get(&key).await.unwrap(), None);

	let record = DraftRecord::updated(key.clone(), "data:image/png;base64,AAAA");
	media.put(record.clone()).await.unwrap();

	assert_eq!(media.get(&key).await.unwrap(), Some(record));
}

#[tokio::test]
async fn records_survive_reopen() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("drafts.redb");
	let key = DraftKey::new("videos:intro.mp4");

	{
		let db = DraftDatabase::open(&path).unwrap();
		db.media().put(DraftRecord::deleted(key.clone())).await.unwrap();
	}

	let db = DraftDatabase::open(&path).unwrap();
	let record = db.media().get(&key).await.unwrap().unwrap();

	assert_eq!(record.status, DraftStatus::Deleted);
}

#[tokio::test]
async fn namespaces_are_isolated() {
	let dir = tempdir().unwrap();
	let db = DraftDatabase::open(dir.path().join("drafts.redb")).unwrap();
	let key = DraftKey::new("content:index.md");

	db.documents()
		.put(DraftRecord::created(key.clone(), "data:text/markdown;base64,IyBIaQ=="))
		.await
		.unwrap();

	assert!(db.media().get(&key).await.unwrap().is_none());
	assert!(db
		.namespace(Namespace::Documents)
		.get(&key)
		.await
		.unwrap()
		.is_some());
}

#[tokio::test]
async fn remove_list_and_clear() {
	let dir = tempdir().unwrap();
	let db = DraftDatabase::open(dir.path().join("drafts.redb")).unwrap();
	let media = db.media();

	for name in ["b.png", "a.png", "c.png"] {
		media
			.put(DraftRecord::deleted(DraftKey::new(format!("images:{name}"))))
			.await
			.unwrap();
	}

	let keys = media
		.list()
		.await
		.unwrap()
		.into_iter()
		.map(|record| record.key.to_string())
		.collect::<Vec<_>>();
	assert_eq!(keys, ["images:a.png", "images:b.png", "images:c.png"]);

	assert!(media.remove(&DraftKey::new("images:a.png")).await.unwrap());
	assert!(!media.remove(&DraftKey::new("images:a.png")).await.unwrap());

	assert_eq!(media.clear().await.unwrap(), 2);
	assert!(media.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn readers_see_snapshots_while_writing() {
	let dir = tempdir().unwrap();
	let db = DraftDatabase::open(dir.path().join("drafts.redb")).unwrap();
	let media = Arc::new(db.media());
	let key = DraftKey::new("images:hero.jpg");

	media
		.put(DraftRecord::updated(key.clone(), "data:image/jpeg;base64,/9j/"))
		.await
		.unwrap();

	let readers = (0..16)
		.map(|_| {
			let media = Arc::clone(&media);
			let key = key.clone();
			tokio::spawn(async move { media.get(&key).await })
		})
		.collect::<Vec<_>>();

	media.put(DraftRecord::deleted(key.clone())).await.unwrap();

	for reader in readers {
		let record = reader.await.unwrap().unwrap().unwrap();
		// Either the old or the new record, never a torn read
		assert!(matches!(
			record.status,
			DraftStatus::Updated | DraftStatus::Deleted
		));
	}

	assert_eq!(
		media.get(&key).await.unwrap().unwrap().status,
		DraftStatus::Deleted
	);
}

#[tokio::test]
async fn corrupted_record_is_an_error() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("drafts.redb");

	{
		let db = redb::Database::create(&path).unwrap();
		let txn = db.begin_write().unwrap();
		{
			let mut table = txn
				.open_table(redb::TableDefinition::<&str, &[u8]>::new("media_drafts"))
				.unwrap();
			table.insert("images:broken.png", b"not json".as_slice()).unwrap();
		}
		txn.commit().unwrap();
	}

	let db = DraftDatabase::open(&path).unwrap();
	let err = db
		.media()
		.get(&DraftKey::new("images:broken.png"))
		.await
		.unwrap_err();

	assert!(err.to_string().contains("images:broken.png"));
}

#[tokio::test]
async fn concurrent_writers_all_land() {
	let dir = tempdir().unwrap();
	let db = DraftDatabase::open(dir.path().join("drafts.redb")).unwrap();

	let writers = (0..32)
		.map(|i| {
			let media = db.media();
			tokio::spawn(async move {
				media
					.put(DraftRecord::deleted(DraftKey::new(format!("images:{i}.png"))))
					.await
			})
		})
		.collect::<Vec<_>>();

	let reader = db.media();
	for writer in writers {
		writer.await.unwrap().unwrap();
		// Reads never wait on the writers
		reader.list().await.unwrap();
	}

	assert_eq!(db.media().list().await.unwrap().len(), 32);
}

#[tokio::test]
async fn database_file_belongs_to_one_process() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("drafts.redb");

	let _held = DraftDatabase::open(&path).unwrap();

	assert!(matches!(
		DraftDatabase::open(&path),
		Err(dp_draft_store::Error::Open { .. })
	));
}
