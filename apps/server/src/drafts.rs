//! Draft management commands
//!
//! Commands run against whichever [`DraftEditor`] owns the database: the draft API of a
//! running `serve`, or the database file itself when no server holds it.

use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use axum::http::Uri;
use clap::Subcommand;
use dp_core::{
	data_url,
	media::{extension_of, media_type_for_extension},
	normalize::store_key,
	OverlayConfig,
};
use dp_draft_store::{DraftKey, DraftRecord};

use crate::editor::DraftEditor;

#[derive(Subcommand, Clone, Debug)]
pub enum DraftCommands {
	/// Draft new content for an asset
	Set {
		/// Logical path of the asset, e.g. `/images/logo.png`
		path: String,
		/// File holding the new content
		file: PathBuf,
		/// The asset does not exist on the origin yet
		#[arg(long)]
		created: bool,
		/// Media type of the content, guessed from the extension otherwise
		#[arg(long)]
		mime: Option<String>,
	},

	/// Mark an asset deleted
	Delete { path: String },

	/// Serve the asset at `new_path` from `original_path`
	Rename {
		new_path: String,
		original_path: String,
	},

	/// Drop the draft of an asset, serving the published one again
	Discard { path: String },

	/// Drop every draft of the namespace
	Clear,

	/// List all drafts
	List,

	/// Show the draft of an asset
	Show { path: String },
}

pub async fn handle(
	drafts: &dyn DraftEditor,
	config: &OverlayConfig,
	cmd: DraftCommands,
) -> Result<()> {
	match cmd {
		DraftCommands::Set {
			path,
			file,
			created,
			mime,
		} => {
			let key = key_for(config, &path)?;
			let media_type = match mime {
				Some(mime) => mime,
				None => extension_of(&path)
					.and_then(|ext| media_type_for_extension(&ext))
					.map(ToString::to_string)
					.ok_or_else(|| anyhow!("unknown media type for {path}, pass --mime"))?,
			};

			let bytes =
				fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
			let raw = data_url::encode(&media_type, &bytes);

			let record = if created {
				DraftRecord::created(key, raw)
			} else {
				DraftRecord::updated(key, raw)
			};
			println!("{} {} ({media_type}, {} bytes)", record.status, record.key, bytes.len());
			drafts.put(record).await?;
		}

		DraftCommands::Delete { path } => {
			let record = DraftRecord::deleted(key_for(config, &path)?);
			println!("{} {}", record.status, record.key);
			drafts.put(record).await?;
		}

		DraftCommands::Rename {
			new_path,
			original_path,
		} => {
			let key = key_for(config, &new_path)?;
			// The original must be addressable on its own, or the proxy could not fetch it
			store_key(&original_path)
				.filter(|_| original_path.starts_with('/'))
				.ok_or_else(|| anyhow!("{original_path} is not an absolute asset path"))?;

			println!("renamed {key} -> {original_path}");
			drafts.put(DraftRecord::renamed(key, original_path)).await?;
		}

		DraftCommands::Discard { path } => {
			let key = key_for(config, &path)?;
			if drafts.remove(&key).await? {
				println!("discarded {key}");
			} else {
				println!("no draft for {key}");
			}
		}

		DraftCommands::Clear => {
			let removed = drafts.clear().await?;
			println!("discarded {removed} {} drafts", drafts.namespace_kind());
		}

		DraftCommands::List => {
			let records = drafts.list().await?;
			if records.is_empty() {
				println!("no {} drafts", drafts.namespace_kind());
			}
			for record in records {
				println!("{}", describe(&record));
			}
		}

		DraftCommands::Show { path } => {
			let key = key_for(config, &path)?;
			match drafts.get(&key).await? {
				Some(record) => println!("{}", describe(&record)),
				None => println!("no draft for {key}"),
			}
		}
	}

	Ok(())
}

/// Accepts both logical paths and request URLs the proxy would intercept, such as
/// `/_ipx/w_200/images/logo.png`.
fn key_for(config: &OverlayConfig, path: &str) -> Result<DraftKey> {
	let uri = path
		.parse::<Uri>()
		.with_context(|| format!("{path} is not a valid path"))?;

	config
		.normalizer()
		.normalize(&uri)
		.map(|(_, key)| key)
		.ok_or_else(|| anyhow!("{path} is not a media asset path"))
}

fn describe(record: &DraftRecord) -> String {
	let mut line = format!("{:<9} {}", record.status.to_string(), record.key);

	if let Some(original) = &record.original {
		line.push_str(&format!(" -> {}", original.path));
	} else if let Some(modified) = &record.modified {
		match data_url::decode(&modified.raw) {
			Ok(asset) => line.push_str(&format!(
				" ({}, {} bytes)",
				asset.content_type.to_str().unwrap_or("?"),
				asset.bytes.len()
			)),
			Err(e) => line.push_str(&format!(" (unreadable content: {e})")),
		}
	}

	line
}

#[cfg(test)]
mod tests {
	use super::*;

	use dp_draft_store::{DraftDatabase, DraftStatus};
	use tempfile::tempdir;

	#[test]
	fn keys_from_paths_and_urls() {
		let config = OverlayConfig::default();

		assert_eq!(
			key_for(&config, "/images/logo.png").unwrap().as_str(),
			"images:logo.png"
		);
		assert_eq!(
			key_for(&config, "/_ipx/w_200/images/logo.png").unwrap().as_str(),
			"images:logo.png"
		);
		assert!(key_for(&config, "/about").is_err());
	}

	#[tokio::test]
	async fn set_rename_and_discard() {
		let dir = tempdir().unwrap();
		let db = DraftDatabase::open(dir.path().join("drafts.redb")).unwrap();
		let drafts = db.media();
		let config = OverlayConfig::default();

		let file = dir.path().join("logo.png");
		fs::write(&file, [0u8, 0, 0]).unwrap();

		handle(
			&drafts,
			&config,
			DraftCommands::Set {
				path: "/images/logo.png".to_string(),
				file,
				created: false,
				mime: None,
			},
		)
		.await
		.unwrap();

		let record = drafts
			.get(&DraftKey::new("images:logo.png"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(record.status, DraftStatus::Updated);
		assert_eq!(
			record.modified.unwrap().raw,
			"data:image/png;base64,AAAA"
		);

		handle(
			&drafts,
			&config,
			DraftCommands::Rename {
				new_path: "/new/logo.png".to_string(),
				original_path: "/images/logo.png".to_string(),
			},
		)
		.await
		.unwrap();
		assert!(handle(
			&drafts,
			&config,
			DraftCommands::Rename {
				new_path: "/new/hero.png".to_string(),
				original_path: "hero.png".to_string(),
			},
		)
		.await
		.is_err());

		assert_eq!(drafts.list().await.unwrap().len(), 2);

		handle(
			&drafts,
			&config,
			DraftCommands::Discard {
				path: "/images/logo.png".to_string(),
			},
		)
		.await
		.unwrap();
		handle(&drafts, &config, DraftCommands::Clear).await.unwrap();

		assert!(drafts.list().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn unknown_media_types_need_mime() {
		let dir = tempdir().unwrap();
		let db = DraftDatabase::open(dir.path().join("drafts.redb")).unwrap();
		let config = OverlayConfig {
			extra_extensions: vec!["glb".to_string()],
			..OverlayConfig::default()
		};

		let file = dir.path().join("model.glb");
		fs::write(&file, b"glTF").unwrap();

		let set = |mime: Option<&str>| DraftCommands::Set {
			path: "/models/chair.glb".to_string(),
			file: file.clone(),
			created: true,
			mime: mime.map(ToString::to_string),
		};

		assert!(handle(&db.media(), &config, set(None)).await.is_err());
		handle(&db.media(), &config, set(Some("model/gltf-binary")))
			.await
			.unwrap();

		let record = db
			.media()
			.get(&DraftKey::new("models:chair.glb"))
			.await
			.unwrap()
			.unwrap();
		assert_eq!(record.status, DraftStatus::Created);
	}
}
