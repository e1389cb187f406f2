use std::fmt;

use serde::{Deserialize, Serialize};

/// Store key of a draft: the logical path without its leading `/`, segments joined by `:`.
///
/// The key is opaque to the store. Deriving it from a request path is the job of the
/// overlay's path normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftKey(String);

impl DraftKey {
	pub fn new(key: impl Into<String>) -> Self {
		Self(key.into())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for DraftKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for DraftKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Lifecycle state of a draft.
///
/// Unknown values coming from the store deserialize to [`DraftStatus::Pristine`], which
/// means "serve whatever the network has".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
	Created,
	Updated,
	Deleted,
	// Must stay last to catch unknown values
	#[default]
	#[serde(other)]
	Pristine,
}

impl fmt::Display for DraftStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Pristine => "pristine",
			Self::Created => "created",
			Self::Updated => "updated",
			Self::Deleted => "deleted",
		})
	}
}

/// Pre-rename location of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalRef {
	pub path: String,
}

/// New content of an asset, as a `data:<media-type>;base64,<payload>` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedContent {
	pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
	pub key: DraftKey,
	#[serde(default)]
	pub status: DraftStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub original: Option<OriginalRef>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub modified: Option<ModifiedContent>,
}

impl DraftRecord {
	pub fn updated(key: DraftKey, raw: impl Into<String>) -> Self {
		Self {
			key,
			status: DraftStatus::Updated,
			original: None,
			modified: Some(ModifiedContent { raw: raw.into() }),
		}
	}

	pub fn created(key: DraftKey, raw: impl Into<String>) -> Self {
		Self {
			status: DraftStatus::Created,
			..Self::updated(key, raw)
		}
	}

	#[must_use]
	pub const fn deleted(key: DraftKey) -> Self {
		Self {
			key,
			status: DraftStatus::Deleted,
			original: None,
			modified: None,
		}
	}

	/// A rename: the asset now addressed by `key` still lives at `original_path` upstream.
	pub fn renamed(key: DraftKey, original_path: impl Into<String>) -> Self {
		Self {
			key,
			status: DraftStatus::Updated,
			original: Some(OriginalRef {
				path: original_path.into(),
			}),
			modified: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_status_is_pristine() {
		let record: DraftRecord =
			serde_json::from_str(r#"{"key":"images:logo.png","status":"archived"}"#).unwrap();

		assert_eq!(record.status, DraftStatus::Pristine);
		assert_eq!(record.key.as_str(), "images:logo.png");
	}

	#[test]
	fn every_status_round_trips() {
		for status in [
			DraftStatus::Created,
			DraftStatus::Updated,
			DraftStatus::Deleted,
			DraftStatus::Pristine,
		] {
			let json = serde_json::to_string(&status).unwrap();
			assert_eq!(json, format!("\"{status}\""));
			assert_eq!(serde_json::from_str::<DraftStatus>(&json).unwrap(), status);
		}
	}

	#[test]
	fn missing_status_is_pristine() {
		let record: DraftRecord = serde_json::from_str(r#"{"key":"a:b.png"}"#).unwrap();
		assert_eq!(record.status, DraftStatus::Pristine);
		assert!(record.original.is_none());
		assert!(record.modified.is_none());
	}

	#[test]
	fn record_wire_shape() {
		let record = DraftRecord::updated(
			DraftKey::new("images:logo.png"),
			"data:image/png;base64,AAAA",
		);

		assert_eq!(
			serde_json::to_value(&record).unwrap(),
			serde_json::json!({
				"key": "images:logo.png",
				"status": "updated",
				"modified": { "raw": "data:image/png;base64,AAAA" }
			})
		);
	}

	#[test]
	fn renamed_record_carries_original() {
		let record = DraftRecord::renamed(DraftKey::new("new:logo.png"), "/old/logo.png");
		let json = serde_json::to_string(&record).unwrap();

		assert!(json.contains(r#""original":{"path":"/old/logo.png"}"#));
		assert!(!json.contains("modified"));
	}
}
