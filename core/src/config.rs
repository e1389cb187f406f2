//! Overlay configuration

use std::{
	fs,
	net::{Ipv4Addr, SocketAddr},
	path::{Path, PathBuf},
	time::Duration,
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::normalize::{PathNormalizer, DEFAULT_CDN_PREFIX, DEFAULT_TRANSFORM_PREFIX};

pub const CONFIG_FILE: &str = "overlay.json";
pub const DRAFT_DB_FILE: &str = "drafts.redb";

/// Overlay configuration, stored as `overlay.json` in the data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
	/// Config schema version
	pub version: u32,

	/// Base URL requests are forwarded to
	pub origin: String,

	/// Address the proxy listens on
	pub listen: SocketAddr,

	/// Path prefix of the image-transform proxy
	#[serde(default = "default_transform_prefix")]
	pub transform_prefix: String,

	/// Path prefix of the image CDN endpoint
	#[serde(default = "default_cdn_prefix")]
	pub cdn_prefix: String,

	/// Media extensions recognized on top of the built-in ones
	#[serde(default)]
	pub extra_extensions: Vec<String>,

	/// Timeout of a single upstream request, in seconds
	#[serde(default = "default_upstream_timeout_secs")]
	pub upstream_timeout_secs: u64,

	/// Logging level, `RUST_LOG` takes precedence
	pub log_level: String,
}

impl Default for OverlayConfig {
	fn default() -> Self {
		Self {
			version: Self::CURRENT_VERSION,
			origin: "http://localhost:3000".to_string(),
			listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 8787)),
			transform_prefix: default_transform_prefix(),
			cdn_prefix: default_cdn_prefix(),
			extra_extensions: Vec::new(),
			upstream_timeout_secs: default_upstream_timeout_secs(),
			log_level: "info".to_string(),
		}
	}
}

impl OverlayConfig {
	pub const CURRENT_VERSION: u32 = 1;

	/// Load the configuration of `data_dir`, writing the defaults there when it has none
	pub fn load_or_create(data_dir: &Path) -> Result<Self> {
		let config_path = data_dir.join(CONFIG_FILE);

		if !config_path.exists() {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default();
			config.save(data_dir)?;
			return Ok(config);
		}

		info!("Loading config from {:?}", config_path);
		let json = fs::read_to_string(&config_path)
			.with_context(|| format!("reading {}", config_path.display()))?;
		let config: Self = serde_json::from_str(&json)
			.with_context(|| format!("parsing {}", config_path.display()))?;

		if config.version > Self::CURRENT_VERSION {
			return Err(anyhow!(
				"config version {} is newer than supported version {}",
				config.version,
				Self::CURRENT_VERSION
			));
		}

		Ok(config)
	}

	pub fn save(&self, data_dir: &Path) -> Result<()> {
		fs::create_dir_all(data_dir)?;

		let config_path = data_dir.join(CONFIG_FILE);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)?;
		info!("Saved config to {:?}", config_path);
		Ok(())
	}

	pub fn normalizer(&self) -> PathNormalizer {
		PathNormalizer::new(&*self.transform_prefix, &*self.cdn_prefix)
			.with_extensions(&self.extra_extensions)
	}

	pub fn origin_url(&self) -> Result<Url> {
		let url = Url::parse(&self.origin)
			.with_context(|| format!("invalid origin url {:?}", self.origin))?;

		if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
			return Err(anyhow!("origin must be an http(s) url, got {:?}", self.origin));
		}

		Ok(url)
	}

	pub const fn upstream_timeout(&self) -> Duration {
		Duration::from_secs(self.upstream_timeout_secs)
	}
}

pub fn draft_db_path(data_dir: &Path) -> PathBuf {
	data_dir.join(DRAFT_DB_FILE)
}

/// Platform-specific data directory resolution
pub fn default_data_dir() -> Result<PathBuf> {
	let dir = dirs::data_local_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("draft-preview");

	// Create directory if it doesn't exist
	fs::create_dir_all(&dir)?;

	Ok(dir)
}

fn default_transform_prefix() -> String {
	DEFAULT_TRANSFORM_PREFIX.to_string()
}

fn default_cdn_prefix() -> String {
	DEFAULT_CDN_PREFIX.to_string()
}

const fn default_upstream_timeout_secs() -> u64 {
	30
}
