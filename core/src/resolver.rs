//! Decides, per request, what the overlay answers with.

use dp_draft_store::{DraftKey, DraftRecord, DraftStatus, DraftStore};
use http::{Method, Uri};
use tracing::{debug, trace, warn};
use url::Url;

use crate::{
	data_url::{self, DecodedAsset},
	normalize::{encode_path, PathNormalizer},
	InterceptedRequest, Result,
};

/// Outcome of resolving one request against the draft store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
	/// Send the request to the network untouched.
	Forward,
	/// The asset was renamed: fetch its original path instead.
	Redirect { path: String },
	/// Serve the draft's bytes without touching the network.
	Synthesized(DecodedAsset),
	/// The asset is deleted in the draft: serve the placeholder.
	Deleted,
}

impl Resolution {
	#[must_use]
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Forward => "forward",
			Self::Redirect { .. } => "renamed",
			Self::Synthesized(_) => "synthesized",
			Self::Deleted => "deleted",
		}
	}
}

/// Host and port of the site the overlay sits in front of.
///
/// Ports are always explicit, so `http://site.test` and `http://site.test:80` are the
/// same origin. Hosts compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOrigin {
	host: String,
	port: u16,
}

impl SiteOrigin {
	pub fn new(host: &str, port: u16) -> Self {
		Self {
			host: host.to_ascii_lowercase(),
			port,
		}
	}

	/// `None` for URLs without a host or a port their scheme does not imply.
	#[must_use]
	pub fn from_url(url: &Url) -> Option<Self> {
		Some(Self::new(url.host_str()?, url.port_or_known_default()?))
	}

	/// Whether `uri` addresses this origin. Origin-relative URIs always do.
	#[must_use]
	pub fn matches(&self, uri: &Uri) -> bool {
		let Some(host) = uri.host() else {
			return true;
		};

		let port = uri.port_u16().or(match uri.scheme_str() {
			Some(scheme) if scheme.eq_ignore_ascii_case("http") => Some(80),
			Some(scheme) if scheme.eq_ignore_ascii_case("https") => Some(443),
			_ => None,
		});

		host.eq_ignore_ascii_case(&self.host) && port == Some(self.port)
	}
}

pub struct Resolver<S> {
	store: S,
	normalizer: PathNormalizer,
	origin: Option<SiteOrigin>,
}

impl<S: DraftStore> Resolver<S> {
	pub const fn new(store: S, normalizer: PathNormalizer) -> Self {
		Self {
			store,
			normalizer,
			origin: None,
		}
	}

	/// Requests naming any other host or port are cross-origin and never intercepted.
	#[must_use]
	pub fn with_origin(mut self, origin: SiteOrigin) -> Self {
		self.origin = Some(origin);
		self
	}

	pub const fn normalizer(&self) -> &PathNormalizer {
		&self.normalizer
	}

	/// Resolve `request`. Never fails: every internal error resolves to
	/// [`Resolution::Forward`].
	pub async fn resolve(&self, request: &InterceptedRequest) -> Resolution {
		if !matches!(request.method, Method::GET | Method::HEAD) {
			return Resolution::Forward;
		}

		if self.is_cross_origin(request) {
			trace!(uri = %request.uri, "Cross-origin request, not intercepting");
			return Resolution::Forward;
		}

		let Some((logical_path, key)) = self.normalizer.normalize(&request.uri) else {
			return Resolution::Forward;
		};

		match self.lookup(&key).await {
			Ok(resolution) => {
				debug!(
					uri = %request.uri,
					%logical_path,
					%key,
					resolution = resolution.label(),
					"Resolved asset request"
				);
				resolution
			}
			Err(e) => {
				warn!(
					uri = %request.uri,
					%key,
					"Failed to resolve draft, falling back to network: {e:#}"
				);
				Resolution::Forward
			}
		}
	}

	async fn lookup(&self, key: &DraftKey) -> Result<Resolution> {
		// The only read of this resolution, later writes only affect later requests
		let Some(record) = self.store.get(key).await? else {
			return Ok(Resolution::Forward);
		};

		resolve_record(record)
	}

	fn is_cross_origin(&self, request: &InterceptedRequest) -> bool {
		self.origin
			.as_ref()
			.is_some_and(|origin| !origin.matches(&request.uri))
	}
}

fn resolve_record(record: DraftRecord) -> Result<Resolution> {
	Ok(match record.status {
		DraftStatus::Pristine => Resolution::Forward,
		DraftStatus::Deleted => Resolution::Deleted,
		DraftStatus::Created | DraftStatus::Updated => {
			if let Some(original) = record.original {
				Resolution::Redirect {
					path: encode_path(&original.path),
				}
			} else {
				let raw = record
					.modified
					.map(|modified| modified.raw)
					.unwrap_or_default();

				Resolution::Synthesized(data_url::decode(&raw)?)
			}
		}
	})
}
