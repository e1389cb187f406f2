//! Maps request URLs to the logical asset path they address and to its draft store key.

use std::{borrow::Cow, collections::HashSet};

use dp_draft_store::DraftKey;
use http::Uri;
use url::form_urlencoded;

use crate::media::{extension_of, MEDIA_EXTENSIONS};

/// Joins logical path segments in a store key. Never appears in an interceptable path.
pub const KEY_DELIMITER: char = ':';

pub const DEFAULT_TRANSFORM_PREFIX: &str = "/_ipx";
pub const DEFAULT_CDN_PREFIX: &str = "/_vercel/image";

// IPX modifier names, a segment like `w_200` or `f_webp,q_80` is only a modifier if every
// `name_value` pair in it uses one of these.
const IPX_MODIFIERS: &[&str] = &[
	"animated", "b", "background", "blur", "enlarge", "extend", "f", "fit", "flip", "flop",
	"format", "grayscale", "h", "height", "kernel", "median", "modulate", "negate",
	"normalize", "pos", "position", "q", "quality", "resize", "rotate", "s", "sharpen",
	"threshold", "tint", "trim", "w", "width",
];

#[derive(Debug, Clone)]
pub struct PathNormalizer {
	transform_prefix: String,
	cdn_prefix: String,
	extensions: HashSet<String>,
}

impl Default for PathNormalizer {
	fn default() -> Self {
		Self::new(DEFAULT_TRANSFORM_PREFIX, DEFAULT_CDN_PREFIX)
	}
}

impl PathNormalizer {
	pub fn new(transform_prefix: impl Into<String>, cdn_prefix: impl Into<String>) -> Self {
		Self {
			transform_prefix: trim_prefix(transform_prefix.into()),
			cdn_prefix: trim_prefix(cdn_prefix.into()),
			extensions: MEDIA_EXTENSIONS.iter().map(ToString::to_string).collect(),
		}
	}

	/// Recognize more media extensions on top of the built-in image, audio and video ones.
	#[must_use]
	pub fn with_extensions<I, E>(mut self, extra: I) -> Self
	where
		I: IntoIterator<Item = E>,
		E: AsRef<str>,
	{
		self.extensions.extend(
			extra
				.into_iter()
				.map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase()),
		);
		self
	}

	/// Logical path and store key of `uri`, or `None` when the request is not a
	/// candidate for interception.
	#[must_use]
	pub fn normalize(&self, uri: &Uri) -> Option<(String, DraftKey)> {
		let logical_path = self.logical_path(uri.path(), uri.query())?;
		let key = store_key(&logical_path)?;

		Some((logical_path, key))
	}

	/// First matching rule wins:
	/// 1. image-transform proxy: `<prefix>/<transform>/<path>`, or
	///    `<prefix>/_/<modifiers>/<path>`
	/// 2. image CDN: `<prefix>?url=<path>`
	/// 3. any path with a recognized media extension
	#[must_use]
	pub fn logical_path(&self, path: &str, query: Option<&str>) -> Option<String> {
		if let Some(rest) = path
			.strip_prefix(self.transform_prefix.as_str())
			.and_then(|rest| rest.strip_prefix('/'))
		{
			return strip_transform(rest);
		}

		if path == self.cdn_prefix || path.strip_prefix(self.cdn_prefix.as_str()) == Some("/") {
			return query.and_then(cdn_target);
		}

		extension_of(path)
			.filter(|ext| self.extensions.contains(ext))
			.map(|_| path.to_string())
	}
}

/// Store key of a logical path: `/images/logo.png` becomes `images:logo.png`.
///
/// Segments are percent-decoded first. Paths with empty or dot segments, or whose
/// decoded segments contain `/` or the key delimiter, have no key.
#[must_use]
pub fn store_key(logical_path: &str) -> Option<DraftKey> {
	let trimmed = logical_path.strip_prefix('/').unwrap_or(logical_path);
	if trimmed.is_empty() {
		return None;
	}

	let segments = trimmed
		.split('/')
		.map(|segment| {
			let decoded = urlencoding::decode(segment).ok()?;
			let valid = !decoded.is_empty()
				&& decoded != "."
				&& decoded != ".."
				&& !decoded.contains(['/', KEY_DELIMITER]);

			valid.then(|| decoded.into_owned())
		})
		.collect::<Option<Vec<_>>>()?;

	Some(DraftKey::new(
		segments.join(&*KEY_DELIMITER.encode_utf8(&mut [0; 4])),
	))
}

/// Percent-encode a logical path so it can be put back on the wire.
///
/// Already encoded segments are decoded first, so encoding is idempotent.
#[must_use]
pub fn encode_path(logical_path: &str) -> String {
	let encoded = logical_path
		.trim_start_matches('/')
		.split('/')
		.map(|segment| {
			let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
			urlencoding::encode(&decoded).into_owned()
		})
		.collect::<Vec<_>>();

	format!("/{}", encoded.join("/"))
}

fn trim_prefix(prefix: String) -> String {
	let trimmed = prefix.trim_end_matches('/');
	if trimmed.starts_with('/') {
		trimmed.to_string()
	} else {
		format!("/{trimmed}")
	}
}

fn strip_transform(rest: &str) -> Option<String> {
	let mut segments = rest.split('/').peekable();

	// The transform segment is mandatory. Only `_` may be followed by one more modifier
	// segment, anything after that is the asset path.
	let transform = segments.next().filter(|transform| !transform.is_empty())?;
	if transform == "_" {
		segments.next_if(|segment| is_modifier_segment(segment));
	}

	let remainder = segments.collect::<Vec<_>>();

	(!remainder.is_empty() && remainder.iter().all(|segment| !segment.is_empty()))
		.then(|| format!("/{}", remainder.join("/")))
}

fn is_modifier_segment(segment: &str) -> bool {
	segment == "_"
		|| segment.split([',', '&']).all(|modifier| {
			modifier
				.split_once('_')
				.is_some_and(|(name, _)| IPX_MODIFIERS.contains(&name))
		})
}

fn cdn_target(query: &str) -> Option<String> {
	let (_, target) = form_urlencoded::parse(query.as_bytes()).find(|(name, _)| name == "url")?;

	// Only same-origin, origin-relative targets; strip any query or fragment of the target
	let path = target.split(['?', '#']).next()?;
	(path.starts_with('/') && !path.starts_with("//")).then(|| path.to_string())
}
