//! Image served in place of assets whose draft deletes them.
//!
//! It is compiled into the binary so it never depends on the origin or on the deleted
//! asset still being reachable.

use bytes::Bytes;
use http::HeaderValue;

use crate::data_url::DecodedAsset;

pub const WIDTH: u32 = 200;
pub const HEIGHT: u32 = 200;

static DELETED_SVG: &[u8] = include_bytes!("../assets/deleted.svg");

#[must_use]
pub fn deleted() -> DecodedAsset {
	DecodedAsset {
		content_type: HeaderValue::from_static("image/svg+xml"),
		bytes: Bytes::from_static(DELETED_SVG),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn placeholder_has_fixed_dimensions() {
		let svg = std::str::from_utf8(&deleted().bytes).unwrap().to_string();

		assert!(svg.contains(&format!(r#"width="{WIDTH}""#)));
		assert!(svg.contains(&format!(r#"height="{HEIGHT}""#)));
	}
}
