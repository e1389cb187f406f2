//! Codec for the `data:<media-type>;base64,<payload>` strings drafts keep their bytes in.

use base64::{
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
	Engine,
};
use bytes::Bytes;
use http::HeaderValue;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DataUrlError;

#[allow(clippy::expect_used)]
static DATA_URL: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?s)^data:([^,]+?);base64,(.*)$").expect("hardcoded data URL pattern is valid")
});

// Editors are not consistent about padding, accept payloads with or without it
const PAYLOAD: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Bytes of a draft together with the media type they are served as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAsset {
	pub content_type: HeaderValue,
	pub bytes: Bytes,
}

pub fn decode(raw: &str) -> Result<DecodedAsset, DataUrlError> {
	let captures = DATA_URL.captures(raw).ok_or(DataUrlError::NotDataUrl)?;
	let (media_type, payload) = match (captures.get(1), captures.get(2)) {
		(Some(media_type), Some(payload)) => (media_type.as_str().trim(), payload.as_str()),
		_ => return Err(DataUrlError::NotDataUrl),
	};

	let content_type = HeaderValue::from_str(media_type)
		.map_err(|_| DataUrlError::InvalidMediaType(media_type.to_string()))?;

	Ok(DecodedAsset {
		content_type,
		bytes: PAYLOAD.decode(payload.trim_end())?.into(),
	})
}

#[must_use]
pub fn encode(media_type: &str, bytes: &[u8]) -> String {
	format!("data:{media_type};base64,{}", PAYLOAD.encode(bytes))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_png_payload() {
		let asset = decode("data:image/png;base64,AAAA").unwrap();

		assert_eq!(asset.content_type, "image/png");
		assert_eq!(asset.bytes.as_ref(), &[0, 0, 0]);
	}

	#[test]
	fn keeps_media_type_parameters() {
		let asset = decode("data:image/svg+xml;charset=utf-8;base64,PHN2Zy8+").unwrap();

		assert_eq!(asset.content_type, "image/svg+xml;charset=utf-8");
		assert_eq!(asset.bytes.as_ref(), b"<svg/>");
	}

	#[test]
	fn unpadded_payloads() {
		assert_eq!(decode("data:text/plain;base64,aGk").unwrap().bytes.as_ref(), b"hi");
		assert_eq!(decode("data:text/plain;base64,aGk=").unwrap().bytes.as_ref(), b"hi");
	}

	#[test]
	fn round_trip_all_lengths() {
		let source = (0..=255u8).cycle().take(1027).collect::<Vec<_>>();

		for len in 0..source.len() {
			let raw = encode("application/octet-stream", &source[..len]);
			let asset = decode(&raw).unwrap();

			assert_eq!(asset.bytes.len(), len);
			assert_eq!(asset.bytes.as_ref(), &source[..len]);
		}
	}

	#[test]
	fn malformed_descriptors() {
		assert!(matches!(
			decode("data:image/png;base64AAAA"),
			Err(DataUrlError::NotDataUrl)
		));
		assert!(matches!(
			decode("image/png;base64,AAAA"),
			Err(DataUrlError::NotDataUrl)
		));
		assert!(matches!(
			decode("data:image/png,AAAA"),
			Err(DataUrlError::NotDataUrl)
		));
		assert!(matches!(
			decode("data:;base64,AAAA"),
			Err(DataUrlError::NotDataUrl)
		));
		assert!(matches!(
			decode("data:image/png;base64,@@@@"),
			Err(DataUrlError::Base64(_))
		));
		assert!(matches!(
			decode("data:image/\u{7f}png;base64,AAAA"),
			Err(DataUrlError::InvalidMediaType(_))
		));
	}
}
