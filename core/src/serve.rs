//! Building responses for locally resolved assets.

use std::{fmt::Debug, panic::Location};

use http::{
	header::{ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE},
	response, HeaderValue, Method, Response, StatusCode,
};
use http_range::HttpRange;
use hyper::Body;
use tracing::{debug, error};

use crate::{data_url::DecodedAsset, InterceptedRequest};

/// Names the outcome on every response the overlay changed.
pub const OVERLAY_HEADER: &str = "x-draft-overlay";

/// Serve `asset` for `request`.
///
/// This function takes care of:
///  - `HEAD` requests
///  - single `Range` requests for partial content, which media elements rely on
pub fn serve_asset(
	asset: DecodedAsset,
	request: &InterceptedRequest,
	outcome: &'static str,
) -> Response<Body> {
	let len = u64::try_from(asset.bytes.len()).unwrap_or(u64::MAX);

	let resp = Response::builder()
		.header(CONTENT_TYPE, asset.content_type)
		.header(ACCEPT_RANGES, HeaderValue::from_static("bytes"))
		.header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
		.header(OVERLAY_HEADER, HeaderValue::from_static(outcome));

	// https://developer.mozilla.org/en-US/docs/Web/HTTP/Range_requests
	if len > 0 && request.method == Method::GET {
		if let Some(range) = request.headers.get(RANGE) {
			let Some(range) = single_range(range, len) else {
				return finish(
					resp.status(StatusCode::RANGE_NOT_SATISFIABLE)
						.header(CONTENT_RANGE, format!("bytes */{len}")),
					Body::empty(),
				);
			};

			let (Ok(start), Ok(end)) = (
				usize::try_from(range.start),
				usize::try_from(range.start + range.length),
			) else {
				return finish(resp.status(StatusCode::RANGE_NOT_SATISFIABLE), Body::empty());
			};

			return finish(
				resp.status(StatusCode::PARTIAL_CONTENT)
					.header(
						CONTENT_RANGE,
						format!(
							"bytes {}-{}/{len}",
							range.start,
							range.start + range.length - 1
						),
					)
					.header(CONTENT_LENGTH, range.length),
				Body::from(asset.bytes.slice(start..end)),
			);
		}
	}

	let body = if request.method == Method::HEAD {
		Body::empty()
	} else {
		Body::from(asset.bytes)
	};

	finish(
		resp.status(StatusCode::OK).header(CONTENT_LENGTH, len),
		body,
	)
}

// Multipart ranges are not supported
fn single_range(value: &HeaderValue, len: u64) -> Option<HttpRange> {
	let mut ranges = HttpRange::parse(value.to_str().ok()?, len).ok()?;
	if ranges.len() != 1 {
		return None;
	}

	ranges
		.pop()
		.filter(|range| range.length > 0 && range.start + range.length <= len)
}

fn finish(builder: response::Builder, body: Body) -> Response<Body> {
	builder.body(body).unwrap_or_else(|e| {
		error!("Error building overlay response: {e:#?}");
		status_only(StatusCode::INTERNAL_SERVER_ERROR)
	})
}

fn status_only(status: StatusCode) -> Response<Body> {
	let mut resp = Response::new(Body::empty());
	*resp.status_mut() = status;
	resp
}

#[track_caller]
pub fn bad_request(err: impl Debug) -> Response<Body> {
	debug!("400: Bad Request at {}: {err:?}", Location::caller());

	status_only(StatusCode::BAD_REQUEST)
}

#[track_caller]
pub fn not_found(err: impl Debug) -> Response<Body> {
	debug!("404: Not Found at {}: {err:?}", Location::caller());

	status_only(StatusCode::NOT_FOUND)
}

#[track_caller]
pub fn internal_server_error(err: impl Debug) -> Response<Body> {
	error!("500: Internal Server Error at {}: {err:?}", Location::caller());

	status_only(StatusCode::INTERNAL_SERVER_ERROR)
}

#[track_caller]
pub fn bad_gateway(err: impl Debug) -> Response<Body> {
	error!("502: Bad Gateway at {}: {err:?}", Location::caller());

	status_only(StatusCode::BAD_GATEWAY)
}
