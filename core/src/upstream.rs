//! The network side of the overlay.

use std::time::Duration;

use async_trait::async_trait;
use http::{
	header::{self, HeaderName},
	HeaderMap, Response, Uri,
};
use hyper::{body::HttpBody, Body};
use reqwest::redirect::Policy;
use tracing::trace;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
	#[error("invalid upstream url: {0}")]
	Url(#[from] url::ParseError),
	#[error("upstream request failed: {0}")]
	Request(#[from] reqwest::Error),
}

/// Fetches requests the overlay does not answer itself.
///
/// Request bodies are streamed through, never buffered.
#[async_trait]
pub trait Upstream: Send + Sync {
	async fn fetch(
		&self,
		request: crate::InterceptedRequest,
		body: Body,
	) -> Result<Response<Body>, UpstreamError>;
}

/// Forwards requests to the origin over HTTP.
pub struct HttpUpstream {
	client: reqwest::Client,
	origin: Url,
}

impl HttpUpstream {
	pub fn new(origin: Url, timeout: Duration) -> Result<Self, UpstreamError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			// Redirects are the browser's business
			.redirect(Policy::none())
			.build()?;

		Ok(Self { client, origin })
	}

	#[must_use]
	pub const fn origin(&self) -> &Url {
		&self.origin
	}

	/// Absolute-form URIs are fetched as they are, anything else is resolved against
	/// the origin (keeping any base path the origin has).
	pub fn target_url(&self, uri: &Uri) -> Result<Url, UpstreamError> {
		if uri.scheme().is_some() {
			return Ok(Url::parse(&uri.to_string())?);
		}

		let path_and_query = uri.path_and_query().map_or("/", http::uri::PathAndQuery::as_str);

		Ok(Url::parse(&format!(
			"{}{path_and_query}",
			self.origin.as_str().trim_end_matches('/')
		))?)
	}
}

#[async_trait]
impl Upstream for HttpUpstream {
	async fn fetch(
		&self,
		request: crate::InterceptedRequest,
		body: Body,
	) -> Result<Response<Body>, UpstreamError> {
		let url = self.target_url(&request.uri)?;

		let mut headers = request.headers;
		strip_hop_by_hop(&mut headers);
		// reqwest derives the host from the target
		headers.remove(header::HOST);

		trace!(method = %request.method, %url, "Forwarding request upstream");

		let mut upstream_request = self.client.request(request.method, url);
		if body.is_end_stream() {
			headers.remove(header::CONTENT_LENGTH);
		} else {
			// A declared length is kept, anything else goes out chunked
			upstream_request = upstream_request.body(reqwest::Body::wrap_stream(body));
		}

		let response = upstream_request.headers(headers).send().await?;

		let status = response.status();
		let mut headers = response.headers().clone();
		strip_hop_by_hop(&mut headers);

		let mut forwarded = Response::new(Body::wrap_stream(response.bytes_stream()));
		*forwarded.status_mut() = status;
		*forwarded.headers_mut() = headers;

		Ok(forwarded)
	}
}

// https://www.rfc-editor.org/rfc/rfc9110#section-7.6.1
const HOP_BY_HOP: [HeaderName; 7] = [
	header::CONNECTION,
	header::PROXY_AUTHENTICATE,
	header::PROXY_AUTHORIZATION,
	header::TE,
	header::TRAILER,
	header::TRANSFER_ENCODING,
	header::UPGRADE,
];

/// Remove the headers that only concern a single connection, including any the
/// `Connection` header itself names.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
	let named = headers
		.get_all(header::CONNECTION)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(','))
		.filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
		.collect::<Vec<_>>();

	for name in named.iter().chain(HOP_BY_HOP.iter()) {
		headers.remove(name);
	}
	headers.remove("keep-alive");
}

#[cfg(test)]
mod tests {
	use super::*;

	use http::HeaderValue;

	#[test]
	fn target_urls() {
		let upstream = HttpUpstream::new(
			Url::parse("http://localhost:3000/site/").unwrap(),
			Duration::from_secs(5),
		)
		.unwrap();

		assert_eq!(
			upstream
				.target_url(&"/images/logo.png?v=2".parse().unwrap())
				.unwrap()
				.as_str(),
			"http://localhost:3000/site/images/logo.png?v=2"
		);
		assert_eq!(
			upstream
				.target_url(&"https://cdn.test/a.png".parse().unwrap())
				.unwrap()
				.as_str(),
			"https://cdn.test/a.png"
		);
	}

	#[test]
	fn hop_by_hop_headers_are_dropped() {
		let mut headers = HeaderMap::new();
		headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-private"));
		headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
		headers.insert("x-private", HeaderValue::from_static("1"));
		headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
		headers.insert(header::ACCEPT, HeaderValue::from_static("image/*"));

		strip_hop_by_hop(&mut headers);

		assert_eq!(headers.len(), 1);
		assert_eq!(headers[header::ACCEPT], "image/*");
	}
}
