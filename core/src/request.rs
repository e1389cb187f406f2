use http::{HeaderMap, Method, Uri};

/// Head of a request on its way to the network, as handed to the overlay.
///
/// The body travels beside it and is only read if the request ends up forwarded.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
	pub method: Method,
	pub uri: Uri,
	pub headers: HeaderMap,
}

impl InterceptedRequest {
	pub fn get(uri: Uri) -> Self {
		Self {
			method: Method::GET,
			uri,
			headers: HeaderMap::new(),
		}
	}

	/// Same request, addressed to another origin-relative path.
	pub fn with_path(&self, path: &str) -> Result<Self, http::Error> {
		let mut parts = http::uri::Parts::default();
		parts.path_and_query = Some(path.parse()?);

		Ok(Self {
			uri: Uri::from_parts(parts)?,
			..self.clone()
		})
	}
}
