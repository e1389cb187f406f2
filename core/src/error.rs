pub type Result<T> = std::result::Result<T, Error>;

/// Errors the overlay can run into. None of them reach the browser: the resolver logs
/// them and falls back to the network.
#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("draft store error: {0}")]
	Store(#[from] dp_draft_store::Error),
	#[error("malformed draft payload: {0}")]
	Payload(#[from] DataUrlError),
}

#[derive(thiserror::Error, Debug)]
pub enum DataUrlError {
	#[error("not a base64 data URL")]
	NotDataUrl,
	#[error("media type '{0}' is not a valid header value")]
	InvalidMediaType(String),
	#[error("invalid base64 payload: {0}")]
	Base64(#[from] base64::DecodeError),
}
