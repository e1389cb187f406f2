//! The overlay as an HTTP service: every request the router receives goes through
//! [`Overlay::handle`].

use std::sync::Arc;

use axum::{
	body::{Body, BoxBody},
	extract::State,
	http::{header, HeaderValue, Request, Response},
	middleware::{self, Next},
	routing::get,
	Router,
};
use tower_http::trace::TraceLayer;

use dp_draft_store::DraftStore;

use crate::{
	serve::OVERLAY_HEADER,
	upstream::Upstream,
	InterceptedRequest, Overlay,
};

pub const HEALTH_PATH: &str = "/__overlay/health";

pub fn router<S, U>(overlay: Arc<Overlay<S, U>>) -> Router<()>
where
	S: DraftStore + 'static,
	U: Upstream + 'static,
{
	Router::new()
		.route(HEALTH_PATH, get(|| async { "OK" }))
		.fallback(intercept::<S, U>)
		.layer(middleware::from_fn(cors_middleware))
		.layer(TraceLayer::new_for_http())
		.with_state(overlay)
}

async fn intercept<S, U>(
	State(overlay): State<Arc<Overlay<S, U>>>,
	request: Request<Body>,
) -> Response<hyper::Body>
where
	S: DraftStore + 'static,
	U: Upstream + 'static,
{
	let (parts, body) = request.into_parts();

	overlay
		.handle(
			InterceptedRequest {
				method: parts.method,
				uri: parts.uri,
				headers: parts.headers,
			},
			body,
		)
		.await
}

// Pages may load assets cross-origin (canvas, fetch), so responses built by the overlay
// must be readable there too. Upstream responses keep whatever the origin sent.
async fn cors_middleware<B>(req: Request<B>, next: Next<B>) -> Response<BoxBody> {
	let mut response = next.run(req).await;

	if response.headers().contains_key(OVERLAY_HEADER)
		&& !response
			.headers()
			.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
	{
		response.headers_mut().insert(
			header::ACCESS_CONTROL_ALLOW_ORIGIN,
			HeaderValue::from_static("*"),
		);
		response.headers_mut().insert(
			header::ACCESS_CONTROL_EXPOSE_HEADERS,
			HeaderValue::from_static(OVERLAY_HEADER),
		);
	}

	response
}
