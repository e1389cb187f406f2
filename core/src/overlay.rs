use anyhow::anyhow;
use http::{HeaderValue, Response};
use hyper::Body;
use tracing::warn;

use dp_draft_store::DraftStore;

use crate::{
	placeholder,
	resolver::{Resolution, Resolver, SiteOrigin},
	serve::{bad_gateway, serve_asset, OVERLAY_HEADER},
	upstream::{HttpUpstream, Upstream},
	InterceptedRequest, OverlayConfig,
};

/// Renames are followed through the draft store at most this many times before the
/// last target is fetched from the network, so rename cycles terminate.
pub const MAX_RENAME_HOPS: usize = 4;

/// Answers intercepted requests: resolves them against the drafts and either builds
/// the response locally or fetches it through the [`Upstream`].
pub struct Overlay<S, U> {
	resolver: Resolver<S>,
	upstream: U,
}

impl<S: DraftStore, U: Upstream> Overlay<S, U> {
	pub const fn new(resolver: Resolver<S>, upstream: U) -> Self {
		Self { resolver, upstream }
	}

	pub const fn resolver(&self) -> &Resolver<S> {
		&self.resolver
	}

	pub const fn upstream(&self) -> &U {
		&self.upstream
	}

	/// `body` is handed to the upstream untouched when the request is forwarded.
	pub async fn handle(&self, mut request: InterceptedRequest, body: Body) -> Response<Body> {
		let mut renamed = false;

		for _ in 0..=MAX_RENAME_HOPS {
			match self.resolver.resolve(&request).await {
				Resolution::Forward => return self.forward(request, body, renamed).await,
				Resolution::Deleted => {
					return serve_asset(
						placeholder::deleted(),
						&request,
						Resolution::Deleted.label(),
					)
				}
				Resolution::Synthesized(asset) => {
					return serve_asset(asset, &request, "synthesized");
				}
				// The original path may carry a draft of its own, so it goes through the
				// resolver again
				Resolution::Redirect { path } => match request.with_path(&path) {
					Ok(next) => {
						request = next;
						renamed = true;
					}
					Err(e) => {
						warn!(%path, "Invalid original path on renamed draft: {e:#}");
						return self.forward(request, body, renamed).await;
					}
				},
			}
		}

		warn!(uri = %request.uri, "Too many chained renames, fetching the last target");
		self.forward(request, body, renamed).await
	}

	async fn forward(
		&self,
		request: InterceptedRequest,
		body: Body,
		renamed: bool,
	) -> Response<Body> {
		match self.upstream.fetch(request, body).await {
			Ok(mut response) => {
				if renamed {
					response
						.headers_mut()
						.insert(OVERLAY_HEADER, HeaderValue::from_static("renamed"));
				}
				response
			}
			Err(e) => bad_gateway(e),
		}
	}
}

impl<S: DraftStore> Overlay<S, HttpUpstream> {
	/// Overlay forwarding to the configured origin over HTTP.
	pub fn from_config(config: &OverlayConfig, store: S) -> anyhow::Result<Self> {
		let origin = config.origin_url()?;

		let site = SiteOrigin::from_url(&origin)
			.ok_or_else(|| anyhow!("origin {origin} has no host or port"))?;

		let resolver = Resolver::new(store, config.normalizer()).with_origin(site);
		let upstream = HttpUpstream::new(origin, config.upstream_timeout())?;

		Ok(Self::new(resolver, upstream))
	}
}
