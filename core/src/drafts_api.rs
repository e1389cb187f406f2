//! HTTP access to the draft database, for editors running outside the process that
//! holds it.
//!
//! - `GET    /__overlay/drafts/:namespace` lists the records of a namespace
//! - `DELETE /__overlay/drafts/:namespace` drops them all
//! - `GET    /__overlay/drafts/:namespace/:key` returns one record
//! - `PUT    /__overlay/drafts/:namespace/:key` stores the JSON record in the body
//! - `DELETE /__overlay/drafts/:namespace/:key` drops one record

use axum::{
	extract::{Path, State},
	http::{Response, StatusCode},
	routing::get,
	Json, Router,
};
use hyper::Body;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use dp_draft_store::{DraftDatabase, DraftKey, DraftRecord, DraftStore, Namespace};

use crate::serve::{bad_request, internal_server_error, not_found};

pub const DRAFTS_PATH: &str = "/__overlay/drafts";

/// Body of a namespace `DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cleared {
	pub removed: usize,
}

type ApiResult<T> = Result<T, Response<Body>>;

pub fn router(db: DraftDatabase) -> Router<()> {
	Router::new()
		.route(&format!("{DRAFTS_PATH}/:namespace"), get(list).delete(clear))
		.route(
			&format!("{DRAFTS_PATH}/:namespace/:key"),
			get(show).put(put).delete(remove),
		)
		.layer(TraceLayer::new_for_http())
		.with_state(db)
}

async fn list(
	State(db): State<DraftDatabase>,
	Path(namespace): Path<Namespace>,
) -> ApiResult<Json<Vec<DraftRecord>>> {
	db.namespace(namespace)
		.list()
		.await
		.map(Json)
		.map_err(internal_server_error)
}

async fn clear(
	State(db): State<DraftDatabase>,
	Path(namespace): Path<Namespace>,
) -> ApiResult<Json<Cleared>> {
	let removed = db
		.namespace(namespace)
		.clear()
		.await
		.map_err(internal_server_error)?;

	Ok(Json(Cleared { removed }))
}

async fn show(
	State(db): State<DraftDatabase>,
	Path((namespace, key)): Path<(Namespace, DraftKey)>,
) -> ApiResult<Json<DraftRecord>> {
	db.namespace(namespace)
		.get(&key)
		.await
		.map_err(internal_server_error)?
		.map(Json)
		.ok_or_else(|| not_found(key))
}

async fn put(
	State(db): State<DraftDatabase>,
	Path((namespace, key)): Path<(Namespace, DraftKey)>,
	Json(record): Json<DraftRecord>,
) -> ApiResult<StatusCode> {
	if record.key != key {
		return Err(bad_request(format!(
			"record key '{}' does not match '{key}'",
			record.key
		)));
	}

	db.namespace(namespace)
		.put(record)
		.await
		.map_err(internal_server_error)?;

	Ok(StatusCode::NO_CONTENT)
}

async fn remove(
	State(db): State<DraftDatabase>,
	Path((namespace, key)): Path<(Namespace, DraftKey)>,
) -> ApiResult<StatusCode> {
	let removed = db
		.namespace(namespace)
		.remove(&key)
		.await
		.map_err(internal_server_error)?;

	if removed {
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(not_found(key))
	}
}
