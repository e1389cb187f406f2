//! Where `draft` commands write: straight into the draft database, or through the
//! running server that holds it.

use std::{
	net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
	time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use dp_core::{
	drafts_api::{Cleared, DRAFTS_PATH},
	proxy::HEALTH_PATH,
};
use dp_draft_store::{DraftKey, DraftRecord, DraftStore, Drafts, Namespace};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

const HEALTH_TIMEOUT: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait DraftEditor: Send + Sync {
	fn namespace_kind(&self) -> Namespace;

	async fn get(&self, key: &DraftKey) -> Result<Option<DraftRecord>>;

	async fn put(&self, record: DraftRecord) -> Result<()>;

	async fn remove(&self, key: &DraftKey) -> Result<bool>;

	async fn list(&self) -> Result<Vec<DraftRecord>>;

	async fn clear(&self) -> Result<usize>;
}

#[async_trait]
impl DraftEditor for Drafts {
	fn namespace_kind(&self) -> Namespace {
		Self::namespace_kind(self)
	}

	async fn get(&self, key: &DraftKey) -> Result<Option<DraftRecord>> {
		Ok(DraftStore::get(self, key).await?)
	}

	async fn put(&self, record: DraftRecord) -> Result<()> {
		Ok(Self::put(self, record).await?)
	}

	async fn remove(&self, key: &DraftKey) -> Result<bool> {
		Ok(Self::remove(self, key).await?)
	}

	async fn list(&self) -> Result<Vec<DraftRecord>> {
		Ok(Self::list(self).await?)
	}

	async fn clear(&self) -> Result<usize> {
		Ok(Self::clear(self).await?)
	}
}

/// Drafts edited through the draft API of a running server.
#[derive(Clone)]
pub struct RemoteDrafts {
	client: reqwest::Client,
	base: Url,
	namespace: Namespace,
}

impl RemoteDrafts {
	/// Editor for the server listening on `listen`, or `None` when nothing answers there.
	pub async fn connect(listen: SocketAddr, namespace: Namespace) -> Result<Option<Self>> {
		// A server bound to every interface is reachable on loopback
		let ip = match listen.ip() {
			IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
			IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
			ip => ip,
		};
		let base = Url::parse(&format!("http://{}/", SocketAddr::new(ip, listen.port())))?;

		let client = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()?;

		let health = base.join(HEALTH_PATH.trim_start_matches('/'))?;
		match client.get(health).timeout(HEALTH_TIMEOUT).send().await {
			Ok(resp) if resp.status().is_success() => Ok(Some(Self {
				client,
				base,
				namespace,
			})),
			Ok(resp) => {
				debug!(status = %resp.status(), "Something else is listening on {listen}");
				Ok(None)
			}
			Err(e) => {
				debug!("No server listening on {listen}: {e}");
				Ok(None)
			}
		}
	}

	fn url(&self, key: Option<&DraftKey>) -> Result<Url> {
		let mut path = format!(
			"{}/{}",
			DRAFTS_PATH.trim_start_matches('/'),
			self.namespace
		);
		if let Some(key) = key {
			path.push('/');
			path.push_str(&urlencoding::encode(key.as_str()));
		}

		Ok(self.base.join(&path)?)
	}
}

#[async_trait]
impl DraftEditor for RemoteDrafts {
	fn namespace_kind(&self) -> Namespace {
		self.namespace
	}

	async fn get(&self, key: &DraftKey) -> Result<Option<DraftRecord>> {
		let resp = self.client.get(self.url(Some(key))?).send().await?;
		if resp.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		Ok(Some(resp.error_for_status()?.json().await?))
	}

	async fn put(&self, record: DraftRecord) -> Result<()> {
		self.client
			.put(self.url(Some(&record.key))?)
			.json(&record)
			.send()
			.await?
			.error_for_status()?;

		Ok(())
	}

	async fn remove(&self, key: &DraftKey) -> Result<bool> {
		let resp = self.client.delete(self.url(Some(key))?).send().await?;
		if resp.status() == StatusCode::NOT_FOUND {
			return Ok(false);
		}
		resp.error_for_status()?;

		Ok(true)
	}

	async fn list(&self) -> Result<Vec<DraftRecord>> {
		Ok(self
			.client
			.get(self.url(None)?)
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?)
	}

	async fn clear(&self) -> Result<usize> {
		let cleared = self
			.client
			.delete(self.url(None)?)
			.send()
			.await?
			.error_for_status()?
			.json::<Cleared>()
			.await?;

		Ok(cleared.removed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use dp_core::OverlayConfig;
	use dp_draft_store::DraftDatabase;
	use tempfile::tempdir;

	async fn spawn_server(db: DraftDatabase) -> SocketAddr {
		let app = crate::app(&OverlayConfig::default(), db).unwrap();
		let server = axum::Server::bind(&SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
			.serve(app.into_make_service());
		let addr = server.local_addr();
		tokio::spawn(server);

		addr
	}

	#[tokio::test]
	async fn edits_go_through_the_running_server() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("drafts.redb");
		let db = DraftDatabase::open(&path).unwrap();
		let addr = spawn_server(db.clone()).await;

		// The server holds the database file
		assert!(DraftDatabase::open(&path).is_err());

		let remote = RemoteDrafts::connect(addr, Namespace::Media)
			.await
			.unwrap()
			.unwrap();
		let key = DraftKey::new("images:logo.png");

		remote
			.put(DraftRecord::updated(key.clone(), "data:image/png;base64,AAAA"))
			.await
			.unwrap();

		// The overlay serves the edit on the next request
		let resp = reqwest::get(format!("http://{addr}/images/logo.png"))
			.await
			.unwrap();
		assert_eq!(resp.status(), StatusCode::OK);
		assert_eq!(resp.headers()["content-type"], "image/png");
		assert_eq!(resp.bytes().await.unwrap().as_ref(), &[0, 0, 0]);

		assert_eq!(
			DraftStore::get(&db.media(), &key).await.unwrap(),
			remote.get(&key).await.unwrap()
		);

		assert!(remote.remove(&key).await.unwrap());
		assert!(!remote.remove(&key).await.unwrap());
		assert_eq!(remote.get(&key).await.unwrap(), None);
	}

	#[tokio::test]
	async fn concurrent_remote_writers() {
		let dir = tempdir().unwrap();
		let db = DraftDatabase::open(dir.path().join("drafts.redb")).unwrap();
		let addr = spawn_server(db.clone()).await;

		let remote = RemoteDrafts::connect(addr, Namespace::Documents)
			.await
			.unwrap()
			.unwrap();

		let writers = (0..8)
			.map(|i| {
				let remote = remote.clone();
				tokio::spawn(async move {
					remote
						.put(DraftRecord::deleted(DraftKey::new(format!("docs:{i}.md"))))
						.await
				})
			})
			.collect::<Vec<_>>();

		for writer in writers {
			writer.await.unwrap().unwrap();
		}

		assert_eq!(remote.list().await.unwrap().len(), 8);
		assert!(db.media().list().await.unwrap().is_empty());
		assert_eq!(remote.clear().await.unwrap(), 8);
		assert!(db.documents().list().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn no_remote_without_a_server() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);

		assert!(RemoteDrafts::connect(addr, Namespace::Media)
			.await
			.unwrap()
			.is_none());
	}
}
