use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand};
use dp_core::{
	config::{default_data_dir, draft_db_path},
	drafts_api, proxy, Overlay, OverlayConfig,
};
use dp_draft_store::{DraftDatabase, Namespace};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use editor::RemoteDrafts;

mod drafts;
mod editor;
mod utils;

#[derive(Parser, Debug)]
#[command(name = "dp-server")]
#[command(about = "Serves unpublished asset drafts in place of the published ones", long_about = None)]
struct Cli {
	/// Directory holding `overlay.json` and the draft database
	#[arg(long, env = "DP_DATA_DIR", global = true)]
	data_dir: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Run the overlay proxy in front of the origin
	Serve {
		/// Origin to forward requests to, overrides the config
		#[arg(long)]
		origin: Option<String>,
		/// Address to listen on, overrides the config
		#[arg(long)]
		listen: Option<SocketAddr>,
	},
	/// Inspect and edit drafts
	Draft {
		#[arg(long, global = true, default_value_t = Namespace::Media)]
		namespace: Namespace,
		/// Address of a running server to edit through, overrides the config
		#[arg(long, global = true)]
		listen: Option<SocketAddr>,

		#[command(subcommand)]
		command: drafts::DraftCommands,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let data_dir = match cli.data_dir {
		Some(dir) => dir,
		None => default_data_dir()?,
	};
	let mut config = OverlayConfig::load_or_create(&data_dir)?;

	init_logging(&config.log_level);

	let open_db = || {
		DraftDatabase::open(draft_db_path(&data_dir))
			.with_context(|| format!("opening drafts in {}", data_dir.display()))
	};

	match cli.command {
		Commands::Serve { origin, listen } => {
			if let Some(origin) = origin {
				config.origin = origin;
			}
			if let Some(listen) = listen {
				config.listen = listen;
			}

			serve(&config, open_db()?).await
		}
		Commands::Draft {
			namespace,
			listen,
			command,
		} => {
			let listen = listen.unwrap_or(config.listen);

			// A running server holds the database, so its draft API is the only way in
			if let Some(remote) = RemoteDrafts::connect(listen, namespace).await? {
				debug!("Editing drafts through http://{listen}");
				drafts::handle(&remote, &config, command).await
			} else {
				drafts::handle(&open_db()?.namespace(namespace), &config, command).await
			}
		}
	}
}

/// The overlay proxy plus the draft API, sharing one database handle.
pub(crate) fn app(config: &OverlayConfig, db: DraftDatabase) -> Result<Router> {
	let overlay = Arc::new(Overlay::from_config(config, db.media())?);

	Ok(proxy::router(overlay).merge(drafts_api::router(db)))
}

async fn serve(config: &OverlayConfig, db: DraftDatabase) -> Result<()> {
	let app = app(config, db)?;

	info!(
		origin = %config.origin,
		"Listening on http://{}", config.listen
	);
	axum::Server::try_bind(&config.listen)
		.with_context(|| format!("binding {}", config.listen))?
		.serve(app.into_make_service())
		.with_graceful_shutdown(utils::axum_shutdown_signal())
		.await?;

	info!("Overlay stopped");
	Ok(())
}

fn init_logging(level: &str) {
	// RUST_LOG wins over the configured level
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(level))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(std::io::stderr).with_target(false))
		.init();
}
