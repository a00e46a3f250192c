//! Car listings with owners and comments, served as HTML pages and as a JSON API.
//!
//! Anyone can read. Signed-in users can add cars and comment on any car; only
//! a car's owner can edit or delete it, and deleting a car deletes its comments.

use axum::Router;
use log::info;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;

pub mod api;
pub mod auth;
pub mod cars;
pub mod config;
pub mod db_client;
pub mod encryption_engine;
pub mod error;
pub mod pages;
pub mod search;
pub mod state;
pub mod store;
pub mod users;
pub mod validation;

use config::Config;
use state::AppState;

pub fn app(state: AppState) -> Router {
	Router::new()
		.merge(pages::router())
		.merge(api::router())
		.layer(CorsLayer::permissive())
		.with_state(state)
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
	info!("Initializing state...");
	let port = config.port;
	let state = AppState::init(config).await?;

	let address = format!("0.0.0.0:{}", port);
	let listener = TcpListener::bind(&address).await?;
	info!("Server running on {}", address);

	axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await?;

	info!("Server shut down");
	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		match signal::ctrl_c().await {
			Ok(()) => info!("Received Ctrl+C, shutting down"),
			Err(_) => std::future::pending::<()>().await,
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
				info!("Received terminate signal, shutting down");
			}
			Err(_) => std::future::pending::<()>().await,
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
