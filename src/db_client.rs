use std::{ops::Deref, sync::Arc};

use log::{error, info};
use tokio_postgres::{Client, NoTls};

use crate::config::DbConfig;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
	id BIGSERIAL PRIMARY KEY,
	username VARCHAR(150) NOT NULL UNIQUE,
	password_hash TEXT NOT NULL,
	is_admin BOOLEAN NOT NULL DEFAULT FALSE,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE TABLE IF NOT EXISTS cars (
	id BIGSERIAL PRIMARY KEY,
	make VARCHAR(100) NOT NULL,
	model VARCHAR(100) NOT NULL,
	year INTEGER NOT NULL,
	description TEXT NOT NULL,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	owner_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS cars_owner_idx ON cars (owner_id);
CREATE TABLE IF NOT EXISTS comments (
	id BIGSERIAL PRIMARY KEY,
	content TEXT NOT NULL,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	car_id BIGINT NOT NULL REFERENCES cars(id) ON DELETE CASCADE,
	author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS comments_car_idx ON comments (car_id);
";

/// Shared handle to the single Postgres connection.
#[derive(Clone)]
pub struct DbClient(pub Arc<Client>);

impl Deref for DbClient {
	type Target = Client;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl DbClient {
	pub async fn connect(config: &DbConfig) -> Result<Self, tokio_postgres::Error> {
		let (client, monitor) = tokio_postgres::connect(&config.connection_string(), NoTls).await?;

		tokio::spawn(async move {
			if let Err(e) = monitor.await {
				error!("Connection error: {}", e);
			}
		});

		info!("connected to postgres at {} as {}", config.host, config.user);
		Ok(DbClient(Arc::new(client)))
	}

	pub async fn migrate(&self) -> Result<(), tokio_postgres::Error> {
		self.batch_execute(SCHEMA).await
	}
}
