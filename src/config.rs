use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use anyhow::{anyhow, bail, Context};
use log::{info, warn};

use crate::encryption_engine::DEFAULT_ITERATIONS;

/// Longest accepted token lifetime, ten years.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
	Postgres,
	Memory,
}

impl FromStr for StorageKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"postgres" | "pg" => Ok(StorageKind::Postgres),
			"memory" | "mem" => Ok(StorageKind::Memory),
			other => Err(format!("unknown storage `{}`, expected `postgres` or `memory`", other)),
		}
	}
}

#[derive(Debug, Clone)]
pub struct DbConfig {
	pub host: String,
	pub user: String,
	pub password: String,
	pub dbname: String,
}

impl DbConfig {
	pub fn connection_string(&self) -> String {
		format!("host={} user={} password={} dbname={}", self.host, self.user, self.password, self.dbname)
	}
}

#[derive(Debug, Clone)]
pub struct Config {
	pub port: u16,
	pub storage: StorageKind,
	pub db: DbConfig,
	pub jwt_secret: String,
	pub token_ttl_hours: i64,
	pub admin_users: Vec<String>,
	/// PBKDF2 rounds for newly hashed passwords.
	pub password_iterations: u32,
	/// Marks the session cookie `Secure`; turn off only for plain-http development.
	pub secure_cookies: bool,
}

impl Config {
	pub fn load() -> anyhow::Result<Self> {
		Ok(Self {
			port: try_load("CARS_PORT", "4000")?,
			storage: try_load("CARS_STORAGE", "postgres")?,
			db: DbConfig {
				host: try_load("DB_HOST", "localhost")?,
				user: try_load("DB_USER", "cars")?,
				password: try_load("DB_PASSWORD", "cars")?,
				dbname: try_load("DB_NAME", "cars")?,
			},
			jwt_secret: read_secret("CARS_JWT_SECRET")?,
			token_ttl_hours: token_ttl(try_load("CARS_TOKEN_TTL_HOURS", "24")?)?,
			admin_users: split_list(&try_load::<String>("CARS_ADMIN_USERS", "")?),
			password_iterations: iterations(try_load("CARS_PASSWORD_ITERATIONS", &DEFAULT_ITERATIONS.to_string())?)?,
			secure_cookies: try_load("CARS_SECURE_COOKIES", "true")?,
		})
	}

	/// Settings for running without a database, mostly for tests.
	pub fn in_memory(jwt_secret: &str) -> Self {
		Self {
			port: 0,
			storage: StorageKind::Memory,
			db: DbConfig {
				host: String::new(),
				user: String::new(),
				password: String::new(),
				dbname: String::new(),
			},
			jwt_secret: jwt_secret.to_owned(),
			token_ttl_hours: 24,
			admin_users: Vec::new(),
			password_iterations: 1_000,
			secure_cookies: false,
		}
	}
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
	T::Err: Display,
{
	let raw = env::var(key).unwrap_or_else(|_| {
		info!("{key} not set, using default: {default}");
		default.to_string()
	});
	raw.parse().map_err(|e| {
		warn!("Invalid {key} value: {e}");
		anyhow!("environment misconfigured: {key}: {e}")
	})
}

fn read_secret(secret_name: &str) -> anyhow::Result<String> {
	if let Ok(value) = env::var(secret_name) {
		return Ok(value);
	}
	let path = format!("/run/secrets/{secret_name}");
	read_to_string(&path)
		.map(|s| s.trim().to_string())
		.map_err(|e| {
			warn!("Failed to read {secret_name} from file: {e}");
			e
		})
		.with_context(|| format!("secret {secret_name} is neither in the environment nor in {path}"))
}

fn token_ttl(hours: i64) -> anyhow::Result<i64> {
	if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
		bail!("CARS_TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {hours}");
	}
	Ok(hours)
}

fn iterations(rounds: u32) -> anyhow::Result<u32> {
	if rounds == 0 {
		bail!("CARS_PASSWORD_ITERATIONS must be positive");
	}
	Ok(rounds)
}

fn split_list(raw: &str) -> Vec<String> {
	raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned).collect()
}
