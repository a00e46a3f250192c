use std::sync::Arc;

use log::info;

use crate::{
	auth::Keys,
	config::{Config, StorageKind},
	db_client::DbClient,
	store::{DynStore, MemoryStore, PgStore},
};

#[derive(Clone)]
pub struct AppState {
	pub store: DynStore,
	pub keys: Keys,
	pub config: Arc<Config>,
}

impl AppState {
	pub fn new(config: Config, store: DynStore) -> Self {
		Self {
			keys: Keys::new(&config.jwt_secret, config.token_ttl_hours),
			store,
			config: Arc::new(config),
		}
	}

	/// Opens the configured storage and applies admin promotions.
	pub async fn init(config: Config) -> anyhow::Result<Self> {
		let store: DynStore = match config.storage {
			StorageKind::Postgres => {
				let db = DbClient::connect(&config.db).await?;
				db.migrate().await?;
				Arc::new(PgStore::new(db))
			}
			StorageKind::Memory => {
				info!("using in-memory storage, data is lost on shutdown");
				Arc::new(MemoryStore::new())
			}
		};
		if !config.admin_users.is_empty() {
			let promoted = store.promote_admins(&config.admin_users).await?;
			info!("{} of {} configured admin accounts promoted", promoted, config.admin_users.len());
		}
		Ok(Self::new(config, store))
	}
}
