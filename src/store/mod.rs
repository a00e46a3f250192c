use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
	cars::{Car, CarChanges, Comment, NewCar},
	search::{CarFilter, CommentFilter},
	users::User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
	#[error("username `{0}` is already taken")]
	UsernameTaken(String),

	#[error("database error: {0}")]
	Postgres(#[from] tokio_postgres::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for users, cars and comments.
///
/// Lists come back ordered by id. Deleting a car removes its comments.
#[async_trait]
pub trait Store: Send + Sync {
	async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User>;
	async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>>;
	async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
	/// Returns how many accounts were promoted.
	async fn promote_admins(&self, usernames: &[String]) -> StoreResult<u64>;

	async fn list_cars(&self, filter: &CarFilter) -> StoreResult<Vec<Car>>;
	async fn get_car(&self, id: i64) -> StoreResult<Option<Car>>;
	async fn create_car(&self, owner: i64, car: NewCar) -> StoreResult<Car>;
	/// Refreshes `updated_at`. `None` when the car does not exist.
	async fn update_car(&self, id: i64, changes: CarChanges) -> StoreResult<Option<Car>>;
	async fn delete_car(&self, id: i64) -> StoreResult<bool>;

	async fn list_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>>;
	/// `None` when the car does not exist.
	async fn create_comment(&self, car: i64, author: i64, content: String) -> StoreResult<Option<Comment>>;
	async fn delete_comment(&self, id: i64) -> StoreResult<bool>;
}

pub type DynStore = Arc<dyn Store>;
