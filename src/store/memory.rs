use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Store, StoreError, StoreResult};
use crate::{
	cars::{Car, CarChanges, Comment, NewCar},
	search::{CarFilter, CommentFilter},
	users::User,
};

/// Process-local store. Same semantics as the Postgres one, nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
	inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
	users: BTreeMap<i64, User>,
	cars: BTreeMap<i64, Car>,
	comments: BTreeMap<i64, Comment>,
	last_id: i64,
}

impl Tables {
	fn next_id(&mut self) -> i64 {
		self.last_id += 1;
		self.last_id
	}
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
		let mut tables = self.inner.write().await;
		if tables.users.values().any(|u| u.username == username) {
			return Err(StoreError::UsernameTaken(username.to_owned()));
		}
		let user = User {
			id: tables.next_id(),
			username: username.to_owned(),
			password_hash: password_hash.to_owned(),
			is_admin: false,
			created_at: Utc::now(),
		};
		tables.users.insert(user.id, user.clone());
		Ok(user)
	}

	async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
		Ok(self.inner.read().await.users.get(&id).cloned())
	}

	async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
		Ok(self.inner.read().await.users.values().find(|u| u.username == username).cloned())
	}

	async fn promote_admins(&self, usernames: &[String]) -> StoreResult<u64> {
		let mut tables = self.inner.write().await;
		let mut promoted = 0;
		for user in tables.users.values_mut().filter(|u| usernames.contains(&u.username)) {
			user.is_admin = true;
			promoted += 1;
		}
		Ok(promoted)
	}

	async fn list_cars(&self, filter: &CarFilter) -> StoreResult<Vec<Car>> {
		let tables = self.inner.read().await;
		Ok(tables.cars.values().filter(|car| filter.matches(car)).cloned().collect())
	}

	async fn get_car(&self, id: i64) -> StoreResult<Option<Car>> {
		Ok(self.inner.read().await.cars.get(&id).cloned())
	}

	async fn create_car(&self, owner: i64, car: NewCar) -> StoreResult<Car> {
		let mut tables = self.inner.write().await;
		let owner_name = tables.users.get(&owner).map(|u| u.username.clone()).unwrap_or_default();
		let now = Utc::now();
		let car = Car {
			id: tables.next_id(),
			make: car.make,
			model: car.model,
			year: car.year,
			description: car.description,
			created_at: now,
			updated_at: now,
			owner,
			owner_name,
		};
		tables.cars.insert(car.id, car.clone());
		Ok(car)
	}

	async fn update_car(&self, id: i64, changes: CarChanges) -> StoreResult<Option<Car>> {
		let mut tables = self.inner.write().await;
		let Some(car) = tables.cars.get_mut(&id) else {
			return Ok(None);
		};
		changes.apply(car);
		car.updated_at = Utc::now();
		Ok(Some(car.clone()))
	}

	async fn delete_car(&self, id: i64) -> StoreResult<bool> {
		let mut tables = self.inner.write().await;
		if tables.cars.remove(&id).is_none() {
			return Ok(false);
		}
		tables.comments.retain(|_, comment| comment.car != id);
		Ok(true)
	}

	async fn list_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>> {
		let tables = self.inner.read().await;
		Ok(tables.comments.values().filter(|c| filter.matches(c)).cloned().collect())
	}

	async fn create_comment(&self, car: i64, author: i64, content: String) -> StoreResult<Option<Comment>> {
		let mut tables = self.inner.write().await;
		if !tables.cars.contains_key(&car) {
			return Ok(None);
		}
		let author_name = tables.users.get(&author).map(|u| u.username.clone()).unwrap_or_default();
		let comment = Comment {
			id: tables.next_id(),
			content,
			created_at: Utc::now(),
			car,
			author,
			author_name,
		};
		tables.comments.insert(comment.id, comment.clone());
		Ok(Some(comment))
	}

	async fn delete_comment(&self, id: i64) -> StoreResult<bool> {
		Ok(self.inner.write().await.comments.remove(&id).is_some())
	}
}
