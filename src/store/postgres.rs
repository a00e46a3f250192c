use async_trait::async_trait;
use postgres_from_row::FromRow;
use tokio_postgres::error::SqlState;

use super::{Store, StoreError, StoreResult};
use crate::{
	cars::{Car, CarChanges, Comment, NewCar},
	db_client::DbClient,
	search::{CarFilter, CommentFilter},
	users::User,
};

const USER_COLUMNS: &str = "id, username, password_hash, is_admin, created_at";

const CAR_SELECT: &str = "SELECT c.id, c.make, c.model, c.year, c.description, c.created_at, c.updated_at, \
	c.owner_id AS owner, u.username AS owner_name";

const COMMENT_SELECT: &str =
	"SELECT m.id, m.content, m.created_at, m.car_id AS car, m.author_id AS author, u.username AS author_name";

pub struct PgStore {
	db: DbClient,
}

impl PgStore {
	pub fn new(db: DbClient) -> Self {
		Self { db }
	}
}

#[async_trait]
impl Store for PgStore {
	async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
		let statement =
			format!("INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING {}", USER_COLUMNS);
		match self.db.query_one(&statement, &[&username, &password_hash]).await {
			Ok(row) => Ok(User::try_from_row(&row)?),
			Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => Err(StoreError::UsernameTaken(username.to_owned())),
			Err(e) => Err(e.into()),
		}
	}

	async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
		let statement = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
		let row = self.db.query_opt(&statement, &[&id]).await?;
		Ok(row.map(|r| User::try_from_row(&r)).transpose()?)
	}

	async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
		let statement = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
		let row = self.db.query_opt(&statement, &[&username]).await?;
		Ok(row.map(|r| User::try_from_row(&r)).transpose()?)
	}

	async fn promote_admins(&self, usernames: &[String]) -> StoreResult<u64> {
		Ok(self
			.db
			.execute("UPDATE users SET is_admin = TRUE WHERE username = ANY($1)", &[&usernames])
			.await?)
	}

	async fn list_cars(&self, filter: &CarFilter) -> StoreResult<Vec<Car>> {
		let statement = format!(
			"{} FROM cars c JOIN users u ON u.id = c.owner_id \
			WHERE ($1::BIGINT IS NULL OR c.owner_id = $1) \
			AND ($2::INTEGER IS NULL OR c.year = $2) \
			AND ($3::TEXT IS NULL OR lower(c.make) = lower($3)) \
			AND ($4::TEXT IS NULL OR lower(c.model) = lower($4)) \
			ORDER BY c.id",
			CAR_SELECT
		);
		let rows = self
			.db
			.query(&statement, &[&filter.owner, &filter.year, &filter.make, &filter.model])
			.await?;
		let mut cars = Vec::with_capacity(rows.len());
		for row in &rows {
			let car = Car::try_from_row(row)?;
			// typo-tolerant search runs here, not in SQL
			if filter.matches_search(&car) {
				cars.push(car);
			}
		}
		Ok(cars)
	}

	async fn get_car(&self, id: i64) -> StoreResult<Option<Car>> {
		let statement = format!("{} FROM cars c JOIN users u ON u.id = c.owner_id WHERE c.id = $1", CAR_SELECT);
		let row = self.db.query_opt(&statement, &[&id]).await?;
		Ok(row.map(|r| Car::try_from_row(&r)).transpose()?)
	}

	async fn create_car(&self, owner: i64, car: NewCar) -> StoreResult<Car> {
		let statement = format!(
			"WITH c AS (INSERT INTO cars (make, model, year, description, owner_id) \
			VALUES ($1, $2, $3, $4, $5) RETURNING *) \
			{} FROM c JOIN users u ON u.id = c.owner_id",
			CAR_SELECT
		);
		let row = self
			.db
			.query_one(&statement, &[&car.make, &car.model, &car.year, &car.description, &owner])
			.await?;
		Ok(Car::try_from_row(&row)?)
	}

	async fn update_car(&self, id: i64, changes: CarChanges) -> StoreResult<Option<Car>> {
		let statement = format!(
			"WITH c AS (UPDATE cars SET \
			make = COALESCE($2, make), \
			model = COALESCE($3, model), \
			year = COALESCE($4, year), \
			description = COALESCE($5, description), \
			updated_at = now() \
			WHERE id = $1 RETURNING *) \
			{} FROM c JOIN users u ON u.id = c.owner_id",
			CAR_SELECT
		);
		let row = self
			.db
			.query_opt(&statement, &[&id, &changes.make, &changes.model, &changes.year, &changes.description])
			.await?;
		Ok(row.map(|r| Car::try_from_row(&r)).transpose()?)
	}

	async fn delete_car(&self, id: i64) -> StoreResult<bool> {
		let deleted = self.db.execute("DELETE FROM cars WHERE id = $1", &[&id]).await?;
		Ok(deleted > 0)
	}

	async fn list_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>> {
		let statement = format!(
			"{} FROM comments m JOIN users u ON u.id = m.author_id \
			WHERE ($1::BIGINT IS NULL OR m.car_id = $1) \
			AND ($2::BIGINT IS NULL OR m.author_id = $2) \
			AND ($3::TEXT IS NULL OR strpos(lower(m.content), lower($3)) > 0) \
			ORDER BY m.id",
			COMMENT_SELECT
		);
		let rows = self
			.db
			.query(&statement, &[&filter.car, &filter.author, &filter.search])
			.await?;
		Ok(rows.iter().map(Comment::try_from_row).collect::<Result<_, _>>()?)
	}

	async fn create_comment(&self, car: i64, author: i64, content: String) -> StoreResult<Option<Comment>> {
		let statement = format!(
			"WITH m AS (INSERT INTO comments (content, car_id, author_id) \
			SELECT $1::TEXT, id, $3::BIGINT FROM cars WHERE id = $2 RETURNING *) \
			{} FROM m JOIN users u ON u.id = m.author_id",
			COMMENT_SELECT
		);
		let row = self.db.query_opt(&statement, &[&content, &car, &author]).await?;
		Ok(row.map(|r| Comment::try_from_row(&r)).transpose()?)
	}

	async fn delete_comment(&self, id: i64) -> StoreResult<bool> {
		let deleted = self.db.execute("DELETE FROM comments WHERE id = $1", &[&id]).await?;
		Ok(deleted > 0)
	}
}
