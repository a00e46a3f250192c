use axum::{routing::get, routing::post, Json, Router};
use serde_json::{json, Value};

use crate::{
	cars::{cars, comments},
	state::AppState,
	users::users,
};

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/api/", get(api_root))
		.route("/api/token/", post(users::obtain_token))
		.route("/api/cars/", get(cars::list_cars).post(cars::create_car))
		.route(
			"/api/cars/:id/",
			get(cars::retrieve_car)
				.put(cars::update_car)
				.patch(cars::partial_update_car)
				.delete(cars::destroy_car),
		)
		.route(
			"/api/cars/:id/comments/",
			get(comments::list_comments).post(comments::create_comment),
		)
}

async fn api_root() -> Json<Value> {
	Json(json!({ "cars": "/api/cars/" }))
}
