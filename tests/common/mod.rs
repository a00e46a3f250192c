#![allow(dead_code)]

use std::sync::Arc;

use axum::{
	body::{to_bytes, Body},
	http::{
		header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
		Method, Request,
	},
	response::Response,
	Router,
};
use cars_server::{
	app,
	config::Config,
	encryption_engine::hash_password,
	state::AppState,
	store::MemoryStore,
	users::User,
};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "long-enough-pass";

pub struct TestApp {
	pub app: Router,
	pub state: AppState,
}

impl TestApp {
	pub fn new() -> Self {
		Self::with_admins(&[])
	}

	pub fn with_admins(admins: &[&str]) -> Self {
		let mut config = Self::config();
		config.admin_users = admins.iter().map(|a| a.to_string()).collect();
		Self::with_config(config)
	}

	pub fn config() -> Config {
		Config::in_memory("integration-secret")
	}

	pub fn with_config(config: Config) -> Self {
		let state = AppState::new(config, Arc::new(MemoryStore::new()));
		Self { app: app(state.clone()), state }
	}

	/// A stored user and a bearer token for it.
	pub async fn user(&self, username: &str) -> (User, String) {
		let user = self.state.store.create_user(username, &hash_password(PASSWORD, self.state.config.password_iterations)).await.unwrap();
		let token = self.state.keys.issue(&user).unwrap();
		(user, token)
	}

	pub async fn send(&self, request: Request<Body>) -> Response {
		self.app.clone().oneshot(request).await.unwrap()
	}

	pub async fn json(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
		let mut builder = Request::builder().method(method).uri(uri);
		if let Some(token) = token {
			builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
		}
		let request = match body {
			Some(body) => builder.header(CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
			None => builder.body(Body::empty()),
		};
		self.send(request.unwrap()).await
	}

	pub async fn page(&self, uri: &str, session: Option<&str>) -> Response {
		let mut builder = Request::builder().method(Method::GET).uri(uri);
		if let Some(token) = session {
			builder = builder.header(COOKIE, format!("session={}", token));
		}
		self.send(builder.body(Body::empty()).unwrap()).await
	}

	pub async fn form(&self, uri: &str, session: Option<&str>, pairs: &[(&str, &str)]) -> Response {
		let body = pairs
			.iter()
			.map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
			.collect::<Vec<_>>()
			.join("&");
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(uri)
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
		if let Some(token) = session {
			builder = builder.header(COOKIE, format!("session={}", token));
		}
		self.send(builder.body(Body::from(body)).unwrap()).await
	}
}

pub async fn body_json(response: Response) -> Value {
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response) -> &str {
	response.headers()[LOCATION].to_str().unwrap()
}

/// The session token a response set, if any.
pub fn session_from(response: &Response) -> Option<String> {
	response
		.headers()
		.get_all(SET_COOKIE)
		.iter()
		.filter_map(|v| v.to_str().ok())
		.find_map(|v| v.strip_prefix("session="))
		.map(|rest| rest.split(';').next().unwrap_or_default().to_owned())
}
