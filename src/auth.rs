use axum::{
	async_trait,
	extract::FromRequestParts,
	http::{
		header::{AUTHORIZATION, COOKIE},
		request::Parts,
		HeaderMap,
	},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState, users::User};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	pub sub: i64,
	pub name: String,
	pub exp: usize,
}

/// Signs and checks the tokens used both as API bearer tokens and as page sessions.
#[derive(Clone)]
pub struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	ttl: Duration,
}

impl Keys {
	pub fn new(secret: &str, ttl_hours: i64) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret.as_bytes()),
			decoding: DecodingKey::from_secret(secret.as_bytes()),
			ttl: Duration::try_hours(ttl_hours).unwrap_or_else(Duration::max_value),
		}
	}

	pub fn ttl_seconds(&self) -> i64 {
		self.ttl.num_seconds()
	}

	pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
		let expires = Utc::now().checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
		let exp = expires.timestamp().max(0) as usize;
		let claims = Claims {
			sub: user.id,
			name: user.username.clone(),
			exp,
		};
		encode(&Header::default(), &claims, &self.encoding)
	}

	pub fn verify(&self, token: &str) -> Option<Claims> {
		match decode::<Claims>(token, &self.decoding, &Validation::default()) {
			Ok(data) => Some(data.claims),
			Err(e) => {
				warn!("rejected token: {}", e);
				None
			}
		}
	}
}

/// The user behind a request; `None` for anonymous visitors.
#[derive(Debug, Clone, Default)]
pub struct Requester(Option<User>);

impl Requester {
	pub fn anonymous() -> Self {
		Requester(None)
	}

	pub fn user(&self) -> Option<&User> {
		self.0.as_ref()
	}

	pub fn is_admin(&self) -> bool {
		self.0.as_ref().is_some_and(|u| u.is_admin)
	}
}

impl From<User> for Requester {
	fn from(user: User) -> Self {
		Requester(Some(user))
	}
}

/// A bad bearer token is an error; a bad session cookie only means "anonymous".
#[async_trait]
impl FromRequestParts<AppState> for Requester {
	type Rejection = AppError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		if let Some(token) = bearer_token(&parts.headers) {
			let claims = state.keys.verify(&token).ok_or(AppError::InvalidToken)?;
			let user = state.store.user_by_id(claims.sub).await?.ok_or(AppError::InvalidToken)?;
			return Ok(Requester::from(user));
		}
		let Some(token) = session_cookie(&parts.headers) else {
			return Ok(Requester::anonymous());
		};
		let Some(claims) = state.keys.verify(&token) else {
			return Ok(Requester::anonymous());
		};
		Ok(Requester(state.store.user_by_id(claims.sub).await?))
	}
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
	let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
	let (scheme, token) = value.split_once(' ')?;
	if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
		Some(token.trim().to_owned())
	} else {
		None
	}
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(name, _)| *name == SESSION_COOKIE)
		.map(|(_, token)| token.to_owned())
		.filter(|token| !token.is_empty())
}

pub fn session_set_cookie(token: &str, max_age: i64, secure: bool) -> String {
	format!("{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}", SESSION_COOKIE, token, max_age, secure_flag(secure))
}

pub fn session_clear_cookie(secure: bool) -> String {
	format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}", SESSION_COOKIE, secure_flag(secure))
}

fn secure_flag(secure: bool) -> &'static str {
	if secure {
		"; Secure"
	} else {
		""
	}
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	fn user() -> User {
		User {
			id: 17,
			username: "carla".into(),
			password_hash: String::new(),
			is_admin: false,
			created_at: Utc::now(),
		}
	}

	#[test]
	fn issued_tokens_verify_with_the_same_secret_only() {
		let keys = Keys::new("secret-a", 1);
		let token = keys.issue(&user()).unwrap();
		let claims = keys.verify(&token).unwrap();
		assert_eq!(claims.sub, 17);
		assert_eq!(claims.name, "carla");

		assert!(Keys::new("secret-b", 1).verify(&token).is_none());
		assert!(keys.verify("not-a-token").is_none());
	}

	#[test]
	fn expired_tokens_are_rejected() {
		let keys = Keys::new("secret", -2);
		let token = keys.issue(&user()).unwrap();
		assert!(keys.verify(&token).is_none());
	}

	#[test]
	fn reads_bearer_header() {
		let mut headers = HeaderMap::new();
		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
		assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
		assert_eq!(bearer_token(&headers), None);
	}

	#[test]
	fn reads_session_cookie_among_others() {
		let mut headers = HeaderMap::new();
		headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=tok.en; lang=en"));
		assert_eq!(session_cookie(&headers).as_deref(), Some("tok.en"));

		headers.insert(COOKIE, HeaderValue::from_static("session="));
		assert_eq!(session_cookie(&headers), None);
	}

	#[test]
	fn cookie_headers_carry_the_session_name() {
		assert!(session_set_cookie("t", 60, false).starts_with("session=t; Path=/; HttpOnly"));
		assert!(session_clear_cookie(false).contains("Max-Age=0"));
	}

	#[test]
	fn secure_cookies_say_so() {
		assert!(session_set_cookie("t", 60, true).ends_with("; Secure"));
		assert!(session_clear_cookie(true).ends_with("; Secure"));
		assert!(!session_set_cookie("t", 60, false).contains("Secure"));
	}

	#[test]
	fn huge_lifetimes_do_not_overflow() {
		let keys = Keys::new("secret", i64::MAX);
		let token = keys.issue(&user()).unwrap();
		assert!(!token.is_empty());
		assert!(keys.ttl_seconds() > 0);
	}
}
