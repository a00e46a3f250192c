use base64::{
	alphabet,
	engine::{self, general_purpose},
	Engine,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

pub const CUSTOM_ENGINE: engine::GeneralPurpose = engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);

const SCHEME: &str = "pbkdf2_sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Rounds used unless `CARS_PASSWORD_ITERATIONS` says otherwise.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// PBKDF2-HMAC-SHA256, stored as `pbkdf2_sha256$<iterations>$<salt>$<key>`.
pub fn hash_password(password: &str, iterations: u32) -> String {
	let mut salt = [0u8; SALT_LEN];
	rand::thread_rng().fill_bytes(&mut salt);
	let salt = CUSTOM_ENGINE.encode(salt);
	let key = derive(password, &salt, iterations);
	format!("{}${}${}${}", SCHEME, iterations, salt, key)
}

/// Uses the rounds recorded in `stored`, so older hashes keep working after a config change.
pub fn verify_password(password: &str, stored: &str) -> bool {
	let mut parts = stored.splitn(4, '$');
	let (Some(SCHEME), Some(iterations), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next(), parts.next())
	else {
		return false;
	};
	let Ok(iterations) = iterations.parse::<u32>() else {
		return false;
	};
	if iterations == 0 {
		return false;
	}
	constant_time_eq(derive(password, salt, iterations).as_bytes(), expected.as_bytes())
}

fn derive(password: &str, salt: &str, iterations: u32) -> String {
	let mut key = [0u8; KEY_LEN];
	pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
	CUSTOM_ENGINE.encode(key)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
	if a.len() != b.len() {
		return false;
	}
	a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
