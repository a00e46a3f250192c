use std::collections::HashMap;

use crate::{
	cars::{Car, Comment},
	validation::{FieldErrors, NOT_AN_INTEGER},
};

/// Typos tolerated when a search term is compared to a make or a model.
pub const MAX_TYPOS: usize = 2;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CarFilter {
	pub owner: Option<i64>,
	pub make: Option<String>,
	pub model: Option<String>,
	pub year: Option<i32>,
	pub search: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommentFilter {
	pub car: Option<i64>,
	pub author: Option<i64>,
	pub search: Option<String>,
}

impl CarFilter {
	/// Builds a filter from query parameters. Empty values are ignored.
	pub fn from_params(params: &HashMap<String, String>) -> Result<Self, FieldErrors> {
		let mut errors = FieldErrors::new();
		let filter = CarFilter {
			owner: number(params, "owner", &mut errors),
			make: word(params, "make"),
			model: word(params, "model"),
			year: number(params, "year", &mut errors),
			search: word(params, "search"),
		};
		errors.finish(filter)
	}

	pub fn matches(&self, car: &Car) -> bool {
		self.owner.map_or(true, |owner| car.owner == owner)
			&& self.year.map_or(true, |year| car.year == year)
			&& self.make.as_deref().map_or(true, |make| same_text(&car.make, make))
			&& self.model.as_deref().map_or(true, |model| same_text(&car.model, model))
			&& self.matches_search(car)
	}

	/// The free-text part: a description substring, or make/model within a few typos.
	pub fn matches_search(&self, car: &Car) -> bool {
		let Some(term) = self.search.as_deref() else {
			return true;
		};
		let term = term.to_lowercase();
		car.description.to_lowercase().contains(&term) || is_close(&term, &car.make) || is_close(&term, &car.model)
	}
}

impl CommentFilter {
	pub fn for_car(car: i64) -> Self {
		CommentFilter {
			car: Some(car),
			..Default::default()
		}
	}

	pub fn from_params(params: &HashMap<String, String>) -> Result<Self, FieldErrors> {
		let mut errors = FieldErrors::new();
		let filter = CommentFilter {
			car: number(params, "car", &mut errors),
			author: number(params, "author", &mut errors),
			search: word(params, "search"),
		};
		errors.finish(filter)
	}

	pub fn matches(&self, comment: &Comment) -> bool {
		self.car.map_or(true, |car| comment.car == car)
			&& self.author.map_or(true, |author| comment.author == author)
			&& self.matches_search(comment)
	}

	pub fn matches_search(&self, comment: &Comment) -> bool {
		self.search
			.as_deref()
			.map_or(true, |term| comment.content.to_lowercase().contains(&term.to_lowercase()))
	}
}

// Unicode-aware, as `lower()` is on the Postgres side.
fn same_text(a: &str, b: &str) -> bool {
	a.to_lowercase() == b.to_lowercase()
}

// Very short terms are within two edits of almost anything.
fn is_close(term: &str, value: &str) -> bool {
	term.chars().count() > MAX_TYPOS && levenshtein::levenshtein(term, &value.to_lowercase()) <= MAX_TYPOS
}

fn word(params: &HashMap<String, String>, key: &str) -> Option<String> {
	params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_owned)
}

fn number<T: std::str::FromStr>(params: &HashMap<String, String>, key: &str, errors: &mut FieldErrors) -> Option<T> {
	let raw = word(params, key)?;
	match raw.parse() {
		Ok(value) => Some(value),
		Err(_) => {
			errors.add(key, NOT_AN_INTEGER);
			None
		}
	}
}
