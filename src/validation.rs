use std::{collections::BTreeMap, collections::HashMap, fmt};

use serde::Serialize;
use serde_json::{Map, Value};

/// Raw input, either a JSON object or a url-encoded form lifted into JSON strings.
pub type Fields = Map<String, Value>;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const NULL: &str = "This field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_AN_INTEGER: &str = "A valid integer is required.";
pub const NON_FIELD: &str = "non_field_errors";

/// Per-field error messages, serialized as `{"field": ["message", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn single(field: &str, message: impl Into<String>) -> Self {
		let mut errors = Self::new();
		errors.add(field, message);
		errors
	}

	pub fn add(&mut self, field: &str, message: impl Into<String>) {
		self.0.entry(field.to_owned()).or_default().push(message.into());
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, field: &str) -> &[String] {
		self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// `Ok(value)` when nothing was recorded.
	pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
		if self.is_empty() {
			Ok(value)
		} else {
			Err(self)
		}
	}
}

impl fmt::Display for FieldErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (field, messages) in &self.0 {
			for message in messages {
				if !first {
					f.write_str("; ")?;
				}
				write!(f, "{}: {}", field, message)?;
				first = false;
			}
		}
		Ok(())
	}
}

impl std::error::Error for FieldErrors {}

pub fn from_form(form: HashMap<String, String>) -> Fields {
	form.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}

/// Reads a text field. Leading and trailing whitespace is dropped.
pub fn text(fields: &Fields, name: &str, max_chars: Option<usize>, required: bool, errors: &mut FieldErrors) -> Option<String> {
	let raw = match fields.get(name) {
		None => {
			if required {
				errors.add(name, REQUIRED);
			}
			return None;
		}
		Some(Value::Null) => {
			errors.add(name, NULL);
			return None;
		}
		Some(Value::String(s)) => s.trim().to_owned(),
		Some(Value::Number(n)) => n.to_string(),
		Some(_) => {
			errors.add(name, NOT_A_STRING);
			return None;
		}
	};
	if raw.is_empty() {
		errors.add(name, BLANK);
		return None;
	}
	if let Some(max) = max_chars {
		if raw.chars().count() > max {
			errors.add(name, format!("Ensure this field has no more than {} characters.", max));
			return None;
		}
	}
	Some(raw)
}

/// Reads a 32-bit integer from a JSON number or a numeric string.
pub fn integer(fields: &Fields, name: &str, required: bool, errors: &mut FieldErrors) -> Option<i32> {
	let wide = match fields.get(name) {
		None => {
			if required {
				errors.add(name, REQUIRED);
			}
			return None;
		}
		Some(Value::Null) => {
			errors.add(name, NULL);
			return None;
		}
		Some(Value::Number(n)) => match n.as_i64() {
			Some(v) => Some(v),
			None => n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e18).map(|f| f as i64),
		},
		Some(Value::String(s)) if s.trim().is_empty() => {
			errors.add(name, REQUIRED);
			return None;
		}
		Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
		Some(_) => None,
	};
	let Some(wide) = wide else {
		errors.add(name, NOT_AN_INTEGER);
		return None;
	};
	match i32::try_from(wide) {
		Ok(v) => Some(v),
		Err(_) if wide > 0 => {
			errors.add(name, format!("Ensure this value is less than or equal to {}.", i32::MAX));
			None
		}
		Err(_) => {
			errors.add(name, format!("Ensure this value is greater than or equal to {}.", i32::MIN));
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn fields(value: Value) -> Fields {
		match value {
			Value::Object(map) => map,
			_ => panic!("test input must be an object"),
		}
	}

	#[test]
	fn text_reports_missing_blank_and_too_long() {
		let input = fields(json!({"blank": "   ", "long": "x".repeat(101), "ok": " Volvo "}));
		let mut errors = FieldErrors::new();

		assert_eq!(text(&input, "missing", Some(100), true, &mut errors), None);
		assert_eq!(text(&input, "blank", Some(100), true, &mut errors), None);
		assert_eq!(text(&input, "long", Some(100), true, &mut errors), None);
		assert_eq!(text(&input, "ok", Some(100), true, &mut errors), Some("Volvo".to_string()));

		assert_eq!(errors.get("missing"), [REQUIRED.to_string()]);
		assert_eq!(errors.get("blank"), [BLANK.to_string()]);
		assert_eq!(errors.get("long"), ["Ensure this field has no more than 100 characters.".to_string()]);
		assert!(errors.get("ok").is_empty());
	}

	#[test]
	fn optional_text_may_be_absent() {
		let mut errors = FieldErrors::new();
		assert_eq!(text(&Fields::new(), "make", None, false, &mut errors), None);
		assert!(errors.is_empty());
	}

	#[test]
	fn integer_accepts_numbers_and_numeric_strings() {
		let input = fields(json!({"a": 1999, "b": "2005", "c": 2010.0, "d": "abc", "e": true, "f": 3_000_000_000u64}));
		let mut errors = FieldErrors::new();

		assert_eq!(integer(&input, "a", true, &mut errors), Some(1999));
		assert_eq!(integer(&input, "b", true, &mut errors), Some(2005));
		assert_eq!(integer(&input, "c", true, &mut errors), Some(2010));
		assert_eq!(integer(&input, "d", true, &mut errors), None);
		assert_eq!(integer(&input, "e", true, &mut errors), None);
		assert_eq!(integer(&input, "f", true, &mut errors), None);

		assert_eq!(errors.get("d"), [NOT_AN_INTEGER.to_string()]);
		assert_eq!(errors.get("e"), [NOT_AN_INTEGER.to_string()]);
		assert_eq!(errors.get("f"), ["Ensure this value is less than or equal to 2147483647.".to_string()]);
	}

	#[test]
	fn errors_serialize_as_field_map() {
		let mut errors = FieldErrors::single("year", NOT_AN_INTEGER);
		errors.add("make", REQUIRED);
		assert_eq!(
			serde_json::to_value(&errors).unwrap(),
			json!({"make": [REQUIRED], "year": [NOT_AN_INTEGER]})
		);
		assert_eq!(errors.to_string(), format!("make: {}; year: {}", REQUIRED, NOT_AN_INTEGER));
	}

	#[test]
	fn form_values_become_strings() {
		let mut form = HashMap::new();
		form.insert("year".to_string(), "1984".to_string());
		let input = from_form(form);
		assert_eq!(input.get("year"), Some(&json!("1984")));
	}
}
