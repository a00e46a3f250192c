use std::{collections::HashMap, fmt::Write};

use axum::response::Html;

use crate::{
	cars::{Car, Comment},
	users::User,
	validation::{FieldErrors, NON_FIELD},
};

/// Submitted or initial values of a form, by field name.
pub type FormValues = HashMap<String, String>;

pub fn escape(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	for c in raw.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#x27;"),
			_ => out.push(c),
		}
	}
	out
}

pub fn layout(title: &str, user: Option<&User>, body: &str) -> Html<String> {
	let account = match user {
		Some(user) => {
			let admin = if user.is_admin {
				r#"<a href="/admin/cars/">Admin</a> "#
			} else {
				""
			};
			format!(
				r#"{admin}<span>Signed in as {name}</span>
<form method="post" action="/accounts/logout/" class="inline"><button type="submit">Log out</button></form>"#,
				name = escape(&user.username),
			)
		}
		None => r#"<a href="/accounts/login/">Log in</a> <a href="/accounts/register/">Register</a>"#.to_owned(),
	};
	Html(format!(
		r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Cars</title>
</head>
<body>
<header><nav><a href="/cars/">Cars</a> <a href="/cars/create/">Add a car</a> {account}</nav></header>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
		title = escape(title),
	))
}

fn errors_for(errors: &FieldErrors, field: &str) -> String {
	let messages = errors.get(field);
	if messages.is_empty() {
		return String::new();
	}
	let mut out = String::from(r#"<ul class="errorlist">"#);
	for message in messages {
		let _ = write!(out, "<li>{}</li>", escape(message));
	}
	out.push_str("</ul>");
	out
}

fn input(label: &str, name: &str, kind: &str, values: &FormValues, errors: &FieldErrors) -> String {
	let value = if kind == "password" {
		String::new()
	} else {
		values.get(name).map(|v| escape(v)).unwrap_or_default()
	};
	format!(
		r#"<p>{errors}<label for="id_{name}">{label}</label> <input type="{kind}" name="{name}" id="id_{name}" value="{value}" required></p>
"#,
		errors = errors_for(errors, name),
	)
}

fn textarea(label: &str, name: &str, values: &FormValues, errors: &FieldErrors) -> String {
	let value = values.get(name).map(|v| escape(v)).unwrap_or_default();
	format!(
		r#"<p>{errors}<label for="id_{name}">{label}</label> <textarea name="{name}" id="id_{name}" rows="5" required>{value}</textarea></p>
"#,
		errors = errors_for(errors, name),
	)
}

fn car_fields(values: &FormValues, errors: &FieldErrors) -> String {
	let mut out = errors_for(errors, NON_FIELD);
	out.push_str(&input("Make", "make", "text", values, errors));
	out.push_str(&input("Model", "model", "text", values, errors));
	out.push_str(&input("Year", "year", "number", values, errors));
	out.push_str(&textarea("Description", "description", values, errors));
	out
}

pub fn car_values(car: &Car) -> FormValues {
	FormValues::from([
		("make".to_owned(), car.make.clone()),
		("model".to_owned(), car.model.clone()),
		("year".to_owned(), car.year.to_string()),
		("description".to_owned(), car.description.clone()),
	])
}

pub fn car_list(user: Option<&User>, cars: &[Car]) -> Html<String> {
	let mut body = String::new();
	if cars.is_empty() {
		body.push_str("<p>No cars yet.</p>\n");
	} else {
		body.push_str("<ul class=\"cars\">\n");
		for car in cars {
			let _ = writeln!(
				body,
				r#"<li><a href="/cars/{id}/">{name}</a> <small>owned by {owner}</small></li>"#,
				id = car.id,
				name = escape(&car.to_string()),
				owner = escape(&car.owner_name),
			);
		}
		body.push_str("</ul>\n");
	}
	layout("Cars", user, &body)
}

pub fn car_create(user: Option<&User>, values: &FormValues, errors: &FieldErrors) -> Html<String> {
	let body = format!(
		r#"<form method="post" action="/cars/create/">
{fields}<button type="submit">Save</button>
</form>
"#,
		fields = car_fields(values, errors),
	);
	layout("Add a car", user, &body)
}

pub fn car_update(user: Option<&User>, car: &Car, values: &FormValues, errors: &FieldErrors) -> Html<String> {
	let body = format!(
		r#"<form method="post" action="/cars/{id}/edit/">
{fields}<button type="submit">Save</button> <a href="/cars/{id}/">Cancel</a>
</form>
"#,
		id = car.id,
		fields = car_fields(values, errors),
	);
	layout(&format!("Edit {}", car), user, &body)
}

pub fn car_delete(user: Option<&User>, car: &Car) -> Html<String> {
	let body = format!(
		r#"<form method="post" action="/cars/{id}/delete/">
<p>Are you sure you want to delete "{name}"? Its comments will be deleted too.</p>
<button type="submit">Yes, delete</button> <a href="/cars/{id}/">Cancel</a>
</form>
"#,
		id = car.id,
		name = escape(&car.to_string()),
	);
	layout("Delete car", user, &body)
}

/// Detail page with the comment thread and the comment form.
pub struct CarDetail<'a> {
	pub user: Option<&'a User>,
	pub car: &'a Car,
	pub comments: &'a [Comment],
	pub values: &'a FormValues,
	pub errors: &'a FieldErrors,
	pub error_message: Option<&'a str>,
}

impl CarDetail<'_> {
	pub fn render(&self) -> Html<String> {
		let car = self.car;
		let mut body = format!(
			r#"<dl>
<dt>Make</dt><dd>{make}</dd>
<dt>Model</dt><dd>{model}</dd>
<dt>Year</dt><dd>{year}</dd>
<dt>Owner</dt><dd>{owner}</dd>
<dt>Added</dt><dd>{created}</dd>
<dt>Updated</dt><dd>{updated}</dd>
</dl>
<p class="description">{description}</p>
"#,
			make = escape(&car.make),
			model = escape(&car.model),
			year = car.year,
			owner = escape(&car.owner_name),
			created = car.created_at.format("%Y-%m-%d %H:%M"),
			updated = car.updated_at.format("%Y-%m-%d %H:%M"),
			description = escape(&car.description),
		);

		if self.user.is_some_and(|u| u.id == car.owner) {
			let _ = writeln!(
				body,
				r#"<p><a href="/cars/{id}/edit/">Edit</a> <a href="/cars/{id}/delete/">Delete</a></p>"#,
				id = car.id
			);
		}

		body.push_str("<h2>Comments</h2>\n");
		if self.comments.is_empty() {
			body.push_str("<p>No comments yet.</p>\n");
		}
		for comment in self.comments {
			let _ = writeln!(
				body,
				r#"<article class="comment"><header>{heading}</header><p>{content}</p></article>"#,
				heading = escape(&comment.to_string()),
				content = escape(&comment.content),
			);
		}

		if let Some(message) = self.error_message {
			let _ = writeln!(body, r#"<p class="error">{}</p>"#, escape(message));
		}
		let _ = write!(
			body,
			r#"<form method="post" action="/cars/{id}/">
{content}<button type="submit">Comment</button>
</form>
"#,
			id = car.id,
			content = textarea("Comment", "content", self.values, self.errors),
		);

		layout(&car.to_string(), self.user, &body)
	}
}

pub fn register(values: &FormValues, errors: &FieldErrors) -> Html<String> {
	let body = format!(
		r#"<form method="post" action="/accounts/register/">
{non_field}{username}{password1}{password2}<button type="submit">Register</button>
</form>
"#,
		non_field = errors_for(errors, NON_FIELD),
		username = input("Username", "username", "text", values, errors),
		password1 = input("Password", "password1", "password", values, errors),
		password2 = input("Password confirmation", "password2", "password", values, errors),
	);
	layout("Register", None, &body)
}

pub fn login(values: &FormValues, error: Option<&str>, next: Option<&str>) -> Html<String> {
	let no_errors = FieldErrors::new();
	let error = error.map(|e| format!("<p class=\"error\">{}</p>\n", escape(e))).unwrap_or_default();
	let next = next
		.map(|n| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(n)))
		.unwrap_or_default();
	let body = format!(
		r#"{error}<form method="post" action="/accounts/login/">
{username}{password}{next}<button type="submit">Log in</button>
</form>
<p>No account? <a href="/accounts/register/">Register</a></p>
"#,
		username = input("Username", "username", "text", values, &no_errors),
		password = input("Password", "password", "password", values, &no_errors),
	);
	layout("Log in", None, &body)
}

fn filter_form(action: &str, fields: &[(&str, &str)], params: &HashMap<String, String>) -> String {
	let mut out = format!(r#"<form method="get" action="{}" class="filters">"#, action);
	for (name, label) in fields {
		let value = params.get(*name).map(|v| escape(v)).unwrap_or_default();
		let _ = write!(out, r#"<label>{label} <input type="text" name="{name}" value="{value}"></label> "#);
	}
	out.push_str("<button type=\"submit\">Filter</button></form>\n");
	out
}

pub fn admin_cars(user: &User, cars: &[Car], params: &HashMap<String, String>, errors: &FieldErrors) -> Html<String> {
	let mut body = String::from(r#"<p><a href="/admin/comments/">Comments</a></p>"#);
	body.push_str(&filter_form(
		"/admin/cars/",
		&[("owner", "Owner id"), ("make", "Make"), ("model", "Model"), ("year", "Year"), ("search", "Search")],
		params,
	));
	for field in errors.fields() {
		body.push_str(&errors_for(errors, field));
	}
	body.push_str(
		"<table>\n<tr><th>Owner</th><th>Make</th><th>Model</th><th>Year</th><th>Description</th><th>Updated</th><th>Created</th><th></th></tr>\n",
	);
	for car in cars {
		let _ = writeln!(
			body,
			r#"<tr><td>{owner}</td><td>{make}</td><td>{model}</td><td>{year}</td><td>{description}</td><td>{updated}</td><td>{created}</td><td><form method="post" action="/admin/cars/{id}/delete/"><button type="submit">Delete</button></form></td></tr>"#,
			owner = escape(&car.owner_name),
			make = escape(&car.make),
			model = escape(&car.model),
			year = car.year,
			description = escape(&car.description),
			updated = car.updated_at.format("%Y-%m-%d %H:%M"),
			created = car.created_at.format("%Y-%m-%d %H:%M"),
			id = car.id,
		);
	}
	body.push_str("</table>\n");
	layout("Cars administration", Some(user), &body)
}

pub fn admin_comments(
	user: &User,
	comments: &[Comment],
	params: &HashMap<String, String>,
	errors: &FieldErrors,
) -> Html<String> {
	let mut body = String::from(r#"<p><a href="/admin/cars/">Cars</a></p>"#);
	body.push_str(&filter_form(
		"/admin/comments/",
		&[("car", "Car id"), ("author", "Author id"), ("search", "Search")],
		params,
	));
	for field in errors.fields() {
		body.push_str(&errors_for(errors, field));
	}
	body.push_str("<table>\n<tr><th>Author</th><th>Content</th><th>Car</th><th>Created</th><th></th></tr>\n");
	for comment in comments {
		let _ = writeln!(
			body,
			r#"<tr><td>{author}</td><td>{content}</td><td><a href="/cars/{car}/">{car}</a></td><td>{created}</td><td><form method="post" action="/admin/comments/{id}/delete/"><button type="submit">Delete</button></form></td></tr>"#,
			author = escape(&comment.author_name),
			content = escape(&comment.content),
			car = comment.car,
			created = comment.created_at.format("%Y-%m-%d %H:%M"),
			id = comment.id,
		);
	}
	body.push_str("</table>\n");
	layout("Comments administration", Some(user), &body)
}

pub fn error_page(status: u16, message: &str) -> Html<String> {
	layout(&status.to_string(), None, &format!("<p>{}</p>\n", escape(message)))
}
