mod common;

use axum::http::{header::SET_COOKIE, StatusCode};
use cars_server::{
	pages::{accounts::BAD_LOGIN, cars::ANONYMOUS_COMMENT, templates::escape},
	search::CarFilter,
	users::users::PASSWORD_MISMATCH,
};
use common::{body_text, location, session_from, TestApp, PASSWORD};

const VOLVO: [(&str, &str); 4] = [
	("make", "Volvo"),
	("model", "240"),
	("year", "1988"),
	("description", "Station wagon"),
];

async fn register(app: &TestApp, username: &str) -> String {
	let response = app
		.form(
			"/accounts/register/",
			None,
			&[("username", username), ("password1", PASSWORD), ("password2", PASSWORD)],
		)
		.await;
	assert_eq!(response.status(), StatusCode::FOUND);
	session_from(&response).unwrap()
}

/// Creates a car through the form and returns its detail path.
async fn create_car(app: &TestApp, session: &str) -> String {
	let response = app.form("/cars/create/", Some(session), &VOLVO).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	location(&response).to_owned()
}

#[tokio::test]
async fn home_redirects_to_the_car_list() {
	let app = TestApp::new();
	let response = app.page("/", None).await;
	assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
	assert_eq!(location(&response), "/cars/");

	let response = app.page("/cars/", None).await;
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login_before_creating() {
	let app = TestApp::new();

	let response = app.page("/cars/create/", None).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), "/accounts/login/?next=%2Fcars%2Fcreate%2F");

	let response = app.form("/cars/create/", None, &VOLVO).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert!(location(&response).starts_with("/accounts/login/"));
	assert!(app.state.store.list_cars(&CarFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn registration_signs_the_user_in() {
	let app = TestApp::new();

	let response = app
		.form(
			"/accounts/register/",
			None,
			&[("username", "ann"), ("password1", PASSWORD), ("password2", "something-else")],
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(session_from(&response).is_none());
	assert!(body_text(response).await.contains(&escape(PASSWORD_MISMATCH)));

	let session = register(&app, "ann").await;
	let response = app.page("/cars/", Some(&session)).await;
	assert!(body_text(response).await.contains("ann"));

	let response = app
		.form(
			"/accounts/register/",
			None,
			&[("username", "ann"), ("password1", PASSWORD), ("password2", PASSWORD)],
		)
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("A user with that username already exists."));
}

#[tokio::test]
async fn created_cars_render_escaped() {
	let app = TestApp::new();
	let session = register(&app, "ann").await;

	let response = app.form("/cars/create/", Some(&session), &[("make", ""), ("model", "240")]).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("This field may not be blank."));

	let response = app
		.form(
			"/cars/create/",
			Some(&session),
			&[("make", "<b>Volvo</b>"), ("model", "240"), ("year", "1988"), ("description", "x")],
		)
		.await;
	assert_eq!(response.status(), StatusCode::FOUND);
	let detail = location(&response).to_owned();
	assert!(detail.starts_with("/cars/"));

	let html = body_text(app.page(&detail, None).await).await;
	assert!(html.contains("&lt;b&gt;Volvo&lt;/b&gt;"));
	assert!(!html.contains("<b>Volvo</b>"));

	let response = app.page("/cars/999/", None).await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_signed_in_users_can_comment() {
	let app = TestApp::new();
	let owner = register(&app, "ann").await;
	let commenter = register(&app, "bob").await;
	let detail = create_car(&app, &owner).await;

	let response = app.form(&detail, None, &[("content", "Nice")]).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains(ANONYMOUS_COMMENT));

	let response = app.form(&detail, Some(&commenter), &[("content", "  ")]).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("This field may not be blank."));

	let response = app.form(&detail, Some(&commenter), &[("content", "Any rust?")]).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), detail);

	let html = body_text(app.page(&detail, None).await).await;
	assert!(html.contains("Any rust?"));
	assert!(html.contains("Comment by bob at "));
}

#[tokio::test]
async fn only_the_owner_can_edit_or_delete() {
	let app = TestApp::new();
	let owner = register(&app, "ann").await;
	let stranger = register(&app, "bob").await;
	let detail = create_car(&app, &owner).await;
	let edit = format!("{}edit/", detail);
	let delete = format!("{}delete/", detail);

	let response = app.page(&edit, Some(&stranger)).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert!(location(&response).starts_with("/accounts/login/?next="));

	let response = app.form(&delete, Some(&stranger), &[]).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(app.page(&detail, None).await.status(), StatusCode::OK);

	let response = app.page(&edit, Some(&owner)).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("value=\"Volvo\""));

	let response = app
		.form(&edit, Some(&owner), &[("make", "Volvo"), ("model", "740"), ("year", "1990"), ("description", "Sedan")])
		.await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), detail);
	assert!(body_text(app.page(&detail, None).await).await.contains("740"));

	let response = app.page(&delete, Some(&owner)).await;
	assert_eq!(response.status(), StatusCode::OK);

	let response = app.form(&delete, Some(&owner), &[]).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), "/cars/");
	assert_eq!(app.page(&detail, None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_returns_to_the_requested_page() {
	let app = TestApp::new();
	register(&app, "ann").await;

	let response = app.page("/accounts/login/?next=/cars/create/", None).await;
	assert_eq!(response.status(), StatusCode::OK);

	let response = app
		.form("/accounts/login/", None, &[("username", "ann"), ("password", "wrong-password")])
		.await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(session_from(&response).is_none());
	assert!(body_text(response).await.contains(&escape(BAD_LOGIN)));

	let response = app
		.form(
			"/accounts/login/",
			None,
			&[("username", "ann"), ("password", PASSWORD), ("next", "/cars/create/")],
		)
		.await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), "/cars/create/");
	let session = session_from(&response).unwrap();
	assert_eq!(app.page("/cars/create/", Some(&session)).await.status(), StatusCode::OK);

	let response = app
		.form(
			"/accounts/login/",
			None,
			&[("username", "ann"), ("password", PASSWORD), ("next", "//evil.example/")],
		)
		.await;
	assert_eq!(location(&response), "/cars/");
	for next in ["/\t/evil.example/", "/\n/evil.example/", "/\r\n/evil.example/"] {
		let response = app
			.form("/accounts/login/", None, &[("username", "ann"), ("password", PASSWORD), ("next", next)])
			.await;
		assert_eq!(response.status(), StatusCode::FOUND);
		assert_eq!(location(&response), "/cars/");
	}
}

#[tokio::test]
async fn logout_clears_the_session() {
	let app = TestApp::new();
	let session = register(&app, "ann").await;

	let response = app.form("/accounts/logout/", Some(&session), &[]).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), "/cars/");
	let cookie = response.headers()[SET_COOKIE].to_str().unwrap();
	assert!(cookie.starts_with("session=;"));
	assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn admin_pages_are_for_admins_only() {
	let app = TestApp::with_admins(&["root"]);
	let admin = register(&app, "root").await;
	let owner = register(&app, "ann").await;
	let commenter = register(&app, "bob").await;
	let detail = create_car(&app, &owner).await;
	app.form(&detail, Some(&commenter), &[("content", "Spam spam")]).await;

	let response = app.page("/admin/cars/", Some(&owner)).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), "/accounts/login/?next=%2Fadmin%2Fcars%2F");

	let response = app.page("/admin/cars/?make=volvo", Some(&admin)).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("240"));

	let response = app.page("/admin/comments/?search=spam", Some(&admin)).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(body_text(response).await.contains("Spam spam"));

	let comments = app
		.state
		.store
		.list_comments(&cars_server::search::CommentFilter::default())
		.await
		.unwrap();
	assert_eq!(comments.len(), 1);

	let response = app.form(&format!("/admin/comments/{}/delete/", comments[0].id), Some(&admin), &[]).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(location(&response), "/admin/comments/");

	let response = app.form(&format!("/admin/comments/{}/delete/", comments[0].id), Some(&admin), &[]).await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);

	let id = detail.trim_start_matches("/cars/").trim_end_matches('/');
	let response = app.form(&format!("/admin/cars/{}/delete/", id), Some(&owner), &[]).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert!(location(&response).starts_with("/accounts/login/"));

	let response = app.form(&format!("/admin/cars/{}/delete/", id), Some(&admin), &[]).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert_eq!(app.page(&detail, None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_redirect_keeps_the_query_string() {
	let app = TestApp::with_admins(&["root"]);
	let visitor = register(&app, "ann").await;

	let response = app.page("/admin/cars/?make=volvo", Some(&visitor)).await;
	assert_eq!(response.status(), StatusCode::FOUND);
	let login = location(&response).to_owned();
	assert_eq!(login, "/accounts/login/?next=%2Fadmin%2Fcars%2F%3Fmake%3Dvolvo");

	let admin = register(&app, "root").await;
	let response = app
		.form(&login, None, &[("username", "root"), ("password", PASSWORD), ("next", "/admin/cars/?make=volvo")])
		.await;
	assert_eq!(location(&response), "/admin/cars/?make=volvo");
	assert_eq!(app.page(location(&response), Some(&admin)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn session_cookie_is_secure_when_configured() {
	let plain = TestApp::new();
	let response = plain
		.form("/accounts/register/", None, &[("username", "ann"), ("password1", PASSWORD), ("password2", PASSWORD)])
		.await;
	assert!(!response.headers()[SET_COOKIE].to_str().unwrap().contains("Secure"));

	let mut config = TestApp::config();
	config.secure_cookies = true;
	let app = TestApp::with_config(config);
	let response = app
		.form("/accounts/register/", None, &[("username", "ann"), ("password1", PASSWORD), ("password2", PASSWORD)])
		.await;
	assert_eq!(response.status(), StatusCode::FOUND);
	assert!(response.headers()[SET_COOKIE].to_str().unwrap().ends_with("; Secure"));
	let session = session_from(&response).unwrap();

	let response = app.form("/accounts/logout/", Some(&session), &[]).await;
	assert!(response.headers()[SET_COOKIE].to_str().unwrap().ends_with("; Secure"));
}
