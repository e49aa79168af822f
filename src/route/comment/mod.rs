use aide::axum::{
	routing::{delete_with, get_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod policy;
pub mod route;
pub mod store;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("comment not found")]
	UnknownComment(Uuid),
	#[error("post not found")]
	UnknownPost(Uuid),
	#[error(transparent)]
	Denied(policy::Denial),
}

pub type RouteError = error::RouteError<Error>;

/// Comment routes. Listing and posting live under the post they belong to.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/posts/:id/comments",
			get_with(get_comments, get_comments_docs).post_with(create_comment, create_comment_docs),
		)
		.api_route("/comments/:id", delete_with(delete_comment, delete_comment_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownComment(..) | Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::Denied(..) => StatusCode::FORBIDDEN,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownComment(id) => message.detail("comment", id.to_string()),
			Self::UnknownPost(id) => message.detail("post", id.to_string()),
			Self::Denied(policy::Denial::WindowExpired) => {
				message.detail("window_secs", policy::DELETE_WINDOW_SECS)
			}
			Self::Denied(..) => message,
		}
		.into_vec()
	}
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use super::{policy::Denial, Error, RouteError};
	use crate::test::*;

	#[tokio::test]
	async fn test_expired_window_is_forbidden() {
		let (status, body) = render(RouteError::from(Error::Denied(Denial::WindowExpired))).await;

		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["success"], false);
		assert_eq!(
			body["errors"][0]["content"],
			"comments can only be deleted within 10 seconds of posting"
		);
		assert_eq!(body["errors"][0]["details"]["window_secs"], 10);
	}

	#[tokio::test]
	async fn test_not_owner_is_forbidden_without_details() {
		let (status, body) = render(RouteError::from(Error::Denied(Denial::NotAuthorized))).await;

		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["errors"][0]["content"], "Not authorized to delete this comment");
		assert!(body["errors"][0].get("details").is_none());
	}

	#[tokio::test]
	async fn test_unknown_comment_is_not_found() {
		let id = Uuid::new_v4();
		let (status, body) = render(RouteError::from(Error::UnknownComment(id))).await;

		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["errors"][0]["content"], "comment not found");
		assert_eq!(body["errors"][0]["details"]["comment"], id.to_string());
	}

	#[tokio::test]
	async fn test_unknown_post_is_not_found() {
		let id = Uuid::new_v4();
		let (status, body) = render(RouteError::from(Error::UnknownPost(id))).await;

		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["errors"][0]["details"]["post"], id.to_string());
	}

	async fn create_post(app: &TestServer, token: &str) -> String {
		let response = app
			.post("/posts")
			.add_header(AUTHORIZATION, bearer(token))
			.json(&json!({
				"title": "Commented post",
				"content": "Body",
				"category": "Tutorials",
			}))
			.await;

		response.json::<Value>()["id"].as_str().unwrap().to_owned()
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_owner_deletes_fresh_comment(pool: Database) {
		let app = app(pool);
		let admin = register(&app, "admin@inkwell.dev", "admin").await;
		let reader = register(&app, "reader@inkwell.dev", "reader").await;
		let post = create_post(&app, &admin).await;

		let response = app
			.post(&format!("/posts/{post}/comments"))
			.add_header(AUTHORIZATION, bearer(&reader))
			.json(&json!({ "name": "Reader", "content": "First!" }))
			.await;

		assert_eq!(response.status_code(), 201);

		let comment = response.json::<Value>();

		assert!(comment.get("email").is_none());

		let response = app
			.delete(&format!("/comments/{}", comment["id"].as_str().unwrap()))
			.add_header(AUTHORIZATION, bearer(&reader))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = app.get(&format!("/posts/{post}/comments")).await;

		assert_eq!(response.json::<Value>().as_array().unwrap().len(), 0);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_guest_comment_cannot_be_deleted_by_reader(pool: Database) {
		let app = app(pool);
		let admin = register(&app, "admin@inkwell.dev", "admin").await;
		let reader = register(&app, "reader@inkwell.dev", "reader").await;
		let post = create_post(&app, &admin).await;

		// posted without a token, so nobody owns it
		let response = app
			.post(&format!("/posts/{post}/comments"))
			.clear_cookies()
			.json(&json!({ "name": "Guest", "email": "guest@inkwell.dev", "content": "Hi" }))
			.await;

		let comment = response.json::<Value>();

		assert_eq!(comment["user_id"], Value::Null);

		let path = format!("/comments/{}", comment["id"].as_str().unwrap());
		let response = app
			.delete(&path)
			.add_header(AUTHORIZATION, bearer(&reader))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app
			.delete(&path)
			.add_header(AUTHORIZATION, bearer(&admin))
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_comment_on_unknown_post(pool: Database) {
		let app = app(pool);

		let response = app
			.post(&format!("/posts/{}/comments", uuid::Uuid::new_v4()))
			.json(&json!({ "name": "Guest", "content": "Hello?" }))
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_comment_is_stamped_by_the_app_clock(pool: Database) {
		let app = app(pool);
		let admin = register(&app, "admin@inkwell.dev", "admin").await;
		let post = create_post(&app, &admin).await;

		let before = chrono::Utc::now() - chrono::Duration::milliseconds(1);
		let response = app
			.post(&format!("/posts/{post}/comments"))
			.add_header(AUTHORIZATION, bearer(&admin))
			.json(&json!({ "name": "Admin", "content": "Timed" }))
			.await;
		let after = chrono::Utc::now();

		let created_at: chrono::DateTime<chrono::Utc> =
			serde_json::from_value(response.json::<Value>()["created_at"].clone()).unwrap();

		assert!(before <= created_at && created_at <= after);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_guest_with_stale_cookie_can_comment(pool: Database) {
		let app = app(pool);
		let admin = register(&app, "admin@inkwell.dev", "admin").await;
		let post = create_post(&app, &admin).await;

		let response = app
			.post(&format!("/posts/{post}/comments"))
			.clear_cookies()
			.add_header(
				axum::http::header::COOKIE,
				HeaderValue::from_static("token=expired.jwt.value"),
			)
			.json(&json!({ "name": "Guest", "content": "Still here" }))
			.await;

		assert_eq!(response.status_code(), 201);
		assert_eq!(response.json::<Value>()["user_id"], Value::Null);
	}
}
