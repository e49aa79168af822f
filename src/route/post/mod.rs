use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("post not found")]
	UnknownPost(Uuid),
	#[error("post not found")]
	UnknownSlug(String),
	#[error("a post with this slug already exists")]
	SlugTaken(String),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownSlug(..) => StatusCode::NOT_FOUND,
			Self::SlugTaken(..) => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownPost(post) => message.detail("post", post.to_string()),
			Self::UnknownSlug(slug) | Self::SlugTaken(slug) => message.detail("slug", slug.as_str()),
		}
		.into_vec()
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	async fn create(app: &TestServer, token: &str, title: &str) -> Value {
		let response = app
			.post("/posts")
			.add_header(AUTHORIZATION, bearer(token))
			.json(&json!({
				"title": title,
				"content": "Body text for the post.",
				"category": "AI News",
			}))
			.await;

		assert_eq!(response.status_code(), 201);
		response.json::<Value>()
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_duplicate_titles_get_suffixed_slugs(pool: Database) {
		let app = app(pool);
		let token = register(&app, "admin@inkwell.dev", "admin").await;

		let first = create(&app, &token, "Hello World").await;
		let second = create(&app, &token, "Hello World").await;
		let third = create(&app, &token, "Hello World").await;

		assert_eq!(first["slug"], "hello-world");
		assert_eq!(second["slug"], "hello-world-1");
		assert_eq!(third["slug"], "hello-world-2");
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_reading_a_post_counts_views(pool: Database) {
		let app = app(pool);
		let token = register(&app, "admin@inkwell.dev", "admin").await;

		create(&app, &token, "Counting views").await;

		app.get("/posts/counting-views").await;
		let response = app.get("/posts/counting-views").await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["views"], 2);

		let response = app.get("/posts/no-such-post").await;

		assert_eq!(response.status_code(), 404);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_readers_cannot_write_posts(pool: Database) {
		let app = app(pool);

		register(&app, "admin@inkwell.dev", "admin").await;
		let token = register(&app, "reader@inkwell.dev", "reader").await;

		let response = app
			.post("/posts")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({
				"title": "Not allowed",
				"content": "Body",
				"category": "Opinion",
			}))
			.await;

		assert_eq!(response.status_code(), 403);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_filter_and_update(pool: Database) {
		let app = app(pool);
		let token = register(&app, "admin@inkwell.dev", "admin").await;

		let post = create(&app, &token, "Filtered post").await;

		let response = app.get("/posts?category=Ethics").await;
		assert_eq!(response.json::<Value>().as_array().unwrap().len(), 0);

		let response = app.get("/posts?search=FILTERED").await;
		assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

		let response = app
			.put(&format!("/posts/{}", post["id"].as_str().unwrap()))
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "title": "Renamed post", "category": "Ethics" }))
			.await;

		assert_eq!(response.status_code(), 200);

		let updated = response.json::<Value>();

		assert_eq!(updated["title"], "Renamed post");
		assert_eq!(updated["slug"], "filtered-post");
		assert_eq!(updated["category"], "Ethics");
	}
}
