use aide::axum::{routing::post_with, ApiRouter};
use axum::{extract::State, http::StatusCode};
use macros::route;

use crate::{
	error,
	extract::{Json, Session},
	newsletter::{self, Outcome},
	openapi::tag,
	route::auth::model::Role,
	AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Run(#[from] newsletter::Error),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new().api_route("/dispatch", post_with(dispatch, dispatch_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		StatusCode::SERVICE_UNAVAILABLE
	}

	fn errors(&self) -> Vec<error::Message> {
		error::Message::new("the newsletter could not be sent, try again later").into_vec()
	}
}

/// Send newsletter
/// Runs the weekly newsletter now instead of waiting for Monday morning. If a run is already in progress, this one is skipped. Requires the admin role.
#[route(tag = tag::NEWSLETTER)]
pub async fn dispatch(
	State(state): State<AppState>,
	session: Session,
) -> Result<Json<Outcome>, RouteError> {
	session.require(&[Role::Admin])?;

	tracing::info!(user = %session.user.id, "newsletter dispatch requested");

	let outcome = state.scheduler.trigger().await.map_err(|error| {
		tracing::error!(%error, "manual newsletter run failed");
		Error::Run(error)
	})?;

	Ok(Json(outcome))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_dispatch_sends_the_digest(pool: Database) {
		let (app, mailer) = app_with_mailer(pool);
		let admin = register(&app, "admin@inkwell.dev", "admin").await;

		let response = app
			.post("/newsletter/dispatch")
			.add_header(AUTHORIZATION, bearer(&admin))
			.await;

		assert_eq!(response.json::<Value>(), json!({ "status": "no_posts" }));

		app.post("/posts")
			.add_header(AUTHORIZATION, bearer(&admin))
			.json(&json!({ "title": "This week", "content": "Body", "category": "AI Tools" }))
			.await;

		for n in 0..3 {
			app.post("/subscribers")
				.json(&json!({ "email": format!("reader{n}@inkwell.dev") }))
				.await;
		}

		let response = app
			.post("/newsletter/dispatch")
			.add_header(AUTHORIZATION, bearer(&admin))
			.await;

		assert_eq!(response.status_code(), 200);

		let outcome = response.json::<Value>();

		assert_eq!(outcome["status"], "completed");
		assert_eq!(outcome["sent"], 3);
		assert_eq!(outcome["batches"], 1);
		// three welcome emails, then three digests
		assert_eq!(mailer.sent.lock().unwrap().len(), 6);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres database in DATABASE_URL"]
	async fn test_dispatch_is_admin_only(pool: Database) {
		let app = app(pool);

		register(&app, "admin@inkwell.dev", "admin").await;
		let reader = register(&app, "reader@inkwell.dev", "reader").await;

		let response = app
			.post("/newsletter/dispatch")
			.add_header(AUTHORIZATION, bearer(&reader))
			.await;

		assert_eq!(response.status_code(), 403);
	}
}
