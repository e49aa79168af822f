use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("email already subscribed")]
	AlreadySubscribed,
	#[error("invalid unsubscribe token")]
	InvalidToken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_subscribers, get_subscribers_docs).post_with(subscribe, subscribe_docs),
		)
		.api_route("/count", get_with(count_subscribers, count_subscribers_docs))
		.api_route("/unsubscribe/:token", get_with(unsubscribe, unsubscribe_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::AlreadySubscribed => StatusCode::BAD_REQUEST,
			Self::InvalidToken => StatusCode::NOT_FOUND,
		}
	}
}
