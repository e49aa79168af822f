use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection::QueryRejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single client-facing error message.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	/// A human-readable description of the error.
	pub content: Cow<'static, str>,
	/// The input field the error relates to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'static, str>>,
	/// Structured details about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message {
	pub fn new(content: impl Into<Cow<'static, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message>,
}

fn respond(status: StatusCode, errors: Vec<Message>) -> Response<Body> {
	(
		status,
		Json(ErrorResponse {
			success: false,
			errors,
		}),
	)
		.into_response()
}

/// An error owned by a single route module, mapped onto an HTTP status and
/// a list of client-facing messages.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message> {
		Message::new(self.to_string()).into_vec()
	}
}

/// Errors shared by every route.
///
/// The Display output is logged, not sent to the client, so it can contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json rejection: {0:?}")]
	Json(axum_jsonschema::JsonSchemaRejection),
	#[error("query rejection: {0}")]
	Query(#[from] QueryRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("rate limited: {0:?}")]
	RateLimit(GovernorError),
	#[error("insufficient role")]
	Forbidden,
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl From<GovernorError> for AppError {
	fn from(error: GovernorError) -> Self {
		Self::RateLimit(error)
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Validation(errors) => respond(
				StatusCode::BAD_REQUEST,
				errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| {
							let content = error
								.message
								.clone()
								.unwrap_or_else(|| error.code.clone());

							Message::new(content).field(field.clone())
						})
					})
					.collect(),
			),
			Self::Json(rejection) => rejection.into_response(),
			Self::Query(rejection) => respond(
				rejection.status(),
				Message::new(rejection.body_text()).into_vec(),
			),
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => respond(
				StatusCode::TOO_MANY_REQUESTS,
				Message::new("too many requests, please try again later")
					.detail("retry_after_secs", wait_time)
					.into_vec(),
			),
			Self::RateLimit(error) => {
				tracing::warn!(?error, "rate limiter failed");
				respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
			}
			Self::Forbidden => respond(
				StatusCode::FORBIDDEN,
				Message::new("not authorized to access this route").into_vec(),
			),
			Self::Database(error) => {
				tracing::error!(%error, "database error");
				respond(StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
			}
		}
	}
}

/// The error returned by route handlers: either the module's own error or a
/// shared [`AppError`].
#[derive(Debug)]
pub enum RouteError<E> {
	Route(E),
	App(AppError),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<sqlx::Error> for RouteError<E> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(AppError::Database(error))
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::Route(error) => respond(error.status(), error.errors()),
			Self::App(error) => error.into_response(),
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = ErrorResponse;
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use super::{ErrorShape, Message, RouteError};

	#[derive(Debug, thiserror::Error)]
	enum Error {
		#[error("widget not found")]
		UnknownWidget,
	}

	impl ErrorShape for Error {
		fn status(&self) -> StatusCode {
			StatusCode::NOT_FOUND
		}
	}

	#[test]
	fn test_message_details() {
		let message = Message::new("bad").field("email").detail("limit", 5);
		let value = serde_json::to_value(&message).unwrap();

		assert_eq!(value["content"], "bad");
		assert_eq!(value["field"], "email");
		assert_eq!(value["details"]["limit"], 5);
	}

	#[test]
	fn test_route_error_uses_shape_status() {
		use axum::response::IntoResponse;

		let response = RouteError::<Error>::from(Error::UnknownWidget).into_response();

		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}
}
