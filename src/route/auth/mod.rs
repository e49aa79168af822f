use aide::axum::{
	routing::{get_with, post_with, put_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("incorrect current password")]
	IncorrectPassword,
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
	#[error("token signing error")]
	Jwt(#[from] jsonwebtoken::errors::Error),
	#[error("no session token")]
	NoToken,
	#[error("invalid session token")]
	InvalidToken,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
	#[error("user not found")]
	UnknownEmail,
	#[error("invalid or expired code")]
	InvalidResetCode,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
		.api_route("/password", put_with(update_password, update_password_docs))
		.api_route("/reset-request", post_with(request_reset, request_reset_docs))
		.api_route("/reset-verify", post_with(verify_reset, verify_reset_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword
			| Self::IncorrectPassword
			| Self::NoToken
			| Self::InvalidToken => StatusCode::UNAUTHORIZED,
			Self::Argon(..) | Self::Jwt(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
			Self::UnknownEmail => StatusCode::NOT_FOUND,
			Self::InvalidResetCode => StatusCode::BAD_REQUEST,
		}
	}
}
