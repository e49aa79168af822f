use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	error::{AppError, RouteError},
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_COOKIE},
	route::{
		auth::{
			self,
			model::{Role, User},
		},
		comment::policy::Actor,
	},
	session, Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Reads the token from an `Authorization: Bearer` header.
///
/// Returns `Ok(None)` when the header is absent.
fn bearer_token(parts: &request::Parts) -> Result<Option<String>, auth::Error> {
	let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
		return Ok(None);
	};

	let value = value.to_str().map_err(|_| auth::Error::InvalidToken)?;
	let token = value
		.strip_prefix(AUTHORIZATION_PREFIX)
		.ok_or(auth::Error::InvalidToken)?;

	Ok(Some(token.trim().to_owned()))
}

/// Reads the token from the session cookie.
fn cookie_token(parts: &request::Parts) -> Option<String> {
	parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.map(|cookie| cookie.value().to_owned())
}

/// Extracts the authenticated user from a session token.
///
/// If no token is present, [`auth::Error::NoToken`] is returned.
/// If the token is invalid, expired or names an unknown user,
/// [`auth::Error::InvalidToken`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user: User,
}

impl Session {
	async fn from_token<S>(token: &str, state: &S) -> Result<Self, RouteError<auth::Error>>
	where
		Database: FromRef<S>,
		session::Keys: FromRef<S>,
		S: Sync,
	{
		let keys = session::Keys::from_ref(state);
		let claims = keys.verify(token).map_err(|_| auth::Error::InvalidToken)?;

		let database = Database::from_ref(state);
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = $1"#)
			.bind(claims.sub)
			.fetch_optional(&database)
			.await?;

		let user = user.ok_or(auth::Error::InvalidToken)?;

		Ok(Self { user })
	}

	/// Fails with a 403 unless the user holds one of the given roles.
	pub fn require(&self, roles: &[Role]) -> Result<(), AppError> {
		if roles.contains(&self.user.role) {
			Ok(())
		} else {
			Err(AppError::Forbidden)
		}
	}

	pub fn actor(&self) -> Actor {
		Actor {
			id: self.user.id,
			role: self.user.role,
		}
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	session::Keys: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let token = match bearer_token(parts)? {
			Some(token) => token,
			None => cookie_token(parts).ok_or(auth::Error::NoToken)?,
		};

		Self::from_token(&token, state).await
	}
}

impl OperationInput for Session {
	/// Adds a bearer token or session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_COOKIE.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}

/// A session that may be absent.
///
/// Anonymous requests yield `None`. An explicit bearer token must be valid,
/// but a session cookie that no longer verifies (expired, or signed with an
/// old secret) is treated as anonymous.
#[derive(Debug)]
pub struct MaybeSession(pub Option<Session>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
	Database: FromRef<S>,
	session::Keys: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		if let Some(token) = bearer_token(parts)? {
			return Ok(Self(Some(Session::from_token(&token, state).await?)));
		}

		let Some(token) = cookie_token(parts) else {
			return Ok(Self(None));
		};

		match Session::from_token(&token, state).await {
			Ok(session) => Ok(Self(Some(session))),
			Err(RouteError::Route(auth::Error::InvalidToken)) => {
				tracing::debug!("stale session cookie, continuing anonymously");
				Ok(Self(None))
			}
			Err(error) => Err(error),
		}
	}
}

impl OperationInput for MaybeSession {}
