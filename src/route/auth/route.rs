use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
};
use chrono::{Duration, Utc};
use macros::route;
use rand::Rng;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	route::model::Acknowledgement,
	session, AppState, Database,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;
pub const RESET_CODE_LIFETIME_MINUTES: i64 = 10;
/// Advisory lock key serializing registrations, so only one can see an empty
/// user table.
pub const REGISTER_LOCK: i64 = 0x696e_6b77_656c_6c;

/// Hashes a secret (a password or a reset code) with Argon2, using the user's
/// id as a salt.
fn hash_secret(hasher: &Argon2, secret: &str, id: &Uuid) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(secret.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Issues a token for the user and wraps it in a cookie and a response body.
fn token_response(
	keys: &session::Keys,
	user: model::User,
) -> Result<impl IntoApiResponse, RouteError> {
	let token = keys.issue(user.id).map_err(Error::Jwt)?;
	let cookie = session::create_cookie(token.clone());

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Json(model::Token {
			success: true,
			token,
			user,
		}),
	))
}

async fn find_by_email(database: &Database, email: &str) -> Result<Option<model::User>, sqlx::Error> {
	sqlx::query_as::<_, model::User>(r#"SELECT * FROM "user" WHERE email = $1"#)
		.bind(email)
		.fetch_optional(database)
		.await
}

/// Log in
/// Logs in to an account, returning a session token (also set as a cookie).
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::Token>"))]
pub async fn login(
	State(state): State<AppState>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let Some(user) = find_by_email(&state.database, &auth.email.to_lowercase()).await? else {
		return Err(Error::InvalidEmailOrPassword.into());
	};

	let hashed = hash_secret(&state.hasher, &auth.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidEmailOrPassword.into());
	}

	tracing::info!(user = %user.id, "user logged in");

	token_response(&state.keys, user)
}

/// Log out
/// Clears the session cookie. Bearer tokens stay valid until they expire.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout() -> impl IntoApiResponse {
	(
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	)
}

/// Register account
/// Registers a new account, returning a session token. The first account ever registered becomes an admin.
#[route(tag = tag::AUTH, response(status = 200, description = "Registered successfully.", shape = "Json<model::Token>"))]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user_id = Uuid::new_v4();
	let hashed = hash_secret(&state.hasher, &auth.password, &user_id).map_err(Error::Argon)?;

	let mut transaction = state.database.begin().await?;

	sqlx::query("SELECT pg_advisory_xact_lock($1)")
		.bind(REGISTER_LOCK)
		.execute(&mut *transaction)
		.await?;

	let user = sqlx::query_as::<_, model::User>(
		r#"
			INSERT INTO "user" (id, email, username, password, role)
			VALUES (
				$1, $2, $3, $4,
				CASE WHEN EXISTS (SELECT 1 FROM "user") THEN 'user'::user_role ELSE 'admin'::user_role END
			)
			RETURNING *
		"#,
	)
	.bind(user_id)
	.bind(auth.email.to_lowercase())
	.bind(&auth.username)
	.bind(&hashed[..])
	.fetch_one(&mut *transaction)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) => match d.constraint() {
			Some("user_email_key") => Error::EmailTaken.into(),
			Some("user_username_key") => Error::UsernameTaken.into(),
			_ => RouteError::from(e),
		},
		e => RouteError::from(e),
	})?;

	transaction.commit().await?;

	tracing::info!(user = %user.id, role = ?user.role, "user registered");

	token_response(&state.keys, user)
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

/// Update password
/// Changes the password of the authenticated user after checking the current one, returning a fresh token.
#[route(tag = tag::AUTH, response(status = 200, description = "Password updated.", shape = "Json<model::Token>"))]
pub async fn update_password(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::UpdatePasswordInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user = session.user;
	let current = hash_secret(&state.hasher, &input.current_password, &user.id).map_err(Error::Argon)?;

	if user.password != current {
		return Err(Error::IncorrectPassword.into());
	}

	let hashed = hash_secret(&state.hasher, &input.new_password, &user.id).map_err(Error::Argon)?;
	let user = sqlx::query_as::<_, model::User>(
		r#"UPDATE "user" SET password = $1 WHERE id = $2 RETURNING *"#,
	)
	.bind(&hashed[..])
	.bind(user.id)
	.fetch_one(&state.database)
	.await?;

	token_response(&state.keys, user)
}

/// Request password reset
/// Issues a six-digit reset code, valid for ten minutes. The code is written to the server log rather than emailed.
#[route(tag = tag::AUTH)]
pub async fn request_reset(
	State(state): State<AppState>,
	Json(input): Json<model::ResetRequestInput>,
) -> Result<Json<Acknowledgement>, RouteError> {
	let email = input.email.to_lowercase();
	let Some(user) = find_by_email(&state.database, &email).await? else {
		tracing::info!(%email, "password reset requested for unknown email");
		return Err(Error::UnknownEmail.into());
	};

	let code = rand::thread_rng().gen_range(100_000..1_000_000u32).to_string();
	let hashed = hash_secret(&state.hasher, &code, &user.id).map_err(Error::Argon)?;

	sqlx::query(r#"UPDATE "user" SET reset_code = $1, reset_code_expires_at = $2 WHERE id = $3"#)
		.bind(&hashed[..])
		.bind(Utc::now() + Duration::minutes(RESET_CODE_LIFETIME_MINUTES))
		.bind(user.id)
		.execute(&state.database)
		.await?;

	tracing::warn!(%email, %code, "password reset code issued");

	Ok(Json(Acknowledgement::new(
		"a reset code has been written to the server log",
	)))
}

/// Reset password
/// Sets a new password using a reset code from /auth/reset-request. The code can only be used once.
#[route(tag = tag::AUTH)]
pub async fn verify_reset(
	State(state): State<AppState>,
	Json(input): Json<model::ResetVerifyInput>,
) -> Result<Json<Acknowledgement>, RouteError> {
	let user = find_by_email(&state.database, &input.email.to_lowercase())
		.await?
		.ok_or(Error::InvalidResetCode)?;

	let (Some(stored), Some(expires_at)) = (&user.reset_code, user.reset_code_expires_at) else {
		return Err(Error::InvalidResetCode.into());
	};

	let hashed = hash_secret(&state.hasher, &input.code, &user.id).map_err(Error::Argon)?;

	if expires_at <= Utc::now() || stored[..] != hashed[..] {
		return Err(Error::InvalidResetCode.into());
	}

	let password = hash_secret(&state.hasher, &input.new_password, &user.id).map_err(Error::Argon)?;

	sqlx::query(
		r#"
			UPDATE "user"
			SET password = $1, reset_code = NULL, reset_code_expires_at = NULL
			WHERE id = $2
		"#,
	)
	.bind(&password[..])
	.bind(user.id)
	.execute(&state.database)
	.await?;

	tracing::info!(user = %user.id, "password reset");

	Ok(Json(Acknowledgement::new("password updated successfully")))
}
