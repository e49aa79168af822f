use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username.chars().any(|c| !c.is_alphanumeric() && c != '_') {
		return Err(ValidationError::new("username must be alphanumeric"));
	}

	Ok(())
}

fn validate_reset_code(code: &str) -> Result<(), ValidationError> {
	if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
		return Err(ValidationError::new("code must be six digits"));
	}

	Ok(())
}

/// What a user is allowed to do beyond commenting.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Full control, including deleting any comment at any time.
	Admin,
	/// May author and edit posts.
	Editor,
	/// A reader account.
	User,
}

/// A single user.
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The user's email address, used for logging in and password resets.
	pub email: String,
	/// The hashed password.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The username that is displayed to the public.
	pub username: String,
	pub role: Role,
	/// The hashed password reset code, if one is outstanding.
	#[serde(skip)]
	pub reset_code: Option<Vec<u8>>,
	#[serde(skip)]
	pub reset_code_expires_at: Option<chrono::DateTime<chrono::Utc>>,
	/// The creation time of the user.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A freshly issued session token.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Token {
	pub success: bool,
	/// A bearer token, also set as the `token` cookie.
	pub token: String,
	pub user: User,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// The username that is displayed to the public.
	#[validate(length(min = 3, max = 32), custom(function = "validate_username"))]
	pub username: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdatePasswordInput {
	#[validate(length(min = 1, max = 128))]
	pub current_password: String,
	#[validate(length(min = 8, max = 128))]
	pub new_password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ResetRequestInput {
	#[validate(email)]
	pub email: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ResetVerifyInput {
	#[validate(email)]
	pub email: String,
	#[validate(custom(function = "validate_reset_code"))]
	pub code: String,
	#[validate(length(min = 8, max = 128))]
	pub new_password: String,
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::{RegisterInput, ResetVerifyInput};

	#[test]
	fn test_register_rejects_symbols_in_username() {
		let input = RegisterInput {
			email: "jane@inkwell.dev".into(),
			password: "hunter2hunter".into(),
			username: "jane!".into(),
		};

		assert!(input.validate().is_err());
	}

	#[test]
	fn test_reset_code_must_be_six_digits() {
		let mut input = ResetVerifyInput {
			email: "jane@inkwell.dev".into(),
			code: "12345".into(),
			new_password: "hunter2hunter".into(),
		};

		assert!(input.validate().is_err());

		input.code = "12345a".into();
		assert!(input.validate().is_err());

		input.code = "123456".into();
		assert!(input.validate().is_ok());
	}
}
