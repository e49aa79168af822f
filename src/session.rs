use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "token";
pub const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	/// The user the token was issued to.
	pub sub: Uuid,
	pub iat: i64,
	pub exp: i64,
}

/// Signing and verification keys for session tokens (HS256).
#[derive(Clone)]
pub struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
}

impl Keys {
	pub fn new(secret: &[u8]) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
		}
	}

	/// Issues a token for the user, valid for [`TOKEN_LIFETIME_DAYS`].
	pub fn issue(&self, user_id: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
		let now = Utc::now();
		let claims = Claims {
			sub: user_id,
			iat: now.timestamp(),
			exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
		};

		jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
	}

	/// Verifies the signature and expiry of a token, returning its claims.
	pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
		jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
			.map(|data| data.claims)
	}
}

/// Creates a session cookie holding the token, expiring with it.
pub fn create_cookie(token: String) -> cookie::Cookie<'static> {
	cookie::Cookie::build((COOKIE_NAME, token))
		.secure(!cfg!(debug_assertions))
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::days(TOKEN_LIFETIME_DAYS))
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> cookie::Cookie<'static> {
	cookie::Cookie::build(COOKIE_NAME)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use super::Keys;

	#[test]
	fn test_issue_and_verify() {
		let keys = Keys::new(b"a secret long enough for hs256");
		let user_id = Uuid::new_v4();

		let token = keys.issue(user_id).unwrap();
		let claims = keys.verify(&token).unwrap();

		assert_eq!(claims.sub, user_id);
		assert!(claims.exp > claims.iat);
	}

	#[test]
	fn test_rejects_foreign_signature() {
		let token = Keys::new(b"first secret").issue(Uuid::new_v4()).unwrap();

		assert!(Keys::new(b"second secret").verify(&token).is_err());
	}

	#[test]
	fn test_cookie_carries_token() {
		let cookie = super::create_cookie("abc".into());

		assert_eq!(cookie.name(), super::COOKIE_NAME);
		assert_eq!(cookie.value(), "abc");
		assert_eq!(cookie.path(), Some("/"));
	}
}
