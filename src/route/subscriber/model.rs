use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A newsletter subscription.
///
/// Unsubscribing only deactivates the row, so subscribing again later keeps
/// the same token.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Subscriber {
	pub id: Uuid,
	pub email: String,
	/// Whether the weekly newsletter is sent to this address.
	pub is_active: bool,
	/// The secret in the unsubscribe link of every email.
	#[serde(skip)]
	pub unsubscribe_token: Uuid,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct SubscribeInput {
	#[validate(email)]
	pub email: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Subscribed {
	pub success: bool,
	pub message: String,
	pub subscriber: Subscriber,
}
