use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single comment on a post.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Comment {
	pub id: Uuid,
	pub post_id: Uuid,
	/// The display name of the commenter.
	pub name: String,
	/// Never shown to other readers.
	#[serde(skip)]
	pub email: Option<String>,
	pub content: String,
	/// The account that posted the comment, if the commenter was logged in.
	pub user_id: Option<Uuid>,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct CreateCommentInput {
	/// The display name of the commenter.
	#[validate(length(min = 1, max = 64))]
	pub name: String,
	#[validate(email)]
	pub email: Option<String>,
	#[validate(length(min = 1, max = 2000))]
	pub content: String,
}
