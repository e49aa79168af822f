use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::Database;

use super::{model::Comment, policy, Error, RouteError};

/// The comment lookups that deletion needs.
#[axum::async_trait]
pub trait CommentStore: Sync {
	async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, sqlx::Error>;

	/// Deletes a comment, returning whether it still existed.
	async fn remove_comment(&self, id: Uuid) -> Result<bool, sqlx::Error>;
}

#[axum::async_trait]
impl CommentStore for Database {
	async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
		sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = $1")
			.bind(id)
			.fetch_optional(self)
			.await
	}

	async fn remove_comment(&self, id: Uuid) -> Result<bool, sqlx::Error> {
		let result = sqlx::query("DELETE FROM comment WHERE id = $1")
			.bind(id)
			.execute(self)
			.await?;

		Ok(result.rows_affected() > 0)
	}
}

/// Deletes a comment on behalf of `actor`, as of `now`.
pub async fn delete_comment<S: CommentStore + ?Sized>(
	store: &S,
	id: Uuid,
	actor: &policy::Actor,
	now: DateTime<Utc>,
) -> Result<(), RouteError> {
	let comment = store
		.find_comment(id)
		.await?
		.ok_or(Error::UnknownComment(id))?;

	policy::authorize_delete(actor, comment.user_id, comment.created_at, now)
		.map_err(Error::Denied)?;

	// a concurrent delete may have won the race
	if !store.remove_comment(id).await? {
		return Err(Error::UnknownComment(id).into());
	}

	tracing::info!(comment = %id, actor = %actor.id, role = ?actor.role, "comment deleted");

	Ok(())
}
