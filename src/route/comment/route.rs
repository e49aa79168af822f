use axum::{
	extract::{Path, State},
	http::StatusCode,
};
use chrono::Utc;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, MaybeSession, Session},
	openapi::tag,
	route::model::Acknowledgement,
	Database,
};

use super::{model, store, Error, RouteError};

/// Get comments
/// Returns the comments on a post, newest first.
#[route(tag = tag::COMMENT)]
pub async fn get_comments(
	State(database): State<Database>,
	Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<model::Comment>>, RouteError> {
	let comments = sqlx::query_as::<_, model::Comment>(
		"SELECT * FROM comment WHERE post_id = $1 ORDER BY created_at DESC",
	)
	.bind(post_id)
	.fetch_all(&database)
	.await?;

	Ok(Json(comments))
}

/// Create comment
/// Adds a comment to a post. Anyone may comment; when the request carries a session token, the comment belongs to that user, who may then delete it for ten seconds.
#[route(tag = tag::COMMENT, response(status = 201, description = "Comment created.", shape = "Json<model::Comment>"))]
pub async fn create_comment(
	State(database): State<Database>,
	MaybeSession(session): MaybeSession,
	Path(post_id): Path<Uuid>,
	Json(input): Json<model::CreateCommentInput>,
) -> Result<(StatusCode, Json<model::Comment>), RouteError> {
	// stamped with the clock delete_comment checks the window against
	let comment = sqlx::query_as::<_, model::Comment>(
		r#"
			INSERT INTO comment (post_id, name, email, content, user_id, created_at)
			VALUES ($1, $2, $3, $4, $5, $6)
			RETURNING *
		"#,
	)
	.bind(post_id)
	.bind(&input.name)
	.bind(input.email.map(|email| email.to_lowercase()))
	.bind(&input.content)
	.bind(session.map(|session| session.user.id))
	.bind(Utc::now())
	.fetch_one(&database)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) if d.constraint() == Some("comment_post_id_fkey") => {
			Error::UnknownPost(post_id).into()
		}
		e => RouteError::from(e),
	})?;

	tracing::info!(comment = %comment.id, post = %post_id, user = ?comment.user_id, "comment created");

	Ok((StatusCode::CREATED, Json(comment)))
}

/// Delete comment
/// Deletes a comment. Admins may delete any comment; the author of a comment may delete it within ten seconds of posting.
#[route(tag = tag::COMMENT)]
pub async fn delete_comment(
	State(database): State<Database>,
	session: Session,
	Path(comment_id): Path<Uuid>,
) -> Result<Json<Acknowledgement>, RouteError> {
	store::delete_comment(&database, comment_id, &session.actor(), Utc::now()).await?;

	Ok(Json(Acknowledgement::new("Comment deleted")))
}
