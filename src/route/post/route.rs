use axum::{
	extract::{Path, State},
	http::StatusCode,
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Query, Session},
	openapi::tag,
	route::{auth::model::Role, model::Acknowledgement},
	Database,
};

use super::{model, Error, RouteError};

/// Roles allowed to write posts.
const AUTHORS: &[Role] = &[Role::Admin, Role::Editor];

/// Finds the first free slug for a title: the slugified title, then the same
/// with `-1`, `-2`, ... appended.
async fn unique_slug(database: &Database, title: &str) -> Result<String, sqlx::Error> {
	let base = model::base_slug(title);
	let mut attempt = 0;

	loop {
		let candidate = model::slug_candidate(&base, attempt);
		let taken = sqlx::query_scalar::<_, bool>(
			"SELECT EXISTS (SELECT 1 FROM post WHERE slug = $1)",
		)
		.bind(&candidate)
		.fetch_one(database)
		.await?;

		if !taken {
			return Ok(candidate);
		}

		attempt += 1;
	}
}

/// Get all posts
/// Returns a paginated list of posts, newest first, optionally filtered by category and a case-insensitive search over the title and content.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	Query(paginate): Query<model::Paginate>,
	Query(filter): Query<model::PostFilter>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let posts = sqlx::query_as::<_, model::Post>(
		r#"
			SELECT * FROM post
			WHERE ($1::post_category IS NULL OR category = $1)
				AND ($2::text IS NULL OR title ILIKE $2 OR content ILIKE $2)
			ORDER BY created_at DESC
			LIMIT $3 OFFSET $4
		"#,
	)
	.bind(filter.category)
	.bind(filter.search_pattern())
	.bind(paginate.limit())
	.bind(paginate.offset())
	.fetch_all(&database)
	.await?;

	Ok(Json(posts))
}

/// Get single post
/// Returns a single post by its slug, counting the read.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	Path(slug): Path<String>,
) -> Result<Json<model::Post>, RouteError> {
	let post = sqlx::query_as::<_, model::Post>(
		"UPDATE post SET views = views + 1 WHERE slug = $1 RETURNING *",
	)
	.bind(&slug)
	.fetch_optional(&database)
	.await?;

	Ok(Json(post.ok_or(Error::UnknownSlug(slug))?))
}

/// Create post
/// Creates a new post with a unique slug derived from its title. Requires the admin or editor role.
#[route(tag = tag::POST, response(status = 201, description = "Post created.", shape = "Json<model::Post>"))]
pub async fn create_post(
	State(database): State<Database>,
	session: Session,
	Json(input): Json<model::CreatePostInput>,
) -> Result<(StatusCode, Json<model::Post>), RouteError> {
	session.require(AUTHORS)?;

	let slug = unique_slug(&database, &input.title).await?;
	let post = sqlx::query_as::<_, model::Post>(
		r#"
			INSERT INTO post (
				user_id, title, slug, content, excerpt, author,
				category, tags, featured_image, is_published
			)
			VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
			RETURNING *
		"#,
	)
	.bind(session.user.id)
	.bind(&input.title)
	.bind(&slug)
	.bind(&input.content)
	.bind(input.excerpt.map(model::truncate_excerpt))
	.bind(&input.author)
	.bind(input.category)
	.bind(&input.tags)
	.bind(&input.featured_image)
	.bind(input.is_published)
	.fetch_one(&database)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) if d.constraint() == Some("post_slug_key") => {
			Error::SlugTaken(slug.clone()).into()
		}
		e => RouteError::from(e),
	})?;

	tracing::info!(post = %post.id, slug = %post.slug, user = %session.user.id, "post created");

	Ok((StatusCode::CREATED, Json(post)))
}

/// Update post
/// Updates an existing post by its unique id. Omitted fields are left unchanged and the slug stays the same. Requires the admin or editor role.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
	Json(input): Json<model::UpdatePostInput>,
) -> Result<Json<model::Post>, RouteError> {
	session.require(AUTHORS)?;

	let post = sqlx::query_as::<_, model::Post>(
		r#"
			UPDATE post
			SET
				title = COALESCE($1, title),
				content = COALESCE($2, content),
				excerpt = COALESCE($3, excerpt),
				author = COALESCE($4, author),
				category = COALESCE($5, category),
				tags = COALESCE($6, tags),
				featured_image = COALESCE($7, featured_image),
				is_published = COALESCE($8, is_published)
			WHERE id = $9
			RETURNING *
		"#,
	)
	.bind(input.title)
	.bind(input.content)
	.bind(input.excerpt.map(model::truncate_excerpt))
	.bind(input.author)
	.bind(input.category)
	.bind(input.tags)
	.bind(input.featured_image)
	.bind(input.is_published)
	.bind(post_id)
	.fetch_optional(&database)
	.await?;

	Ok(Json(post.ok_or(Error::UnknownPost(post_id))?))
}

/// Delete post
/// Deletes an existing post and its comments. Requires the admin role.
#[route(tag = tag::POST)]
pub async fn delete_post(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
) -> Result<Json<Acknowledgement>, RouteError> {
	session.require(&[Role::Admin])?;

	let result = sqlx::query("DELETE FROM post WHERE id = $1")
		.bind(post_id)
		.execute(&database)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::UnknownPost(post_id).into());
	}

	tracing::info!(post = %post_id, user = %session.user.id, "post deleted");

	Ok(Json(Acknowledgement::new("post deleted")))
}
