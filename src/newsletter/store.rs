use chrono::{DateTime, Utc};

use crate::{
	route::{post::model::Post, subscriber::model::Subscriber},
	Database,
};

/// Where the weekly digest reads its posts and audience from.
#[axum::async_trait]
pub trait DigestSource: Send + Sync {
	/// Up to `limit` posts created at or after `since`, newest first.
	async fn recent_posts(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Post>, sqlx::Error>;

	async fn active_subscribers(&self) -> Result<Vec<Subscriber>, sqlx::Error>;
}

#[axum::async_trait]
impl DigestSource for Database {
	async fn recent_posts(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Post>, sqlx::Error> {
		sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE created_at >= $1
				ORDER BY created_at DESC
				LIMIT $2
			"#,
		)
		.bind(since)
		.bind(limit)
		.fetch_all(self)
		.await
	}

	async fn active_subscribers(&self) -> Result<Vec<Subscriber>, sqlx::Error> {
		sqlx::query_as::<_, Subscriber>(
			"SELECT * FROM subscriber WHERE is_active ORDER BY created_at",
		)
		.fetch_all(self)
		.await
	}
}
