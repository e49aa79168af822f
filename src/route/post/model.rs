pub use crate::route::model::Paginate;

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const EXCERPT_MAX_CHARS: usize = 500;
pub const DEFAULT_AUTHOR: &str = "AI Editorial Team";
pub const DEFAULT_FEATURED_IMAGE: &str = "https://via.placeholder.com/800x400?text=Inkwell";

fn default_author() -> String {
	DEFAULT_AUTHOR.into()
}

fn default_featured_image() -> String {
	DEFAULT_FEATURED_IMAGE.into()
}

fn yes() -> bool {
	true
}

/// The closed set of post categories.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type,
)]
#[sqlx(type_name = "post_category")]
pub enum Category {
	#[serde(rename = "AI News")]
	#[sqlx(rename = "AI News")]
	AiNews,
	#[serde(rename = "AI Tools")]
	#[sqlx(rename = "AI Tools")]
	AiTools,
	#[serde(rename = "AI Employees")]
	#[sqlx(rename = "AI Employees")]
	AiEmployees,
	#[serde(rename = "Machine Learning")]
	#[sqlx(rename = "Machine Learning")]
	MachineLearning,
	Ethics,
	Tutorials,
	Opinion,
}

/// A single post.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that created the post.
	#[serde(skip_deserializing)]
	pub user_id: Option<Uuid>,
	/// The title of the post.
	#[validate(length(min = 3, max = 100))]
	pub title: String,
	/// The URL-safe identifier derived from the title.
	#[serde(skip_deserializing)]
	pub slug: String,
	/// The content of the post in Markdown format.
	#[validate(length(min = 1))]
	pub content: String,
	/// A short summary. Longer input is truncated.
	pub excerpt: Option<String>,
	/// The byline shown on the post.
	#[serde(default = "default_author")]
	#[validate(length(min = 1, max = 64))]
	pub author: String,
	pub category: Category,
	#[serde(default)]
	pub tags: Vec<String>,
	/// The URL of the header image.
	#[serde(default = "default_featured_image")]
	#[validate(length(min = 1, max = 2048))]
	pub featured_image: String,
	#[serde(default = "yes")]
	pub is_published: bool,
	/// How many times the post has been read.
	#[serde(skip_deserializing)]
	pub views: i64,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Filters for listing posts.
#[derive(Deserialize, Validate, JsonSchema)]
pub struct PostFilter {
	/// Only return posts in this category.
	pub category: Option<Category>,
	/// Case-insensitive text matched against the title and content.
	#[validate(length(min = 1, max = 100))]
	pub search: Option<String>,
}

impl PostFilter {
	/// The `ILIKE` pattern for the search text, with wildcards escaped.
	pub fn search_pattern(&self) -> Option<String> {
		self.search.as_ref().map(|search| {
			let escaped = search
				.replace('\\', "\\\\")
				.replace('%', "\\%")
				.replace('_', "\\_");

			format!("%{escaped}%")
		})
	}
}

/// Truncates an excerpt to [`EXCERPT_MAX_CHARS`], ending it with an ellipsis.
pub fn truncate_excerpt(excerpt: String) -> String {
	if excerpt.chars().count() <= EXCERPT_MAX_CHARS {
		return excerpt;
	}

	let mut truncated = excerpt
		.chars()
		.take(EXCERPT_MAX_CHARS - 3)
		.collect::<String>();

	truncated.push_str("...");
	truncated
}

/// The slug for the `attempt`-th try at a unique slug: the base itself, then
/// `base-1`, `base-2`, ...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
	if attempt == 0 {
		base.to_owned()
	} else {
		format!("{base}-{attempt}")
	}
}

/// The slug for a title, before disambiguation.
pub fn base_slug(title: &str) -> String {
	let slug = slug::slugify(title);

	if slug.is_empty() {
		"post".into()
	} else {
		slug
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_short_excerpt_is_untouched() {
		assert_eq!(truncate_excerpt("short".into()), "short");
	}

	#[test]
	fn test_long_excerpt_is_truncated() {
		let excerpt = truncate_excerpt("a".repeat(600));

		assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS);
		assert!(excerpt.ends_with("..."));
	}

	#[test]
	fn test_slug_candidates() {
		assert_eq!(slug_candidate("hello-world", 0), "hello-world");
		assert_eq!(slug_candidate("hello-world", 1), "hello-world-1");
		assert_eq!(slug_candidate("hello-world", 2), "hello-world-2");
	}

	#[test]
	fn test_base_slug() {
		assert_eq!(base_slug("Hello, World!"), "hello-world");
		assert_eq!(base_slug("!!!"), "post");
	}

	#[test]
	fn test_search_pattern_escapes_wildcards() {
		let filter = PostFilter {
			category: None,
			search: Some("100%_sure".into()),
		};

		assert_eq!(filter.search_pattern().unwrap(), "%100\\%\\_sure%");
	}

	#[test]
	fn test_category_uses_display_names() {
		let category: Category = serde_json::from_str("\"Machine Learning\"").unwrap();

		assert_eq!(category, Category::MachineLearning);
		assert_eq!(serde_json::to_string(&Category::AiNews).unwrap(), "\"AI News\"");
	}

	#[test]
	fn test_create_input_defaults() {
		let input: CreatePostInput = serde_json::from_value(serde_json::json!({
			"title": "Hello",
			"content": "Body",
			"category": "Ethics",
		}))
		.unwrap();

		assert_eq!(input.author, DEFAULT_AUTHOR);
		assert_eq!(input.featured_image, DEFAULT_FEATURED_IMAGE);
		assert!(input.is_published);
		assert!(input.tags.is_empty());
		assert!(input.excerpt.is_none());
	}

	#[test]
	fn test_update_input_is_partial() {
		let input: UpdatePostInput =
			serde_json::from_value(serde_json::json!({ "title": "New title" })).unwrap();

		assert_eq!(input.title.as_deref(), Some("New title"));
		assert!(input.author.is_none());
		assert!(input.is_published.is_none());
	}
}
