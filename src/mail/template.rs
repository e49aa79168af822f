//! HTML bodies for the newsletter emails, rendered with `tera`.
//!
//! The templates are compiled into the binary. Their names end in `.html`, so
//! every interpolated value is HTML-escaped unless a template marks it `safe`.
//! Only URLs built here from the configured site URL, a slug or a token are.

use serde::Serialize;
use tera::{Context, Tera};
use uuid::Uuid;

use crate::route::post::model::Post;

pub const TEASER_CHARS: usize = 150;

const LAYOUT: &str = "layout.html";
const WEEKLY: &str = "weekly.html";
const WELCOME: &str = "welcome.html";

pub fn unsubscribe_url(site_url: &str, token: Uuid) -> String {
	format!("{site_url}/unsubscribe/{token}")
}

pub fn post_url(site_url: &str, slug: &str) -> String {
	format!("{site_url}/blog/{slug}")
}

/// The first [`TEASER_CHARS`] characters of the excerpt (or the content, if
/// the post has no excerpt), followed by an ellipsis.
pub fn teaser(post: &Post) -> String {
	let source = post
		.excerpt
		.as_deref()
		.filter(|excerpt| !excerpt.is_empty())
		.unwrap_or(&post.content);

	let mut teaser = source.chars().take(TEASER_CHARS).collect::<String>();

	teaser.push_str("...");
	teaser
}

/// One post as the digest shows it.
#[derive(Serialize)]
struct DigestEntry<'a> {
	title: &'a str,
	url: String,
	teaser: String,
	image: &'a str,
}

/// The compiled email templates.
pub struct Templates {
	tera: Tera,
}

impl Templates {
	pub fn new() -> Result<Self, tera::Error> {
		let mut tera = Tera::default();

		tera.add_raw_templates(vec![
			(LAYOUT, include_str!("../../templates/email/layout.html")),
			(WEEKLY, include_str!("../../templates/email/weekly.html")),
			(WELCOME, include_str!("../../templates/email/welcome.html")),
		])?;

		Ok(Self { tera })
	}

	/// The weekly digest of `posts` for the subscriber holding `token`.
	pub fn weekly(&self, site_url: &str, posts: &[Post], token: Uuid) -> Result<String, tera::Error> {
		let entries = posts
			.iter()
			.map(|post| DigestEntry {
				title: &post.title,
				url: post_url(site_url, &post.slug),
				teaser: teaser(post),
				image: &post.featured_image,
			})
			.collect::<Vec<_>>();

		let mut context = Context::new();

		context.insert("posts", &entries);
		context.insert("site_url", site_url);
		context.insert("unsubscribe_url", &unsubscribe_url(site_url, token));

		self.tera.render(WEEKLY, &context)
	}

	/// The email sent on subscribing, or on subscribing again after leaving.
	pub fn welcome(&self, site_url: &str, token: Uuid, returning: bool) -> Result<String, tera::Error> {
		let mut context = Context::new();

		context.insert("returning", &returning);
		context.insert("site_url", site_url);
		context.insert("unsubscribe_url", &unsubscribe_url(site_url, token));

		self.tera.render(WELCOME, &context)
	}
}

#[cfg(test)]
pub(crate) mod test {
	use chrono::Utc;
	use uuid::Uuid;

	use super::{teaser, Templates, TEASER_CHARS};
	use crate::route::post::model::{Category, Post};

	pub fn post(title: &str, slug: &str) -> Post {
		Post {
			id: Uuid::new_v4(),
			user_id: None,
			title: title.into(),
			slug: slug.into(),
			content: "Body of the post.".into(),
			excerpt: None,
			author: "Jane".into(),
			category: Category::AiNews,
			tags: Vec::new(),
			featured_image: "https://inkwell.dev/image.png".into(),
			is_published: true,
			views: 0,
			created_at: Utc::now(),
		}
	}

	pub fn templates() -> Templates {
		Templates::new().unwrap()
	}

	#[test]
	fn test_teaser_prefers_excerpt() {
		let mut post = post("Title", "title");

		assert_eq!(teaser(&post), "Body of the post....");

		post.excerpt = Some("Short summary".into());
		assert_eq!(teaser(&post), "Short summary...");

		post.excerpt = Some("x".repeat(400));
		assert_eq!(teaser(&post).chars().count(), TEASER_CHARS + 3);
	}

	#[test]
	fn test_weekly_links() {
		let token = Uuid::new_v4();
		let html = templates()
			.weekly(
				"https://inkwell.dev",
				&[post("First", "first-post"), post("Second", "second")],
				token,
			)
			.unwrap();

		assert!(html.contains(r#"href="https://inkwell.dev/blog/first-post""#));
		assert!(html.contains(r#"href="https://inkwell.dev/blog/second""#));
		assert!(html.contains(&format!(r#"href="https://inkwell.dev/unsubscribe/{token}""#)));
		assert!(html.contains("Inkwell Weekly"));
	}

	#[test]
	fn test_weekly_escapes_post_fields() {
		let mut post = post(r#"Tom & "Jerry" <script>"#, "tom-jerry");

		post.excerpt = Some("<b>bold</b>".into());

		let html = templates()
			.weekly("https://inkwell.dev", &[post], Uuid::new_v4())
			.unwrap();

		assert!(html.contains("Tom &amp; &quot;Jerry&quot; &lt;script&gt;"));
		assert!(html.contains("&lt;b&gt;bold&lt;&#x2F;b&gt;..."));
		assert!(!html.contains("<script>"));
		assert!(!html.contains("<b>"));
	}

	#[test]
	fn test_welcome_back() {
		let token = Uuid::new_v4();
		let templates = templates();

		let returning = templates.welcome("https://inkwell.dev", token, true).unwrap();
		let first = templates.welcome("https://inkwell.dev", token, false).unwrap();

		assert!(returning.contains("Welcome back"));
		assert!(!first.contains("Welcome back"));
		assert!(first.contains("Thanks for subscribing"));
		assert!(first.contains(&format!("https://inkwell.dev/unsubscribe/{token}")));
	}
}
