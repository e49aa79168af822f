use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_BEARER: &str = "Bearer";
pub const SECURITY_SCHEME_COOKIE: &str = "Cookie";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
	pub const SUBSCRIBER: &str = "Subscriber";
	pub const NEWSLETTER: &str = "Newsletter";
	pub const DOCS: &str = "Docs";
}

fn tag(name: &str, description: &str) -> Tag {
	Tag {
		name: name.into(),
		description: Some(description.into()),
		..Default::default()
	}
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Inkwell API")
		.summary("Blog, comments and weekly newsletter")
		.description(include_str!("../README.md"))
		.tag(tag(tag::AUTH, "Accounts and session tokens"))
		.tag(tag(tag::POST, "Post authoring and reading"))
		.tag(tag(tag::COMMENT, "Post comments"))
		.tag(tag(tag::SUBSCRIBER, "Newsletter subscriptions"))
		.tag(tag(tag::NEWSLETTER, "Weekly newsletter dispatch"))
		.tag(tag(tag::DOCS, "This reference"))
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("JWT".into()),
				description: Some("A session token from /auth/login".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_COOKIE,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("The session token cookie".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				success: false,
				errors: error::Message::new("error message")
					.field("optional field")
					.detail("key", "value")
					.into_vec(),
			})
		})
}
