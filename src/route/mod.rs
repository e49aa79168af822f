use std::sync::Arc;

use aide::{
	axum::{routing::get_with, ApiRouter},
	openapi::OpenApi,
};
use axum::{
	http::{header, HeaderValue, Method},
	Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
	compression::CompressionLayer,
	cors::{AllowOrigin, CorsLayer},
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{openapi, AppState};

pub mod auth;
pub mod comment;
pub mod docs;
pub mod model;
pub mod newsletter;
pub mod post;
pub mod subscriber;

/// Origins that may call the API with credentials: the configured client
/// and the local development server.
fn cors(client_url: &str) -> CorsLayer {
	let origins = [client_url, "http://localhost:5173"]
		.into_iter()
		.filter_map(|origin| HeaderValue::from_str(origin.trim_end_matches('/')).ok())
		.collect::<Vec<_>>();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
		.allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
		.allow_credentials(true)
}

async fn health() -> &'static str {
	"Inkwell API is running"
}

/// Builds the application: every route module, the generated docs and the
/// shared middleware. Rate limiting is layered on by the caller, since it
/// needs the peer address.
pub fn router(state: AppState) -> Router {
	let mut api = OpenApi::default();
	let cors = cors(state.config.site_url());

	ApiRouter::new()
		.nest("/auth", auth::routes())
		.nest("/posts", post::routes())
		.merge(comment::routes())
		.nest("/subscribers", subscriber::routes())
		.nest("/newsletter", newsletter::routes())
		.api_route(
			"/health",
			get_with(health, |op| op.description("Reports that the server is up.")),
		)
		.nest_api_service("/docs", docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http())
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(cors),
		)
		.with_state(state)
}
