#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod mail;
mod newsletter;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use argon2::Argon2;
use sqlx::postgres::PgPoolOptions;
use tower_governor::GovernorLayer;

use crate::{
	config::Config,
	mail::{template::Templates, Mailer, SmtpMailer},
	newsletter::{
		scheduler::{Scheduler, WeeklySlot},
		Newsletter,
	},
};

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as a database connection pool, a hash configuration (if it's expensive to create),
/// or a mail transport.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub keys: session::Keys,
	pub mailer: Arc<dyn Mailer>,
	pub templates: Arc<Templates>,
	pub scheduler: Arc<Scheduler<Database>>,
	pub config: Arc<Config>,
}

impl State {
	/// Wires the newsletter job and its scheduler to the given store and mailer.
	pub fn new(
		database: Database,
		mailer: Arc<dyn Mailer>,
		templates: Arc<Templates>,
		config: Config,
	) -> Self {
		let job = Newsletter::new(
			database.clone(),
			mailer.clone(),
			templates.clone(),
			config.site_url(),
			config.send_timeout(),
		);

		Self {
			keys: session::Keys::new(config.jwt_secret.as_bytes()),
			scheduler: Arc::new(Scheduler::new(job, WeeklySlot::monday_morning())),
			hasher: Argon2::default(),
			config: Arc::new(config),
			database,
			mailer,
			templates,
		}
	}
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() {
	trace::init_tracing_subscriber();

	let config = Config::from_env().expect("failed to read configuration from the environment");

	let database = PgPoolOptions::new()
		.max_connections(10)
		.connect(&config.database_url)
		.await
		.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let mailer = SmtpMailer::new(&config).expect("invalid mail configuration");

	tracing::info!(enabled = mailer.is_enabled(), "mail transport configured");

	let port = config.port;
	let newsletter_enabled = config.newsletter_enabled;
	let templates = Templates::new().expect("invalid email templates");
	let state = State::new(database, Arc::new(mailer), Arc::new(templates), config);
	let scheduler = state.scheduler.clone();

	if newsletter_enabled {
		scheduler.start().await;
	}

	let governor = ratelimit::default().expect("invalid rate limit configuration");

	ratelimit::cleanup_old_limits(&[&governor]);

	let app = route::router(state).layer(GovernorLayer { config: governor });

	let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", port);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await
	.expect("server error");

	scheduler.stop().await;
}
