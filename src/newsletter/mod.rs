//! The weekly newsletter: pick the week's posts and mail them to every
//! active subscriber, fifty at a time.

pub mod scheduler;
pub mod store;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use schemars::JsonSchema;
use serde::Serialize;
use tokio::sync::Mutex;

pub use store::DigestSource;

use crate::{
	mail::{self, template::Templates, Mailer},
	route::{post::model::Post, subscriber::model::Subscriber},
};

/// Recipients mailed concurrently before waiting for the batch to settle.
pub const BATCH_SIZE: usize = 50;
/// The most posts a single digest lists.
pub const DIGEST_LIMIT: i64 = 5;
pub const LOOKBACK_DAYS: i64 = 7;
pub const SUBJECT: &str = "Inkwell Weekly: Top Stories";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("could not read the digest from the store: {0}")]
	Store(#[from] sqlx::Error),
}

/// Totals for a run that reached the sending stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Report {
	/// Posts in the digest.
	pub posts: usize,
	/// Active subscribers at the time of the run.
	pub recipients: usize,
	pub batches: usize,
	pub sent: usize,
	pub failed: usize,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
	/// Another run was already in flight.
	Skipped,
	/// Nothing was published in the lookback window, so nothing was sent.
	NoPosts,
	Completed(Report),
}

/// The newsletter job. At most one run is in flight at a time.
pub struct Newsletter<S> {
	source: S,
	mailer: Arc<dyn Mailer>,
	templates: Arc<Templates>,
	site_url: String,
	send_timeout: Duration,
	in_flight: Mutex<()>,
}

impl<S: DigestSource> Newsletter<S> {
	pub fn new(
		source: S,
		mailer: Arc<dyn Mailer>,
		templates: Arc<Templates>,
		site_url: impl Into<String>,
		send_timeout: Duration,
	) -> Self {
		Self {
			source,
			mailer,
			templates,
			site_url: site_url.into(),
			send_timeout,
			in_flight: Mutex::new(()),
		}
	}

	/// Runs the job as of `now`.
	///
	/// A failed or timed out send is logged and counted, never retried. A store
	/// failure aborts the run before anything is sent.
	pub async fn run(&self, now: DateTime<Utc>) -> Result<Outcome, Error> {
		let Ok(_guard) = self.in_flight.try_lock() else {
			tracing::warn!("newsletter run already in flight, skipping");
			return Ok(Outcome::Skipped);
		};

		let since = now - chrono::Duration::days(LOOKBACK_DAYS);
		let posts = self.source.recent_posts(since, DIGEST_LIMIT).await?;

		if posts.is_empty() {
			tracing::info!(%since, "no posts published this week, skipping newsletter");
			return Ok(Outcome::NoPosts);
		}

		let subscribers = self.source.active_subscribers().await?;
		let mut report = Report {
			posts: posts.len(),
			recipients: subscribers.len(),
			batches: 0,
			sent: 0,
			failed: 0,
		};

		tracing::info!(
			posts = report.posts,
			recipients = report.recipients,
			"sending newsletter"
		);

		for batch in subscribers.chunks(BATCH_SIZE) {
			let delivered = join_all(batch.iter().map(|subscriber| self.deliver(&posts, subscriber))).await;
			let sent = delivered.iter().filter(|ok| **ok).count();

			report.batches += 1;
			report.sent += sent;
			report.failed += delivered.len() - sent;

			tracing::debug!(batch = report.batches, sent, size = batch.len(), "newsletter batch settled");
		}

		tracing::info!(
			sent = report.sent,
			failed = report.failed,
			batches = report.batches,
			"newsletter sent"
		);

		Ok(Outcome::Completed(report))
	}

	async fn deliver(&self, posts: &[Post], subscriber: &Subscriber) -> bool {
		let html = match self
			.templates
			.weekly(&self.site_url, posts, subscriber.unsubscribe_token)
		{
			Ok(html) => html,
			Err(error) => {
				tracing::error!(subscriber = %subscriber.id, %error, "failed to render newsletter");
				return false;
			}
		};

		match mail::send_within(
			self.mailer.as_ref(),
			self.send_timeout,
			&subscriber.email,
			SUBJECT,
			&html,
		)
		.await
		{
			Ok(()) => true,
			Err(error) => {
				tracing::warn!(subscriber = %subscriber.id, %error, "newsletter delivery failed");
				false
			}
		}
	}
}
