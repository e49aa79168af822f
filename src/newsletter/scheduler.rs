use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use tokio::{
	sync::{watch, Mutex},
	task::JoinHandle,
};

use super::{DigestSource, Error, Newsletter, Outcome};

/// A weekly wall-clock instant in UTC, such as Monday 09:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySlot {
	weekday: Weekday,
	time: NaiveTime,
}

impl WeeklySlot {
	/// Monday, 09:00 UTC.
	pub fn monday_morning() -> Self {
		Self {
			weekday: Weekday::Mon,
			time: NaiveTime::MIN + Duration::hours(9),
		}
	}

	/// The first slot strictly after `t`.
	pub fn next_after(&self, t: DateTime<Utc>) -> DateTime<Utc> {
		let date = t.date_naive();
		let days_ahead = (7 + self.weekday.num_days_from_monday()
			- date.weekday().num_days_from_monday())
			% 7;

		let candidate = Utc.from_utc_datetime(
			&(date + Duration::days(i64::from(days_ahead))).and_time(self.time),
		);

		if candidate > t {
			candidate
		} else {
			candidate + Duration::weeks(1)
		}
	}
}

/// Owns the weekly trigger of the newsletter job.
///
/// Stopping is final: a stopped scheduler cannot be started again.
pub struct Scheduler<S> {
	job: Arc<Newsletter<S>>,
	slot: WeeklySlot,
	shutdown: watch::Sender<bool>,
	handle: Mutex<Option<JoinHandle<()>>>,
}

impl<S: DigestSource + 'static> Scheduler<S> {
	pub fn new(job: Newsletter<S>, slot: WeeklySlot) -> Self {
		let (shutdown, _) = watch::channel(false);

		Self {
			job: Arc::new(job),
			slot,
			shutdown,
			handle: Mutex::new(None),
		}
	}

	/// Spawns the scheduling loop. Does nothing if it is already running.
	pub async fn start(&self) {
		let mut handle = self.handle.lock().await;

		if handle.is_some() {
			return;
		}

		let job = self.job.clone();
		let slot = self.slot;
		let shutdown = self.shutdown.subscribe();

		*handle = Some(tokio::spawn(run_loop(job, slot, shutdown)));

		tracing::info!(?slot, "newsletter scheduler started");
	}

	/// Stops the loop and waits for it to exit. A run already started through
	/// [`Scheduler::trigger`] is not interrupted.
	pub async fn stop(&self) {
		self.shutdown.send_replace(true);

		if let Some(handle) = self.handle.lock().await.take() {
			if let Err(error) = handle.await {
				tracing::error!(%error, "newsletter scheduler panicked");
			}
		}

		tracing::info!("newsletter scheduler stopped");
	}

	/// Runs the job now, outside the schedule.
	pub async fn trigger(&self) -> Result<Outcome, Error> {
		self.job.run(Utc::now()).await
	}
}

async fn run_loop<S: DigestSource>(
	job: Arc<Newsletter<S>>,
	slot: WeeklySlot,
	mut shutdown: watch::Receiver<bool>,
) {
	let mut after = Utc::now();

	loop {
		let next = slot.next_after(after);
		let wait = (next - Utc::now()).to_std().unwrap_or_default();

		tracing::info!(%next, "next newsletter run scheduled");

		tokio::select! {
			() = tokio::time::sleep(wait) => {}
			_ = shutdown.wait_for(|stop| *stop) => break,
		}

		match job.run(Utc::now()).await {
			Ok(outcome) => tracing::info!(?outcome, "scheduled newsletter run finished"),
			Err(error) => tracing::error!(%error, "scheduled newsletter run failed"),
		}

		after = next.max(Utc::now());
	}
}
