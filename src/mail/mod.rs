pub mod template;

use std::time::Duration;

use lettre::{
	message::{header::ContentType, Mailbox},
	transport::smtp::authentication::Credentials,
	AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::Config;

/// A failed delivery.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid address: {0}")]
	Address(#[from] lettre::address::AddressError),
	#[error("could not build message: {0}")]
	Message(#[from] lettre::error::Error),
	#[error("smtp transport error: {0}")]
	Transport(#[from] lettre::transport::smtp::Error),
	#[error("delivery timed out after {0:?}")]
	Timeout(Duration),
}

/// Sends a single HTML email.
#[axum::async_trait]
pub trait Mailer: Send + Sync {
	async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), Error>;
}

/// Delivers mail through an SMTP relay over STARTTLS.
///
/// Without a configured host the mailer only logs what it would have sent.
pub struct SmtpMailer {
	transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
	from: Mailbox,
}

impl SmtpMailer {
	pub fn new(config: &Config) -> Result<Self, Error> {
		let from = config.mail_from.parse::<Mailbox>()?;

		if config.smtp_host.trim().is_empty() {
			tracing::warn!("SMTP_HOST is not set, emails will be logged instead of sent");

			return Ok(Self {
				transport: None,
				from,
			});
		}

		let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
			.port(config.smtp_port);

		if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
		}

		Ok(Self {
			transport: Some(builder.build()),
			from,
		})
	}

	pub fn is_enabled(&self) -> bool {
		self.transport.is_some()
	}
}

#[axum::async_trait]
impl Mailer for SmtpMailer {
	async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), Error> {
		let recipient = to.parse::<Mailbox>()?;

		let Some(transport) = &self.transport else {
			tracing::info!(to, subject, "mail transport disabled, skipping send");
			return Ok(());
		};

		let message = Message::builder()
			.from(self.from.clone())
			.to(recipient)
			.subject(subject)
			.header(ContentType::TEXT_HTML)
			.body(html.to_owned())?;

		transport.send(message).await?;

		tracing::debug!(to, subject, "mail sent");

		Ok(())
	}
}

/// Sends a message, giving up after `timeout`.
pub async fn send_within(
	mailer: &dyn Mailer,
	timeout: Duration,
	to: &str,
	subject: &str,
	html: &str,
) -> Result<(), Error> {
	tokio::time::timeout(timeout, mailer.send(to, subject, html))
		.await
		.map_err(|_| Error::Timeout(timeout))?
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use super::{send_within, Error, Mailer};

	struct Stalled;

	#[axum::async_trait]
	impl Mailer for Stalled {
		async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<(), Error> {
			std::future::pending().await
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_send_within_times_out() {
		let result = send_within(
			&Stalled,
			Duration::from_secs(30),
			"jane@inkwell.dev",
			"Hello",
			"<p>Hi</p>",
		)
		.await;

		assert!(matches!(result, Err(Error::Timeout(timeout)) if timeout == Duration::from_secs(30)));
	}

	#[tokio::test]
	async fn test_disabled_transport_is_a_no_op() {
		let config = envy::from_iter::<_, crate::config::Config>([
			("DATABASE_URL".to_owned(), "postgres://localhost/inkwell".to_owned()),
			("JWT_SECRET".to_owned(), "secret".to_owned()),
		])
		.unwrap();
		let mailer = super::SmtpMailer::new(&config).unwrap();

		assert!(!mailer.is_enabled());
		assert!(mailer.send("jane@inkwell.dev", "Hello", "<p>Hi</p>").await.is_ok());
		assert!(matches!(
			mailer.send("not an address", "Hello", "<p>Hi</p>").await,
			Err(Error::Address(..))
		));
	}
}
