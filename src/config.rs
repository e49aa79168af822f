use std::time::Duration;

use serde::Deserialize;

fn default_port() -> u16 {
	3000
}

fn default_client_url() -> String {
	"http://localhost:5173".into()
}

fn default_smtp_port() -> u16 {
	587
}

fn default_mail_from() -> String {
	"Inkwell <newsletter@inkwell.dev>".into()
}

fn default_send_timeout_secs() -> u64 {
	30
}

fn yes() -> bool {
	true
}

/// Runtime configuration, read from the environment (and `.env`, if present).
///
/// Variable names are the upper-case field names, e.g. `DATABASE_URL` or `SMTP_HOST`.
#[derive(Debug, Deserialize)]
pub struct Config {
	pub database_url: String,
	/// Secret used to sign session tokens.
	pub jwt_secret: String,
	#[serde(default = "default_port")]
	pub port: u16,
	/// Public URL of the site, used to build links in emails.
	#[serde(default = "default_client_url")]
	pub client_url: String,
	/// SMTP relay host. When empty, emails are logged instead of sent.
	#[serde(default)]
	pub smtp_host: String,
	#[serde(default = "default_smtp_port")]
	pub smtp_port: u16,
	pub smtp_username: Option<String>,
	pub smtp_password: Option<String>,
	#[serde(default = "default_mail_from")]
	pub mail_from: String,
	#[serde(default = "default_send_timeout_secs")]
	pub newsletter_send_timeout_secs: u64,
	/// Whether the weekly newsletter scheduler is started with the server.
	#[serde(default = "yes")]
	pub newsletter_enabled: bool,
}

impl Config {
	pub fn from_env() -> Result<Self, envy::Error> {
		dotenvy::dotenv().ok();
		envy::from_env()
	}

	pub fn send_timeout(&self) -> Duration {
		Duration::from_secs(self.newsletter_send_timeout_secs)
	}

	/// Base URL without a trailing slash, so paths can be appended directly.
	pub fn site_url(&self) -> &str {
		self.client_url.trim_end_matches('/')
	}
}

#[cfg(test)]
mod test {
	use super::Config;

	fn parse(vars: &[(&str, &str)]) -> Config {
		envy::from_iter(
			vars.iter()
				.map(|(key, value)| ((*key).to_owned(), (*value).to_owned())),
		)
		.unwrap()
	}

	#[test]
	fn test_defaults() {
		let config = parse(&[
			("DATABASE_URL", "postgres://localhost/inkwell"),
			("JWT_SECRET", "secret"),
		]);

		assert_eq!(config.port, 3000);
		assert_eq!(config.smtp_host, "");
		assert_eq!(config.newsletter_send_timeout_secs, 30);
		assert!(config.newsletter_enabled);
	}

	#[test]
	fn test_site_url_trims_trailing_slash() {
		let config = parse(&[
			("DATABASE_URL", "postgres://localhost/inkwell"),
			("JWT_SECRET", "secret"),
			("CLIENT_URL", "https://inkwell.dev/"),
		]);

		assert_eq!(config.site_url(), "https://inkwell.dev");
	}
}
