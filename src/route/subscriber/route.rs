use axum::{
	extract::{Path, State},
	http::StatusCode,
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	mail,
	openapi::tag,
	route::{
		auth::model::Role,
		model::{Acknowledgement, Count},
	},
	AppState, Database,
};

use super::{model, Error, RouteError};

/// Sends the welcome email. Failures are logged and otherwise ignored.
async fn send_welcome(state: &AppState, subscriber: &model::Subscriber, returning: bool) {
	let subject = if returning {
		"Welcome back to Inkwell!"
	} else {
		"Welcome to the Inkwell newsletter"
	};
	let html = match state.templates.welcome(
		state.config.site_url(),
		subscriber.unsubscribe_token,
		returning,
	) {
		Ok(html) => html,
		Err(error) => {
			tracing::error!(subscriber = %subscriber.id, %error, "failed to render welcome email");
			return;
		}
	};

	if let Err(error) = mail::send_within(
		state.mailer.as_ref(),
		state.config.send_timeout(),
		&subscriber.email,
		subject,
		&html,
	)
	.await
	{
		tracing::warn!(subscriber = %subscriber.id, %error, "failed to send welcome email");
	}
}

/// Subscribe
/// Subscribes an email address to the weekly newsletter and sends a welcome email. An address that unsubscribed earlier is reactivated.
#[route(
	tag = tag::SUBSCRIBER,
	response(status = 201, description = "Subscribed.", shape = "Json<model::Subscribed>"),
	response(status = 200, description = "Subscribed again after unsubscribing.", shape = "Json<model::Subscribed>")
)]
pub async fn subscribe(
	State(state): State<AppState>,
	Json(input): Json<model::SubscribeInput>,
) -> Result<(StatusCode, Json<model::Subscribed>), RouteError> {
	let email = input.email.to_lowercase();
	let existing = sqlx::query_as::<_, model::Subscriber>("SELECT * FROM subscriber WHERE email = $1")
		.bind(&email)
		.fetch_optional(&state.database)
		.await?;

	match existing {
		Some(subscriber) if subscriber.is_active => Err(Error::AlreadySubscribed.into()),
		Some(subscriber) => {
			let subscriber = sqlx::query_as::<_, model::Subscriber>(
				"UPDATE subscriber SET is_active = TRUE WHERE id = $1 RETURNING *",
			)
			.bind(subscriber.id)
			.fetch_one(&state.database)
			.await?;

			tracing::info!(subscriber = %subscriber.id, "subscriber reactivated");
			send_welcome(&state, &subscriber, true).await;

			Ok((
				StatusCode::OK,
				Json(model::Subscribed {
					success: true,
					message: "Welcome back! You have been re-subscribed.".into(),
					subscriber,
				}),
			))
		}
		None => {
			let subscriber = sqlx::query_as::<_, model::Subscriber>(
				"INSERT INTO subscriber (email) VALUES ($1) RETURNING *",
			)
			.bind(&email)
			.fetch_one(&state.database)
			.await
			.map_err(|e| match e {
				sqlx::Error::Database(ref d) if d.constraint() == Some("subscriber_email_key") => {
					Error::AlreadySubscribed.into()
				}
				e => RouteError::from(e),
			})?;

			tracing::info!(subscriber = %subscriber.id, "new subscriber");
			send_welcome(&state, &subscriber, false).await;

			Ok((
				StatusCode::CREATED,
				Json(model::Subscribed {
					success: true,
					message: "Subscribed successfully.".into(),
					subscriber,
				}),
			))
		}
	}
}

/// Unsubscribe
/// Stops the newsletter for the address holding this token, which comes from the link in every email.
#[route(tag = tag::SUBSCRIBER)]
pub async fn unsubscribe(
	State(database): State<Database>,
	Path(token): Path<String>,
) -> Result<Json<Acknowledgement>, RouteError> {
	let token = Uuid::parse_str(&token).map_err(|_| Error::InvalidToken)?;
	let result = sqlx::query("UPDATE subscriber SET is_active = FALSE WHERE unsubscribe_token = $1")
		.bind(token)
		.execute(&database)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::InvalidToken.into());
	}

	Ok(Json(Acknowledgement::new("Unsubscribed successfully")))
}

/// Get subscribers
/// Returns every subscriber, active or not, newest first. Requires the admin or editor role.
#[route(tag = tag::SUBSCRIBER)]
pub async fn get_subscribers(
	State(database): State<Database>,
	session: Session,
) -> Result<Json<Vec<model::Subscriber>>, RouteError> {
	session.require(&[Role::Admin, Role::Editor])?;

	let subscribers = sqlx::query_as::<_, model::Subscriber>(
		"SELECT * FROM subscriber ORDER BY created_at DESC",
	)
	.fetch_all(&database)
	.await?;

	Ok(Json(subscribers))
}

/// Count subscribers
/// Returns the number of active subscribers.
#[route(tag = tag::SUBSCRIBER)]
pub async fn count_subscribers(State(database): State<Database>) -> Result<Json<Count>, RouteError> {
	let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriber WHERE is_active")
		.fetch_one(&database)
		.await?;

	Ok(Json(Count { count }))
}
