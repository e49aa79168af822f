//! Who may delete a comment, and when.
//!
//! Admins may delete any comment at any time. The user who posted a comment
//! may delete it for [`DELETE_WINDOW_SECS`] seconds after it was created.
//! Nobody else may delete it, and comments posted without an account can
//! only be removed by an admin.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::route::auth::model::Role;

pub const DELETE_WINDOW_SECS: i64 = 10;

/// The user attempting an action.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
	pub id: Uuid,
	pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
	#[error("comments can only be deleted within 10 seconds of posting")]
	WindowExpired,
	#[error("Not authorized to delete this comment")]
	NotAuthorized,
}

/// Decides whether `actor` may delete a comment owned by `owner` (if anyone)
/// that was created at `created_at`, as of `now`.
///
/// The window is inclusive: a comment exactly [`DELETE_WINDOW_SECS`] old can
/// still be deleted by its owner.
pub fn authorize_delete(
	actor: &Actor,
	owner: Option<Uuid>,
	created_at: DateTime<Utc>,
	now: DateTime<Utc>,
) -> Result<(), Denial> {
	if actor.role == Role::Admin {
		return Ok(());
	}

	if owner == Some(actor.id) {
		return if now - created_at <= Duration::seconds(DELETE_WINDOW_SECS) {
			Ok(())
		} else {
			Err(Denial::WindowExpired)
		};
	}

	Err(Denial::NotAuthorized)
}

#[cfg(test)]
mod test {
	use chrono::{Duration, TimeZone, Utc};
	use uuid::Uuid;

	use super::{authorize_delete, Actor, Denial};
	use crate::route::auth::model::Role;

	fn actor(role: Role) -> Actor {
		Actor {
			id: Uuid::new_v4(),
			role,
		}
	}

	#[test]
	fn test_owner_within_window() {
		let owner = actor(Role::User);
		let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let now = created_at + Duration::seconds(9);

		assert_eq!(authorize_delete(&owner, Some(owner.id), created_at, now), Ok(()));
	}

	#[test]
	fn test_owner_at_window_boundary() {
		let owner = actor(Role::User);
		let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let now = created_at + Duration::seconds(10);

		assert_eq!(authorize_delete(&owner, Some(owner.id), created_at, now), Ok(()));
	}

	#[test]
	fn test_owner_after_window() {
		let owner = actor(Role::Editor);
		let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let now = created_at + Duration::seconds(11);

		assert_eq!(
			authorize_delete(&owner, Some(owner.id), created_at, now),
			Err(Denial::WindowExpired)
		);
	}

	#[test]
	fn test_admin_any_time() {
		let admin = actor(Role::Admin);
		let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		let now = created_at + Duration::days(365);

		assert_eq!(
			authorize_delete(&admin, Some(Uuid::new_v4()), created_at, now),
			Ok(())
		);
		assert_eq!(authorize_delete(&admin, None, created_at, now), Ok(()));
	}

	#[test]
	fn test_other_user_is_never_allowed() {
		let other = actor(Role::User);
		let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

		assert_eq!(
			authorize_delete(&other, Some(Uuid::new_v4()), created_at, created_at),
			Err(Denial::NotAuthorized)
		);
	}

	#[test]
	fn test_guest_comment_needs_an_admin() {
		let editor = actor(Role::Editor);
		let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

		assert_eq!(
			authorize_delete(&editor, None, created_at, created_at),
			Err(Denial::NotAuthorized)
		);
	}
}
