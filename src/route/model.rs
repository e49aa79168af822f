//! Request and response shapes shared by several route modules.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

fn first_page() -> i64 {
	1
}

fn default_page_size() -> i64 {
	DEFAULT_PAGE_SIZE
}

/// Page-based pagination for list endpoints.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return, starting at 1.
	#[validate(range(min = 1, max = 1000))]
	#[serde(default = "first_page")]
	pub page: i64,
	/// The number of items per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "default_page_size")]
	pub size: i64,
}

impl Paginate {
	pub fn offset(&self) -> i64 {
		(self.page - 1) * self.size
	}

	pub fn limit(&self) -> i64 {
		self.size
	}
}

/// The body of endpoints that only report success.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Acknowledgement {
	pub success: bool,
	pub message: String,
}

impl Acknowledgement {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			success: true,
			message: message.into(),
		}
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct Count {
	pub count: i64,
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::{Paginate, DEFAULT_PAGE_SIZE};

	#[test]
	fn test_paginate_defaults() {
		let paginate: Paginate = serde_json::from_str("{}").unwrap();

		assert_eq!(paginate.page, 1);
		assert_eq!(paginate.limit(), DEFAULT_PAGE_SIZE);
		assert_eq!(paginate.offset(), 0);
	}

	#[test]
	fn test_paginate_offset() {
		let paginate = Paginate { page: 3, size: 25 };

		assert_eq!(paginate.offset(), 50);
		assert_eq!(paginate.limit(), 25);
	}

	#[test]
	fn test_paginate_bounds() {
		assert!(Paginate { page: 0, size: 10 }.validate().is_err());
		assert!(Paginate { page: 1, size: 101 }.validate().is_err());
		assert!(Paginate { page: 1000, size: 100 }.validate().is_ok());
	}
}
