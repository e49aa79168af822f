mod model;
mod route;

use proc_macro::TokenStream;

/// Generates an OpenAPI transform for a handler, named after the handler with the
/// suffix `_docs`. The first doc line becomes the summary, the rest the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Generates `CreateXInput` and `UpdateXInput` request bodies for a stored model.
///
/// Fields marked `#[serde(skip_deserializing)]` or `#[serde(skip)]` are server-populated
/// and left out of both. `sqlx` derives and attributes are dropped. Update inputs wrap every
/// field in `Option` (fields that already are optional are kept as-is).
#[proc_macro_attribute]
pub fn model(_args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(input)
}
