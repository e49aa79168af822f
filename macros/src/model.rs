use darling::{ast, FromDeriveInput, FromField};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::{punctuated::Punctuated, Meta, Token};

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

/// Derives that only make sense on the stored row, never on an input body.
const ROW_ONLY_DERIVES: &[&str] = &["FromRow"];

fn has_serde_flag(attr: &syn::Attribute, flags: &[&str]) -> bool {
	let Meta::List(ref list) = attr.meta else {
		return false;
	};

	if !list.path.is_ident("serde") {
		return false;
	}

	list.tokens.to_token_stream().into_iter().any(|token| {
		matches!(token, TokenTree::Ident(ref ident) if flags.iter().any(|flag| ident == flag))
	})
}

fn is_option(ty: &syn::Type) -> bool {
	let syn::Type::Path(path) = ty else {
		return false;
	};

	path.path
		.segments
		.last()
		.is_some_and(|segment| segment.ident == "Option")
}

/// Rebuilds a `#[derive(..)]` attribute without the row-only derives, or
/// returns the attribute unchanged if it is anything else.
fn strip_row_derives(attr: &syn::Attribute) -> Option<syn::Attribute> {
	if !attr.path().is_ident("derive") {
		return Some(attr.clone());
	}

	let paths = attr
		.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
		.ok()?;

	let kept = paths
		.into_iter()
		.filter(|path| {
			path.segments
				.last()
				.map_or(true, |segment| !ROW_ONLY_DERIVES.iter().any(|d| segment.ident == d))
		})
		.collect::<Vec<_>>();

	if kept.is_empty() {
		return None;
	}

	Some(syn::parse_quote!(#[derive(#(#kept),*)]))
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let create_ident = format_ident!("Create{}Input", ident);
	let update_ident = format_ident!("Update{}Input", ident);

	let attrs = receiver
		.attrs
		.iter()
		.filter(|attr| !attr.path().is_ident("sqlx"))
		.filter_map(strip_row_derives)
		.collect::<Vec<_>>();

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(&input, "#[model] only supports structs with named fields")
			.into_compile_error()
			.into();
	};

	// Server-populated fields (#[serde(skip_deserializing)] or #[serde(skip)])
	// never appear in an input body.
	let fields = fields
		.iter()
		.filter_map(|field| {
			let ident = field.ident.as_ref()?;

			if field
				.attrs
				.iter()
				.any(|attr| has_serde_flag(attr, &["skip_deserializing", "skip"]))
			{
				return None;
			}

			let attrs = field
				.attrs
				.iter()
				.filter(|attr| !attr.path().is_ident("sqlx"))
				.collect::<Vec<_>>();

			Some((attrs, ident, &field.ty, &field.vis))
		})
		.collect::<Vec<_>>();

	let create_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		quote! {
			#(#attrs)*
			#vis #ident: #ty,
		}
	});

	// Update inputs drop serde attributes: a missing field already means
	// "unchanged", so defaults would be wrong here.
	let update_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		let attrs = attrs.iter().filter(|attr| !attr.path().is_ident("serde"));
		let ty = if is_option(ty) {
			quote!(#ty)
		} else {
			quote!(Option<#ty>)
		};

		quote! {
			#(#attrs)*
			#vis #ident: #ty,
		}
	});

	quote! {
		#input

		#(#attrs)*
		#vis struct #create_ident #generics {
			#(
				#create_fields
			)*
		}

		#(#attrs)*
		#vis struct #update_ident #generics {
			#(
				#update_fields
			)*
		}
	}
	.into()
}
