#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the `TripDesk` crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! tripdesk-derive.workspace = true
//! thiserror.workspace = true
//! ```

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Turns a struct-variant enum into the crate's error type.
///
/// # Generated items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<ErrorName>Ext` trait with `.context(...)` for `Result<T, ErrorName>` and for
///   `Result<T, SourceError>` of every variant that wraps a source error.
/// * `From<SourceError>` for every variant with a `source` field (or a field marked
///   `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * A private `format_context` helper used by the `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Applied to an **enum** with named-field variants only.
/// 2. A variant with a source must also have `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[tripdesk_derive::tripdesk_error]
/// pub enum CatalogError {
///     #[error("Plan payload is malformed{}: {source}", format_context(.context))]
///     Json { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal catalog error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn parse(raw: &str) -> Result<Vec<Plan>, CatalogError> {
///     Ok(serde_json::from_str(raw).context("Decoding plan list")?)
/// }
/// ```
#[proc_macro_attribute]
pub fn tripdesk_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
