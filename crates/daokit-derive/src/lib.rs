//! Derive macros for daokit
//!
//! Provides `#[derive(Model)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod model;
mod sql_ident;

/// Derive `daokit::Model` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use daokit::Model;
///
/// #[derive(Debug, Default, Model)]
/// #[orm(table = "users")]
/// struct UserInfo {
///     #[orm(primary, auto_increment)]
///     id: i64,
///     name: String,
///     #[orm(column = "b")]
///     birth: Option<chrono::NaiveDate>,
///     #[orm(omit)]
///     cached_score: f64,
/// }
/// ```
///
/// # Generated
///
/// - `NAME` / `TABLE` constants
/// - `fields()`: one `FieldDef` per field, in declaration order
/// - `field_value` / `set_field`: positional access through `ToValue` / `FromValue`
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (default: snake_case of the struct name)
/// - `#[orm(primary)]` or `#[orm(id)]` - Mark field as (part of) the primary key
/// - `#[orm(auto_increment)]` - Key generated by the database
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(omit)]` - Not mapped; the field only needs `Default`
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
