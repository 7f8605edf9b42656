//! Attribute parsing for Model derive macro.
//!
//! Handles parsing of struct-level and field-level `#[orm(...)]` attributes.

use crate::sql_ident::parse_sql_ident;
use syn::{DeriveInput, LitStr, Result};

/// Parsed field-level `#[orm(...)]` flags, merged over every `orm` attribute.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub primary: bool,
    pub auto_increment: bool,
    pub omit: bool,
    pub column: Option<LitStr>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        // Comma-separated flags or `key = "value"` pairs
        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "id" || ident == "primary" {
                attr.primary = true;
            } else if ident == "auto_increment" {
                attr.auto_increment = true;
            } else if ident == "omit" {
                attr.omit = true;
            } else if ident == "column" {
                let _: syn::Token![=] = input.parse()?;
                attr.column = Some(input.parse()?);
            } else {
                return Err(syn::Error::new(
                    ident.span(),
                    format!(
                        "unknown field attribute `{ident}` (expected id, primary, auto_increment, omit or column)"
                    ),
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

impl FieldAttr {
    fn merge(&mut self, other: FieldAttr) {
        self.primary |= other.primary;
        self.auto_increment |= other.auto_increment;
        self.omit |= other.omit;
        if other.column.is_some() {
            self.column = other.column;
        }
    }
}

/// Collect the `#[orm(...)]` attributes of one field.
pub(super) fn get_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in &field.attrs {
        if attr.path().is_ident("orm") {
            out.merge(attr.parse_args::<FieldAttr>()?);
        }
    }
    Ok(out)
}

/// Extract the table name from struct-level `#[orm(table = "...")]`, if present.
pub(super) fn get_table_name(input: &DeriveInput) -> Result<Option<String>> {
    let mut table = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested = attr.parse_args::<syn::MetaNameValue>()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "unknown struct attribute (expected `table = \"...\"`)",
            ));
        }
        let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        else {
            return Err(syn::Error::new_spanned(
                &nested.value,
                "table name must be a string literal",
            ));
        };
        table = Some(parse_sql_ident(lit, "table name")?);
    }
    Ok(table)
}
