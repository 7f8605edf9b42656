use proc_macro2::Span;
use syn::{Error, LitStr, Result};

/// A name that can sit between backticks: non-empty, no backtick, no NUL.
pub(crate) fn is_quotable_ident(s: &str) -> bool {
    !s.is_empty() && !s.contains('`') && !s.contains('\0')
}

pub(crate) fn parse_sql_ident(lit: &LitStr, what: &str) -> Result<String> {
    parse_sql_ident_with_span(&lit.value(), lit.span(), what)
}

pub(crate) fn parse_sql_ident_with_span(s: &str, span: Span, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, format!("{what} must not be empty")));
    }
    if !is_quotable_ident(s) {
        return Err(Error::new(
            span,
            format!("{what} must not contain a backtick or NUL character"),
        ));
    }
    Ok(s.to_string())
}
