//! Backtick-quoted SQL identifiers.
//!
//! Table and column names are validated once at registration; afterwards they are
//! pasted into statements between backticks without further checks.

use crate::error::{OrmError, OrmResult};

/// Validate a table or column name for backtick quoting.
///
/// Rejects empty names and names containing a backtick or NUL, which would break
/// out of the quoted identifier.
pub fn validate(name: &str) -> OrmResult<()> {
    if name.is_empty() {
        return Err(OrmError::InvalidIdent("identifier cannot be empty".to_string()));
    }
    if name.contains('\0') {
        return Err(OrmError::InvalidIdent(format!(
            "identifier '{}' cannot contain NUL character",
            name.replace('\0', "\\0")
        )));
    }
    if name.contains('`') {
        return Err(OrmError::InvalidIdent(format!(
            "identifier '{name}' cannot contain a backtick"
        )));
    }
    Ok(())
}

/// Quote a validated identifier: `name` becomes `` `name` ``.
pub fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    push_quoted(&mut out, name);
    out
}

/// Append a quoted identifier to `buf`.
pub fn push_quoted(buf: &mut String, name: &str) {
    buf.push('`');
    buf.push_str(name);
    buf.push('`');
}
