//! Statement compilers.
//!
//! Every compiler is a pure function of a [`ModelRegistry`](crate::ModelRegistry)
//! and its inputs: it renders backtick-quoted MySQL-style SQL with `?` placeholders
//! and returns the arguments in exactly the order the placeholders appear.
//!
//! - [`compile`]: condition tree → `where ... order by ... limit o, n`
//! - [`select`]: projection + condition tree → SELECT / aggregate statements
//! - [`insert`]: INSERT / INSERT IGNORE / REPLACE with repeated value groups
//! - [`update`]: full-row UPDATE and entry-based partial UPDATE
//! - [`delete`]: guarded DELETE
//!
//! ```ignore
//! use daokit::{qb, Query};
//!
//! let stmt = qb::delete::delete_by(&registry, &Query::new().in_list("Id", [1, 2]))?;
//! assert_eq!(stmt.sql, "delete from `user_info` where `id` in (?, ?)");
//! ```

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;
mod where_clause;

pub use delete::{delete_all, delete_by};
pub use insert::{InsertOptions, insert_sql};
pub use select::{SelectOptions, SelectStatement, aggregate, select};
pub use update::{UpdateEntry, update_all, update_by, update_row_args, update_row_sql};
pub use where_clause::{Compiled, compile};

use crate::value::Value;

/// A complete statement and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// Number of `?` placeholders outside quoted literals.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }
}

/// Count `?` placeholders, skipping `'...'` and `"..."` literals and backticked names.
///
/// Inside string literals a backslash escapes the next character, as in MySQL.
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut chars = sql.chars();
    while let Some(ch) = chars.next() {
        match quote {
            Some('\'' | '"') if ch == '\\' => {
                chars.next();
            }
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '?' => count += 1,
                _ => {}
            },
        }
    }
    count
}
