//! INSERT / INSERT IGNORE / REPLACE statements.

use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::registry::ModelRegistry;

/// Statement flavour of an insert.
///
/// `replace` takes precedence over `ignore` when both are set; the combination is
/// not rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    pub ignore: bool,
    pub replace: bool,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `insert ignore into ...`
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// `replace into ...`
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }
}

/// `insert [ignore] into `t` (cols) values ` or `replace into `t` (cols) values `.
pub fn insert_head(registry: &ModelRegistry, opts: InsertOptions) -> String {
    let mut sql = String::from(if opts.replace {
        "replace into "
    } else if opts.ignore {
        "insert ignore into "
    } else {
        "insert into "
    });
    ident::push_quoted(&mut sql, registry.table());
    sql.push_str(" (");
    sql.push_str(registry.columns_sql());
    sql.push_str(") values ");
    sql
}

/// Full insert with `rows` value groups, each `(?, ?, ...)` over every mapped field.
pub fn insert_sql(registry: &ModelRegistry, opts: InsertOptions, rows: usize) -> OrmResult<String> {
    if rows == 0 {
        return Err(OrmError::validation(format!(
            "insert into '{}' needs at least one row",
            registry.table()
        )));
    }
    let mut sql = insert_head(registry, opts);
    for i in 0..rows {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        sql.push_str(registry.placeholders_sql());
        sql.push(')');
    }
    Ok(sql)
}
