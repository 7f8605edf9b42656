//! Guarded DELETE statements.

use super::Statement;
use super::where_clause::compile;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::query::Query;
use crate::registry::ModelRegistry;

fn delete_head(registry: &ModelRegistry) -> String {
    let mut sql = String::from("delete from ");
    ident::push_quoted(&mut sql, registry.table());
    sql
}

/// `delete from `t` where ...`; an empty predicate is rejected.
pub fn delete_by(registry: &ModelRegistry, query: &Query) -> OrmResult<Statement> {
    let compiled = compile(query, registry)?;
    if !compiled.has_where() {
        return Err(OrmError::UnconditionalMutation("delete"));
    }
    let mut sql = delete_head(registry);
    compiled.append_to(&mut sql);
    Ok(Statement::new(sql, compiled.args))
}

/// `delete from `t``
pub fn delete_all(registry: &ModelRegistry) -> Statement {
    Statement::new(delete_head(registry), Vec::new())
}
