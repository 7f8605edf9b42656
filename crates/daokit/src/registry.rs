//! Model registry: per-type metadata computed once and shared read-only.
//!
//! A [`ModelRegistry`] owns the ordered [`FieldDescriptor`]s of one (model, table)
//! pair, two lookup indices (logical name and column) and the cached column /
//! placeholder lists used by INSERT.
//!
//! # Example
//!
//! ```ignore
//! let registry = daokit::register::<UserInfo>(None)?;
//! assert_eq!(registry.table(), "user_info");
//! assert_eq!(registry.resolve_column("Birth"), Some("b"));
//! ```

use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::model::{FieldDef, FieldType, Model};
use heck::ToSnakeCase;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn field_placeholder() -> &'static Regex {
    static FIELD_PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    FIELD_PLACEHOLDER
        .get_or_init(|| Regex::new("@([a-zA-Z_0-9]+)@").expect("invalid built-in placeholder regex"))
}

/// Registered metadata for one mapped field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Ordinal position in the struct declaration.
    pub position: usize,
    /// Identifier as declared on the type.
    pub name: String,
    /// Database column.
    pub column: String,
    pub primary: bool,
    pub auto_increment: bool,
    pub kind: FieldType,
}

/// Immutable per-(model, table) metadata.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    model: String,
    table: String,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
    by_column: HashMap<String, usize>,
    primaries: Vec<usize>,
    columns_sql: String,
    placeholders_sql: String,
}

/// Build the registry for `M`, optionally overriding its table name.
pub fn register<M: Model>(table_override: Option<&str>) -> OrmResult<ModelRegistry> {
    ModelRegistry::of::<M>(table_override)
}

impl ModelRegistry {
    /// Build the registry for a model type.
    ///
    /// Table name precedence: `table_override`, then `M::TABLE`, then the
    /// snake_case form of `M::NAME`.
    pub fn of<M: Model>(table_override: Option<&str>) -> OrmResult<Self> {
        let table = table_override.or(M::TABLE);
        Self::new(M::NAME, &M::fields(), table)
    }

    /// Build a registry from descriptor literals.
    pub fn new(model: &str, defs: &[FieldDef], table: Option<&str>) -> OrmResult<Self> {
        let table = match table {
            Some(t) => t.to_string(),
            None => model.to_snake_case(),
        };
        ident::validate(&table)?;

        let mapped: Vec<&FieldDef> = defs.iter().filter(|d| !d.omit).collect();
        if mapped.is_empty() {
            return Err(OrmError::NoFields(model.to_string()));
        }

        let mut fields = Vec::with_capacity(mapped.len());
        let mut by_name = HashMap::with_capacity(mapped.len());
        let mut by_column = HashMap::with_capacity(mapped.len());
        let mut primaries = Vec::new();
        let mut columns_sql = String::new();
        let mut placeholders_sql = String::new();

        for (idx, def) in mapped.into_iter().enumerate() {
            let column = match def.column {
                Some(c) => c.to_string(),
                None => def.name.to_snake_case(),
            };
            ident::validate(&column)?;

            let duplicate = |name: &str| OrmError::DuplicateField {
                model: model.to_string(),
                name: name.to_string(),
            };
            if by_name.insert(def.name.to_string(), idx).is_some() {
                return Err(duplicate(def.name));
            }
            if by_column.insert(column.clone(), idx).is_some() {
                return Err(duplicate(&column));
            }

            if def.primary {
                primaries.push(idx);
            }
            if idx > 0 {
                columns_sql.push_str(", ");
                placeholders_sql.push_str(", ");
            }
            ident::push_quoted(&mut columns_sql, &column);
            placeholders_sql.push('?');

            fields.push(FieldDescriptor {
                position: def.position,
                name: def.name.to_string(),
                column,
                primary: def.primary,
                auto_increment: def.auto_increment,
                kind: def.kind,
            });
        }

        if primaries.is_empty() {
            return Err(OrmError::NoPrimaryKey(model.to_string()));
        }

        Ok(Self {
            model: model.to_string(),
            table,
            fields,
            by_name,
            by_column,
            primaries,
            columns_sql,
            placeholders_sql,
        })
    }

    /// Declared model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Table name (unquoted).
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Mapped fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Primary key fields in declaration order.
    pub fn primaries(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.primaries.iter().map(|&i| &self.fields[i])
    }

    /// Number of primary key fields.
    pub fn primary_count(&self) -> usize {
        self.primaries.len()
    }

    /// Look a field up by logical name first, then by column.
    pub fn field(&self, name_or_column: &str) -> Option<&FieldDescriptor> {
        self.by_name
            .get(name_or_column)
            .or_else(|| self.by_column.get(name_or_column))
            .map(|&i| &self.fields[i])
    }

    /// Like [`field`](Self::field), but an unresolvable name is an error.
    pub fn require(&self, name_or_column: &str) -> OrmResult<&FieldDescriptor> {
        self.field(name_or_column)
            .ok_or_else(|| OrmError::unknown_field(&self.table, name_or_column))
    }

    /// Resolve a logical name or column to its column.
    pub fn resolve_column(&self, name_or_column: &str) -> Option<&str> {
        self.field(name_or_column).map(|f| f.column.as_str())
    }

    /// `` `a`, `b`, `c` `` in field order.
    pub fn columns_sql(&self) -> &str {
        &self.columns_sql
    }

    /// `?, ?, ?` matching [`columns_sql`](Self::columns_sql).
    pub fn placeholders_sql(&self) -> &str {
        &self.placeholders_sql
    }

    /// Substitute every `@Field@` token with the quoted column it resolves to.
    ///
    /// Tokens that resolve to nothing are left as they are.
    pub fn resolve_placeholders(&self, text: &str) -> String {
        field_placeholder()
            .replace_all(text, |caps: &Captures<'_>| match self.resolve_column(&caps[1]) {
                Some(column) => ident::quote(column),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
