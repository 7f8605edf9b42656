//! Model declaration: the per-field tag source consumed by the registry.
//!
//! A model is usually declared with `#[derive(Model)]`, but the trait can also be
//! implemented by hand with [`FieldDef`] literals.

use crate::error::OrmResult;
use crate::value::Value;

/// Semantic value family of a field.
///
/// Only used to choose how numeric aggregates (`sum`) are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    Integer,
    Float,
    Text,
    Bool,
    Bytes,
    DateTime,
    #[default]
    Other,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }
}

/// Declared metadata of one struct field, before registration.
///
/// `position` is the field's ordinal in the struct declaration (omitted fields
/// included), and is what [`Model::field_value`] / [`Model::set_field`] dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub position: usize,
    pub name: &'static str,
    /// Explicit column override; derived from `name` when `None`.
    pub column: Option<&'static str>,
    pub primary: bool,
    pub auto_increment: bool,
    pub omit: bool,
    pub kind: FieldType,
}

impl FieldDef {
    pub const fn new(position: usize, name: &'static str) -> Self {
        Self {
            position,
            name,
            column: None,
            primary: false,
            auto_increment: false,
            omit: false,
            kind: FieldType::Other,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub const fn omit(mut self) -> Self {
        self.omit = true;
        self
    }

    pub const fn kind(mut self, kind: FieldType) -> Self {
        self.kind = kind;
        self
    }
}

/// A plain data type mapped onto one table.
///
/// Rows are materialized by starting from `Default` and setting fields by position,
/// so no runtime type inspection is involved.
///
/// # Example
///
/// ```ignore
/// use daokit::Model;
///
/// #[derive(Debug, Default, Model)]
/// struct UserInfo {
///     #[orm(primary, auto_increment)]
///     id: i64,
///     name: String,
///     #[orm(column = "b")]
///     birth: i64,
///     #[orm(omit)]
///     cached: Option<String>,
/// }
/// ```
pub trait Model: Default + Send + Sync + 'static {
    /// Declared type name, the source of the default table name.
    const NAME: &'static str;

    /// Table name declared on the type, if any.
    const TABLE: Option<&'static str> = None;

    /// Field declarations in declaration order.
    fn fields() -> Vec<FieldDef>;

    /// Read the field at `position` as a bound argument.
    fn field_value(&self, position: usize) -> OrmResult<Value>;

    /// Overwrite the field at `position` with a scanned value.
    fn set_field(&mut self, position: usize, value: Value) -> OrmResult<()>;
}
