//! Result rows and positional row mapping.
//!
//! A [`Row`] is an ordered list of cells matching the columns of the statement that
//! produced it. [`materialize`] copies those cells into a model by field position;
//! [`flatten`] does the reverse for inserts and updates.

use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::registry::{FieldDescriptor, ModelRegistry};
use crate::value::{FromValue, Value};

/// One result row, cells in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<Value>,
}

impl Row {
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.cells.get(idx)
    }

    /// Decode the cell at `idx`.
    pub fn try_get<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let cell = self
            .cells
            .get(idx)
            .cloned()
            .ok_or_else(|| OrmError::decode(format!("#{idx}"), "column index out of range"))?;
        T::from_value(cell)
    }

    pub fn into_cells(self) -> Vec<Value> {
        self.cells
    }
}

impl From<Vec<Value>> for Row {
    fn from(cells: Vec<Value>) -> Self {
        Self::new(cells)
    }
}

/// Read every mapped field of `row` in registry order.
pub fn flatten<M: Model>(registry: &ModelRegistry, row: &M) -> OrmResult<Vec<Value>> {
    registry
        .fields()
        .iter()
        .map(|f| row.field_value(f.position).map_err(|e| rename_decode(e, &f.name)))
        .collect()
}

/// Build a model from `row`, assigning cell `i` to `fields[i]`.
///
/// Fields not listed keep their `Default` value.
pub fn materialize<M: Model>(fields: &[FieldDescriptor], row: Row) -> OrmResult<M> {
    if row.len() != fields.len() {
        return Err(OrmError::decode(
            M::NAME,
            format!("expected {} columns, got {}", fields.len(), row.len()),
        ));
    }
    let mut out = M::default();
    for (field, cell) in fields.iter().zip(row.into_cells()) {
        out.set_field(field.position, cell)
            .map_err(|e| rename_decode(e, &field.name))?;
    }
    Ok(out)
}

// Value conversions only know the Rust type; attach the field name.
fn rename_decode(err: OrmError, field: &str) -> OrmError {
    match err {
        OrmError::Decode { field: ty, message } => OrmError::decode(field, format!("{ty}: {message}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDef;
    use crate::value::ToValue;

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        id: i64,
        label: Option<String>,
        cache: u8,
    }

    impl Model for Pair {
        const NAME: &'static str = "Pair";

        fn fields() -> Vec<FieldDef> {
            vec![
                FieldDef::new(0, "Id").primary(),
                FieldDef::new(1, "Label"),
                FieldDef::new(2, "Cache").omit(),
            ]
        }

        fn field_value(&self, position: usize) -> OrmResult<Value> {
            match position {
                0 => self.id.to_value(),
                1 => self.label.to_value(),
                2 => self.cache.to_value(),
                _ => Err(OrmError::validation("no such field")),
            }
        }

        fn set_field(&mut self, position: usize, value: Value) -> OrmResult<()> {
            match position {
                0 => self.id = FromValue::from_value(value)?,
                1 => self.label = FromValue::from_value(value)?,
                2 => self.cache = FromValue::from_value(value)?,
                _ => return Err(OrmError::validation("no such field")),
            }
            Ok(())
        }
    }

    #[test]
    fn test_flatten_registry_order() {
        let r = ModelRegistry::of::<Pair>(None).unwrap();
        let values = flatten(
            &r,
            &Pair {
                id: 3,
                label: None,
                cache: 9,
            },
        )
        .unwrap();
        assert_eq!(values, vec![Value::Int(3), Value::Null]);
    }

    #[test]
    fn test_materialize_by_position() {
        let r = ModelRegistry::of::<Pair>(None).unwrap();
        let row = Row::new(vec![Value::Int(5), Value::Text("x".into())]);
        let pair: Pair = materialize(r.fields(), row).unwrap();
        assert_eq!(
            pair,
            Pair {
                id: 5,
                label: Some("x".into()),
                cache: 0,
            }
        );
    }

    #[test]
    fn test_materialize_partial_projection() {
        let r = ModelRegistry::of::<Pair>(None).unwrap();
        let fields = vec![r.field("Label").unwrap().clone()];
        let pair: Pair = materialize(&fields, Row::new(vec![Value::Text("only".into())])).unwrap();
        assert_eq!(pair.id, 0);
        assert_eq!(pair.label.as_deref(), Some("only"));
    }

    #[test]
    fn test_materialize_errors() {
        let r = ModelRegistry::of::<Pair>(None).unwrap();
        let err = materialize::<Pair>(r.fields(), Row::new(vec![Value::Int(1)])).unwrap_err();
        assert!(matches!(err, OrmError::Decode { .. }));

        let row = Row::new(vec![Value::Text("abc".into()), Value::Null]);
        let err = materialize::<Pair>(r.fields(), row).unwrap_err();
        match err {
            OrmError::Decode { field, .. } => assert_eq!(field, "Id"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_try_get() {
        let row = Row::new(vec![Value::Int(4)]);
        assert_eq!(row.try_get::<i64>(0).unwrap(), 4);
        assert!(row.try_get::<i64>(1).is_err());
    }
}
