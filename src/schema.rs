use crate::error::{ComposeError, ComposeResult, InvocationError, InvokeResult};
use crate::types::Type;
use crate::value::{Exception, Value};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: Type,
}

/// Ordered field list of a record type.
///
/// Stands in for runtime introspection: generators enumerate `fields()` in
/// declaration order.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    name: Arc<str>,
    fields: Vec<FieldDef>,
}

impl RecordSchema {
    pub fn new(name: impl Into<Arc<str>>, fields: Vec<(&str, Type)>) -> ComposeResult<Arc<Self>> {
        let name = name.into();
        let mut defs: Vec<FieldDef> = Vec::with_capacity(fields.len());
        for (field, ty) in fields {
            if ty.is_void() {
                return Err(ComposeError::signature(format!(
                    "field `{name}.{field}` cannot have type void"
                )));
            }
            if defs.iter().any(|def| def.name == field) {
                return Err(ComposeError::signature(format!(
                    "duplicate field `{field}` in record `{name}`"
                )));
            }
            defs.push(FieldDef {
                name: field.to_string(),
                ty,
            });
        }
        Ok(Arc::new(Self { name, fields: defs }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> Type {
        Type::Record(self.name.clone())
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> ComposeResult<(usize, &FieldDef)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, def)| def.name == name)
            .ok_or_else(|| {
                ComposeError::signature(format!(
                    "record `{}` has no field `{name}`",
                    self.name
                ))
            })
    }

    pub fn field_types(&self) -> Vec<Type> {
        self.fields.iter().map(|def| def.ty.clone()).collect()
    }

    /// Builds a record from field values given in declaration order.
    pub fn instantiate(self: &Arc<Self>, values: Vec<Value>) -> InvokeResult<Value> {
        if values.len() != self.fields.len() {
            return Err(Exception::new(
                "IllegalArgumentException",
                format!(
                    "record `{}` expects {} fields but received {}",
                    self.name,
                    self.fields.len(),
                    values.len()
                ),
            )
            .into());
        }
        for (def, value) in self.fields.iter().zip(values.iter()) {
            if !def.ty.admits(value) {
                return Err(Exception::class_cast(format!(
                    "field `{}.{}` expects {} but received {}",
                    self.name,
                    def.name,
                    def.ty,
                    value.type_name()
                ))
                .into());
            }
        }
        Ok(Value::Record(Arc::new(Record {
            schema: self.clone(),
            fields: Mutex::new(values),
        })))
    }

    /// The record held by `value`, which must come from this very schema.
    ///
    /// Record types are named, so a same-named record of another schema
    /// passes static checks; this rejects it with a `ClassCastException`.
    pub fn expect_instance<'a>(self: &Arc<Self>, value: &'a Value) -> InvokeResult<&'a Arc<Record>> {
        let record = value.expect_record()?;
        if !Arc::ptr_eq(&record.schema, self) {
            return Err(Exception::class_cast(format!(
                "record of another `{}` schema cannot be used as `{}`",
                record.schema.name, self.name
            ))
            .into());
        }
        Ok(record)
    }

    pub fn is_instance(self: &Arc<Self>, value: &Value) -> bool {
        matches!(value, Value::Record(record) if Arc::ptr_eq(&record.schema, self))
    }

    /// Record with every field at its type's default value.
    pub fn instantiate_default(self: &Arc<Self>) -> Value {
        Value::Record(Arc::new(Record {
            schema: self.clone(),
            fields: Mutex::new(self.fields.iter().map(|def| def.ty.default_value()).collect()),
        }))
    }
}

#[derive(Debug)]
pub struct Record {
    schema: Arc<RecordSchema>,
    fields: Mutex<Vec<Value>>,
}

impl Record {
    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn get(&self, index: usize) -> InvokeResult<Value> {
        self.lock()
            .get(index)
            .cloned()
            .ok_or_else(|| self.no_field(index))
    }

    pub fn set(&self, index: usize, value: Value) -> InvokeResult<()> {
        let mut fields = self.lock();
        let slot = fields.get_mut(index).ok_or_else(|| self.no_field(index))?;
        *slot = value;
        Ok(())
    }

    pub fn get_named(&self, name: &str) -> Option<Value> {
        let (index, _) = self.schema.field(name).ok()?;
        self.get(index).ok()
    }

    fn no_field(&self, index: usize) -> InvocationError {
        Exception::new(
            "IndexOutOfBoundsException",
            format!(
                "record `{}` has {} fields, no field {index}",
                self.schema.name,
                self.schema.fields.len()
            ),
        )
        .into()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Value>> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.lock().clone();
        write!(f, "{}{{", self.schema.name)?;
        for (idx, (def, value)) in self.schema.fields.iter().zip(values.iter()).enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", def.name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Arc<RecordSchema> {
        RecordSchema::new("P", vec![("a", Type::Int), ("b", Type::Int)]).unwrap()
    }

    #[test]
    fn field_index_out_of_range_fails() {
        let value = point().instantiate_default();
        let record = value.as_record().unwrap();
        assert_eq!(record.get(1).unwrap().as_int(), Some(0));
        let err = record.get(2).unwrap_err();
        assert_eq!(err.exception().class(), "IndexOutOfBoundsException");
        let err = record.set(5, Value::Int(1)).unwrap_err();
        assert_eq!(err.exception().class(), "IndexOutOfBoundsException");
        assert_eq!(record.to_string(), "P{a=0, b=0}");
    }

    #[test]
    fn instances_are_tied_to_their_schema() {
        let schema = point();
        let twin = point();
        let own = schema.instantiate_default();
        let foreign = twin.instantiate_default();
        assert!(schema.is_instance(&own));
        assert!(!schema.is_instance(&foreign));
        assert!(!schema.is_instance(&Value::Null));
        assert!(schema.expect_instance(&own).is_ok());
        let err = schema.expect_instance(&foreign).unwrap_err();
        assert_eq!(err.exception().class(), "ClassCastException");
        let err = schema.expect_instance(&Value::Null).unwrap_err();
        assert_eq!(err.exception().class(), "NullPointerException");
    }
}
