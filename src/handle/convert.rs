use crate::error::InvokeResult;
use crate::types::Type;
use crate::value::{Exception, Value};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Conversion {
    Identity,
    Discard,
    Numeric(Type),
    /// Checked at runtime: `Any` (or an erased container) to a concrete type.
    Downcast(Type),
}

impl Conversion {
    pub(crate) fn between(from: &Type, to: &Type) -> Option<Conversion> {
        if from == to {
            return Some(Conversion::Identity);
        }
        match (from, to) {
            (_, Type::Void) => Some(Conversion::Discard),
            (Type::Void, _) => None,
            (from, to) if from.is_numeric() && to.is_numeric() => {
                Some(Conversion::Numeric(to.clone()))
            }
            (_, Type::Any) => Some(Conversion::Identity),
            (Type::Any, to) => Some(Conversion::Downcast(to.clone())),
            (Type::Array(a), Type::Array(b))
            | (Type::List(a), Type::List(b))
            | (Type::Iterator(a), Type::Iterator(b))
                if **a == Type::Any || **b == Type::Any =>
            {
                Some(Conversion::Identity)
            }
            _ => None,
        }
    }

    pub(crate) fn apply(&self, value: Value) -> InvokeResult<Value> {
        match self {
            Conversion::Identity => Ok(value),
            Conversion::Discard => Ok(Value::Unit),
            Conversion::Numeric(to) => numeric(value, to),
            Conversion::Downcast(to) => {
                if to.admits(&value) {
                    return Ok(value);
                }
                match value {
                    Value::Null => Err(Exception::null_pointer(format!(
                        "cannot unbox null to {to}"
                    ))
                    .into()),
                    Value::Int(_) | Value::Long(_) | Value::Double(_) if to.is_numeric() => {
                        numeric(value, to)
                    }
                    other => Err(Exception::class_cast(format!(
                        "{} cannot be cast to {to}",
                        describe(&other)
                    ))
                    .into()),
                }
            }
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Record(record) => record.schema().name().to_string(),
        other => other.type_name().to_string(),
    }
}

fn numeric(value: Value, to: &Type) -> InvokeResult<Value> {
    let converted = match (value, to) {
        (Value::Int(i), Type::Int) => Value::Int(i),
        (Value::Int(i), Type::Long) => Value::Long(i as i64),
        (Value::Int(i), Type::Double) => Value::Double(i as f64),
        (Value::Long(l), Type::Int) => Value::Int(l as i32),
        (Value::Long(l), Type::Long) => Value::Long(l),
        (Value::Long(l), Type::Double) => Value::Double(l as f64),
        (Value::Double(d), Type::Int) => Value::Int(d as i32),
        (Value::Double(d), Type::Long) => Value::Long(d as i64),
        (Value::Double(d), Type::Double) => Value::Double(d),
        (other, to) => {
            return Err(Exception::class_cast(format!(
                "{} cannot be converted to {to}",
                other.type_name()
            ))
            .into())
        }
    };
    Ok(converted)
}
