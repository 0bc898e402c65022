use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Static type of a slot, a callable parameter or a callable result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    /// The "no value" type. Never a parameter type.
    Void,
    Bool,
    Int,
    Long,
    Double,
    Str,
    Any,
    Error,
    Record(Arc<str>),
    Array(Box<Type>),
    List(Box<Type>),
    Iterator(Box<Type>),
}

impl Type {
    pub fn record(name: impl Into<Arc<str>>) -> Self {
        Type::Record(name.into())
    }

    pub fn array(elem: Type) -> Self {
        Type::Array(Box::new(elem))
    }

    pub fn list(elem: Type) -> Self {
        Type::List(Box::new(elem))
    }

    pub fn iterator(elem: Type) -> Self {
        Type::Iterator(Box::new(elem))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Long | Type::Double)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Long | Type::Double)
    }

    pub fn is_reference(&self) -> bool {
        !self.is_void() && !self.is_primitive()
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) | Type::List(elem) | Type::Iterator(elem) => Some(elem),
            _ => None,
        }
    }

    /// Zero, `false` or `null`, depending on the type.
    pub fn default_value(&self) -> Value {
        match self {
            Type::Void => Value::Unit,
            Type::Bool => Value::Bool(false),
            Type::Int => Value::Int(0),
            Type::Long => Value::Long(0),
            Type::Double => Value::Double(0.0),
            _ => Value::Null,
        }
    }

    /// Whether `value` is an inhabitant of this type.
    ///
    /// List elements are checked one by one. Array and iterator element types
    /// are not: arrays carry their own element type and iterators are lazy.
    /// Records are matched by name only; [`RecordSchema::expect_instance`]
    /// checks schema identity.
    ///
    /// [`RecordSchema::expect_instance`]: crate::schema::RecordSchema::expect_instance
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (Type::Void, Value::Unit) => true,
            (Type::Bool, Value::Bool(_)) => true,
            (Type::Int, Value::Int(_)) => true,
            (Type::Long, Value::Long(_)) => true,
            (Type::Double, Value::Double(_)) => true,
            (ty, Value::Null) => ty.is_reference(),
            (Type::Any, value) => !matches!(value, Value::Unit),
            (Type::Str, Value::Str(_)) => true,
            (Type::Error, Value::Error(_)) => true,
            (Type::Record(name), Value::Record(record)) => record.schema().name() == &**name,
            (Type::Array(_), Value::Array(_)) => true,
            (Type::List(elem), Value::List(items)) => {
                **elem == Type::Any || items.iter().all(|item| elem.admits(item))
            }
            (Type::Iterator(_), Value::Iterator(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::Double => write!(f, "double"),
            Type::Str => write!(f, "string"),
            Type::Any => write!(f, "any"),
            Type::Error => write!(f, "error"),
            Type::Record(name) => write!(f, "{name}"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::List(elem) => write!(f, "List<{elem}>"),
            Type::Iterator(elem) => write!(f, "Iterator<{elem}>"),
        }
    }
}

pub(crate) fn describe_types(types: &[Type]) -> String {
    let names: Vec<String> = types.iter().map(|ty| ty.to_string()).collect();
    format!("({})", names.join(", "))
}
