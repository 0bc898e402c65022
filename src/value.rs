use crate::error::{InvocationError, InvokeResult};
use crate::schema::Record;
use crate::types::Type;
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug)]
pub enum Value {
    Unit,
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(Arc<str>),
    Record(Arc<Record>),
    Array(ArrayValue),
    List(Arc<[Value]>),
    Iterator(IteratorValue),
    Error(Exception),
}

impl Value {
    pub fn str(value: impl Into<Arc<str>>) -> Self {
        Value::Str(value.into())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Record(_) => "record",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Iterator(_) => "iterator",
            Value::Error(_) => "error",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Arc<Record>> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn expect_bool(&self) -> InvokeResult<bool> {
        self.as_bool().ok_or_else(|| self.unexpected("bool"))
    }

    pub fn expect_int(&self) -> InvokeResult<i32> {
        self.as_int().ok_or_else(|| self.unexpected("int"))
    }

    pub fn expect_long(&self) -> InvokeResult<i64> {
        self.as_long().ok_or_else(|| self.unexpected("long"))
    }

    pub fn expect_str(&self) -> InvokeResult<&str> {
        self.as_str().ok_or_else(|| self.unexpected("string"))
    }

    pub fn expect_record(&self) -> InvokeResult<&Arc<Record>> {
        self.as_record().ok_or_else(|| self.unexpected("record"))
    }

    pub fn expect_array(&self) -> InvokeResult<&ArrayValue> {
        match self {
            Value::Array(array) => Ok(array),
            _ => Err(self.unexpected("array")),
        }
    }

    pub fn expect_error(&self) -> InvokeResult<&Exception> {
        match self {
            Value::Error(exception) => Ok(exception),
            _ => Err(self.unexpected("error")),
        }
    }

    fn unexpected(&self, expected: &str) -> InvocationError {
        if self.is_null() {
            Exception::null_pointer(format!("expected {expected}, found null")).into()
        } else {
            Exception::class_cast(format!("expected {expected}, found {}", self.type_name()))
                .into()
        }
    }

    /// `==` for primitives, content equality for strings and lists, identity
    /// for everything mutable.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            _ => self.same(other),
        }
    }

    /// Reference identity for reference values, `==` for primitives.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(&a.items, &b.items),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Iterator(a), Value::Iterator(b)) => Arc::ptr_eq(&a.inner, &b.inner),
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }

    pub fn hash_code(&self) -> i32 {
        match self {
            Value::Unit | Value::Null => 0,
            Value::Bool(true) => 1231,
            Value::Bool(false) => 1237,
            Value::Int(i) => *i,
            Value::Long(l) => (*l ^ ((*l as u64) >> 32) as i64) as i32,
            Value::Double(d) => {
                let bits = if d.is_nan() {
                    0x7ff8_0000_0000_0000
                } else {
                    d.to_bits()
                };
                (bits ^ (bits >> 32)) as i32
            }
            Value::Str(s) => s
                .encode_utf16()
                .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32)),
            Value::List(items) => items
                .iter()
                .fold(1i32, |h, v| h.wrapping_mul(31).wrapping_add(v.hash_code())),
            Value::Record(record) => identity_hash(Arc::as_ptr(record) as *const ()),
            Value::Array(array) => identity_hash(Arc::as_ptr(&array.items) as *const ()),
            Value::Iterator(iter) => identity_hash(Arc::as_ptr(&iter.inner) as *const ()),
            Value::Error(exception) => identity_hash(Arc::as_ptr(&exception.0) as *const ()),
        }
    }

    pub fn compare(&self, other: &Value) -> InvokeResult<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Long(a), Value::Long(b)) => Ok(a.cmp(b)),
            (Value::Double(a), Value::Double(b)) => Ok(a.total_cmp(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Null, _) | (_, Value::Null) => {
                Err(Exception::null_pointer("cannot compare null").into())
            }
            (a, b) => Err(Exception::class_cast(format!(
                "{} is not comparable with {}",
                a.type_name(),
                b.type_name()
            ))
            .into()),
        }
    }
}

fn identity_hash(ptr: *const ()) -> i32 {
    let addr = ptr as usize as u64;
    (addr ^ (addr >> 32)) as i32
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value.into())
    }
}

impl From<Exception> for Value {
    fn from(value: Exception) -> Self {
        Value::Error(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v:?}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Record(record) => write!(f, "{record}"),
            Value::Array(array) => write_items(f, &array.lock()),
            Value::List(items) => write_items(f, items),
            Value::Iterator(_) => write!(f, "<iterator>"),
            Value::Error(exception) => write!(f, "{exception}"),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (idx, value) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{value}")?;
    }
    write!(f, "]")
}

/// Fixed-length mutable array shared by reference.
#[derive(Clone, Debug)]
pub struct ArrayValue {
    elem: Type,
    items: Arc<Mutex<Vec<Value>>>,
}

impl ArrayValue {
    pub fn new(elem: Type, len: usize) -> Self {
        let fill = elem.default_value();
        Self::from_vec(elem, vec![fill; len])
    }

    pub fn from_vec(elem: Type, items: Vec<Value>) -> Self {
        Self {
            elem,
            items: Arc::new(Mutex::new(items)),
        }
    }

    pub fn elem_type(&self) -> &Type {
        &self.elem
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get(&self, index: i32) -> InvokeResult<Value> {
        let items = self.lock();
        checked_index(index, items.len()).map(|i| items[i].clone())
    }

    pub fn set(&self, index: i32, value: Value) -> InvokeResult<()> {
        let mut items = self.lock();
        let i = checked_index(index, items.len())?;
        items[i] = value;
        Ok(())
    }

    /// New array of `len` elements; the prefix is copied, the rest defaulted.
    pub fn copy_of(&self, len: usize) -> ArrayValue {
        let items = self.lock();
        let fill = self.elem.default_value();
        let mut copied: Vec<Value> = items.iter().take(len).cloned().collect();
        copied.resize(len, fill);
        ArrayValue::from_vec(self.elem.clone(), copied)
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Value>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn checked_index(index: i32, len: usize) -> InvokeResult<usize> {
    if index < 0 || index as usize >= len {
        return Err(Exception::new(
            "IndexOutOfBoundsException",
            format!("index {index} out of bounds for length {len}"),
        )
        .into());
    }
    Ok(index as usize)
}

type BoxedIter = Box<dyn Iterator<Item = Value> + Send>;

/// A stateful cursor, drained by iterator loops.
#[derive(Clone)]
pub struct IteratorValue {
    inner: Arc<Mutex<BoxedIter>>,
}

impl IteratorValue {
    pub fn new(iter: impl Iterator<Item = Value> + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(iter))),
        }
    }

    pub fn next_value(&self) -> Option<Value> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }
}

impl fmt::Debug for IteratorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IteratorValue")
    }
}

#[derive(Debug)]
struct ExceptionData {
    class: String,
    message: String,
}

/// Thrown error object. Compared by identity.
#[derive(Clone, Debug)]
pub struct Exception(Arc<ExceptionData>);

impl Exception {
    /// Catching this class matches every exception.
    pub const ROOT: &'static str = "Exception";

    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self(Arc::new(ExceptionData {
            class: class.into(),
            message: message.into(),
        }))
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new("RuntimeException", message)
    }

    pub fn null_pointer(message: impl Into<String>) -> Self {
        Self::new("NullPointerException", message)
    }

    pub fn class_cast(message: impl Into<String>) -> Self {
        Self::new("ClassCastException", message)
    }

    pub fn class(&self) -> &str {
        &self.0.class
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }

    pub fn is_instance_of(&self, class: &str) -> bool {
        class == Self::ROOT || self.0.class == class
    }
}

impl PartialEq for Exception {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Exception {}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.message.is_empty() {
            write!(f, "{}", self.0.class)
        } else {
            write!(f, "{}: {}", self.0.class, self.0.message)
        }
    }
}
