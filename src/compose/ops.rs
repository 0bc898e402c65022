use super::{Closure, Expr, Var};
use crate::error::{ComposeError, ComposeResult, InvokeResult};
use crate::handle::Handle;
use crate::schema::RecordSchema;
use crate::types::Type;
use crate::value::{ArrayValue, Exception, Value};
use std::cmp::Ordering;
use std::sync::Arc;

fn exprs<I>(args: I) -> Vec<Expr>
where
    I: IntoIterator,
    I::Item: Into<Expr>,
{
    args.into_iter().map(Into::into).collect()
}

fn types_of(args: &[Expr]) -> Vec<Type> {
    args.iter().map(|arg| arg.ty().clone()).collect()
}

fn same_type(op: &str, a: &Expr, b: &Expr) -> ComposeResult<Type> {
    if a.ty() != b.ty() {
        return Err(ComposeError::signature(format!(
            "{op} needs operands of one type, got {} and {}",
            a.ty(),
            b.ty()
        )));
    }
    Ok(a.ty().clone())
}

fn require(op: &str, expr: &Expr, ok: bool) -> ComposeResult<()> {
    if !ok {
        return Err(ComposeError::signature(format!(
            "{op} is not defined for {}",
            expr.ty()
        )));
    }
    Ok(())
}

/// Static type of a constant.
fn type_of(value: &Value) -> Type {
    match value {
        Value::Unit => Type::Void,
        Value::Null => Type::Any,
        Value::Bool(_) => Type::Bool,
        Value::Int(_) => Type::Int,
        Value::Long(_) => Type::Long,
        Value::Double(_) => Type::Double,
        Value::Str(_) => Type::Str,
        Value::Record(record) => record.schema().ty(),
        Value::Array(array) => Type::array(array.elem_type().clone()),
        Value::List(_) => Type::list(Type::Any),
        Value::Iterator(_) => Type::iterator(Type::Any),
        Value::Error(_) => Type::Error,
    }
}

impl Closure {
    pub fn constant(value: impl Into<Value>) -> ComposeResult<Closure> {
        let value = value.into();
        Self::constant_typed(type_of(&value), value)
    }

    pub fn constant_typed(ty: Type, value: Value) -> ComposeResult<Closure> {
        if ty.is_void() {
            return Self::constant_void();
        }
        Closure::new(Handle::constant(ty, value)?, Vec::new())
    }

    pub fn constant_void() -> ComposeResult<Closure> {
        Closure::new(Handle::empty(Vec::new())?, Vec::new())
    }

    pub fn var(var: &Var) -> ComposeResult<Closure> {
        var.as_closure()
    }

    /// Applies a Rust function to the values of `args`.
    pub fn native<I, F>(ret: Type, args: I, f: F) -> ComposeResult<Closure>
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
        F: Fn(&[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        let args = exprs(args);
        let handle = Handle::native(types_of(&args), ret, f)?;
        Closure::fold(&handle, args)
    }

    pub fn function<F>(ret: Type, a: impl Into<Expr>, f: F) -> ComposeResult<Closure>
    where
        F: Fn(&Value) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        Self::native(ret, [a.into()], move |args: &[Value]| f(&args[0]))
    }

    pub fn bi_function<F>(
        ret: Type,
        a: impl Into<Expr>,
        b: impl Into<Expr>,
        f: F,
    ) -> ComposeResult<Closure>
    where
        F: Fn(&Value, &Value) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        Self::native(ret, [a.into(), b.into()], move |args: &[Value]| {
            f(&args[0], &args[1])
        })
    }

    pub fn predicate<F>(a: impl Into<Expr>, f: F) -> ComposeResult<Closure>
    where
        F: Fn(&Value) -> InvokeResult<bool> + Send + Sync + 'static,
    {
        Self::native(Type::Bool, [a.into()], move |args: &[Value]| {
            f(&args[0]).map(Value::Bool)
        })
    }

    pub fn bi_predicate<F>(a: impl Into<Expr>, b: impl Into<Expr>, f: F) -> ComposeResult<Closure>
    where
        F: Fn(&Value, &Value) -> InvokeResult<bool> + Send + Sync + 'static,
    {
        Self::native(Type::Bool, [a.into(), b.into()], move |args: &[Value]| {
            f(&args[0], &args[1]).map(Value::Bool)
        })
    }

    pub fn supplier<F>(ret: Type, f: F) -> ComposeResult<Closure>
    where
        F: Fn() -> InvokeResult<Value> + Send + Sync + 'static,
    {
        Self::native(ret, Vec::<Expr>::new(), move |_: &[Value]| f())
    }

    pub fn runnable<F>(f: F) -> ComposeResult<Closure>
    where
        F: Fn() -> InvokeResult<()> + Send + Sync + 'static,
    {
        Self::native(Type::Void, Vec::<Expr>::new(), move |_: &[Value]| {
            f().map(|()| Value::Unit)
        })
    }

    /// `-1`, `0` or `1` by the ordering `f` reports.
    pub fn comparator<F>(a: impl Into<Expr>, b: impl Into<Expr>, f: F) -> ComposeResult<Closure>
    where
        F: Fn(&Value, &Value) -> InvokeResult<Ordering> + Send + Sync + 'static,
    {
        Self::native(Type::Int, [a.into(), b.into()], move |args: &[Value]| {
            f(&args[0], &args[1]).map(ordering_to_int)
        })
    }

    pub fn int_unary_operator<F>(a: impl Into<Expr>, f: F) -> ComposeResult<Closure>
    where
        F: Fn(i32) -> i32 + Send + Sync + 'static,
    {
        Self::native(Type::Int, [a.into()], move |args: &[Value]| {
            Ok(Value::Int(f(args[0].expect_int()?)))
        })
    }

    pub fn int_predicate<F>(a: impl Into<Expr>, f: F) -> ComposeResult<Closure>
    where
        F: Fn(i32) -> bool + Send + Sync + 'static,
    {
        Self::native(Type::Bool, [a.into()], move |args: &[Value]| {
            Ok(Value::Bool(f(args[0].expect_int()?)))
        })
    }

    pub fn new_instance<I>(schema: &Arc<RecordSchema>, args: I) -> ComposeResult<Closure>
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        let schema = schema.clone();
        let handle = Handle::native(schema.field_types(), schema.ty(), move |args: &[Value]| {
            schema.instantiate(args.to_vec())
        })?;
        Closure::fold(&handle, exprs(args))
    }

    pub fn get_field(
        schema: &Arc<RecordSchema>,
        field: &str,
        object: impl Into<Expr>,
    ) -> ComposeResult<Closure> {
        let (index, def) = schema.field(field)?;
        let (ty, schema) = (def.ty.clone(), schema.clone());
        let handle = Handle::native(vec![schema.ty()], ty, move |args: &[Value]| {
            schema.expect_instance(&args[0])?.get(index)
        })?;
        Closure::fold(&handle, [object.into()])
    }

    pub fn set_field(
        schema: &Arc<RecordSchema>,
        field: &str,
        object: impl Into<Expr>,
        value: impl Into<Expr>,
    ) -> ComposeResult<Closure> {
        let (index, def) = schema.field(field)?;
        let (ty, schema) = (def.ty.clone(), schema.clone());
        let handle = Handle::native(vec![schema.ty(), ty], Type::Void, move |args: &[Value]| {
            schema
                .expect_instance(&args[0])?
                .set(index, args[1].clone())?;
            Ok(Value::Unit)
        })?;
        Closure::fold(&handle, [object.into(), value.into()])
    }

    pub fn new_array(elem: Type, length: impl Into<Expr>) -> ComposeResult<Closure> {
        let ty = Type::array(elem.clone());
        let handle = Handle::native(vec![Type::Int], ty, move |args: &[Value]| {
            let length = array_length_arg(&args[0])?;
            Ok(Value::Array(ArrayValue::new(elem.clone(), length)))
        })?;
        Closure::fold(&handle, [length.into()])
    }

    pub fn array_length(array: impl Into<Expr>) -> ComposeResult<Closure> {
        let array = array.into();
        let ty = array_type("array length", &array)?;
        let handle = Handle::native(vec![ty], Type::Int, |args: &[Value]| {
            let array = args[0].expect_array()?;
            Ok(Value::Int(array.len() as i32))
        })?;
        Closure::fold(&handle, [array])
    }

    pub fn get_array_element(
        array: impl Into<Expr>,
        index: impl Into<Expr>,
    ) -> ComposeResult<Closure> {
        let array = array.into();
        let ty = array_type("array element", &array)?;
        let elem = ty.element().cloned().unwrap_or(Type::Any);
        let handle = Handle::native(vec![ty, Type::Int], elem, |args: &[Value]| {
            args[0].expect_array()?.get(args[1].expect_int()?)
        })?;
        Closure::fold(&handle, [array, index.into()])
    }

    pub fn set_array_element(
        array: impl Into<Expr>,
        index: impl Into<Expr>,
        value: impl Into<Expr>,
    ) -> ComposeResult<Closure> {
        let array = array.into();
        let ty = array_type("array element", &array)?;
        let elem = ty.element().cloned().unwrap_or(Type::Any);
        let handle = Handle::native(vec![ty, Type::Int, elem], Type::Void, |args: &[Value]| {
            args[0]
                .expect_array()?
                .set(args[1].expect_int()?, args[2].clone())?;
            Ok(Value::Unit)
        })?;
        Closure::fold(&handle, [array, index.into(), value.into()])
    }

    /// Copy truncated or padded with default values to `length`.
    pub fn array_copy_of(array: impl Into<Expr>, length: impl Into<Expr>) -> ComposeResult<Closure> {
        let array = array.into();
        let ty = array_type("array copy", &array)?;
        let handle = Handle::native(vec![ty.clone(), Type::Int], ty, |args: &[Value]| {
            let length = array_length_arg(&args[1])?;
            Ok(Value::Array(args[0].expect_array()?.copy_of(length)))
        })?;
        Closure::fold(&handle, [array, length.into()])
    }

    pub fn not(a: impl Into<Expr>) -> ComposeResult<Closure> {
        Self::native(Type::Bool, [a.into()], |args: &[Value]| {
            Ok(Value::Bool(!args[0].expect_bool()?))
        })
    }

    /// Short-circuit conjunction: `b` runs only when `a` is true.
    pub fn and(a: impl Into<Expr>, b: impl Into<Expr>) -> ComposeResult<Closure> {
        Self::if_then_else(a, b, Self::constant(false)?)
    }

    /// Short-circuit disjunction: `b` runs only when `a` is false.
    pub fn or(a: impl Into<Expr>, b: impl Into<Expr>) -> ComposeResult<Closure> {
        Self::if_then_else(a, Self::constant(true)?, b)
    }

    pub fn and_all<I>(items: I) -> ComposeResult<Closure>
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        let mut items = exprs(items);
        let Some(last) = items.pop() else {
            return Self::constant(true);
        };
        items
            .into_iter()
            .rev()
            .try_fold(last.as_closure()?, |acc, item| Self::and(item, acc))
    }

    pub fn or_all<I>(items: I) -> ComposeResult<Closure>
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        let mut items = exprs(items);
        let Some(last) = items.pop() else {
            return Self::constant(false);
        };
        items
            .into_iter()
            .rev()
            .try_fold(last.as_closure()?, |acc, item| Self::or(item, acc))
    }

    /// `==` on primitives, identity on references.
    pub fn same(a: impl Into<Expr>, b: impl Into<Expr>) -> ComposeResult<Closure> {
        let (a, b) = (a.into(), b.into());
        same_type("same", &a, &b)?;
        Self::native(Type::Bool, [a, b], |args: &[Value]| {
            Ok(Value::Bool(args[0].same(&args[1])))
        })
    }

    pub fn equals(a: impl Into<Expr>, b: impl Into<Expr>) -> ComposeResult<Closure> {
        let (a, b) = (a.into(), b.into());
        same_type("equals", &a, &b)?;
        Self::native(Type::Bool, [a, b], |args: &[Value]| {
            Ok(Value::Bool(args[0].equals(&args[1])))
        })
    }

    pub fn hash_code(a: impl Into<Expr>) -> ComposeResult<Closure> {
        Self::native(Type::Int, [a.into()], |args: &[Value]| {
            Ok(Value::Int(args[0].hash_code()))
        })
    }

    pub fn compare(a: impl Into<Expr>, b: impl Into<Expr>) -> ComposeResult<Closure> {
        let (a, b) = (a.into(), b.into());
        same_type("compare", &a, &b)?;
        Self::comparator(a, b, |x: &Value, y: &Value| x.compare(y))
    }

    /// Numeric addition, or concatenation of strings.
    pub fn plus(a: impl Into<Expr>, b: impl Into<Expr>) -> ComposeResult<Closure> {
        let (a, b) = (a.into(), b.into());
        let ty = same_type("plus", &a, &b)?;
        require("plus", &a, ty.is_numeric() || ty == Type::Str)?;
        Self::native(ty, [a, b], |args: &[Value]| match (&args[0], &args[1]) {
            (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_add(*y))),
            (Value::Long(x), Value::Long(y)) => Ok(Value::Long(x.wrapping_add(*y))),
            (Value::Double(x), Value::Double(y)) => Ok(Value::Double(x + y)),
            (x, y) => Ok(Value::str(format!("{x}{y}"))),
        })
    }

    pub fn mul(a: impl Into<Expr>, b: impl Into<Expr>) -> ComposeResult<Closure> {
        let (a, b) = (a.into(), b.into());
        let ty = same_type("mul", &a, &b)?;
        require("mul", &a, ty.is_numeric())?;
        Self::native(ty, [a, b], |args: &[Value]| match (&args[0], &args[1]) {
            (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_mul(*y))),
            (Value::Long(x), Value::Long(y)) => Ok(Value::Long(x.wrapping_mul(*y))),
            (Value::Double(x), Value::Double(y)) => Ok(Value::Double(x * y)),
            (x, y) => Err(Exception::class_cast(format!(
                "cannot multiply {} by {}",
                x.type_name(),
                y.type_name()
            ))
            .into()),
        })
    }

    pub fn is_null(a: impl Into<Expr>) -> ComposeResult<Closure> {
        let a = a.into();
        require("is_null", &a, a.ty().is_reference())?;
        Self::native(Type::Bool, [a], |args: &[Value]| {
            Ok(Value::Bool(args[0].is_null()))
        })
    }

    pub fn is_not_null(a: impl Into<Expr>) -> ComposeResult<Closure> {
        let a = a.into();
        require("is_not_null", &a, a.ty().is_reference())?;
        Self::native(Type::Bool, [a], |args: &[Value]| {
            Ok(Value::Bool(!args[0].is_null()))
        })
    }

    /// Whether the value is a non-null inhabitant of `ty`.
    pub fn instance_of(a: impl Into<Expr>, ty: &Type) -> ComposeResult<Closure> {
        let ty = ty.clone();
        Self::native(Type::Bool, [a.into()], move |args: &[Value]| {
            Ok(Value::Bool(!args[0].is_null() && ty.admits(&args[0])))
        })
    }

    /// Whether the value is a record built from `schema` itself.
    pub fn instance_of_schema(a: impl Into<Expr>, schema: &Arc<RecordSchema>) -> ComposeResult<Closure> {
        let schema = schema.clone();
        Self::native(Type::Bool, [a.into()], move |args: &[Value]| {
            Ok(Value::Bool(schema.is_instance(&args[0])))
        })
    }

    pub fn to_string(a: impl Into<Expr>) -> ComposeResult<Closure> {
        Self::native(Type::Str, [a.into()], |args: &[Value]| {
            Ok(Value::str(args[0].to_string()))
        })
    }

    /// Raises the error `error` evaluates to; typed as `ret` for composition.
    pub fn throw_exception(ret: Type, error: impl Into<Expr>) -> ComposeResult<Closure> {
        Closure::fold(&Handle::throw_exception(ret)?, [error.into()])
    }
}

pub(crate) fn ordering_to_int(ordering: Ordering) -> Value {
    Value::Int(match ordering {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    })
}

fn array_type(op: &str, array: &Expr) -> ComposeResult<Type> {
    match array.ty() {
        ty @ Type::Array(_) => Ok(ty.clone()),
        other => Err(ComposeError::signature(format!(
            "{op} needs an array, got {other}"
        ))),
    }
}

fn array_length_arg(length: &Value) -> InvokeResult<usize> {
    let length = length.expect_int()?;
    usize::try_from(length).map_err(|_| {
        Exception::new(
            "NegativeArraySizeException",
            format!("array length {length} is negative"),
        )
        .into()
    })
}
