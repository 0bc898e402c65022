use crate::error::{ComposeError, ComposeResult, InvocationError, InvokeResult};
use crate::types::{describe_types, Type};
use crate::value::{Exception, Value};
use std::fmt;
use std::sync::Arc;

mod control;
mod convert;
mod reshape;
#[cfg(test)]
mod tests;

pub(crate) use convert::Conversion;

/// A native operation with a fixed signature, invoked positionally.
pub trait PrimitiveCallable: Send + Sync {
    fn param_types(&self) -> &[Type];
    fn return_type(&self) -> &Type;
    fn invoke(&self, args: &[Value]) -> InvokeResult<Value>;
}

/// Body of a [`Handle`]. Arguments are trusted to match the signature.
type Op = dyn Fn(&[Value]) -> InvokeResult<Value> + Send + Sync;

/// Typed, immutable, cheaply cloned callable.
///
/// All reshaping (`permute`, `collect`, `drop_args`, loops, ...) produces a
/// new handle wrapping the old ones; nothing is interpreted at call time
/// beyond the nested calls themselves.
#[derive(Clone)]
pub struct Handle {
    params: Arc<[Type]>,
    ret: Type,
    op: Arc<Op>,
}

impl Handle {
    fn from_op<F>(params: Vec<Type>, ret: Type, op: F) -> Self
    where
        F: Fn(&[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        Self {
            params: params.into(),
            ret,
            op: Arc::new(op),
        }
    }

    /// Wraps a Rust function. Parameter types must not be `Void`.
    pub fn native<F>(params: Vec<Type>, ret: Type, f: F) -> ComposeResult<Handle>
    where
        F: Fn(&[Value]) -> InvokeResult<Value> + Send + Sync + 'static,
    {
        check_params(&params)?;
        Ok(Self::from_op(params, ret, f))
    }

    pub fn from_callable(callable: Arc<dyn PrimitiveCallable>) -> ComposeResult<Handle> {
        let params = callable.param_types().to_vec();
        let ret = callable.return_type().clone();
        check_params(&params)?;
        Ok(Self::from_op(params, ret, move |args: &[Value]| {
            callable.invoke(args)
        }))
    }

    pub fn param_types(&self) -> &[Type] {
        &self.params
    }

    pub fn return_type(&self) -> &Type {
        &self.ret
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Checked entry point for callers outside the engine.
    pub fn invoke(&self, args: &[Value]) -> InvokeResult<Value> {
        if args.len() != self.params.len() {
            return Err(wrong_method_type(format!(
                "expected {} arguments {} but received {}",
                self.params.len(),
                describe_types(&self.params),
                args.len()
            )));
        }
        for (index, (ty, value)) in self.params.iter().zip(args).enumerate() {
            if !ty.admits(value) {
                return Err(wrong_method_type(format!(
                    "argument {index} expects {ty} but received {}",
                    value.type_name()
                )));
            }
        }
        self.call(args)
    }

    pub(crate) fn call(&self, args: &[Value]) -> InvokeResult<Value> {
        (self.op)(args)
    }

    pub(crate) fn signature(&self) -> String {
        format!("{} -> {}", describe_types(&self.params), self.ret)
    }
}

impl PrimitiveCallable for Handle {
    fn param_types(&self) -> &[Type] {
        &self.params
    }

    fn return_type(&self) -> &Type {
        &self.ret
    }

    fn invoke(&self, args: &[Value]) -> InvokeResult<Value> {
        Handle::invoke(self, args)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle{}", self.signature())
    }
}

fn check_params(params: &[Type]) -> ComposeResult<()> {
    if let Some(index) = params.iter().position(Type::is_void) {
        return Err(ComposeError::signature(format!(
            "parameter {index} of {} has type void",
            describe_types(params)
        )));
    }
    Ok(())
}

fn wrong_method_type(message: String) -> InvocationError {
    Exception::new("WrongMethodTypeException", message).into()
}
