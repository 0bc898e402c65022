use super::{Expr, Var, VarKey};
use crate::error::{ComposeError, ComposeResult, InvokeResult};
use crate::handle::Handle;
use crate::types::{describe_types, Type};
use crate::value::Value;
use log::trace;
use std::collections::HashMap;

/// A handle wired to the vars that feed its parameters.
#[derive(Clone, Debug)]
pub struct Closure {
    handle: Handle,
    args: Vec<Var>,
}

impl Closure {
    pub fn new(handle: Handle, args: Vec<Var>) -> ComposeResult<Closure> {
        check_args(&handle, args.iter().map(Var::ty))?;
        Ok(Closure { handle, args })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn args(&self) -> &[Var] {
        &self.args
    }

    pub fn ty(&self) -> &Type {
        self.handle.return_type()
    }

    pub fn into_handle(self) -> Handle {
        self.handle
    }

    /// Runs the closure with one value per free var, in `args()` order.
    pub fn invoke(&self, values: &[Value]) -> InvokeResult<Value> {
        self.handle.invoke(values)
    }

    /// Applies `handle` to `args`, inlining closure arguments.
    ///
    /// Arguments are evaluated left to right. The free vars of the result are
    /// the leaf vars of all arguments in that order, each var kept once; a
    /// closure repeated literally is still evaluated once per occurrence.
    pub fn fold<I>(handle: &Handle, args: I) -> ComposeResult<Closure>
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        let args: Vec<Expr> = args.into_iter().map(Into::into).collect();
        check_args(handle, args.iter().map(Expr::ty))?;

        // Collect the rightmost argument first so the outermost filter,
        // which runs first, belongs to argument 0.
        let mut folded = handle.clone();
        for (pos, arg) in args.iter().enumerate().rev() {
            if let Expr::Closure(inner) = arg {
                folded = folded.collect(pos, &inner.handle)?;
            }
        }

        let flat: Vec<Var> = args
            .iter()
            .flat_map(|arg| match arg {
                Expr::Var(var) => vec![var.clone()],
                Expr::Closure(inner) => inner.args.clone(),
            })
            .collect();
        Closure::new(folded, flat)?.dedup()
    }

    /// Collapses repeated vars onto their first occurrence.
    pub(crate) fn dedup(self) -> ComposeResult<Closure> {
        let mut index: HashMap<VarKey, usize> = HashMap::new();
        let mut distinct: Vec<Var> = Vec::new();
        let reorder: Vec<usize> = self
            .args
            .iter()
            .map(|var| {
                *index.entry(var.key()).or_insert_with(|| {
                    distinct.push(var.clone());
                    distinct.len() - 1
                })
            })
            .collect();
        if distinct.len() == self.args.len() {
            return Ok(self);
        }
        trace!(
            "dedup {} args onto {} distinct vars",
            self.args.len(),
            distinct.len()
        );
        let params = distinct.iter().map(|var| var.ty().clone()).collect();
        Closure::new(self.handle.permute(params, reorder)?, distinct)
    }

    /// Reinterprets the result as `ty`; a no-op when the type already matches.
    pub fn cast(&self, ty: &Type) -> ComposeResult<Closure> {
        if self.ty() == ty {
            return Ok(self.clone());
        }
        Closure::new(self.handle.convert(ty)?, self.args.clone())
    }

    pub fn filter_return_value(&self, filter: &Handle) -> ComposeResult<Closure> {
        Closure::new(self.handle.filter_return(filter)?, self.args.clone())
    }

    /// Moves `locals` to the front of the argument list, adding the ones this
    /// closure does not reference as ignored parameters.
    pub(crate) fn with_locals(&self, locals: &[Var]) -> ComposeResult<Closure> {
        let mut args: Vec<Var> = locals.to_vec();
        args.extend(self.args.iter().filter(|var| !locals.contains(var)).cloned());
        let position: HashMap<VarKey, usize> = args
            .iter()
            .enumerate()
            .map(|(i, var)| (var.key(), i))
            .collect();
        let reorder = self.args.iter().map(|var| position[&var.key()]).collect();
        let params = args.iter().map(|var| var.ty().clone()).collect();
        Closure::new(self.handle.permute(params, reorder)?, args)
    }
}

fn check_args<'a>(
    handle: &Handle,
    types: impl ExactSizeIterator<Item = &'a Type>,
) -> ComposeResult<()> {
    let types: Vec<&Type> = types.collect();
    let matches = types.len() == handle.arity()
        && types
            .iter()
            .zip(handle.param_types())
            .all(|(actual, expected)| *actual == expected);
    if !matches {
        let actual: Vec<Type> = types.into_iter().cloned().collect();
        return Err(ComposeError::signature(format!(
            "cannot apply {:?} to {}",
            handle,
            describe_types(&actual)
        )));
    }
    Ok(())
}
