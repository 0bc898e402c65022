use super::{Closure, Expr, FunctionId, Var, VarKey};
use crate::config::ComposeConfig;
use crate::error::{ComposeError, ComposeResult};
use crate::handle::Handle;
use crate::types::Type;
use log::debug;
use std::collections::HashMap;

/// Statement list of one scope plus the inputs it reads.
///
/// Inputs are the declared parameters of a function, or the outer vars a
/// nested scope captured. The live vector before statement `i` is the inputs
/// followed by the valued results of statements `0..i`.
struct Statements {
    function: FunctionId,
    captures: bool,
    inputs: Vec<Var>,
    assignments: Vec<Var>,
    next_ordinal: u32,
}

impl Statements {
    fn new(captures: bool) -> Self {
        Self {
            function: FunctionId::next(),
            captures,
            inputs: Vec::new(),
            assignments: Vec::new(),
            next_ordinal: 0,
        }
    }

    fn ordinal(&mut self) -> u32 {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    fn add_param(&mut self, ty: Type) -> ComposeResult<Var> {
        if !self.assignments.is_empty() {
            return Err(ComposeError::protocol(
                "cannot add a parameter after the function body started",
            ));
        }
        let ordinal = self.ordinal();
        let param = Var::param(self.function, ordinal, ty)?;
        self.inputs.push(param.clone());
        Ok(param)
    }

    fn assign(&mut self, closure: Closure) -> ComposeResult<Var> {
        for arg in closure.args() {
            if arg.function_id() == self.function {
                continue;
            }
            if !self.captures {
                return Err(ComposeError::scope(format!(
                    "{arg:?} belongs to another function and cannot be referenced here"
                )));
            }
            if !self.inputs.contains(arg) {
                self.inputs.push(arg.clone());
            }
        }
        let ordinal = self.ordinal();
        let var = Var::invoke(self.function, ordinal, closure);
        self.assignments.push(var.clone());
        Ok(var)
    }

    /// The var `build` should return: a var of this scope as is, anything
    /// else assigned first.
    fn returned(&mut self, expr: Expr) -> ComposeResult<Var> {
        match expr {
            Expr::Var(var) if var.function_id() == self.function => Ok(var),
            expr => self.assign(expr.as_closure()?),
        }
    }

    fn build(self, ret: &Var) -> ComposeResult<Handle> {
        let live: Vec<Var> = self
            .inputs
            .iter()
            .chain(self.assignments.iter().filter(|var| !var.ty().is_void()))
            .cloned()
            .collect();
        let index: HashMap<VarKey, usize> = live
            .iter()
            .enumerate()
            .map(|(i, var)| (var.key(), i))
            .collect();
        let types: Vec<Type> = live.iter().map(|var| var.ty().clone()).collect();

        // live_len[i]: width of the live vector before statement i.
        let mut live_len = Vec::with_capacity(self.assignments.len() + 1);
        let mut width = self.inputs.len();
        for var in &self.assignments {
            live_len.push(width);
            if !var.ty().is_void() {
                width += 1;
            }
        }
        live_len.push(width);

        if ComposeConfig::global().trace_build {
            debug!("{}", self.plan());
        }

        let mut next = if ret.ty().is_void() {
            Handle::empty(types.clone())?
        } else {
            let at = index.get(&ret.key()).copied().ok_or_else(|| {
                ComposeError::scope(format!("{ret:?} is not visible in this function"))
            })?;
            Handle::project(types.clone(), at)?
        };

        for (i, var) in self.assignments.iter().enumerate().rev() {
            let Some(stmt) = var.bound_closure() else {
                continue;
            };
            let valued = !stmt.ty().is_void();
            let pos = next.arity() - usize::from(valued);
            let collected = next.collect(pos, stmt.handle())?;
            let width = live_len[i];
            let reorder = (0..collected.arity())
                .map(|j| {
                    if j < width {
                        return Ok(j);
                    }
                    let arg = &stmt.args()[j - width];
                    match index.get(&arg.key()) {
                        Some(&at) if at < width => Ok(at),
                        _ => Err(ComposeError::scope(format!(
                            "{arg:?} is not visible at statement {i}"
                        ))),
                    }
                })
                .collect::<ComposeResult<Vec<usize>>>()?;
            next = collected.permute(types[..width].to_vec(), reorder)?;
        }

        debug!(
            "built function #{} with {} inputs and {} statements",
            self.function.raw(),
            self.inputs.len(),
            self.assignments.len()
        );
        Ok(next)
    }

    fn plan(&self) -> String {
        let mut lines = vec![format!(
            "function #{} inputs {:?}",
            self.function.raw(),
            self.inputs
        )];
        for var in &self.assignments {
            if let Some(stmt) = var.bound_closure() {
                lines.push(format!("  {var:?} = {:?}{:?}", stmt.handle(), stmt.args()));
            }
        }
        lines.join("\n")
    }
}

/// Builds a standalone [`Handle`] from declared parameters and statements.
///
/// Vars of other functions cannot be referenced.
pub struct FunctionBuilder {
    statements: Statements,
}

impl Default for FunctionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionBuilder {
    pub fn new() -> Self {
        Self {
            statements: Statements::new(false),
        }
    }

    /// Builder with one declared parameter.
    pub fn p1(ty: Type) -> ComposeResult<(Self, Var)> {
        let mut builder = Self::new();
        let p0 = builder.add_param(ty)?;
        Ok((builder, p0))
    }

    /// Builder with two declared parameters.
    pub fn p2(ty0: Type, ty1: Type) -> ComposeResult<(Self, Var, Var)> {
        let mut builder = Self::new();
        let p0 = builder.add_param(ty0)?;
        let p1 = builder.add_param(ty1)?;
        Ok((builder, p0, p1))
    }

    pub fn function_id(&self) -> FunctionId {
        self.statements.function
    }

    pub fn add_param(&mut self, ty: Type) -> ComposeResult<Var> {
        self.statements.add_param(ty)
    }

    /// Evaluates `expr` once, at this point of the statement sequence.
    pub fn assign(&mut self, expr: impl Into<Expr>) -> ComposeResult<Var> {
        let closure = expr.into().as_closure()?;
        self.statements.assign(closure)
    }

    pub fn build_return(mut self, expr: impl Into<Expr>) -> ComposeResult<Handle> {
        let ret = self.statements.returned(expr.into())?;
        self.statements.build(&ret)
    }

    pub fn build_return_void(self) -> ComposeResult<Handle> {
        self.build_return(Closure::constant_void()?)
    }
}

/// Builds a [`Closure`] in a nested scope. Outer vars referenced by assigned
/// closures become the free vars of the result, in first-use order.
pub struct ClosureBuilder {
    statements: Statements,
}

impl Default for ClosureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClosureBuilder {
    pub fn new() -> Self {
        Self {
            statements: Statements::new(true),
        }
    }

    pub fn function_id(&self) -> FunctionId {
        self.statements.function
    }

    pub fn outer_vars(&self) -> &[Var] {
        &self.statements.inputs
    }

    pub fn assign(&mut self, expr: impl Into<Expr>) -> ComposeResult<Var> {
        let closure = expr.into().as_closure()?;
        self.statements.assign(closure)
    }

    pub fn build_return(mut self, expr: impl Into<Expr>) -> ComposeResult<Closure> {
        let ret = self.statements.returned(expr.into())?;
        let outer = self.statements.inputs.clone();
        let handle = self.statements.build(&ret)?;
        Closure::new(handle, outer)
    }

    pub fn build_return_void(self) -> ComposeResult<Closure> {
        self.build_return(Closure::constant_void()?)
    }
}
