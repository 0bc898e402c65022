use crate::error::{ComposeError, ComposeResult};
use crate::handle::Handle;
use crate::types::Type;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

mod builder;
mod closure;
mod control;
mod ops;
mod unify;

pub use builder::{ClosureBuilder, FunctionBuilder};
pub use closure::Closure;
pub use unify::SigUnifier;

static NEXT_FUNCTION_ID: AtomicU64 = AtomicU64::new(1);

/// Scope tag shared by every variable one builder (or loop body) creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(u64);

impl FunctionId {
    pub fn next() -> Self {
        FunctionId(NEXT_FUNCTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct VarKey {
    function: FunctionId,
    ordinal: u32,
}

pub(crate) enum VarKind {
    Param { ty: Type },
    Invoke { closure: Closure },
}

/// A binding site: a function parameter or the result of an earlier statement.
///
/// Two vars are equal only if they were created by the same call; the type and
/// the bound closure take no part in comparisons.
#[derive(Clone)]
pub struct Var {
    key: VarKey,
    kind: Arc<VarKind>,
}

impl Var {
    pub(crate) fn param(function: FunctionId, ordinal: u32, ty: Type) -> ComposeResult<Var> {
        if ty.is_void() {
            return Err(ComposeError::protocol("parameter type must not be void"));
        }
        Ok(Var {
            key: VarKey { function, ordinal },
            kind: Arc::new(VarKind::Param { ty }),
        })
    }

    pub(crate) fn invoke(function: FunctionId, ordinal: u32, closure: Closure) -> Var {
        Var {
            key: VarKey { function, ordinal },
            kind: Arc::new(VarKind::Invoke { closure }),
        }
    }

    /// A parameter of a fresh scope, used for loop states and caught errors.
    pub(crate) fn local(ty: Type) -> ComposeResult<Var> {
        Var::param(FunctionId::next(), 0, ty)
    }

    pub(crate) fn key(&self) -> VarKey {
        self.key
    }

    pub fn function_id(&self) -> FunctionId {
        self.key.function
    }

    pub fn ty(&self) -> &Type {
        match &*self.kind {
            VarKind::Param { ty } => ty,
            VarKind::Invoke { closure } => closure.ty(),
        }
    }

    pub fn is_param(&self) -> bool {
        matches!(&*self.kind, VarKind::Param { .. })
    }

    pub(crate) fn bound_closure(&self) -> Option<&Closure> {
        match &*self.kind {
            VarKind::Param { .. } => None,
            VarKind::Invoke { closure } => Some(closure),
        }
    }

    /// Identity closure reading this var; a no-op for a void var.
    pub fn as_closure(&self) -> ComposeResult<Closure> {
        if self.ty().is_void() {
            return Closure::new(Handle::empty(Vec::new())?, Vec::new());
        }
        Closure::new(Handle::identity(self.ty().clone())?, vec![self.clone()])
    }

    pub fn cast(&self, ty: &Type) -> ComposeResult<Closure> {
        self.as_closure()?.cast(ty)
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Var {}

impl std::hash::Hash for Var {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Var {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Var {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.is_param() { "p" } else { "v" };
        write!(
            f,
            "{prefix}{}#{}: {}",
            self.key.ordinal,
            self.key.function.0,
            self.ty()
        )
    }
}

/// Argument of a composition: a var, used as is, or a closure, inlined.
#[derive(Clone, Debug)]
pub enum Expr {
    Var(Var),
    Closure(Closure),
}

impl Expr {
    pub fn ty(&self) -> &Type {
        match self {
            Expr::Var(var) => var.ty(),
            Expr::Closure(closure) => closure.ty(),
        }
    }

    pub fn as_closure(&self) -> ComposeResult<Closure> {
        match self {
            Expr::Var(var) => var.as_closure(),
            Expr::Closure(closure) => Ok(closure.clone()),
        }
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Expr::Var(var)
    }
}

impl From<&Var> for Expr {
    fn from(var: &Var) -> Self {
        Expr::Var(var.clone())
    }
}

impl From<Closure> for Expr {
    fn from(closure: Closure) -> Self {
        Expr::Closure(closure)
    }
}

impl From<&Closure> for Expr {
    fn from(closure: &Closure) -> Self {
        Expr::Closure(closure.clone())
    }
}
