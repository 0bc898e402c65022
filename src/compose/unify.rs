use super::{Closure, Var, VarKey};
use crate::error::{ComposeError, ComposeResult};
use crate::types::Type;
use log::trace;
use std::collections::HashMap;

/// Canonical free-var vector shared by several closures that must be combined
/// into one control-flow primitive.
pub struct SigUnifier {
    vars: Vec<Var>,
    index: HashMap<VarKey, usize>,
}

impl SigUnifier {
    /// Every distinct var of `sources`, in first-occurrence order.
    pub fn new<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = &'a [Var]>,
    {
        let mut vars = Vec::new();
        let mut index = HashMap::new();
        for var in sources.into_iter().flatten() {
            index.entry(var.key()).or_insert_with(|| {
                vars.push(var.clone());
                vars.len() - 1
            });
        }
        trace!("unified signature {:?}", vars);
        Self { vars, index }
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn types(&self) -> Vec<Type> {
        self.vars.iter().map(|var| var.ty().clone()).collect()
    }

    pub fn unify(&self, closure: &Closure) -> ComposeResult<Closure> {
        self.unify_without_first(closure, 0)
    }

    /// Keeps the first `count` arguments in place and maps the rest onto the
    /// canonical vector, giving parameters `locals ++ vars()`.
    pub fn unify_without_first(&self, closure: &Closure, count: usize) -> ComposeResult<Closure> {
        if count > closure.args().len() {
            return Err(ComposeError::signature(format!(
                "cannot keep {count} leading arguments of a closure over {:?}",
                closure.args()
            )));
        }
        let reorder = closure
            .args()
            .iter()
            .enumerate()
            .map(|(i, var)| {
                if i < count {
                    return Ok(i);
                }
                self.index
                    .get(&var.key())
                    .map(|j| j + count)
                    .ok_or_else(|| {
                        ComposeError::signature(format!("{var:?} is not part of the unified signature"))
                    })
            })
            .collect::<ComposeResult<Vec<usize>>>()?;
        let mut args: Vec<Var> = closure.args()[..count].to_vec();
        args.extend(self.vars.iter().cloned());
        let params = args.iter().map(|var| var.ty().clone()).collect();
        Closure::new(closure.handle().permute(params, reorder)?, args)
    }
}
