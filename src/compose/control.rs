use super::{Closure, Expr, SigUnifier, Var};
use crate::error::{ComposeError, ComposeResult};
use crate::handle::Handle;
use crate::types::Type;
use crate::value::{Exception, IteratorValue, Value};
use log::debug;

fn expect_type(what: &str, closure: &Closure, ty: &Type) -> ComposeResult<()> {
    if closure.ty() != ty {
        return Err(ComposeError::signature(format!(
            "{what} must produce {ty}, got {}",
            closure.ty()
        )));
    }
    Ok(())
}

fn loop_state(init: &Closure) -> ComposeResult<Var> {
    if init.ty().is_void() {
        return Err(ComposeError::protocol("loop state must have a value"));
    }
    Var::local(init.ty().clone())
}

/// Builds a loop piece over fresh `locals` and moves them to the front.
fn local_closure<F>(locals: &[Var], f: F) -> ComposeResult<Closure>
where
    F: FnOnce() -> ComposeResult<Closure>,
{
    f()?.with_locals(locals)
}

impl Closure {
    /// Evaluates `cond`, then only the selected branch.
    pub fn if_then_else(
        cond: impl Into<Expr>,
        then: impl Into<Expr>,
        otherwise: impl Into<Expr>,
    ) -> ComposeResult<Closure> {
        let cond = cond.into();
        if *cond.ty() != Type::Bool {
            return Err(ComposeError::signature(format!(
                "condition must be bool, got {}",
                cond.ty()
            )));
        }
        let then = then.into().as_closure()?;
        let otherwise = otherwise.into().as_closure()?;
        expect_type("else branch", &otherwise, then.ty())?;

        let unifier = SigUnifier::new([then.args(), otherwise.args()]);
        let then = unifier.unify(&then)?;
        let otherwise = unifier.unify(&otherwise)?;
        let guard = Handle::guard_with_test(
            &Handle::identity(Type::Bool)?,
            &then.handle().drop_args(0, &[Type::Bool])?,
            &otherwise.handle().drop_args(0, &[Type::Bool])?,
        )?;
        let mut args = vec![cond];
        args.extend(unifier.vars().iter().map(Expr::from));
        Closure::fold(&guard, args)
    }

    pub fn if_then(cond: impl Into<Expr>, then: impl Into<Expr>) -> ComposeResult<Closure> {
        let then = then.into().as_closure()?.cast(&Type::Void)?;
        Self::if_then_else(cond, then, Self::constant_void()?)
    }

    /// `v = init; while pred(v) { v = body(v) }; v`
    pub fn while_loop<P, B>(init: impl Into<Expr>, pred: P, body: B) -> ComposeResult<Closure>
    where
        P: FnOnce(&Var) -> ComposeResult<Closure>,
        B: FnOnce(&Var) -> ComposeResult<Closure>,
    {
        let init = init.into().as_closure()?;
        let state = loop_state(&init)?;
        let locals = [state.clone()];
        let pred = local_closure(&locals, || pred(&state))?;
        let body = local_closure(&locals, || body(&state))?;
        let unifier = SigUnifier::new([init.args(), &pred.args()[1..], &body.args()[1..]]);
        debug!("while loop over {:?}", unifier.vars());
        let handle = Handle::while_loop(
            unifier.unify(&init)?.handle(),
            unifier.unify_without_first(&pred, 1)?.handle(),
            unifier.unify_without_first(&body, 1)?.handle(),
        )?;
        Closure::new(handle, unifier.vars().to_vec())
    }

    /// `v = init; do { v = body(v) } while pred(v); v`
    pub fn do_while_loop<B, P>(init: impl Into<Expr>, body: B, pred: P) -> ComposeResult<Closure>
    where
        B: FnOnce(&Var) -> ComposeResult<Closure>,
        P: FnOnce(&Var) -> ComposeResult<Closure>,
    {
        let init = init.into().as_closure()?;
        let state = loop_state(&init)?;
        let locals = [state.clone()];
        let body = local_closure(&locals, || body(&state))?;
        let pred = local_closure(&locals, || pred(&state))?;
        let unifier = SigUnifier::new([init.args(), &body.args()[1..], &pred.args()[1..]]);
        debug!("do-while loop over {:?}", unifier.vars());
        let handle = Handle::do_while_loop(
            unifier.unify(&init)?.handle(),
            unifier.unify_without_first(&body, 1)?.handle(),
            unifier.unify_without_first(&pred, 1)?.handle(),
        )?;
        Closure::new(handle, unifier.vars().to_vec())
    }

    /// Runs `body(v, i)` for every `i` in `start..end`.
    pub fn counted_loop<B>(
        start: impl Into<Expr>,
        end: impl Into<Expr>,
        init: impl Into<Expr>,
        body: B,
    ) -> ComposeResult<Closure>
    where
        B: FnOnce(&Var, &Var) -> ComposeResult<Closure>,
    {
        let start = start.into().as_closure()?;
        let end = end.into().as_closure()?;
        expect_type("loop start", &start, &Type::Int)?;
        expect_type("loop end", &end, &Type::Int)?;
        let init = init.into().as_closure()?;
        let state = loop_state(&init)?;
        let index = Var::local(Type::Int)?;
        let body = local_closure(&[state.clone(), index.clone()], || body(&state, &index))?;
        let unifier = SigUnifier::new([start.args(), end.args(), init.args(), &body.args()[2..]]);
        debug!("counted loop over {:?}", unifier.vars());
        let handle = Handle::counted_loop(
            unifier.unify(&start)?.handle(),
            unifier.unify(&end)?.handle(),
            unifier.unify(&init)?.handle(),
            unifier.unify_without_first(&body, 2)?.handle(),
        )?;
        Closure::new(handle, unifier.vars().to_vec())
    }

    /// Runs `body(v, element)` for every element `iterator` produces.
    pub fn iterator_loop<B>(
        iterator: impl Into<Expr>,
        init: impl Into<Expr>,
        body: B,
    ) -> ComposeResult<Closure>
    where
        B: FnOnce(&Var, &Var) -> ComposeResult<Closure>,
    {
        let iterator = iterator.into().as_closure()?;
        let elem = match iterator.ty() {
            Type::Iterator(elem) => (**elem).clone(),
            other => {
                return Err(ComposeError::signature(format!(
                    "loop source must be an iterator, got {other}"
                )))
            }
        };
        let init = init.into().as_closure()?;
        let state = loop_state(&init)?;
        let element = Var::local(elem)?;
        let body = local_closure(&[state.clone(), element.clone()], || body(&state, &element))?;
        let unifier = SigUnifier::new([iterator.args(), init.args(), &body.args()[2..]]);
        debug!("iterator loop over {:?}", unifier.vars());
        let handle = Handle::iterated_loop(
            unifier.unify(&iterator)?.handle(),
            unifier.unify(&init)?.handle(),
            unifier.unify_without_first(&body, 2)?.handle(),
        )?;
        Closure::new(handle, unifier.vars().to_vec())
    }

    /// [`Closure::iterator_loop`] over the elements of a list.
    pub fn iterable_loop<B>(
        list: impl Into<Expr>,
        init: impl Into<Expr>,
        body: B,
    ) -> ComposeResult<Closure>
    where
        B: FnOnce(&Var, &Var) -> ComposeResult<Closure>,
    {
        let list = list.into();
        let elem = match list.ty() {
            Type::List(elem) => (**elem).clone(),
            other => {
                return Err(ComposeError::signature(format!(
                    "loop source must be a list, got {other}"
                )))
            }
        };
        let iterator = Self::native(Type::iterator(elem), [list], |args: &[Value]| {
            match &args[0] {
                Value::List(items) => {
                    let items = items.clone();
                    let iter = (0..items.len()).map(move |i| items[i].clone());
                    Ok(Value::Iterator(IteratorValue::new(iter)))
                }
                _ => Err(Exception::null_pointer("cannot iterate null").into()),
            }
        })?;
        Self::iterator_loop(iterator, init, body)
    }

    /// Runs `handler(error)` when `body` fails with an exception of `class`.
    pub fn catch_exception<H>(body: impl Into<Expr>, class: &str, handler: H) -> ComposeResult<Closure>
    where
        H: FnOnce(&Var) -> ComposeResult<Closure>,
    {
        let body = body.into().as_closure()?;
        let error = Var::local(Type::Error)?;
        let handler = local_closure(std::slice::from_ref(&error), || handler(&error))?;
        expect_type("exception handler", &handler, body.ty())?;
        let unifier = SigUnifier::new([body.args(), &handler.args()[1..]]);
        debug!("catch {class} over {:?}", unifier.vars());
        let handle = unifier
            .unify(&body)?
            .handle()
            .catch_exception(class, unifier.unify_without_first(&handler, 1)?.handle())?;
        Closure::new(handle, unifier.vars().to_vec())
    }

    /// Runs `cleanup(error, value)` after `body` whatever its outcome.
    ///
    /// `error` is null when `body` succeeded; `value` is `None` for a void
    /// body and holds the type's default value when `body` failed. A failed
    /// body's error is raised again after cleanup.
    pub fn try_finally<C>(body: impl Into<Expr>, cleanup: C) -> ComposeResult<Closure>
    where
        C: FnOnce(&Var, Option<&Var>) -> ComposeResult<Closure>,
    {
        let body = body.into().as_closure()?;
        let error = Var::local(Type::Error)?;
        let mut locals = vec![error.clone()];
        let value = if body.ty().is_void() {
            None
        } else {
            let value = Var::local(body.ty().clone())?;
            locals.push(value.clone());
            Some(value)
        };
        let cleanup = local_closure(&locals, || cleanup(&error, value.as_ref()))?;
        expect_type("cleanup", &cleanup, body.ty())?;
        let count = locals.len();
        let unifier = SigUnifier::new([body.args(), &cleanup.args()[count..]]);
        debug!("try-finally over {:?}", unifier.vars());
        let handle = unifier
            .unify(&body)?
            .handle()
            .try_finally(unifier.unify_without_first(&cleanup, count)?.handle())?;
        Closure::new(handle, unifier.vars().to_vec())
    }
}
