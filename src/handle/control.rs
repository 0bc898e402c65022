use super::*;

fn expect_params(what: &str, handle: &Handle, expected: &[Type]) -> ComposeResult<()> {
    if &handle.params[..] != expected {
        return Err(ComposeError::signature(format!(
            "{what} must take {} but is {}",
            describe_types(expected),
            handle.signature()
        )));
    }
    Ok(())
}

fn expect_return(what: &str, handle: &Handle, expected: &Type) -> ComposeResult<()> {
    if handle.ret != *expected {
        return Err(ComposeError::signature(format!(
            "{what} must return {expected} but is {}",
            handle.signature()
        )));
    }
    Ok(())
}

fn prefixed(locals: &[Type], rest: &[Type]) -> Vec<Type> {
    locals.iter().chain(rest.iter()).cloned().collect()
}

fn frame(locals: Vec<Value>, args: &[Value]) -> Vec<Value> {
    let mut frame = locals;
    frame.extend_from_slice(args);
    frame
}

impl Handle {
    /// Runs `then` or `otherwise` depending on `test`, which sees a prefix
    /// of the arguments. Only the selected branch executes.
    pub fn guard_with_test(
        test: &Handle,
        then: &Handle,
        otherwise: &Handle,
    ) -> ComposeResult<Handle> {
        expect_return("guard test", test, &Type::Bool)?;
        expect_params("else branch", otherwise, &then.params)?;
        expect_return("else branch", otherwise, &then.ret)?;
        if test.params.len() > then.params.len()
            || test.params[..] != then.params[..test.params.len()]
        {
            return Err(ComposeError::signature(format!(
                "guard test {} does not match branch {}",
                test.signature(),
                then.signature()
            )));
        }
        let (test, then, otherwise) = (test.clone(), then.clone(), otherwise.clone());
        let width = test.params.len();
        Ok(Self::from_op(
            then.params.to_vec(),
            then.ret.clone(),
            move |args: &[Value]| {
                if test.call(&args[..width])?.expect_bool()? {
                    then.call(args)
                } else {
                    otherwise.call(args)
                }
            },
        ))
    }

    /// `v = init(a..); while pred(v, a..) { v = body(v, a..) }; v`
    pub fn while_loop(init: &Handle, pred: &Handle, body: &Handle) -> ComposeResult<Handle> {
        let state = loop_state(init)?;
        let local = prefixed(std::slice::from_ref(&state), &init.params);
        expect_params("loop predicate", pred, &local)?;
        expect_return("loop predicate", pred, &Type::Bool)?;
        expect_params("loop body", body, &local)?;
        expect_return("loop body", body, &state)?;
        let (init, pred, body) = (init.clone(), pred.clone(), body.clone());
        Ok(Self::from_op(
            init.params.to_vec(),
            state,
            move |args: &[Value]| {
                let mut frame = frame(vec![init.call(args)?], args);
                while pred.call(&frame)?.expect_bool()? {
                    frame[0] = body.call(&frame)?;
                }
                Ok(frame.swap_remove(0))
            },
        ))
    }

    /// `v = init(a..); do { v = body(v, a..) } while pred(v, a..); v`
    pub fn do_while_loop(init: &Handle, body: &Handle, pred: &Handle) -> ComposeResult<Handle> {
        let state = loop_state(init)?;
        let local = prefixed(std::slice::from_ref(&state), &init.params);
        expect_params("loop body", body, &local)?;
        expect_return("loop body", body, &state)?;
        expect_params("loop predicate", pred, &local)?;
        expect_return("loop predicate", pred, &Type::Bool)?;
        let (init, pred, body) = (init.clone(), pred.clone(), body.clone());
        Ok(Self::from_op(
            init.params.to_vec(),
            state,
            move |args: &[Value]| {
                let mut frame = frame(vec![init.call(args)?], args);
                loop {
                    frame[0] = body.call(&frame)?;
                    if !pred.call(&frame)?.expect_bool()? {
                        break;
                    }
                }
                Ok(frame.swap_remove(0))
            },
        ))
    }

    /// Iterates `i` over `[start(a..), end(a..))`, `v = body(v, i, a..)`.
    pub fn counted_loop(
        start: &Handle,
        end: &Handle,
        init: &Handle,
        body: &Handle,
    ) -> ComposeResult<Handle> {
        let state = loop_state(init)?;
        expect_params("loop start", start, &init.params)?;
        expect_return("loop start", start, &Type::Int)?;
        expect_params("loop end", end, &init.params)?;
        expect_return("loop end", end, &Type::Int)?;
        expect_params(
            "loop body",
            body,
            &prefixed(&[state.clone(), Type::Int], &init.params),
        )?;
        expect_return("loop body", body, &state)?;
        let (start, end, init, body) = (start.clone(), end.clone(), init.clone(), body.clone());
        Ok(Self::from_op(
            init.params.to_vec(),
            state,
            move |args: &[Value]| {
                let from = start.call(args)?.expect_int()?;
                let to = end.call(args)?.expect_int()?;
                let mut frame = frame(vec![init.call(args)?, Value::Int(from)], args);
                for i in from..to {
                    frame[1] = Value::Int(i);
                    frame[0] = body.call(&frame)?;
                }
                Ok(frame.swap_remove(0))
            },
        ))
    }

    /// Drains `iterator(a..)`, `v = body(v, element, a..)` per element.
    pub fn iterated_loop(iterator: &Handle, init: &Handle, body: &Handle) -> ComposeResult<Handle> {
        let state = loop_state(init)?;
        let elem = match &iterator.ret {
            Type::Iterator(elem) => (**elem).clone(),
            _ => {
                return Err(ComposeError::signature(format!(
                    "loop source must return an iterator but is {}",
                    iterator.signature()
                )))
            }
        };
        expect_params("loop source", iterator, &init.params)?;
        expect_params("loop body", body, &prefixed(&[state.clone(), elem], &init.params))?;
        expect_return("loop body", body, &state)?;
        let (iterator, init, body) = (iterator.clone(), init.clone(), body.clone());
        Ok(Self::from_op(
            init.params.to_vec(),
            state,
            move |args: &[Value]| {
                let source = match iterator.call(args)? {
                    Value::Iterator(source) => source,
                    other => {
                        return Err(Exception::null_pointer(format!(
                            "loop source produced {}",
                            other.type_name()
                        ))
                        .into())
                    }
                };
                let mut frame = frame(vec![init.call(args)?, Value::Null], args);
                while let Some(element) = source.next_value() {
                    frame[1] = element;
                    frame[0] = body.call(&frame)?;
                }
                Ok(frame.swap_remove(0))
            },
        ))
    }

    /// Runs `handler(error, a..)` when this handle fails with an exception of
    /// `class`; other failures pass through untouched.
    pub fn catch_exception(&self, class: &str, handler: &Handle) -> ComposeResult<Handle> {
        expect_params("exception handler", handler, &prefixed(&[Type::Error], &self.params))?;
        expect_return("exception handler", handler, &self.ret)?;
        let (target, handler) = (self.clone(), handler.clone());
        let class = class.to_string();
        Ok(Self::from_op(
            self.params.to_vec(),
            self.ret.clone(),
            move |args: &[Value]| match target.call(args) {
                Err(error) if error.exception().is_instance_of(&class) => {
                    let caught = Value::Error(error.into_exception());
                    handler.call(&frame(vec![caught], args))
                }
                other => other,
            },
        ))
    }

    /// Always runs `cleanup(error-or-null, value-or-default, a..)` after this
    /// handle (the value slot is absent for a void result). On success the
    /// cleanup result is returned; on failure the original error is raised
    /// again once cleanup completes.
    pub fn try_finally(&self, cleanup: &Handle) -> ComposeResult<Handle> {
        let void = self.ret.is_void();
        let locals = if void {
            vec![Type::Error]
        } else {
            vec![Type::Error, self.ret.clone()]
        };
        expect_params("cleanup", cleanup, &prefixed(&locals, &self.params))?;
        expect_return("cleanup", cleanup, &self.ret)?;
        let (target, cleanup) = (self.clone(), cleanup.clone());
        let fallback = self.ret.default_value();
        Ok(Self::from_op(
            self.params.to_vec(),
            self.ret.clone(),
            move |args: &[Value]| {
                let outcome = target.call(args);
                let (error, value) = match &outcome {
                    Ok(value) => (Value::Null, value.clone()),
                    Err(error) => (Value::Error(error.exception().clone()), fallback.clone()),
                };
                let locals = if void { vec![error] } else { vec![error, value] };
                let cleaned = cleanup.call(&frame(locals, args))?;
                match outcome {
                    Ok(_) => Ok(cleaned),
                    Err(error) => Err(error),
                }
            },
        ))
    }

    /// Raises the error passed as the only argument; declared to return `ret`.
    pub fn throw_exception(ret: Type) -> ComposeResult<Handle> {
        Self::native(vec![Type::Error], ret, |args: &[Value]| match &args[0] {
            Value::Error(exception) => Err(exception.clone().into()),
            _ => Err(Exception::null_pointer("cannot throw null").into()),
        })
    }
}

fn loop_state(init: &Handle) -> ComposeResult<Type> {
    if init.ret.is_void() {
        return Err(ComposeError::protocol(format!(
            "loop state must have a value, but init is {}",
            init.signature()
        )));
    }
    Ok(init.ret.clone())
}
