use super::*;

impl Handle {
    pub fn identity(ty: Type) -> ComposeResult<Handle> {
        Self::native(vec![ty.clone()], ty, |args: &[Value]| Ok(args[0].clone()))
    }

    pub fn constant(ty: Type, value: Value) -> ComposeResult<Handle> {
        if !ty.admits(&value) {
            return Err(ComposeError::signature(format!(
                "constant of type {} cannot hold {}",
                ty,
                value.type_name()
            )));
        }
        Ok(Self::from_op(Vec::new(), ty, move |_: &[Value]| {
            Ok(value.clone())
        }))
    }

    /// Returns no value, ignoring every argument.
    pub fn empty(params: Vec<Type>) -> ComposeResult<Handle> {
        Self::native(params, Type::Void, |_: &[Value]| Ok(Value::Unit))
    }

    /// Returns argument `index` out of `params`.
    pub fn project(params: Vec<Type>, index: usize) -> ComposeResult<Handle> {
        let ret = params.get(index).cloned().ok_or_else(|| {
            ComposeError::signature(format!(
                "cannot project argument {index} out of {}",
                describe_types(&params)
            ))
        })?;
        Self::native(params, ret, move |args: &[Value]| Ok(args[index].clone()))
    }

    /// Reorders arguments: original argument `i` is taken from new position
    /// `reorder[i]`. New positions may be used several times or not at all.
    pub fn permute(&self, new_params: Vec<Type>, reorder: Vec<usize>) -> ComposeResult<Handle> {
        if reorder.len() != self.params.len() {
            return Err(ComposeError::signature(format!(
                "reorder of length {} does not cover {}",
                reorder.len(),
                self.signature()
            )));
        }
        check_params(&new_params)?;
        for (i, &j) in reorder.iter().enumerate() {
            match new_params.get(j) {
                Some(ty) if *ty == self.params[i] => {}
                Some(ty) => {
                    return Err(ComposeError::signature(format!(
                        "argument {i} of {} expects {} but position {j} has {}",
                        self.signature(),
                        self.params[i],
                        ty
                    )))
                }
                None => {
                    return Err(ComposeError::signature(format!(
                        "position {j} is outside of {}",
                        describe_types(&new_params)
                    )))
                }
            }
        }
        let identity = reorder.len() == new_params.len()
            && reorder.iter().enumerate().all(|(i, &j)| i == j);
        if identity {
            return Ok(self.clone());
        }
        let target = self.clone();
        Ok(Self::from_op(
            new_params,
            self.ret.clone(),
            move |args: &[Value]| {
                let permuted: Vec<Value> = reorder.iter().map(|&j| args[j].clone()).collect();
                target.call(&permuted)
            },
        ))
    }

    /// Pre-processes arguments starting at `pos` with `filter`.
    ///
    /// The filter runs first; its result (unless void) takes the place of
    /// argument `pos` of this handle. A void filter inserts its parameters
    /// at `pos` without consuming any argument.
    pub fn collect(&self, pos: usize, filter: &Handle) -> ComposeResult<Handle> {
        let consumes = !filter.ret.is_void();
        if consumes {
            match self.params.get(pos) {
                Some(ty) if *ty == filter.ret => {}
                _ => {
                    return Err(ComposeError::signature(format!(
                        "cannot collect {} into argument {pos} of {}",
                        filter.signature(),
                        self.signature()
                    )))
                }
            }
        } else if pos > self.params.len() {
            return Err(ComposeError::signature(format!(
                "collect position {pos} is outside of {}",
                self.signature()
            )));
        }
        let rest = if consumes { pos + 1 } else { pos };
        let mut params: Vec<Type> = self.params[..pos].to_vec();
        params.extend(filter.params.iter().cloned());
        params.extend(self.params[rest..].iter().cloned());

        let target = self.clone();
        let filter = filter.clone();
        let width = filter.params.len();
        Ok(Self::from_op(
            params,
            self.ret.clone(),
            move |args: &[Value]| {
                let produced = filter.call(&args[pos..pos + width])?;
                let mut inner: Vec<Value> = Vec::with_capacity(args.len() + 1 - width);
                inner.extend_from_slice(&args[..pos]);
                if consumes {
                    inner.push(produced);
                }
                inner.extend_from_slice(&args[pos + width..]);
                target.call(&inner)
            },
        ))
    }

    /// Inserts ignored parameters of `types` at `pos`.
    pub fn drop_args(&self, pos: usize, types: &[Type]) -> ComposeResult<Handle> {
        if pos > self.params.len() {
            return Err(ComposeError::signature(format!(
                "drop position {pos} is outside of {}",
                self.signature()
            )));
        }
        check_params(types)?;
        if types.is_empty() {
            return Ok(self.clone());
        }
        let mut params: Vec<Type> = self.params[..pos].to_vec();
        params.extend(types.iter().cloned());
        params.extend(self.params[pos..].iter().cloned());

        let target = self.clone();
        let width = types.len();
        Ok(Self::from_op(
            params,
            self.ret.clone(),
            move |args: &[Value]| {
                let mut inner: Vec<Value> = Vec::with_capacity(args.len() - width);
                inner.extend_from_slice(&args[..pos]);
                inner.extend_from_slice(&args[pos + width..]);
                target.call(&inner)
            },
        ))
    }

    /// Post-processes the result with `filter`, which takes the result as its
    /// only parameter (or no parameter for a void result).
    pub fn filter_return(&self, filter: &Handle) -> ComposeResult<Handle> {
        let expected: &[Type] = if self.ret.is_void() {
            &[]
        } else {
            std::slice::from_ref(&self.ret)
        };
        if &filter.params[..] != expected {
            return Err(ComposeError::signature(format!(
                "cannot filter result of {} with {}",
                self.signature(),
                filter.signature()
            )));
        }
        let target = self.clone();
        let filter = filter.clone();
        let void = self.ret.is_void();
        Ok(Self::from_op(
            self.params.to_vec(),
            filter.ret.clone(),
            move |args: &[Value]| {
                let produced = target.call(args)?;
                if void {
                    filter.call(&[])
                } else {
                    filter.call(std::slice::from_ref(&produced))
                }
            },
        ))
    }

    /// Converts the result to `ty`; fails when no conversion exists.
    pub fn convert(&self, ty: &Type) -> ComposeResult<Handle> {
        let conversion = Conversion::between(&self.ret, ty).ok_or_else(|| {
            ComposeError::signature(format!(
                "cannot convert result of {} to {ty}",
                self.signature()
            ))
        })?;
        if matches!(conversion, Conversion::Identity) && self.ret == *ty {
            return Ok(self.clone());
        }
        let target = self.clone();
        Ok(Self::from_op(
            self.params.to_vec(),
            ty.clone(),
            move |args: &[Value]| conversion.apply(target.call(args)?),
        ))
    }
}
