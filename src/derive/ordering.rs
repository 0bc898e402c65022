use super::*;

/// `(Record, Record) -> Int` comparing fields lexicographically in
/// declaration order.
pub fn deep_compare(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let (builder, this, that) = FunctionBuilder::p2(schema.ty(), schema.ty())?;
    builder.build_return(deep_compare_closure(schema, &this, &that)?)
}

pub fn deep_compare_closure(
    schema: &Arc<RecordSchema>,
    this: &Var,
    that: &Var,
) -> ComposeResult<Closure> {
    let mut rest = Closure::constant(0)?;
    for def in schema.fields().iter().rev() {
        let mut step = ClosureBuilder::new();
        let cmp = step.assign(Closure::compare(
            field(schema, &def.name, this)?,
            field(schema, &def.name, that)?,
        )?)?;
        let tie = Closure::equals(&cmp, Closure::constant(0)?)?;
        rest = step.build_return(Closure::if_then_else(tie, rest, &cmp)?)?;
    }
    Closure::if_then_else(Closure::same(this, that)?, Closure::constant(0)?, rest)
}
