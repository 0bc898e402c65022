use super::*;

/// `(Record, Any) -> Bool`: false for null or another record type, true for
/// the same instance, otherwise every field `equals`.
pub fn deep_equals(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let (builder, this, that) = FunctionBuilder::p2(schema.ty(), Type::Any)?;
    builder.build_return(deep_equals_closure(schema, &this, &that)?)
}

pub fn deep_equals_closure(
    schema: &Arc<RecordSchema>,
    this: &Var,
    that: &Var,
) -> ComposeResult<Closure> {
    let ty = schema.ty();
    let mut fields_eq = ClosureBuilder::new();
    let other = fields_eq.assign(that.cast(&ty)?)?;
    let all_equal = Closure::and_all(
        schema
            .fields()
            .iter()
            .map(|def| {
                Closure::equals(
                    field(schema, &def.name, this)?,
                    field(schema, &def.name, &other)?,
                )
            })
            .collect::<ComposeResult<Vec<Closure>>>()?,
    )?;
    let all_equal = fields_eq.build_return(all_equal)?;

    let same = Closure::same(this, that.cast(&ty)?)?;
    Closure::and_all([
        Closure::instance_of_schema(that, schema)?,
        Closure::or(same, all_equal)?,
    ])
}

/// `(Record) -> Int`: `h = h * 31 + hash(field)` over the fields, from 0.
pub fn deep_hash_code(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let (builder, this) = FunctionBuilder::p1(schema.ty())?;
    builder.build_return(deep_hash_code_closure(schema, &this)?)
}

pub fn deep_hash_code_closure(schema: &Arc<RecordSchema>, this: &Var) -> ComposeResult<Closure> {
    let mut hash = Closure::constant(0)?;
    for def in schema.fields() {
        let field_hash = Closure::hash_code(field(schema, &def.name, this)?)?;
        hash = Closure::plus(Closure::mul(hash, Closure::constant(31)?)?, field_hash)?;
    }
    Ok(hash)
}
