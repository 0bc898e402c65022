use super::*;

/// `(Record) -> Int` summing every `int` field.
pub fn sum_fields(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let mut builder = FunctionBuilder::new();
    let data = builder.add_param(schema.ty())?;
    let mut sum = builder.assign(Closure::constant(0)?)?;
    for def in schema.fields().iter().filter(|def| def.ty == Type::Int) {
        let value = builder.assign(field(schema, &def.name, &data)?)?;
        sum = builder.assign(Closure::plus(&sum, &value)?)?;
    }
    builder.build_return(&sum)
}

/// `(Record, Record) -> Void`: `t.f = t.f + delta.f` for every numeric field.
pub fn add_counters(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let (mut builder, total, delta) = FunctionBuilder::p2(schema.ty(), schema.ty())?;
    for def in schema.fields().iter().filter(|def| def.ty.is_numeric()) {
        let sum = Closure::plus(
            field(schema, &def.name, &total)?,
            field(schema, &def.name, &delta)?,
        )?;
        builder.assign(Closure::set_field(schema, &def.name, &total, sum)?)?;
    }
    builder.build_return_void()
}
