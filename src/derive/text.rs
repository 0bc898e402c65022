use super::*;

/// `(Record) -> Str` rendering `Name{f1=v1, f2=v2}`.
pub fn deep_to_string(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let mut builder = FunctionBuilder::new();
    let this = builder.add_param(schema.ty())?;
    let mut text = builder.assign(Closure::constant(format!("{}{{", schema.name()))?)?;
    for (i, def) in schema.fields().iter().enumerate() {
        let sep = if i == 0 { "" } else { ", " };
        text = builder.assign(Closure::plus(
            &text,
            Closure::constant(format!("{sep}{}=", def.name))?,
        )?)?;
        let value = Closure::to_string(field(schema, &def.name, &this)?)?;
        text = builder.assign(Closure::plus(&text, value)?)?;
    }
    builder.build_return(Closure::plus(&text, Closure::constant("}")?)?)
}
