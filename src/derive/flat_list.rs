use super::*;
use crate::error::InvokeResult;
use crate::value::{ArrayValue, Exception, Value};
use log::trace;

const MIN_CAPACITY: usize = 10;

/// Compiled accessors for storing records of one schema column by column.
pub struct FlatArrayFactory {
    schema: Arc<RecordSchema>,
    get: Handle,
    set: Handle,
    resize: Handle,
}

impl FlatArrayFactory {
    pub fn new(schema: &Arc<RecordSchema>) -> ComposeResult<Arc<Self>> {
        Ok(Arc::new(Self {
            schema: schema.clone(),
            get: build_get(schema)?,
            set: build_set(schema)?,
            resize: build_resize(schema)?,
        }))
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn new_list(self: &Arc<Self>) -> FlatArrayList {
        let columns = self
            .schema
            .fields()
            .iter()
            .map(|def| Value::Array(ArrayValue::new(def.ty.clone(), 0)))
            .collect();
        FlatArrayList {
            factory: self.clone(),
            columns: Value::Array(ArrayValue::from_vec(Type::Any, columns)),
            len: 0,
            capacity: 0,
        }
    }
}

/// Growable list of records kept as one array per field.
pub struct FlatArrayList {
    factory: Arc<FlatArrayFactory>,
    columns: Value,
    len: usize,
    capacity: usize,
}

impl FlatArrayList {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> InvokeResult<Value> {
        if index >= self.len {
            return Err(Exception::new(
                "IndexOutOfBoundsException",
                format!("index {index} out of bounds for length {}", self.len),
            )
            .into());
        }
        self.factory
            .get
            .invoke(&[self.columns.clone(), Value::Int(int_index(index)?)])
    }

    pub fn push(&mut self, record: Value) -> InvokeResult<()> {
        if self.len == self.capacity {
            self.grow()?;
        }
        self.factory.set.invoke(&[
            self.columns.clone(),
            Value::Int(int_index(self.len)?),
            record,
        ])?;
        self.len += 1;
        Ok(())
    }

    fn grow(&mut self) -> InvokeResult<()> {
        let capacity = (self.len * 2).max(MIN_CAPACITY);
        trace!("growing flat list from {} to {capacity}", self.capacity);
        self.factory
            .resize
            .invoke(&[self.columns.clone(), Value::Int(int_index(capacity)?)])?;
        self.capacity = capacity;
        Ok(())
    }
}

fn int_index(index: usize) -> InvokeResult<i32> {
    i32::try_from(index).map_err(|_| {
        Exception::new(
            "IndexOutOfBoundsException",
            format!("index {index} exceeds the int range"),
        )
        .into()
    })
}

fn columns_type() -> Type {
    Type::array(Type::Any)
}

/// Column array of field `fi`, cast to its element type.
fn column(
    builder: &mut FunctionBuilder,
    columns: &Var,
    fi: usize,
    ty: &Type,
) -> ComposeResult<Var> {
    let iv = builder.assign(Closure::constant(fi as i32)?)?;
    builder.assign(Closure::get_array_element(columns, &iv)?.cast(&Type::array(ty.clone()))?)
}

fn build_get(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let (mut builder, columns, index) = FunctionBuilder::p2(columns_type(), Type::Int)?;
    let mut values = Vec::with_capacity(schema.fields().len());
    for (fi, def) in schema.fields().iter().enumerate() {
        let array = column(&mut builder, &columns, fi, &def.ty)?;
        values.push(builder.assign(Closure::get_array_element(&array, &index)?)?);
    }
    builder.build_return(Closure::new_instance(schema, &values)?)
}

fn build_set(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let mut builder = FunctionBuilder::new();
    let columns = builder.add_param(columns_type())?;
    let index = builder.add_param(Type::Int)?;
    let record = builder.add_param(schema.ty())?;
    for (fi, def) in schema.fields().iter().enumerate() {
        let array = column(&mut builder, &columns, fi, &def.ty)?;
        let value = builder.assign(field(schema, &def.name, &record)?)?;
        builder.assign(Closure::set_array_element(&array, &index, &value)?)?;
    }
    builder.build_return_void()
}

fn build_resize(schema: &Arc<RecordSchema>) -> ComposeResult<Handle> {
    let (mut builder, columns, capacity) = FunctionBuilder::p2(columns_type(), Type::Int)?;
    for (fi, def) in schema.fields().iter().enumerate() {
        let iv = builder.assign(Closure::constant(fi as i32)?)?;
        let array = builder.assign(
            Closure::get_array_element(&columns, &iv)?.cast(&Type::array(def.ty.clone()))?,
        )?;
        let resized = builder.assign(Closure::array_copy_of(&array, &capacity)?.cast(&Type::Any)?)?;
        builder.assign(Closure::set_array_element(&columns, &iv, &resized)?)?;
    }
    builder.build_return_void()
}
