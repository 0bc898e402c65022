//! Structural operations over records, generated with the composition engine.

use crate::compose::{Closure, ClosureBuilder, Expr, FunctionBuilder, Var};
use crate::error::ComposeResult;
use crate::handle::Handle;
use crate::schema::RecordSchema;
use crate::types::Type;
use std::sync::Arc;

mod counters;
mod equality;
mod flat_list;
mod ordering;
#[cfg(test)]
mod tests;
mod text;

pub use counters::{add_counters, sum_fields};
pub use equality::{deep_equals, deep_equals_closure, deep_hash_code, deep_hash_code_closure};
pub use flat_list::{FlatArrayFactory, FlatArrayList};
pub use ordering::{deep_compare, deep_compare_closure};
pub use text::deep_to_string;

fn field(schema: &Arc<RecordSchema>, name: &str, object: impl Into<Expr>) -> ComposeResult<Closure> {
    Closure::get_field(schema, name, object)
}
