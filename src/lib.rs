#![allow(clippy::collapsible_if)]

pub mod compose;
pub mod config;
pub mod derive;
pub mod error;
pub mod handle;
pub mod schema;
pub mod types;
pub mod value;

pub use compose::{Closure, ClosureBuilder, Expr, FunctionBuilder, FunctionId, SigUnifier, Var};
pub use config::ComposeConfig;
pub use error::{ComposeError, ComposeResult, InvocationError, InvokeResult};
pub use handle::{Handle, PrimitiveCallable};
pub use schema::{Record, RecordSchema};
pub use types::Type;
pub use value::{ArrayValue, Exception, IteratorValue, Value};

#[cfg(test)]
mod tests;
