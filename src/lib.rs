//! Execution core of a CFML-family runtime
//!
//! Identifier resolution against nested scopes, and argument binding for
//! functions, closures and lambdas.

pub mod config;
pub mod context;
pub mod error;
pub mod function;
pub mod model;
pub mod scope;

// Re-export main types
pub use config::RuntimeConfig;
pub use context::{Capabilities, ContextKind, ExecutionContext, ScopeSearchResult};
pub use error::{RuntimeError, RuntimeResult};
pub use function::{
    Access, Argument, DefaultValue, Function, FunctionBody, FunctionBuilder, FunctionKind,
    Invocation, SourceType,
};
pub use model::{Caster, DefaultCaster, Key, StructMap, TypeTag, Value};
pub use scope::{Scope, ScopeKind};
