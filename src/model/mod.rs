//! Data model: keys, values, type tags and the casting collaborator

#![warn(missing_docs)]

pub mod coercion;
pub mod key;
pub mod types;
pub mod value;

pub use coercion::{Caster, CoercionError, CoercionResult, DefaultCaster};
pub use key::{InternerStats, Key, KeyInterner, global_interner_stats, preintern_common_keys};
pub use types::TypeTag;
pub use value::{StructMap, Value};
