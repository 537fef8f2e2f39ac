//! Argument binding
//!
//! Turns the data supplied at a call site into the arguments scope of one
//! invocation. Rules, in order:
//!
//! - a named call may carry `argumentCollection`; a struct is merged first as
//!   a base layer, an array is bound positionally, an arguments scope is
//!   reordered into declaration order, any other value stays as an ordinary
//!   entry
//! - explicit values override the base layer
//! - positional values bind to declared arguments in order; values beyond the
//!   declaration are kept under their 1-based position (`"3"` for the third)
//! - unbound or `null` declared arguments take their default; a required
//!   argument without one is an error
//! - every non-null declared value is coerced to its declared type
//! - keys matching no declared argument are kept

use crate::context::ExecutionContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::model::{Key, StructMap, Value};
use crate::scope::{Scope, names};

use super::{Argument, Function};

/// Data supplied at a call site
#[derive(Debug, Clone, Default)]
pub enum Invocation {
    /// No arguments
    #[default]
    None,
    /// Values in call order
    Positional(Vec<Value>),
    /// Values by name
    Named(StructMap),
}

impl Invocation {
    /// Positional call from anything convertible to values
    pub fn positional<V, I>(values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Invocation::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Named call from key/value pairs, preserving their order
    pub fn named<K, I>(pairs: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Invocation::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Number of supplied values
    pub fn len(&self) -> usize {
        match self {
            Invocation::None => 0,
            Invocation::Positional(values) => values.len(),
            Invocation::Named(named) => named.len(),
        }
    }

    /// Whether nothing was supplied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Value>> for Invocation {
    fn from(values: Vec<Value>) -> Self {
        Invocation::Positional(values)
    }
}

impl From<StructMap> for Invocation {
    fn from(named: StructMap) -> Self {
        Invocation::Named(named)
    }
}

impl Function {
    /// Build the arguments scope for one invocation
    ///
    /// `context` supplies the caster and configuration, and is the context
    /// default expressions are evaluated against.
    pub fn create_arguments_scope(
        &self,
        context: &ExecutionContext,
        invocation: Invocation,
    ) -> RuntimeResult<Scope> {
        match invocation {
            Invocation::None => self.bind_positional(context, Vec::new()),
            Invocation::Positional(values) => self.bind_positional(context, values),
            Invocation::Named(named) => self.bind_named(context, named),
        }
    }

    fn bind_positional(&self, context: &ExecutionContext, values: Vec<Value>) -> RuntimeResult<Scope> {
        let scope = Scope::arguments();
        let supplied = values.len();

        for (index, value) in values.into_iter().enumerate() {
            match self.arguments.get(index) {
                Some(argument) => {
                    let value = self.bind_value(context, argument, value)?;
                    scope.put(argument.name(), value);
                }
                None => {
                    scope.put(index + 1, value);
                }
            }
        }
        for argument in self.arguments.iter().skip(supplied) {
            let value = self.bind_value(context, argument, Value::Null)?;
            scope.put(argument.name(), value);
        }

        if supplied > self.arguments.len() {
            log::trace!(
                "'{}' received {} overflow arguments",
                self.name,
                supplied - self.arguments.len()
            );
        }
        Ok(scope)
    }

    fn bind_named(&self, context: &ExecutionContext, mut named: StructMap) -> RuntimeResult<Scope> {
        let scope = Scope::arguments();

        if let Some((index, key, collection)) = named.shift_remove_full(&*names::ARGUMENT_COLLECTION) {
            match collection {
                Value::Struct(base) => {
                    log::trace!("Merging argumentCollection struct into '{}'", self.name);
                    scope.put_all(base);
                }
                Value::Scope(base) if base.is_positional() => {
                    log::trace!("Reordering argumentCollection arguments for '{}'", self.name);
                    named = self.reorder_collection(&base, named);
                }
                Value::Scope(base) => scope.put_all(base.entries()),
                Value::Array(items) => {
                    log::trace!("Binding argumentCollection array to '{}'", self.name);
                    for (i, item) in items.into_iter().enumerate() {
                        match self.arguments.get(i) {
                            Some(argument) => scope.put(argument.name(), item),
                            None => scope.put(i + 1, item),
                        };
                    }
                }
                other => {
                    named.shift_insert(index, key, other);
                }
            }
        }

        scope.put_all(named);
        for argument in &self.arguments {
            let value = scope.get(argument.name()).unwrap_or_default();
            let value = self.bind_value(context, argument, value)?;
            scope.put(argument.name(), value);
        }
        Ok(scope)
    }

    /// Rebuild named data from an arguments scope passed as `argumentCollection`
    ///
    /// Each declared argument takes, in order of preference, an explicit
    /// value, the collection's entry of the same name, the collection's entry
    /// at its position, or `null`. Remaining collection entries follow.
    fn reorder_collection(&self, collection: &Scope, mut named: StructMap) -> StructMap {
        let mut leftovers: StructMap = collection.entries().into_iter().collect();

        for (index, argument) in self.arguments.iter().enumerate() {
            let position = Key::from(index + 1);
            if named.contains_key(argument.name()) {
                leftovers.shift_remove(argument.name());
            } else if let Some(value) = leftovers.shift_remove(argument.name()) {
                named.insert(argument.name().clone(), value);
            } else if let Some(value) = leftovers.shift_remove(&position) {
                named.insert(argument.name().clone(), value);
            } else {
                named.insert(argument.name().clone(), Value::Null);
            }
        }

        for (key, value) in leftovers {
            named.entry(key).or_insert(value);
        }
        named
    }

    /// Apply the default for an unbound value, then validate the type
    fn bind_value(
        &self,
        context: &ExecutionContext,
        argument: &Argument,
        value: Value,
    ) -> RuntimeResult<Value> {
        let value = if value.is_null() {
            match argument.default() {
                Some(default) => {
                    log::trace!("Using default for '{}' of '{}'", argument.name(), self.name);
                    default.evaluate(context)
                }
                None if argument.is_required() => {
                    return Err(RuntimeError::MissingArgument {
                        function: self.name.name().to_string(),
                        argument: argument.name().name().to_string(),
                    });
                }
                None => Value::Null,
            }
        } else {
            value
        };
        self.ensure_argument_type(context, argument, value)
    }

    fn ensure_argument_type(
        &self,
        context: &ExecutionContext,
        argument: &Argument,
        value: Value,
    ) -> RuntimeResult<Value> {
        if value.is_null() || argument.type_tag().is_any() {
            return Ok(value);
        }
        match context.caster().coerce(&value, argument.type_tag()) {
            Ok(coerced) if context.config().strict_argument_types => Ok(coerced),
            Ok(_) => Ok(value),
            Err(_) => Err(RuntimeError::InvalidArgumentType {
                function: self.name.name().to_string(),
                argument: argument.name().name().to_string(),
                expected: argument.declared_type().to_string(),
                actual: value.type_name().to_string(),
            }),
        }
    }
}
