//! Callables: named functions, closures and lambdas
//!
//! A [`Function`] couples declared-argument metadata with a [`FunctionBody`].
//! The body is whatever executes statements; this crate only needs it to run
//! against the frame built for the invocation. Binding rules live in
//! [`binder`].

pub mod argument;
pub mod binder;

pub use argument::{Argument, DefaultValue};
pub use binder::Invocation;

use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::model::{Key, StructMap, TypeTag, Value};
use crate::scope::Scope;

/// Executes the statements of a function against its invocation frame
pub trait FunctionBody: Send + Sync {
    /// Run the body and produce its result
    fn execute(&self, context: &Arc<ExecutionContext>) -> RuntimeResult<Value>;
}

impl<F> FunctionBody for F
where
    F: Fn(&Arc<ExecutionContext>) -> RuntimeResult<Value> + Send + Sync,
{
    fn execute(&self, context: &Arc<ExecutionContext>) -> RuntimeResult<Value> {
        self(context)
    }
}

/// Flavour of callable
#[derive(Debug, Clone)]
pub enum FunctionKind {
    /// Named, dynamically scoped function
    Udf,
    /// Closure over the context it was declared in
    Closure {
        /// Context the closure value was created in
        declaring: Arc<ExecutionContext>,
    },
    /// Lambda; sees only its own scopes
    Lambda,
}

impl FunctionKind {
    /// Runtime type name of values of this kind
    pub fn type_name(&self) -> &'static str {
        match self {
            FunctionKind::Udf => "function",
            FunctionKind::Closure { .. } => "closure",
            FunctionKind::Lambda => "lambda",
        }
    }
}

/// Declared access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    /// Callable only from the declaring instance
    Private,
    /// Callable from anywhere
    #[default]
    Public,
    /// Callable from the declaring instance and its subtypes
    Protected,
    /// Callable remotely
    Remote,
    /// Callable from the same package
    Package,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::Private => "private",
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Remote => "remote",
            Access::Package => "package",
        })
    }
}

/// Source dialect a function was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceType {
    /// Unqualified writes in a function go to `local`
    #[default]
    BoxLang,
    /// Unqualified writes in a function go to `variables`
    CfScript,
}

/// A callable unit with its declared arguments
pub struct Function {
    name: Key,
    kind: FunctionKind,
    access: Access,
    return_type: String,
    return_tag: TypeTag,
    arguments: Vec<Argument>,
    annotations: StructMap,
    documentation: StructMap,
    source_type: SourceType,
    body: Arc<dyn FunctionBody>,
}

impl Function {
    /// Start declaring a function
    pub fn builder(name: impl Into<Key>) -> FunctionBuilder {
        FunctionBuilder::new(name.into())
    }

    /// Function name
    pub fn name(&self) -> &Key {
        &self.name
    }

    /// Flavour of callable
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Declared access
    pub fn access(&self) -> Access {
        self.access
    }

    /// Declared return type as written
    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// Parsed declared return type
    pub fn return_tag(&self) -> &TypeTag {
        &self.return_tag
    }

    /// Declared arguments in declaration order
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Declared argument by name
    pub fn argument(&self, name: impl Into<Key>) -> Option<&Argument> {
        let name: Key = name.into();
        self.arguments.iter().find(|a| a.name() == &name)
    }

    /// Annotations
    pub fn annotations(&self) -> &StructMap {
        &self.annotations
    }

    /// Documentation entries
    pub fn documentation(&self) -> &StructMap {
        &self.documentation
    }

    /// Source dialect
    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Declaring context, for closures
    pub fn declaring_context(&self) -> Option<&Arc<ExecutionContext>> {
        match &self.kind {
            FunctionKind::Closure { declaring } => Some(declaring),
            _ => None,
        }
    }

    /// Whether output is enabled, from the `output` annotation or the source
    /// dialect
    pub fn can_output(&self) -> bool {
        match self.annotations.get(&Key::of("output")) {
            Some(Value::Boolean(b)) => *b,
            Some(Value::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "yes"),
            Some(value) => !value.is_null(),
            None => self.source_type == SourceType::CfScript,
        }
    }

    /// Invoke with a fresh frame below `parent`
    pub fn invoke(
        self: &Arc<Self>,
        parent: &Arc<ExecutionContext>,
        invocation: Invocation,
    ) -> RuntimeResult<Value> {
        self.call(parent, invocation, None)
    }

    /// Invoke as a member of an instance whose `variables` scope is `member`
    pub fn invoke_on(
        self: &Arc<Self>,
        parent: &Arc<ExecutionContext>,
        member: Arc<Scope>,
        invocation: Invocation,
    ) -> RuntimeResult<Value> {
        self.call(parent, invocation, Some(member))
    }

    fn call(
        self: &Arc<Self>,
        parent: &Arc<ExecutionContext>,
        invocation: Invocation,
        member: Option<Arc<Scope>>,
    ) -> RuntimeResult<Value> {
        log::debug!("Invoking {} '{}'", self.kind.type_name(), self.name);

        let arguments = Arc::new(self.create_arguments_scope(parent, invocation)?);
        let frame = ExecutionContext::for_function(parent, Arc::clone(self), arguments, member)?;
        let result = self.body.execute(&frame)?;
        let result = self.ensure_return_type(&frame, result)?;

        log::trace!("'{}' returned {}", self.name, result.type_name());
        Ok(result)
    }

    /// Coerce a result to the declared return type
    ///
    /// `null` results and `any` return types pass through unchanged.
    pub fn ensure_return_type(&self, context: &ExecutionContext, value: Value) -> RuntimeResult<Value> {
        if value.is_null() || self.return_tag.is_any() {
            return Ok(value);
        }
        context
            .caster()
            .coerce(&value, &self.return_tag)
            .map_err(|_| RuntimeError::InvalidReturnType {
                function: self.name.name().to_string(),
                expected: self.return_type.clone(),
                actual: value.type_name().to_string(),
            })
    }

    /// Metadata struct describing the declaration
    pub fn metadata(&self) -> Value {
        let mut meta = StructMap::default();
        for (key, value) in self.documentation.iter().chain(self.annotations.iter()) {
            meta.insert(key.clone(), value.clone());
        }
        meta.insert(Key::of("name"), Value::from(self.name.name()));
        meta.insert(Key::of("returnType"), Value::from(self.return_type.as_str()));
        meta.entry(Key::of("hint")).or_insert_with(|| Value::from(""));
        meta.entry(Key::of("output"))
            .or_insert_with(|| Value::Boolean(self.can_output()));
        meta.insert(Key::of("access"), Value::from(self.access.to_string()));
        meta.insert(
            Key::of("parameters"),
            Value::Array(self.arguments.iter().map(Argument::metadata).collect()),
        );

        let is_closure = matches!(self.kind, FunctionKind::Closure { .. });
        let is_lambda = matches!(self.kind, FunctionKind::Lambda);
        meta.insert(Key::of("closure"), Value::Boolean(is_closure));
        meta.insert(Key::of("ANONYMOUSCLOSURE"), Value::Boolean(is_closure));
        meta.insert(Key::of("lambda"), Value::Boolean(is_lambda));
        meta.insert(Key::of("ANONYMOUSLAMBDA"), Value::Boolean(is_lambda));
        Value::Struct(meta)
    }

    /// Source-like rendering, e.g. `public string function greet(required string name)`
    pub fn signature_as_string(&self) -> String {
        let arguments: Vec<String> = self
            .arguments
            .iter()
            .map(Argument::signature_as_string)
            .collect();
        format!(
            "{} {} function {}({})",
            self.access,
            self.return_type,
            self.name.name(),
            arguments.join(", ")
        )
    }

    /// Whether this function can stand in for `other`
    ///
    /// Arity, argument types and requiredness must match position by
    /// position; the return type must match unless `other` returns `any`.
    pub fn implements_signature(&self, other: &Function) -> bool {
        if self.arguments.len() != other.arguments.len() {
            return false;
        }
        let arguments_match = self
            .arguments
            .iter()
            .zip(&other.arguments)
            .all(|(mine, theirs)| mine.implements_signature(theirs));

        arguments_match && (other.return_tag.is_any() || self.return_tag == other.return_tag)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("kind", &self.kind.type_name())
            .field("return_type", &self.return_type)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Builder for [`Function`]
pub struct FunctionBuilder {
    name: Key,
    kind: FunctionKind,
    access: Access,
    return_type: String,
    arguments: Vec<Argument>,
    annotations: StructMap,
    documentation: StructMap,
    source_type: SourceType,
    body: Option<Arc<dyn FunctionBody>>,
}

impl FunctionBuilder {
    fn new(name: Key) -> Self {
        Self {
            name,
            kind: FunctionKind::Udf,
            access: Access::default(),
            return_type: "any".to_string(),
            arguments: Vec::new(),
            annotations: StructMap::default(),
            documentation: StructMap::default(),
            source_type: SourceType::default(),
            body: None,
        }
    }

    /// Append a declared argument
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Append several declared arguments
    pub fn arguments(mut self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    /// Declared return type
    pub fn returns(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    /// Access modifier, `public` unless set
    pub fn access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Dialect the function was written in
    pub fn source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    /// Add an annotation, replacing any existing one with the same key
    pub fn annotation(mut self, key: impl Into<Key>, value: Value) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }

    /// Set the `hint` documentation entry
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.documentation
            .insert(Key::of("hint"), Value::String(hint.into()));
        self
    }

    /// Body to run on invocation; defaults to one returning `null`
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&Arc<ExecutionContext>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Shared body implementation
    pub fn executor(mut self, body: Arc<dyn FunctionBody>) -> Self {
        self.body = Some(body);
        self
    }

    /// Make this a closure over `declaring`
    pub fn closure(mut self, declaring: &Arc<ExecutionContext>) -> Self {
        self.kind = FunctionKind::Closure {
            declaring: Arc::clone(declaring),
        };
        self
    }

    /// Make this a lambda
    pub fn lambda(mut self) -> Self {
        self.kind = FunctionKind::Lambda;
        self
    }

    /// Finish the declaration, assigning argument positions
    pub fn build(self) -> RuntimeResult<Function> {
        let mut arguments = Vec::with_capacity(self.arguments.len());
        for (position, argument) in self.arguments.into_iter().enumerate() {
            if arguments.iter().any(|a: &Argument| a.name() == argument.name()) {
                return Err(RuntimeError::DuplicateArgument {
                    function: self.name.name().to_string(),
                    argument: argument.name().name().to_string(),
                });
            }
            arguments.push(argument.at_position(position));
        }

        let return_type = if self.return_type.trim().is_empty() {
            "any".to_string()
        } else {
            self.return_type
        };
        let body: Arc<dyn FunctionBody> = match self.body {
            Some(body) => body,
            None => Arc::new(|_: &Arc<ExecutionContext>| Ok::<_, RuntimeError>(Value::Null)),
        };

        Ok(Function {
            name: self.name,
            kind: self.kind,
            access: self.access,
            return_tag: TypeTag::parse(&return_type),
            return_type,
            arguments,
            annotations: self.annotations,
            documentation: self.documentation,
            source_type: self.source_type,
            body,
        })
    }
}
