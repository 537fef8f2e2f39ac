//! Declared arguments

use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::model::{Key, StructMap, TypeTag, Value};

/// Default of a declared argument
#[derive(Clone)]
pub enum DefaultValue {
    /// Fixed value
    Literal(Value),
    /// Evaluated on each invocation that needs it
    Expression(Arc<dyn Fn(&ExecutionContext) -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the default for one invocation
    pub fn evaluate(&self, context: &ExecutionContext) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Expression(expression) => expression(context),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Expression(_) => f.write_str("Expression(..)"),
        }
    }
}

/// One entry of a function's declared argument list
#[derive(Debug, Clone)]
pub struct Argument {
    name: Key,
    required: bool,
    declared_type: String,
    type_tag: TypeTag,
    default: Option<DefaultValue>,
    position: usize,
    documentation: StructMap,
    annotations: StructMap,
}

impl Argument {
    /// Create a required argument
    pub fn required(name: impl Into<Key>, declared_type: impl Into<String>) -> Self {
        Self::new(name, declared_type, true)
    }

    /// Create an optional argument
    pub fn optional(name: impl Into<Key>, declared_type: impl Into<String>) -> Self {
        Self::new(name, declared_type, false)
    }

    fn new(name: impl Into<Key>, declared_type: impl Into<String>, required: bool) -> Self {
        let declared_type = declared_type.into();
        let declared_type = if declared_type.trim().is_empty() {
            "any".to_string()
        } else {
            declared_type
        };
        Self {
            name: name.into(),
            required,
            type_tag: TypeTag::parse(&declared_type),
            declared_type,
            default: None,
            position: 0,
            documentation: StructMap::default(),
            annotations: StructMap::default(),
        }
    }

    /// Set a literal default
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Set a default computed per invocation
    pub fn with_default_expression<F>(mut self, expression: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Expression(Arc::new(expression)));
        self
    }

    /// Set the `hint` documentation entry
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        self.with_documentation("hint", Value::String(hint.into()))
    }

    /// Add a documentation entry
    pub fn with_documentation(mut self, key: impl Into<Key>, value: Value) -> Self {
        self.documentation.insert(key.into(), value);
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<Key>, value: Value) -> Self {
        self.annotations.insert(key.into(), value);
        self
    }

    pub(crate) fn at_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Argument name
    pub fn name(&self) -> &Key {
        &self.name
    }

    /// Whether a value must be supplied when there is no default
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Declared type as written
    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    /// Parsed declared type
    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    /// Declared default, if any
    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Zero-based declaration position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Documentation entries
    pub fn documentation(&self) -> &StructMap {
        &self.documentation
    }

    /// Annotations
    pub fn annotations(&self) -> &StructMap {
        &self.annotations
    }

    /// Same requiredness and same declared type
    pub fn implements_signature(&self, other: &Argument) -> bool {
        self.required == other.required && self.type_tag == other.type_tag
    }

    /// Source-like rendering, e.g. `required string firstName="brad"`
    pub fn signature_as_string(&self) -> String {
        let mut signature = String::new();
        if self.required {
            signature.push_str("required ");
        }
        signature.push_str(&self.declared_type);
        signature.push(' ');
        signature.push_str(self.name.name());
        match &self.default {
            Some(DefaultValue::Literal(Value::String(s))) => {
                signature.push_str(&format!("=\"{}\"", s));
            }
            Some(DefaultValue::Literal(value)) if value.is_simple() => {
                signature.push_str(&format!("={}", value));
            }
            Some(_) => signature.push_str("=[runtime expression]"),
            None => {}
        }
        signature
    }

    /// Metadata struct describing this argument
    pub(crate) fn metadata(&self) -> Value {
        let default = match &self.default {
            Some(DefaultValue::Literal(value)) => value.clone(),
            Some(DefaultValue::Expression(_)) => Value::from("[runtime expression]"),
            None => Value::Null,
        };
        let mut meta = StructMap::default();
        meta.insert(Key::of("name"), Value::from(self.name.name()));
        meta.insert(Key::of("required"), Value::Boolean(self.required));
        meta.insert(Key::of("type"), Value::from(self.declared_type.as_str()));
        meta.insert(Key::of("default"), default);
        for (key, value) in self.documentation.iter().chain(self.annotations.iter()) {
            meta.insert(key.clone(), value.clone());
        }
        meta.entry(Key::of("hint")).or_insert_with(|| Value::from(""));
        Value::Struct(meta)
    }
}
