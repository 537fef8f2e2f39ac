//! Declared type tags for arguments and return values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag parsed from a declared type name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// Accepts anything
    #[default]
    Any,
    /// String value
    String,
    /// Integer or decimal value
    Numeric,
    /// Whole number
    Integer,
    /// Boolean value
    Boolean,
    /// Ordered array
    Array,
    /// Struct (or a scope, which is struct-like)
    Struct,
    /// Function, closure or lambda
    Function,
    /// No value; only valid as a return type
    Void,
    /// Any other declared name, such as a class name
    Named(String),
}

impl TypeTag {
    /// Parse a declared type name, case-insensitively
    pub fn parse(declared: &str) -> Self {
        match declared.trim().to_ascii_lowercase().as_str() {
            "" | "any" | "object" => TypeTag::Any,
            "string" => TypeTag::String,
            "numeric" | "number" => TypeTag::Numeric,
            "integer" | "int" => TypeTag::Integer,
            "boolean" | "bool" => TypeTag::Boolean,
            "array" => TypeTag::Array,
            "struct" => TypeTag::Struct,
            "function" | "closure" => TypeTag::Function,
            "void" => TypeTag::Void,
            _ => TypeTag::Named(declared.trim().to_string()),
        }
    }

    /// Whether this tag accepts every value without coercion
    pub fn is_any(&self) -> bool {
        matches!(self, TypeTag::Any)
    }

    /// Name used in signatures and error messages
    pub fn type_name(&self) -> &str {
        match self {
            TypeTag::Any => "any",
            TypeTag::String => "string",
            TypeTag::Numeric => "numeric",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
            TypeTag::Array => "array",
            TypeTag::Struct => "struct",
            TypeTag::Function => "function",
            TypeTag::Void => "void",
            TypeTag::Named(name) => name,
        }
    }
}

impl From<&str> for TypeTag {
    fn from(declared: &str) -> Self {
        TypeTag::parse(declared)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
