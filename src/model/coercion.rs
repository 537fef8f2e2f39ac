//! Casting collaborator: coerce a value to a declared type or fail
//!
//! Argument binding and return-type enforcement only depend on the [`Caster`]
//! trait. [`DefaultCaster`] implements the loose, CFML-style rules the runtime
//! ships with; embedders can install their own through the runtime context.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::str::FromStr;
use thiserror::Error;

use super::types::TypeTag;
use super::value::Value;

/// Result type for coercion operations
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Errors that can occur during coercion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// Cannot coerce between the specified types
    #[error("Cannot coerce from {from} to {to}")]
    IncompatibleTypes {
        /// Actual type name
        from: String,
        /// Target type name
        to: String,
    },

    /// The value format is invalid for the target type
    #[error("Invalid format '{value}' for type {target_type}")]
    InvalidFormat {
        /// Offending value, rendered
        value: String,
        /// Target type name
        target_type: String,
    },
}

/// Coerce-or-fail contract used at the binding and return boundaries
pub trait Caster: Send + Sync {
    /// Coerce `value` to `target`, returning the coerced value
    fn coerce(&self, value: &Value, target: &TypeTag) -> CoercionResult<Value>;

    /// Check if a value can be coerced to a specific type
    fn can_coerce(&self, value: &Value, target: &TypeTag) -> bool {
        self.coerce(value, target).is_ok()
    }
}

/// Loose CFML-style casting rules
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCaster;

impl Caster for DefaultCaster {
    fn coerce(&self, value: &Value, target: &TypeTag) -> CoercionResult<Value> {
        match target {
            TypeTag::Any => Ok(value.clone()),
            TypeTag::Void => match value {
                Value::Null => Ok(Value::Null),
                other => Err(incompatible(other, target)),
            },
            _ if value.is_null() => Ok(Value::Null),
            TypeTag::String => Self::coerce_to_string(value),
            TypeTag::Numeric => Self::coerce_to_numeric(value),
            TypeTag::Integer => Self::coerce_to_integer(value),
            TypeTag::Boolean => Self::coerce_to_boolean(value),
            TypeTag::Array => match value {
                Value::Array(_) => Ok(value.clone()),
                other => Err(incompatible(other, target)),
            },
            TypeTag::Struct => match value {
                Value::Struct(_) | Value::Scope(_) => Ok(value.clone()),
                other => Err(incompatible(other, target)),
            },
            TypeTag::Function => match value {
                Value::Function(_) => Ok(value.clone()),
                other => Err(incompatible(other, target)),
            },
            TypeTag::Named(_) => Err(incompatible(value, target)),
        }
    }
}

impl DefaultCaster {
    /// Coerce value to string
    pub fn coerce_to_string(value: &Value) -> CoercionResult<Value> {
        value
            .to_string_value()
            .map(Value::String)
            .ok_or_else(|| incompatible(value, &TypeTag::String))
    }

    /// Coerce value to a number, keeping integers integral
    pub fn coerce_to_numeric(value: &Value) -> CoercionResult<Value> {
        match value {
            Value::Integer(_) | Value::Decimal(_) => Ok(value.clone()),
            Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
            Value::String(s) => parse_number(s).ok_or_else(|| CoercionError::InvalidFormat {
                value: s.clone(),
                target_type: TypeTag::Numeric.to_string(),
            }),
            other => Err(incompatible(other, &TypeTag::Numeric)),
        }
    }

    /// Coerce value to a whole number
    pub fn coerce_to_integer(value: &Value) -> CoercionResult<Value> {
        let invalid = |rendered: String| CoercionError::InvalidFormat {
            value: rendered,
            target_type: TypeTag::Integer.to_string(),
        };
        match Self::coerce_to_numeric(value) {
            Ok(Value::Integer(i)) => Ok(Value::Integer(i)),
            Ok(Value::Decimal(d)) if d.fract().is_zero() => d
                .to_i64()
                .map(Value::Integer)
                .ok_or_else(|| invalid(d.to_string())),
            Ok(other) => Err(invalid(other.to_string())),
            Err(CoercionError::InvalidFormat { value, .. }) => Err(invalid(value)),
            Err(_) => Err(incompatible(value, &TypeTag::Integer)),
        }
    }

    /// Coerce value to boolean
    pub fn coerce_to_boolean(value: &Value) -> CoercionResult<Value> {
        match value {
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            Value::Integer(i) => Ok(Value::Boolean(*i != 0)),
            Value::Decimal(d) => Ok(Value::Boolean(!d.is_zero())),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Ok(Value::Boolean(true)),
                "false" | "no" => Ok(Value::Boolean(false)),
                other => match parse_number(other) {
                    Some(number) => Self::coerce_to_boolean(&number),
                    None => Err(CoercionError::InvalidFormat {
                        value: s.clone(),
                        target_type: TypeTag::Boolean.to_string(),
                    }),
                },
            },
            other => Err(incompatible(other, &TypeTag::Boolean)),
        }
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
        .map(Value::Decimal)
}

fn incompatible(value: &Value, target: &TypeTag) -> CoercionError {
    CoercionError::IncompatibleTypes {
        from: value.type_name().to_string(),
        to: target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coerce(value: Value, target: &str) -> CoercionResult<Value> {
        DefaultCaster.coerce(&value, &TypeTag::parse(target))
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce(Value::from("42"), "numeric").unwrap(), Value::Integer(42));
        assert_eq!(
            coerce(Value::from(" 4.5 "), "numeric").unwrap(),
            Value::Decimal(Decimal::new(45, 1))
        );
        assert_eq!(coerce(Value::from(true), "numeric").unwrap(), Value::Integer(1));
        assert!(coerce(Value::from("sdf"), "numeric").is_err());
        assert!(coerce(Value::from("Luis"), "numeric").is_err());
        assert!(coerce(Value::Array(vec![]), "numeric").is_err());
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(coerce(Value::from("42"), "integer").unwrap(), Value::Integer(42));
        assert_eq!(
            coerce(Value::Decimal(Decimal::from(7)), "int").unwrap(),
            Value::Integer(7)
        );
        assert!(matches!(
            coerce(Value::from("42.5"), "integer"),
            Err(CoercionError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(coerce(Value::from("yes"), "boolean").unwrap(), Value::Boolean(true));
        assert_eq!(coerce(Value::from("NO"), "boolean").unwrap(), Value::Boolean(false));
        assert_eq!(coerce(Value::from("0"), "boolean").unwrap(), Value::Boolean(false));
        assert_eq!(coerce(Value::Integer(3), "bool").unwrap(), Value::Boolean(true));
        assert!(coerce(Value::from("maybe"), "boolean").is_err());
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(coerce(Value::Integer(43), "string").unwrap(), Value::from("43"));
        assert_eq!(coerce(Value::from("brad"), "String").unwrap(), Value::from("brad"));
        assert!(coerce(Value::struct_of::<&str, _>([]), "string").is_err());
    }

    #[test]
    fn test_null_and_void() {
        assert_eq!(coerce(Value::Null, "numeric").unwrap(), Value::Null);
        assert_eq!(coerce(Value::Null, "void").unwrap(), Value::Null);
        assert!(coerce(Value::from("x"), "void").is_err());
    }

    #[test]
    fn test_named_types_never_match() {
        assert_eq!(
            coerce(Value::from("x"), "models.User"),
            Err(CoercionError::IncompatibleTypes {
                from: "string".to_string(),
                to: "models.User".to_string(),
            })
        );
        assert_eq!(coerce(Value::from("x"), "any").unwrap(), Value::from("x"));
    }
}
