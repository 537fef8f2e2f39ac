//! Invocation: frames, return types and metadata

mod support;

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

use cfml_runtime::*;
use support::Chain;

fn returning(return_type: &str, value: Value) -> Arc<Function> {
    Arc::new(
        Function::builder("produce")
            .returns(return_type)
            .body(move |_| Ok(value.clone()))
            .build()
            .unwrap(),
    )
}

#[rstest]
#[case::numeric_string("numeric", Value::from("42"), Value::Integer(42))]
#[case::decimal_string("numeric", Value::from("1.5"), Value::Decimal("1.5".parse().unwrap()))]
#[case::number_to_string("string", Value::from(7), Value::from("7"))]
#[case::any_untouched("any", Value::from("42"), Value::from("42"))]
#[case::null_skips_check("numeric", Value::Null, Value::Null)]
fn test_return_value_is_coerced(
    #[case] return_type: &str,
    #[case] produced: Value,
    #[case] expected: Value,
) {
    let chain = Chain::new();
    let result = returning(return_type, produced)
        .invoke(&chain.template(), Invocation::None)
        .unwrap();

    assert_eq!(result, expected);
}

#[rstest]
#[case::not_numeric("numeric", Value::from("abc"), "string")]
#[case::struct_for_string("string", Value::struct_of([("a", Value::from(1))]), "struct")]
#[case::value_from_void("void", Value::from(1), "integer")]
#[case::unknown_class("Person", Value::from("x"), "string")]
fn test_incompatible_return_value(
    #[case] return_type: &str,
    #[case] produced: Value,
    #[case] actual: &str,
) {
    let chain = Chain::new();
    let err = returning(return_type, produced)
        .invoke(&chain.template(), Invocation::None)
        .unwrap_err();

    assert_eq!(
        err,
        RuntimeError::InvalidReturnType {
            function: "produce".to_string(),
            expected: return_type.to_string(),
            actual: actual.to_string(),
        }
    );
}

#[test]
fn test_binding_errors_prevent_body_execution() {
    let chain = Chain::new();
    let marker = chain.request_scope();
    let function = Arc::new(
        Function::builder("guarded")
            .argument(Argument::required("n", "numeric"))
            .body(|ctx| {
                ctx.get_scope_nearby("request").put("ran", Value::from(true));
                Ok(Value::Null)
            })
            .build()
            .unwrap(),
    );

    let err = function
        .invoke(&chain.template(), Invocation::positional(["not a number"]))
        .unwrap_err();

    assert!(err.is_binding_error());
    assert!(!marker.contains_key("ran"));
}

#[test]
fn test_body_errors_propagate() {
    let chain = Chain::new();
    let function = Arc::new(
        Function::builder("explode")
            .body(|_| Err(RuntimeError::execution("explode", "boom")))
            .build()
            .unwrap(),
    );

    let err = function
        .invoke(&chain.template(), Invocation::None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Function [explode] failed: boom");
}

#[test]
fn test_frame_kind_follows_function_kind() {
    let chain = Chain::new();
    let template = chain.template();
    let kind_of = |builder: FunctionBuilder| {
        let function = Arc::new(
            builder
                .body(|ctx| Ok(Value::from(ctx.kind().name())))
                .build()
                .unwrap(),
        );
        function.invoke(&template, Invocation::None).unwrap()
    };

    assert_eq!(kind_of(Function::builder("f")), Value::from("function"));
    assert_eq!(
        kind_of(Function::builder("c").closure(&template)),
        Value::from("closure")
    );
    assert_eq!(kind_of(Function::builder("l").lambda()), Value::from("lambda"));
}

#[test]
fn test_closure_and_lambda_metadata() {
    let chain = Chain::new();
    let template = chain.template();
    let closure = Function::builder("closure")
        .argument(Argument::required("x", "numeric").with_hint("the x"))
        .closure(&template)
        .build()
        .unwrap();
    let lambda = Function::builder("lambda").lambda().build().unwrap();

    let closure_meta = closure.metadata();
    let closure_meta = closure_meta.as_struct().unwrap();
    let lambda_meta = lambda.metadata();
    let lambda_meta = lambda_meta.as_struct().unwrap();

    assert_eq!(closure_meta.get(&Key::of("closure")), Some(&Value::Boolean(true)));
    assert_eq!(
        closure_meta.get(&Key::of("ANONYMOUSCLOSURE")),
        Some(&Value::Boolean(true))
    );
    assert_eq!(closure_meta.get(&Key::of("lambda")), Some(&Value::Boolean(false)));
    assert_eq!(lambda_meta.get(&Key::of("lambda")), Some(&Value::Boolean(true)));
    assert_eq!(
        lambda_meta.get(&Key::of("ANONYMOUSLAMBDA")),
        Some(&Value::Boolean(true))
    );

    let parameters = closure_meta
        .get(&Key::of("parameters"))
        .and_then(Value::as_array)
        .unwrap();
    assert_eq!(
        parameters[0],
        Value::struct_of([
            ("name", Value::from("x")),
            ("required", Value::Boolean(true)),
            ("type", Value::from("numeric")),
            ("default", Value::Null),
            ("hint", Value::from("the x")),
        ])
    );
}

#[test]
fn test_function_values_report_their_kind() {
    let chain = Chain::new();
    let closure = Value::Function(Arc::new(
        Function::builder("c")
            .closure(&chain.template())
            .build()
            .unwrap(),
    ));
    let udf = Value::Function(Arc::new(Function::builder("f").build().unwrap()));

    assert_eq!(closure.type_name(), "closure");
    assert_eq!(udf.type_name(), "function");
    assert!(DefaultCaster.can_coerce(&closure, &TypeTag::Function));
}
