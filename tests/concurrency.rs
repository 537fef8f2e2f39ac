//! Shared ancestor scopes under concurrent frames

mod support;

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use cfml_runtime::*;
use support::Chain;

const WORKERS: usize = 8;
const ITERATIONS: usize = 200;

#[test]
fn test_concurrent_requests_share_application_scope() {
    let chain = Chain::new();
    let application = chain.application_scope();
    application.put("appName", Value::from("demo"));

    let writer = Arc::new(
        Function::builder("record")
            .argument(Argument::required("worker", "integer"))
            .argument(Argument::required("iteration", "integer"))
            .body(|ctx| {
                let worker = ctx.get_value("worker")?;
                let iteration = ctx.get_value("iteration")?;
                let app_name = ctx.get_value("appName")?;
                ctx.get_scope_nearby("application")
                    .put(format!("w{worker}-{iteration}"), app_name);
                Ok(Value::Null)
            })
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let writer = Arc::clone(&writer);
            let request = chain.another_request();
            thread::spawn(move || {
                let template = ExecutionContext::template(&request);
                for iteration in 0..ITERATIONS {
                    writer
                        .invoke(
                            &template,
                            Invocation::positional([worker as i64, iteration as i64]),
                        )
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(application.size(), WORKERS * ITERATIONS + 1);
    assert_eq!(application.get("w3-17"), Some(Value::from("demo")));
}

#[test]
fn test_readers_tolerate_concurrent_writers() {
    let chain = Chain::new();
    let request_scope = chain.request_scope();
    request_scope.put("counter", Value::from(0));
    let reads = Arc::new(AtomicUsize::new(0));

    let writer = {
        let scope = Arc::clone(&request_scope);
        thread::spawn(move || {
            for i in 0..ITERATIONS as i64 {
                scope.put("counter", Value::from(i));
                scope.put(format!("temp{i}"), Value::from(i));
                scope.remove(format!("temp{i}"));
            }
        })
    };

    let readers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let template = chain.template();
            let reads = Arc::clone(&reads);
            thread::spawn(move || {
                for _ in 0..ITERATIONS {
                    let result = template.scope_find("counter");
                    assert!(matches!(result.value, Some(Value::Integer(_))));
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(reads.load(Ordering::Relaxed), WORKERS * ITERATIONS);
    assert_eq!(request_scope.get("counter"), Some(Value::from(ITERATIONS as i64 - 1)));
    assert_eq!(request_scope.size(), 1);
}

#[test]
fn test_closure_is_callable_from_many_threads_after_its_frame_returns() {
    let chain = Chain::new();
    let factory = Arc::new(
        Function::builder("makeAdder")
            .argument(Argument::required("base", "integer"))
            .body(|ctx| {
                let adder = Function::builder("adder")
                    .argument(Argument::required("n", "integer"))
                    .returns("integer")
                    .body(|ctx| match (ctx.get_value("base")?, ctx.get_value("n")?) {
                        (Value::Integer(base), Value::Integer(n)) => Ok(Value::from(base + n)),
                        _ => Err(RuntimeError::execution("adder", "expected integers")),
                    })
                    .closure(ctx)
                    .build()?;
                Ok(Value::Function(Arc::new(adder)))
            })
            .build()
            .unwrap(),
    );

    let adder = factory
        .invoke(&chain.template(), Invocation::positional([100]))
        .unwrap();
    let adder = Arc::clone(adder.as_function().unwrap());
    drop(factory);

    let handles: Vec<_> = (0..WORKERS as i64)
        .map(|n| {
            let adder = Arc::clone(&adder);
            let request = chain.another_request();
            thread::spawn(move || {
                let template = ExecutionContext::template(&request);
                adder.invoke(&template, Invocation::positional([n])).unwrap()
            })
        })
        .collect();

    let mut results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort_by_key(|v| match v {
        Value::Integer(i) => *i,
        _ => i64::MAX,
    });

    let expected: Vec<Value> = (0..WORKERS as i64).map(|n| Value::from(100 + n)).collect();
    assert_eq!(results, expected);
}
