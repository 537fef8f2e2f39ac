//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use cfml_runtime::*;

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Runtime -> server -> application -> request chain
pub struct Chain {
    pub runtime: Arc<ExecutionContext>,
    pub application: Arc<ExecutionContext>,
    pub request: Arc<ExecutionContext>,
}

impl Chain {
    pub fn new() -> Self {
        init_logging();
        let runtime = ExecutionContext::runtime();
        let server = ExecutionContext::server(&runtime);
        let application = ExecutionContext::application(&server);
        let request = ExecutionContext::request(&application);
        Self {
            runtime,
            application,
            request,
        }
    }

    /// Another request against the same application
    pub fn another_request(&self) -> Arc<ExecutionContext> {
        ExecutionContext::request(&self.application)
    }

    pub fn template(&self) -> Arc<ExecutionContext> {
        ExecutionContext::template(&self.request)
    }

    pub fn request_scope(&self) -> Arc<Scope> {
        self.request.get_scope_nearby("request")
    }

    pub fn application_scope(&self) -> Arc<Scope> {
        self.application.get_scope_nearby("application")
    }
}

/// `firstName` and `lastName`, both required with defaults
pub fn person_function() -> Arc<Function> {
    Arc::new(
        Function::builder("person")
            .argument(Argument::required("firstName", "string").with_default("brad"))
            .argument(Argument::required("lastName", "string").with_default("wood"))
            .build()
            .expect("valid declaration"),
    )
}

/// Body that returns the arguments scope it was invoked with
pub fn echo_arguments(name: &str, arguments: Vec<Argument>) -> Arc<Function> {
    Arc::new(
        Function::builder(name)
            .arguments(arguments)
            .body(|ctx| ctx.get_value("arguments"))
            .build()
            .expect("valid declaration"),
    )
}

/// Keys of a scope, in iteration order, with their original spelling
pub fn key_names(scope: &Scope) -> Vec<String> {
    scope.keys().iter().map(|k| k.name().to_string()).collect()
}
