//! Scope resolution across the context tree
//!
//! Unqualified lookups consult scopes in a fixed precedence order that depends
//! on the kind of the calling frame:
//!
//! - function: `local`, `arguments`, member `variables`, then the shared
//!   request/application/server/runtime scopes of the caller chain
//! - closure: `local`, `arguments`, a shallow pass over the declaring context
//!   (which recurses through enclosing closures), then the shared scopes
//! - lambda: `local` and `arguments` only
//! - thread: `local`, `thread`, the spawner's `variables`, then the shared scopes
//! - template and above: own scopes, then the parent's chain
//!
//! A key that names one of the visited scopes resolves to that scope itself.

use std::ops::ControlFlow;
use std::sync::Arc;

use super::{Capabilities, ContextKind, ExecutionContext};
use crate::error::{RuntimeError, RuntimeResult};
use crate::function::SourceType;
use crate::model::{Key, Value};
use crate::scope::{Scope, names};

/// Outcome of an unqualified lookup
#[derive(Debug, Clone)]
pub struct ScopeSearchResult {
    /// Scope holding the key, or the fallback scope when nothing matched
    pub scope: Arc<Scope>,
    /// Value found, absent when the fallback was used
    pub value: Option<Value>,
    /// The key that was searched for
    pub key: Key,
    /// The key named a scope rather than a variable
    pub is_scope: bool,
}

impl ScopeSearchResult {
    fn variable(scope: &Arc<Scope>, key: &Key, value: Value) -> Self {
        Self {
            scope: Arc::clone(scope),
            value: Some(value),
            key: key.clone(),
            is_scope: false,
        }
    }

    fn scope_itself(scope: &Arc<Scope>, key: &Key) -> Self {
        Self {
            scope: Arc::clone(scope),
            value: Some(Value::Scope(Arc::clone(scope))),
            key: key.clone(),
            is_scope: true,
        }
    }

    fn fallback(scope: &Arc<Scope>, key: Key) -> Self {
        Self {
            scope: Arc::clone(scope),
            value: None,
            key,
            is_scope: false,
        }
    }

    /// Whether the lookup matched an existing key or scope
    pub fn found(&self) -> bool {
        self.value.is_some()
    }

    /// The value found, `null` when the fallback was used
    pub fn value_or_null(&self) -> Value {
        self.value.clone().unwrap_or_default()
    }
}

impl ExecutionContext {
    /// Resolve an unqualified identifier
    ///
    /// Returns the first visible scope containing `key` together with the
    /// value. When no visible scope contains it, `fallback` is returned as the
    /// resolution target with no value; this never fails.
    pub fn scope_find_nearby(&self, key: impl Into<Key>, fallback: &Arc<Scope>) -> ScopeSearchResult {
        let key = key.into();
        match self.search(&key, false) {
            Some(result) => result,
            None => {
                log::trace!(
                    "'{}' not found from {} context, using scope '{}'",
                    key,
                    self.kind,
                    fallback.name()
                );
                ScopeSearchResult::fallback(fallback, key)
            }
        }
    }

    /// Resolve an unqualified identifier, falling back to the default
    /// assignment scope
    pub fn scope_find(&self, key: impl Into<Key>) -> ScopeSearchResult {
        let fallback = self.default_assignment_scope();
        self.scope_find_nearby(key, &fallback)
    }

    /// Resolve an unqualified identifier that must exist
    pub fn get_value(&self, key: impl Into<Key>) -> RuntimeResult<Value> {
        let key = key.into();
        self.search(&key, false)
            .and_then(|result| result.value)
            .ok_or_else(|| RuntimeError::KeyNotFound {
                key: key.name().to_string(),
            })
    }

    /// Assign to an unqualified identifier
    ///
    /// Overwrites the key in the first visible scope that holds it, otherwise
    /// writes to the default assignment scope. Returns the scope written to.
    pub fn assign(&self, key: impl Into<Key>, value: Value) -> Arc<Scope> {
        let key = key.into();
        let target = match self.search(&key, true) {
            Some(result) if !result.is_scope => result.scope,
            _ => self.default_assignment_scope(),
        };
        target.put(key, value);
        target
    }

    /// Find a scope by name, falling back to the default assignment scope
    pub fn get_scope_nearby(&self, name: impl Into<Key>) -> Arc<Scope> {
        let name = name.into();
        self.find_scope_named(&name).unwrap_or_else(|| {
            log::trace!("Scope '{}' not visible from {} context", name, self.kind);
            self.default_assignment_scope()
        })
    }

    /// Find a scope by name without falling back
    pub fn get_scope_nearby_strict(&self, name: impl Into<Key>) -> RuntimeResult<Arc<Scope>> {
        let name = name.into();
        self.find_scope_named(&name)
            .ok_or_else(|| RuntimeError::UnknownScope {
                name: name.name().to_string(),
            })
    }

    /// Scope that unqualified writes target when the key exists nowhere
    pub fn default_assignment_scope(&self) -> Arc<Scope> {
        let local = || {
            self.local_scope()
                .cloned()
                .unwrap_or_else(|| self.variables_scope())
        };
        match self.kind {
            ContextKind::Function => match self.function().map(|f| f.source_type()) {
                Some(SourceType::CfScript) => {
                    self.inherited_variables.clone().unwrap_or_else(local)
                }
                _ => local(),
            },
            ContextKind::Closure | ContextKind::Lambda | ContextKind::Thread => local(),
            ContextKind::Runtime
            | ContextKind::Server
            | ContextKind::Application
            | ContextKind::Request
            | ContextKind::Template => self.variables_scope(),
        }
    }

    /// Nearest context, starting with this one, carrying every tag in
    /// `capabilities`
    pub fn get_parent_of_type(self: &Arc<Self>, capabilities: Capabilities) -> Option<Arc<Self>> {
        let mut current = Some(self);
        while let Some(context) = current {
            if context.capabilities().contains(capabilities) {
                return Some(Arc::clone(context));
            }
            current = context.parent.as_ref();
        }
        None
    }

    /// Called name of the nearest function frame
    pub fn closest_function_name(&self) -> Option<Key> {
        let mut current = Some(self);
        while let Some(context) = current {
            if context.kind.is_function() {
                return context.called_name.clone();
            }
            current = context.parent.as_deref();
        }
        None
    }

    /// Scopes an unqualified lookup from here consults, in precedence order
    pub fn visible_scopes(&self) -> Vec<Arc<Scope>> {
        let mut scopes: Vec<Arc<Scope>> = Vec::new();
        let _ = self.visit_scopes::<(), _>(false, &mut |scope| {
            if !scopes.iter().any(|seen| Arc::ptr_eq(seen, scope)) {
                scopes.push(Arc::clone(scope));
            }
            ControlFlow::Continue(())
        });
        scopes
    }

    pub(crate) fn find_scope_named(&self, name: &Key) -> Option<Arc<Scope>> {
        if let Some(scope) = self.scopes.get(name) {
            return Some(Arc::clone(scope));
        }
        if name == &*names::VARIABLES {
            if let Some(variables) = &self.inherited_variables {
                return Some(Arc::clone(variables));
            }
        }
        match self.kind {
            ContextKind::Lambda => None,
            ContextKind::Closure => self
                .declaring_context()
                .and_then(|declaring| declaring.find_scope_named(name))
                .or_else(|| self.find_shared_scope_named(name)),
            ContextKind::Function | ContextKind::Thread => self.find_shared_scope_named(name),
            _ => self.parent.as_ref()?.find_scope_named(name),
        }
    }

    /// Scope named `name` owned by a global ancestor
    fn find_shared_scope_named(&self, name: &Key) -> Option<Arc<Scope>> {
        let mut current = self.parent.as_deref();
        while let Some(context) = current {
            if context.kind.is_global() {
                if let Some(scope) = context.scopes.get(name) {
                    return Some(Arc::clone(scope));
                }
            }
            current = context.parent.as_deref();
        }
        None
    }

    fn search(&self, key: &Key, for_assignment: bool) -> Option<ScopeSearchResult> {
        let skip_nulls = !for_assignment && self.config().null_is_undefined;
        let outcome = self.visit_scopes(false, &mut |scope| {
            if scope.name() == key {
                return ControlFlow::Break(ScopeSearchResult::scope_itself(scope, key));
            }
            match scope.get(key) {
                Some(Value::Null) if skip_nulls => ControlFlow::Continue(()),
                Some(value) => ControlFlow::Break(ScopeSearchResult::variable(scope, key, value)),
                None => ControlFlow::Continue(()),
            }
        });
        match outcome {
            ControlFlow::Break(result) => Some(result),
            ControlFlow::Continue(()) => None,
        }
    }

    /// Visit visible scopes in precedence order until `visit` breaks
    ///
    /// A shallow visit stops before leaving the frame: it covers the frame's
    /// own scopes and, for closures, their declaring contexts.
    fn visit_scopes<R, F>(&self, shallow: bool, visit: &mut F) -> ControlFlow<R>
    where
        F: FnMut(&Arc<Scope>) -> ControlFlow<R>,
    {
        for scope in self.scopes.values() {
            visit(scope)?;
        }
        if let Some(variables) = &self.inherited_variables {
            visit(variables)?;
        }

        match self.kind {
            ContextKind::Lambda => ControlFlow::Continue(()),
            ContextKind::Closure => {
                if let Some(declaring) = self.declaring_context() {
                    declaring.visit_scopes(true, visit)?;
                }
                self.visit_shared_scopes(shallow, visit)
            }
            ContextKind::Function | ContextKind::Thread => self.visit_shared_scopes(shallow, visit),
            _ if shallow => ControlFlow::Continue(()),
            _ => match &self.parent {
                Some(parent) => parent.visit_scopes(false, visit),
                None => ControlFlow::Continue(()),
            },
        }
    }

    fn visit_shared_scopes<R, F>(&self, shallow: bool, visit: &mut F) -> ControlFlow<R>
    where
        F: FnMut(&Arc<Scope>) -> ControlFlow<R>,
    {
        if shallow {
            return ControlFlow::Continue(());
        }
        let mut current = self.parent.as_deref();
        while let Some(context) = current {
            if context.kind.is_global() {
                for scope in context.scopes.values() {
                    visit(scope)?;
                }
            }
            current = context.parent.as_deref();
        }
        ControlFlow::Continue(())
    }
}
