//! Execution contexts
//!
//! Contexts form a tree rooted at a single [`ContextKind::Runtime`] node. Each
//! node is reference counted: a child keeps its parent alive, and a closure
//! value keeps the context it was declared in alive for as long as the
//! closure itself is reachable, even after that frame has returned.
//!
//! The set of scopes a node owns is fixed when the node is created; only the
//! contents of those scopes change afterwards. Resolution algorithms live in
//! [`resolver`].

pub mod kind;
pub mod resolver;

pub use kind::{Capabilities, ContextKind};
pub use resolver::ScopeSearchResult;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::fmt;
use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::function::{Function, FunctionKind};
use crate::model::{Caster, DefaultCaster, Key, preintern_common_keys};
use crate::scope::{Scope, ScopeKind, names};

/// Process-wide services owned by the runtime root and shared by every node
struct RuntimeServices {
    config: RuntimeConfig,
    caster: Arc<dyn Caster>,
    variables: Arc<Scope>,
}

/// One node of the context tree
pub struct ExecutionContext {
    kind: ContextKind,
    parent: Option<Arc<ExecutionContext>>,
    scopes: IndexMap<Key, Arc<Scope>, FxBuildHasher>,
    /// A `variables` scope seen through this node without being owned by it:
    /// the instance scope of a member function, or the spawning context's
    /// `variables` for a thread.
    inherited_variables: Option<Arc<Scope>>,
    function: Option<Arc<Function>>,
    called_name: Option<Key>,
    services: Arc<RuntimeServices>,
}

impl ExecutionContext {
    /// Create a runtime root with default configuration and casting rules
    pub fn runtime() -> Arc<Self> {
        Self::runtime_with(RuntimeConfig::default(), Arc::new(DefaultCaster))
    }

    /// Create a runtime root with explicit configuration and caster
    pub fn runtime_with(config: RuntimeConfig, caster: Arc<dyn Caster>) -> Arc<Self> {
        if config.preintern_common_keys {
            preintern_common_keys();
        }
        let variables = Arc::new(Scope::new(names::VARIABLES.clone()));
        let services = Arc::new(RuntimeServices {
            config,
            caster,
            variables: Arc::clone(&variables),
        });

        log::debug!("Created runtime context");
        Arc::new(Self {
            kind: ContextKind::Runtime,
            parent: None,
            scopes: owned_scopes([variables]),
            inherited_variables: None,
            function: None,
            called_name: None,
            services,
        })
    }

    /// Create a server context below `parent`
    pub fn server(parent: &Arc<Self>) -> Arc<Self> {
        Self::child(parent, ContextKind::Server, [named(&names::SERVER)])
    }

    /// Create an application context below `parent`
    pub fn application(parent: &Arc<Self>) -> Arc<Self> {
        Self::child(parent, ContextKind::Application, [named(&names::APPLICATION)])
    }

    /// Create a request context below `parent`
    pub fn request(parent: &Arc<Self>) -> Arc<Self> {
        Self::child(parent, ContextKind::Request, [named(&names::REQUEST)])
    }

    /// Create a template context with a fresh `variables` scope
    pub fn template(parent: &Arc<Self>) -> Arc<Self> {
        Self::child(parent, ContextKind::Template, [named(&names::VARIABLES)])
    }

    /// Create a thread context
    ///
    /// The thread owns `local` and `thread` scopes and sees the spawning
    /// context's `variables` scope.
    pub fn thread(parent: &Arc<Self>) -> Arc<Self> {
        let spawner_variables = parent.variables_scope();
        let mut context = Self::build(
            parent,
            ContextKind::Thread,
            [named(&names::LOCAL), named(&names::THREAD)],
        );
        context.inherited_variables = Some(spawner_variables);
        Arc::new(context)
    }

    /// Create the frame for one invocation of `function`
    ///
    /// The kind of frame follows the function's kind. `arguments` must be the
    /// scope produced by the argument binder for this invocation; `member` is
    /// the instance `variables` scope when the function is called on an
    /// instance.
    pub fn for_function(
        parent: &Arc<Self>,
        function: Arc<Function>,
        arguments: Arc<Scope>,
        member: Option<Arc<Scope>>,
    ) -> RuntimeResult<Arc<Self>> {
        if arguments.kind() != ScopeKind::Arguments || arguments.name() != &*names::ARGUMENTS {
            return Err(RuntimeError::InvalidContext {
                message: format!(
                    "frame for '{}' needs an arguments scope, got scope '{}'",
                    function.name(),
                    arguments.name()
                ),
            });
        }
        let kind = match function.kind() {
            FunctionKind::Udf => ContextKind::Function,
            FunctionKind::Closure { .. } => ContextKind::Closure,
            FunctionKind::Lambda => ContextKind::Lambda,
        };
        let mut context = Self::build(parent, kind, [named(&names::LOCAL), arguments]);
        context.inherited_variables = member;
        context.called_name = Some(function.name().clone());
        context.function = Some(function);
        Ok(Arc::new(context))
    }

    fn child<const N: usize>(
        parent: &Arc<Self>,
        kind: ContextKind,
        scopes: [Arc<Scope>; N],
    ) -> Arc<Self> {
        Arc::new(Self::build(parent, kind, scopes))
    }

    fn build<const N: usize>(
        parent: &Arc<Self>,
        kind: ContextKind,
        scopes: [Arc<Scope>; N],
    ) -> Self {
        log::trace!("Creating {} context below {}", kind, parent.kind);
        Self {
            kind,
            parent: Some(Arc::clone(parent)),
            scopes: owned_scopes(scopes),
            inherited_variables: None,
            function: None,
            called_name: None,
            services: Arc::clone(&parent.services),
        }
    }

    /// What this node represents
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Capability tags of this node
    pub fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    /// Parent node, absent only for the runtime root
    pub fn parent(&self) -> Option<&Arc<ExecutionContext>> {
        self.parent.as_ref()
    }

    /// Function being executed by this frame, if it is a function frame
    pub fn function(&self) -> Option<&Arc<Function>> {
        self.function.as_ref()
    }

    /// Declaring context captured by the closure this frame executes
    pub fn declaring_context(&self) -> Option<&Arc<ExecutionContext>> {
        self.function.as_ref().and_then(|f| f.declaring_context())
    }

    /// Scope owned by this node under `name`
    pub fn owned_scope(&self, name: &Key) -> Option<&Arc<Scope>> {
        self.scopes.get(name)
    }

    /// Every scope owned by this node, in creation order
    pub fn owned_scopes(&self) -> impl Iterator<Item = &Arc<Scope>> {
        self.scopes.values()
    }

    /// Local scope of a function or thread frame
    pub fn local_scope(&self) -> Option<&Arc<Scope>> {
        self.owned_scope(&names::LOCAL)
    }

    /// Arguments scope of a function frame
    pub fn arguments_scope(&self) -> Option<&Arc<Scope>> {
        self.owned_scope(&names::ARGUMENTS)
    }

    /// Member `variables` scope, or the spawner's for a thread
    pub fn inherited_variables(&self) -> Option<&Arc<Scope>> {
        self.inherited_variables.as_ref()
    }

    /// Runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.services.config
    }

    /// Casting collaborator used for argument and return coercion
    pub fn caster(&self) -> &Arc<dyn Caster> {
        &self.services.caster
    }

    /// The runtime root's `variables` scope
    pub fn runtime_variables(&self) -> &Arc<Scope> {
        &self.services.variables
    }

    /// Number of nodes from here to the root, inclusive
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent.as_deref();
        while let Some(context) = current {
            depth += 1;
            current = context.parent.as_deref();
        }
        depth
    }

    /// Nearest `variables` scope as seen from this node
    pub(crate) fn variables_scope(&self) -> Arc<Scope> {
        self.inherited_variables
            .clone()
            .or_else(|| self.find_scope_named(&names::VARIABLES))
            .unwrap_or_else(|| Arc::clone(&self.services.variables))
    }
}

fn named(name: &Key) -> Arc<Scope> {
    Arc::new(Scope::new(name.clone()))
}

fn owned_scopes<const N: usize>(
    scopes: [Arc<Scope>; N],
) -> IndexMap<Key, Arc<Scope>, FxBuildHasher> {
    scopes
        .into_iter()
        .map(|scope| (scope.name().clone(), scope))
        .collect()
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("kind", &self.kind)
            .field("scopes", &self.scopes.keys().collect::<Vec<_>>())
            .field("function", &self.called_name)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeTag;
    use crate::model::Value;

    fn request_chain() -> (Arc<ExecutionContext>, Arc<ExecutionContext>) {
        let runtime = ExecutionContext::runtime();
        let server = ExecutionContext::server(&runtime);
        let application = ExecutionContext::application(&server);
        let request = ExecutionContext::request(&application);
        (runtime, request)
    }

    #[test]
    fn test_owned_scopes_per_kind() {
        let (runtime, request) = request_chain();
        let template = ExecutionContext::template(&request);

        assert!(runtime.owned_scope(&names::VARIABLES).is_some());
        assert!(request.owned_scope(&names::REQUEST).is_some());
        assert!(template.owned_scope(&Key::of("VARIABLES")).is_some());
        assert!(template.local_scope().is_none());
        assert_eq!(template.depth(), 5);
    }

    #[test]
    fn test_services_are_shared_down_the_tree() {
        let config = RuntimeConfig {
            null_is_undefined: true,
            ..RuntimeConfig::default()
        };
        let runtime = ExecutionContext::runtime_with(config, Arc::new(DefaultCaster));
        let template = ExecutionContext::template(&ExecutionContext::request(&runtime));

        assert!(template.config().null_is_undefined);
        assert_eq!(
            template.caster().coerce(&Value::from("42"), &TypeTag::Numeric),
            Ok(Value::Integer(42))
        );
        assert!(Arc::ptr_eq(
            template.runtime_variables(),
            runtime.owned_scope(&names::VARIABLES).unwrap()
        ));
    }

    #[test]
    fn test_thread_sees_spawner_variables() {
        let (_, request) = request_chain();
        let template = ExecutionContext::template(&request);
        let thread = ExecutionContext::thread(&template);

        assert_eq!(thread.kind(), ContextKind::Thread);
        assert!(Arc::ptr_eq(
            thread.inherited_variables().unwrap(),
            template.owned_scope(&names::VARIABLES).unwrap()
        ));
        assert!(thread.owned_scope(&names::THREAD).is_some());
    }

    #[test]
    fn test_function_frame_requires_arguments_scope() {
        let (_, request) = request_chain();
        let function = Arc::new(Function::builder("misfit").build().unwrap());

        let err = ExecutionContext::for_function(
            &request,
            Arc::clone(&function),
            Arc::new(Scope::new("variables")),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidContext { ref message } if message.contains("misfit")));

        let frame = ExecutionContext::for_function(
            &request,
            function,
            Arc::new(Scope::arguments()),
            None,
        )
        .unwrap();
        assert_eq!(frame.kind(), ContextKind::Function);
        assert!(frame.arguments_scope().is_some());
    }
}
