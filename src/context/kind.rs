//! Context kinds and the capability tags derived from them

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Capability tags carried by an execution context
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u16 {
        const RUNTIME = 1;
        const SERVER = 1 << 1;
        const APPLICATION = 1 << 2;
        const REQUEST = 1 << 3;
        const TEMPLATE = 1 << 4;
        const FUNCTION = 1 << 5;
        const CLOSURE = 1 << 6;
        const LAMBDA = 1 << 7;
        const THREAD = 1 << 8;

        /// Contexts whose scopes are shared by everything below them
        const GLOBAL = Self::RUNTIME.bits()
            | Self::SERVER.bits()
            | Self::APPLICATION.bits()
            | Self::REQUEST.bits();
    }
}

/// What a context node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    /// Process root
    Runtime,
    /// Server lifecycle
    Server,
    /// One application
    Application,
    /// One request
    Request,
    /// Template or script body
    Template,
    /// Named function invocation
    Function,
    /// Closure invocation
    Closure,
    /// Lambda invocation
    Lambda,
    /// Spawned thread body
    Thread,
}

impl ContextKind {
    /// Capability tags of this kind
    pub fn capabilities(self) -> Capabilities {
        match self {
            ContextKind::Runtime => Capabilities::RUNTIME,
            ContextKind::Server => Capabilities::SERVER,
            ContextKind::Application => Capabilities::APPLICATION,
            ContextKind::Request => Capabilities::REQUEST,
            ContextKind::Template => Capabilities::TEMPLATE,
            ContextKind::Function => Capabilities::FUNCTION,
            ContextKind::Closure => Capabilities::FUNCTION | Capabilities::CLOSURE,
            ContextKind::Lambda => Capabilities::FUNCTION | Capabilities::LAMBDA,
            ContextKind::Thread => Capabilities::THREAD,
        }
    }

    /// Whether scopes owned by this kind are visible to every descendant
    pub fn is_global(self) -> bool {
        Capabilities::GLOBAL.intersects(self.capabilities())
    }

    /// Whether this kind is a function frame of any flavour
    pub fn is_function(self) -> bool {
        self.capabilities().contains(Capabilities::FUNCTION)
    }

    /// Lowercase display name
    pub fn name(self) -> &'static str {
        match self {
            ContextKind::Runtime => "runtime",
            ContextKind::Server => "server",
            ContextKind::Application => "application",
            ContextKind::Request => "request",
            ContextKind::Template => "template",
            ContextKind::Function => "function",
            ContextKind::Closure => "closure",
            ContextKind::Lambda => "lambda",
            ContextKind::Thread => "thread",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
