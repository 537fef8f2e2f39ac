//! Scopes: ordered, case-insensitive key/value containers
//!
//! A [`Scope`] does not know what it is for; the context that owns it gives it a
//! name. Every operation normalizes its key argument through [`Key`], so string
//! spellings, existing keys and integer positions all address the same entries.
//! Scopes are shared between concurrently executing frames (request,
//! application and server scopes in particular), so the entry map sits behind a
//! reader/writer lock and every accessor copies values out instead of handing
//! out references into the map.

pub mod names;

use parking_lot::RwLock;
use std::fmt;

use crate::model::{Key, StructMap, Value};

/// Kind tag of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// General-purpose scope
    Ordinary,
    /// Arguments scope; positional overflow entries live under numeric keys
    Arguments,
}

/// Ordered, case-insensitive, thread-safe key/value container
pub struct Scope {
    name: Key,
    kind: ScopeKind,
    entries: RwLock<StructMap>,
}

impl Scope {
    /// Create an ordinary scope
    pub fn new(name: impl Into<Key>) -> Self {
        Self::with_kind(name, ScopeKind::Ordinary)
    }

    /// Create an empty arguments scope
    pub fn arguments() -> Self {
        Self::with_kind(names::ARGUMENTS.clone(), ScopeKind::Arguments)
    }

    /// Create a scope of the given kind
    pub fn with_kind(name: impl Into<Key>, kind: ScopeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            entries: RwLock::new(StructMap::default()),
        }
    }

    /// The name its owner registered it under
    pub fn name(&self) -> &Key {
        &self.name
    }

    /// The kind tag
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Whether integer positions are meaningful keys for this scope
    pub fn is_positional(&self) -> bool {
        self.kind == ScopeKind::Arguments
    }

    /// Get a copy of the value stored under `key`
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        let key: Key = key.into();
        self.entries.read().get(&key).cloned()
    }

    /// Store a value, returning the previous one
    ///
    /// Overwriting keeps the entry in its original position.
    pub fn put(&self, key: impl Into<Key>, value: Value) -> Option<Value> {
        self.entries.write().insert(key.into(), value)
    }

    /// Store a value only when the key is absent; returns whether it was stored
    pub fn put_if_absent(&self, key: impl Into<Key>, value: Value) -> bool {
        let mut entries = self.entries.write();
        match entries.entry(key.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Store every pair, in order, under a single write lock
    pub fn put_all<K, I>(&self, pairs: I)
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut entries = self.entries.write();
        for (key, value) in pairs {
            entries.insert(key.into(), value);
        }
    }

    /// Remove a key, returning its value; remaining entries keep their order
    pub fn remove(&self, key: impl Into<Key>) -> Option<Value> {
        let key: Key = key.into();
        self.entries.write().shift_remove(&key)
    }

    /// Whether the key is present (a `null` value still counts as present)
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        let key: Key = key.into();
        self.entries.read().contains_key(&key)
    }

    /// Number of entries
    pub fn size(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the scope holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the entries in iteration order
    pub fn entries(&self) -> Vec<(Key, Value)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Snapshot of the keys in iteration order
    pub fn keys(&self) -> Vec<Key> {
        self.entries.read().keys().cloned().collect()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Detached struct copy of the current contents
    pub fn to_struct(&self) -> Value {
        Value::Struct(self.entries.read().clone())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_struct("Scope")
            .field("name", &self.name.name())
            .field("kind", &self.kind)
            .field("size", &entries.len())
            .finish()
    }
}
