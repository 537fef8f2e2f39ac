//! Case-insensitive identifiers
//!
//! A [`Key`] is the hashable lookup unit used by every scope and context in the
//! runtime. It keeps the spelling it was created with (for display and error
//! messages) next to a case-folded canonical form that alone drives equality and
//! hashing. Well-known identifiers are held by a process-wide interner so that
//! their allocations are shared; every other spelling builds a fresh key, which
//! keeps the interner from growing with user data.

use dashmap::DashMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Canonical, case-insensitive identifier
#[derive(Clone)]
pub struct Key {
    name: Arc<str>,
    canonical: Arc<str>,
}

impl Key {
    /// Create the key for a spelling, reusing the interned key if there is one
    pub fn of<S: AsRef<str>>(spelling: S) -> Self {
        let spelling = spelling.as_ref();
        GLOBAL_INTERNER
            .lookup(spelling)
            .unwrap_or_else(|| Key::uninterned(spelling))
    }

    /// Create the key for a spelling and keep it in the global interner
    ///
    /// Reserved for identifiers that live for the whole process.
    pub fn intern<S: AsRef<str>>(spelling: S) -> Self {
        GLOBAL_INTERNER.key(spelling.as_ref())
    }

    /// Build a key without touching the interner
    pub fn uninterned<S: AsRef<str>>(spelling: S) -> Self {
        let spelling = spelling.as_ref();
        Self {
            name: Arc::from(spelling),
            canonical: Arc::from(fold_case(spelling).as_str()),
        }
    }

    /// The spelling this key was created with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The case-folded form used for equality and hashing
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Parse the key as a 1-based position, if it is numeric
    pub fn as_position(&self) -> Option<usize> {
        if self.canonical.is_empty() || !self.canonical.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.canonical.parse().ok()
    }
}

fn fold_case(spelling: &str) -> String {
    spelling.to_uppercase()
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.canonical, &other.canonical) || self.canonical == other.canonical
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

impl From<&str> for Key {
    fn from(spelling: &str) -> Self {
        Key::of(spelling)
    }
}

impl From<String> for Key {
    fn from(spelling: String) -> Self {
        Key::of(spelling)
    }
}

impl From<&String> for Key {
    fn from(spelling: &String) -> Self {
        Key::of(spelling)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// Positional keys are the string form of the integer
impl From<usize> for Key {
    fn from(position: usize) -> Self {
        Key::of(position.to_string())
    }
}

impl From<i64> for Key {
    fn from(position: i64) -> Self {
        Key::of(position.to_string())
    }
}

/// Thread-safe key interner
///
/// Maps a spelling to the key built for it, and a canonical form to its shared
/// canonical string so that differently-cased spellings share that allocation.
pub struct KeyInterner {
    spellings: DashMap<String, Key>,
    canonicals: DashMap<String, Arc<str>>,
}

impl Default for KeyInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyInterner {
    /// Create an empty interner
    pub fn new() -> Self {
        Self {
            spellings: DashMap::new(),
            canonicals: DashMap::new(),
        }
    }

    /// Key already interned for this exact spelling
    pub fn lookup(&self, spelling: &str) -> Option<Key> {
        self.spellings.get(spelling).map(|entry| entry.value().clone())
    }

    /// Intern a spelling, returning its key
    pub fn key(&self, spelling: &str) -> Key {
        if let Some(key) = self.lookup(spelling) {
            return key;
        }

        let canonical = self.canonical(&fold_case(spelling));
        let key = Key {
            name: Arc::from(spelling),
            canonical,
        };

        // Insert and return, handling potential race conditions
        match self.spellings.entry(spelling.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => entry.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(key.clone());
                key
            }
        }
    }

    fn canonical(&self, folded: &str) -> Arc<str> {
        if let Some(existing) = self.canonicals.get(folded) {
            return Arc::clone(&existing);
        }
        match self.canonicals.entry(folded.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Arc::clone(entry.get()),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let shared: Arc<str> = Arc::from(folded);
                entry.insert(Arc::clone(&shared));
                shared
            }
        }
    }

    /// Get statistics about the interner
    pub fn stats(&self) -> InternerStats {
        InternerStats {
            spellings: self.spellings.len(),
            canonicals: self.canonicals.len(),
        }
    }
}

/// Statistics about key interning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternerStats {
    /// Number of distinct spellings seen
    pub spellings: usize,
    /// Number of distinct canonical forms seen
    pub canonicals: usize,
}

/// Well-known names seeded into the global interner
pub const COMMON_KEYS: &[&str] = &[
    "arguments",
    "local",
    "variables",
    "this",
    "super",
    "request",
    "application",
    "server",
    "session",
    "thread",
    "argumentCollection",
    "name",
    "returnType",
    "hint",
    "output",
    "access",
    "closure",
    "ANONYMOUSCLOSURE",
    "lambda",
    "ANONYMOUSLAMBDA",
    "parameters",
    "required",
    "type",
    "default",
];

static GLOBAL_INTERNER: once_cell::sync::Lazy<KeyInterner> =
    once_cell::sync::Lazy::new(KeyInterner::new);

/// Seed the global interner with [`COMMON_KEYS`]
pub fn preintern_common_keys() {
    for spelling in COMMON_KEYS {
        Key::intern(spelling);
    }
}

/// Get statistics from the global interner
pub fn global_interner_stats() -> InternerStats {
    GLOBAL_INTERNER.stats()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_equality() {
        let a = Key::of("firstName");
        let b = Key::of("FIRSTNAME");
        let c = Key::of("lastName");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.name(), "firstName");
        assert_eq!(b.name(), "FIRSTNAME");
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn test_equality_does_not_depend_on_interning() {
        let interned = Key::of("Extra");
        let fresh = Key::uninterned("eXtRa");

        assert_eq!(interned, fresh);

        let mut set = std::collections::HashSet::new();
        set.insert(interned);
        assert!(set.contains(&fresh));
    }

    #[test]
    fn test_same_spelling_reuses_allocation() {
        let interner = KeyInterner::new();

        let k1 = interner.key("hello");
        let k2 = interner.key("hello");
        let k3 = interner.key("HELLO");

        assert!(Arc::ptr_eq(&k1.name, &k2.name));
        assert!(Arc::ptr_eq(&k1.canonical, &k3.canonical));
        assert_eq!(interner.stats(), InternerStats { spellings: 2, canonicals: 1 });
    }

    #[test]
    fn test_positional_keys() {
        assert_eq!(Key::from(3usize), Key::of("3"));
        assert_eq!(Key::from(2i64).name(), "2");
        assert_eq!(Key::of("3").as_position(), Some(3));
        assert_eq!(Key::of("x3").as_position(), None);
        assert_eq!(Key::of("").as_position(), None);
    }

    #[test]
    fn test_preintern() {
        preintern_common_keys();
        assert!(global_interner_stats().spellings >= COMMON_KEYS.len());
    }

    #[test]
    fn test_dynamic_spellings_are_not_retained() {
        preintern_common_keys();
        let before = global_interner_stats();

        let keys: Vec<Key> = (0..64).map(|i| Key::of(format!("row-{i}-cell"))).collect();
        let positional = Key::from(4096usize);

        assert_eq!(global_interner_stats(), before);
        assert_eq!(keys[3], Key::of("ROW-3-CELL"));
        assert_eq!(positional.as_position(), Some(4096));
    }

    #[test]
    fn test_of_reuses_interned_keys() {
        preintern_common_keys();
        let interned = Key::intern("argumentCollection");
        let looked_up = Key::of("argumentCollection");
        let other_case = Key::of("ARGUMENTCOLLECTION");

        assert!(Arc::ptr_eq(&interned.name, &looked_up.name));
        assert_eq!(interned, other_case);
    }
}
