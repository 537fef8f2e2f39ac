//! Well-known scope and argument names

use once_cell::sync::Lazy;

use crate::model::Key;

/// `arguments`: per-invocation bound arguments
pub static ARGUMENTS: Lazy<Key> = Lazy::new(|| Key::intern("arguments"));
/// `local`: per-invocation function locals
pub static LOCAL: Lazy<Key> = Lazy::new(|| Key::intern("local"));
/// `variables`: template, instance or request level general-purpose scope
pub static VARIABLES: Lazy<Key> = Lazy::new(|| Key::intern("variables"));
/// `this`: public instance members
pub static THIS: Lazy<Key> = Lazy::new(|| Key::intern("this"));
/// `request`: shared by everything running in one request
pub static REQUEST: Lazy<Key> = Lazy::new(|| Key::intern("request"));
/// `application`: shared by every request of one application
pub static APPLICATION: Lazy<Key> = Lazy::new(|| Key::intern("application"));
/// `server`: shared by the whole process
pub static SERVER: Lazy<Key> = Lazy::new(|| Key::intern("server"));
/// `thread`: per spawned thread
pub static THREAD: Lazy<Key> = Lazy::new(|| Key::intern("thread"));
/// Reserved named-call entry carrying a base layer of arguments
pub static ARGUMENT_COLLECTION: Lazy<Key> = Lazy::new(|| Key::intern("argumentCollection"));
