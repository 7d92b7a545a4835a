//! Configuration access port trait.

/// Raw `section.key` lookup. Typed reads and range checks live in the
/// domain so every backend rejects malformed values the same way.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
