//! # Cache Key Generator
//!
//! Deterministic cache keys for listing queries. Parameter names are sorted
//! and each `name:value` pair is appended to a namespace token, so the same
//! parameter set always lands in the same cache slot no matter what order
//! it was supplied in. Values are concatenated raw, without hashing.

/// Separator between the namespace and each name/value component
pub const KEY_DELIMITER: char = ':';

/// Namespace used for listing keys unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "ads";

/// Canonical key generator for listing queries
#[derive(Debug, Clone)]
pub struct ListingKeyGenerator {
    namespace: String,
}

impl Default for ListingKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl ListingKeyGenerator {
    pub fn new<S: Into<String>>(namespace: S) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Prefix shared by every key this generator produces from a non-empty
    /// parameter set. Invalidation deletes everything under it.
    pub fn prefix(&self) -> String {
        format!("{}{}", self.namespace, KEY_DELIMITER)
    }

    /// Build the key for a parameter mapping
    pub fn generate<'a, I, K, V>(&self, params: I) -> String
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        K: AsRef<str> + ?Sized + 'a,
        V: AsRef<str> + ?Sized + 'a,
    {
        // Sort keys for consistent ordering
        let mut pairs: Vec<(&str, &str)> = params
            .into_iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();
        pairs.sort_unstable();

        let mut key = self.namespace.clone();
        for (name, value) in pairs {
            key.push(KEY_DELIMITER);
            key.push_str(name);
            key.push(KEY_DELIMITER);
            key.push_str(value);
        }
        key
    }
}
