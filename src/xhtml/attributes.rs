//! Element attributes as delivered by the event source.

use smallvec::SmallVec;

/// Ordered attribute list of one source element.
///
/// Names are lower-cased by the event source; values are already
/// entity-decoded. Lookups are linear, which is faster than hashing for the
/// handful of attributes a rich-text element carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: SmallVec<[(String, String); 4]>,
}

impl Attributes {
    /// Create an empty attribute list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or replace an attribute
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.items.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.items.push((name, value)),
        }
    }

    /// Get an attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove an attribute, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.items.iter().position(|(n, _)| n == name)?;
        Some(self.items.remove(pos).1)
    }

    /// Parse an attribute as a positive integer (`colspan`, `start`, ...).
    ///
    /// Invalid values read as `None`.
    pub fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name)?.trim().parse().ok()
    }

    /// Iterate over `(name, value)` pairs in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no attributes
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (name, value) in iter {
            attrs.set(name, value);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_existing() {
        let mut attrs = Attributes::new();
        attrs.set("colspan", "2");
        attrs.set("colspan", "3");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get_u32("colspan"), Some(3));
    }

    #[test]
    fn test_remove_and_invalid_numbers() {
        let mut attrs: Attributes = [("start", "x"), ("type", "a")].into_iter().collect();
        assert_eq!(attrs.get_u32("start"), None);
        assert_eq!(attrs.remove("type").as_deref(), Some("a"));
        assert!(!attrs.contains("type"));
    }
}
