use crate::objects::{Object, ObjectId};
use std::collections::BTreeMap;

/// PDF dictionary. Keys are stored without the leading slash and iterate in
/// sorted order so serialized output is deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    entries: BTreeMap<String, Object>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Object>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Object> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.entries.values_mut()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Object)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Object)> {
        self.entries.iter_mut()
    }

    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Object::as_name)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Object::as_integer)
    }

    pub fn get_reference(&self, key: &str) -> Option<ObjectId> {
        self.get(key).and_then(Object::as_reference)
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dictionary> {
        self.get(key).and_then(|obj| match obj {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        })
    }

    /// True when `/Type` equals `type_name`.
    pub fn has_type(&self, type_name: &str) -> bool {
        self.get_name("Type") == Some(type_name)
    }
}

impl FromIterator<(String, Object)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (String, Object)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Dictionary {
    type Item = (String, Object);
    type IntoIter = std::collections::btree_map::IntoIter<String, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut dict = Dictionary::new();
        dict.set("Name", "Test");
        dict.set("Count", 42);
        dict.set("Active", true);

        assert_eq!(dict.get("Name"), Some(&Object::String(b"Test".to_vec())));
        assert_eq!(dict.get_integer("Count"), Some(42));
        assert_eq!(dict.get("Active"), Some(&Object::Boolean(true)));
        assert_eq!(dict.get("Missing"), None);
    }

    #[test]
    fn test_remove() {
        let mut dict = Dictionary::new();
        dict.set("Temp", 1);

        assert!(dict.contains_key("Temp"));
        assert_eq!(dict.remove("Temp"), Some(Object::Integer(1)));
        assert!(!dict.contains_key("Temp"));
        assert!(dict.is_empty());
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name("Page".into()));
        dict.set("Contents", ObjectId::new(4, 0));
        dict.set("MediaBox", Object::Null);

        let keys: Vec<_> = dict.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Contents", "MediaBox", "Type"]);
    }

    #[test]
    fn test_typed_getters() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name("Catalog".into()));
        dict.set("Pages", ObjectId::new(2, 0));

        assert!(dict.has_type("Catalog"));
        assert!(!dict.has_type("Page"));
        assert_eq!(dict.get_reference("Pages"), Some(ObjectId::new(2, 0)));
        assert_eq!(dict.get_name("Pages"), None);
    }
}
