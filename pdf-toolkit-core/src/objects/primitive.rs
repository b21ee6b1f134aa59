use crate::objects::{Dictionary, Stream};
use std::fmt;

/// Identifier of an indirect object: object number plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// A PDF object value.
///
/// Strings are kept as raw bytes: PDF strings are byte sequences and the
/// security handler encrypts them in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    Name(String),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value; integers are widened.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(f) => Some(*f),
            Object::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Dictionary of a plain dictionary or of a stream.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&mut stream.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::String(_) => "string",
            Object::Name(_) => "name",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Stream(_) => "stream",
            Object::Reference(_) => "reference",
        }
    }

    /// Calls `f` for every reference held directly or nested in this object.
    pub fn for_each_reference(&self, f: &mut impl FnMut(ObjectId)) {
        match self {
            Object::Reference(id) => f(*id),
            Object::Array(items) => items.iter().for_each(|item| item.for_each_reference(f)),
            Object::Dictionary(dict) => dict.values().for_each(|v| v.for_each_reference(f)),
            Object::Stream(stream) => stream.dict.values().for_each(|v| v.for_each_reference(f)),
            _ => {}
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<f64> for Object {
    fn from(f: f64) -> Self {
        Object::Real(f)
    }
}

impl From<Vec<u8>> for Object {
    fn from(bytes: Vec<u8>) -> Self {
        Object::String(bytes)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::String(s.as_bytes().to_vec())
    }
}

impl From<Vec<Object>> for Object {
    fn from(items: Vec<Object>) -> Self {
        Object::Array(items)
    }
}

impl From<Dictionary> for Object {
    fn from(dict: Dictionary) -> Self {
        Object::Dictionary(dict)
    }
}

impl From<Stream> for Object {
    fn from(stream: Stream) -> Self {
        Object::Stream(stream)
    }
}

impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_display() {
        assert_eq!(ObjectId::new(12, 0).to_string(), "12 0 R");
        assert_eq!(ObjectId::new(7, 3).to_string(), "7 3 R");
    }

    #[test]
    fn test_object_id_ordering() {
        let mut ids = vec![ObjectId::new(3, 0), ObjectId::new(1, 2), ObjectId::new(1, 0)];
        ids.sort();
        assert_eq!(
            ids,
            vec![ObjectId::new(1, 0), ObjectId::new(1, 2), ObjectId::new(3, 0)]
        );
    }

    #[test]
    fn test_as_real_widens_integers() {
        assert_eq!(Object::Integer(4).as_real(), Some(4.0));
        assert_eq!(Object::Real(2.5).as_real(), Some(2.5));
        assert_eq!(Object::Null.as_real(), None);
    }

    #[test]
    fn test_as_dict_covers_streams() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name("XObject".into()));
        let stream = Object::Stream(Stream::new(dict, b"abc".to_vec()));
        assert_eq!(
            stream.as_dict().and_then(|d| d.get_name("Type")),
            Some("XObject")
        );
    }

    #[test]
    fn test_for_each_reference_nested() {
        let mut inner = Dictionary::new();
        inner.set("A", ObjectId::new(4, 0));
        let obj = Object::Array(vec![
            Object::Reference(ObjectId::new(1, 0)),
            Object::Dictionary(inner),
            Object::Integer(3),
        ]);

        let mut seen = Vec::new();
        obj.for_each_reference(&mut |id| seen.push(id.number()));
        seen.sort();
        assert_eq!(seen, vec![1, 4]);
    }
}
