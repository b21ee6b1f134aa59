use crate::objects::{Dictionary, Object};

/// A stream object: its dictionary and the raw (still encoded) payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub data: Vec<u8>,
}

impl Stream {
    pub fn new(dict: Dictionary, data: Vec<u8>) -> Self {
        Self { dict, data }
    }

    /// Filter names in declared order. `/Filter` may be a name or an array.
    pub fn filters(&self) -> Vec<String> {
        match self.dict.get("Filter") {
            Some(Object::Name(name)) => vec![name.clone()],
            Some(Object::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_name().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Decode parameters aligned with [`Stream::filters`].
    pub fn decode_params(&self) -> Vec<Option<Dictionary>> {
        let count = self.filters().len();
        let mut params = match self.dict.get("DecodeParms").or_else(|| self.dict.get("DP")) {
            Some(Object::Dictionary(dict)) => vec![Some(dict.clone())],
            Some(Object::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Object::Dictionary(dict) => Some(dict.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        params.resize(count, None);
        params
    }

    /// Replace the payload and keep `/Length` in step with it.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.dict.set("Length", data.len() as i64);
        self.data = data;
    }
}
