//! In-memory PDF object model

mod dictionary;
mod primitive;
mod stream;

pub use dictionary::Dictionary;
pub use primitive::{Object, ObjectId};
pub use stream::Stream;
