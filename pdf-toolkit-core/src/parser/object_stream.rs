//! Object streams (`/Type /ObjStm`, ISO 32000-1 Section 7.5.7)

use super::filters::decode_to_bytes;
use super::lexer::{Lexer, Token};
use super::objects::parse_object;
use super::{ParseError, ParseResult};
use crate::objects::{Object, ObjectId, Stream};

/// Decoded object stream
#[derive(Debug, Clone)]
pub struct ObjectStream {
    /// Object numbers with their offsets relative to `/First`
    offsets: Vec<(u32, usize)>,
    first: usize,
    data: Vec<u8>,
}

impl ObjectStream {
    pub fn parse(stream: &Stream) -> ParseResult<Self> {
        if !stream.dict.has_type("ObjStm") {
            return Err(ParseError::syntax(0, "Stream is not an object stream"));
        }
        let n = stream
            .dict
            .get_integer("N")
            .ok_or_else(|| ParseError::MissingKey("N".to_string()))?;
        let first = stream
            .dict
            .get_integer("First")
            .and_then(|f| usize::try_from(f).ok())
            .ok_or_else(|| ParseError::MissingKey("First".to_string()))?;

        let data = decode_to_bytes(stream)?;

        let mut lexer = Lexer::new(&data[..first.min(data.len())]);
        let mut offsets = Vec::with_capacity(n.max(0) as usize);
        for _ in 0..n {
            match (lexer.next_token()?, lexer.next_token()?) {
                (Token::Integer(number), Token::Integer(offset))
                    if number >= 0 && offset >= 0 =>
                {
                    offsets.push((number as u32, offset as usize));
                }
                _ => return Err(ParseError::syntax(lexer.position(), "Bad object stream index")),
            }
        }

        Ok(Self {
            offsets,
            first,
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Object at position `index` of the stream
    pub fn get(&self, index: usize) -> ParseResult<(ObjectId, Object)> {
        let &(number, offset) = self
            .offsets
            .get(index)
            .ok_or_else(|| ParseError::syntax(index, "Object stream index out of range"))?;
        let mut lexer = Lexer::at(&self.data, self.first + offset);
        // Objects in object streams always have generation 0
        Ok((ObjectId::new(number, 0), parse_object(&mut lexer)?))
    }

    /// Every object of the stream in index order
    pub fn objects(&self) -> impl Iterator<Item = ParseResult<(ObjectId, Object)>> + '_ {
        (0..self.offsets.len()).map(|i| self.get(i))
    }
}
