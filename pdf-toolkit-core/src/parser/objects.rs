//! PDF object parser
//!
//! Builds [`Object`] values from the token stream, including indirect object
//! headers (`N G obj ... endobj`) and stream payloads.

use super::lexer::{find_bytes, Lexer, Token};
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, ObjectId, Stream};

/// Nesting limit for arrays and dictionaries
const MAX_DEPTH: usize = 256;

/// Resolves an indirect `/Length` to its integer value
pub type LengthResolver<'r> = &'r dyn Fn(ObjectId) -> Option<i64>;

/// Parse one direct object starting at the lexer position.
pub fn parse_object(lexer: &mut Lexer<'_>) -> ParseResult<Object> {
    let token = lexer.next_token()?;
    parse_from_token(lexer, token, 0)
}

fn parse_from_token(lexer: &mut Lexer<'_>, token: Token, depth: usize) -> ParseResult<Object> {
    if depth > MAX_DEPTH {
        return Err(ParseError::syntax(lexer.position(), "Objects nested too deeply"));
    }

    match token {
        Token::Null => Ok(Object::Null),
        Token::Boolean(b) => Ok(Object::Boolean(b)),
        Token::Integer(i) => parse_integer_or_reference(lexer, i),
        Token::Real(r) => Ok(Object::Real(r)),
        Token::String(s) => Ok(Object::String(s)),
        Token::Name(n) => Ok(Object::Name(n)),
        Token::ArrayStart => parse_array(lexer, depth),
        Token::DictStart => Ok(Object::Dictionary(parse_dictionary_inner(lexer, depth)?)),
        other => Err(ParseError::UnexpectedToken {
            expected: "PDF object".to_string(),
            found: format!("{other:?}"),
        }),
    }
}

/// `N G R` is a reference; anything else leaves the lexer after `N`.
fn parse_integer_or_reference(lexer: &mut Lexer<'_>, value: i64) -> ParseResult<Object> {
    let saved = lexer.position();
    if let Ok(Token::Integer(generation)) = lexer.next_token() {
        if let Ok(Token::Keyword(word)) = lexer.next_token() {
            if word == "R" && value >= 0 && (0..=i64::from(u16::MAX)).contains(&generation) {
                return Ok(Object::Reference(ObjectId::new(
                    value as u32,
                    generation as u16,
                )));
            }
        }
    }
    lexer.set_position(saved);
    Ok(Object::Integer(value))
}

fn parse_array(lexer: &mut Lexer<'_>, depth: usize) -> ParseResult<Object> {
    let mut items = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::ArrayEnd => return Ok(Object::Array(items)),
            Token::Eof => return Err(ParseError::syntax(lexer.position(), "Unterminated array")),
            token => items.push(parse_from_token(lexer, token, depth + 1)?),
        }
    }
}

fn parse_dictionary_inner(lexer: &mut Lexer<'_>, depth: usize) -> ParseResult<Dictionary> {
    let mut dict = Dictionary::new();
    loop {
        match lexer.next_token()? {
            Token::DictEnd => return Ok(dict),
            Token::Name(key) => {
                let value = match lexer.next_token()? {
                    // A key directly followed by `>>` has no value
                    Token::DictEnd => return Ok(dict),
                    token => parse_from_token(lexer, token, depth + 1)?,
                };
                // A null value is equivalent to an absent entry
                if !value.is_null() {
                    dict.set(key, value);
                }
            }
            Token::Eof => {
                return Err(ParseError::syntax(lexer.position(), "Unterminated dictionary"))
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "dictionary key".to_string(),
                    found: format!("{other:?}"),
                })
            }
        }
    }
}

/// Parse an indirect object at `offset`: `N G obj <object> endobj`.
///
/// Streams use `/Length` when it checks out. Otherwise, when `lenient` is
/// set, the payload runs up to the next `endstream` keyword.
pub fn parse_indirect_object(
    data: &[u8],
    offset: usize,
    resolve_length: LengthResolver<'_>,
    lenient: bool,
) -> ParseResult<(ObjectId, Object)> {
    let mut lexer = Lexer::at(data, offset);

    let number = match lexer.next_token()? {
        Token::Integer(n) if n >= 0 && n <= i64::from(u32::MAX) => n as u32,
        other => {
            return Err(ParseError::UnexpectedToken {
                expected: "object number".to_string(),
                found: format!("{other:?}"),
            })
        }
    };
    let generation = match lexer.next_token()? {
        Token::Integer(g) if (0..=i64::from(u16::MAX)).contains(&g) => g as u16,
        other => {
            return Err(ParseError::UnexpectedToken {
                expected: "generation number".to_string(),
                found: format!("{other:?}"),
            })
        }
    };
    lexer.expect_keyword("obj")?;
    let id = ObjectId::new(number, generation);

    let object = match lexer.next_token()? {
        // Empty object body
        Token::EndObj => return Ok((id, Object::Null)),
        token => parse_from_token(&mut lexer, token, 0)?,
    };

    let object = match object {
        Object::Dictionary(dict) if matches!(lexer.peek_token(), Ok(Token::Stream)) => {
            lexer.next_token()?;
            lexer.read_stream_eol();
            let payload = read_stream_payload(&mut lexer, &dict, resolve_length, lenient, id)?;
            Object::Stream(Stream::new(dict, payload))
        }
        other => other,
    };

    // A missing `endobj` is tolerated; the next header starts a new object anyway
    if matches!(lexer.peek_token(), Ok(Token::EndObj)) {
        lexer.next_token()?;
    }

    Ok((id, object))
}

fn read_stream_payload(
    lexer: &mut Lexer<'_>,
    dict: &Dictionary,
    resolve_length: LengthResolver<'_>,
    lenient: bool,
    id: ObjectId,
) -> ParseResult<Vec<u8>> {
    let start = lexer.position();
    let declared = match dict.get("Length") {
        Some(Object::Integer(len)) => Some(*len),
        Some(Object::Reference(length_id)) => resolve_length(*length_id),
        _ => None,
    };

    if let Some(len) = declared.filter(|&len| len >= 0) {
        let len = len as usize;
        if let Ok(bytes) = lexer.read_bytes(len) {
            let bytes = bytes.to_vec();
            if matches!(lexer.peek_token(), Ok(Token::EndStream)) {
                lexer.next_token()?;
                return Ok(bytes);
            }
        }
        lexer.set_position(start);
    }

    if !lenient {
        return Err(ParseError::syntax(
            start,
            format!("Stream {id} has a missing or invalid /Length"),
        ));
    }

    let data = lexer.data();
    let end = find_bytes(&data[start..], b"endstream")
        .map(|i| start + i)
        .ok_or_else(|| ParseError::syntax(start, format!("Stream {id} has no endstream")))?;

    let mut payload_end = end;
    if payload_end > start && data[payload_end - 1] == b'\n' {
        payload_end -= 1;
    }
    if payload_end > start && data[payload_end - 1] == b'\r' {
        payload_end -= 1;
    }

    tracing::warn!(
        "Stream {} length recovered by scanning: declared {:?}, found {}",
        id,
        declared,
        payload_end - start
    );

    lexer.set_position(end);
    lexer.expect_keyword("endstream")?;
    Ok(data[start..payload_end].to_vec())
}
